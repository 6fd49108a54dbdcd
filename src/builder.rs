//! Builder macro for configuration types.

/// Generate a builder struct and implementation for a configuration type.
///
/// The configuration type must implement `Default` and provide
/// `fn validate(&self) -> Result<(), BuilderError>`. The macro generates:
/// - A builder struct with all fields wrapped in `Option`
/// - Setter methods for each field (all accept `impl Into<T>`)
/// - A `build()` method that checks required fields, fills defaults and
///   runs `validate`
/// - A `builder()` method on the config type
///
/// # Field categories
///
/// - `required { field: Type }`: `build()` returns an error if not set
/// - `optional { field: Type }`: falls back to the `Default` value
macro_rules! impl_builder {
    (
        $Config:ident, $Builder:ident {
            required { $( $req_field:ident : $req_ty:ty ),* $(,)? }
            optional { $( $opt_field:ident : $opt_ty:ty ),* $(,)? }
        }
    ) => {
        #[derive(Debug, Default)]
        pub struct $Builder {
            $( $req_field: Option<$req_ty>, )*
            $( $opt_field: Option<$opt_ty>, )*
        }

        impl $Config {
            pub fn builder() -> $Builder {
                $Builder::default()
            }
        }

        impl $Builder {
            $(
                pub fn $req_field(mut self, value: impl Into<$req_ty>) -> Self {
                    self.$req_field = Some(value.into());
                    self
                }
            )*

            $(
                pub fn $opt_field(mut self, value: impl Into<$opt_ty>) -> Self {
                    self.$opt_field = Some(value.into());
                    self
                }
            )*

            pub fn build(self) -> Result<$Config, $crate::error::BuilderError> {
                let defaults = $Config::default();
                $(
                    let $req_field = self.$req_field.ok_or($crate::error::BuilderError::MissingRequiredField {
                        builder: stringify!($Builder),
                        field: stringify!($req_field),
                    })?;
                )*
                let config = $Config {
                    $( $req_field, )*
                    $( $opt_field: self.$opt_field.unwrap_or(defaults.$opt_field), )*
                };
                config.validate()?;
                Ok(config)
            }
        }
    };
}

pub(crate) use impl_builder;
