//! Generator configuration.
//!
//! One immutable value carries every switch of a run. Components receive
//! the slice of it they need ([`NamingConfig`], [`SynthConfig`]) as explicit
//! arguments.

use crate::builder::impl_builder;
use crate::error::BuilderError;
use crate::naming::{is_go_identifier, NamingConfig};
use crate::synth::SynthConfig;
use serde::{Deserialize, Serialize};

/// Configuration for one generator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
#[non_exhaustive]
pub struct GeneratorConfig {
    /// Struct types to generate options for, in processing order.
    pub type_names: Vec<String>,

    /// Prepended to every option function name.
    pub prefix: String,

    /// Emit a `New<Type>` constructor applying `default` tags.
    pub factory: bool,

    /// Generate options for unexported fields too.
    pub unexported: bool,

    /// Name the option type `<Type>Option` and reject clashing option names.
    pub unique_option: bool,
}

impl_builder!(GeneratorConfig, GeneratorConfigBuilder {
    required { type_names: Vec<String> }
    optional {
        prefix: String,
        factory: bool,
        unexported: bool,
        unique_option: bool,
    }
});

impl GeneratorConfig {
    pub fn naming(&self) -> NamingConfig {
        NamingConfig {
            prefix: self.prefix.clone(),
            include_unexported: self.unexported,
            enforce_unique_naming: self.unique_option,
        }
    }

    pub fn synth(&self) -> SynthConfig {
        SynthConfig {
            emit_constructor: self.factory,
            unique_option_type: self.unique_option,
        }
    }

    fn validate(&self) -> Result<(), BuilderError> {
        let invalid = |field, reason: String| BuilderError::InvalidField {
            builder: "GeneratorConfigBuilder",
            field,
            reason,
        };

        if self.type_names.is_empty() {
            return Err(invalid("type_names", "at least one type name is required".into()));
        }
        if let Some(bad) = self.type_names.iter().find(|name| !is_go_identifier(name)) {
            return Err(invalid("type_names", format!("{bad:?} is not a Go identifier")));
        }
        if !self.prefix.is_empty() && !is_go_identifier(&self.prefix) {
            return Err(invalid("prefix", format!("{:?} is not a Go identifier", self.prefix)));
        }
        Ok(())
    }
}

/// Split a comma-delimited type list, dropping blanks.
pub fn parse_type_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_defaults() {
        let config = GeneratorConfig::builder()
            .type_names(vec!["Animal".to_string()])
            .build()
            .unwrap();
        assert_eq!(config.type_names, vec!["Animal"]);
        assert_eq!(config.prefix, "");
        assert!(!config.factory && !config.unexported && !config.unique_option);
    }

    #[test]
    fn builder_missing_required_field() {
        let err = GeneratorConfig::builder().prefix("With").build().unwrap_err();
        assert!(err.to_string().contains("type_names"));
    }

    #[test]
    fn builder_rejects_empty_and_invalid_names() {
        let err = GeneratorConfig::builder()
            .type_names(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("at least one"));

        let err = GeneratorConfig::builder()
            .type_names(vec!["Not-A-Type".to_string()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Not-A-Type"));

        let err = GeneratorConfig::builder()
            .type_names(vec!["T".to_string()])
            .prefix("With ")
            .build()
            .unwrap_err();
        assert!(matches!(err, BuilderError::InvalidField { field: "prefix", .. }));
    }

    #[test]
    fn derives_component_configs() {
        let config = GeneratorConfig::builder()
            .type_names(parse_type_list("Test"))
            .prefix("With")
            .factory(true)
            .unexported(true)
            .unique_option(true)
            .build()
            .unwrap();
        assert_eq!(
            config.naming(),
            NamingConfig {
                prefix: "With".into(),
                include_unexported: true,
                enforce_unique_naming: true,
            }
        );
        assert_eq!(
            config.synth(),
            SynthConfig {
                emit_constructor: true,
                unique_option_type: true,
            }
        );
    }

    #[test]
    fn type_list_is_split_and_trimmed() {
        assert_eq!(parse_type_list("Animal, Test,,"), vec!["Animal", "Test"]);
        assert!(parse_type_list("").is_empty());
    }

    #[test]
    fn deserializes_from_json() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"type-names": ["Animal"], "factory": true}"#).unwrap();
        assert_eq!(config.type_names, vec!["Animal"]);
        assert!(config.factory);
        assert!(config.prefix.is_empty());
    }
}
