//! Go source synthesis for functional options.
//!
//! Builds a [`GeneratedFile`] model from a resolved catalog and renders it
//! to text. Rendering is a pure function of the model, and the model is
//! built in catalog key order, so the same input always produces the same
//! bytes.

use crate::catalog::FieldCatalog;
use crate::imports::render_import;
use crate::naming::ResolvedName;
use crate::syntax::ImportSpec;
use serde::Serialize;
use std::fmt::Write;

/// First line of every generated file. Matches the convention Go tooling
/// uses to recognize generated code.
pub const HEADER: &str = "// Code generated by funcopgen. DO NOT EDIT.";

/// Exact signature whose defaults are emitted as quoted string literals.
pub const TEXT_TYPE: &str = "string";

/// Switches that shape the synthesized file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthConfig {
    /// Emit `New<Type>(opts ...)`.
    pub emit_constructor: bool,

    /// Name the option type `<Type>Option` instead of `Option`.
    pub unique_option_type: bool,
}

/// One option function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedOption {
    pub function_name: String,
    pub parameter_signature: String,
    pub target_field: String,
}

/// The `New<Type>` constructor and the fields it initializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constructor {
    pub name: String,

    /// `(field, Go expression)` pairs in key order.
    pub defaults: Vec<(String, String)>,
}

/// Everything that goes into one generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub package: String,
    pub type_name: String,
    pub option_type: String,
    pub imports: Vec<ImportSpec>,
    pub constructor: Option<Constructor>,
    pub options: Vec<GeneratedOption>,
}

/// `zz_generated.<type>_funcop.go`, lower-cased.
pub fn output_file_name(type_name: &str) -> String {
    format!("zz_generated.{}_funcop.go", type_name.to_lowercase())
}

/// Go expression for a `default` tag value.
///
/// Fields typed exactly `string` get a quoted literal. Every other type
/// gets the value verbatim, so defaults may be arbitrary expressions such
/// as calls; they are not checked against the field type.
pub fn default_literal(signature: &str, value: &str) -> String {
    if signature == TEXT_TYPE {
        quote_go_string(value)
    } else {
        value.to_string()
    }
}

/// Build the file model for one struct.
///
/// `names` must come from the same catalog; fields without a resolved name
/// get no option function but still contribute constructor defaults.
pub fn synthesize(
    package: &str,
    catalog: &FieldCatalog,
    names: &[ResolvedName],
    imports: Vec<ImportSpec>,
    config: SynthConfig,
) -> GeneratedFile {
    let type_name = catalog.type_name();
    let option_type = if config.unique_option_type {
        format!("{type_name}Option")
    } else {
        "Option".to_string()
    };

    let constructor = config.emit_constructor.then(|| Constructor {
        name: format!("New{type_name}"),
        defaults: catalog
            .entries()
            .filter_map(|entry| {
                let value = entry.tags.default_value()?;
                Some((entry.key.clone(), default_literal(entry.signature(), value)))
            })
            .collect(),
    });

    let options = names
        .iter()
        .filter_map(|name| {
            let entry = catalog.get(&name.key)?;
            Some(GeneratedOption {
                function_name: name.function.clone(),
                parameter_signature: entry.signature().to_string(),
                target_field: entry.key.clone(),
            })
        })
        .collect();

    GeneratedFile {
        package: package.to_string(),
        type_name: type_name.to_string(),
        option_type,
        imports,
        constructor,
        options,
    }
}

impl GeneratedFile {
    pub fn file_name(&self) -> String {
        output_file_name(&self.type_name)
    }

    /// Render the file as gofmt-style Go source.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let ty = &self.type_name;
        let opt = &self.option_type;

        out.push_str(HEADER);
        out.push_str("\n\n");
        let _ = writeln!(out, "package {}", self.package);
        out.push('\n');

        if !self.imports.is_empty() {
            out.push_str("import (\n");
            for spec in &self.imports {
                let _ = writeln!(out, "\t{}", render_import(spec));
            }
            out.push_str(")\n\n");
        }

        let _ = writeln!(out, "type {opt} func(*{ty})");

        if let Some(ctor) = &self.constructor {
            out.push('\n');
            let _ = writeln!(out, "func {}(opts ...{opt}) *{ty} {{", ctor.name);
            if ctor.defaults.is_empty() {
                let _ = writeln!(out, "\to := &{ty}{{}}");
            } else {
                let _ = writeln!(out, "\to := &{ty}{{");
                let keys: Vec<&str> = ctor.defaults.iter().map(|(key, _)| key.as_str()).collect();
                for ((key, value), width) in ctor.defaults.iter().zip(key_columns(&keys)) {
                    let pad = width - key.chars().count() + 1;
                    let _ = writeln!(out, "\t\t{key}:{:pad$}{value},", "");
                }
                out.push_str("\t}\n");
            }
            out.push_str("\n\tfor _, opt := range opts {\n\t\topt(o)\n\t}\n\n\treturn o\n}\n");
        }

        for option in &self.options {
            out.push('\n');
            let _ = writeln!(
                out,
                "func {}(x {}) {opt} {{",
                option.function_name, option.parameter_signature
            );
            let _ = writeln!(out, "\treturn func(o *{ty}) {{");
            let _ = writeln!(out, "\t\to.{} = x", option.target_field);
            out.push_str("\t}\n}\n");
        }

        out
    }
}

/// Width each key of a keyed literal is padded to.
///
/// Lines are aligned in sections the way gofmt splits them: once a key is
/// longer than 40 bytes, a key whose length is at least 2.5 times (or at
/// most 1/2.5 of) the geometric mean of the earlier keys starts a new
/// section.
fn key_columns(keys: &[&str]) -> Vec<usize> {
    const SMALL_SIZE: usize = 40;
    const RATIO: f64 = 2.5;

    let mut section_of = Vec::with_capacity(keys.len());
    let mut section = 0usize;
    let mut ln_sum = 0.0_f64;

    for (idx, key) in keys.iter().enumerate() {
        let size = key.len();
        if idx > 0 {
            let prev_size = keys[idx - 1].len();
            if prev_size > SMALL_SIZE || size > SMALL_SIZE {
                let geomean = (ln_sum / idx as f64).exp();
                let ratio = size as f64 / geomean;
                if RATIO * ratio <= 1.0 || RATIO <= ratio {
                    section += 1;
                }
            }
        }
        section_of.push(section);
        ln_sum += (size as f64).ln();
    }

    let mut widths = vec![0usize; section + 1];
    for (key, &sec) in keys.iter().zip(&section_of) {
        widths[sec] = widths[sec].max(key.chars().count());
    }
    section_of.into_iter().map(|sec| widths[sec]).collect()
}

/// Quote a string as a Go interpreted string literal.
pub fn quote_go_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            c if (c as u32) < 0x80 && c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_catalog;
    use crate::naming::{resolve_names, NameRegistry, NamingConfig};
    use crate::syntax::{FieldDecl, StructDecl, TypeExpr};

    fn field(name: &str, ty: &str, tag: Option<&str>) -> FieldDecl {
        FieldDecl {
            names: vec![name.to_string()],
            ty: TypeExpr::Ident(ty.to_string()),
            tag: tag.map(str::to_string),
        }
    }

    fn animal() -> FieldCatalog {
        build_catalog(&StructDecl {
            name: "Animal".into(),
            fields: vec![
                field("Surname", "string", Some(r#"default:"n/a""#)),
                field("Color", "string", Some(r#"default:"red""#)),
                field("cute", "bool", None),
            ],
        })
        .unwrap()
    }

    fn generate(catalog: &FieldCatalog, naming: NamingConfig, config: SynthConfig) -> String {
        let names = resolve_names(catalog, &naming, &mut NameRegistry::new()).unwrap();
        synthesize("animal", catalog, &names, Vec::new(), config).render()
    }

    fn with_unexported() -> NamingConfig {
        NamingConfig {
            prefix: "With".into(),
            include_unexported: true,
            enforce_unique_naming: false,
        }
    }

    #[test]
    fn renders_animal_scenario() {
        let text = generate(
            &animal(),
            with_unexported(),
            SynthConfig {
                emit_constructor: true,
                unique_option_type: false,
            },
        );
        let expected = r#"// Code generated by funcopgen. DO NOT EDIT.

package animal

type Option func(*Animal)

func NewAnimal(opts ...Option) *Animal {
	o := &Animal{
		Color:   "red",
		Surname: "n/a",
	}

	for _, opt := range opts {
		opt(o)
	}

	return o
}

func WithColor(x string) Option {
	return func(o *Animal) {
		o.Color = x
	}
}

func WithSurname(x string) Option {
	return func(o *Animal) {
		o.Surname = x
	}
}

func WithCute(x bool) Option {
	return func(o *Animal) {
		o.cute = x
	}
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn constructor_is_optional() {
        let text = generate(&animal(), with_unexported(), SynthConfig::default());
        assert!(!text.contains("func NewAnimal"));
        assert!(text.contains("type Option func(*Animal)"));
    }

    #[test]
    fn unique_option_type_is_prefixed_with_type_name() {
        let text = generate(
            &animal(),
            with_unexported(),
            SynthConfig {
                emit_constructor: true,
                unique_option_type: true,
            },
        );
        assert!(text.contains("type AnimalOption func(*Animal)"));
        assert!(text.contains("func NewAnimal(opts ...AnimalOption) *Animal {"));
        assert!(text.contains("func WithCute(x bool) AnimalOption {"));
    }

    #[test]
    fn empty_defaults_render_empty_literal() {
        let catalog = build_catalog(&StructDecl {
            name: "Point".into(),
            fields: vec![field("X", "int", None)],
        })
        .unwrap();
        let text = generate(
            &catalog,
            NamingConfig::default(),
            SynthConfig {
                emit_constructor: true,
                unique_option_type: false,
            },
        );
        assert!(text.contains("\to := &Point{}\n"));
    }

    #[test]
    fn default_literal_policy() {
        assert_eq!(default_literal("string", "n/a"), "\"n/a\"");
        assert_eq!(default_literal("*jen.Statement", "jen.Id(\"lol\")"), "jen.Id(\"lol\")");
        assert_eq!(default_literal("int", "someExpr"), "someExpr");
        assert_eq!(default_literal("*string", "ptr()"), "ptr()");
    }

    #[test]
    fn unexported_defaults_still_initialize() {
        let catalog = build_catalog(&StructDecl {
            name: "T".into(),
            fields: vec![field("level", "int", Some(r#"default:"3""#))],
        })
        .unwrap();
        let text = generate(
            &catalog,
            NamingConfig::default(),
            SynthConfig {
                emit_constructor: true,
                unique_option_type: false,
            },
        );
        assert!(text.contains("\t\tlevel: 3,\n"));
        assert!(!text.contains("func Level"));
    }

    #[test]
    fn renders_imports() {
        let imports = vec![
            ImportSpec {
                alias: None,
                path: "bytes".into(),
            },
            ImportSpec {
                alias: Some("j".into()),
                path: "github.com/dave/jennifer/jen".into(),
            },
        ];
        let text = synthesize("p", &animal(), &[], imports, SynthConfig::default()).render();
        assert!(text.contains("import (\n\t\"bytes\"\n\tj \"github.com/dave/jennifer/jen\"\n)\n\ntype Option"));
    }

    #[test]
    fn long_keys_break_alignment_like_gofmt() {
        let long = "L".repeat(47);
        assert_eq!(key_columns(&["A", &long]), vec![1, 47]);

        let medium = "B".repeat(30);
        let longer = "C".repeat(45);
        assert_eq!(key_columns(&[&medium, &longer]), vec![45, 45]);

        assert_eq!(key_columns(&["Color", "Surname"]), vec![7, 7]);
        assert!(key_columns(&[]).is_empty());
    }

    #[test]
    fn renders_separate_sections_for_outlier_keys() {
        let long = "L".repeat(47);
        let catalog = build_catalog(&StructDecl {
            name: "T".into(),
            fields: vec![
                field("A", "int", Some(r#"default:"1""#)),
                field(&long, "int", Some(r#"default:"2""#)),
            ],
        })
        .unwrap();
        let text = generate(
            &catalog,
            NamingConfig::default(),
            SynthConfig {
                emit_constructor: true,
                unique_option_type: false,
            },
        );
        assert!(text.contains("\t\tA: 1,\n"));
        assert!(text.contains(&format!("\t\t{long}: 2,\n")));
    }

    #[test]
    fn quote_go_string_escapes() {
        assert_eq!(quote_go_string("plain"), "\"plain\"");
        assert_eq!(quote_go_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(quote_go_string("tab\there\n"), "\"tab\\there\\n\"");
        assert_eq!(quote_go_string("\x01"), "\"\\x01\"");
        assert_eq!(quote_go_string("héllo"), "\"héllo\"");
    }

    #[test]
    fn output_file_name_is_lower_cased() {
        assert_eq!(output_file_name("Animal"), "zz_generated.animal_funcop.go");
        assert_eq!(output_file_name("HTTPConfig"), "zz_generated.httpconfig_funcop.go");
    }
}
