//! Field catalog: every field of a struct keyed by the name it is assigned
//! through.
//!
//! The catalog is a lookup store. Emission order always comes from
//! [`FieldCatalog::sorted_keys`], never from map iteration.

use crate::error::GenerateError;
use crate::signature::{resolve_type, ResolvedType};
use crate::syntax::StructDecl;
use crate::naming::is_go_identifier;
use crate::synth::TEXT_TYPE;
use crate::tags::{parse_tags, TagSet};
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::debug;

/// Blank field name; such fields cannot be assigned.
const BLANK: &str = "_";

/// What the generator knows about one field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldEntry {
    /// Name used in `o.<key> = x`.
    pub key: String,

    /// Parameter type of the option function.
    #[serde(flatten)]
    pub resolved: ResolvedType,

    pub tags: TagSet,

    /// Declared without a name.
    pub embedded: bool,
}

impl FieldEntry {
    pub fn signature(&self) -> &str {
        &self.resolved.signature
    }
}

/// Fields of one struct, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    type_name: String,
    fields: HashMap<String, FieldEntry>,
}

impl FieldCatalog {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, key: &str) -> Option<&FieldEntry> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keys in byte-wise lexicographic order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = &FieldEntry> {
        self.sorted_keys().into_iter().filter_map(|key| self.fields.get(key))
    }

    fn insert(&mut self, entry: FieldEntry) {
        if let Some(previous) = self.fields.insert(entry.key.clone(), entry) {
            debug!(
                type_name = %self.type_name,
                key = %previous.key,
                "Field key declared twice; keeping the later declaration"
            );
        }
    }
}

impl Serialize for FieldCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries().map(|entry| (&entry.key, entry)))
    }
}

/// Build the catalog for one struct declaration.
///
/// Named fields are keyed by their declared name. Embedded fields are keyed
/// by the name Go gives them, the terminal identifier of their type. When
/// two embedded fields end up with the same key the later one wins.
pub fn build_catalog(decl: &StructDecl) -> Result<FieldCatalog, GenerateError> {
    let mut catalog = FieldCatalog {
        type_name: decl.name.clone(),
        fields: HashMap::with_capacity(decl.fields.len()),
    };

    for (idx, field) in decl.fields.iter().enumerate() {
        let label = if field.is_embedded() {
            format!("{}.<embedded #{idx}>", decl.name)
        } else {
            format!("{}.{}", decl.name, field.names.join(", "))
        };

        let resolved = resolve_type(&label, &field.ty)?;
        let tags = match &field.tag {
            Some(raw) => parse_tags(&label, raw)?,
            None => TagSet::default(),
        };
        check_tags(&label, field.tag.as_deref().unwrap_or_default(), &resolved, &tags)?;

        if field.is_embedded() {
            catalog.insert(FieldEntry {
                key: resolved.embedded_name().to_string(),
                resolved,
                tags,
                embedded: true,
            });
            continue;
        }

        for name in &field.names {
            if name == BLANK {
                debug!(type_name = %decl.name, "Skipping blank field");
                continue;
            }
            catalog.insert(FieldEntry {
                key: name.clone(),
                resolved: resolved.clone(),
                tags: tags.clone(),
                embedded: false,
            });
        }
    }

    debug!(
        type_name = %decl.name,
        fields = catalog.len(),
        "Built field catalog"
    );
    Ok(catalog)
}

/// Reject tags whose values cannot appear in generated code: an empty
/// `default` on a non-string field, or an `option` name that is not an
/// identifier.
fn check_tags(
    label: &str,
    raw: &str,
    resolved: &ResolvedType,
    tags: &TagSet,
) -> Result<(), GenerateError> {
    let malformed = |reason: String| GenerateError::MalformedTag {
        field: label.to_string(),
        tag: raw.to_string(),
        reason,
    };

    if let Some(value) = tags.default_value() {
        if value.trim().is_empty() && resolved.signature != TEXT_TYPE {
            return Err(malformed(format!(
                "empty default for field of type {}",
                resolved.signature
            )));
        }
    }

    if let Some(name) = tags.option_name() {
        if !tags.option_suppressed() && !is_go_identifier(name) {
            return Err(malformed(format!("option name {name:?} is not a Go identifier")));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{FieldDecl, TypeExpr};

    fn named(name: &str, ty: TypeExpr, tag: Option<&str>) -> FieldDecl {
        FieldDecl {
            names: vec![name.to_string()],
            ty,
            tag: tag.map(str::to_string),
        }
    }

    fn embedded(ty: TypeExpr) -> FieldDecl {
        FieldDecl {
            names: Vec::new(),
            ty,
            tag: None,
        }
    }

    fn ident(name: &str) -> TypeExpr {
        TypeExpr::Ident(name.to_string())
    }

    fn decl(fields: Vec<FieldDecl>) -> StructDecl {
        StructDecl {
            name: "Test".into(),
            fields,
        }
    }

    #[test]
    fn named_fields_keep_their_case() {
        let catalog = build_catalog(&decl(vec![
            named("Surname", ident("string"), Some(r#"default:"n/a""#)),
            named("cute", ident("bool"), None),
        ]))
        .unwrap();
        assert_eq!(catalog.sorted_keys(), vec!["Surname", "cute"]);
        assert_eq!(catalog.get("Surname").unwrap().tags.default_value(), Some("n/a"));
        assert_eq!(catalog.get("cute").unwrap().signature(), "bool");
    }

    #[test]
    fn embedded_field_is_keyed_by_its_type() {
        let catalog = build_catalog(&decl(vec![
            embedded(ident("Widget")),
            embedded(TypeExpr::Pointer(Box::new(TypeExpr::Qualified {
                package: "jen".into(),
                name: "Statement".into(),
            }))),
        ]))
        .unwrap();
        let widget = catalog.get("Widget").unwrap();
        assert!(widget.embedded);
        assert_eq!(widget.signature(), "Widget");
        assert_eq!(catalog.get("Statement").unwrap().signature(), "*jen.Statement");
    }

    #[test]
    fn later_embedded_field_overwrites_earlier() {
        let mut second = embedded(TypeExpr::Pointer(Box::new(ident("Widget"))));
        second.tag = Some(r#"default:"&Widget{}""#.into());
        let catalog = build_catalog(&decl(vec![embedded(ident("Widget")), second])).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Widget").unwrap().signature(), "*Widget");
    }

    #[test]
    fn grouped_names_share_type_and_tags() {
        let field = FieldDecl {
            names: vec!["x".into(), "y".into()],
            ty: ident("int"),
            tag: Some(r#"default:"1""#.into()),
        };
        let catalog = build_catalog(&decl(vec![field])).unwrap();
        assert_eq!(catalog.sorted_keys(), vec!["x", "y"]);
        assert_eq!(catalog.get("y").unwrap().tags.default_value(), Some("1"));
    }

    #[test]
    fn sorted_keys_are_bytewise() {
        let catalog = build_catalog(&decl(vec![
            named("b", ident("int"), None),
            named("Name", ident("string"), None),
            named("a", ident("int"), None),
            named("EmbedThis", ident("int"), None),
        ]))
        .unwrap();
        assert_eq!(catalog.sorted_keys(), vec!["EmbedThis", "Name", "a", "b"]);
    }

    #[test]
    fn unsupported_field_type_fails_the_catalog() {
        let err = build_catalog(&decl(vec![named(
            "A",
            TypeExpr::Unsupported("struct type".into()),
            None,
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("Test.A"));
    }

    #[test]
    fn malformed_tag_fails_the_catalog() {
        let err = build_catalog(&decl(vec![named("A", ident("int"), Some("default:1"))]))
            .unwrap_err();
        assert!(matches!(err, GenerateError::MalformedTag { .. }));
    }

    #[test]
    fn serializes_in_key_order() {
        let catalog = build_catalog(&decl(vec![
            named("b", ident("int"), None),
            named("A", ident("string"), Some(r#"default:"x""#)),
        ]))
        .unwrap();
        let json = serde_json::to_string(&catalog).unwrap();
        assert!(json.find("\"A\"").unwrap() < json.find("\"b\"").unwrap());
        assert!(json.contains(r#""signature":"string""#));
    }

    fn reason(err: GenerateError) -> String {
        match err {
            GenerateError::MalformedTag { reason, .. } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_default_needs_a_string_field() {
        let err = build_catalog(&decl(vec![named("N", ident("int"), Some(r#"default:"""#))]))
            .unwrap_err();
        assert!(reason(err).contains("empty default for field of type int"));

        let catalog =
            build_catalog(&decl(vec![named("S", ident("string"), Some(r#"default:"""#))])).unwrap();
        assert_eq!(catalog.get("S").unwrap().tags.default_value(), Some(""));
    }

    #[test]
    fn option_name_must_be_an_identifier() {
        for tag in [r#"option:"my name""#, r#"option:"9lives""#, r#"option:"a-b""#] {
            let err = build_catalog(&decl(vec![named("A", ident("int"), Some(tag))])).unwrap_err();
            assert!(reason(err).contains("is not a Go identifier"), "{tag}");
        }
        assert!(build_catalog(&decl(vec![named("A", ident("int"), Some(r#"option:"-""#))])).is_ok());
        assert!(build_catalog(&decl(vec![named("A", ident("int"), Some(r#"option:"lives9""#))])).is_ok());
    }

    #[test]
    fn blank_fields_are_skipped() {
        let field = FieldDecl {
            names: vec!["_".into(), "x".into()],
            ty: ident("int"),
            tag: None,
        };
        let catalog = build_catalog(&decl(vec![field, named("_", ident("string"), None)])).unwrap();
        assert_eq!(catalog.sorted_keys(), vec!["x"]);
    }
}
