//! Option function names.

use crate::catalog::FieldCatalog;
use crate::error::GenerateError;
use crate::tags::TagSet;
use std::collections::HashMap;

/// Naming rules taken from the generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingConfig {
    /// Prepended to every option function name.
    pub prefix: String,

    /// Generate options for fields starting with a lower-case letter.
    pub include_unexported: bool,

    /// Fail when two fields would produce the same function name.
    pub enforce_unique_naming: bool,
}

/// A field that gets an option function, and that function's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub key: String,
    pub function: String,
}

/// Whether a field name is unexported in Go terms.
pub fn is_unexported(key: &str) -> bool {
    key.chars().next().is_some_and(char::is_lowercase)
}

/// Whether `s` is a valid Go identifier.
pub fn is_go_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Upper-case the first character.
pub fn title(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Function name for one field, or `None` when the field gets no option.
pub fn resolve_name(key: &str, tags: &TagSet, config: &NamingConfig) -> Option<String> {
    if is_unexported(key) && !config.include_unexported {
        return None;
    }
    if tags.option_suppressed() {
        return None;
    }
    let stem = tags.option_name().unwrap_or(key);
    Some(format!("{}{}", config.prefix, title(stem)))
}

/// Option names already emitted in this batch, with the field that owns
/// each one.
///
/// Every file produced in one run lands in the same Go package, so with
/// unique naming enforced a name may only be used once across all types.
#[derive(Debug, Default)]
pub struct NameRegistry {
    owners: HashMap<String, String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner of `function`, if it was emitted before.
    pub fn owner(&self, function: &str) -> Option<&str> {
        self.owners.get(function).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Resolve names for every field of a catalog, in key order.
///
/// With unique naming enforced, a clash inside the catalog or with a name
/// registered by an earlier type is a [`GenerateError::NamingCollision`].
/// Names are only registered once the whole catalog has resolved.
pub fn resolve_names(
    catalog: &FieldCatalog,
    config: &NamingConfig,
    registry: &mut NameRegistry,
) -> Result<Vec<ResolvedName>, GenerateError> {
    let mut resolved = Vec::new();
    let mut local: HashMap<String, String> = HashMap::new();

    for entry in catalog.entries() {
        let Some(function) = resolve_name(&entry.key, &entry.tags, config) else {
            continue;
        };

        if config.enforce_unique_naming {
            let owner = format!("{}.{}", catalog.type_name(), entry.key);
            let previous = local
                .get(&function)
                .map(String::as_str)
                .or_else(|| registry.owner(&function));
            if let Some(previous) = previous {
                return Err(GenerateError::NamingCollision {
                    name: function,
                    first: previous.to_string(),
                    second: owner,
                });
            }
            local.insert(function.clone(), owner);
        }

        resolved.push(ResolvedName {
            key: entry.key.clone(),
            function,
        });
    }

    registry.owners.extend(local);
    Ok(resolved)
}
