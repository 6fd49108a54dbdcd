//! Import selection for generated files.
//!
//! A generated file may only import packages it references, so the visible
//! imports of the source package are filtered down to those whose short
//! name prefixes a qualified reference in the emitted fields.
//!
//! Matching is by plain string prefix. An import named `t` is therefore
//! selected by a sighting of `time.Time`; this is a known limitation.

use crate::synth::quote_go_string;
use crate::syntax::ImportSpec;
use std::collections::{BTreeMap, BTreeSet};

/// Select the imports needed by `sightings`, sorted by path.
pub fn select_imports<'a>(
    sightings: &BTreeSet<String>,
    visible: impl IntoIterator<Item = &'a ImportSpec>,
) -> Vec<ImportSpec> {
    let mut selected: BTreeMap<&str, &ImportSpec> = BTreeMap::new();
    for spec in visible {
        if !spec.is_referenceable() || selected.contains_key(spec.path.as_str()) {
            continue;
        }
        let name = spec.short_name();
        if sightings.iter().any(|sighting| sighting.starts_with(name)) {
            selected.insert(spec.path.as_str(), spec);
        }
    }
    selected.into_values().cloned().collect()
}

/// Source text of one import line, without indentation.
///
/// The alias is only written when it differs from the name derived from the
/// path.
pub fn render_import(spec: &ImportSpec) -> String {
    match &spec.alias {
        Some(alias) if alias != spec.default_name() => {
            format!("{alias} {}", quote_go_string(&spec.path))
        }
        _ => quote_go_string(&spec.path),
    }
}
