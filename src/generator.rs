//! Batch driver: one generated file per requested type.
//!
//! Types are processed sequentially in the configured order. A failing type
//! stops the batch; files already handed to the sink stay where they are.

use crate::catalog::{build_catalog, FieldCatalog};
use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};
use crate::imports::select_imports;
use crate::naming::{resolve_names, NameRegistry, ResolvedName};
use crate::output::OutputSink;
use crate::synth::{synthesize, GeneratedFile};
use crate::syntax::Package;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Generates functional options for the configured types of one package.
///
/// Holds the name registry for the batch, so one `Generator` should serve
/// exactly one run.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    registry: NameRegistry,
}

#[derive(Serialize)]
struct CatalogDump<'a> {
    package: &'a str,
    config: &'a GeneratorConfig,
    catalogs: Vec<FieldCatalog>,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            registry: NameRegistry::new(),
        }
    }

    /// Build the file model for a single type.
    pub fn generate_type(&mut self, package: &Package, type_name: &str) -> Result<GeneratedFile> {
        let catalog = self.catalog(package, type_name)?;
        let names = resolve_names(&catalog, &self.config.naming(), &mut self.registry)?;
        let sightings = self.sightings(&catalog, &names);
        let imports = select_imports(&sightings, package.imports());

        debug!(
            type_name,
            fields = catalog.len(),
            options = names.len(),
            imports = imports.len(),
            "Resolved type"
        );

        Ok(synthesize(
            &package.name,
            &catalog,
            &names,
            imports,
            self.config.synth(),
        ))
    }

    /// Generate every configured type and hand the results to `sink`.
    ///
    /// Returns the file names produced, in processing order.
    pub fn run(&mut self, package: &Package, sink: &mut dyn OutputSink) -> Result<Vec<String>> {
        let type_names = self.config.type_names.clone();
        let mut produced = Vec::with_capacity(type_names.len());

        for type_name in &type_names {
            let file = self.generate_type(package, type_name)?;
            let file_name = file.file_name();
            sink.write(&file_name, &file.render())?;
            info!(
                type_name = %type_name,
                file = %file_name,
                options = file.options.len(),
                "Generated functional options"
            );
            produced.push(file_name);
        }

        info!(
            package = %package.name,
            files = produced.len(),
            "Generation complete"
        );
        Ok(produced)
    }

    /// Catalogs of every configured type as pretty JSON.
    pub fn dump_catalogs(&self, package: &Package) -> Result<String> {
        let catalogs = self
            .config
            .type_names
            .iter()
            .map(|name| self.catalog(package, name))
            .collect::<Result<Vec<_>>>()?;
        let dump = CatalogDump {
            package: &package.name,
            config: &self.config,
            catalogs,
        };
        Ok(serde_json::to_string_pretty(&dump)?)
    }

    fn catalog(&self, package: &Package, type_name: &str) -> Result<FieldCatalog> {
        let decl = package
            .struct_decl(type_name)
            .ok_or_else(|| GenerateError::UnknownType {
                name: type_name.to_string(),
                package: package.name.clone(),
                dir: package.dir.clone(),
                declared: package.struct_names().into_iter().map(str::to_string).collect(),
            })?;
        Ok(build_catalog(decl)?)
    }

    /// Qualified references the generated file will contain: parameter
    /// types of emitted options, and field types initialized by the
    /// constructor.
    fn sightings(&self, catalog: &FieldCatalog, names: &[ResolvedName]) -> BTreeSet<String> {
        let named: BTreeSet<&str> = names.iter().map(|n| n.key.as_str()).collect();
        catalog
            .entries()
            .filter(|entry| {
                named.contains(entry.key.as_str())
                    || (self.config.factory && entry.tags.default_value().is_some())
            })
            .flat_map(|entry| entry.resolved.qualified.iter().cloned())
            .collect()
    }
}
