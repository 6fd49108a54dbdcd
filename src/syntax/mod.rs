//! Go front-end: loads a package directory into declaration syntax trees.
//!
//! The generator only needs the package name, the imports visible to the
//! package, and struct type declarations. Files are read in sorted order so
//! that lookups and diagnostics are stable between runs.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{ChanDir, FieldDecl, ImportSpec, Package, SourceFile, StructDecl, TypeExpr};
pub use parser::{parse_file, ParseError};

use crate::error::LoadError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load every non-test `.go` file in `dir` as one package. Files excluded
/// by an `ignore` build constraint are skipped.
pub fn load_package(dir: &Path) -> Result<Package, LoadError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if is_package_source(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let src = std::fs::read_to_string(path).map_err(io_error(path.as_path()))?;
        if is_build_ignored(&src) {
            debug!(file = %path.display(), "Skipping file excluded by build constraint");
            continue;
        }
        files.push(load_source(path, &src)?);
    }

    if files.is_empty() {
        return Err(LoadError::NoGoFiles(dir.to_path_buf()));
    }

    let names: BTreeSet<&str> = files.iter().map(|f| f.package.as_str()).collect();
    if names.len() != 1 {
        return Err(LoadError::MultiplePackages {
            dir: dir.to_path_buf(),
            found: names.into_iter().map(str::to_string).collect(),
        });
    }
    let name = files[0].package.clone();

    debug!(
        dir = %dir.display(),
        package = %name,
        files = files.len(),
        "Loaded Go package"
    );

    Ok(Package {
        name,
        dir: dir.to_path_buf(),
        files,
    })
}

/// Parse one source text, attributing syntax errors to `path`.
pub fn load_source(path: &Path, src: &str) -> Result<SourceFile, LoadError> {
    let file = parse_file(path, src).map_err(|e| LoadError::Syntax {
        file: path.to_path_buf(),
        line: e.line,
        column: e.column,
        message: e.message,
    })?;
    debug!(
        file = %path.display(),
        imports = file.imports.len(),
        structs = file.structs.len(),
        "Parsed Go source"
    );
    Ok(file)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError {
    let path = path.to_path_buf();
    move |source| LoadError::Io { path, source }
}

fn is_package_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    path.is_file() && name.ends_with(".go") && !name.ends_with("_test.go") && !name.starts_with('.')
}

/// Whether the file opts out of every build with a leading `ignore`
/// constraint (`//go:build ignore` or `// +build ignore`).
///
/// Constraints must precede the package clause, so scanning stops at the
/// first line that is neither blank nor a line comment.
fn is_build_ignored(src: &str) -> bool {
    for line in src.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        let Some(comment) = line.strip_prefix("//") else {
            return false;
        };
        let constraint = comment
            .strip_prefix("go:build ")
            .or_else(|| comment.trim_start().strip_prefix("+build "));
        if constraint.is_some_and(|expr| expr.trim() == "ignore") {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_are_not_package_sources() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("animal.go");
        let test = dir.path().join("animal_test.go");
        std::fs::write(&main, "package animal\n").unwrap();
        std::fs::write(&test, "package animal_test\n").unwrap();

        assert!(is_package_source(&main));
        assert!(!is_package_source(&test));
        assert!(!is_package_source(dir.path()));
    }

    #[test]
    fn syntax_error_names_the_file() {
        let err = load_source(Path::new("broken.go"), "package p\ntype T struct {").unwrap_err();
        match err {
            LoadError::Syntax { file, line, .. } => {
                assert_eq!(file, PathBuf::from("broken.go"));
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ignored_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("animal.go"),
            "package animal\n\ntype Animal struct {\n\tName string\n}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("gen.go"),
            "//go:build ignore\n\npackage main\n\nfunc main() {}\n",
        )
        .unwrap();

        let package = load_package(dir.path()).unwrap();
        assert_eq!(package.name, "animal");
        assert_eq!(package.files.len(), 1);
    }

    #[test]
    fn only_ignored_files_means_no_go_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gen.go"), "// +build ignore\n\npackage main\n").unwrap();
        assert!(matches!(load_package(dir.path()), Err(LoadError::NoGoFiles(_))));
    }

    #[test]
    fn build_constraint_detection() {
        assert!(is_build_ignored("// Copyright\n\n//go:build ignore\n\npackage main\n"));
        assert!(!is_build_ignored("//go:build linux\n\npackage p\n"));
        assert!(!is_build_ignored("//go:build !ignore\n\npackage p\n"));
        assert!(!is_build_ignored("package p\n\n//go:build ignore\n"));
    }
}
