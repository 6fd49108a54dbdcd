//! Syntax tree for the subset of Go that the generator reads.
//!
//! Only declarations matter here: the package clause, imports, and struct
//! type declarations with their fields. Everything else in a file is skipped
//! by the parser.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A Go type expression as written in a field declaration.
///
/// The set of variants is closed. Shapes the generator cannot render are
/// kept as [`TypeExpr::Unsupported`] so that resolution fails loudly
/// instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `Name`
    Ident(String),

    /// `*X`
    Pointer(Box<TypeExpr>),

    /// `pkg.Name`
    Qualified { package: String, name: String },

    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },

    /// `[]T`
    Slice(Box<TypeExpr>),

    /// `[N]T`, with `N` kept as source text.
    Array { len: String, elem: Box<TypeExpr> },

    /// `chan T`, `<-chan T`, `chan<- T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },

    /// `interface{}`
    EmptyInterface,

    /// Anything else: struct literals, func types, non-empty interfaces,
    /// generic instantiations. Carries a short description of the shape.
    Unsupported(String),
}

/// Direction of a channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Ident(name) => write!(f, "identifier {name}"),
            TypeExpr::Pointer(_) => f.write_str("pointer type"),
            TypeExpr::Qualified { package, name } => write!(f, "qualified identifier {package}.{name}"),
            TypeExpr::Map { .. } => f.write_str("map type"),
            TypeExpr::Slice(_) => f.write_str("slice type"),
            TypeExpr::Array { .. } => f.write_str("array type"),
            TypeExpr::Chan { .. } => f.write_str("channel type"),
            TypeExpr::EmptyInterface => f.write_str("empty interface"),
            TypeExpr::Unsupported(shape) => f.write_str(shape),
        }
    }
}

/// One line of a struct's field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Declared names. Empty for an embedded (anonymous) field.
    pub names: Vec<String>,

    /// The field's type expression.
    pub ty: TypeExpr,

    /// Tag contents with the string quoting already removed.
    pub tag: Option<String>,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

/// A `type Name struct { ... }` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

/// An import spec, e.g. `jen "github.com/dave/jennifer/jen"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ImportSpec {
    /// Explicit alias, including `_` and `.`.
    pub alias: Option<String>,

    /// Import path without quotes.
    pub path: String,
}

impl ImportSpec {
    /// Name the package is referred to by in source: the alias, or else the
    /// name assumed from the path.
    pub fn short_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.default_name(),
        }
    }

    /// Package name assumed from the path, ignoring any alias.
    ///
    /// Follows the goimports convention: the last element, or the one before
    /// a `/vN` major version suffix, without a `go-` prefix, cut at the first
    /// character that cannot appear in an identifier. So `gopkg.in/yaml.v3`
    /// is `yaml` and `github.com/mattn/go-isatty` is `isatty`.
    pub fn default_name(&self) -> &str {
        let mut segments = self.path.rsplit('/');
        let last = segments.next().unwrap_or(&self.path);
        let base = match segments.next() {
            Some(prev) if is_major_version(last) => prev,
            _ => last,
        };
        let base = base.strip_prefix("go-").unwrap_or(base);
        match base.find(|c: char| !(c == '_' || c.is_alphanumeric())) {
            Some(end) => &base[..end],
            None => base,
        }
    }

    /// Blank (`_`) and dot (`.`) imports never name a package in source.
    pub fn is_referenceable(&self) -> bool {
        !matches!(self.alias.as_deref(), Some("_") | Some("."))
    }
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].bytes().all(|b| b.is_ascii_digit())
}

/// One parsed Go source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub structs: Vec<StructDecl>,
}

/// All non-test Go files of one directory.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
}

impl Package {
    /// Look up a struct declaration by type name.
    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.files
            .iter()
            .flat_map(|file| file.structs.iter())
            .find(|decl| decl.name == name)
    }

    /// Every import visible to the package, deduplicated by alias and path.
    pub fn imports(&self) -> Vec<&ImportSpec> {
        let mut seen = std::collections::BTreeSet::new();
        self.files
            .iter()
            .flat_map(|file| file.imports.iter())
            .filter(|spec| seen.insert((spec.alias.as_deref(), spec.path.as_str())))
            .collect()
    }

    /// Names of every struct type declared in the package, sorted.
    pub fn struct_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .files
            .iter()
            .flat_map(|file| file.structs.iter().map(|decl| decl.name.as_str()))
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(alias: Option<&str>, path: &str) -> ImportSpec {
        ImportSpec {
            alias: alias.map(str::to_string),
            path: path.to_string(),
        }
    }

    #[test]
    fn short_name_uses_last_segment() {
        assert_eq!(spec(None, "encoding/gob").short_name(), "gob");
        assert_eq!(spec(None, "time").short_name(), "time");
    }

    #[test]
    fn short_name_prefers_alias() {
        assert_eq!(spec(Some("j"), "github.com/dave/jennifer/jen").short_name(), "j");
    }

    #[test]
    fn short_name_skips_major_version() {
        assert_eq!(spec(None, "github.com/go-chi/chi/v5").short_name(), "chi");
        assert_eq!(spec(None, "v2").short_name(), "v2");
    }

    #[test]
    fn short_name_is_assumed_like_goimports() {
        assert_eq!(spec(None, "gopkg.in/yaml.v3").short_name(), "yaml");
        assert_eq!(spec(None, "github.com/mattn/go-isatty").short_name(), "isatty");
        assert_eq!(spec(None, "github.com/foo/client-go").short_name(), "client");
        assert_eq!(spec(None, "github.com/olivere/elastic.v5/v7").short_name(), "elastic");
    }

    #[test]
    fn blank_and_dot_imports_are_not_referenceable() {
        assert!(!spec(Some("_"), "embed").is_referenceable());
        assert!(!spec(Some("."), "fmt").is_referenceable());
        assert!(spec(Some("t"), "time").is_referenceable());
    }
}
