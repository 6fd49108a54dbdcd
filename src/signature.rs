//! Canonical type signatures for field type expressions.
//!
//! A signature is the text used as the parameter type of an option
//! function. Resolution is a pure function of the expression; qualified
//! references seen along the way are returned next to the signature rather
//! than collected in shared state.

use crate::error::GenerateError;
use crate::syntax::{ChanDir, TypeExpr};
use serde::Serialize;
use std::collections::BTreeSet;

/// The resolved form of one type expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedType {
    /// Canonical text, e.g. `map[time.Time]*time.Time`.
    pub signature: String,

    /// Every qualified reference inside the expression, e.g. `time.Time`.
    pub qualified: BTreeSet<String>,
}

impl ResolvedType {
    /// Terminal type name, ignoring pointers and package qualifiers.
    ///
    /// This is the name Go gives an embedded field: `*jen.Statement` is
    /// addressed as `Statement`.
    pub fn embedded_name(&self) -> &str {
        let base = self.signature.trim_start_matches('*');
        base.rsplit('.').next().unwrap_or(base)
    }
}

/// Resolve a type expression to its canonical signature.
///
/// `field` is only used to label errors.
pub fn resolve_type(field: &str, expr: &TypeExpr) -> Result<ResolvedType, GenerateError> {
    let mut qualified = BTreeSet::new();
    let signature = render(field, expr, &mut qualified)?;
    Ok(ResolvedType {
        signature,
        qualified,
    })
}

fn render(
    field: &str,
    expr: &TypeExpr,
    qualified: &mut BTreeSet<String>,
) -> Result<String, GenerateError> {
    let text = match expr {
        TypeExpr::Ident(name) => name.clone(),
        TypeExpr::Pointer(inner) => format!("*{}", render(field, inner, qualified)?),
        TypeExpr::Qualified { package, name } => {
            let text = format!("{package}.{name}");
            qualified.insert(text.clone());
            text
        }
        TypeExpr::Map { key, value } => format!(
            "map[{}]{}",
            render(field, key, qualified)?,
            render(field, value, qualified)?
        ),
        TypeExpr::Slice(elem) => format!("[]{}", render(field, elem, qualified)?),
        TypeExpr::Array { len, elem } => format!("[{len}]{}", render(field, elem, qualified)?),
        TypeExpr::Chan { dir, elem } => {
            let elem = render(field, elem, qualified)?;
            match dir {
                ChanDir::Both => format!("chan {elem}"),
                ChanDir::Send => format!("chan<- {elem}"),
                ChanDir::Recv => format!("<-chan {elem}"),
            }
        }
        TypeExpr::EmptyInterface => "interface{}".to_string(),
        TypeExpr::Unsupported(shape) => {
            return Err(GenerateError::UnsupportedExpression {
                field: field.to_string(),
                shape: shape.clone(),
            })
        }
    };
    Ok(text)
}
