//! The parser/interpreter boundary.
//!
//! Concrete languages (a Python frontend, a shape DSL, a diff format) live
//! outside the core. The core consumes them through two narrow traits: a
//! [`Parser`] converting between concrete programs and grammar-typed ASTs,
//! and an [`IsSubtype`] relation used by grammar-aware candidate
//! filtering. Both fail softly: an unparseable value maps to `None` and
//! the caller skips the sample.

use crate::asts::Ast;

/// Converts between concrete program values and grammar-typed ASTs.
pub trait Parser<V> {
    /// Parse a concrete value; `None` when the input is unparseable
    /// (the caller must skip the sample).
    fn parse(&self, value: &V) -> Option<Ast>;

    /// Render an AST back to a concrete value; `None` when the tree does
    /// not describe a valid program.
    fn unparse(&self, ast: &Ast) -> Option<V>;
}

/// The subtype relation of a language's type names.
pub trait IsSubtype {
    /// True iff a `subtype`-typed tree may fill a `basetype`-typed slot.
    fn is_subtype(&self, subtype: &str, basetype: &str) -> bool;
}

/// Adapter lifting a plain function into an [`IsSubtype`].
///
/// ```
/// use sintetizar::languages::{IsSubtype, SubtypeFn};
///
/// let csg = SubtypeFn(|subtype: &str, basetype: &str| {
///     basetype == "CSG" || subtype == basetype
/// });
/// assert!(csg.is_subtype("Circle", "CSG"));
/// assert!(!csg.is_subtype("CSG", "Circle"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SubtypeFn<F>(pub F);

impl<F: Fn(&str, &str) -> bool> IsSubtype for SubtypeFn<F> {
    fn is_subtype(&self, subtype: &str, basetype: &str) -> bool {
        (self.0)(subtype, basetype)
    }
}
