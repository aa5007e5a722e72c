//! Grammar-typed abstract syntax trees.
//!
//! An [`Ast`] is the tree-shaped program representation every other module
//! consumes: language adapters parse concrete programs into it, action
//! sequences linearize it, and `generate` rebuilds it from a replayed
//! sequence. All types here are plain immutable values.
//!
//! # Example
//!
//! ```
//! use sintetizar::asts::{Ast, Field, FieldValue, Leaf, Node};
//!
//! // Circle(r = 1)
//! let ast = Ast::Node(Node::new(
//!     "Circle",
//!     vec![Field::new(
//!         "r",
//!         "size",
//!         FieldValue::One(Ast::Leaf(Leaf::new("size", "1"))),
//!     )],
//! ));
//! assert_eq!(ast.type_name(), "Circle");
//! ```

use serde::{Deserialize, Serialize};

/// A grammar-typed AST: either an interior node or a leaf value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ast {
    /// An interior node expanded by a grammar rule.
    Node(Node),
    /// A terminal value.
    Leaf(Leaf),
}

impl Ast {
    /// The semantic type name of this tree.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Ast::Node(node) => &node.type_name,
            Ast::Leaf(leaf) => &leaf.type_name,
        }
    }
}

/// An interior node: a type name plus named, typed fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Semantic type of the node (e.g. `Circle`, `FunctionDef`).
    pub type_name: String,
    /// Child fields in declared order. The order is significant: it fixes
    /// the traversal order of the action sequence.
    pub fields: Vec<Field>,
}

impl Node {
    /// Create a node from a type name and its fields.
    pub fn new(type_name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self { type_name: type_name.into(), fields }
    }
}

/// A named slot of a node, carrying the slot's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Field name within the parent node (e.g. `body`).
    pub name: String,
    /// Declared type of the slot, which may differ from the concrete
    /// child's own type (subtyping).
    pub type_name: String,
    /// The field content.
    pub value: FieldValue,
}

impl Field {
    /// Create a field from its name, declared type, and value.
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: FieldValue,
    ) -> Self {
        Self { name: name.into(), type_name: type_name.into(), value }
    }
}

/// Content of a field: exactly one subtree, or a variadic child list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    /// A single child: a node (Node-constrained slot) or a leaf
    /// (Token-constrained slot).
    One(Ast),
    /// Zero or more children (Variadic-constrained slot).
    Many(Vec<Ast>),
}

/// A terminal value carrying its semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Leaf {
    /// Semantic type of the value (e.g. `size`).
    pub type_name: String,
    /// The literal value.
    pub value: String,
}

impl Leaf {
    /// Create a leaf from its type name and value.
    pub fn new(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { type_name: type_name.into(), value: value.into() }
    }
}
