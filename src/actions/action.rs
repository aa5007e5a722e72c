//! Grammar model: node types, rules, and actions.
//!
//! Rules and actions are closed tagged unions compared and hashed by value,
//! so they can serve directly as vocabulary keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a grammar slot may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeConstraint {
    /// Exactly one subtree, expanded by a rule.
    Node,
    /// A terminal token sequence.
    Token,
    /// Zero or more subtrees, terminated by a close action.
    Variadic,
}

/// The semantic slot a subtree fills: a type name plus its constraint.
///
/// Two node types are equal iff both name and constraint match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeType {
    pub name: String,
    pub constraint: NodeConstraint,
}

impl NodeType {
    /// Create a node type.
    pub fn new(name: impl Into<String>, constraint: NodeConstraint) -> Self {
        Self { name: name.into(), constraint }
    }

    /// The Node-constrained counterpart of this type.
    ///
    /// Variadic maps to Node; Node and Token are unchanged. Vocabulary
    /// tables index node types in this normalized form.
    #[must_use]
    pub fn normalized(&self) -> NodeType {
        match self.constraint {
            NodeConstraint::Variadic => NodeType::new(self.name.clone(), NodeConstraint::Node),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.name, self.constraint)
    }
}

/// Expands a Node-constrained slot into named children, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpandTreeRule {
    /// The node type this rule produces.
    pub parent: NodeType,
    /// `(field name, child slot type)` pairs; order fixes traversal order.
    pub children: Vec<(String, NodeType)>,
}

impl ExpandTreeRule {
    /// Create an expand rule.
    pub fn new(parent: NodeType, children: Vec<(String, NodeType)>) -> Self {
        Self { parent, children }
    }
}

/// A structural rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// Expand the current open node into children.
    ExpandTree(ExpandTreeRule),
    /// Terminate the child list of a Variadic slot.
    CloseVariadicField,
}

/// Payload of a token emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    /// A literal token. The same variant covers both vocabulary-generated
    /// tokens and tokens copied verbatim from the input query; the
    /// distinction exists only in tensor space.
    Text(String),
    /// Terminate the token sequence of the current Token slot.
    CloseNode,
}

/// One step of a program expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Apply a structural rule to the current open node.
    ApplyRule(Rule),
    /// Emit one token (or terminate a token sequence) at the current
    /// open node.
    GenerateToken(Token),
}
