//! Action-sequence representation of grammar-typed ASTs.
//!
//! A program tree is linearized into a flat list of actions: structural
//! rule applications ([`Action::ApplyRule`]) and token emissions
//! ([`Action::GenerateToken`]). Replaying the list left to right rebuilds
//! the tree, so the list is both a training target for sequence models and
//! the state of an in-progress synthesis.
//!
//! - [`NodeType`] / [`Rule`] — the grammar model: what a slot may hold and
//!   how a node expands into named children.
//! - [`ActionSequence`] — the mutable, partially-built program: an ordered
//!   action log plus a stack of open slots awaiting expansion.
//! - [`InvalidActionError`] — raised when an action violates the grammar
//!   or frontier contract.
//!
//! # Example
//!
//! ```
//! use sintetizar::actions::{
//!     Action, ActionSequence, ExpandTreeRule, NodeConstraint, NodeType, Rule, Token,
//! };
//!
//! let circle = ExpandTreeRule::new(
//!     NodeType::new("Circle", NodeConstraint::Node),
//!     vec![("r".to_string(), NodeType::new("size", NodeConstraint::Token))],
//! );
//!
//! let mut sequence = ActionSequence::new();
//! sequence.eval(Action::ApplyRule(Rule::ExpandTree(circle)))?;
//! sequence.eval(Action::GenerateToken(Token::Text("1".to_string())))?;
//! sequence.eval(Action::GenerateToken(Token::CloseNode))?;
//! assert!(sequence.is_complete());
//! # Ok::<(), sintetizar::actions::InvalidActionError>(())
//! ```

mod action;
mod error;
mod sequence;

pub use action::{Action, ExpandTreeRule, NodeConstraint, NodeType, Rule, Token};
pub use error::{InvalidActionError, Result};
pub use sequence::{ActionSequence, Head, Parent};
