//! The mutable, partially-built program state.
//!
//! An [`ActionSequence`] owns an ordered action log and the frontier of
//! open slots awaiting expansion. The frontier is a plain stack of
//! `(node type, parent index, children emitted)` records; parent lookups
//! go through index arrays into the flat log rather than back-pointers
//! into a shared tree.

use super::action::{Action, ExpandTreeRule, NodeConstraint, NodeType, Rule, Token};
use super::error::{InvalidActionError, Result};
use crate::asts::{Ast, Field, FieldValue, Leaf, Node};
use std::hash::{Hash, Hasher};

/// Position of the slot an action filled: the index of the rule action
/// that opened the slot, and the field index within that rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parent {
    /// Index into the action log of the opening `ApplyRule`.
    pub action: usize,
    /// Field index within the opening rule's child list.
    pub field: usize,
}

/// A pending grammar slot.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenSlot {
    /// Slot type; `None` only for the root slot.
    node_type: Option<NodeType>,
    /// Origin of the slot; `None` only for the root slot.
    parent: Option<Parent>,
    /// Children applied (Variadic) or tokens emitted (Token) so far.
    emitted: usize,
}

/// Borrowed view of the next slot awaiting expansion.
#[derive(Debug, Clone, Copy)]
pub struct Head<'a> {
    /// Slot type; `None` for the root slot.
    pub node_type: Option<&'a NodeType>,
    /// Origin of the slot; `None` for the root slot.
    pub parent: Option<Parent>,
    /// Children or tokens emitted into the slot so far.
    pub emitted: usize,
}

/// An ordered action log plus its open-slot frontier.
///
/// The sequence is a valid left-to-right pre-order expansion of a tree:
/// every applied expand rule pushes its children (in declared order) as
/// pending slots, Token slots collect tokens until [`Token::CloseNode`],
/// and Variadic slots collect subtrees until [`Rule::CloseVariadicField`]
/// (zero children is legal). The frontier is owned exclusively by the
/// sequence and mutated only by [`eval`](Self::eval).
///
/// Equality and hashing consider the action log alone; the frontier and
/// parent arrays are derived state.
#[derive(Debug, Clone)]
pub struct ActionSequence {
    actions: Vec<Action>,
    /// `parents[i]` is the slot origin of `actions[i]`; `None` for actions
    /// filling the root slot.
    parents: Vec<Option<Parent>>,
    /// Stack of open slots; the top is the next slot to fill.
    frontier: Vec<OpenSlot>,
}

impl ActionSequence {
    /// An empty sequence: one open root slot, no actions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            parents: Vec::new(),
            frontier: vec![OpenSlot { node_type: None, parent: None, emitted: 0 }],
        }
    }

    /// Linearize an AST into a complete sequence.
    ///
    /// Deterministic depth-first traversal in declared field order. Leaf
    /// fields emit their value followed by [`Token::CloseNode`]; variadic
    /// fields emit each child followed by [`Rule::CloseVariadicField`].
    ///
    /// # Errors
    ///
    /// [`InvalidActionError::LeafOutsideTokenField`] when the AST places a
    /// leaf where no token slot exists (at the root or inside a variadic
    /// field).
    pub fn create(ast: &Ast) -> Result<Self> {
        let mut sequence = Self::new();
        sequence.push_tree(ast)?;
        Ok(sequence)
    }

    fn push_tree(&mut self, ast: &Ast) -> Result<()> {
        let Ast::Node(node) = ast else {
            return Err(InvalidActionError::LeafOutsideTokenField);
        };
        self.eval(Action::ApplyRule(Rule::ExpandTree(rule_for(node))))?;
        for field in &node.fields {
            match &field.value {
                FieldValue::One(Ast::Leaf(leaf)) => {
                    self.eval(Action::GenerateToken(Token::Text(leaf.value.clone())))?;
                    self.eval(Action::GenerateToken(Token::CloseNode))?;
                }
                FieldValue::One(child) => self.push_tree(child)?,
                FieldValue::Many(children) => {
                    for child in children {
                        self.push_tree(child)?;
                    }
                    self.eval(Action::ApplyRule(Rule::CloseVariadicField))?;
                }
            }
        }
        Ok(())
    }

    /// Append `action` and update the frontier.
    ///
    /// # Errors
    ///
    /// [`InvalidActionError`] when the action targets a
    /// constraint-incompatible slot, closes a non-variadic slot, or the
    /// sequence is already complete. The sequence is unchanged on error.
    pub fn eval(&mut self, action: Action) -> Result<()> {
        let slot = self.frontier.last().ok_or(InvalidActionError::SequenceComplete)?;
        let constraint = slot.node_type.as_ref().map(|ty| ty.constraint);
        let parent = slot.parent;
        let index = self.actions.len();

        match &action {
            Action::ApplyRule(Rule::ExpandTree(rule)) => {
                match constraint {
                    Some(NodeConstraint::Token) => {
                        return Err(InvalidActionError::RuleOnTokenSlot);
                    }
                    Some(NodeConstraint::Variadic) => {
                        // The slot stays open for further children.
                        if let Some(top) = self.frontier.last_mut() {
                            top.emitted += 1;
                        }
                    }
                    Some(NodeConstraint::Node) | None => {
                        self.frontier.pop();
                    }
                }
                // Push children reversed so the first declared field is on top.
                for (field, (_, child)) in rule.children.iter().enumerate().rev() {
                    self.frontier.push(OpenSlot {
                        node_type: Some(child.clone()),
                        parent: Some(Parent { action: index, field }),
                        emitted: 0,
                    });
                }
            }
            Action::ApplyRule(Rule::CloseVariadicField) => {
                if constraint != Some(NodeConstraint::Variadic) {
                    return Err(InvalidActionError::CloseNonVariadicSlot);
                }
                self.frontier.pop();
            }
            Action::GenerateToken(token) => {
                if constraint != Some(NodeConstraint::Token) {
                    return Err(InvalidActionError::TokenOnNonTokenSlot);
                }
                match token {
                    Token::Text(_) => {
                        if let Some(top) = self.frontier.last_mut() {
                            top.emitted += 1;
                        }
                    }
                    Token::CloseNode => {
                        self.frontier.pop();
                    }
                }
            }
        }

        self.actions.push(action);
        self.parents.push(parent);
        Ok(())
    }

    /// Rebuild the AST from a complete sequence.
    ///
    /// The tokens of one Token slot concatenate into a single leaf value.
    ///
    /// # Errors
    ///
    /// [`InvalidActionError::IncompleteSequence`] when open slots remain.
    pub fn generate(&self) -> Result<Ast> {
        if !self.is_complete() {
            return Err(InvalidActionError::IncompleteSequence);
        }
        let mut position = 0;
        self.read_tree(&mut position)
    }

    fn read_tree(&self, position: &mut usize) -> Result<Ast> {
        let Some(Action::ApplyRule(Rule::ExpandTree(rule))) = self.actions.get(*position)
        else {
            return Err(InvalidActionError::MalformedSequence);
        };
        *position += 1;

        let mut fields = Vec::with_capacity(rule.children.len());
        for (name, child_type) in &rule.children {
            let value = match child_type.constraint {
                NodeConstraint::Token => {
                    let mut text = String::new();
                    loop {
                        match self.actions.get(*position) {
                            Some(Action::GenerateToken(Token::Text(token))) => {
                                text.push_str(token);
                                *position += 1;
                            }
                            Some(Action::GenerateToken(Token::CloseNode)) => {
                                *position += 1;
                                break;
                            }
                            _ => return Err(InvalidActionError::MalformedSequence),
                        }
                    }
                    FieldValue::One(Ast::Leaf(Leaf::new(child_type.name.clone(), text)))
                }
                NodeConstraint::Node => FieldValue::One(self.read_tree(position)?),
                NodeConstraint::Variadic => {
                    let mut children = Vec::new();
                    loop {
                        match self.actions.get(*position) {
                            Some(Action::ApplyRule(Rule::CloseVariadicField)) => {
                                *position += 1;
                                break;
                            }
                            Some(_) => children.push(self.read_tree(position)?),
                            None => return Err(InvalidActionError::MalformedSequence),
                        }
                    }
                    FieldValue::Many(children)
                }
            };
            fields.push(Field::new(name.clone(), child_type.name.clone(), value));
        }
        Ok(Ast::Node(Node::new(rule.parent.name.clone(), fields)))
    }

    /// The action log.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Number of actions taken so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True iff no action has been taken.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// True iff the frontier is empty: the sequence describes a whole tree.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.frontier.is_empty()
    }

    /// The next slot awaiting expansion, or `None` when complete.
    #[must_use]
    pub fn head(&self) -> Option<Head<'_>> {
        self.frontier.last().map(|slot| Head {
            node_type: slot.node_type.as_ref(),
            parent: slot.parent,
            emitted: slot.emitted,
        })
    }

    /// Origin of the slot that action `index` filled; `None` for actions
    /// filling the root slot (and for out-of-range indices).
    #[must_use]
    pub fn parent(&self, index: usize) -> Option<Parent> {
        self.parents.get(index).copied().flatten()
    }

    /// Declared type of the slot that action `index` filled; `None` for
    /// root actions.
    #[must_use]
    pub fn target_node_type(&self, index: usize) -> Option<&NodeType> {
        let parent = self.parent(index)?;
        match self.actions.get(parent.action) {
            Some(Action::ApplyRule(Rule::ExpandTree(rule))) => {
                rule.children.get(parent.field).map(|(_, ty)| ty)
            }
            _ => None,
        }
    }

    /// Nesting level of action `index`; root actions are at depth 0.
    #[must_use]
    pub fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = self.parent(index);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent.action);
        }
        depth
    }
}

impl Default for ActionSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ActionSequence {
    fn eq(&self, other: &Self) -> bool {
        self.actions == other.actions
    }
}

impl Eq for ActionSequence {}

impl Hash for ActionSequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.actions.hash(state);
    }
}

/// Derive the expand rule a concrete node corresponds to.
fn rule_for(node: &Node) -> ExpandTreeRule {
    let children = node
        .fields
        .iter()
        .map(|field| {
            let constraint = match &field.value {
                FieldValue::One(Ast::Leaf(_)) => NodeConstraint::Token,
                FieldValue::One(_) => NodeConstraint::Node,
                FieldValue::Many(_) => NodeConstraint::Variadic,
            };
            (field.name.clone(), NodeType::new(field.type_name.clone(), constraint))
        })
        .collect();
    ExpandTreeRule::new(NodeType::new(node.type_name.clone(), NodeConstraint::Node), children)
}
