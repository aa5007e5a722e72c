//! Grammar summaries extracted from a sample corpus.

use crate::actions::{Action, ActionSequence, ExpandTreeRule, NodeType, Rule, Token};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The rules, node types, and tokens observed in a representative corpus.
///
/// This is the raw material for encoder vocabularies and the candidate
/// space of grammar-constrained sampling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Samples {
    /// Expand rules, deduplicated in first-seen order.
    pub rules: Vec<ExpandTreeRule>,
    /// Node types (rule parents and child slots), deduplicated in
    /// first-seen order.
    pub node_types: Vec<NodeType>,
    /// Token values observed at leaves, deduplicated in first-seen order.
    pub tokens: Vec<String>,
}

impl Samples {
    /// Create a summary from explicit parts.
    #[must_use]
    pub fn new(
        rules: Vec<ExpandTreeRule>,
        node_types: Vec<NodeType>,
        tokens: Vec<String>,
    ) -> Self {
        Self { rules, node_types, tokens }
    }

    /// Collect rules, node types, and tokens from a corpus of ASTs.
    ///
    /// ASTs that cannot be linearized are skipped, mirroring the parse
    /// boundary's skip-on-failure policy.
    #[must_use]
    pub fn from_asts(asts: &[crate::asts::Ast]) -> Self {
        let mut samples = Self::default();
        let mut seen_rules = HashSet::new();
        let mut seen_types = HashSet::new();
        let mut seen_tokens = HashSet::new();

        for ast in asts {
            let Ok(sequence) = ActionSequence::create(ast) else { continue };
            for action in sequence.actions() {
                match action {
                    Action::ApplyRule(Rule::ExpandTree(rule)) => {
                        if seen_rules.insert(rule.clone()) {
                            samples.rules.push(rule.clone());
                        }
                        if seen_types.insert(rule.parent.clone()) {
                            samples.node_types.push(rule.parent.clone());
                        }
                        for (_, child) in &rule.children {
                            if seen_types.insert(child.clone()) {
                                samples.node_types.push(child.clone());
                            }
                        }
                    }
                    Action::GenerateToken(Token::Text(token)) => {
                        if seen_tokens.insert(token.clone()) {
                            samples.tokens.push(token.clone());
                        }
                    }
                    _ => {}
                }
            }
        }
        samples
    }
}
