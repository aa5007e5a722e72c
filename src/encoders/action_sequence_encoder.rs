//! Bidirectional mapping between action sequences and integer tensors.

use super::samples::Samples;
use super::vocabulary::Vocabulary;
use crate::actions::{Action, ActionSequence, ExpandTreeRule, NodeType, Rule, Token};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Sentinel filling unused tensor cells.
pub const PADDING: i64 = -1;

/// Reserved vocabulary id for padding/unknown entries.
pub const UNKNOWN_ID: i64 = 0;

/// Reserved vocabulary id for the close sentinels
/// ([`Rule::CloseVariadicField`] / [`Token::CloseNode`]) when reserved.
pub const CLOSE_ID: i64 = 1;

/// Which close sentinels the vocabularies reserve ids for.
///
/// A sequence using a close action whose sentinel is not reserved is
/// simply unencodable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOptions {
    /// Reserve a rule id for [`Rule::CloseVariadicField`].
    pub retain_variadic_fields: bool,
    /// Reserve a token id for [`Token::CloseNode`].
    pub split_non_terminal: bool,
}

impl Default for ActionOptions {
    fn default() -> Self {
        Self { retain_variadic_fields: true, split_non_terminal: true }
    }
}

/// Encodes action sequences as fixed-width integer tensors and decodes
/// them back, owning the rule/node-type/token vocabulary tables.
///
/// Tensor conventions (`L` = sequence length, sentinel `-1` throughout):
///
/// - **action tensor** `(L + 1, 4)`: row `i` describes the action taken at
///   step `i`; columns are (target node-type id, rule id, token id, copy
///   index). A token present in both the vocabulary and the query gets
///   both encodings. The final row is an explicit "next action needed"
///   placeholder, all `-1` except column 0, which carries the next
///   expected node-type id while the sequence is incomplete. The (rule,
///   token, copy) column triple is the 3-wide slice [`decode`] consumes.
/// - **parent tensor** `(L + 1, 4)`: (parent node-type id, parent rule id,
///   parent action index, parent field index); `-1` for root rows.
/// - **tree tensors**: depth `(L, 1)` counting nesting from root, and an
///   `(L, L)` adjacency matrix with `m[i][j] = 1` iff action `i` is on the
///   ancestor chain of action `j`.
///
/// Vocabularies are frozen at construction; every encode path takes
/// `&self`, so one encoder can be shared read-only across workers.
///
/// [`decode`]: Self::decode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSequenceEncoder {
    options: ActionOptions,
    rules: Vocabulary<ExpandTreeRule>,
    node_types: Vocabulary<NodeType>,
    tokens: Vocabulary<String>,
}

impl ActionSequenceEncoder {
    /// Build an encoder with default [`ActionOptions`].
    ///
    /// `token_threshold` excludes tokens occurring fewer times in the
    /// samples; excluded tokens fall back to copy or unknown. Rule and
    /// node-type samples carry no threshold. Reserved ids exist regardless
    /// of sample emptiness.
    #[must_use]
    pub fn new(
        rule_samples: &[ExpandTreeRule],
        node_type_samples: &[NodeType],
        token_samples: &[String],
        token_threshold: usize,
    ) -> Self {
        Self::with_options(
            rule_samples,
            node_type_samples,
            token_samples,
            token_threshold,
            ActionOptions::default(),
        )
    }

    /// Build an encoder with explicit options.
    #[must_use]
    pub fn with_options(
        rule_samples: &[ExpandTreeRule],
        node_type_samples: &[NodeType],
        token_samples: &[String],
        token_threshold: usize,
        options: ActionOptions,
    ) -> Self {
        let rule_reserved = 1 + usize::from(options.retain_variadic_fields);
        let token_reserved = 1 + usize::from(options.split_non_terminal);
        Self {
            options,
            rules: Vocabulary::new(rule_reserved, rule_samples.iter().cloned(), 0),
            node_types: Vocabulary::new(
                1,
                Self::remove_variadic_node_types(node_type_samples),
                0,
            ),
            tokens: Vocabulary::new(
                token_reserved,
                token_samples.iter().cloned(),
                token_threshold,
            ),
        }
    }

    /// Build an encoder from a corpus summary.
    #[must_use]
    pub fn from_samples(samples: &Samples, token_threshold: usize) -> Self {
        Self::new(&samples.rules, &samples.node_types, &samples.tokens, token_threshold)
    }

    /// Map Variadic node types to their Node counterparts, deduplicating
    /// after normalization while preserving first-seen order.
    #[must_use]
    pub fn remove_variadic_node_types(node_types: &[NodeType]) -> Vec<NodeType> {
        let mut seen = std::collections::HashSet::new();
        node_types
            .iter()
            .map(NodeType::normalized)
            .filter(|ty| seen.insert(ty.clone()))
            .collect()
    }

    /// Encoder options.
    #[must_use]
    pub fn options(&self) -> ActionOptions {
        self.options
    }

    /// Rule table size, reserved ids included.
    #[must_use]
    pub fn rule_vocab_size(&self) -> usize {
        self.rules.len()
    }

    /// Node-type table size, reserved ids included.
    #[must_use]
    pub fn node_type_vocab_size(&self) -> usize {
        self.node_types.len()
    }

    /// Token table size, reserved ids included.
    #[must_use]
    pub fn token_vocab_size(&self) -> usize {
        self.tokens.len()
    }

    /// Encode the actions taken so far plus the "next action needed"
    /// placeholder row; see the type-level tensor conventions.
    ///
    /// Returns `None` when some action is unrepresentable: a rule outside
    /// the vocabulary, a token neither in the vocabulary nor in `query`,
    /// or a close action whose sentinel is not reserved. Callers drop such
    /// samples from the training set.
    #[must_use]
    pub fn encode_action(
        &self,
        sequence: &ActionSequence,
        query: &[String],
    ) -> Option<Array2<i64>> {
        let len = sequence.len();
        let mut tensor = Array2::from_elem((len + 1, 4), PADDING);

        for (i, action) in sequence.actions().iter().enumerate() {
            if let Some(target) = sequence.target_node_type(i) {
                tensor[[i, 0]] = self.node_type_id(target);
            }
            match action {
                Action::ApplyRule(rule) => {
                    tensor[[i, 1]] = self.rule_id(rule)?;
                }
                Action::GenerateToken(Token::CloseNode) => {
                    tensor[[i, 2]] = self.token_id(&Token::CloseNode)?;
                }
                Action::GenerateToken(Token::Text(text)) => {
                    let token = self.tokens.id_of(text);
                    let copy = query.iter().position(|word| word == text);
                    if token.is_none() && copy.is_none() {
                        return None;
                    }
                    if let Some(id) = token {
                        tensor[[i, 2]] = id;
                    }
                    if let Some(offset) = copy {
                        tensor[[i, 3]] = offset as i64;
                    }
                }
            }
        }

        if let Some(head) = sequence.head() {
            if let Some(ty) = head.node_type {
                tensor[[len, 0]] = self.node_type_id(ty);
            }
        }
        Some(tensor)
    }

    /// Encode the structural identity of each action's parent slot; see
    /// the type-level tensor conventions. Total: unknown entries encode as
    /// [`UNKNOWN_ID`] rather than failing.
    #[must_use]
    pub fn encode_parent(&self, sequence: &ActionSequence) -> Array2<i64> {
        let len = sequence.len();
        let mut tensor = Array2::from_elem((len + 1, 4), PADDING);

        for i in 0..len {
            if let Some(parent) = sequence.parent(i) {
                self.fill_parent_row(&mut tensor, i, sequence, parent);
            }
        }
        if let Some(head) = sequence.head() {
            if let Some(parent) = head.parent {
                self.fill_parent_row(&mut tensor, len, sequence, parent);
            }
        }
        tensor
    }

    fn fill_parent_row(
        &self,
        tensor: &mut Array2<i64>,
        row: usize,
        sequence: &ActionSequence,
        parent: crate::actions::Parent,
    ) {
        let Some(Action::ApplyRule(Rule::ExpandTree(rule))) =
            sequence.actions().get(parent.action)
        else {
            return;
        };
        tensor[[row, 0]] = self.node_type_id(&rule.parent);
        tensor[[row, 1]] = self.rules.id_of(rule).unwrap_or(UNKNOWN_ID);
        tensor[[row, 2]] = parent.action as i64;
        tensor[[row, 3]] = parent.field as i64;
    }

    /// Encode depth and ancestor-adjacency tensors for tree-aware
    /// attention; see the type-level tensor conventions. An empty sequence
    /// yields `(0, 1)` / `(0, 0)` tensors.
    #[must_use]
    pub fn encode_tree(&self, sequence: &ActionSequence) -> (Array2<i64>, Array2<f32>) {
        let len = sequence.len();
        let mut depth = Array2::zeros((len, 1));
        let mut matrix = Array2::zeros((len, len));

        for i in 0..len {
            let mut chain = 0;
            let mut current = sequence.parent(i);
            while let Some(parent) = current {
                matrix[[parent.action, i]] = 1.0;
                chain += 1;
                current = sequence.parent(parent.action);
            }
            depth[[i, 0]] = chain;
        }
        (depth, matrix)
    }

    /// Reconstruct an action sequence from (rule id, token id, copy index)
    /// rows — the 3-wide slice of the action tensor — by replaying each
    /// row through [`ActionSequence::eval`].
    ///
    /// Returns `None` the moment a row is malformed: all sentinels, an
    /// unknown or out-of-range id, a copy index outside `query`, or an
    /// action the grammar rejects. One bad hypothesis therefore reports a
    /// failed prediction instead of aborting a batched search.
    #[must_use]
    pub fn decode(&self, rows: ArrayView2<i64>, query: &[String]) -> Option<ActionSequence> {
        if rows.ncols() < 3 {
            return None;
        }
        let mut sequence = ActionSequence::new();
        for row in rows.rows() {
            let (rule, token, copy) = (row[0], row[1], row[2]);
            let action = if rule >= 0 {
                Action::ApplyRule(self.rule_at(rule)?)
            } else if token >= 0 {
                Action::GenerateToken(self.token_at(token)?)
            } else if copy >= 0 {
                let word = query.get(usize::try_from(copy).ok()?)?;
                Action::GenerateToken(Token::Text(word.clone()))
            } else {
                return None;
            };
            sequence.eval(action).ok()?;
        }
        Some(sequence)
    }

    fn node_type_id(&self, node_type: &NodeType) -> i64 {
        self.node_types.id_of(&node_type.normalized()).unwrap_or(UNKNOWN_ID)
    }

    fn rule_id(&self, rule: &Rule) -> Option<i64> {
        match rule {
            Rule::CloseVariadicField => self.options.retain_variadic_fields.then_some(CLOSE_ID),
            Rule::ExpandTree(rule) => self.rules.id_of(rule),
        }
    }

    fn rule_at(&self, id: i64) -> Option<Rule> {
        if id <= UNKNOWN_ID {
            return None;
        }
        if self.options.retain_variadic_fields && id == CLOSE_ID {
            return Some(Rule::CloseVariadicField);
        }
        self.rules.get(id).cloned().map(Rule::ExpandTree)
    }

    fn token_id(&self, token: &Token) -> Option<i64> {
        match token {
            Token::CloseNode => self.options.split_non_terminal.then_some(CLOSE_ID),
            Token::Text(text) => self.tokens.id_of(text),
        }
    }

    fn token_at(&self, id: i64) -> Option<Token> {
        if id <= UNKNOWN_ID {
            return None;
        }
        if self.options.split_non_terminal && id == CLOSE_ID {
            return Some(Token::CloseNode);
        }
        self.tokens.get(id).cloned().map(Token::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::NodeConstraint;
    use ndarray::{array, s};

    fn funcdef() -> ExpandTreeRule {
        ExpandTreeRule::new(
            NodeType::new("def", NodeConstraint::Node),
            vec![
                ("name".to_string(), NodeType::new("value", NodeConstraint::Token)),
                ("body".to_string(), NodeType::new("expr", NodeConstraint::Variadic)),
            ],
        )
    }

    fn expr() -> ExpandTreeRule {
        ExpandTreeRule::new(
            NodeType::new("expr", NodeConstraint::Node),
            vec![
                ("op".to_string(), NodeType::new("value", NodeConstraint::Token)),
                ("arg0".to_string(), NodeType::new("value", NodeConstraint::Token)),
                ("arg1".to_string(), NodeType::new("value", NodeConstraint::Token)),
            ],
        )
    }

    fn encoder(tokens: &[&str]) -> ActionSequenceEncoder {
        ActionSequenceEncoder::new(
            &[funcdef(), expr()],
            &[
                NodeType::new("def", NodeConstraint::Node),
                NodeType::new("value", NodeConstraint::Token),
                NodeType::new("expr", NodeConstraint::Node),
            ],
            &tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            0,
        )
    }

    fn text(token: &str) -> Action {
        Action::GenerateToken(Token::Text(token.to_string()))
    }

    fn words(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_reserved_labels() {
        let encoder = ActionSequenceEncoder::new(&[], &[], &[], 0);
        assert_eq!(encoder.rule_vocab_size(), 2);
        assert_eq!(encoder.token_vocab_size(), 2);

        let encoder = ActionSequenceEncoder::with_options(
            &[],
            &[],
            &[],
            0,
            ActionOptions { retain_variadic_fields: false, split_non_terminal: true },
        );
        assert_eq!(encoder.rule_vocab_size(), 1);
        assert_eq!(encoder.token_vocab_size(), 2);

        let encoder = ActionSequenceEncoder::with_options(
            &[],
            &[],
            &[],
            0,
            ActionOptions { retain_variadic_fields: true, split_non_terminal: false },
        );
        assert_eq!(encoder.rule_vocab_size(), 2);
        assert_eq!(encoder.token_vocab_size(), 1);
    }

    #[test]
    fn test_encode_action() {
        let encoder = encoder(&["f", "2"]);
        let mut sequence = ActionSequence::new();
        sequence.eval(Action::ApplyRule(Rule::ExpandTree(funcdef()))).unwrap();
        sequence.eval(text("f")).unwrap();
        sequence.eval(text("1")).unwrap();
        sequence.eval(text("2")).unwrap();
        sequence.eval(Action::GenerateToken(Token::CloseNode)).unwrap();

        let action = encoder.encode_action(&sequence, &words(&["1", "2"])).unwrap();
        assert_eq!(
            action,
            array![
                [-1, 2, -1, -1],
                [2, -1, 2, -1],
                [2, -1, -1, 0],
                [2, -1, 3, 1],
                [2, -1, 1, -1],
                [3, -1, -1, -1],
            ]
        );
    }

    #[test]
    fn test_encode_parent() {
        let encoder = encoder(&["f", "2"]);
        let mut sequence = ActionSequence::new();
        sequence.eval(Action::ApplyRule(Rule::ExpandTree(funcdef()))).unwrap();
        sequence.eval(text("f")).unwrap();
        sequence.eval(text("1")).unwrap();
        sequence.eval(text("2")).unwrap();
        sequence.eval(Action::GenerateToken(Token::CloseNode)).unwrap();

        let parent = encoder.encode_parent(&sequence);
        assert_eq!(
            parent,
            array![
                [-1, -1, -1, -1],
                [1, 2, 0, 0],
                [1, 2, 0, 0],
                [1, 2, 0, 0],
                [1, 2, 0, 0],
                [1, 2, 0, 1],
            ]
        );
    }

    #[test]
    fn test_encode_tree() {
        let encoder = encoder(&["f", "2"]);
        let mut sequence = ActionSequence::new();
        sequence.eval(Action::ApplyRule(Rule::ExpandTree(funcdef()))).unwrap();
        sequence.eval(text("f")).unwrap();
        sequence.eval(text("1")).unwrap();

        let (depth, matrix) = encoder.encode_tree(&sequence);
        assert_eq!(depth, array![[0], [1], [1]]);
        assert_eq!(matrix, array![[0.0, 1.0, 1.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_encode_empty_sequence() {
        let encoder = encoder(&["f"]);
        let sequence = ActionSequence::new();

        let action = encoder.encode_action(&sequence, &words(&["1"])).unwrap();
        let parent = encoder.encode_parent(&sequence);
        let (depth, matrix) = encoder.encode_tree(&sequence);

        assert_eq!(action, array![[-1, -1, -1, -1]]);
        assert_eq!(parent, array![[-1, -1, -1, -1]]);
        assert_eq!(depth.dim(), (0, 1));
        assert_eq!(matrix.dim(), (0, 0));
    }

    #[test]
    fn test_encode_invalid_sequence() {
        let encoder = encoder(&["f"]);
        let mut sequence = ActionSequence::new();
        sequence.eval(Action::ApplyRule(Rule::ExpandTree(funcdef()))).unwrap();
        sequence.eval(text("f")).unwrap();
        sequence.eval(text("1")).unwrap();
        sequence.eval(Action::GenerateToken(Token::CloseNode)).unwrap();

        // "1" is out of vocabulary and absent from the query.
        assert_eq!(encoder.encode_action(&sequence, &words(&["2"])), None);
    }

    #[test]
    fn test_encode_completed_sequence() {
        let nullary = ExpandTreeRule::new(NodeType::new("value", NodeConstraint::Node), vec![]);
        let encoder = ActionSequenceEncoder::new(
            &[nullary.clone()],
            &[NodeType::new("value", NodeConstraint::Node)],
            &["f".to_string()],
            0,
        );
        let mut sequence = ActionSequence::new();
        sequence.eval(Action::ApplyRule(Rule::ExpandTree(nullary))).unwrap();

        let action = encoder.encode_action(&sequence, &words(&["1"])).unwrap();
        let parent = encoder.encode_parent(&sequence);
        assert_eq!(action, array![[-1, 2, -1, -1], [-1, -1, -1, -1]]);
        assert_eq!(parent, array![[-1, -1, -1, -1], [-1, -1, -1, -1]]);
    }

    #[test]
    fn test_decode() {
        let encoder = encoder(&["f"]);
        let mut sequence = ActionSequence::new();
        sequence.eval(Action::ApplyRule(Rule::ExpandTree(funcdef()))).unwrap();
        sequence.eval(text("f")).unwrap();
        sequence.eval(text("1")).unwrap();
        sequence.eval(Action::GenerateToken(Token::CloseNode)).unwrap();

        let query = words(&["1"]);
        let action = encoder.encode_action(&sequence, &query).unwrap();
        let result = encoder.decode(action.slice(s![..-1, 1..]), &query).unwrap();
        assert_eq!(result, sequence);
    }

    #[test]
    fn test_decode_invalid_tensor() {
        let encoder = encoder(&["f"]);
        let empty: Vec<String> = Vec::new();

        // A row with no action at all.
        assert_eq!(encoder.decode(array![[-1, -1, -1]].view(), &empty), None);
        // A copy index outside the query.
        assert_eq!(encoder.decode(array![[-1, -1, 1]].view(), &empty), None);
        // An unknown-id rule.
        assert_eq!(encoder.decode(array![[0, -1, -1]].view(), &empty), None);
        // A rule id past the vocabulary.
        assert_eq!(encoder.decode(array![[99, -1, -1]].view(), &empty), None);
        // A structurally valid id whose action the grammar rejects:
        // close-variadic at the root slot.
        assert_eq!(encoder.decode(array![[1, -1, -1]].view(), &empty), None);
    }

    #[test]
    fn test_remove_variadic_node_types() {
        let expected = vec![
            NodeType::new("t1", NodeConstraint::Node),
            NodeType::new("t2", NodeConstraint::Token),
        ];
        assert_eq!(
            ActionSequenceEncoder::remove_variadic_node_types(&[
                NodeType::new("t1", NodeConstraint::Node),
                NodeType::new("t2", NodeConstraint::Token),
            ]),
            expected
        );
        assert_eq!(
            ActionSequenceEncoder::remove_variadic_node_types(&[
                NodeType::new("t1", NodeConstraint::Variadic),
                NodeType::new("t2", NodeConstraint::Token),
            ]),
            expected
        );
        assert_eq!(
            ActionSequenceEncoder::remove_variadic_node_types(&[
                NodeType::new("t1", NodeConstraint::Variadic),
                NodeType::new("t2", NodeConstraint::Token),
                NodeType::new("t1", NodeConstraint::Node),
            ]),
            expected
        );
    }

    #[test]
    fn test_close_actions_unencodable_without_sentinel() {
        let options = ActionOptions { retain_variadic_fields: false, split_non_terminal: true };
        let encoder = ActionSequenceEncoder::with_options(
            &[funcdef()],
            &[NodeType::new("def", NodeConstraint::Node)],
            &["f".to_string()],
            0,
            options,
        );
        let mut sequence = ActionSequence::new();
        sequence.eval(Action::ApplyRule(Rule::ExpandTree(funcdef()))).unwrap();
        sequence.eval(text("f")).unwrap();
        sequence.eval(Action::GenerateToken(Token::CloseNode)).unwrap();
        sequence.eval(Action::ApplyRule(Rule::CloseVariadicField)).unwrap();

        assert_eq!(encoder.encode_action(&sequence, &[]), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let encoder = encoder(&["f", "2"]);
        let json = serde_json::to_string(&encoder).unwrap();
        let restored: ActionSequenceEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, encoder);
    }
}
