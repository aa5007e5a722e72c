//! Grammar-constrained sampling of action sequences.

use super::state::{DuplicatedSamplerState, SamplerState, SynthesisState};
use super::traits::{ActionScorer, Sampler};
use crate::actions::{Action, NodeConstraint, Rule, Token};
use crate::encoders::Samples;
use crate::languages::{IsSubtype, Parser};
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::marker::PhantomData;

/// Expands partial action sequences under strict grammar enforcement.
///
/// Candidates proposed for a state are exactly the actions its open slot
/// admits: Node slots take expand rules whose parent is a subtype of the
/// slot type (the root slot admits every rule), Variadic slots
/// additionally take [`Rule::CloseVariadicField`], and Token slots take
/// vocabulary tokens, distinct query tokens, and [`Token::CloseNode`].
/// Scores come from the pluggable [`ActionScorer`]; outputs materialize
/// through the pluggable [`Parser`].
pub struct ActionSequenceSampler<V, P, T, S>
where
    P: Parser<V>,
    T: IsSubtype,
    S: ActionScorer,
{
    samples: Samples,
    parser: P,
    is_subtype: T,
    scorer: S,
    rng: StdRng,
    marker: PhantomData<fn() -> V>,
}

impl<V, P, T, S> ActionSequenceSampler<V, P, T, S>
where
    P: Parser<V>,
    T: IsSubtype,
    S: ActionScorer,
{
    /// Create a sampler with an OS-seeded RNG.
    pub fn new(samples: Samples, parser: P, is_subtype: T, scorer: S) -> Self {
        Self {
            samples,
            parser,
            is_subtype,
            scorer,
            rng: StdRng::from_os_rng(),
            marker: PhantomData,
        }
    }

    /// Create a sampler with a seed for reproducible sampling.
    pub fn with_seed(samples: Samples, parser: P, is_subtype: T, scorer: S, seed: u64) -> Self {
        Self {
            samples,
            parser,
            is_subtype,
            scorer,
            rng: StdRng::seed_from_u64(seed),
            marker: PhantomData,
        }
    }

    /// The legal next actions for `state`, in a deterministic order.
    /// Empty iff the state is complete.
    #[must_use]
    pub fn candidates(&self, state: &SynthesisState) -> Vec<Action> {
        let Some(head) = state.sequence.head() else {
            return Vec::new();
        };
        match head.node_type.map(|ty| ty.constraint) {
            None | Some(NodeConstraint::Node) => {
                let slot_name = head.node_type.map(|ty| ty.name.as_str());
                self.expand_rules(slot_name).collect()
            }
            Some(NodeConstraint::Variadic) => {
                let slot_name = head.node_type.map(|ty| ty.name.as_str());
                let mut actions: Vec<Action> = self.expand_rules(slot_name).collect();
                actions.push(Action::ApplyRule(Rule::CloseVariadicField));
                actions
            }
            Some(NodeConstraint::Token) => {
                let mut seen = HashSet::new();
                let mut actions = Vec::new();
                for token in self.samples.tokens.iter().chain(state.query.iter()) {
                    if seen.insert(token.as_str()) {
                        actions.push(Action::GenerateToken(Token::Text(token.clone())));
                    }
                }
                actions.push(Action::GenerateToken(Token::CloseNode));
                actions
            }
        }
    }

    /// Expand rules admissible at a slot; `None` slot name means the root
    /// slot, which admits every rule.
    fn expand_rules<'a>(
        &'a self,
        slot_name: Option<&'a str>,
    ) -> impl Iterator<Item = Action> + 'a {
        self.samples
            .rules
            .iter()
            .filter(move |rule| match slot_name {
                None => true,
                Some(name) => self.is_subtype.is_subtype(&rule.parent.name, name),
            })
            .map(|rule| Action::ApplyRule(Rule::ExpandTree(rule.clone())))
    }

    /// Apply `action` to a copy of `state`. The candidates are legal by
    /// construction, so a rejection only signals a scorer/candidate
    /// mismatch; such expansions are dropped.
    fn apply(state: &SynthesisState, action: &Action) -> Option<SynthesisState> {
        let mut next = state.clone();
        next.sequence.eval(action.clone()).ok()?;
        Some(next)
    }

    /// Normalized log-probabilities for the candidates of `state`.
    fn log_probs(&self, state: &SynthesisState, candidates: &[Action]) -> Vec<f64> {
        let scores = self.scorer.score(state, candidates);
        debug_assert_eq!(scores.len(), candidates.len());
        log_softmax(&scores)
    }
}

impl<V, P, T, S> Sampler for ActionSequenceSampler<V, P, T, S>
where
    P: Parser<V>,
    T: IsSubtype,
    S: ActionScorer,
{
    type Input = Vec<String>;
    type Output = V;
    type State = SynthesisState;

    fn initialize(&self, input: &Self::Input) -> Self::State {
        SynthesisState::new(input.clone())
    }

    fn create_output(&self, _input: &Self::Input, state: &Self::State) -> Option<(V, bool)> {
        if !state.sequence.is_complete() {
            return None;
        }
        let ast = state.sequence.generate().ok()?;
        let output = self.parser.unparse(&ast)?;
        Some((output, true))
    }

    fn batch_k_samples(
        &mut self,
        states: &[SamplerState<Self::State>],
        ks: &[usize],
    ) -> Vec<DuplicatedSamplerState<Self::State>> {
        let mut expansions = Vec::new();
        for (state, &k) in states.iter().zip(ks) {
            if k == 0 {
                continue;
            }
            let candidates = self.candidates(&state.state);
            if candidates.is_empty() {
                continue;
            }
            let log_probs = self.log_probs(&state.state, &candidates);
            let weights: Vec<f64> = log_probs.iter().map(|lp| lp.exp()).collect();
            let Ok(distribution) = WeightedIndex::new(&weights) else {
                continue;
            };

            let mut counts = vec![0usize; candidates.len()];
            for _ in 0..k {
                counts[self.rng.sample(&distribution)] += 1;
            }
            for (choice, &num) in counts.iter().enumerate() {
                if num == 0 {
                    continue;
                }
                let Some(next) = Self::apply(&state.state, &candidates[choice]) else {
                    continue;
                };
                expansions.push(DuplicatedSamplerState::new(
                    SamplerState::new(state.score + log_probs[choice], next),
                    num,
                ));
            }
        }
        expansions
    }

    fn top_k_samples(
        &mut self,
        states: &[SamplerState<Self::State>],
        k: usize,
    ) -> Vec<DuplicatedSamplerState<Self::State>> {
        let mut pool = Vec::new();
        for state in states {
            let candidates = self.candidates(&state.state);
            if candidates.is_empty() {
                continue;
            }
            let log_probs = self.log_probs(&state.state, &candidates);
            for (action, log_prob) in candidates.iter().zip(log_probs) {
                let Some(next) = Self::apply(&state.state, action) else {
                    continue;
                };
                pool.push(DuplicatedSamplerState::new(
                    SamplerState::new(state.score + log_prob, next),
                    1,
                ));
            }
        }
        pool.sort_by(|a, b| b.state.score.total_cmp(&a.state.score));
        pool.truncate(k);
        pool
    }
}

/// Log-softmax over raw scores, stable under large magnitudes.
fn log_softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let log_sum = max
        + scores.iter().map(|score| (score - max).exp()).sum::<f64>().ln();
    scores.iter().map(|score| score - log_sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ExpandTreeRule, NodeType};
    use crate::asts::Ast;
    use crate::languages::SubtypeFn;
    use approx::assert_relative_eq;

    fn circle_rule() -> ExpandTreeRule {
        ExpandTreeRule::new(
            NodeType::new("Circle", NodeConstraint::Node),
            vec![("r".to_string(), NodeType::new("size", NodeConstraint::Token))],
        )
    }

    fn union_rule() -> ExpandTreeRule {
        ExpandTreeRule::new(
            NodeType::new("Union", NodeConstraint::Node),
            vec![("shapes".to_string(), NodeType::new("CSG", NodeConstraint::Variadic))],
        )
    }

    fn shape_samples() -> Samples {
        Samples::new(
            vec![circle_rule(), union_rule()],
            vec![
                NodeType::new("Circle", NodeConstraint::Node),
                NodeType::new("Union", NodeConstraint::Node),
                NodeType::new("size", NodeConstraint::Token),
                NodeType::new("CSG", NodeConstraint::Variadic),
            ],
            vec!["1".to_string(), "2".to_string()],
        )
    }

    fn csg_subtype(subtype: &str, basetype: &str) -> bool {
        (basetype == "CSG" && matches!(subtype, "CSG" | "Circle" | "Union"))
            || subtype == basetype
    }

    /// Renders a complete tree as an s-expression-ish string.
    struct DebugParser;

    impl Parser<String> for DebugParser {
        fn parse(&self, _value: &String) -> Option<Ast> {
            None
        }

        fn unparse(&self, ast: &Ast) -> Option<String> {
            Some(format!("{ast:?}"))
        }
    }

    /// Uniform scores: every candidate equally likely.
    struct UniformScorer;

    impl ActionScorer for UniformScorer {
        fn score(&self, _state: &SynthesisState, candidates: &[Action]) -> Vec<f64> {
            vec![0.0; candidates.len()]
        }
    }

    /// Strongly prefers Circle expansions and the token "1".
    struct CircleScorer;

    impl ActionScorer for CircleScorer {
        fn score(&self, _state: &SynthesisState, candidates: &[Action]) -> Vec<f64> {
            candidates
                .iter()
                .map(|action| match action {
                    Action::ApplyRule(Rule::ExpandTree(rule))
                        if rule.parent.name == "Circle" =>
                    {
                        10.0
                    }
                    Action::GenerateToken(Token::Text(text)) if text == "1" => 10.0,
                    Action::GenerateToken(Token::CloseNode) => 5.0,
                    _ => 0.0,
                })
                .collect()
        }
    }

    fn sampler<S: ActionScorer>(
        scorer: S,
    ) -> ActionSequenceSampler<String, DebugParser, SubtypeFn<fn(&str, &str) -> bool>, S> {
        ActionSequenceSampler::with_seed(
            shape_samples(),
            DebugParser,
            SubtypeFn(csg_subtype as fn(&str, &str) -> bool),
            scorer,
            42,
        )
    }

    #[test]
    fn test_root_admits_every_rule() {
        let sampler = sampler(UniformScorer);
        let state = SynthesisState::new(vec![]);
        let candidates = sampler.candidates(&state);
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| matches!(c, Action::ApplyRule(_))));
    }

    #[test]
    fn test_token_slot_candidates() {
        let sampler = sampler(UniformScorer);
        let mut state = SynthesisState::new(vec!["7".to_string(), "1".to_string()]);
        state
            .sequence
            .eval(Action::ApplyRule(Rule::ExpandTree(circle_rule())))
            .unwrap();

        let candidates = sampler.candidates(&state);
        // Vocabulary "1"/"2", query "7" ("1" deduplicated), and CloseNode.
        assert_eq!(
            candidates,
            vec![
                Action::GenerateToken(Token::Text("1".to_string())),
                Action::GenerateToken(Token::Text("2".to_string())),
                Action::GenerateToken(Token::Text("7".to_string())),
                Action::GenerateToken(Token::CloseNode),
            ]
        );
    }

    #[test]
    fn test_variadic_slot_candidates() {
        let sampler = sampler(UniformScorer);
        let mut state = SynthesisState::new(vec![]);
        state
            .sequence
            .eval(Action::ApplyRule(Rule::ExpandTree(union_rule())))
            .unwrap();

        let candidates = sampler.candidates(&state);
        // Circle and Union are CSG subtypes; plus the close action.
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[2], Action::ApplyRule(Rule::CloseVariadicField));
    }

    #[test]
    fn test_complete_state_has_no_candidates() {
        let mut sampler = sampler(UniformScorer);
        let mut state = SynthesisState::new(vec![]);
        state
            .sequence
            .eval(Action::ApplyRule(Rule::ExpandTree(union_rule())))
            .unwrap();
        state.sequence.eval(Action::ApplyRule(Rule::CloseVariadicField)).unwrap();
        assert!(state.sequence.is_complete());

        assert!(sampler.candidates(&state).is_empty());
        let states = [SamplerState::new(0.0, state)];
        assert!(sampler.batch_k_samples(&states, &[4]).is_empty());
        assert!(sampler.top_k_samples(&states, 4).is_empty());
    }

    #[test]
    fn test_batch_k_samples_multiplicity_invariant() {
        let mut sampler = sampler(UniformScorer);
        let states = [
            SamplerState::new(0.0, SynthesisState::new(vec![])),
            SamplerState::new(0.0, SynthesisState::new(vec!["9".to_string()])),
        ];
        let ks = [5, 3];
        let expansions = sampler.batch_k_samples(&states, &ks);

        let total: usize = expansions.iter().map(|e| e.num).sum();
        assert_eq!(total, 8);
        // Fewer distinct states than draws: duplicates were bundled.
        assert!(expansions.len() <= 4);
        for expansion in &expansions {
            assert!(expansion.num >= 1);
            assert!(expansion.state.score.is_finite());
        }
    }

    #[test]
    fn test_top_k_pools_across_states() {
        let mut sampler = sampler(CircleScorer);
        let root = SamplerState::new(0.0, SynthesisState::new(vec![]));
        let expansions = sampler.top_k_samples(std::slice::from_ref(&root), 1);

        assert_eq!(expansions.len(), 1);
        assert_eq!(expansions[0].num, 1);
        let last = expansions[0].state.state.sequence.actions().last().unwrap();
        assert_eq!(last, &Action::ApplyRule(Rule::ExpandTree(circle_rule())));
    }

    #[test]
    fn test_scores_accumulate_log_probs() {
        let mut sampler = sampler(UniformScorer);
        let root = SamplerState::new(-1.0, SynthesisState::new(vec![]));
        let expansions = sampler.top_k_samples(std::slice::from_ref(&root), 2);

        // Two equally-likely rules: each expansion adds ln(1/2).
        assert_eq!(expansions.len(), 2);
        for expansion in &expansions {
            assert_relative_eq!(expansion.state.score, -1.0 + 0.5f64.ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_create_output_requires_complete() {
        let sampler = sampler(UniformScorer);
        let input = vec![];
        let mut state = sampler.initialize(&input);
        assert!(sampler.create_output(&input, &state).is_none());

        state.sequence.eval(Action::ApplyRule(Rule::ExpandTree(union_rule()))).unwrap();
        assert!(sampler.create_output(&input, &state).is_none());

        state.sequence.eval(Action::ApplyRule(Rule::CloseVariadicField)).unwrap();
        let (output, complete) = sampler.create_output(&input, &state).unwrap();
        assert!(complete);
        assert!(output.contains("Union"));
    }
}
