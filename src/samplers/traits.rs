//! Trait boundaries of the search layer.
//!
//! [`Sampler`] is the contract every decoding flavor satisfies;
//! [`ActionScorer`] and [`ValueNetwork`] are the two seams behind which
//! trained models live. The core never touches network weights: it hands a
//! scorer the current state and the legal candidates, and gets numbers
//! back.

use super::state::{DuplicatedSamplerState, SamplerState, SynthesisState};
use crate::actions::Action;

/// Constrained expansion of partial hypotheses into complete ones.
pub trait Sampler {
    /// The specification the search starts from (e.g. query tokens).
    type Input;
    /// The materialized program output.
    type Output;
    /// The in-flight hypothesis state.
    type State;

    /// Produce the root state for `input`.
    fn initialize(&self, input: &Self::Input) -> Self::State;

    /// Materialize a final output from a state.
    ///
    /// `None` while the state is not yet a terminal (complete) sequence,
    /// or when the complete tree fails to render; otherwise the output
    /// and a completion flag.
    fn create_output(&self, input: &Self::Input, state: &Self::State)
        -> Option<(Self::Output, bool)>;

    /// For each input state, draw up to `ks[i]` expansions from the
    /// model-scored distribution over legal next actions (ancestral
    /// sampling). Identical resulting states are bundled with a
    /// multiplicity count; the total multiplicity reported for a
    /// sampleable state equals its `ks[i]`. Complete states yield
    /// nothing.
    fn batch_k_samples(
        &mut self,
        states: &[SamplerState<Self::State>],
        ks: &[usize],
    ) -> Vec<DuplicatedSamplerState<Self::State>>;

    /// Expand all input states and keep the best `k` candidates overall,
    /// ranked by cumulative score (beam expansion). Each survivor carries
    /// `num = 1`.
    fn top_k_samples(
        &mut self,
        states: &[SamplerState<Self::State>],
        k: usize,
    ) -> Vec<DuplicatedSamplerState<Self::State>>;

    /// Draw `k` expansions from every input state.
    fn k_samples(
        &mut self,
        states: &[SamplerState<Self::State>],
        k: usize,
    ) -> Vec<DuplicatedSamplerState<Self::State>> {
        let ks = vec![k; states.len()];
        self.batch_k_samples(states, &ks)
    }
}

/// Scores candidate next actions for a synthesis state.
///
/// Implementations return one log-likelihood per candidate, in candidate
/// order. The scorer sees the full state (sequence and query), so both
/// autoregressive models and cheap heuristics fit behind this trait.
pub trait ActionScorer {
    /// Log-likelihoods for `candidates`, same length and order.
    fn score(&self, state: &SynthesisState, candidates: &[Action]) -> Vec<f64>;
}

/// A scalar value estimator over hypothesis states, evaluated in batches.
///
/// One call is one atomic micro-batch: the caller blocks until the whole
/// score vector returns, and implementations must preserve one-to-one
/// input/output correspondence.
pub trait ValueNetwork<State> {
    /// Value estimates for `states`, same length and order.
    fn evaluate(&self, states: &[&State]) -> Vec<f64>;
}
