//! Hypothesis state carried through a search.

use crate::actions::ActionSequence;

/// One in-flight hypothesis: a score and an opaque domain state.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerState<S> {
    /// Cumulative log-score (or substituted value estimate).
    pub score: f64,
    /// The domain state of the hypothesis.
    pub state: S,
}

impl<S> SamplerState<S> {
    /// Create a scored state.
    pub fn new(score: f64, state: S) -> Self {
        Self { score, state }
    }
}

/// A sampler state bundled with a multiplicity count.
///
/// When several requested expansions coincide on the same resulting
/// state, samplers report the state once with `num` set to the number of
/// coinciding draws. Downstream pruning relies on multiplicities being
/// tracked rather than states duplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicatedSamplerState<S> {
    /// The bundled state.
    pub state: SamplerState<S>,
    /// How many draws produced it.
    pub num: usize,
}

impl<S> DuplicatedSamplerState<S> {
    /// Bundle a state with its multiplicity.
    pub fn new(state: SamplerState<S>, num: usize) -> Self {
        Self { state, num }
    }
}

/// Domain state of grammar-constrained synthesis: the input query tokens
/// (the copy source) and the partial program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SynthesisState {
    /// Query tokens copy actions may draw from.
    pub query: Vec<String>,
    /// The partially-built program.
    pub sequence: ActionSequence,
}

impl SynthesisState {
    /// An empty synthesis over `query`.
    #[must_use]
    pub fn new(query: Vec<String>) -> Self {
        Self { query, sequence: ActionSequence::new() }
    }
}
