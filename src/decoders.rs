//! Search drivers consuming the sampler contract.
//!
//! The sampler proposes and scores expansions; a decoder owns termination:
//! it decides how many hypotheses stay alive, when to materialize outputs,
//! and when the step budget is spent.

use crate::samplers::{Sampler, SamplerState};

/// A finished candidate program with its cumulative score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<Output> {
    /// The materialized program.
    pub output: Output,
    /// Cumulative score of the hypothesis that produced it.
    pub score: f64,
}

/// Beam search over a [`Sampler`].
///
/// Each step expands every live beam through
/// [`top_k_samples`](Sampler::top_k_samples), moves completed hypotheses
/// into the result set, and continues until no beam survives or
/// `max_step_size` steps have run. A hypothesis that fails to materialize
/// is dropped, never panicking the search.
#[derive(Debug, Clone)]
pub struct BeamSearch {
    beam_size: usize,
    max_step_size: usize,
}

impl BeamSearch {
    /// Create a beam search with `beam_size` live hypotheses and a budget
    /// of `max_step_size` expansion steps.
    #[must_use]
    pub fn new(beam_size: usize, max_step_size: usize) -> Self {
        Self { beam_size, max_step_size }
    }

    /// Decode `input` into finished candidates, best score first.
    pub fn decode<S: Sampler>(
        &self,
        sampler: &mut S,
        input: &S::Input,
    ) -> Vec<SearchResult<S::Output>> {
        let mut beams = vec![SamplerState::new(0.0, sampler.initialize(input))];
        let mut finished = Vec::new();

        for _ in 0..self.max_step_size {
            if beams.is_empty() {
                break;
            }
            let expansions = sampler.top_k_samples(&beams, self.beam_size);
            if expansions.is_empty() {
                break;
            }
            beams = Vec::with_capacity(expansions.len());
            for expansion in expansions {
                let state = expansion.state;
                match sampler.create_output(input, &state.state) {
                    Some((output, _)) => {
                        finished.push(SearchResult { output, score: state.score });
                    }
                    None => beams.push(state),
                }
            }
        }

        finished.sort_by(|a, b| b.score.total_cmp(&a.score));
        finished
    }
}
