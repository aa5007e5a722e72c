//! Value-network re-scoring of sampled states.

use super::state::{DuplicatedSamplerState, SamplerState};
use super::traits::{Sampler, ValueNetwork};

/// Decorator replacing a base sampler's heuristic scores with value
/// estimates.
///
/// Satisfies the same [`Sampler`] contract as the wrapped sampler:
/// `initialize`, `create_output`, and `top_k_samples` forward unchanged;
/// `batch_k_samples` is intercepted to run every sampled state through the
/// [`ValueNetwork`] in micro-batches of `batch_size`. Batching exists
/// purely for throughput — the last partial batch is flushed, the
/// state↔score correspondence stays one-to-one (substitution, not
/// accumulation), and multiplicity counts pass through untouched.
pub struct SamplerWithValueNetwork<S, V>
where
    S: Sampler,
    V: ValueNetwork<S::State>,
{
    sampler: S,
    value_network: V,
    batch_size: usize,
}

impl<S, V> SamplerWithValueNetwork<S, V>
where
    S: Sampler,
    V: ValueNetwork<S::State>,
{
    /// Wrap `sampler`, scoring through `value_network` in micro-batches of
    /// `batch_size` (clamped to at least 1).
    pub fn new(sampler: S, value_network: V, batch_size: usize) -> Self {
        Self { sampler, value_network, batch_size: batch_size.max(1) }
    }

    /// The wrapped sampler.
    pub fn inner(&self) -> &S {
        &self.sampler
    }
}

impl<S, V> Sampler for SamplerWithValueNetwork<S, V>
where
    S: Sampler,
    S::State: Clone,
    V: ValueNetwork<S::State>,
{
    type Input = S::Input;
    type Output = S::Output;
    type State = S::State;

    fn initialize(&self, input: &Self::Input) -> Self::State {
        self.sampler.initialize(input)
    }

    fn create_output(
        &self,
        input: &Self::Input,
        state: &Self::State,
    ) -> Option<(Self::Output, bool)> {
        self.sampler.create_output(input, state)
    }

    fn batch_k_samples(
        &mut self,
        states: &[SamplerState<Self::State>],
        ks: &[usize],
    ) -> Vec<DuplicatedSamplerState<Self::State>> {
        let sampled = self.sampler.batch_k_samples(states, ks);
        let mut rescored = Vec::with_capacity(sampled.len());
        for batch in sampled.chunks(self.batch_size) {
            let inputs: Vec<&S::State> =
                batch.iter().map(|duplicated| &duplicated.state.state).collect();
            let values = self.value_network.evaluate(&inputs);
            debug_assert_eq!(values.len(), batch.len());
            for (duplicated, value) in batch.iter().zip(values) {
                rescored.push(DuplicatedSamplerState::new(
                    SamplerState::new(value, duplicated.state.state.clone()),
                    duplicated.num,
                ));
            }
        }
        rescored
    }

    fn top_k_samples(
        &mut self,
        states: &[SamplerState<Self::State>],
        k: usize,
    ) -> Vec<DuplicatedSamplerState<Self::State>> {
        self.sampler.top_k_samples(states, k)
    }
}
