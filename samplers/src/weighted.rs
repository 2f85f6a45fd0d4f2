//! Weighted random selection over a scenario

use loadgen_core::{RequestSpec, Sampler, SamplerError, Scenario};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};

/// Picks each request with probability `weight / total_weight`
///
/// Every call is an independent draw. The random source sits behind a mutex
/// so one sampler can be shared by all workers.
pub struct WeightedSampler<R = StdRng> {
    specs: Vec<Arc<RequestSpec>>,
    index: Option<WeightedIndex<f64>>,
    rng: Mutex<R>,
}

impl WeightedSampler<StdRng> {
    /// Sampler seeded from OS entropy
    pub fn new(scenario: &Scenario) -> Result<Self, SamplerError> {
        Self::with_rng(scenario, StdRng::from_entropy())
    }

    /// Deterministic sampler for reproducible request mixes
    pub fn seeded(scenario: &Scenario, seed: u64) -> Result<Self, SamplerError> {
        Self::with_rng(scenario, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> WeightedSampler<R> {
    /// Sampler drawing from a caller-supplied random source
    pub fn with_rng(scenario: &Scenario, rng: R) -> Result<Self, SamplerError> {
        let entries = scenario.entries();
        if entries.is_empty() {
            return Err(SamplerError::Empty);
        }

        let specs: Vec<_> = entries.iter().map(|e| Arc::clone(&e.spec)).collect();

        // A single entry never needs the random source
        let index = if specs.len() > 1 {
            let weights = entries.iter().map(|e| e.weight);
            let index = WeightedIndex::new(weights)
                .map_err(|e| SamplerError::InvalidWeights(e.to_string()))?;
            Some(index)
        } else {
            None
        };

        tracing::debug!(entries = specs.len(), "Weighted sampler ready");

        Ok(Self {
            specs,
            index,
            rng: Mutex::new(rng),
        })
    }

    /// Number of request shapes in the mix
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Always false; construction rejects empty scenarios
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<R: Rng + Send> Sampler for WeightedSampler<R> {
    fn name(&self) -> &str {
        "weighted"
    }

    fn sample(&self) -> Result<Arc<RequestSpec>, SamplerError> {
        let slot = match &self.index {
            Some(index) => {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                index.sample(&mut *rng)
            }
            None => 0,
        };

        self.specs
            .get(slot)
            .map(Arc::clone)
            .ok_or(SamplerError::Empty)
    }
}

impl<R> std::fmt::Debug for WeightedSampler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedSampler")
            .field("entries", &self.specs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadgen_core::ScenarioEntry;
    use rand::rngs::mock::StepRng;

    fn scenario(weights: &[f64]) -> Scenario {
        let entries = weights
            .iter()
            .enumerate()
            .map(|(i, w)| ScenarioEntry::new(RequestSpec::get(format!("http://localhost/{i}")), *w))
            .collect();
        Scenario::new(entries).unwrap()
    }

    fn slot(spec: &RequestSpec) -> usize {
        spec.url.rsplit('/').next().unwrap().parse().unwrap()
    }

    #[test]
    fn test_single_entry_skips_rng() {
        let sampler = WeightedSampler::with_rng(&scenario(&[3.0]), StepRng::new(0, 0)).unwrap();
        assert!(sampler.index.is_none());
        for _ in 0..10 {
            assert_eq!(slot(&sampler.sample().unwrap()), 0);
        }
    }

    #[test]
    fn test_weighted_frequencies_converge() {
        let sampler = WeightedSampler::seeded(&scenario(&[1.0, 3.0, 6.0]), 42).unwrap();
        let n = 100_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            counts[slot(&sampler.sample().unwrap())] += 1;
        }

        for (count, expected) in counts.iter().zip([0.1, 0.3, 0.6]) {
            let observed = *count as f64 / n as f64;
            assert!(
                (observed - expected).abs() < 0.01,
                "observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_seeded_sampler_is_reproducible() {
        let mix = scenario(&[1.0, 1.0, 1.0, 1.0]);
        let a = WeightedSampler::seeded(&mix, 7).unwrap();
        let b = WeightedSampler::seeded(&mix, 7).unwrap();
        let draws_a: Vec<_> = (0..50).map(|_| slot(&a.sample().unwrap())).collect();
        let draws_b: Vec<_> = (0..50).map(|_| slot(&b.sample().unwrap())).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn test_concurrent_sampling() {
        let sampler = Arc::new(WeightedSampler::seeded(&scenario(&[1.0, 1.0]), 1).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sampler = Arc::clone(&sampler);
                std::thread::spawn(move || {
                    (0..1000)
                        .filter(|_| slot(&sampler.sample().unwrap()) == 0)
                        .count()
                })
            })
            .collect();
        let zeros: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert!(zeros > 1700 && zeros < 2300, "zeros = {zeros}");
    }

    #[test]
    fn test_sampler_metadata() {
        let sampler = WeightedSampler::new(&scenario(&[1.0, 2.0])).unwrap();
        assert_eq!(sampler.name(), "weighted");
        assert_eq!(sampler.len(), 2);
        assert!(!sampler.is_empty());
        assert!(format!("{sampler:?}").contains("entries: 2"));
    }
}
