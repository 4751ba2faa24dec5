//! Strategies for turning an action distribution into an action index.

/// Picks an action index from a probability vector.
///
/// Implementations must return an index in `0..probs.len()` for any non-empty
/// input, even if the probabilities are unnormalised or contain NaN.
pub trait ActionSampler {
    fn sample(&mut self, probs: &[f32]) -> usize;
}

/// Draws from the categorical distribution described by `probs`.
pub struct CategoricalSampler {
    rng: fastrand::Rng,
}

impl CategoricalSampler {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { rng: fastrand::Rng::with_seed(seed) }
    }
}

impl ActionSampler for CategoricalSampler {
    fn sample(&mut self, probs: &[f32]) -> usize {
        let total: f32 = probs.iter().filter(|p| p.is_finite() && **p > 0.0).sum();
        if total.is_nan() || total <= 0.0 {
            return self.rng.usize(..probs.len().max(1));
        }
        let u = self.rng.f32() * total;
        let mut cumulative = 0.0;
        let mut fallback = 0;
        for (i, &p) in probs.iter().enumerate() {
            if !(p.is_finite() && p > 0.0) {
                continue;
            }
            cumulative += p;
            fallback = i;
            if u < cumulative {
                return i;
            }
        }
        // Rounding can leave `u` just above the final cumulative sum.
        fallback
    }
}

/// Always takes the most probable action; ties go to the lowest index.
#[derive(Default)]
pub struct GreedySampler;

impl ActionSampler for GreedySampler {
    fn sample(&mut self, probs: &[f32]) -> usize {
        argmax(probs)
    }
}

pub(crate) fn argmax(probs: &[f32]) -> usize {
    let mut best = 0;
    for (i, &p) in probs.iter().enumerate() {
        if p > probs[best] || probs[best].is_nan() {
            best = i;
        }
    }
    best
}
