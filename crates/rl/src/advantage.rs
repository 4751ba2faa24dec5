//! Discounted returns and advantage normalisation.

/// Backward accumulation `G[t] = r[t] + gamma * G[t + 1]`, seeded with zero
/// past the last step. Episodes handed to this function have terminated, so
/// nothing is bootstrapped from the critic.
#[must_use]
pub fn discounted_returns(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0.0; rewards.len()];
    let mut g = 0.0;
    for (t, &r) in rewards.iter().enumerate().rev() {
        g = r + gamma * g;
        returns[t] = g;
    }
    returns
}

/// Elementwise `returns - values`.
#[must_use]
pub fn advantages(returns: &[f32], values: &[f32]) -> Vec<f32> {
    debug_assert_eq!(returns.len(), values.len());
    returns.iter().zip(values).map(|(g, v)| g - v).collect()
}

/// Rescales to zero mean and unit (population) standard deviation.
///
/// `epsilon` is added to the deviation, so a constant input, including a
/// single element, maps to all zeros.
#[must_use]
pub fn normalize(values: &[f32], epsilon: f32) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    let std = var.sqrt();
    values.iter().map(|v| (v - mean) / (std + epsilon)).collect()
}
