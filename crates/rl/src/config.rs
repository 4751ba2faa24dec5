use crate::env::CartPoleEnvConfig;
use serde::{Deserialize, Serialize};

/// Hyper-parameters of the agent and its approximator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct A2cConfig {
    /// Discount factor applied when accumulating returns.
    pub gamma: f32,
    /// Adam step size.
    pub learning_rate: f32,
    /// Widths of the shared ReLU trunk, input side first.
    pub hidden_layers: Vec<usize>,
    /// Weight of the entropy bonus subtracted from the loss.
    pub entropy_coef: f32,
    /// Added to the advantage standard deviation before dividing.
    pub advantage_epsilon: f32,
}

impl Default for A2cConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            learning_rate: 0.01,
            hidden_layers: vec![32, 32],
            entropy_coef: 0.01,
            advantage_epsilon: 1e-8,
        }
    }
}

impl A2cConfig {
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err("gamma must lie in [0, 1]");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err("learning_rate must be positive");
        }
        if self.hidden_layers.contains(&0) {
            return Err("hidden layer widths must be positive");
        }
        if !(self.advantage_epsilon.is_finite() && self.advantage_epsilon > 0.0) {
            return Err("advantage_epsilon must be positive");
        }
        if !self.entropy_coef.is_finite() {
            return Err("entropy_coef must be finite");
        }
        Ok(())
    }
}

/// Episode budget and convergence criterion of the training driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub max_episodes: usize,
    /// Number of recent episode totals averaged for the solved check.
    pub window: usize,
    /// Overrides the environment's reward threshold when set.
    pub solved_threshold: Option<f32>,
    /// Ends an episode that never reports `done`.
    pub max_steps_per_episode: usize,
    /// Emit an info line every this many episodes; 0 disables it.
    pub log_every: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_episodes: 5000,
            window: 100,
            solved_threshold: None,
            max_steps_per_episode: 10_000,
            log_every: 50,
        }
    }
}

/// Everything needed for one training run, as loaded by the binary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub seed: u64,
    pub agent: A2cConfig,
    pub driver: DriverConfig,
    pub env: CartPoleEnvConfig,
    /// Greedy episodes played after training.
    pub eval_episodes: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            agent: A2cConfig::default(),
            driver: DriverConfig::default(),
            env: CartPoleEnvConfig::default(),
            eval_episodes: 10,
        }
    }
}
