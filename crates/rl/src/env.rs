//! Reinforcement learning environment contract and the cart-pole task.

use physics::{CartPole, CartPoleConfig, PhysicsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum EnvError {
    #[error("action {action} is out of range for {count} actions")]
    InvalidAction { action: usize, count: usize },
    #[error("episode is over; call reset before stepping")]
    NeedsReset,
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// Auxiliary information returned with every step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepInfo {
    /// Steps taken since the last reset, including this one.
    pub elapsed_steps: usize,
    /// The episode ended because of the time limit rather than failure.
    pub truncated: bool,
}

/// Outcome of [`Env::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

/// Reinforcement learning environment trait.
///
/// Inspired by classic frameworks like OpenAI Gym, this trait defines the core
/// interface an environment must provide. Each call to [`step`] advances the
/// simulation by one discrete action and returns the new observation vector,
/// a reward signal, and whether the episode has terminated.
///
/// [`step`]: Env::step
pub trait Env {
    /// Reset the environment to a starting state and return the initial
    /// observation vector.
    fn reset(&mut self) -> Vec<f32>;

    /// Advance the environment by one action.
    ///
    /// # Errors
    ///
    /// Fails for an action outside `0..action_count()` or when the episode
    /// has already finished.
    fn step(&mut self, action: usize) -> Result<Step, EnvError>;

    /// Size of the observation vector.
    fn observation_size(&self) -> usize;

    /// Number of discrete actions.
    fn action_count(&self) -> usize;

    /// Average episode reward over which the task counts as solved.
    fn reward_threshold(&self) -> Option<f32> {
        None
    }
}

/// Episode rules layered on top of the cart-pole physics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartPoleEnvConfig {
    pub physics: CartPoleConfig,
    /// Time limit; reaching it truncates the episode.
    pub max_episode_steps: usize,
    pub reward_threshold: Option<f32>,
}

impl Default for CartPoleEnvConfig {
    fn default() -> Self {
        Self {
            physics: CartPoleConfig::default(),
            max_episode_steps: 200,
            reward_threshold: Some(195.0),
        }
    }
}

/// Cart-pole balancing task with two actions: push left (0) or right (1).
///
/// Every step, including the one that ends the episode, yields a reward of 1.
pub struct CartPoleEnv {
    cartpole: CartPole,
    rng: fastrand::Rng,
    config: CartPoleEnvConfig,
    elapsed: usize,
    needs_reset: bool,
}

impl CartPoleEnv {
    /// Creates the environment; call [`Env::reset`] before the first step.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::Physics`] if the physics configuration is invalid.
    pub fn new(config: CartPoleEnvConfig, seed: u64) -> Result<Self, EnvError> {
        Ok(Self {
            cartpole: CartPole::new(config.physics.clone())?,
            rng: fastrand::Rng::with_seed(seed),
            config,
            elapsed: 0,
            needs_reset: true,
        })
    }

    #[must_use]
    pub fn cartpole(&self) -> &CartPole {
        &self.cartpole
    }
}

impl Env for CartPoleEnv {
    fn reset(&mut self) -> Vec<f32> {
        self.elapsed = 0;
        self.needs_reset = false;
        self.cartpole.reset(&mut self.rng).to_array().to_vec()
    }

    fn step(&mut self, action: usize) -> Result<Step, EnvError> {
        if action >= self.action_count() {
            return Err(EnvError::InvalidAction { action, count: self.action_count() });
        }
        if self.needs_reset {
            return Err(EnvError::NeedsReset);
        }

        let push = if action == 0 { -1.0 } else { 1.0 };
        let state = match self.cartpole.step(push) {
            Ok(state) => state,
            Err(e) => {
                self.needs_reset = true;
                return Err(e.into());
            }
        };
        self.elapsed += 1;

        let failed = self.cartpole.is_failed();
        let truncated = !failed && self.elapsed >= self.config.max_episode_steps;
        let done = failed || truncated;
        self.needs_reset = done;

        Ok(Step {
            observation: state.to_array().to_vec(),
            reward: 1.0,
            done,
            info: StepInfo { elapsed_steps: self.elapsed, truncated },
        })
    }

    fn observation_size(&self) -> usize {
        4
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reward_threshold(&self) -> Option<f32> {
        self.config.reward_threshold
    }
}
