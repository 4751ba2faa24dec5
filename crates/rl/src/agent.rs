use crate::actor_critic::{ActorCritic, Batch, LossBreakdown};
use crate::advantage::{advantages, discounted_returns, normalize};
use crate::config::A2cConfig;
use crate::error::A2cError;
use crate::sampler::{argmax, ActionSampler, CategoricalSampler};
use ml::{Adam, Tensor};

/// Summary of one call to [`A2cAgent::train`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainStats {
    pub loss: LossBreakdown,
    /// Mean of the discounted returns of the trajectory.
    pub mean_return: f32,
    pub steps: usize,
}

/// Advantage actor-critic agent over a discrete action set.
pub struct A2cAgent<S: ActionSampler = CategoricalSampler> {
    model: ActorCritic,
    optimizer: Adam,
    sampler: S,
    config: A2cConfig,
}

impl A2cAgent<CategoricalSampler> {
    /// Creates an agent that samples actions stochastically.
    ///
    /// Weights are initialised from `seed`; the sampler uses `seed + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`A2cError::InvalidConfig`] if `config` or the dimensions are
    /// unusable.
    pub fn new(
        state_dim: usize,
        action_count: usize,
        config: A2cConfig,
        seed: u64,
    ) -> Result<Self, A2cError> {
        let sampler = CategoricalSampler::new(seed.wrapping_add(1));
        Self::with_sampler(state_dim, action_count, config, seed, sampler)
    }
}

impl<S: ActionSampler> A2cAgent<S> {
    /// Creates an agent with a caller-provided sampling strategy.
    ///
    /// # Errors
    ///
    /// Returns [`A2cError::InvalidConfig`] if `config` or the dimensions are
    /// unusable.
    pub fn with_sampler(
        state_dim: usize,
        action_count: usize,
        config: A2cConfig,
        seed: u64,
        sampler: S,
    ) -> Result<Self, A2cError> {
        config.validate().map_err(A2cError::InvalidConfig)?;
        let mut rng = fastrand::Rng::with_seed(seed);
        let model = ActorCritic::new(
            state_dim,
            action_count,
            &config.hidden_layers,
            config.entropy_coef,
            &mut rng,
        )?;
        let optimizer = Adam::new(&model.params(), config.learning_rate);
        Ok(Self { model, optimizer, sampler, config })
    }

    #[must_use]
    pub fn model(&self) -> &ActorCritic {
        &self.model
    }

    #[must_use]
    pub fn config(&self) -> &A2cConfig {
        &self.config
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.model.action_count()
    }

    /// Samples an action from the policy for a single state.
    ///
    /// # Errors
    ///
    /// Returns [`A2cError::StateSize`] for a state of the wrong width, or
    /// [`A2cError::ActionOutOfRange`] if the sampler misbehaves.
    pub fn choose_an_action(&mut self, state: &[f32]) -> Result<usize, A2cError> {
        let probs = self.model.policy(state)?;
        let action = self.sampler.sample(&probs);
        if action >= probs.len() {
            return Err(A2cError::ActionOutOfRange { action, count: probs.len() });
        }
        Ok(action)
    }

    /// The most probable action for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`A2cError::StateSize`] for a state of the wrong width.
    pub fn greedy_action(&self, state: &[f32]) -> Result<usize, A2cError> {
        Ok(argmax(&self.model.policy(state)?))
    }

    /// Validates a trajectory and turns it into a training batch: discounted
    /// returns, critic values, and normalised advantages.
    ///
    /// # Errors
    ///
    /// Fails on empty input, mismatched lengths, or rows of the wrong width.
    pub fn prepare_batch(
        &self,
        states: &[Vec<f32>],
        actions: &[Vec<f32>],
        rewards: &[f32],
    ) -> Result<Batch, A2cError> {
        if states.len() != actions.len() || states.len() != rewards.len() {
            return Err(A2cError::LengthMismatch {
                states: states.len(),
                actions: actions.len(),
                rewards: rewards.len(),
            });
        }
        if states.is_empty() {
            return Err(A2cError::EmptyTrajectory);
        }

        let state_dim = self.model.state_dim();
        let action_count = self.model.action_count();
        if let Some(bad) = states.iter().find(|s| s.len() != state_dim) {
            return Err(A2cError::StateSize { expected: state_dim, got: bad.len() });
        }
        if let Some(bad) = actions.iter().find(|a| a.len() != action_count) {
            return Err(A2cError::ActionEncoding { expected: action_count, got: bad.len() });
        }

        let t = rewards.len();
        let states = Tensor::from_vec(vec![t, state_dim], states.concat());
        let actions = Tensor::from_vec(vec![t, action_count], actions.concat());

        let returns = discounted_returns(rewards, self.config.gamma);
        let values = self.model.values(&states);
        let adv = normalize(&advantages(&returns, &values), self.config.advantage_epsilon);

        Ok(Batch {
            states,
            actions,
            advantages: Tensor::from_vec(vec![t], adv),
            returns: Tensor::from_vec(vec![t], returns),
        })
    }

    /// One advantage actor-critic update from a finished episode.
    ///
    /// `actions` are one-hot rows. The parameters change in place through a
    /// single Adam step.
    ///
    /// # Errors
    ///
    /// See [`A2cAgent::prepare_batch`]; additionally
    /// [`A2cError::NonFiniteLoss`] aborts the update before the optimizer
    /// step.
    pub fn train(
        &mut self,
        states: &[Vec<f32>],
        actions: &[Vec<f32>],
        rewards: &[f32],
    ) -> Result<TrainStats, A2cError> {
        let batch = self.prepare_batch(states, actions, rewards)?;
        let mean_return = batch.returns.data().iter().sum::<f32>() / batch.len() as f32;
        let loss = self.model.fit(&batch, &mut self.optimizer)?;
        Ok(TrainStats { loss, mean_return, steps: batch.len() })
    }
}
