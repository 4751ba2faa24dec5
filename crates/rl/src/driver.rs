//! Episode loop: acting, one update per finished episode and a rolling-mean
//! convergence check, modelled as an explicit state machine.

use crate::actor_critic::LossBreakdown;
use crate::agent::A2cAgent;
use crate::config::DriverConfig;
use crate::env::Env;
use crate::error::A2cError;
use crate::sampler::{ActionSampler, CategoricalSampler};
use crate::trajectory::{one_hot, Trajectory};
use std::collections::VecDeque;

/// How a training run ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// The mean of the reward window exceeded the threshold after `episode`
    /// (zero-based).
    Solved { episode: usize, rolling_mean: f32 },
    BudgetExhausted { episodes: usize },
}

/// Where the driver is in the episode loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    EpisodeReset,
    StepActing,
    EpisodeDone,
    Update,
    ConvergenceCheck,
    Terminated(Outcome),
}

/// Most recent episode totals, oldest dropped first.
#[derive(Clone, Debug)]
pub struct RewardWindow {
    totals: VecDeque<f32>,
    capacity: usize,
}

impl RewardWindow {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { totals: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, total: f32) {
        if self.totals.len() == self.capacity {
            self.totals.pop_front();
        }
        self.totals.push_back(total);
    }

    /// Mean of the retained totals, or 0 when empty.
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.totals.is_empty() {
            return 0.0;
        }
        self.totals.iter().sum::<f32>() / self.totals.len() as f32
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub total_reward: f32,
    pub steps: usize,
    pub rolling_mean: f32,
    /// `None` when the update was skipped because the loss was not finite.
    pub loss: Option<LossBreakdown>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingReport {
    pub outcome: Outcome,
    pub history: Vec<EpisodeRecord>,
}

/// Runs episodes of `env` with `agent`, training after each one.
pub struct Driver<E: Env, S: ActionSampler = CategoricalSampler> {
    agent: A2cAgent<S>,
    env: E,
    config: DriverConfig,
    threshold: Option<f32>,
    phase: Phase,
    episode: usize,
    observation: Vec<f32>,
    trajectory: Trajectory,
    window: RewardWindow,
    history: Vec<EpisodeRecord>,
}

impl<E: Env, S: ActionSampler> Driver<E, S> {
    /// # Errors
    ///
    /// Returns [`A2cError::InvalidConfig`] for a zero window or step ceiling,
    /// or when the agent does not fit the environment's spaces.
    pub fn new(agent: A2cAgent<S>, env: E, config: DriverConfig) -> Result<Self, A2cError> {
        if config.window == 0 {
            return Err(A2cError::InvalidConfig("window must be positive"));
        }
        if config.max_steps_per_episode == 0 {
            return Err(A2cError::InvalidConfig("max_steps_per_episode must be positive"));
        }
        if agent.model().state_dim() != env.observation_size()
            || agent.action_count() != env.action_count()
        {
            return Err(A2cError::InvalidConfig(
                "agent dimensions do not match the environment",
            ));
        }

        let threshold = config.solved_threshold.or_else(|| env.reward_threshold());
        Ok(Self {
            agent,
            env,
            threshold,
            phase: Phase::EpisodeReset,
            episode: 0,
            observation: Vec::new(),
            trajectory: Trajectory::new(),
            window: RewardWindow::new(config.window),
            history: Vec::new(),
            config,
        })
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn agent(&self) -> &A2cAgent<S> {
        &self.agent
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    #[must_use]
    pub fn history(&self) -> &[EpisodeRecord] {
        &self.history
    }

    #[must_use]
    pub fn threshold(&self) -> Option<f32> {
        self.threshold
    }

    /// Performs one transition and returns the new phase. Once terminated,
    /// further calls leave the phase unchanged.
    ///
    /// # Errors
    ///
    /// Environment and agent failures are propagated; a non-finite loss only
    /// skips that episode's update.
    pub fn advance(&mut self) -> Result<&Phase, A2cError> {
        let current = self.phase;
        self.phase = match current {
            Phase::EpisodeReset => self.reset_episode(),
            Phase::StepActing => self.act()?,
            Phase::EpisodeDone => Phase::Update,
            Phase::Update => self.update()?,
            Phase::ConvergenceCheck => self.check_convergence(),
            terminated @ Phase::Terminated(_) => terminated,
        };
        Ok(&self.phase)
    }

    /// Advances until the run terminates.
    ///
    /// # Errors
    ///
    /// See [`Driver::advance`].
    pub fn run(&mut self) -> Result<TrainingReport, A2cError> {
        loop {
            let phase = *self.advance()?;
            if let Phase::Terminated(outcome) = phase {
                return Ok(TrainingReport { outcome, history: self.history.clone() });
            }
        }
    }

    pub fn into_parts(self) -> (A2cAgent<S>, E) {
        (self.agent, self.env)
    }

    fn reset_episode(&mut self) -> Phase {
        if self.episode >= self.config.max_episodes {
            let episodes = self.episode;
            tracing::info!(
                episodes,
                rolling_mean = self.window.mean(),
                "episode budget exhausted"
            );
            return Phase::Terminated(Outcome::BudgetExhausted { episodes });
        }
        self.trajectory.clear();
        self.observation = self.env.reset();
        Phase::StepActing
    }

    fn act(&mut self) -> Result<Phase, A2cError> {
        let action = self.agent.choose_an_action(&self.observation)?;
        let step = self.env.step(action)?;
        let state = std::mem::replace(&mut self.observation, step.observation);
        self.trajectory.push(state, action, step.reward);

        if step.done {
            return Ok(Phase::EpisodeDone);
        }
        if self.trajectory.len() >= self.config.max_steps_per_episode {
            tracing::warn!(
                episode = self.episode,
                steps = self.trajectory.len(),
                "step ceiling reached before the episode ended"
            );
            return Ok(Phase::EpisodeDone);
        }
        Ok(Phase::StepActing)
    }

    fn update(&mut self) -> Result<Phase, A2cError> {
        let actions = one_hot(self.trajectory.actions(), self.agent.action_count())?;
        let trained = self
            .agent
            .train(self.trajectory.states(), &actions, self.trajectory.rewards());
        let loss = match trained {
            Ok(stats) => Some(stats.loss),
            Err(A2cError::NonFiniteLoss(value)) => {
                tracing::warn!(
                    episode = self.episode,
                    loss = value,
                    "skipping update with non-finite loss"
                );
                None
            }
            Err(e) => return Err(e),
        };

        let total_reward = self.trajectory.total_reward();
        self.window.push(total_reward);
        let record = EpisodeRecord {
            episode: self.episode,
            total_reward,
            steps: self.trajectory.len(),
            rolling_mean: self.window.mean(),
            loss,
        };
        tracing::debug!(
            episode = record.episode,
            reward = record.total_reward,
            steps = record.steps,
            rolling_mean = record.rolling_mean,
            "episode finished"
        );
        if self.config.log_every > 0 && (record.episode + 1) % self.config.log_every == 0 {
            tracing::info!(
                "episode {} reward {:.1} rolling mean {:.2}",
                record.episode,
                record.total_reward,
                record.rolling_mean
            );
        }
        self.history.push(record);
        self.episode += 1;
        Ok(Phase::ConvergenceCheck)
    }

    fn check_convergence(&self) -> Phase {
        let rolling_mean = self.window.mean();
        match self.threshold {
            Some(threshold) if rolling_mean > threshold => {
                let episode = self.episode - 1;
                tracing::info!(episode, rolling_mean, threshold, "solved");
                Phase::Terminated(Outcome::Solved { episode, rolling_mean })
            }
            _ => Phase::EpisodeReset,
        }
    }
}

/// Plays `episodes` greedy episodes without training and returns their total
/// rewards. Each episode is cut off after `max_steps` steps.
///
/// # Errors
///
/// Environment and agent failures are propagated.
pub fn evaluate<E: Env, S: ActionSampler>(
    agent: &A2cAgent<S>,
    env: &mut E,
    episodes: usize,
    max_steps: usize,
) -> Result<Vec<f32>, A2cError> {
    let mut totals = Vec::with_capacity(episodes);
    for _ in 0..episodes {
        let mut observation = env.reset();
        let mut total = 0.0;
        for _ in 0..max_steps {
            let step = env.step(agent.greedy_action(&observation)?)?;
            total += step.reward;
            if step.done {
                break;
            }
            observation = step.observation;
        }
        totals.push(total);
    }
    Ok(totals)
}
