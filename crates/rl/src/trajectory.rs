use crate::error::A2cError;

/// The (state, action, reward) triples of one episode.
///
/// The three sequences only grow together through [`Trajectory::push`], so
/// they always have the same length.
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    states: Vec<Vec<f32>>,
    actions: Vec<usize>,
    rewards: Vec<f32>,
}

impl Trajectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: Vec<f32>, action: usize, reward: f32) {
        self.states.push(state);
        self.actions.push(action);
        self.rewards.push(reward);
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.actions.clear();
        self.rewards.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    #[must_use]
    pub fn states(&self) -> &[Vec<f32>] {
        &self.states
    }

    #[must_use]
    pub fn actions(&self) -> &[usize] {
        &self.actions
    }

    #[must_use]
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    #[must_use]
    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }
}

/// Encodes each action as a row with a single 1.0 at its index.
///
/// # Errors
///
/// Returns [`A2cError::ActionOutOfRange`] for an index `>= action_count`.
pub fn one_hot(actions: &[usize], action_count: usize) -> Result<Vec<Vec<f32>>, A2cError> {
    actions
        .iter()
        .map(|&action| {
            if action >= action_count {
                return Err(A2cError::ActionOutOfRange { action, count: action_count });
            }
            let mut row = vec![0.0; action_count];
            row[action] = 1.0;
            Ok(row)
        })
        .collect()
}
