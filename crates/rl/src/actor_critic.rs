//! Two-headed function approximator: a shared ReLU trunk feeding a softmax
//! policy head and a scalar value head.

use crate::error::A2cError;
use ml::tape::transfer_grads;
use ml::{Adam, LayerSpec, MlError, Mlp, NoGrad, Recorder, Tape, Tensor};
use std::collections::HashMap;

/// Probabilities are clamped to this floor before taking the logarithm.
pub const MIN_PROB: f32 = 1e-8;

/// One training batch, rows aligned by timestep.
#[derive(Clone, Debug)]
pub struct Batch {
    /// `[T, state_dim]`
    pub states: Tensor,
    /// `[T, action_count]`, one-hot.
    pub actions: Tensor,
    /// `[T]`, already normalised.
    pub advantages: Tensor,
    /// `[T]`, discounted returns used as critic targets.
    pub returns: Tensor,
}

impl Batch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Scalar values of the loss terms for one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LossBreakdown {
    pub total: f32,
    /// `-sum(log pi(a|s) * advantage)`
    pub policy: f32,
    /// Mean squared error of the value head.
    pub value: f32,
    /// Mean policy entropy.
    pub entropy: f32,
}

#[derive(Clone, Debug)]
pub struct ActorCritic {
    trunk: Mlp,
    policy_head: Mlp,
    value_head: Mlp,
    entropy_coef: f32,
}

impl ActorCritic {
    /// Builds the network from the state size, the action count and the
    /// trunk widths, drawing initial weights from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`A2cError::InvalidConfig`] for a zero-sized state, action set
    /// or hidden layer.
    pub fn new(
        state_dim: usize,
        action_count: usize,
        hidden_layers: &[usize],
        entropy_coef: f32,
        rng: &mut fastrand::Rng,
    ) -> Result<Self, A2cError> {
        if state_dim == 0 {
            return Err(A2cError::InvalidConfig("state dimension must be positive"));
        }
        if action_count == 0 {
            return Err(A2cError::InvalidConfig("action count must be positive"));
        }
        if hidden_layers.contains(&0) {
            return Err(A2cError::InvalidConfig("hidden layer widths must be positive"));
        }

        let specs: Vec<LayerSpec> = hidden_layers.iter().map(|&w| LayerSpec::relu(w)).collect();
        let trunk = Mlp::build(state_dim, &specs, rng);
        let features = trunk.output_dim();
        let policy_head = Mlp::build(features, &[LayerSpec::softmax(action_count)], rng);
        let value_head = Mlp::build(features, &[LayerSpec::linear(1)], rng);

        Ok(Self { trunk, policy_head, value_head, entropy_coef })
    }

    #[must_use]
    pub fn state_dim(&self) -> usize {
        self.trunk.input_dim()
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.policy_head.output_dim()
    }

    /// Maps `[T, state_dim]` states to `[T, action_count]` probabilities and
    /// `[T]` values.
    pub fn forward(
        &self,
        states: &Tensor,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> (Tensor, Tensor) {
        let features = self.trunk.forward(states, recorder, tensors);
        let probs = self.policy_head.forward(&features, recorder, tensors);
        let value = self.value_head.forward(&features, recorder, tensors);
        let rows = value.len();
        let value = value.reshape(vec![rows], recorder, tensors);
        (probs, value)
    }

    /// Action probabilities for a single state.
    ///
    /// # Errors
    ///
    /// Returns [`A2cError::StateSize`] if `state` has the wrong width.
    pub fn policy(&self, state: &[f32]) -> Result<Vec<f32>, A2cError> {
        self.check_state(state)?;
        let x = Tensor::from_vec(vec![1, state.len()], state.to_vec());
        let (probs, _) = self.forward(&x, &mut NoGrad, &mut HashMap::new());
        Ok(probs.data)
    }

    /// Value estimates for a `[T, state_dim]` batch, one forward pass.
    #[must_use]
    pub fn values(&self, states: &Tensor) -> Vec<f32> {
        let (_, values) = self.forward(states, &mut NoGrad, &mut HashMap::new());
        values.data
    }

    fn check_state(&self, state: &[f32]) -> Result<(), A2cError> {
        if state.len() == self.state_dim() {
            Ok(())
        } else {
            Err(A2cError::StateSize { expected: self.state_dim(), got: state.len() })
        }
    }

    /// Joint loss: `policy + value - entropy_coef * entropy`.
    fn loss(
        &self,
        batch: &Batch,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> (Tensor, LossBreakdown) {
        let (probs, values) = self.forward(&batch.states, recorder, tensors);

        let taken = probs.mul(&batch.actions, recorder, tensors).row_sum(recorder, tensors);
        let log_taken = taken.clamp(MIN_PROB, 1.0, recorder, tensors).log(recorder, tensors);
        let policy = log_taken
            .mul(&batch.advantages, recorder, tensors)
            .reduce_sum(recorder, tensors)
            .mul_scalar(-1.0, recorder, tensors);

        let value = values
            .sub(&batch.returns, recorder, tensors)
            .pow(2.0, recorder, tensors)
            .reduce_mean(recorder, tensors);

        let log_probs = probs.clamp(MIN_PROB, 1.0, recorder, tensors).log(recorder, tensors);
        let entropy = probs
            .mul(&log_probs, recorder, tensors)
            .row_sum(recorder, tensors)
            .reduce_mean(recorder, tensors)
            .mul_scalar(-1.0, recorder, tensors);

        let bonus = entropy.mul_scalar(self.entropy_coef, recorder, tensors);
        let total = policy
            .add(&value, recorder, tensors)
            .sub(&bonus, recorder, tensors);

        let breakdown = LossBreakdown {
            total: total.item(),
            policy: policy.item(),
            value: value.item(),
            entropy: entropy.item(),
        };
        (total, breakdown)
    }

    /// Loss of the current parameters on `batch`, without updating them.
    #[must_use]
    pub fn evaluate_loss(&self, batch: &Batch) -> LossBreakdown {
        self.loss(batch, &mut NoGrad, &mut HashMap::new()).1
    }

    /// Records the loss on a fresh tape and back-propagates it. The returned
    /// store holds the gradient of every parameter.
    fn backward(&self, batch: &Batch) -> Result<(LossBreakdown, HashMap<usize, Tensor>), A2cError> {
        let mut tape = Tape::new();
        let mut tensors = HashMap::new();
        let (loss, breakdown) = self.loss(batch, &mut tape, &mut tensors);
        if !breakdown.total.is_finite() {
            return Err(A2cError::NonFiniteLoss(breakdown.total));
        }
        tape.backward(&loss, &mut tensors)?;
        Ok((breakdown, tensors))
    }

    /// Gradient of the joint loss for each parameter, in [`ActorCritic::params`]
    /// order, without changing anything.
    ///
    /// # Errors
    ///
    /// Same as [`ActorCritic::fit`].
    pub fn gradients(&self, batch: &Batch) -> Result<(LossBreakdown, Vec<Vec<f32>>), A2cError> {
        let (breakdown, tensors) = self.backward(batch)?;
        let grads = self
            .params()
            .iter()
            .map(|p| {
                tensors
                    .get(&p.id)
                    .and_then(|t| t.grad.clone())
                    .ok_or(MlError::MissingGradient(p.id))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((breakdown, grads))
    }

    /// One optimizer step on the joint loss. Returns the loss measured before
    /// the step.
    ///
    /// # Errors
    ///
    /// Returns [`A2cError::NonFiniteLoss`] (leaving the parameters untouched)
    /// if the loss is NaN or infinite, or a backend error from the tape or
    /// optimizer.
    pub fn fit(&mut self, batch: &Batch, optimizer: &mut Adam) -> Result<LossBreakdown, A2cError> {
        let (breakdown, tensors) = self.backward(batch)?;
        let mut params = self.params_mut();
        transfer_grads(&mut params, &tensors);
        optimizer.step(&mut params)?;
        Ok(breakdown)
    }

    #[must_use]
    pub fn params(&self) -> Vec<&Tensor> {
        let mut out = self.trunk.params();
        out.extend(self.policy_head.params());
        out.extend(self.value_head.params());
        out
    }

    pub fn params_mut(&mut self) -> Vec<&mut Tensor> {
        let mut out = self.trunk.params_mut();
        out.extend(self.policy_head.params_mut());
        out.extend(self.value_head.params_mut());
        out
    }
}
