//! Cart-pole system for reinforcement learning environments
//!
//! State is `[x, x_dot, theta, theta_dot]`: cart position, cart velocity,
//! pole angle from vertical (radians, positive leans right) and pole angular
//! velocity.

use crate::error::PhysicsError;
use serde::{Deserialize, Serialize};

/// Physical constants and failure limits for a [`CartPole`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartPoleConfig {
    /// Gravitational acceleration in m/s²
    pub gravity: f32,
    /// Cart mass in kg
    pub cart_mass: f32,
    /// Pole mass in kg
    pub pole_mass: f32,
    /// Half the pole length in meters
    pub pole_half_length: f32,
    /// Force applied to the cart for a full push
    pub force_magnitude: f32,
    /// Seconds between state updates
    pub tau: f32,
    /// Angle threshold for failure detection (radians)
    pub failure_angle: f32,
    /// Position threshold for failure detection (meters)
    pub position_limit: f32,
    /// Reset samples every state component from `[-reset_noise, reset_noise]`
    pub reset_noise: f32,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            cart_mass: 1.0,
            pole_mass: 0.1,
            pole_half_length: 0.5,
            force_magnitude: 10.0,
            tau: 0.02,
            failure_angle: 12.0_f32.to_radians(),
            position_limit: 2.4,
            reset_noise: 0.05,
        }
    }
}

impl CartPoleConfig {
    fn total_mass(&self) -> f32 {
        self.cart_mass + self.pole_mass
    }

    fn pole_mass_length(&self) -> f32 {
        self.pole_mass * self.pole_half_length
    }

    /// Checks that every constant is finite and physically meaningful.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let positive = [
            (self.cart_mass, "cart_mass must be positive"),
            (self.pole_mass, "pole_mass must be positive"),
            (self.pole_half_length, "pole_half_length must be positive"),
            (self.tau, "tau must be positive"),
            (self.failure_angle, "failure_angle must be positive"),
            (self.position_limit, "position_limit must be positive"),
        ];
        for (value, message) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PhysicsError::InvalidConfig(message));
            }
        }
        if !self.gravity.is_finite() || !self.force_magnitude.is_finite() {
            return Err(PhysicsError::InvalidConfig("gravity and force_magnitude must be finite"));
        }
        if !(self.reset_noise.is_finite() && self.reset_noise >= 0.0) {
            return Err(PhysicsError::InvalidConfig("reset_noise must be non-negative"));
        }
        Ok(())
    }
}

/// Instantaneous cart-pole state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartPoleState {
    pub x: f32,
    pub x_dot: f32,
    pub theta: f32,
    pub theta_dot: f32,
}

impl CartPoleState {
    #[must_use]
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.x_dot, self.theta, self.theta_dot]
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// A cart-pole integrated with explicit Euler steps.
#[derive(Clone, Debug)]
pub struct CartPole {
    /// Configuration for this cartpole
    pub config: CartPoleConfig,
    state: CartPoleState,
}

impl CartPole {
    /// Creates a cart-pole at rest in the upright position.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidConfig`] if the configuration is unusable.
    pub fn new(config: CartPoleConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        Ok(Self { config, state: CartPoleState::default() })
    }

    #[must_use]
    pub fn state(&self) -> CartPoleState {
        self.state
    }

    pub fn set_state(&mut self, state: CartPoleState) {
        self.state = state;
    }

    /// Resets every state component to a small uniform perturbation.
    pub fn reset(&mut self, rng: &mut fastrand::Rng) -> CartPoleState {
        let noise = self.config.reset_noise;
        let mut draw = [0.0_f32; 4];
        for v in &mut draw {
            *v = (rng.f32() * 2.0 - 1.0) * noise;
        }
        let [x, x_dot, theta, theta_dot] = draw;
        self.state = CartPoleState { x, x_dot, theta, theta_dot };
        self.state
    }

    /// Pushes the cart with `action` in `[-1, 1]` (scaled by the force
    /// magnitude; values outside are clamped) and advances one `tau`.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::NonFiniteState`] if the integration produced a
    /// NaN or infinite component; the previous state is kept.
    pub fn step(&mut self, action: f32) -> Result<CartPoleState, PhysicsError> {
        let c = &self.config;
        let s = self.state;
        let force = action.clamp(-1.0, 1.0) * c.force_magnitude;

        let (sin, cos) = s.theta.sin_cos();
        let temp = (force + c.pole_mass_length() * s.theta_dot * s.theta_dot * sin) / c.total_mass();
        let theta_acc = (c.gravity * sin - cos * temp)
            / (c.pole_half_length * (4.0 / 3.0 - c.pole_mass * cos * cos / c.total_mass()));
        let x_acc = temp - c.pole_mass_length() * theta_acc * cos / c.total_mass();

        let next = CartPoleState {
            x: s.x + c.tau * s.x_dot,
            x_dot: s.x_dot + c.tau * x_acc,
            theta: s.theta + c.tau * s.theta_dot,
            theta_dot: s.theta_dot + c.tau * theta_acc,
        };
        if !next.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }
        self.state = next;
        Ok(next)
    }

    /// Whether the cart left the track or the pole leaned past the limit.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state.x.abs() > self.config.position_limit
            || self.state.theta.abs() > self.config.failure_angle
    }
}
