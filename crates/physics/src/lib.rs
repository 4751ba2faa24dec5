#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Cart-pole dynamics
//!
//! The classic cart-pole system: a pole hinged on a cart that moves along a
//! frictionless track. The cart is pushed left or right with a fixed force
//! and the equations of motion are integrated with explicit Euler steps.
//!
//! This crate only knows about physics. Episode bookkeeping (time limits,
//! rewards, action indices) lives in the `rl` crate's environment wrapper.
//!
//! ```
//! use physics::{CartPole, CartPoleConfig};
//!
//! let mut cartpole = CartPole::new(CartPoleConfig::default())?;
//! let mut rng = fastrand::Rng::with_seed(0);
//! cartpole.reset(&mut rng);
//! let state = cartpole.step(1.0)?;
//! assert!(state.x_dot > 0.0);
//! # Ok::<(), physics::PhysicsError>(())
//! ```

pub mod cartpole;
pub mod error;

pub use cartpole::{CartPole, CartPoleConfig, CartPoleState};
pub use error::PhysicsError;
