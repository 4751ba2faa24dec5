//! # Advantage actor-critic on discrete-action environments
//!
//! [`A2cAgent`] couples an [`ActorCritic`] network (shared trunk, softmax
//! policy head, scalar value head) with an Adam optimizer. After every
//! finished episode it computes discounted returns, subtracts the critic's
//! value estimates, normalises the advantages and takes one gradient step on
//! the joint policy, value and entropy loss.
//!
//! [`Driver`] runs that loop against any [`Env`] as a small state machine and
//! stops once the mean of the recent episode totals clears the environment's
//! threshold, or the episode budget runs out.
//!
//! ```no_run
//! use rl::{A2cAgent, A2cConfig, CartPoleEnv, CartPoleEnvConfig, Driver, DriverConfig};
//!
//! # fn main() -> Result<(), rl::A2cError> {
//! let env = CartPoleEnv::new(CartPoleEnvConfig::default(), 0)?;
//! let agent = A2cAgent::new(4, 2, A2cConfig::default(), 0)?;
//! let report = Driver::new(agent, env, DriverConfig::default())?.run()?;
//! println!("{:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

pub mod actor_critic;
pub mod advantage;
pub mod agent;
pub mod config;
pub mod driver;
pub mod env;
pub mod error;
pub mod sampler;
pub mod trajectory;

pub use actor_critic::{ActorCritic, Batch, LossBreakdown};
pub use agent::{A2cAgent, TrainStats};
pub use config::{A2cConfig, DriverConfig, RunConfig};
pub use driver::{evaluate, Driver, EpisodeRecord, Outcome, Phase, RewardWindow, TrainingReport};
pub use env::{CartPoleEnv, CartPoleEnvConfig, Env, EnvError, Step, StepInfo};
pub use error::A2cError;
pub use sampler::{ActionSampler, CategoricalSampler, GreedySampler};
pub use trajectory::{one_hot, Trajectory};
