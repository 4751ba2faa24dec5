use crate::env::EnvError;
use ml::MlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum A2cError {
    #[error("trajectory is empty")]
    EmptyTrajectory,
    #[error("length mismatch: {states} states, {actions} actions, {rewards} rewards")]
    LengthMismatch {
        states: usize,
        actions: usize,
        rewards: usize,
    },
    #[error("state has {got} features, expected {expected}")]
    StateSize { expected: usize, got: usize },
    #[error("action {action} is out of range for {count} actions")]
    ActionOutOfRange { action: usize, count: usize },
    #[error("one-hot row has {got} entries, expected {expected}")]
    ActionEncoding { expected: usize, got: usize },
    #[error("loss is not finite: {0}")]
    NonFiniteLoss(f32),
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Backend(#[from] MlError),
    #[error(transparent)]
    Env(#[from] EnvError),
}
