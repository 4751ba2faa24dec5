use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PhysicsError {
    #[error("invalid cart-pole configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("cart-pole state became non-finite")]
    NonFiniteState,
}
