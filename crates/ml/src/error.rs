use thiserror::Error;

/// Failures raised by the autodiff tape and the optimizers.
#[derive(Error, Debug)]
pub enum MlError {
    #[error("tensor {0} is not present in the tensor store")]
    MissingTensor(usize),
    #[error("parameter {0} has no gradient")]
    MissingGradient(usize),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(&'static str),
}
