use crate::error::MlError;
use crate::tensor::Tensor;

/// Adam with bias-corrected step size.
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    t: u32,
    m: Vec<Vec<f32>>,
    v: Vec<Vec<f32>>,
}

impl Adam {
    #[must_use]
    pub fn new(params: &[&Tensor], lr: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
            m: params.iter().map(|p| vec![0.0; p.len()]).collect(),
            v: params.iter().map(|p| vec![0.0; p.len()]).collect(),
        }
    }

    #[must_use]
    pub fn learning_rate(&self) -> f32 {
        self.lr
    }

    /// Number of steps taken so far.
    #[must_use]
    pub fn steps(&self) -> u32 {
        self.t
    }

    /// Applies one update using the `grad` stored on each parameter.
    ///
    /// `params` must be passed in the same order as at construction.
    ///
    /// # Errors
    ///
    /// Fails without touching any parameter if the parameter list does not
    /// match the optimizer state or a parameter has no gradient.
    pub fn step(&mut self, params: &mut [&mut Tensor]) -> Result<(), MlError> {
        if params.len() != self.m.len()
            || params.iter().zip(&self.m).any(|(p, m)| p.len() != m.len())
        {
            return Err(MlError::ShapeMismatch("parameters do not match optimizer state"));
        }
        if let Some(p) = params.iter().find(|p| p.grad.is_none()) {
            return Err(MlError::MissingGradient(p.id));
        }

        self.t += 1;
        let t = i32::try_from(self.t).unwrap_or(i32::MAX);
        let lr_t = self.lr * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t));

        for (i, p) in params.iter_mut().enumerate() {
            let Some(grad) = p.grad.take() else { continue };
            for (j, g) in grad.iter().enumerate() {
                self.m[i][j] = self.beta1 * self.m[i][j] + (1.0 - self.beta1) * g;
                self.v[i][j] = self.beta2 * self.v[i][j] + (1.0 - self.beta2) * g * g;
                p.data[j] -= lr_t * self.m[i][j] / (self.v[i][j].sqrt() + self.eps);
            }
        }
        Ok(())
    }
}
