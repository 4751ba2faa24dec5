use crate::recorder::Recorder;
use crate::tensor::Tensor;
use std::collections::HashMap;

/// A fully connected neural network layer.
#[derive(Clone, Debug)]
pub struct Dense {
    /// The weight matrix for the layer, `[out_dim, in_dim]`.
    pub w: Tensor,
    /// The bias vector for the layer.
    pub b: Tensor,
    /// The number of input dimensions.
    pub in_dim: usize,
    /// The number of output dimensions.
    pub out_dim: usize,
}

impl Dense {
    /// Creates a new `Dense` layer with the given weights and biases.
    ///
    /// Both parameters are marked as requiring gradients.
    #[must_use]
    pub fn new(weights: Vec<f32>, bias: Vec<f32>, in_d: usize, out_d: usize) -> Self {
        assert_eq!(weights.len(), in_d * out_d);
        assert_eq!(bias.len(), out_d);
        Self {
            w: Tensor::from_vec(vec![out_d, in_d], weights).with_grad(),
            b: Tensor::from_vec(vec![out_d], bias).with_grad(),
            in_dim: in_d,
            out_dim: out_d,
        }
    }

    /// Glorot-uniform weights drawn from `rng`, zero bias.
    pub fn glorot(in_d: usize, out_d: usize, rng: &mut fastrand::Rng) -> Self {
        let limit = (6.0 / (in_d + out_d) as f32).sqrt();
        let weights = (0..in_d * out_d)
            .map(|_| rng.f32() * 2.0 * limit - limit)
            .collect();
        Self::new(weights, vec![0.0; out_d], in_d, out_d)
    }

    /// Performs the forward pass through the layer.
    pub fn forward(
        &self,
        x: &Tensor,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let wx = self.w.matmul(x, recorder, tensors);
        wx.add_broadcast(&self.b, recorder, tensors)
    }
}

/// Nonlinearity applied after a [`Dense`] layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Identity,
    Relu,
    Softmax,
}

impl Activation {
    pub fn apply(
        self,
        x: &Tensor,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        match self {
            Activation::Identity => x.clone(),
            Activation::Relu => x.relu(recorder, tensors),
            Activation::Softmax => x.softmax(recorder, tensors),
        }
    }
}

/// Width and activation of one layer in an [`Mlp`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: Activation,
}

impl LayerSpec {
    #[must_use]
    pub fn relu(units: usize) -> Self {
        Self { units, activation: Activation::Relu }
    }

    #[must_use]
    pub fn softmax(units: usize) -> Self {
        Self { units, activation: Activation::Softmax }
    }

    #[must_use]
    pub fn linear(units: usize) -> Self {
        Self { units, activation: Activation::Identity }
    }
}

/// A stack of dense layers built from an ordered list of [`LayerSpec`]s.
///
/// An empty spec list yields the identity map.
#[derive(Clone, Debug)]
pub struct Mlp {
    layers: Vec<(Dense, Activation)>,
    input_dim: usize,
}

impl Mlp {
    pub fn build(input_dim: usize, specs: &[LayerSpec], rng: &mut fastrand::Rng) -> Self {
        let mut layers = Vec::with_capacity(specs.len());
        let mut width = input_dim;
        for spec in specs {
            layers.push((Dense::glorot(width, spec.units, rng), spec.activation));
            width = spec.units;
        }
        Self { layers, input_dim }
    }

    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(self.input_dim, |(d, _)| d.out_dim)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn forward(
        &self,
        x: &Tensor,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let mut out = x.clone();
        for (dense, activation) in &self.layers {
            let z = dense.forward(&out, recorder, tensors);
            out = activation.apply(&z, recorder, tensors);
        }
        out
    }

    #[must_use]
    pub fn params(&self) -> Vec<&Tensor> {
        self.layers.iter().flat_map(|(d, _)| [&d.w, &d.b]).collect()
    }

    pub fn params_mut(&mut self) -> Vec<&mut Tensor> {
        self.layers
            .iter_mut()
            .flat_map(|(d, _)| [&mut d.w, &mut d.b])
            .collect()
    }
}
