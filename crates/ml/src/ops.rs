//! Forward implementations of the differentiable tensor ops.
//!
//! Every op computes its output eagerly, stores the operands and the result
//! in the caller's tensor store and hands a [`Node`] to the recorder. The
//! matching gradients live in [`crate::tape`].

use crate::graph::{EOp, Node};
use crate::recorder::Recorder;
use crate::tensor::Tensor;
use std::collections::HashMap;

fn track(
    op: EOp,
    a: &Tensor,
    b: Option<&Tensor>,
    out: &Tensor,
    recorder: &mut impl Recorder,
    tensors: &mut HashMap<usize, Tensor>,
) {
    if !recorder.is_recording() {
        return;
    }
    tensors.entry(a.id).or_insert_with(|| a.clone());
    if let Some(b) = b {
        tensors.entry(b.id).or_insert_with(|| b.clone());
    }
    tensors.insert(out.id, out.clone());
    recorder.record(Node {
        op,
        a: a.id,
        b: b.map(|t| t.id),
        out: out.id,
    });
}

impl Tensor {
    fn zip_with(&self, other: &Tensor, name: &str, f: impl Fn(f32, f32) -> f32) -> Tensor {
        assert_eq!(self.shape, other.shape, "{name}: shape mismatch");
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Tensor::from_vec(self.shape.clone(), data)
    }

    fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor::from_vec(self.shape.clone(), self.data.iter().map(|&v| f(v)).collect())
    }

    pub fn add(
        &self,
        other: &Tensor,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let out = self.zip_with(other, "add", |a, b| a + b);
        track(EOp::Add, self, Some(other), &out, recorder, tensors);
        out
    }

    pub fn sub(
        &self,
        other: &Tensor,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let out = self.zip_with(other, "sub", |a, b| a - b);
        track(EOp::Sub, self, Some(other), &out, recorder, tensors);
        out
    }

    pub fn mul(
        &self,
        other: &Tensor,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let out = self.zip_with(other, "mul", |a, b| a * b);
        track(EOp::Mul, self, Some(other), &out, recorder, tensors);
        out
    }

    pub fn mul_scalar(
        &self,
        scalar: f32,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let out = self.map(|v| v * scalar);
        track(EOp::MulScalar(scalar), self, None, &out, recorder, tensors);
        out
    }

    pub fn pow(
        &self,
        exponent: f32,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let out = self.map(|v| v.powf(exponent));
        track(EOp::Pow(exponent), self, None, &out, recorder, tensors);
        out
    }

    /// `self` is a `[out, in]` weight matrix, `x` is `[batch, in]` (or a
    /// single `[in]` row). Produces `x · selfᵀ`.
    pub fn matmul(
        &self,
        x: &Tensor,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        assert_eq!(self.shape.len(), 2, "matmul: weights must be 2-D");
        let out_dim = self.shape[0];
        let in_dim = self.shape[1];
        assert_eq!(x.cols(), in_dim, "matmul: inner dimension mismatch");
        let batch = x.len() / in_dim;

        let mut data = vec![0.0; batch * out_dim];
        for k in 0..batch {
            let row = &x.data[k * in_dim..(k + 1) * in_dim];
            for i in 0..out_dim {
                let w = &self.data[i * in_dim..(i + 1) * in_dim];
                data[k * out_dim + i] = w.iter().zip(row).map(|(a, b)| a * b).sum();
            }
        }
        let shape = if x.shape.len() == 1 {
            vec![out_dim]
        } else {
            vec![batch, out_dim]
        };
        let out = Tensor::from_vec(shape, data);
        track(EOp::MatMul, self, Some(x), &out, recorder, tensors);
        out
    }

    /// Adds the `[dim]` vector `b` to every row of `self`.
    pub fn add_broadcast(
        &self,
        b: &Tensor,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let dim = b.len();
        assert_eq!(self.cols(), dim, "add_broadcast: row width mismatch");
        let data = self
            .data
            .chunks(dim)
            .flat_map(|row| row.iter().zip(&b.data).map(|(x, y)| x + y))
            .collect();
        let out = Tensor::from_vec(self.shape.clone(), data);
        track(EOp::AddBroadcast, self, Some(b), &out, recorder, tensors);
        out
    }

    pub fn relu(&self, recorder: &mut impl Recorder, tensors: &mut HashMap<usize, Tensor>) -> Tensor {
        let out = self.map(|v| v.max(0.0));
        track(EOp::Relu, self, None, &out, recorder, tensors);
        out
    }

    /// Softmax over the innermost dimension, stabilised by the row maximum.
    pub fn softmax(
        &self,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let mut data = Vec::with_capacity(self.len());
        for row in self.rows() {
            let m = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let exp: Vec<f32> = row.iter().map(|&v| (v - m).exp()).collect();
            let sum: f32 = exp.iter().sum();
            data.extend(exp.iter().map(|e| e / sum));
        }
        let out = Tensor::from_vec(self.shape.clone(), data);
        track(EOp::Softmax, self, None, &out, recorder, tensors);
        out
    }

    /// Natural logarithm. Callers clamp the input away from zero first.
    pub fn log(&self, recorder: &mut impl Recorder, tensors: &mut HashMap<usize, Tensor>) -> Tensor {
        let out = self.map(f32::ln);
        track(EOp::Log, self, None, &out, recorder, tensors);
        out
    }

    pub fn clamp(
        &self,
        min: f32,
        max: f32,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let out = self.map(|v| v.clamp(min, max));
        track(EOp::Clamp(min, max), self, None, &out, recorder, tensors);
        out
    }

    pub fn reduce_sum(
        &self,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let out = Tensor::scalar(self.data.iter().sum());
        track(EOp::ReduceSum, self, None, &out, recorder, tensors);
        out
    }

    pub fn reduce_mean(
        &self,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let n = self.len().max(1) as f32;
        let out = Tensor::scalar(self.data.iter().sum::<f32>() / n);
        track(EOp::ReduceMean, self, None, &out, recorder, tensors);
        out
    }

    /// Sums the innermost dimension: `[rows, cols] -> [rows]`.
    pub fn row_sum(
        &self,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let data: Vec<f32> = self.rows().map(|r| r.iter().sum()).collect();
        let out = Tensor::from_vec(vec![data.len()], data);
        track(EOp::RowSum, self, None, &out, recorder, tensors);
        out
    }

    /// Same data under a new shape, e.g. squeezing `[batch, 1]` to `[batch]`.
    pub fn reshape(
        &self,
        shape: Vec<usize>,
        recorder: &mut impl Recorder,
        tensors: &mut HashMap<usize, Tensor>,
    ) -> Tensor {
        let out = Tensor::from_vec(shape, self.data.clone());
        track(EOp::Reshape, self, None, &out, recorder, tensors);
        out
    }
}
