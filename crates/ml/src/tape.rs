use crate::error::MlError;
use crate::graph::{EOp, Node};
use crate::recorder::Recorder;
use crate::tensor::Tensor;
use std::collections::HashMap;

/// A tape that records operations for automatic differentiation.
#[derive(Default)]
pub struct Tape {
    nodes: Vec<Node>,
}

impl Recorder for Tape {
    fn record(&mut self, node: Node) {
        self.nodes.push(node);
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

fn fetch(tensors: &HashMap<usize, Tensor>, id: usize) -> Result<&Tensor, MlError> {
    tensors.get(&id).ok_or(MlError::MissingTensor(id))
}

fn accumulate(grads: &mut HashMap<usize, Vec<f32>>, id: usize, contribution: Vec<f32>) {
    match grads.get_mut(&id) {
        Some(existing) => {
            for (g, c) in existing.iter_mut().zip(contribution) {
                *g += c;
            }
        }
        None => {
            grads.insert(id, contribution);
        }
    }
}

/// Gradient contributions of one node to its operands, `(a, b)`.
fn local_grads(
    node: &Node,
    tensors: &HashMap<usize, Tensor>,
    out_grad: &[f32],
) -> Result<(Vec<f32>, Option<Vec<f32>>), MlError> {
    let a = fetch(tensors, node.a)?;
    let b = node.b.map(|id| fetch(tensors, id)).transpose()?;
    let operand_b = || b.ok_or(MlError::ShapeMismatch("binary op recorded without operand"));

    let grads = match node.op {
        EOp::Add => (out_grad.to_vec(), Some(out_grad.to_vec())),
        EOp::Sub => (
            out_grad.to_vec(),
            Some(out_grad.iter().map(|g| -g).collect()),
        ),
        EOp::Mul => {
            let b = operand_b()?;
            let ga = b.data.iter().zip(out_grad).map(|(d, g)| d * g).collect();
            let gb = a.data.iter().zip(out_grad).map(|(d, g)| d * g).collect();
            (ga, Some(gb))
        }
        EOp::MulScalar(s) => (out_grad.iter().map(|g| s * g).collect(), None),
        EOp::Pow(e) => (
            a.data
                .iter()
                .zip(out_grad)
                .map(|(d, g)| e * d.powf(e - 1.0) * g)
                .collect(),
            None,
        ),
        EOp::MatMul => {
            let x = operand_b()?;
            let out_dim = a.shape[0];
            let in_dim = a.shape[1];
            let batch = x.len() / in_dim;
            let mut w_grad = vec![0.0; a.len()];
            let mut x_grad = vec![0.0; x.len()];
            for k in 0..batch {
                for i in 0..out_dim {
                    let g = out_grad[k * out_dim + i];
                    if g == 0.0 {
                        continue;
                    }
                    for j in 0..in_dim {
                        w_grad[i * in_dim + j] += g * x.data[k * in_dim + j];
                        x_grad[k * in_dim + j] += g * a.data[i * in_dim + j];
                    }
                }
            }
            (w_grad, Some(x_grad))
        }
        EOp::AddBroadcast => {
            let b = operand_b()?;
            let dim = b.len();
            let mut b_grad = vec![0.0; dim];
            for row in out_grad.chunks(dim) {
                for (bg, g) in b_grad.iter_mut().zip(row) {
                    *bg += g;
                }
            }
            (out_grad.to_vec(), Some(b_grad))
        }
        EOp::Relu => (
            a.data
                .iter()
                .zip(out_grad)
                .map(|(&d, &g)| if d > 0.0 { g } else { 0.0 })
                .collect(),
            None,
        ),
        EOp::Softmax => {
            let out = fetch(tensors, node.out)?;
            let cols = out.cols().max(1);
            let mut ga = Vec::with_capacity(out.len());
            for (s, g) in out.data.chunks(cols).zip(out_grad.chunks(cols)) {
                let dot: f32 = s.iter().zip(g).map(|(s, g)| s * g).sum();
                ga.extend(s.iter().zip(g).map(|(s, g)| s * (g - dot)));
            }
            (ga, None)
        }
        EOp::Log => (
            a.data.iter().zip(out_grad).map(|(d, g)| g / d).collect(),
            None,
        ),
        EOp::Clamp(min, max) => (
            a.data
                .iter()
                .zip(out_grad)
                .map(|(d, &g)| if (min..=max).contains(d) { g } else { 0.0 })
                .collect(),
            None,
        ),
        EOp::ReduceSum => (vec![out_grad[0]; a.len()], None),
        EOp::ReduceMean => {
            let n = a.len().max(1) as f32;
            (vec![out_grad[0] / n; a.len()], None)
        }
        EOp::RowSum => {
            let cols = a.cols().max(1);
            let ga = out_grad
                .iter()
                .flat_map(|&g| std::iter::repeat(g).take(cols))
                .collect();
            (ga, None)
        }
        EOp::Reshape => (out_grad.to_vec(), None),
    };
    Ok(grads)
}

impl Tape {
    /// Creates a new, empty tape.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Computes the gradients of the tensors on the tape with respect to a loss tensor.
    ///
    /// The gradients are computed by traversing the recorded operations in reverse order.
    /// Only tensors flagged with `requires_grad` receive their gradient in the store.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::MissingTensor`] if a recorded operand is absent from `tensors`.
    pub fn backward(&self, loss: &Tensor, tensors: &mut HashMap<usize, Tensor>) -> Result<(), MlError> {
        let mut grads: HashMap<usize, Vec<f32>> = HashMap::new();
        grads.insert(loss.id, vec![1.0; loss.len()]);

        for node in self.nodes.iter().rev() {
            // Nodes that do not feed the loss have no incoming gradient.
            let Some(out_grad) = grads.get(&node.out).cloned() else {
                continue;
            };
            let (ga, gb) = local_grads(node, tensors, &out_grad)?;
            accumulate(&mut grads, node.a, ga);
            if let (Some(b), Some(gb)) = (node.b, gb) {
                accumulate(&mut grads, b, gb);
            }
        }

        for (id, grad) in grads {
            if let Some(tensor) = tensors.get_mut(&id) {
                if tensor.requires_grad {
                    tensor.grad = Some(grad);
                }
            }
        }

        Ok(())
    }
}

/// Copies the gradients computed into the tensor store back onto the
/// parameters they belong to.
pub fn transfer_grads(params: &mut [&mut Tensor], tensors: &HashMap<usize, Tensor>) {
    for p in params.iter_mut() {
        p.grad = tensors.get(&p.id).and_then(|t| t.grad.clone());
    }
}
