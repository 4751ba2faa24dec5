//! # Tensors, autodiff and layers for the A2C agent
//!
//! A deliberately small numerical backend: row-major `f32` tensors, eager ops
//! that record onto a [`Recorder`], a reverse-mode [`Tape`], dense layers
//! composed through [`Mlp::build`], and the [`Adam`] optimizer.
//!
//! There is no global session. Each forward pass receives the recorder and the
//! tensor store explicitly; training code creates a fresh [`Tape`] per update
//! and inference runs under [`NoGrad`], which skips recording altogether.
//!
//! ```
//! use ml::{Graph, Tensor};
//! use std::collections::HashMap;
//!
//! let mut tensors = HashMap::new();
//! let x = Tensor::from_vec(vec![1, 2], vec![1.0, 3.0]);
//! let p = x.softmax(&mut Graph::new(), &mut tensors);
//! assert!((p.data().iter().sum::<f32>() - 1.0).abs() < 1e-6);
//! ```

pub mod error;
pub mod graph;
pub mod nn;
mod ops;
pub mod optim;
pub mod recorder;
pub mod tape;
pub mod tensor;

pub use error::MlError;
pub use graph::{Graph, NoGrad};
pub use nn::{Activation, Dense, LayerSpec, Mlp};
pub use optim::Adam;
pub use recorder::Recorder;
pub use tape::{transfer_grads, Tape};
pub use tensor::Tensor;
