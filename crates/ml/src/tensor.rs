use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Dense row-major `f32` tensor.
///
/// Every tensor gets a unique `id` at construction. Clones keep the id, which
/// is how the tensor store passed to the ops maps recorded nodes back to their
/// data during the backward pass.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub id: usize,
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
    pub requires_grad: bool,
    pub grad: Option<Vec<f32>>,
}

impl Tensor {
    /// Creates a tensor from raw data. Panics if `shape` does not describe
    /// exactly `data.len()` elements.
    #[must_use]
    pub fn from_vec(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {shape:?} does not match {} elements",
            data.len()
        );
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            data,
            shape,
            requires_grad: false,
            grad: None,
        }
    }

    #[must_use]
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self::from_vec(shape, vec![0.0; len])
    }

    #[must_use]
    pub fn scalar(value: f32) -> Self {
        Self::from_vec(vec![1], vec![value])
    }

    /// Builds a `[rows, cols]` tensor from equally sized rows.
    ///
    /// Returns `None` when the rows are ragged.
    #[must_use]
    pub fn from_rows(rows: &[Vec<f32>], cols: usize) -> Option<Self> {
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let data = rows.iter().flatten().copied().collect();
        Some(Self::from_vec(vec![rows.len(), cols], data))
    }

    #[must_use]
    pub fn with_grad(mut self) -> Self {
        self.requires_grad = true;
        self
    }

    pub fn set_requires_grad(&mut self) {
        self.requires_grad = true;
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// First element; the value of a scalar loss.
    #[must_use]
    pub fn item(&self) -> f32 {
        self.data[0]
    }

    /// Size of the innermost dimension.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.shape.last().copied().unwrap_or(1)
    }

    /// Iterates over slices of the innermost dimension.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks(self.cols().max(1))
    }
}
