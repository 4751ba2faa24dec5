use crate::recorder::Recorder;

/// Operations understood by the tape. Scalar parameters travel with the op.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EOp {
    Add,
    Sub,
    Mul,
    MulScalar(f32),
    Pow(f32),
    MatMul,
    AddBroadcast,
    Relu,
    Softmax,
    Log,
    Clamp(f32, f32),
    ReduceSum,
    ReduceMean,
    RowSum,
    Reshape,
}

/// One recorded operation: `out = op(a, b)`. Unary ops leave `b` empty.
#[derive(Clone, Debug)]
pub struct Node {
    pub op: EOp,
    pub a: usize,
    pub b: Option<usize>,
    pub out: usize,
}

/// Forward-only recorder used for acting and evaluation.
#[derive(Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Recorder for Graph {
    fn record(&mut self, node: Node) {
        self.nodes.push(node);
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }
}

/// Inference-only recorder: nothing is recorded and the tensor store passed
/// alongside it is left untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoGrad;

impl Recorder for NoGrad {
    fn record(&mut self, _node: Node) {}

    fn nodes(&self) -> &[Node] {
        &[]
    }

    fn is_recording(&self) -> bool {
        false
    }
}
