use crate::graph::Node;

/// Sink for the operations executed during a forward pass.
///
/// [`crate::tape::Tape`] keeps the nodes for a backward pass,
/// [`crate::graph::Graph`] only keeps them for inspection and
/// [`crate::graph::NoGrad`] drops them.
pub trait Recorder {
    fn record(&mut self, node: Node);
    fn nodes(&self) -> &[Node];

    /// When `false`, ops neither record nodes nor fill the tensor store.
    fn is_recording(&self) -> bool {
        true
    }
}
