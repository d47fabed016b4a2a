//! Transition actions.
//!
//! Actions are a closed set of tags stored on the automaton graph. They carry
//! no state of their own: the runner hands each one to an [`ActionSink`]
//! owned by the parse session, which keeps the graph immutable and shareable.

/// Side effect attached to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Append a leaf for the current token under the current tree node.
    AppendLeaf,
    /// Open a child node named after the called machine and move into it.
    Descend,
    /// Move back to the parent node, pruning the child if it stayed empty.
    Ascend,
}

/// Receiver of transition actions.
///
/// `machine` is the name of the automaton that is active when the action
/// runs: the callee for [`Action::Descend`], the caller for [`Action::Ascend`].
pub trait ActionSink {
    fn perform(&mut self, action: Action, machine: &str);

    /// Records a rollback point. Sinks without undo support return 0.
    fn mark(&mut self) -> usize {
        0
    }

    /// Undoes every effect performed since `mark`.
    fn rewind(&mut self, _mark: usize) {}
}

/// Discards all actions.
impl ActionSink for () {
    fn perform(&mut self, _action: Action, _machine: &str) {}
}
