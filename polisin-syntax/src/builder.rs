//! Tree-building action sink.
//!
//! The stack machine reports every transition action to a [`TreeBuilder`],
//! which grows the syntax tree under a moving cursor node. Edits are
//! journaled so the stack machine can undo the effects of a symbol it ends
//! up rejecting.

use crate::token::Token;
use crate::tree::{NodeId, SyntaxTree};
use polisin_automata::{Action, ActionSink};

#[derive(Debug, Clone, Copy)]
enum Edit {
    /// A node was created as the last child of its parent.
    Attach,
    /// A childless node was pruned from `parent` at `index`.
    Detach {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
    /// The cursor moved; holds the previous cursor.
    Cursor(NodeId),
}

/// Builds a [`SyntaxTree`] from transition actions.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    tree: SyntaxTree,
    cursor: NodeId,
    token: Option<Token>,
    journal: Vec<Edit>,
}

impl TreeBuilder {
    pub fn new(root_label: impl Into<String>) -> Self {
        let tree = SyntaxTree::new(root_label);
        let cursor = tree.root();
        Self {
            tree,
            cursor,
            token: None,
            journal: Vec::new(),
        }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn into_tree(self) -> SyntaxTree {
        self.tree
    }

    /// Node under which the next leaf or call node is created.
    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    /// Sets the token carried by leaves appended from now on.
    pub fn set_token(&mut self, token: Token) {
        self.token = Some(token);
    }

    /// Forgets the undo history up to this point.
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    /// Empties the tree down to its root.
    pub fn reset(&mut self) {
        self.tree.clear();
        self.cursor = self.tree.root();
        self.token = None;
        self.journal.clear();
    }

    fn append_leaf(&mut self) {
        let Some(token) = &self.token else {
            tracing::warn!("leaf action without a current token");
            return;
        };
        let label = token.category.clone();
        self.tree.add_child(self.cursor, label, Some(token.clone()));
        self.journal.push(Edit::Attach);
    }

    fn descend(&mut self, machine: &str) {
        let child = self.tree.add_child(self.cursor, machine, None);
        self.journal.push(Edit::Attach);
        self.journal.push(Edit::Cursor(self.cursor));
        self.cursor = child;
    }

    fn ascend(&mut self) {
        let Some(parent) = self.tree.parent(self.cursor) else {
            tracing::warn!(node = self.tree.label(self.cursor), "ascend above the tree root");
            return;
        };
        let child = self.cursor;
        if self.tree.node(child).is_leaf() {
            if let Some((parent, index)) = self.tree.prune(child) {
                self.journal.push(Edit::Detach { parent, child, index });
            }
        }
        self.journal.push(Edit::Cursor(child));
        self.cursor = parent;
    }
}

impl ActionSink for TreeBuilder {
    fn perform(&mut self, action: Action, machine: &str) {
        match action {
            Action::AppendLeaf => self.append_leaf(),
            Action::Descend => self.descend(machine),
            Action::Ascend => self.ascend(),
        }
    }

    fn mark(&mut self) -> usize {
        self.journal.len()
    }

    fn rewind(&mut self, mark: usize) {
        while self.journal.len() > mark {
            let Some(edit) = self.journal.pop() else {
                break;
            };
            match edit {
                Edit::Attach => self.tree.remove_last(),
                Edit::Detach { parent, child, index } => self.tree.reattach(parent, child, index),
                Edit::Cursor(previous) => self.cursor = previous,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_nested_tree() {
        let mut builder = TreeBuilder::new("A");
        builder.set_token(Token::new("s", "the"));
        builder.perform(Action::AppendLeaf, "A");
        builder.perform(Action::Descend, "B");
        builder.set_token(Token::new("v", "runs"));
        builder.perform(Action::AppendLeaf, "B");
        builder.perform(Action::Ascend, "A");

        assert_eq!(builder.tree().polish_notation(), "[A [s the][B [v runs]]]");
        assert_eq!(builder.cursor(), builder.tree().root());

        let tree = builder.into_tree();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.polish_notation(), "[A [s the][B [v runs]]]");
    }

    #[test]
    fn test_empty_call_node_is_pruned() {
        let mut builder = TreeBuilder::new("A");
        builder.perform(Action::Descend, "C");
        builder.perform(Action::Ascend, "A");
        assert_eq!(builder.tree().polish_notation(), "[A ]");
        assert_eq!(builder.tree().len(), 1);
    }

    #[test]
    fn test_rewind_restores_tree_and_cursor() {
        let mut builder = TreeBuilder::new("A");
        builder.set_token(Token::new("s", "the"));
        builder.perform(Action::AppendLeaf, "A");
        builder.perform(Action::Descend, "B");
        builder.commit();

        let before = builder.tree().polish_notation();
        let cursor = builder.cursor();
        let mark = builder.mark();

        builder.perform(Action::Ascend, "A");
        builder.perform(Action::Descend, "C");
        builder.set_token(Token::new("v", "runs"));
        builder.perform(Action::AppendLeaf, "C");
        builder.rewind(mark);

        assert_eq!(builder.tree().polish_notation(), before);
        assert_eq!(builder.cursor(), cursor);

        // The restored cursor is still usable.
        builder.perform(Action::AppendLeaf, "B");
        assert_eq!(builder.tree().polish_notation(), "[A [s the][B [v runs]]]");
    }

    #[test]
    fn test_ascend_at_root_is_ignored() {
        let mut builder = TreeBuilder::new("A");
        builder.perform(Action::Ascend, "A");
        assert_eq!(builder.cursor(), builder.tree().root());
    }

    #[test]
    fn test_reset() {
        let mut builder = TreeBuilder::new("A");
        builder.perform(Action::Descend, "B");
        builder.reset();
        assert_eq!(builder.cursor(), builder.tree().root());
        assert_eq!(builder.tree().polish_notation(), "[A ]");
    }
}
