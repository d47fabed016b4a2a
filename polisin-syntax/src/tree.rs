//! Syntax tree.
//!
//! Nodes live in an arena owned by the tree and refer to each other by
//! [`NodeId`]. Pruning detaches a node from its parent; a detached subtree is
//! unreachable from the root and no longer part of the tree's renderings.

use crate::token::Token;
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A labelled tree node. Leaves built from input words carry their token.
#[derive(Debug, Clone)]
pub struct Node {
    label: String,
    token: Option<Token>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(label: String, token: Option<Token>, parent: Option<NodeId>) -> Self {
        Self {
            label,
            token,
            parent,
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
}

impl SyntaxTree {
    /// Creates a tree holding only a root labelled `root_label`.
    pub fn new(root_label: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::new(root_label.into(), None, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the node with the given id.
    ///
    /// Panics if the id was not issued by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn label(&self, id: NodeId) -> &str {
        self.node(id).label()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    /// The other children of this node's parent, in order.
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(parent) => self
                .children(parent)
                .iter()
                .copied()
                .filter(|&c| c != id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of nodes reachable from the root, root included.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self.root()];
        while let Some(id) = pending.pop() {
            count += 1;
            pending.extend_from_slice(self.children(id));
        }
        count
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Appends a new child under `parent` and returns it.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        label: impl Into<String>,
        token: Option<Token>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(label.into(), token, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Detaches a node from its parent.
    ///
    /// Returns the parent and the position the node held there, or `None`
    /// for the root or an already detached node.
    pub fn prune(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes[id.0].parent.take()?;
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.remove(index);
        Some((parent, index))
    }

    /// Detaches every child of `id`.
    pub fn prune_all_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Drops every node but the root.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0].children.clear();
    }

    /// Re-inserts a pruned node at its former position.
    pub(crate) fn reattach(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let siblings = &mut self.nodes[parent.0].children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Removes the most recently added node, which must be the last child
    /// of its parent.
    pub(crate) fn remove_last(&mut self) {
        if self.nodes.len() <= 1 {
            return;
        }
        if let Some(node) = self.nodes.pop() {
            if let Some(parent) = node.parent {
                let last = NodeId(self.nodes.len());
                let siblings = &mut self.nodes[parent.0].children;
                if siblings.last() == Some(&last) {
                    siblings.pop();
                }
            }
        }
    }

    /// First node labelled `label` in depth-first pre-order.
    pub fn search(&self, label: &str) -> Option<NodeId> {
        self.search_from(self.root(), label)
    }

    pub fn search_from(&self, from: NodeId, label: &str) -> Option<NodeId> {
        if self.label(from) == label {
            return Some(from);
        }
        self.children(from)
            .iter()
            .find_map(|&child| self.search_from(child, label))
    }

    /// Leaves reachable from the root, left to right.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        self.collect_leaves(self.root(), &mut leaves);
        leaves
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = self.node(id);
        if node.is_leaf() {
            out.push(id);
        }
        for &child in node.children() {
            self.collect_leaves(child, out);
        }
    }

    /// Bracketed rendering of the whole tree, e.g. `[A [s the][B [v runs]]]`.
    pub fn polish_notation(&self) -> String {
        self.polish_notation_of(self.root())
    }

    /// Bracketed rendering of the subtree at `id`.
    ///
    /// A leaf carrying a token renders as `[label lexeme]`; any other node
    /// renders as `[label ` followed by its children and `]`.
    pub fn polish_notation_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_polish(id, &mut out);
        out
    }

    fn write_polish(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        out.push('[');
        out.push_str(&node.label);
        out.push(' ');
        match &node.token {
            Some(token) if node.is_leaf() => out.push_str(&token.lexeme),
            _ => {
                for &child in &node.children {
                    self.write_polish(child, out);
                }
            }
        }
        out.push(']');
    }
}

impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.polish_notation())
    }
}

/// Nested serialization view of one subtree.
struct NodeView<'a> {
    tree: &'a SyntaxTree,
    id: NodeId,
}

struct ChildrenView<'a> {
    tree: &'a SyntaxTree,
    children: &'a [NodeId],
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.tree.node(self.id);
        let mut state = serializer.serialize_struct("Node", 3)?;
        state.serialize_field("label", &node.label)?;
        if let Some(token) = &node.token {
            state.serialize_field("token", token)?;
        } else {
            state.skip_field("token")?;
        }
        state.serialize_field(
            "children",
            &ChildrenView {
                tree: self.tree,
                children: &node.children,
            },
        )?;
        state.end()
    }
}

impl Serialize for ChildrenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.children.len()))?;
        for &id in self.children {
            seq.serialize_element(&NodeView { tree: self.tree, id })?;
        }
        seq.end()
    }
}

impl Serialize for SyntaxTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeView {
            tree: self,
            id: self.root(),
        }
        .serialize(serializer)
    }
}
