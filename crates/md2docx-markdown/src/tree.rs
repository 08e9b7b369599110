//! Arena holding every node of a parse.
//!
//! Nodes are never freed. Detaching a node only removes its id from the
//! parent's child list, so stale ids stay valid to read but are no longer
//! reachable from the root.

use std::ops::{Index, IndexMut};

use crate::node::{Data, Node, NodeId, NodeKind};

/// Node arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    /// Allocate a node and append it to `parent`.
    pub fn append_new(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind);
        self.append(parent, id);
        id
    }

    /// Append `child` to `parent`'s children.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self[parent].children.push(child);
    }

    /// Kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self[id].kind
    }

    /// Children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self[id].children
    }

    /// Metadata of a node.
    #[must_use]
    pub fn data(&self, id: NodeId) -> &Data {
        &self[id].data
    }

    /// Whether `child` is currently listed under `parent`.
    #[must_use]
    pub fn is_child_of(&self, child: NodeId, parent: NodeId) -> bool {
        self[parent].children.contains(&child)
    }

    /// Concatenated text of all descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self[id].kind {
            NodeKind::Text(text) | NodeKind::InlineCode(text) => out.push_str(text),
            NodeKind::Code { value, .. } => out.push_str(value),
            _ => {}
        }
        for &child in &self[id].children {
            self.collect_text(child, out);
        }
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
