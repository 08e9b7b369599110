//! Parent-aware handle into a [`Tree`].

use std::rc::Rc;

use md2docx_storage::SourceFile;

use crate::node::{Data, NodeId, NodeKind};
use crate::tree::Tree;

/// A node together with the file it came from and its parent.
///
/// The parent is a plain id; the tree itself owns all structure. A cursor
/// stays valid after its node is detached, but the visitor engine will no
/// longer descend into it.
#[derive(Debug, Clone)]
pub struct Cursor {
    pub node: NodeId,
    pub parent: Option<NodeId>,
    pub file: Rc<SourceFile>,
}

impl Cursor {
    /// Cursor for a parentless node.
    #[must_use]
    pub fn root(node: NodeId, file: Rc<SourceFile>) -> Self {
        Self {
            node,
            parent: None,
            file,
        }
    }

    /// Kind of the node under the cursor.
    #[must_use]
    pub fn kind<'t>(&self, tree: &'t Tree) -> &'t NodeKind {
        tree.kind(self.node)
    }

    /// Snapshot of child cursors.
    ///
    /// Mutations made while iterating do not affect the returned list.
    #[must_use]
    pub fn children(&self, tree: &Tree) -> Vec<Cursor> {
        tree.children(self.node)
            .iter()
            .map(|&node| Cursor {
                node,
                parent: Some(self.node),
                file: Rc::clone(&self.file),
            })
            .collect()
    }

    /// Whether the node is still listed under its parent.
    ///
    /// Parentless cursors are always attached.
    #[must_use]
    pub fn is_attached(&self, tree: &Tree) -> bool {
        self.parent
            .is_none_or(|parent| tree.is_child_of(self.node, parent))
    }

    /// Merge metadata into the node.
    pub fn patch_data(&self, tree: &mut Tree, data: Data) {
        tree[self.node].data.patch(data);
    }

    /// Detach the node from its parent. No-op without a parent.
    pub fn remove(&self, tree: &mut Tree) {
        if let Some(parent) = self.parent {
            tree[parent].children.retain(|&id| id != self.node);
        }
    }

    /// Splice `nodes` into the parent at this node's position.
    ///
    /// Appends to the parent if the node is no longer listed there. Without
    /// a parent the cursor moves to a fresh root holding `nodes`.
    pub fn replace_with(&mut self, tree: &mut Tree, nodes: Vec<NodeId>) {
        let Some(parent) = self.parent else {
            let root = tree.alloc(NodeKind::Root);
            tree[root].children = nodes;
            self.node = root;
            return;
        };

        let siblings = &mut tree[parent].children;
        match siblings.iter().position(|&id| id == self.node) {
            Some(index) => {
                siblings.splice(index..=index, nodes);
            }
            None => siblings.extend(nodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture() -> (Tree, Cursor) {
        let mut tree = Tree::new();
        let root = tree.alloc(NodeKind::Root);
        for text in ["a", "b", "c"] {
            let paragraph = tree.append_new(root, NodeKind::Paragraph);
            tree.append_new(paragraph, NodeKind::Text(text.to_owned()));
        }
        let file = Rc::new(SourceFile::new("index.md", ".", ""));
        (tree, Cursor::root(root, file))
    }

    fn texts(tree: &Tree, cursor: &Cursor) -> Vec<String> {
        cursor
            .children(tree)
            .iter()
            .map(|c| tree.text_content(c.node))
            .collect()
    }

    #[test]
    fn test_children_is_a_snapshot() {
        let (mut tree, root) = fixture();
        let children = root.children(&tree);

        children[0].remove(&mut tree);

        assert_eq!(children.len(), 3);
        assert!(!children[0].is_attached(&tree));
        assert!(children[1].is_attached(&tree));
        assert_eq!(texts(&tree, &root), vec!["b", "c"]);
    }

    #[test]
    fn test_replace_with_splices_in_place() {
        let (mut tree, root) = fixture();
        let mut middle = root.children(&tree).remove(1);
        let x = tree.alloc(NodeKind::Text("x".to_owned()));
        let y = tree.alloc(NodeKind::Text("y".to_owned()));

        middle.replace_with(&mut tree, vec![x, y]);

        assert_eq!(texts(&tree, &root), vec!["a", "x", "y", "c"]);
        assert!(!middle.is_attached(&tree));
    }

    #[test]
    fn test_replace_with_after_detach_appends() {
        let (mut tree, root) = fixture();
        let mut first = root.children(&tree).remove(0);
        first.remove(&mut tree);
        let x = tree.alloc(NodeKind::Text("x".to_owned()));

        first.replace_with(&mut tree, vec![x]);

        assert_eq!(texts(&tree, &root), vec!["b", "c", "x"]);
    }

    #[test]
    fn test_replace_root_creates_new_root() {
        let (mut tree, mut root) = fixture();
        let old_root = root.node;
        let x = tree.alloc(NodeKind::Text("x".to_owned()));

        root.replace_with(&mut tree, vec![x]);

        assert_ne!(root.node, old_root);
        assert_eq!(root.kind(&tree), &NodeKind::Root);
        assert_eq!(tree.children(root.node), &[x]);
    }

    #[test]
    fn test_patch_data() {
        let (mut tree, root) = fixture();
        let first = root.children(&tree).remove(0);
        let mut data = Data::default();
        data.attrs.insert("orientation".to_owned(), "landscape".to_owned());

        first.patch_data(&mut tree, data);

        assert_eq!(tree.data(first.node).get("orientation"), Some("landscape"));
    }
}
