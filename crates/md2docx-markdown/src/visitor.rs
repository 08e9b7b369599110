//! Depth-first visitor engine.
//!
//! Each node is offered to the document-wide visitors, then to any visitors
//! scoped to the current subtree. A visitor that returns [`Visit::Handled`]
//! takes over recursion for that node; when nobody handles it, the engine
//! descends into the children itself. As soon as a visitor detaches the node,
//! the remaining visitors are skipped and its children are not visited.

use std::rc::Rc;

use md2docx_storage::{FileStore, SourceFile};
use tracing::debug;

use crate::cursor::Cursor;
use crate::error::TransformError;
use crate::parse::Parser;
use crate::tree::Tree;

/// Outcome of offering a node to a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Not interested; let the engine continue.
    Pass,
    /// The visitor handled the node, including any recursion it wanted.
    Handled,
}

/// A tree rewrite pass.
pub trait Visitor {
    fn visit(&self, cursor: &mut Cursor, cx: &mut VisitContext<'_>)
    -> Result<Visit, TransformError>;
}

/// Shared state of one walk.
pub struct VisitContext<'a> {
    pub tree: &'a mut Tree,
    pub store: &'a dyn FileStore,
    parser: &'a dyn Parser,
    visitors: Vec<Rc<dyn Visitor>>,
    scoped: Vec<Rc<dyn Visitor>>,
}

impl<'a> VisitContext<'a> {
    pub fn new(
        tree: &'a mut Tree,
        store: &'a dyn FileStore,
        parser: &'a dyn Parser,
        visitors: Vec<Rc<dyn Visitor>>,
    ) -> Self {
        Self {
            tree,
            store,
            parser,
            visitors,
            scoped: Vec::new(),
        }
    }

    /// Parse a loaded file into the tree, returning a cursor on its root.
    pub fn parse(&mut self, file: Rc<SourceFile>) -> Result<Cursor, TransformError> {
        let root = self.parser.parse(self.tree, file.text()?);
        Ok(Cursor::root(root, file))
    }

    /// Visit every child of `cursor`.
    pub fn visit_children(&mut self, cursor: &Cursor) -> Result<(), TransformError> {
        let children = cursor.children(self.tree);
        self.visit_nodes(children)
    }

    /// Visit the children of `cursor` with extra visitors active for the
    /// whole subtree.
    pub fn visit_children_with(
        &mut self,
        cursor: &Cursor,
        visitors: Vec<Rc<dyn Visitor>>,
    ) -> Result<(), TransformError> {
        let depth = self.scoped.len();
        self.scoped.extend(visitors);
        let result = self.visit_children(cursor);
        self.scoped.truncate(depth);
        result
    }

    /// Visit each cursor in order.
    pub fn visit_nodes(&mut self, cursors: Vec<Cursor>) -> Result<(), TransformError> {
        for cursor in cursors {
            self.visit_node(cursor)?;
        }
        Ok(())
    }

    fn visit_node(&mut self, mut cursor: Cursor) -> Result<(), TransformError> {
        if !cursor.is_attached(self.tree) {
            return Ok(());
        }

        // Innermost scope first, so a nested scope sees the node before the
        // scopes enclosing it.
        let visitors: Vec<Rc<dyn Visitor>> = self
            .visitors
            .iter()
            .chain(self.scoped.iter().rev())
            .map(Rc::clone)
            .collect();

        let mut handled = false;
        for visitor in visitors {
            if visitor.visit(&mut cursor, self)? == Visit::Handled {
                handled = true;
            }
            if !cursor.is_attached(self.tree) {
                return Ok(());
            }
        }

        if !handled {
            self.visit_children(&cursor)?;
        }
        Ok(())
    }
}

/// Parse `file` and run `visitors` over the result.
///
/// Returns the tree and a cursor on the (possibly replaced) root.
pub fn process(
    file: SourceFile,
    store: &dyn FileStore,
    parser: &dyn Parser,
    visitors: Vec<Rc<dyn Visitor>>,
) -> Result<(Tree, Cursor), TransformError> {
    let mut tree = Tree::new();
    debug!(path = %file.location().display(), "Transforming markdown");
    let root = {
        let mut cx = VisitContext::new(&mut tree, store, parser, visitors);
        let root = cx.parse(Rc::new(file))?;
        cx.visit_children(&root)?;
        root
    };
    Ok((tree, root))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use md2docx_storage::MemoryStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::node::NodeKind;
    use crate::parse::MarkdownParser;

    /// Records the kinds it sees and drops every thematic break.
    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<&'static str>>,
    }

    impl Visitor for Recorder {
        fn visit(
            &self,
            cursor: &mut Cursor,
            cx: &mut VisitContext<'_>,
        ) -> Result<Visit, TransformError> {
            let kind = cursor.kind(cx.tree);
            self.seen.borrow_mut().push(kind.name());
            if *kind == NodeKind::ThematicBreak {
                cursor.remove(cx.tree);
            }
            Ok(Visit::Pass)
        }
    }

    /// Handles headings without descending.
    struct SkipHeadings;

    impl Visitor for SkipHeadings {
        fn visit(
            &self,
            cursor: &mut Cursor,
            cx: &mut VisitContext<'_>,
        ) -> Result<Visit, TransformError> {
            Ok(match cursor.kind(cx.tree) {
                NodeKind::Heading { .. } => Visit::Handled,
                _ => Visit::Pass,
            })
        }
    }

    fn run(source: &str, visitors: Vec<Rc<dyn Visitor>>) -> (Tree, Cursor) {
        let file = SourceFile::new("index.md", ".", source);
        let parser = MarkdownParser::new();
        process(file, &MemoryStore::new(), &parser, visitors).unwrap()
    }

    #[test]
    fn test_pre_order_walk() {
        let recorder = Rc::new(Recorder::default());
        run("# A\n\nB *c*\n", vec![Rc::clone(&recorder) as Rc<dyn Visitor>]);

        assert_eq!(
            *recorder.seen.borrow(),
            vec!["heading", "text", "paragraph", "text", "emphasis", "text"]
        );
    }

    #[test]
    fn test_handled_node_is_not_descended() {
        let recorder = Rc::new(Recorder::default());
        run(
            "# A\n\nB\n",
            vec![
                Rc::new(SkipHeadings) as Rc<dyn Visitor>,
                Rc::clone(&recorder) as Rc<dyn Visitor>,
            ],
        );

        assert_eq!(*recorder.seen.borrow(), vec!["heading", "paragraph", "text"]);
    }

    #[test]
    fn test_removed_node_stops_the_walk() {
        let first = Rc::new(Recorder::default());
        let second = Rc::new(Recorder::default());
        let (tree, root) = run(
            "A\n\n---\n\nB\n",
            vec![
                Rc::clone(&first) as Rc<dyn Visitor>,
                Rc::clone(&second) as Rc<dyn Visitor>,
            ],
        );

        assert_eq!(
            *first.seen.borrow(),
            vec!["paragraph", "text", "thematicBreak", "paragraph", "text"]
        );
        assert_eq!(
            *second.seen.borrow(),
            vec!["paragraph", "text", "paragraph", "text"]
        );
        assert!(
            !tree
                .children(root.node)
                .iter()
                .any(|&id| *tree.kind(id) == NodeKind::ThematicBreak)
        );
    }
}
