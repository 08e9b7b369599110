//! `::embed{url=..}` resolution.
//!
//! The embed is replaced by the children of the tree its loader produces.
//! Headings of the embedded tree are shifted so its first heading lands one
//! level below the heading the embed sits under (`inHeading` overrides that
//! depth, and an embed before any heading counts as depth 0).

use std::cell::Cell;
use std::rc::Rc;

use tracing::info;

use crate::cursor::Cursor;
use crate::error::TransformError;
use crate::loader::Loader;
use crate::node::{Directive, NodeKind};
use crate::visitor::{Visit, VisitContext, Visitor};

/// Resolves embed directives through the first matching loader.
pub struct EmbedTransform {
    loaders: Vec<Rc<dyn Loader>>,
    /// Depth of the most recent heading, reset by thematic breaks.
    depth: Cell<Option<u8>>,
}

impl EmbedTransform {
    #[must_use]
    pub fn new(loaders: Vec<Rc<dyn Loader>>) -> Self {
        Self {
            loaders,
            depth: Cell::new(None),
        }
    }

    fn embed(
        &self,
        cursor: &mut Cursor,
        cx: &mut VisitContext<'_>,
        directive: &Directive,
    ) -> Result<Visit, TransformError> {
        let url = directive
            .get("url")
            .ok_or(TransformError::MissingAttribute {
                directive: "embed",
                attribute: "url",
            })?;
        let loader = self
            .loaders
            .iter()
            .find(|loader| loader.test(url))
            .ok_or_else(|| TransformError::UnresolvedEmbed {
                url: url.to_owned(),
            })?;

        let target = directive
            .get("inHeading")
            .and_then(|depth| depth.trim().parse::<u8>().ok())
            .or(self.depth.get())
            .unwrap_or(0);

        info!(url, target, "Embedding");
        let file = Rc::new(cx.store.load(url, &cursor.file.cwd)?);
        let fragment = loader.transform(file, cx)?;

        // The embedded tree tracks its own headings.
        let outer = self.depth.replace(None);
        let normalize: Rc<dyn Visitor> = Rc::new(NormalizeHeadings::new(target));
        let result = cx.visit_children_with(&fragment, vec![normalize]);
        self.depth.set(outer);
        result?;

        let children = std::mem::take(&mut cx.tree[fragment.node].children);
        cursor.replace_with(cx.tree, children);
        Ok(Visit::Handled)
    }
}

impl Visitor for EmbedTransform {
    fn visit(
        &self,
        cursor: &mut Cursor,
        cx: &mut VisitContext<'_>,
    ) -> Result<Visit, TransformError> {
        match cursor.kind(cx.tree) {
            NodeKind::Heading { depth } => self.depth.set(Some(*depth)),
            NodeKind::ThematicBreak => self.depth.set(None),
            NodeKind::LeafDirective(directive) if directive.name == "embed" => {
                let directive = directive.clone();
                return self.embed(cursor, cx, &directive);
            }
            _ => {}
        }
        Ok(Visit::Pass)
    }
}

/// Shifts every heading by `target - first + 1`, where `first` is the depth
/// of the first heading seen.
struct NormalizeHeadings {
    target: i16,
    delta: Cell<Option<i16>>,
}

impl NormalizeHeadings {
    fn new(target: u8) -> Self {
        Self {
            target: i16::from(target),
            delta: Cell::new(None),
        }
    }
}

impl Visitor for NormalizeHeadings {
    fn visit(
        &self,
        cursor: &mut Cursor,
        cx: &mut VisitContext<'_>,
    ) -> Result<Visit, TransformError> {
        if let NodeKind::Heading { depth } = &mut cx.tree[cursor.node].kind {
            let current = i16::from(*depth);
            let delta = match self.delta.get() {
                Some(delta) => delta,
                None => {
                    let delta = self.target - current + 1;
                    self.delta.set(Some(delta));
                    delta
                }
            };
            *depth = u8::try_from((current + delta).max(1)).unwrap_or(u8::MAX);
        }
        Ok(Visit::Pass)
    }
}
