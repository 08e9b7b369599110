//! `caption` directives.
//!
//! The inline form tags the enclosing node, the leaf form becomes a
//! paragraph of its own. Either way the attributes land in the node's
//! metadata with a `caption-` prefix (`caption-type`), while `#id` becomes the
//! node id.

use crate::cursor::Cursor;
use crate::error::TransformError;
use crate::node::{Data, NodeKind};
use crate::visitor::{Visit, VisitContext, Visitor};

const PREFIX: &str = "caption-";

#[derive(Debug, Clone, Copy, Default)]
pub struct CaptionTransform;

enum Form {
    Inline(Data),
    Leaf(Data),
}

impl Visitor for CaptionTransform {
    fn visit(
        &self,
        cursor: &mut Cursor,
        cx: &mut VisitContext<'_>,
    ) -> Result<Visit, TransformError> {
        let form = match cursor.kind(cx.tree) {
            NodeKind::TextDirective(directive) if directive.name == "caption" => {
                Form::Inline(directive.to_data(PREFIX))
            }
            NodeKind::LeafDirective(directive) if directive.name == "caption" => {
                Form::Leaf(directive.to_data(PREFIX))
            }
            _ => return Ok(Visit::Pass),
        };

        match form {
            Form::Inline(data) => {
                if let Some(parent) = cursor.parent {
                    cx.tree[parent].data.patch(data);
                }
                cursor.remove(cx.tree);
            }
            Form::Leaf(data) => {
                let paragraph = cx.tree.alloc(NodeKind::Paragraph);
                cx.tree[paragraph].data = data;
                cx.tree[paragraph].children = std::mem::take(&mut cx.tree[cursor.node].children);
                cursor.replace_with(cx.tree, vec![paragraph]);

                let replacement = Cursor {
                    node: paragraph,
                    ..cursor.clone()
                };
                cx.visit_children(&replacement)?;
            }
        }
        Ok(Visit::Handled)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use md2docx_storage::MemoryStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::transform::AttrTransform;
    use crate::transform::test_support::transform;

    #[test]
    fn test_leaf_caption_becomes_paragraph() {
        let printed = transform(
            &MemoryStore::new(),
            "::caption[Results *now*]{#fig-1 type=Figure}\n",
            vec![Rc::new(CaptionTransform)],
        )
        .unwrap();

        assert_eq!(
            printed,
            "root
  paragraph data{caption-type=Figure,id=fig-1}
    text{value=Results }
    emphasis
      text{value=now}
"
        );
    }

    #[test]
    fn test_inline_caption_tags_parent() {
        let printed = transform(
            &MemoryStore::new(),
            "Sales by region:caption{#tab-1 type=Table}\n",
            vec![Rc::new(CaptionTransform)],
        )
        .unwrap();

        assert_eq!(
            printed,
            "root
  paragraph data{caption-type=Table,id=tab-1}
    text{value=Sales by region}
"
        );
    }

    #[test]
    fn test_leaf_caption_content_is_visited() {
        let printed = transform(
            &MemoryStore::new(),
            "::caption[Flow:attr{.wide}]{type=Figure}\n",
            vec![Rc::new(AttrTransform), Rc::new(CaptionTransform)],
        )
        .unwrap();

        assert_eq!(
            printed,
            "root
  paragraph data{caption-type=Figure,class=wide}
    text{value=Flow}
"
        );
    }
}
