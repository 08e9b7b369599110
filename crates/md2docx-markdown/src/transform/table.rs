//! `:::table{..}` containers.

use std::rc::Rc;

use crate::cursor::Cursor;
use crate::error::TransformError;
use crate::node::NodeKind;
use crate::visitor::{Visit, VisitContext, Visitor};

/// Unwraps a `table` container, copying its attributes onto every table it
/// holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableTransform;

impl Visitor for TableTransform {
    fn visit(
        &self,
        cursor: &mut Cursor,
        cx: &mut VisitContext<'_>,
    ) -> Result<Visit, TransformError> {
        let data = match cursor.kind(cx.tree) {
            NodeKind::ContainerDirective(directive) if directive.name == "table" => {
                directive.to_data("")
            }
            _ => return Ok(Visit::Pass),
        };

        let children = std::mem::take(&mut cx.tree[cursor.node].children);
        for &child in &children {
            if *cx.tree.kind(child) == NodeKind::Table {
                cx.tree[child].data.patch(data.clone());
            }
        }

        let replacements = children
            .iter()
            .map(|&node| Cursor {
                node,
                parent: cursor.parent,
                file: Rc::clone(&cursor.file),
            })
            .collect();
        cursor.replace_with(cx.tree, children);
        cx.visit_nodes(replacements)?;
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
    fn test_container_is_unwrapped() {
        let printed = transform(
            &MemoryStore::new(),
            "before\n\n:::table{orientation=landscape}\n| A:attr{rowspan=2} |\n|---|\n| 1 |\n\nnote\n:::\n\nafter\n",
            vec![Rc::new(AttrTransform), Rc::new(TableTransform)],
        )
        .unwrap();

        assert_eq!(
            printed,
            "root
  paragraph
    text{value=before}
  table data{orientation=landscape}
    tableRow
      tableCell data{rowspan=2}
        text{value=A}
    tableRow
      tableCell
        text{value=1}
  paragraph
    text{value=note}
  paragraph
    text{value=after}
"
        );
    }

    #[test]
    fn test_other_containers_pass() {
        let printed = transform(
            &MemoryStore::new(),
            ":::note\ntext\n:::\n",
            vec![Rc::new(TableTransform)],
        )
        .unwrap();

        assert!(printed.contains("containerDirective{name=note}"));
    }
}
