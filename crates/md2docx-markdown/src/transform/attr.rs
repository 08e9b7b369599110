//! `:attr{..}` moves its attributes onto the enclosing node.

use crate::cursor::Cursor;
use crate::error::TransformError;
use crate::node::NodeKind;
use crate::visitor::{Visit, VisitContext, Visitor};

/// Merges `:attr{#id .class key=value}` into the parent's metadata and drops
/// the directive.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttrTransform;

impl Visitor for AttrTransform {
    fn visit(
        &self,
        cursor: &mut Cursor,
        cx: &mut VisitContext<'_>,
    ) -> Result<Visit, TransformError> {
        let data = match cursor.kind(cx.tree) {
            NodeKind::TextDirective(directive) if directive.name == "attr" => directive.to_data(""),
            _ => return Ok(Visit::Pass),
        };

        if let Some(parent) = cursor.parent {
            cx.tree[parent].data.patch(data);
        }
        cursor.remove(cx.tree);
        Ok(Visit::Handled)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use md2docx_storage::MemoryStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::transform::test_support::transform;

    #[test]
    fn test_attr_patches_parent() {
        let printed = transform(
            &MemoryStore::new(),
            "# 一级标题:attr{#h1 .intro level=2}\n",
            vec![Rc::new(AttrTransform)],
        )
        .unwrap();

        assert_eq!(
            printed,
            "root
  heading{depth=1} data{class=intro,id=h1,level=2}
    text{value=一级标题}
"
        );
    }

    #[test]
    fn test_attr_in_table_cell() {
        let printed = transform(
            &MemoryStore::new(),
            "| A:attr{colspan=2} |\n|---|\n",
            vec![Rc::new(AttrTransform)],
        )
        .unwrap();

        assert_eq!(
            printed,
            "root
  table
    tableRow
      tableCell data{colspan=2}
        text{value=A}
"
        );
    }

    #[test]
    fn test_other_directives_untouched() {
        let printed = transform(
            &MemoryStore::new(),
            "H:sub[2]O\n",
            vec![Rc::new(AttrTransform)],
        )
        .unwrap();

        assert!(printed.contains("textDirective{name=sub}"));
    }
}
