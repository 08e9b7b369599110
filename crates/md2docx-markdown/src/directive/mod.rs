//! Directive syntax.
//!
//! Recognizes the three directive forms layered on top of `CommonMark`:
//!
//! - Inline: `:name[content]{attrs}` inside text
//! - Leaf: `::name[content]{attrs}` on its own line
//! - Container: `:::name{attrs}` ... `:::` spanning block content
//!
//! Attributes use `#id`, `.class`, `key=value`, `key="value"` or `key='value'`.

mod args;
mod syntax;

pub(crate) use args::DirectiveArgs;
pub(crate) use syntax::{
    BlockDirective, InlinePiece, close_inline, open_inline, parse_block_line, parse_braces,
    split_inline,
};
