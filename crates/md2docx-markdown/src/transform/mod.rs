//! Directive transforms and asset loading, run through the visitor engine.

mod attr;
mod caption;
mod embed;
mod images;
mod table;

use std::rc::Rc;

pub use attr::AttrTransform;
pub use caption::CaptionTransform;
pub use embed::EmbedTransform;
pub use images::{ImageLoader, read_meta};
pub use table::TableTransform;

use crate::loader::Loader;
use crate::visitor::Visitor;

/// The standard transform passes, in the order they see each node.
pub fn default_visitors(loaders: Vec<Rc<dyn Loader>>) -> Vec<Rc<dyn Visitor>> {
    vec![
        Rc::new(AttrTransform),
        Rc::new(CaptionTransform),
        Rc::new(TableTransform),
        Rc::new(ImageLoader::default()),
        Rc::new(EmbedTransform::new(loaders)),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::rc::Rc;

    use md2docx_storage::{MemoryStore, SourceFile};

    use crate::error::TransformError;
    use crate::parse::MarkdownParser;
    use crate::printer::print_tree;
    use crate::visitor::{Visitor, process};

    /// Run `visitors` over `source` loaded as `index.md` and print the result.
    pub(crate) fn transform(
        store: &MemoryStore,
        source: &str,
        visitors: Vec<Rc<dyn Visitor>>,
    ) -> Result<String, TransformError> {
        let file = SourceFile::new("index.md", "/project", source);
        let (tree, root) = process(file, store, &MarkdownParser::new(), visitors)?;
        Ok(print_tree(&tree, root.node))
    }
}
