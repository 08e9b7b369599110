//! Document and section assembly.

use md2docx_config::{Config, Contracts};
use tracing::debug;

use crate::body::write_body;
use crate::error::DocxError;
use crate::model::Block;
use crate::{numbering, package, patch, styles};

/// A run of blocks sharing one page geometry.
#[derive(Debug, Clone)]
pub struct Section {
    /// Section config: document config with the section's front matter merged in.
    pub config: Config,
    pub children: Vec<Block>,
}

impl Section {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            children: Vec::new(),
        }
    }

    /// Usable content area of this section's pages.
    #[must_use]
    pub fn contracts(&self) -> Contracts {
        self.config.page.contracts()
    }

    pub fn push(&mut self, block: impl Into<Block>) {
        self.children.push(block.into());
    }
}

/// A document: sections plus the document-wide style and numbering config.
#[derive(Debug, Clone)]
pub struct Document {
    config: Config,
    sections: Vec<Section>,
}

impl Document {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sections: Vec::new(),
        }
    }

    /// Document-level configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Start a new section and return it.
    pub fn add_section(&mut self, config: Config) -> &mut Section {
        self.sections.push(Section::new(config));
        let index = self.sections.len() - 1;
        &mut self.sections[index]
    }

    /// The section content is currently added to, if any.
    pub fn current_section(&mut self) -> Option<&mut Section> {
        self.sections.last_mut()
    }

    /// Serialize to a `.docx` package.
    ///
    /// Styles and numbering are written from the document-level config and
    /// then patched for properties the writers do not emit.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let body = write_body(self);
        let styles = styles::write_styles(&self.config)?;
        let numbering = numbering::write_numbering(&self.config, &body.numbering);
        debug!(
            sections = self.sections.len(),
            media = body.rels.media.len(),
            "Serializing document"
        );

        let package = package::write_package(&package::Parts {
            document: &body.xml,
            document_rels: &body.rels.to_xml(),
            styles: &styles,
            numbering: &numbering,
            media: &body.rels.media,
        })?;
        patch::patch_package(&package, &self.config)
    }
}
