//! Image loading.
//!
//! Reads the bytes behind every image node and records the intrinsic size
//! and format. Remote images are fetched once and kept in the file store
//! under `.cache/`, keyed by the percent-encoded url.

use std::io::Cursor as IoCursor;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use image::ImageReader;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, info};
use ureq::Agent;

use crate::cursor::Cursor;
use crate::error::TransformError;
use crate::node::{ImageData, ImageMeta, NodeKind};
use crate::visitor::{Visit, VisitContext, Visitor};

/// Default timeout for image downloads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CACHE_DIR: &str = ".cache";

/// Characters escaped in cache keys: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Loads image bytes and metadata into image nodes.
pub struct ImageLoader {
    agent: Agent,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ImageLoader {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: Agent::config_builder()
                .timeout_global(Some(timeout))
                .http_status_as_error(false)
                .build()
                .into(),
        }
    }

    fn load_remote(
        &self,
        url: &str,
        cx: &VisitContext<'_>,
        cwd: &Path,
    ) -> Result<Vec<u8>, TransformError> {
        let key = cache_key(url);
        match cx.store.load(&key, cwd) {
            Ok(file) => {
                debug!(url, "Image cache hit");
                return Ok(file.value);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        info!(url, "Fetching image");
        let bytes = self.fetch(url)?;
        cx.store.save(&key, &bytes, cwd)?;
        Ok(bytes)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, TransformError> {
        let fetch_error = |message: String| TransformError::Fetch {
            url: url.to_owned(),
            message,
        };

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| fetch_error(e.to_string()))?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(fetch_error(format!("HTTP {status}")));
        }
        response
            .into_body()
            .read_to_vec()
            .map_err(|e| fetch_error(e.to_string()))
    }
}

impl Visitor for ImageLoader {
    fn visit(
        &self,
        cursor: &mut Cursor,
        cx: &mut VisitContext<'_>,
    ) -> Result<Visit, TransformError> {
        let url = match cursor.kind(cx.tree) {
            NodeKind::Image { url, .. } if cx.tree.data(cursor.node).image.is_none() => url.clone(),
            _ => return Ok(Visit::Pass),
        };

        let contents = if url.starts_with("http") {
            self.load_remote(&url, cx, &cursor.file.cwd)?
        } else {
            cx.store.load(&url, &cursor.file.cwd)?.value
        };
        let meta = read_meta(&contents).map_err(|source| TransformError::Image {
            url: url.clone(),
            source,
        })?;
        debug!(url, width = meta.width, height = meta.height, "Loaded image");

        cx.tree[cursor.node].data.image = Some(ImageData {
            contents: Rc::from(contents),
            meta: Some(meta),
        });
        Ok(Visit::Pass)
    }
}

fn cache_key(url: &str) -> String {
    format!("{CACHE_DIR}/{}", utf8_percent_encode(url, URI_COMPONENT))
}

/// Intrinsic pixel size and file extension of encoded image bytes.
pub fn read_meta(bytes: &[u8]) -> Result<ImageMeta, image::ImageError> {
    let reader = ImageReader::new(IoCursor::new(bytes)).with_guessed_format()?;
    let extension = reader
        .format()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png")
        .to_owned();
    let (width, height) = reader.into_dimensions()?;
    Ok(ImageMeta {
        width,
        height,
        extension,
    })
}
