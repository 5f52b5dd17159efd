//! Reading graph deltas from raw request bodies.
//!
//! Hosts decide when a body is a graph delta; this only checks the media
//! type and turns the bytes into a document and then an engine.

use serde_json::Value;

use crate::error::Result;
use crate::graph::{GraphDelta, TypedGraphDelta};
use crate::options::GraphDeltaOptions;
use crate::schema::node::{Model, Schema};

pub const JSON_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct GraphDeltaReader {
    media_types: Vec<String>,
    options: GraphDeltaOptions,
}

impl Default for GraphDeltaReader {
    fn default() -> Self {
        Self {
            media_types: vec![JSON_MEDIA_TYPE.to_string()],
            options: GraphDeltaOptions::default(),
        }
    }
}

impl GraphDeltaReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GraphDeltaOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Accept an additional media type, e.g. `application/merge-patch+json`.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_types.push(media_type.into().to_ascii_lowercase());
        self
    }

    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }

    /// Whether a `Content-Type` value names a supported media type.
    /// Parameters such as `charset` are ignored.
    pub fn can_read(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.media_types.iter().any(|m| *m == essence)
    }

    /// Parse `body` and build a delta for `schema`.
    ///
    /// Returns `Ok(None)` when the body is valid JSON but not an object.
    pub fn read(&self, schema: &'static Schema, body: &[u8]) -> Result<Option<GraphDelta>> {
        let document: Value = serde_json::from_slice(body)?;
        if !document.is_object() {
            return Ok(None);
        }
        GraphDelta::with_options(schema, &document, &self.options).map(Some)
    }

    pub fn read_typed<T: Model>(&self, body: &[u8]) -> Result<Option<TypedGraphDelta<T>>> {
        let document: Value = serde_json::from_slice(body)?;
        if !document.is_object() {
            return Ok(None);
        }
        TypedGraphDelta::with_options(&document, &self.options).map(Some)
    }
}
