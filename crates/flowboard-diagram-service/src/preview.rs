//! Preview rendering contract
//!
//! The actual rasterization happens in the external canvas; the
//! services only ask for a finished data URI to attach to save calls.

use async_trait::async_trait;
use diagram_engine::Diagram;

use crate::error::Result;

/// Fixed preview canvas width in pixels
pub const PREVIEW_WIDTH: u32 = 400;

/// Fixed preview canvas height in pixels
pub const PREVIEW_HEIGHT: u32 = 220;

/// Renders a diagram to a padded raster preview
///
/// The output is a data URI for a [`PREVIEW_WIDTH`]×[`PREVIEW_HEIGHT`]
/// image with the diagram scaled to fit.
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render_preview(&self, diagram: &Diagram) -> Result<String>;
}

/// Renderer for hosts without a canvas; always yields a blank preview
pub struct NullPreviewRenderer;

/// 1x1 transparent PNG, scaled by whoever displays it
const BLANK_PREVIEW: &str = "data:image/png;base64,\
iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

#[async_trait]
impl PreviewRenderer for NullPreviewRenderer {
    async fn render_preview(&self, _diagram: &Diagram) -> Result<String> {
        Ok(BLANK_PREVIEW.to_string())
    }
}
