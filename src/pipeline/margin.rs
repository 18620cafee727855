//! Header/footer filtering by vertical position.
//!
//! Running headers, footers and page numbers sit in narrow bands at the top
//! and bottom of every page. A text run is dropped when it reaches into either
//! band. Only geometry is consulted: no length or letter-case heuristics.
//!
//! Coordinates are PDF user space: the origin is the bottom-left corner and
//! `y` grows upwards.

use crate::config::MarginConfig;
use crate::pipeline::decode::TextRun;

/// Whether a text run is header/footer noise (or empty) and should be skipped.
///
/// Skips when `text` is blank, when the run starts below `footer_margin`, or
/// when it extends above `page_height - header_margin`.
pub fn should_skip(
    text: &str,
    y_bottom: f32,
    y_top: f32,
    page_height: f32,
    header_margin: f32,
    footer_margin: f32,
) -> bool {
    text.trim().is_empty() || y_bottom < footer_margin || y_top > page_height - header_margin
}

impl MarginConfig {
    /// [`should_skip`] with this configuration's margins.
    pub fn should_skip(&self, run: &TextRun, page_height: f32) -> bool {
        should_skip(
            &run.text,
            run.y0,
            run.y1,
            page_height,
            self.header_margin,
            self.footer_margin,
        )
    }
}
