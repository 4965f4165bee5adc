//! Output renderers for an [`AnalysisResult`](crate::analysis::AnalysisResult).
//!
//! - `ascii`: 72-column terminal board
//! - `html`: self-contained report page
//! - `collage`: 1200x1400 PNG from scene images, or a text board

pub mod ascii;
pub mod collage;
pub mod html;

pub use ascii::{render_ascii_board, write_ascii_board};
pub use collage::{compose_board, compose_scene_board, compose_swatch_board, theme_color, write_collage};
pub use html::{escape_html, render_html, shorten, write_html};
