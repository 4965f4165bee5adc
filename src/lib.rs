//! visionboard - a future-self vision board from your own files.
//!
//! Samples a folder of notes and images, sends bounded snippets to a
//! Gemini model, and renders the themes it finds.
//!
//! # Pipeline
//!
//! - `scan`: folder walk and snippet extraction
//! - `payload`: bounded JSON encoding of file records
//! - `prompt`: the theme-mining prompt around a payload
//! - `model`: Gemini API / CLI transports and scene image generation
//! - `response`: tolerant recovery of JSON from model output
//! - `analysis`: the parsed result and its typed views
//! - `render`: ASCII board, HTML report, collage PNG
//! - `config`: YAML configuration
//!
//! The payload bound is the core invariant: `encode` shrinks per-file
//! snippets until the serialized array fits `max_chars`, or stops at the
//! configured floor.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod model;
pub mod payload;
pub mod prompt;
pub mod render;
pub mod response;
pub mod scan;

pub use analysis::{AnalysisResult, FutureIdentity, Theme, VisionScene};
pub use config::{Config, ConfigError, Transport};
pub use model::{ModelClient, TransportError};
pub use payload::{encode, fallback_records, EncodedPayload, FileRecord, ShrinkLimits};
pub use response::{parse_response, ParseError};
