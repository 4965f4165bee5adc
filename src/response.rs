//! Tolerant recovery of the analysis JSON from free-form model output.
//!
//! Models often wrap the requested JSON in prose or markdown fences. The
//! parser tries a strict parse first, then falls back to the span between
//! the first `{` and the last `}`. The span is greedy, not brace-balanced:
//! stray braces in the surrounding prose can make it grab the wrong text.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::analysis::AnalysisResult;
use crate::payload::truncate_chars;

/// Chars of the raw response kept for diagnostics.
pub const EXCERPT_CHARS: usize = 1000;

/// Reasons a model response could not be turned into an analysis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The model call produced nothing; usually a transport or auth problem.
    #[error("model returned an empty response; check that the model transport is installed and authenticated")]
    EmptyResponse,
    /// The response had text but no parseable JSON object.
    #[error("model output was not valid JSON and no JSON block was found\n---\n{excerpt}")]
    NoJsonFound { excerpt: String },
}

impl ParseError {
    /// The raw-text excerpt carried for diagnosis, if any.
    pub fn excerpt(&self) -> Option<&str> {
        match self {
            ParseError::EmptyResponse => None,
            ParseError::NoJsonFound { excerpt } => Some(excerpt),
        }
    }
}

/// Parse a raw model reply into an [`AnalysisResult`].
pub fn parse_response(raw: &str) -> Result<AnalysisResult, ParseError> {
    parse_value(raw).map(AnalysisResult::new)
}

/// Parse a raw model reply into a JSON value, without interpreting it.
pub fn parse_value(raw: &str) -> Result<Value, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    if let Ok(value) = from_str_unbounded(trimmed) {
        return Ok(value);
    }

    let span = match brace_span(raw) {
        Some(span) => span,
        None => return Err(no_json(raw)),
    };

    match from_str_unbounded(span) {
        Ok(value) => {
            debug!(span_len = span.len(), raw_len = raw.len(), "recovered JSON span");
            Ok(value)
        }
        Err(e) => {
            debug!(error = %e, "JSON span did not parse");
            Err(no_json(raw))
        }
    }
}

/// Text from the first `{` through the last `}`, if the last closes after
/// the first opens.
pub fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Strict JSON parse with no nesting limit. Deep input grows the stack on
/// the heap instead of overflowing it.
fn from_str_unbounded(text: &str) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

fn no_json(raw: &str) -> ParseError {
    ParseError::NoJsonFound {
        excerpt: truncate_chars(raw, EXCERPT_CHARS).to_string(),
    }
}
