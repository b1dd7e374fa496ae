//! Administration response decoding.
//!
//! # Overview
//!
//! This module turns the raw response body of an application-server
//! management command into a typed, traversable [`ActionReport`]. The
//! transport layer (HTTP client, local pipe, test fixture) stays outside:
//! it hands over a plain byte stream and a content type, and gets back
//! either a report or a classified error.
//!
//! Decoding is defensive. Server responses are free-form trees assembled
//! by many subsystems, so missing fields and empty containers are normal
//! and default to empty values, while structural violations (wrong JSON
//! types, unknown exit codes, dangling part references) fail the parse
//! outright. A malformed document never produces a partial report.
//!
//! # Modules
//!
//! - [`report`] - The decoded model: [`ActionReport`], [`MessagePart`], [`ExitCode`]
//! - [`json`] - Parser for the REST administration interface (JSON bodies)
//! - [`manifest`] - Parser for the legacy line-oriented interface
//!
//! # Error Handling
//!
//! All parsing returns `Result<ActionReport, ResponseError>`. The two
//! top-level classes matter to callers: [`ResponseError::Transport`] means
//! the stream could not be read (retrying may help), while
//! [`ResponseError::Parse`] means the content itself is malformed
//! (retrying the same request cannot help).
//!
//! # Example
//!
//! ```ignore
//! use steward_core::admin::{ResponseFormat, ResponseParser};
//!
//! let format = ResponseFormat::from_content_type(&content_type_header)
//!     .ok_or("unsupported response content type")?;
//! let report = format.parse(response_body)?;
//!
//! if !report.is_success() {
//!     eprintln!("{} failed:\n{}", report.action_description(), report.flattened_message());
//! }
//! ```

pub mod json;
pub mod manifest;
pub mod report;

use std::io::Read;
use thiserror::Error;

use crate::stream;

// Re-export commonly used items
pub use json::JsonResponseParser;
pub use manifest::ManifestResponseParser;
pub use report::{ActionReport, ExitCode, MessagePart};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Top-level failure classification for response decoding.
///
/// `Transport` covers everything that went wrong while reading the stream;
/// `Parse` covers everything wrong with the fully-read content. Callers
/// that retry requests should retry only on `Transport`.
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("Failed to read response stream: {0}")]
    Transport(#[source] std::io::Error),

    #[error("Malformed administration response: {0}")]
    Parse(#[from] ParseError),
}

/// A structural or semantic violation in a fully-read response body.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Response body is empty")]
    EmptyBody,

    #[error("Response body is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("Expected a JSON object at the top level, found {found}")]
    NotAnObject { found: &'static str },

    #[error("Response carries no exit_code")]
    MissingExitCode,

    #[error("Unknown exit code literal: {0}")]
    UnknownExitCode(String),

    #[error("Field '{field}' should hold text, found {found}")]
    FieldNotText {
        field: &'static str,
        found: &'static str,
    },

    #[error("Field 'properties' should hold an object, found {found}")]
    PropertiesNotAnObject { found: &'static str },

    #[error("Field 'children' should hold an array, found {found}")]
    ChildrenNotArray { found: &'static str },

    #[error("Every child entry should be an object, found {found}")]
    ChildNotAnObject { found: &'static str },

    #[error("Attribute line has no key/value separator: {0:?}")]
    MalformedAttribute(String),

    #[error("Part section does not start with a 'part' attribute")]
    UnnamedPart,

    #[error("Part defined more than once: {0}")]
    DuplicatePart(String),

    #[error("Reference to undefined part: {0}")]
    UnknownChildPart(String),

    #[error("Part referenced more than once: {0}")]
    RepeatedChildPart(String),
}

// ============================================================================
// PARSER CONTRACT
// ============================================================================

/// Decodes one complete response body into an [`ActionReport`].
///
/// Implementations take the stream by value, fully consume it, and drop it
/// on every path, so the underlying connection or file handle is released
/// whether parsing succeeds or fails. Parsing is all-or-nothing: no
/// partial report is ever returned.
pub trait ResponseParser {
    fn parse<R: Read>(&self, body: R) -> Result<ActionReport, ResponseError>;
}

// ============================================================================
// FORMAT SELECTION
// ============================================================================

/// The wire formats the administration interface speaks.
///
/// The transport layer picks the format from the response `Content-Type`
/// header and uses it as the single dispatch point into the concrete
/// parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// REST interface, JSON bodies (`application/json`).
    Json,
    /// Legacy interface, line-oriented plain text (`text/plain`).
    Manifest,
}

impl ResponseFormat {
    /// Map a `Content-Type` header value onto a format.
    ///
    /// Parameters after `;` are ignored and the media type is matched
    /// case-insensitively. Returns `None` for media types the
    /// administration interface never emits.
    pub fn from_content_type(header_value: &str) -> Option<Self> {
        let media_type = header_value.split(';').next().unwrap_or("").trim();
        if media_type.eq_ignore_ascii_case("application/json") {
            Some(ResponseFormat::Json)
        } else if media_type.eq_ignore_ascii_case("text/plain") {
            Some(ResponseFormat::Manifest)
        } else {
            None
        }
    }

    /// The canonical media type, suitable for an `Accept` header.
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Manifest => "text/plain",
        }
    }

    /// Run the matching concrete parser over `body`.
    pub fn parse<R: Read>(&self, body: R) -> Result<ActionReport, ResponseError> {
        match self {
            ResponseFormat::Json => JsonResponseParser.parse(body),
            ResponseFormat::Manifest => ManifestResponseParser.parse(body),
        }
    }
}

// ============================================================================
// BODY DRAINING
// ============================================================================

/// Drain the whole stream into memory and decode it as text.
///
/// Consumes the stream by value, so it is dropped here on every path.
/// Invalid UTF-8 sequences decode lossily to U+FFFD; when the replacement
/// garbles the wire syntax, the concrete parser rejects the text afterwards.
pub(crate) fn read_body<R: Read>(body: R) -> Result<String, ResponseError> {
    let mut buffer = Vec::new();
    let drained = stream::copy_all(body, &mut buffer).map_err(ResponseError::Transport)?;
    log::debug!("Drained {drained} response bytes");
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// ============================================================================
// TESTS
// ============================================================================
