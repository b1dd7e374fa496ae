//! # steward-core
//!
//! Administration response protocol core for Steward, the application-server
//! administration client.
//!
//! This crate is transport-agnostic and can be used by:
//! - IDE plugin frontends (lifecycle actions against the admin interface)
//! - CLI tooling (scripted administration runs)
//! - CI runners (deploy/undeploy verification)
//!
//! ## Key Concepts
//!
//! - **Action Report**: the decoded outcome of one administrative command
//! - **Message Part**: one node of a report's recursive message tree
//! - **Response Parser**: the contract turning one raw response stream into
//!   one report, with transport failures kept apart from protocol failures

pub mod admin;
pub mod stream;

// Re-export commonly used types
pub use admin::{
    ActionReport, ExitCode, JsonResponseParser, ManifestResponseParser, MessagePart, ParseError,
    ResponseError, ResponseFormat, ResponseParser,
};
