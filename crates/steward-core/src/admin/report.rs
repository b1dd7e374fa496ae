//! The decoded administration report model.
//!
//! An [`ActionReport`] is the typed result of parsing one response body:
//! an exit code, the description of the command that produced it, and a
//! tree of [`MessagePart`] nodes carrying the server's output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Property key the legacy interface uses to record per-sub-task outcomes.
const PART_EXIT_CODE_KEY: &str = "exit-code";

// ============================================================================
// EXIT CODE
// ============================================================================

/// Outcome classification of an administrative action.
///
/// Ordered by severity, so `Success < Warning < Failure` and the most
/// severe of several outcomes is their `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitCode {
    /// The action completed as requested.
    Success,

    /// The action completed, but parts of it reported problems.
    Warning,

    /// The action failed.
    Failure,
}

impl ExitCode {
    /// Map a wire literal onto an exit code.
    ///
    /// The protocol spells exit codes in uppercase; anything else is not
    /// a wire literal and returns `None`.
    pub fn from_wire(literal: &str) -> Option<Self> {
        match literal {
            "SUCCESS" => Some(ExitCode::Success),
            "WARNING" => Some(ExitCode::Warning),
            "FAILURE" => Some(ExitCode::Failure),
            _ => None,
        }
    }

    /// The uppercase protocol spelling.
    pub fn as_wire(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::Warning => "WARNING",
            ExitCode::Failure => "FAILURE",
        }
    }

    /// The more severe of two outcomes.
    pub fn worst(self, other: ExitCode) -> ExitCode {
        self.max(other)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

// ============================================================================
// MESSAGE PART
// ============================================================================

/// One node of the report tree: text, properties, ordered children.
///
/// Parts are immutable once parsed, and every child is owned exclusively
/// by its parent, so the structure is always a tree, never a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) message: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) properties: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) children: Vec<MessagePart>,
}

impl MessagePart {
    /// The text of this node. Empty when the server reported none.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Free-form key/value data attached to this node.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Look up a property on this node only (children are not searched).
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Child parts, in the order the server reported them.
    pub fn children(&self) -> &[MessagePart] {
        &self.children
    }

    /// Walk this part and every descendant, depth-first pre-order.
    pub fn iter(&self) -> Parts<'_> {
        Parts { stack: vec![self] }
    }
}

/// Depth-first pre-order iterator over a part subtree.
pub struct Parts<'a> {
    stack: Vec<&'a MessagePart>,
}

impl<'a> Iterator for Parts<'a> {
    type Item = &'a MessagePart;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        // Reversed push keeps siblings in reported order.
        self.stack.extend(part.children.iter().rev());
        Some(part)
    }
}

// ============================================================================
// ACTION REPORT
// ============================================================================

/// The complete decoded outcome of one administrative action.
///
/// Built only by the response parsers; calling code reads it through the
/// accessors and derived queries below and never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReport {
    pub(crate) exit_code: ExitCode,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) action_description: String,

    pub(crate) top_message_part: MessagePart,
}

impl ActionReport {
    /// The outcome the server reported for the action as a whole.
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    /// Which administrative command produced this report.
    pub fn action_description(&self) -> &str {
        &self.action_description
    }

    /// The root of the message tree.
    pub fn top_message_part(&self) -> &MessagePart {
        &self.top_message_part
    }

    /// The root part's text. Shorthand for `top_message_part().message()`.
    pub fn message(&self) -> &str {
        &self.top_message_part.message
    }

    /// Whether the reported exit code is [`ExitCode::Success`].
    pub fn is_success(&self) -> bool {
        self.exit_code == ExitCode::Success
    }

    /// The most severe outcome recorded anywhere in this report.
    ///
    /// Folds the report's own exit code with every recognized `exit-code`
    /// property in the message tree. The legacy interface records
    /// per-sub-task outcomes as part attributes, which parse into part
    /// properties, so a sub-task failure surfaces here even when the
    /// top-level code says otherwise. Property values that are not wire
    /// literals are ignored as free-form data.
    pub fn effective_exit_code(&self) -> ExitCode {
        self.top_message_part
            .iter()
            .filter_map(|part| part.property(PART_EXIT_CODE_KEY))
            .filter_map(ExitCode::from_wire)
            .fold(self.exit_code, ExitCode::worst)
    }

    /// Every non-empty message in the tree, one per line.
    ///
    /// Parts are visited depth-first in pre-order; parts without text are
    /// skipped rather than contributing blank lines.
    pub fn flattened_message(&self) -> String {
        let lines: Vec<&str> = self
            .top_message_part
            .iter()
            .map(MessagePart::message)
            .filter(|message| !message.is_empty())
            .collect();
        lines.join("\n")
    }

    /// The first value recorded for `key` anywhere in the tree, pre-order.
    pub fn find_property(&self, key: &str) -> Option<&str> {
        self.top_message_part
            .iter()
            .find_map(|part| part.property(key))
    }
}

// ============================================================================
// TESTS
// ============================================================================
