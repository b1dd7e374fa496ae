//! Parser for the REST administration interface.
//!
//! The REST endpoints answer with one JSON object describing the action
//! outcome. Below the few reserved keys the shape is free-form and
//! recursively nested, so decoding walks a [`serde_json::Value`] tree
//! defensively instead of deserializing into a rigid schema: absent
//! fields default to empty values, wrong types fail the parse with a
//! classified error.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Read;

use super::report::{ActionReport, ExitCode, MessagePart};
use super::{read_body, ParseError, ResponseError, ResponseParser};

/// Decodes JSON administration responses.
///
/// Stateless; one instance can parse any number of responses. Expected
/// wire shape:
///
/// ```text
/// {
///   "exit_code": "SUCCESS",
///   "command": "deploy",
///   "message": "Application deployed with name petstore",
///   "properties": { "name": "petstore" },
///   "children": [ { "message": "...", "children": [ ... ] }, ... ]
/// }
/// ```
///
/// Only `exit_code` is mandatory.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonResponseParser;

impl ResponseParser for JsonResponseParser {
    fn parse<R: Read>(&self, body: R) -> Result<ActionReport, ResponseError> {
        let text = read_body(body)?;
        if text.trim().is_empty() {
            return Err(ParseError::EmptyBody.into());
        }

        let document: Value = serde_json::from_str(&text).map_err(ParseError::Syntax)?;
        let object = document
            .as_object()
            .ok_or_else(|| ParseError::NotAnObject {
                found: json_type_name(&document),
            })?;

        Ok(ActionReport {
            exit_code: parse_exit_code(object)?,
            action_description: text_field(object, "command")?,
            top_message_part: parse_message_part(object)?,
        })
    }
}

/// The one mandatory field. `null` counts as missing.
fn parse_exit_code(object: &Map<String, Value>) -> Result<ExitCode, ParseError> {
    match object.get("exit_code") {
        None | Some(Value::Null) => Err(ParseError::MissingExitCode),
        Some(Value::String(literal)) => ExitCode::from_wire(literal)
            .ok_or_else(|| ParseError::UnknownExitCode(literal.clone())),
        Some(other) => Err(ParseError::FieldNotText {
            field: "exit_code",
            found: json_type_name(other),
        }),
    }
}

/// Optional text field. Absent and `null` both mean empty.
fn text_field(object: &Map<String, Value>, field: &'static str) -> Result<String, ParseError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(ParseError::FieldNotText {
            field,
            found: json_type_name(other),
        }),
    }
}

/// Decode one node of the message tree, recursing through `children`.
///
/// Children are fully built before the parent literal is constructed, so
/// a half-decoded node never escapes.
fn parse_message_part(object: &Map<String, Value>) -> Result<MessagePart, ParseError> {
    Ok(MessagePart {
        message: text_field(object, "message")?,
        properties: parse_properties(object)?,
        children: parse_children(object)?,
    })
}

fn parse_properties(object: &Map<String, Value>) -> Result<BTreeMap<String, String>, ParseError> {
    let entries = match object.get("properties") {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(ParseError::PropertiesNotAnObject {
                found: json_type_name(other),
            })
        }
    };

    let mut properties = BTreeMap::new();
    for (key, value) in entries {
        let text = match value {
            Value::String(text) => text.clone(),
            // Properties are free-form operational data, not the outcome
            // indicator, so a non-string value becomes its compact JSON
            // text instead of failing the whole response.
            other => {
                log::debug!("Coercing non-string property '{key}' to its JSON text");
                other.to_string()
            }
        };
        properties.insert(key.clone(), text);
    }
    Ok(properties)
}

fn parse_children(object: &Map<String, Value>) -> Result<Vec<MessagePart>, ParseError> {
    let elements = match object.get("children") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(elements)) => elements,
        Some(other) => {
            return Err(ParseError::ChildrenNotArray {
                found: json_type_name(other),
            })
        }
    };

    let mut children = Vec::with_capacity(elements.len());
    for element in elements {
        let child = element
            .as_object()
            .ok_or_else(|| ParseError::ChildNotAnObject {
                found: json_type_name(element),
            })?;
        children.push(parse_message_part(child)?);
    }
    Ok(children)
}

/// Human name of a JSON value's type, for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// TESTS
// ============================================================================
