//! Parser for the legacy line-oriented administration interface.
//!
//! Before the REST endpoints existed, the administration interface
//! answered in a manifest-like plain-text format: blank-line-separated
//! sections of `key: value` attribute lines. The first section describes
//! the report itself; every later section defines one named message part
//! that `children` attributes stitch into a tree by reference.
//!
//! ```text
//! exit-code: WARNING
//! command: deploy
//! message: Application deployed with warnings
//! children: logging; timers
//!
//! part: logging
//! message: Log service unavailable
//! exit-code: WARNING
//!
//! part: timers
//! message: EJB timers migrated
//! ```
//!
//! Attributes outside the reserved set become part properties, which is
//! how the legacy encoder records per-sub-task `exit-code` markers (the
//! `logging` section above). Message values fold line breaks into the
//! `%%%EOL%%%` token so they fit one attribute line; decoding restores
//! them. Property values are taken verbatim.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;

use super::report::{ActionReport, ExitCode, MessagePart};
use super::{read_body, ParseError, ResponseError, ResponseParser};

/// Token the legacy encoder substitutes for line breaks in messages.
const EOL_TOKEN: &str = "%%%EOL%%%";

/// Separator between part names in a `children` attribute.
const CHILD_SEPARATOR: char = ';';

/// Decodes legacy plain-text administration responses.
///
/// Stateless; one instance can parse any number of responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestResponseParser;

impl ResponseParser for ManifestResponseParser {
    fn parse<R: Read>(&self, body: R) -> Result<ActionReport, ResponseError> {
        let text = read_body(body)?;

        let mut sections = split_sections(&text)?;
        if sections.is_empty() {
            return Err(ParseError::EmptyBody.into());
        }
        let report_attributes = sections.remove(0);
        let index = index_parts(sections)?;

        let mut used = HashSet::new();
        let report = build_report(&report_attributes, &index, &mut used)?;

        let unreferenced = index.len() - used.len();
        if unreferenced > 0 {
            log::debug!("Ignoring {unreferenced} part sections nothing references");
        }

        Ok(report)
    }
}

/// Split the body into sections of parsed attribute lines.
///
/// Sections are separated by one or more blank lines; `str::lines` also
/// takes care of CRLF endings.
fn split_sections(text: &str) -> Result<Vec<Vec<(String, String)>>, ParseError> {
    let mut sections = Vec::new();
    let mut current: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(parse_attribute(line)?);
    }
    if !current.is_empty() {
        sections.push(current);
    }

    Ok(sections)
}

/// Split one `key: value` line at its first colon, trimming both halves.
fn parse_attribute(line: &str) -> Result<(String, String), ParseError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::MalformedAttribute(line.to_string()))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::MalformedAttribute(line.to_string()));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Index part sections by name. Every section after the first must open
/// with a `part: <name>` attribute.
fn index_parts(
    sections: Vec<Vec<(String, String)>>,
) -> Result<HashMap<String, Vec<(String, String)>>, ParseError> {
    let mut index = HashMap::new();

    for section in sections {
        let name = match section.first() {
            Some((key, value)) if key == "part" && !value.is_empty() => value.clone(),
            _ => return Err(ParseError::UnnamedPart),
        };
        if index.insert(name.clone(), section).is_some() {
            return Err(ParseError::DuplicatePart(name));
        }
    }

    Ok(index)
}

/// Build the report from the first section's attributes.
///
/// `exit-code` is the one mandatory attribute; `command`, `message`, and
/// `children` are reserved; everything else becomes a top part property.
fn build_report(
    attributes: &[(String, String)],
    index: &HashMap<String, Vec<(String, String)>>,
    used: &mut HashSet<String>,
) -> Result<ActionReport, ParseError> {
    let mut exit_code = None;
    let mut action_description = String::new();
    let mut message = String::new();
    let mut properties = BTreeMap::new();
    let mut children = Vec::new();

    for (key, value) in attributes {
        match key.as_str() {
            "exit-code" => {
                exit_code = Some(
                    ExitCode::from_wire(value)
                        .ok_or_else(|| ParseError::UnknownExitCode(value.clone()))?,
                );
            }
            "command" => action_description = value.clone(),
            "message" => message = decode_eol(value),
            "children" => children = build_children(value, index, used)?,
            _ => {
                properties.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(ActionReport {
        exit_code: exit_code.ok_or(ParseError::MissingExitCode)?,
        action_description,
        top_message_part: MessagePart {
            message,
            properties,
            children,
        },
    })
}

/// Build one named part from its section attributes.
///
/// `part`, `message`, and `children` are reserved; everything else
/// becomes a property, per-sub-task `exit-code` markers included.
fn build_part(
    attributes: &[(String, String)],
    index: &HashMap<String, Vec<(String, String)>>,
    used: &mut HashSet<String>,
) -> Result<MessagePart, ParseError> {
    let mut message = String::new();
    let mut properties = BTreeMap::new();
    let mut children = Vec::new();

    for (key, value) in attributes {
        match key.as_str() {
            "part" => {}
            "message" => message = decode_eol(value),
            "children" => children = build_children(value, index, used)?,
            _ => {
                properties.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(MessagePart {
        message,
        properties,
        children,
    })
}

/// Resolve a `children` attribute into built parts, in reference order.
///
/// Every part may be referenced once. Marking it used before recursing
/// also catches reference cycles.
fn build_children(
    references: &str,
    index: &HashMap<String, Vec<(String, String)>>,
    used: &mut HashSet<String>,
) -> Result<Vec<MessagePart>, ParseError> {
    let mut children = Vec::new();

    for name in split_child_names(references) {
        let attributes = index
            .get(name)
            .ok_or_else(|| ParseError::UnknownChildPart(name.to_string()))?;
        if !used.insert(name.to_string()) {
            return Err(ParseError::RepeatedChildPart(name.to_string()));
        }
        children.push(build_part(attributes, index, used)?);
    }

    Ok(children)
}

fn split_child_names(references: &str) -> impl Iterator<Item = &str> {
    references
        .split(CHILD_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

fn decode_eol(value: &str) -> String {
    value.replace(EOL_TOKEN, "\n")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<ActionReport, ResponseError> {
        ManifestResponseParser.parse(body.as_bytes())
    }

    mod happy_path {
        use super::*;

        #[test]
        fn reserved_attributes_decode_into_the_report() {
            let report = parse(
                "exit-code: SUCCESS\n\
                 command: list-applications\n\
                 message: Nothing to list\n",
            )
            .unwrap();

            assert_eq!(report.exit_code(), ExitCode::Success);
            assert_eq!(report.action_description(), "list-applications");
            assert_eq!(report.top_message_part().message(), "Nothing to list");
            assert!(report.top_message_part().children().is_empty());
        }

        #[test]
        fn unknown_report_attributes_become_top_part_properties() {
            let report = parse(
                "exit-code: SUCCESS\n\
                 target: server\n\
                 uptime: 92\n",
            )
            .unwrap();

            let top = report.top_message_part();
            assert_eq!(top.property("target"), Some("server"));
            assert_eq!(top.property("uptime"), Some("92"));
            assert!(top.property("exit-code").is_none());
        }

        #[test]
        fn child_references_resolve_in_reference_order() {
            let report = parse(
                "exit-code: SUCCESS\n\
                 children: second; first\n\
                 \n\
                 part: first\n\
                 message: I am first\n\
                 \n\
                 part: second\n\
                 message: I am second\n",
            )
            .unwrap();

            let messages: Vec<&str> = report
                .top_message_part()
                .children()
                .iter()
                .map(MessagePart::message)
                .collect();
            assert_eq!(messages, ["I am second", "I am first"]);
        }

        #[test]
        fn nested_children_resolve_recursively() {
            let report = parse(
                "exit-code: SUCCESS\n\
                 command: deploy\n\
                 children: prepare\n\
                 \n\
                 part: prepare\n\
                 message: Preparing\n\
                 children: copy; verify\n\
                 \n\
                 part: copy\n\
                 message: Copying archive\n\
                 \n\
                 part: verify\n\
                 message: Verifying digest\n",
            )
            .unwrap();

            let top = report.top_message_part();
            assert_eq!(top.children().len(), 1);

            let prepare = &top.children()[0];
            assert_eq!(prepare.message(), "Preparing");
            assert_eq!(prepare.children().len(), 2);
            assert_eq!(prepare.children()[0].message(), "Copying archive");
            assert_eq!(prepare.children()[1].message(), "Verifying digest");
        }

        #[test]
        fn eol_tokens_decode_to_newlines_in_messages() {
            let report = parse(
                "exit-code: WARNING\n\
                 message: first line%%%EOL%%%second line\n",
            )
            .unwrap();

            assert_eq!(
                report.top_message_part().message(),
                "first line\nsecond line"
            );
        }

        #[test]
        fn property_values_are_taken_verbatim() {
            let report = parse(
                "exit-code: SUCCESS\n\
                 template: a%%%EOL%%%b\n",
            )
            .unwrap();

            assert_eq!(
                report.top_message_part().property("template"),
                Some("a%%%EOL%%%b")
            );
        }

        #[test]
        fn attribute_halves_are_trimmed_and_values_may_contain_colons() {
            let report = parse(
                "  exit-code :  SUCCESS  \n\
                 message: deployed to http://localhost:4848\n",
            )
            .unwrap();

            assert_eq!(report.exit_code(), ExitCode::Success);
            assert_eq!(
                report.top_message_part().message(),
                "deployed to http://localhost:4848"
            );
        }

        #[test]
        fn crlf_bodies_parse_the_same_as_lf() {
            let lf = "exit-code: SUCCESS\ncommand: deploy\n\npart: a\nmessage: x\n";
            let crlf = lf.replace('\n', "\r\n");

            // The part section is unreferenced in both, deliberately.
            assert_eq!(parse(lf).unwrap(), parse(&crlf).unwrap());
        }

        #[test]
        fn per_part_exit_code_markers_surface_through_effective_exit_code() {
            let report = parse(
                "exit-code: SUCCESS\n\
                 command: deploy\n\
                 message: Deployed\n\
                 children: logging\n\
                 \n\
                 part: logging\n\
                 message: Log service unavailable\n\
                 exit-code: WARNING\n",
            )
            .unwrap();

            // The parser never aggregates; the derived query does.
            assert_eq!(report.exit_code(), ExitCode::Success);
            assert_eq!(report.effective_exit_code(), ExitCode::Warning);
            assert_eq!(
                report.top_message_part().children()[0].property("exit-code"),
                Some("WARNING")
            );
        }

        #[test]
        fn unreferenced_sections_are_ignored() {
            let report = parse(
                "exit-code: SUCCESS\n\
                 \n\
                 part: orphan\n\
                 message: nobody references me\n",
            )
            .unwrap();

            assert!(report.top_message_part().children().is_empty());
        }

        #[test]
        fn empty_children_attribute_means_no_children() {
            let report = parse("exit-code: SUCCESS\nchildren:\n").unwrap();
            assert!(report.top_message_part().children().is_empty());
        }
    }

    mod rejection {
        use super::*;

        #[test]
        fn empty_bodies_are_rejected() {
            for body in ["", "\n", "  \n\n  \n"] {
                let err = parse(body).unwrap_err();
                assert!(matches!(err, ResponseError::Parse(ParseError::EmptyBody)));
            }
        }

        #[test]
        fn missing_exit_code_is_rejected() {
            let err = parse("command: deploy\nmessage: ok\n").unwrap_err();
            assert!(matches!(
                err,
                ResponseError::Parse(ParseError::MissingExitCode)
            ));
        }

        #[test]
        fn unknown_exit_code_literals_are_rejected() {
            let err = parse("exit-code: OK\n").unwrap_err();
            match err {
                ResponseError::Parse(ParseError::UnknownExitCode(literal)) => {
                    assert_eq!(literal, "OK")
                }
                other => panic!("Expected UnknownExitCode, got {other:?}"),
            }
        }

        #[test]
        fn attribute_lines_need_a_separator() {
            let err = parse("exit-code SUCCESS\n").unwrap_err();
            match err {
                ResponseError::Parse(ParseError::MalformedAttribute(line)) => {
                    assert_eq!(line, "exit-code SUCCESS")
                }
                other => panic!("Expected MalformedAttribute, got {other:?}"),
            }
        }

        #[test]
        fn attribute_keys_must_not_be_empty() {
            let err = parse("exit-code: SUCCESS\n: dangling value\n").unwrap_err();
            assert!(matches!(
                err,
                ResponseError::Parse(ParseError::MalformedAttribute(_))
            ));
        }

        #[test]
        fn later_sections_must_open_with_a_part_name() {
            let err = parse(
                "exit-code: SUCCESS\n\
                 \n\
                 message: no part attribute here\n",
            )
            .unwrap_err();
            assert!(matches!(
                err,
                ResponseError::Parse(ParseError::UnnamedPart)
            ));

            let err = parse(
                "exit-code: SUCCESS\n\
                 \n\
                 part:\n\
                 message: name is empty\n",
            )
            .unwrap_err();
            assert!(matches!(
                err,
                ResponseError::Parse(ParseError::UnnamedPart)
            ));
        }

        #[test]
        fn duplicate_part_definitions_are_rejected() {
            let err = parse(
                "exit-code: SUCCESS\n\
                 children: twin\n\
                 \n\
                 part: twin\n\
                 message: one\n\
                 \n\
                 part: twin\n\
                 message: two\n",
            )
            .unwrap_err();

            match err {
                ResponseError::Parse(ParseError::DuplicatePart(name)) => {
                    assert_eq!(name, "twin")
                }
                other => panic!("Expected DuplicatePart, got {other:?}"),
            }
        }

        #[test]
        fn dangling_child_references_are_rejected() {
            let err = parse(
                "exit-code: SUCCESS\n\
                 children: ghost\n",
            )
            .unwrap_err();

            match err {
                ResponseError::Parse(ParseError::UnknownChildPart(name)) => {
                    assert_eq!(name, "ghost")
                }
                other => panic!("Expected UnknownChildPart, got {other:?}"),
            }
        }

        #[test]
        fn repeated_references_are_rejected() {
            let err = parse(
                "exit-code: SUCCESS\n\
                 children: step; step\n\
                 \n\
                 part: step\n\
                 message: once is enough\n",
            )
            .unwrap_err();

            assert!(matches!(
                err,
                ResponseError::Parse(ParseError::RepeatedChildPart(_))
            ));
        }

        #[test]
        fn reference_cycles_are_rejected() {
            let err = parse(
                "exit-code: SUCCESS\n\
                 children: a\n\
                 \n\
                 part: a\n\
                 children: b\n\
                 \n\
                 part: b\n\
                 children: a\n",
            )
            .unwrap_err();

            match err {
                ResponseError::Parse(ParseError::RepeatedChildPart(name)) => {
                    assert_eq!(name, "a")
                }
                other => panic!("Expected RepeatedChildPart, got {other:?}"),
            }
        }
    }
}
