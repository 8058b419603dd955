//! JSON extraction from free-form model replies.
//!
//! Every stage funnels LLM output through [`extract_json`]: strip one
//! layer of code fences, locate the first balanced `{…}` or `[…]`
//! substring, parse, and on failure run a single remediation pass
//! before giving up with a [`ParseError`] carrying the reason and offset.
//!
//! The procedure is idempotent on well-formed input: a reply that is
//! already valid JSON extracts to the same value `serde_json` would parse
//! directly.
//!
//! # Examples
//!
//! ```
//! use deckweaver::llm::extraction::{extract_json, ExpectedShape};
//! use serde_json::json;
//!
//! let reply = "Sure! Here you go:\n```json\n{\"key\": 1}\n```";
//! let value = extract_json(reply, ExpectedShape::Object).unwrap();
//! assert_eq!(value, json!({"key": 1}));
//! ```

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

/// Whether the caller expects a JSON object or a JSON array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpectedShape {
    Object,
    Array,
}

impl ExpectedShape {
    fn opener(self) -> char {
        match self {
            ExpectedShape::Object => '{',
            ExpectedShape::Array => '[',
        }
    }

    fn closer(self) -> char {
        match self {
            ExpectedShape::Object => '}',
            ExpectedShape::Array => ']',
        }
    }
}

/// Failure to pull the expected JSON shape out of a reply.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("empty reply")]
    #[diagnostic(code(deckweaver::extraction::empty))]
    Empty,

    #[error("no {expected} found in reply")]
    #[diagnostic(code(deckweaver::extraction::no_json))]
    NoJson { expected: &'static str },

    #[error("unbalanced JSON starting at offset {offset}")]
    #[diagnostic(code(deckweaver::extraction::unbalanced))]
    Unbalanced { offset: usize },

    #[error("invalid JSON at offset {offset}: {reason}")]
    #[diagnostic(code(deckweaver::extraction::invalid))]
    Invalid { reason: String, offset: usize },
}

/// Extract the first balanced JSON value of the expected shape.
pub fn extract_json(reply: &str, shape: ExpectedShape) -> Result<Value, ParseError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let unfenced = strip_fences(trimmed);

    // An array caller may receive a dangling object; remediation wraps it.
    let (candidate, offset) = match balanced_slice(unfenced, shape) {
        Ok(found) => found,
        Err(err) => {
            if shape == ExpectedShape::Array
                && let Ok((object, offset)) = balanced_slice(unfenced, ExpectedShape::Object)
            {
                let wrapped = format!("[{object}]");
                return parse_with_remediation(&wrapped, offset);
            }
            return Err(err);
        }
    };
    parse_with_remediation(candidate, offset)
}

fn parse_with_remediation(candidate: &str, offset: usize) -> Result<Value, ParseError> {
    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let repaired = escape_stray_quotes(candidate);
            serde_json::from_str(&repaired).map_err(|_| ParseError::Invalid {
                reason: first_err.to_string(),
                offset,
            })
        }
    }
}

/// Strip one layer of ``` or ```json fencing, if present.
fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") up to the first newline.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .map_or(body, str::trim)
        .trim()
}

/// Locate the first balanced `{…}`/`[…]` substring, honoring string and
/// escape state. Returns the slice and its byte offset in `text`.
fn balanced_slice(text: &str, shape: ExpectedShape) -> Result<(&str, usize), ParseError> {
    let opener = shape.opener();
    let closer = shape.closer();
    let start = text.find(opener).ok_or(ParseError::NoJson {
        expected: match shape {
            ExpectedShape::Object => "object",
            ExpectedShape::Array => "array",
        },
    })?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == opener && !in_string => depth += 1,
            c if c == closer && !in_string => {
                depth -= 1;
                if depth == 0 {
                    let end = start + idx + ch.len_utf8();
                    return Ok((&text[start..end], start));
                }
            }
            _ => {}
        }
    }
    Err(ParseError::Unbalanced { offset: start })
}

/// Remediation pass: escape double quotes that appear *inside* an open
/// string without terminating it, i.e. a quote not followed by a
/// structural character (`,` `:` `}` `]` or end of line).
fn escape_stray_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for (i, &ch) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                if !in_string {
                    in_string = true;
                    out.push(ch);
                } else if closes_string(&chars, i) {
                    in_string = false;
                    out.push(ch);
                } else {
                    out.push_str("\\\"");
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// A closing quote is followed (after horizontal whitespace) by a
/// structural character or the end of the line.
fn closes_string(chars: &[char], quote_idx: usize) -> bool {
    for &next in &chars[quote_idx + 1..] {
        match next {
            ' ' | '\t' => continue,
            ',' | ':' | '}' | ']' | '\n' | '\r' => return true,
            _ => return false,
        }
    }
    true
}
