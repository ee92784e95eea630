//! Structured-fragment extraction from free-form model output.
//!
//! Model replies are prose with a JSON object somewhere inside. [`extract`]
//! finds the last brace-delimited object that directly owns the expected key,
//! parses it strictly, and only if that fails applies two narrow repairs:
//!
//! 1. raw line breaks inside string literals are escaped (`\n`, `\r`);
//! 2. commas directly before `}` or `]` are dropped.
//!
//! Nothing else is rewritten. Extraction never fails loudly: every problem
//! reduces to an invalid [`Extraction`].

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

lazy_static! {
    /// Any quoted key followed by a colon; capture 1 is the raw key text.
    static ref KEY_MARKER: Regex = Regex::new(r#""((?:[^"\\]|\\.)*)"\s*:"#).unwrap();
}

/// Outcome of one extraction attempt. Transient: never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub is_valid: bool,
    pub parsed: Option<Value>,
}

impl Extraction {
    fn invalid() -> Self {
        Self {
            is_valid: false,
            parsed: None,
        }
    }

    fn valid(value: Value) -> Self {
        Self {
            is_valid: true,
            parsed: Some(value),
        }
    }

    /// Deserialize the parsed record into `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Option<T> {
        self.parsed.and_then(|v| serde_json::from_value(v).ok())
    }
}

pub fn extract(raw: &str, expected_key: &str) -> Extraction {
    let mentions_key = KEY_MARKER
        .captures_iter(raw)
        .any(|c| c.get(1).is_some_and(|k| k.as_str() == expected_key));
    if !mentions_key {
        return Extraction::invalid();
    }

    let last = brace_spans(raw)
        .into_iter()
        .filter(|&(start, end)| owns_key(&raw[start..=end], expected_key))
        .max_by_key(|&(_, end)| end);

    let Some((start, end)) = last else {
        return Extraction::invalid();
    };

    match parse_fragment(&raw[start..=end]) {
        Some(value) if value.get(expected_key).is_some() => Extraction::valid(value),
        _ => Extraction::invalid(),
    }
}

/// Shorthand for `extract(raw, key).into_typed()`.
pub fn extract_as<T: DeserializeOwned>(raw: &str, expected_key: &str) -> Option<T> {
    extract(raw, expected_key).into_typed()
}

/// Byte ranges (inclusive) of every balanced `{...}` span.
///
/// String literals are only tracked inside braces; quotes in the surrounding
/// prose do not affect matching.
fn brace_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if open.is_empty() {
            if c == '{' {
                open.push(i);
            }
            continue;
        }
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push(i),
            '}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i));
                }
            }
            _ => {}
        }
    }
    spans
}

/// Whether `fragment` (starting with `{`) has `key` as one of its own
/// top-level keys, as opposed to a key of some nested object.
fn owns_key(fragment: &str, key: &str) -> bool {
    let chars: Vec<char> = fragment.chars().collect();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            '"' => {
                let (literal, next) = read_string(&chars, i + 1);
                i = next;
                if depth == 1 && literal == key {
                    let mut j = next;
                    while j < chars.len() && chars[j].is_whitespace() {
                        j += 1;
                    }
                    if j < chars.len() && chars[j] == ':' {
                        return true;
                    }
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    false
}

/// Reads a string literal body starting after the opening quote. Returns the
/// unescaped-enough content (escapes kept verbatim) and the index after the
/// closing quote.
fn read_string(chars: &[char], mut i: usize) -> (String, usize) {
    let mut out = String::new();
    let mut escaped = false;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if escaped {
            escaped = false;
            out.push(c);
        } else if c == '\\' {
            escaped = true;
            out.push(c);
        } else if c == '"' {
            return (out, i);
        } else {
            out.push(c);
        }
    }
    (out, i)
}

fn parse_fragment(fragment: &str) -> Option<Value> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(fragment) {
        return Some(value);
    }
    let repaired = remove_trailing_commas(&escape_line_breaks_in_strings(fragment));
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Repair 1: escape raw `\n` / `\r` that sit inside string literals.
pub fn escape_line_breaks_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                _ => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }
    out
}

/// Repair 2: drop commas that directly precede a closing `}` or `]`.
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}
