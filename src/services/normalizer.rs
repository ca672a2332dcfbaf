//! Turns free-form model output into the fixed six-field [`Analysis`].
//!
//! The model is asked for bare JSON but regularly wraps it in prose or
//! markdown fences, uses snake_case keys, or answers in plain text. None of
//! that is an error here: [`normalize`] always returns a complete analysis.

use crate::models::Analysis;
use serde_json::{Map, Value};

pub const UNKNOWN_DOCUMENT: &str = "Unknown Document";

/// Confidence assigned when the answer had to be read heuristically
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

const EXCERPT_CHARS: usize = 200;
const EMPTY_RESPONSE_NOTE: &str = "The AI service returned an empty analysis.";
const POSITIVE_KEYWORDS: &[&str] = &["authentic", "legitimate", "valid", "genuine"];

pub fn normalize(raw_text: &str, declared_document_type: Option<&str>) -> Analysis {
    match first_json_object(raw_text) {
        Some(object) => from_object(&object, declared_document_type),
        None => {
            tracing::debug!(
                "Model reply had no JSON object ({} chars), using text heuristics",
                raw_text.len()
            );
            fallback(raw_text, declared_document_type)
        }
    }
}

/// Returns the first balanced `{...}` region of `text` that parses as a JSON object.
fn first_json_object(text: &str) -> Option<Map<String, Value>> {
    text.char_indices()
        .filter(|&(_, c)| c == '{')
        .find_map(|(start, _)| {
            let end = balanced_end(&text[start..])?;
            match serde_json::from_str::<Value>(&text[start..start + end]) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            }
        })
}

/// Byte length of the balanced object starting at `s[0] == '{'`, if it closes.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
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
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn declared_or_unknown(declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(UNKNOWN_DOCUMENT)
        .to_string()
}

fn from_object(object: &Map<String, Value>, declared: Option<&str>) -> Analysis {
    let document_type = field(object, &["documentType", "document_type"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| declared_or_unknown(declared));

    let is_valid = field(object, &["isValid", "is_valid", "valid"])
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let confidence = field(object, &["confidence"])
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    Analysis {
        document_type,
        is_valid,
        confidence,
        issues: string_list(field(object, &["issues"])),
        key_findings: string_list(field(object, &["keyFindings", "key_findings"])),
        recommendations: string_list(field(object, &["recommendations"])),
    }
}

fn fallback(raw_text: &str, declared: Option<&str>) -> Analysis {
    let trimmed = raw_text.trim();
    let lowered = trimmed.to_lowercase();

    let is_valid = lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| POSITIVE_KEYWORDS.contains(&word));

    let excerpt: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    let excerpt = if excerpt.is_empty() {
        EMPTY_RESPONSE_NOTE.to_string()
    } else {
        excerpt
    };

    let issues = if !is_valid || lowered.contains("issue") {
        vec![excerpt.clone()]
    } else {
        Vec::new()
    };

    Analysis {
        document_type: declared_or_unknown(declared),
        is_valid,
        confidence: FALLBACK_CONFIDENCE,
        issues,
        key_findings: vec![excerpt],
        recommendations: Vec::new(),
    }
}
