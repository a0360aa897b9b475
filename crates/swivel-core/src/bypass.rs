//! Bypass list normalization.
//!
//! Raw bypass input arrives either as a comma-separated string or as an
//! array. Entries are trimmed, length-capped, and stripped of literal
//! angle brackets; the `<local>` token is the one sanctioned exception.
//! Surviving entries keep their input order so the list reads the same in
//! the UI and round-trips through export/import.

use serde_json::Value;

/// Maximum length of a single bypass entry.
const MAX_ENTRY_LEN: usize = 255;

/// The platform token matching plain (dot-less) hostnames.
pub const LOCAL_TOKEN: &str = "<local>";

/// Default bypass set applied when no usable entries survive.
pub fn default_bypass() -> Vec<String> {
    vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
        LOCAL_TOKEN.to_string(),
    ]
}

/// Sanitizes one raw bypass entry. Returns `None` when nothing survives.
pub fn sanitize_entry(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == LOCAL_TOKEN {
        return Some(trimmed.to_string());
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .take(MAX_ENTRY_LEN)
        .collect();
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned.trim().to_string())
    }
}

/// Normalizes raw bypass input into a canonical entry list.
///
/// Accepts a comma-separated string or an array of strings; anything else
/// (including absent input) yields the default set.
pub fn normalize(raw: Option<&Value>) -> Vec<String> {
    let entries: Vec<String> = match raw {
        Some(Value::String(s)) => s.split(',').filter_map(sanitize_entry).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(sanitize_entry)
            .collect(),
        _ => Vec::new(),
    };

    if entries.is_empty() {
        default_bypass()
    } else {
        entries
    }
}

/// Sanitizes an already-typed entry list, falling back to the default set.
pub fn normalize_entries(entries: &[String]) -> Vec<String> {
    let cleaned: Vec<String> = entries
        .iter()
        .filter_map(|e| sanitize_entry(e))
        .collect();
    if cleaned.is_empty() {
        default_bypass()
    } else {
        cleaned
    }
}

/// Joins entries back into the comma-separated form shown in the UI.
pub fn to_csv(entries: &[String]) -> String {
    entries.join(", ")
}
