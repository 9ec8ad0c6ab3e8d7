//! Payload tokenizing helpers
//!
//! Small pure functions shared by the field grammars. None of them keep state;
//! multi-line assembly lives in [`crate::stanza`].

use chrono::NaiveDate;

use crate::error::FormatError;

/// Append a continuation fragment to accumulated text.
///
/// Fragments are joined with one space, except after a trailing hyphen
/// (`"beta-" + "lactamase"` gives `"beta-lactamase"`).
pub fn join_continuation(buffer: &mut String, fragment: &str) {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return;
    }
    if !buffer.is_empty() && !buffer.ends_with('-') {
        buffer.push(' ');
    }
    buffer.push_str(fragment);
}

/// Remove `{ECO:...}` style evidence annotations.
pub fn strip_evidence(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' => depth += 1,
            '}' if depth > 0 => {
                depth -= 1;
                // "sentence. {ECO:1}." keeps one period
                if depth == 0 && chars.peek() == Some(&'.') && out.trim_end().ends_with('.') {
                    chars.next();
                }
            },
            _ if depth == 0 => out.push(ch),
            _ => {},
        }
    }
    // Removing an annotation leaves "name ;" behind
    out.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" ;", ";")
        .replace(" .", ".")
        .replace(" ,", ",")
}

/// Split `a; b; c.` style text into trimmed, non-empty items, dropping the
/// closing character of the last item when given.
pub fn split_items(text: &str, separator: char, closing: Option<char>) -> Vec<String> {
    let text = text.trim();
    let text = match closing {
        Some(c) => text.strip_suffix(c).unwrap_or(text),
        None => text,
    };
    text.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a `Key=value` item. Keys are trimmed; the value keeps inner spaces.
pub fn key_value(item: &str) -> Option<(&str, &str)> {
    let (key, value) = item.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Remove one trailing `.`, if present, and surrounding whitespace.
pub fn strip_period(text: &str) -> &str {
    let text = text.trim();
    text.strip_suffix('.').unwrap_or(text).trim_end()
}

/// Whether accumulated text closes with the given terminator.
pub fn is_closed(text: &str, terminator: &str) -> bool {
    text.trim_end().ends_with(terminator)
}

/// Parse a flat-file date like `01-JAN-1990`
pub fn parse_date(date_str: &str) -> Result<NaiveDate, FormatError> {
    let invalid = || FormatError::malformed("DT", format!("invalid date '{date_str}'"));

    let parts: Vec<&str> = date_str.trim().split('-').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }

    let day: u32 = parts[0].parse().map_err(|_| invalid())?;
    let month = match parts[1].to_ascii_uppercase().as_str() {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return Err(invalid()),
    };
    let year: i32 = parts[2].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}
