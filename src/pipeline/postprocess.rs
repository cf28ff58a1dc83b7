//! Deterministic cleanup of oracle responses before JSON parsing.
//!
//! Even with a "JSON only" instruction, generative models regularly wrap
//! the object in ```` ```json ```` fences, prepend a sentence, or emit a
//! BOM. None of that changes the record, so it is stripped here instead of
//! being treated as a malformed extraction.
//!
//! Rules (applied in order):
//! 1. Strip invisible Unicode (zero-width spaces, BOM)
//! 2. Strip outer code fences (with or without a language tag)
//! 3. Cut to the outermost `{ ... }` object, dropping surrounding prose

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw oracle response.
pub fn clean_json_response(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = strip_code_fences(&s);
    outermost_object(&s).to_string()
}

// ── Rule 1: Invisible characters ─────────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'))
        .collect()
}

// ── Rule 2: Outer fences ─────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*\n(.*?)\n?```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

// ── Rule 3: Outermost object ─────────────────────────────────────────────────

fn outermost_object(input: &str) -> &str {
    match (input.find('{'), input.rfind('}')) {
        (Some(start), Some(end)) if start < end => &input[start..=end],
        _ => input,
    }
}
