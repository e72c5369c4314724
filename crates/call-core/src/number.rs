//! Phone number resolution across unreliable sources
//!
//! Several components report a number for the same call: an explicit
//! UI-intent value, the live telecom handle, and the legacy broadcast
//! receiver's cache. Any of them can be missing, stale, or the literal
//! `"Unknown"`. [`resolve`] picks the first candidate that looks like a
//! real phone number, in the caller-supplied priority order, and falls back
//! to the `"Unknown"` sentinel. Absence is a value here, never an error.
//!
//! # Examples
//!
//! ```rust
//! use ringside_call_core::number;
//!
//! let best = number::resolve([
//!     Some("Unknown"),
//!     Some("12345"),          // too short to be a phone number
//!     Some("+1 555-0100"),
//! ]);
//! assert_eq!(best, "+1 555-0100");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::call::UNKNOWN_NUMBER;

/// Permissive phone-number shape: optional leading `+`, then at least seven
/// characters drawn from digits, spaces, dashes and parentheses.
static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 \-()]{7,}$").expect("phone pattern is valid"));

/// Pick the single best phone number out of an ordered candidate list.
///
/// Candidates are checked in the order supplied (typically: explicit
/// UI-intent value > live telecom-handle value > legacy-broadcast cached
/// value); the first valid one wins. Returns `"Unknown"` when no candidate
/// is valid.
pub fn resolve<'a, I>(candidates: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    for candidate in candidates.into_iter().flatten() {
        if is_valid(candidate) {
            return candidate.trim().to_string();
        }
    }
    UNKNOWN_NUMBER.to_string()
}

/// Whether a candidate is a usable phone number.
///
/// Valid iff non-empty, not case-insensitively equal to `"Unknown"`, and
/// matching the permissive phone-number shape.
pub fn is_valid(number: &str) -> bool {
    let trimmed = number.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.eq_ignore_ascii_case(UNKNOWN_NUMBER) {
        return false;
    }
    PHONE_PATTERN.is_match(trimmed)
}

/// Strip display formatting from a number, preserving a leading `+`.
///
/// Empty or unknown inputs normalize to `"Unknown"`.
pub fn clean(number: &str) -> String {
    let trimmed = number.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_NUMBER) {
        return UNKNOWN_NUMBER.to_string();
    }
    trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect()
}
