//! Line-oriented parsers for the two hand-authored source files.

pub mod event_blocks;
pub mod venue_line;
pub mod venue_records;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::AgeRestriction;

/// Age keywords in first-match priority order; all-ages shorthand wins over
/// the numeric restrictions.
static AGE_PATTERNS: Lazy<Vec<(Regex, AgeRestriction)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)\ba/a\b|\ball[ -]ages\b").unwrap(),
            AgeRestriction::AllAges,
        ),
        (Regex::new(r"\b21\+").unwrap(), AgeRestriction::TwentyOnePlus),
        (Regex::new(r"\b18\+").unwrap(), AgeRestriction::EighteenPlus),
        (Regex::new(r"\b16\+").unwrap(), AgeRestriction::SixteenPlus),
        (Regex::new(r"\b8\+").unwrap(), AgeRestriction::EightPlus),
        (Regex::new(r"\b6\+").unwrap(), AgeRestriction::SixPlus),
        (Regex::new(r"\b5\+").unwrap(), AgeRestriction::FivePlus),
    ]
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(?\d{3}\)?[\s.\-]?\d{3}[\s.\-]\d{4}").unwrap());

/// Locate the highest-priority age restriction keyword in `text`, returning
/// the restriction and the matched byte range so callers can consume it.
pub(crate) fn find_age_restriction(text: &str) -> Option<(AgeRestriction, std::ops::Range<usize>)> {
    for (pattern, restriction) in AGE_PATTERNS.iter() {
        if let Some(m) = pattern.find(text) {
            return Some((*restriction, m.range()));
        }
    }
    None
}

/// Find a phone number anywhere in `text`.
pub(crate) fn find_phone(text: &str) -> Option<&str> {
    PHONE_RE.find(text).map(|m| m.as_str())
}
