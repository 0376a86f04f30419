//! Venue-line field extraction.
//!
//! A venue line reads like `"at the Fox Theater, Oakland a/a $15 7pm/8pm #"`.
//! Parsing walks a fixed order of extractions, each consuming the text it
//! matched so later steps only see what remains.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::constants::canonical_city;
use crate::domain::{AgeRestriction, PriceInfo, Tag, TimeInfo, VenueType};
use crate::error::{EtlError, Result};
use crate::parser::find_age_restriction;
use crate::temporal::parse_time;
use crate::text::strip_leading_article;

static NOTES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)").unwrap());
static SYMBOLS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#@^]+\s*$").unwrap());
static FREE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfree\b").unwrap());
static PRICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\s*(\d+(?:\.\d{1,2})?)").unwrap());

// Slash ranges, explicit am/pm, or colon times; a bare digit is too
// ambiguous to claim as a time once prices and age flags are gone.
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d{1,2}(?::\d{2})?\s*(?:am|pm)?\s*(?:/\s*\d{1,2}(?::\d{2})?\s*(?:am|pm)?)+|\b\d{1,2}:\d{2}\s*(?:am|pm)?|\b\d{1,2}\s*(?:am|pm)\b",
    )
    .unwrap()
});

static TAG_PATTERNS: Lazy<Vec<(Regex, Tag)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)\bfree\b").unwrap(), Tag::Free),
        (Regex::new(r"(?i)\bsold[ -]?out\b").unwrap(), Tag::SoldOut),
        (Regex::new(r"(?i)\btribute\b").unwrap(), Tag::Tribute),
        (Regex::new(r"(?i)\bhip[ -]?hop\b").unwrap(), Tag::HipHop),
        (Regex::new(r"(?i)\breggae\b").unwrap(), Tag::Reggae),
        (Regex::new(r"(?i)\bfest(?:ival)?\b").unwrap(), Tag::Festival),
        (Regex::new(r"(?i)\boutdoors?\b").unwrap(), Tag::Outdoor),
        (Regex::new(r"(?i)\bmatinee\b").unwrap(), Tag::Matinee),
        (Regex::new(r"(?i)\blate[ -]?show\b").unwrap(), Tag::LateShow),
    ]
});

/// Everything extracted from one venue line.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueLineInfo {
    pub venue: String,
    pub city: String,
    pub age_restriction: AgeRestriction,
    pub price: PriceInfo,
    pub time: TimeInfo,
    pub venue_type: VenueType,
    pub tags: Vec<Tag>,
    pub notes: Option<String>,
}

/// Classify a venue from its name keywords when no listing symbol decides.
pub(crate) fn classify_venue_name(name: &str) -> VenueType {
    let lower = name.to_lowercase();
    if ["theater", "auditorium", "hall"].iter().any(|k| lower.contains(k)) {
        VenueType::Major
    } else if ["warehouse", "deli", "gallery"].iter().any(|k| lower.contains(k)) {
        VenueType::Diy
    } else {
        VenueType::Club
    }
}

pub fn parse_venue_line(line: &str) -> Result<VenueLineInfo> {
    let trimmed = line.trim();
    let mut working = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("at ") => trimmed[3..].to_string(),
        _ => trimmed.to_string(),
    };

    // 1. Parenthesized groups become semicolon-joined notes
    let note_parts: Vec<String> = NOTES_RE
        .captures_iter(&working)
        .map(|c| c[1].trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    let without_notes = NOTES_RE.replace_all(&working, " ").to_string();
    working = without_notes;
    let notes = if note_parts.is_empty() {
        None
    } else {
        Some(note_parts.join("; "))
    };

    // 2. Trailing symbol cluster
    let mut symbols = String::new();
    working = working.trim_end().to_string();
    let symbol_match = SYMBOLS_RE
        .find(&working)
        .map(|m| (m.start(), m.as_str().trim().to_string()));
    if let Some((start, cluster)) = symbol_match {
        symbols = cluster;
        working.truncate(start);
    }

    // 3. Venue and city from the comma-separated fields
    let fields: Vec<&str> = working.split(',').collect();
    if fields.len() < 2 {
        return Err(EtlError::Format(format!(
            "venue line needs at least 'venue, city': '{trimmed}'"
        )));
    }
    let venue = strip_leading_article(fields[0]).to_string();
    if venue.is_empty() {
        return Err(EtlError::Format(format!("venue line has empty venue name: '{trimmed}'")));
    }
    let city_token = fields[1]
        .split_whitespace()
        .next()
        .ok_or_else(|| EtlError::Format(format!("venue line has empty city field: '{trimmed}'")))?
        .to_string();
    let city = canonical_city(&city_token);

    let mut remaining = fields[1..].join(", ");
    remaining = remaining.replacen(&city_token, "", 1);

    // 4. Age restriction, first match by priority
    let age_restriction = match find_age_restriction(&remaining) {
        Some((restriction, range)) => {
            remaining.replace_range(range, " ");
            restriction
        }
        None => AgeRestriction::AllAges,
    };

    // 5. Price: explicit "free" wins, otherwise min/max over $ amounts
    let price = if let Some(m) = FREE_RE.find(&remaining) {
        let range = m.range();
        remaining.replace_range(range, " ");
        PriceInfo {
            min: None,
            max: None,
            is_free: true,
        }
    } else {
        let amounts: Vec<f64> = PRICE_RE
            .captures_iter(&remaining)
            .filter_map(|c| c[1].parse().ok())
            .collect();
        let without_prices = PRICE_RE.replace_all(&remaining, " ").to_string();
        remaining = without_prices;
        PriceInfo {
            min: amounts.iter().copied().fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.min(v)))
            }),
            max: amounts.iter().copied().fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.max(v)))
            }),
            is_free: false,
        }
    };

    // 6. First time-or-range match
    let time = match TIME_RE.find(&remaining) {
        Some(m) => {
            let range = m.range();
            let parsed = parse_time(m.as_str())?;
            remaining.replace_range(range, " ");
            parsed
        }
        None => TimeInfo::default(),
    };

    // 7. Venue type: symbols first, then name keywords
    let venue_type = if symbols.contains('#') {
        VenueType::Major
    } else if symbols.contains('@') {
        VenueType::Diy
    } else {
        classify_venue_name(&venue)
    };

    // 8. Additive tag scan over notes plus whatever text is left
    let mut tags: BTreeSet<Tag> = BTreeSet::new();
    let scan_text = format!("{} {}", notes.as_deref().unwrap_or(""), remaining);
    for (pattern, tag) in TAG_PATTERNS.iter() {
        if pattern.is_match(&scan_text) {
            tags.insert(*tag);
        }
    }
    if price.is_free {
        tags.insert(Tag::Free);
    }

    Ok(VenueLineInfo {
        venue,
        city,
        age_restriction,
        price,
        time,
        venue_type,
        tags: tags.into_iter().collect(),
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_full_flagged_line() {
        let info = parse_venue_line("at the Fox Theater, Oakland a/a $50.60 7pm/8pm #").unwrap();
        assert_eq!(info.venue, "Fox Theater");
        assert_eq!(info.city, "Oakland");
        assert_eq!(info.age_restriction, AgeRestriction::AllAges);
        assert_eq!(info.price.min, Some(50.60));
        assert_eq!(info.price.max, Some(50.60));
        assert!(!info.price.is_free);
        assert_eq!(info.time.start_time.as_deref(), Some("20:00"));
        assert_eq!(info.time.door_time.as_deref(), Some("19:00"));
        assert_eq!(info.venue_type, VenueType::Major);
    }

    #[test]
    fn city_aliases_resolve() {
        let info = parse_venue_line("Bottom of the Hill, sf 21+ $12/$15 9pm").unwrap();
        assert_eq!(info.city, "San Francisco");
        assert_eq!(info.age_restriction, AgeRestriction::TwentyOnePlus);
        assert_eq!(info.price.min, Some(12.0));
        assert_eq!(info.price.max, Some(15.0));
    }

    #[test]
    fn free_wins_over_amounts() {
        let info = parse_venue_line("Golden Gate Park, sf free 2pm (outdoor festival)").unwrap();
        assert!(info.price.is_free);
        assert_eq!(info.price.min, None);
        assert!(info.tags.contains(&Tag::Free));
        assert!(info.tags.contains(&Tag::Outdoor));
        assert!(info.tags.contains(&Tag::Festival));
        assert_eq!(info.notes.as_deref(), Some("outdoor festival"));
    }

    #[test]
    fn no_price_means_unknown_not_free() {
        let info = parse_venue_line("Eli's Mile High Club, Oakland 21+ 8pm").unwrap();
        assert!(!info.price.is_free);
        assert_eq!(info.price.min, None);
        assert_eq!(info.price.max, None);
    }

    #[test]
    fn symbols_override_name_keywords() {
        let info = parse_venue_line("Grand Theater, Oakland $10 @").unwrap();
        assert_eq!(info.venue_type, VenueType::Diy);
        let info = parse_venue_line("Secret Warehouse, Oakland $10").unwrap();
        assert_eq!(info.venue_type, VenueType::Diy);
        let info = parse_venue_line("Stork Club, Oakland $8").unwrap();
        assert_eq!(info.venue_type, VenueType::Club);
    }

    #[test]
    fn defaults_to_all_ages_without_flags() {
        let info = parse_venue_line("Rickshaw Stop, sf $14 8pm").unwrap();
        assert_eq!(info.age_restriction, AgeRestriction::AllAges);
    }

    #[test]
    fn single_field_line_fails() {
        assert!(parse_venue_line("at the Fillmore").is_err());
    }

    #[test]
    fn multiple_notes_join_with_semicolons() {
        let info =
            parse_venue_line("Ashkenaz, Berkeley $15 (benefit) (reggae night) 9pm").unwrap();
        assert_eq!(info.notes.as_deref(), Some("benefit; reggae night"));
        assert!(info.tags.contains(&Tag::Reggae));
    }
}
