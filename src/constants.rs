//! Fixed lookup tables shared across the parsing stages.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Version of the output artifact schema consumed by the downstream app.
pub const SCHEMA_VERSION: &str = "1.0";

/// Default artifact filenames.
pub const MANIFEST_FILE: &str = "manifest.json";
pub const ARTISTS_FILE: &str = "artists.json";
pub const VENUES_FILE: &str = "venues.json";
pub const INDEXES_FILE: &str = "indexes.json";
pub const SEARCH_DOCUMENTS_FILE: &str = "search-documents.json";
pub const SEARCH_TERMS_FILE: &str = "search-terms.json";

/// Month names and abbreviations accepted in date lines.
const MONTHS: [(&str, u32); 12] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Resolve a month token ("aug", "Aug.", "sept", "august") to its 1-based
/// number. Any prefix of three or more letters is unambiguous.
pub fn month_number(token: &str) -> Option<u32> {
    let cleaned = token.trim().trim_end_matches('.').to_lowercase();
    if cleaned.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .find(|(name, _)| name.starts_with(&cleaned))
        .map(|(_, n)| *n)
}

/// Alias table mapping the shorthand city tokens used in hand-authored
/// listings to canonical city names.
static CITY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("sf", "San Francisco"),
        ("s.f.", "San Francisco"),
        ("sanfrancisco", "San Francisco"),
        ("oak", "Oakland"),
        ("oakl", "Oakland"),
        ("berk", "Berkeley"),
        ("sj", "San Jose"),
        ("s.j.", "San Jose"),
        ("sac", "Sacramento"),
        ("alb", "Albany"),
        ("emery", "Emeryville"),
    ])
});

/// Canonicalize a raw city token via the alias table, falling back to
/// title-casing unknown tokens.
pub fn canonical_city(token: &str) -> String {
    let key = token.trim().trim_end_matches([',', ';']).to_lowercase();
    if let Some(name) = CITY_ALIASES.get(key.as_str()) {
        return (*name).to_string();
    }
    crate::text::title_case(token.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_month_abbreviations_and_full_names() {
        assert_eq!(month_number("aug"), Some(8));
        assert_eq!(month_number("Aug"), Some(8));
        assert_eq!(month_number("august"), Some(8));
        assert_eq!(month_number("sep"), Some(9));
        assert_eq!(month_number("sept"), Some(9));
        assert_eq!(month_number("dec."), Some(12));
        assert_eq!(month_number("ja"), None);
        assert_eq!(month_number("foo"), None);
    }

    #[test]
    fn canonicalizes_known_city_aliases() {
        assert_eq!(canonical_city("sf"), "San Francisco");
        assert_eq!(canonical_city("S.F."), "San Francisco");
        assert_eq!(canonical_city("Oakland"), "Oakland");
    }

    #[test]
    fn title_cases_unknown_city_tokens() {
        assert_eq!(canonical_city("petaluma"), "Petaluma");
        assert_eq!(canonical_city("santa cruz"), "Santa Cruz");
    }
}
