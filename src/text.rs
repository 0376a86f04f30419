//! Text normalization used for entity identity keys and slugs.
//!
//! Normalized names are the identity keys for artists and venues: two raw
//! mentions that normalize to the same string resolve to the same entity.

/// Normalize a display name into its identity key: lower-case, strip a
/// leading "the", unify "&" with "and", drop punctuation, collapse runs of
/// whitespace.
pub fn normalize(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = lowered.strip_prefix("the ").unwrap_or(&lowered);
    let unified = stripped.replace('&', " and ");
    let cleaned: String = unified
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URL-safe slug form of a name.
pub fn slug(name: &str) -> String {
    normalize(name).replace(' ', "-")
}

/// Title-case each whitespace-separated word of a token.
pub fn title_case(token: &str) -> String {
    token
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a leading "the " from a display name without otherwise changing it.
pub fn strip_leading_article(name: &str) -> &str {
    let trimmed = name.trim();
    match trimmed.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("the ") && trimmed.len() > 4 => {
            trimmed[4..].trim_start()
        }
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_case_insensitive() {
        assert_eq!(normalize("The Strokes"), normalize("the strokes"));
        assert_eq!(normalize("The Strokes"), "strokes");
    }

    #[test]
    fn normalize_unifies_punctuation() {
        assert_eq!(normalize("Sleater-Kinney"), "sleater kinney");
        assert_eq!(normalize("Earth, Wind & Fire"), "earth wind and fire");
        assert_eq!(normalize("  double  spaced  "), "double spaced");
    }

    #[test]
    fn slug_joins_with_dashes() {
        assert_eq!(slug("The Fox Theater"), "fox-theater");
    }

    #[test]
    fn title_case_handles_multi_word_tokens() {
        assert_eq!(title_case("santa cruz"), "Santa Cruz");
        assert_eq!(title_case("OAKLAND"), "Oakland");
    }

    #[test]
    fn strips_leading_article_preserving_case() {
        assert_eq!(strip_leading_article("the Fox Theater"), "Fox Theater");
        assert_eq!(strip_leading_article("Theater of Dreams"), "Theater of Dreams");
    }
}
