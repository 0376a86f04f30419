//! Deterministic entity identity.
//!
//! IDs are a pure function of the normalized composite key, so repeated runs
//! over the same input assign the same IDs without any database. The hash is
//! 64-bit FNV-1a: non-cryptographic, well distributed, and wide enough that
//! collisions are not a practical concern at listing scale.

use chrono::NaiveDate;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the UTF-8 bytes of a key.
pub fn hash_key(key: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in key.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Stable artist ID from a normalized artist name.
pub fn artist_id(normalized_name: &str) -> u64 {
    hash_key(&format!("artist:{normalized_name}"))
}

/// Stable venue ID from a normalized venue name.
pub fn venue_id(normalized_name: &str) -> u64 {
    hash_key(&format!("venue:{normalized_name}"))
}

/// Stable event ID from the event's identity triple.
pub fn event_id(date: NaiveDate, normalized_headliner: &str, normalized_venue: &str) -> u64 {
    hash_key(&format!(
        "event:{}:{normalized_headliner}:{normalized_venue}",
        date.format("%Y-%m-%d")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_key("fox theater"), hash_key("fox theater"));
        assert_ne!(hash_key("fox theater"), hash_key("fox theatre"));
    }

    #[test]
    fn entity_prefixes_separate_namespaces() {
        // An artist and a venue with the same normalized name must not share an ID.
        assert_ne!(artist_id("warfield"), venue_id("warfield"));
    }

    #[test]
    fn event_id_depends_on_all_key_parts() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        let other = NaiveDate::from_ymd_opt(2024, 8, 16).unwrap();
        let base = event_id(date, "strokes", "fox theater");
        assert_eq!(base, event_id(date, "strokes", "fox theater"));
        assert_ne!(base, event_id(other, "strokes", "fox theater"));
        assert_ne!(base, event_id(date, "interpol", "fox theater"));
        assert_ne!(base, event_id(date, "strokes", "warfield"));
    }
}
