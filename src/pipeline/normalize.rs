//! Entity normalization: raw records become canonical entities.
//!
//! All entity maps and the duplicate-detection set live in `EntityStore`, an
//! explicit accumulator folded over the raw records. Were the per-record
//! parsing ever parallelized, this store is the single structure that must
//! observe a global, ordered view.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

use crate::diagnostics::{Diagnostics, ErrorKind, WarningKind};
use crate::domain::{AgeRestriction, Artist, Event, Venue};
use crate::identity;
use crate::parser::event_blocks::RawEventRecord;
use crate::parser::venue_line::{classify_venue_name, parse_venue_line, VenueLineInfo};
use crate::parser::venue_records::RawVenueRecord;
use crate::temporal::parse_date;
use crate::text;

static ARTIST_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:,|&|\bwith\b)\s*").unwrap());

// Digits butted against letters usually mean a typo in a hand-typed name
static SUSPICIOUS_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][0-9]|[0-9][A-Za-z]").unwrap());

/// Mutable entity maps plus the dedup set, keyed by normalized names.
#[derive(Debug, Default)]
pub struct EntityStore {
    artists: HashMap<String, Artist>,
    venues: HashMap<String, Venue>,
    seen_event_keys: HashSet<(NaiveDate, String, String)>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a venue from the venues file, or backfill one already created.
    pub fn seed_venue(&mut self, record: &RawVenueRecord) {
        let normalized = text::normalize(&record.name);
        if normalized.is_empty() {
            return;
        }
        match self.venues.get_mut(&normalized) {
            Some(venue) => {
                if venue.address.is_none() {
                    venue.address = Some(record.address.clone());
                }
                if venue.city.is_empty() {
                    if let Some(city) = &record.city {
                        venue.city = city.clone();
                    }
                }
            }
            None => {
                let name = text::strip_leading_article(&record.name).to_string();
                let venue = Venue {
                    id: identity::venue_id(&normalized),
                    venue_type: classify_venue_name(&name),
                    name,
                    normalized_name: normalized.clone(),
                    city: record.city.clone().unwrap_or_default(),
                    address: Some(record.address.clone()),
                    age_restriction: record.age_restriction.unwrap_or(AgeRestriction::AllAges),
                    upcoming_event_count: 0,
                    total_event_count: 0,
                    source_line_number: record.line_number,
                };
                self.venues.insert(normalized, venue);
            }
        }
    }

    /// Look up or create an artist for one raw mention, counting the event
    /// reference and recording divergent raw spellings as aliases.
    fn resolve_artist(&mut self, raw_name: &str, normalized: &str) -> u64 {
        if let Some(artist) = self.artists.get_mut(normalized) {
            let trimmed = raw_name.trim();
            if trimmed != artist.name && !artist.aliases.iter().any(|a| a == trimmed) {
                artist.aliases.push(trimmed.to_string());
            }
            artist.total_event_count += 1;
            return artist.id;
        }
        let artist = Artist {
            id: identity::artist_id(normalized),
            name: raw_name.trim().to_string(),
            normalized_name: normalized.to_string(),
            aliases: Vec::new(),
            upcoming_event_count: 0,
            total_event_count: 1,
        };
        let id = artist.id;
        self.artists.insert(normalized.to_string(), artist);
        id
    }

    /// Look up or create a venue for an event's venue-line mention.
    fn resolve_venue_mention(
        &mut self,
        info: &VenueLineInfo,
        normalized: &str,
        line_number: usize,
    ) -> u64 {
        if let Some(venue) = self.venues.get_mut(normalized) {
            if venue.city.is_empty() && !info.city.is_empty() {
                venue.city = info.city.clone();
            }
            venue.total_event_count += 1;
            return venue.id;
        }
        let venue = Venue {
            id: identity::venue_id(normalized),
            name: info.venue.clone(),
            normalized_name: normalized.to_string(),
            city: info.city.clone(),
            address: None,
            age_restriction: info.age_restriction,
            venue_type: info.venue_type,
            upcoming_event_count: 0,
            total_event_count: 1,
            source_line_number: line_number,
        };
        let id = venue.id;
        self.venues.insert(normalized.to_string(), venue);
        id
    }

    /// Drain the store into entity lists sorted by normalized name.
    pub fn into_entities(self) -> (Vec<Artist>, Vec<Venue>) {
        let mut artists: Vec<Artist> = self.artists.into_values().collect();
        artists.sort_by(|a, b| a.normalized_name.cmp(&b.normalized_name));
        let mut venues: Vec<Venue> = self.venues.into_values().collect();
        venues.sort_by(|a, b| a.normalized_name.cmp(&b.normalized_name));
        (artists, venues)
    }
}

/// Split an artist line on its connectives; first name is the headliner.
fn split_artist_names(line: &str) -> Vec<&str> {
    ARTIST_SPLIT_RE
        .split(line)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Fold raw records into the store, emitting canonical events.
#[instrument(skip_all, fields(venues = raw_venues.len(), events = raw_events.len()))]
pub fn normalize_records(
    raw_venues: &[RawVenueRecord],
    raw_events: &[RawEventRecord],
    store: &mut EntityStore,
    diagnostics: &mut Diagnostics,
    today: NaiveDate,
    max_cobilled_artists: usize,
) -> Vec<Event> {
    for record in raw_venues {
        store.seed_venue(record);
    }

    let mut events = Vec::new();
    for record in raw_events {
        if let Some(event) = normalize_event(record, store, diagnostics, today, max_cobilled_artists)
        {
            events.push(event);
        }
    }
    debug!(emitted = events.len(), "normalized event records");
    events
}

fn normalize_event(
    record: &RawEventRecord,
    store: &mut EntityStore,
    diagnostics: &mut Diagnostics,
    today: NaiveDate,
    max_cobilled_artists: usize,
) -> Option<Event> {
    let parsed_date = match parse_date(&record.date_line, today) {
        Ok(parsed) => parsed,
        Err(e) => {
            diagnostics.warning(
                WarningKind::Format,
                format!("unparseable date line: {e}"),
                Some(record.line_number),
                Some(&record.raw_text),
            );
            return None;
        }
    };

    // Unique artist mentions by normalized name, headliner first
    let mut names: Vec<(String, &str)> = Vec::new();
    for raw in split_artist_names(&record.artist_line) {
        let normalized = text::normalize(raw);
        if normalized.is_empty() {
            continue;
        }
        if !names.iter().any(|(n, _)| *n == normalized) {
            names.push((normalized, raw));
        }
    }
    if names.is_empty() {
        diagnostics.error(
            ErrorKind::Validation,
            "No artists found",
            Some(record.line_number),
            Some(&record.raw_text),
        );
        return None;
    }

    let venue_info = match parse_venue_line(&record.venue_line) {
        Ok(info) => info,
        Err(e) => {
            diagnostics.warning(
                WarningKind::Format,
                format!("unparseable venue line: {e}"),
                Some(record.line_number),
                Some(&record.raw_text),
            );
            return None;
        }
    };
    let normalized_venue = text::normalize(&venue_info.venue);
    if normalized_venue.is_empty() {
        diagnostics.warning(
            WarningKind::Format,
            "venue name normalizes to nothing",
            Some(record.line_number),
            Some(&record.raw_text),
        );
        return None;
    }

    // Duplicate detection runs before any entity mutation so dropped
    // duplicates never skew the reference counts
    let normalized_headliner = names[0].0.clone();
    let dedup_key = (
        parsed_date.date,
        normalized_venue.clone(),
        normalized_headliner.clone(),
    );
    if !store.seen_event_keys.insert(dedup_key) {
        diagnostics.warning(
            WarningKind::DataQuality,
            format!(
                "duplicate event dropped: {} / {} / {}",
                parsed_date.date, venue_info.venue, names[0].1
            ),
            Some(record.line_number),
            Some(&record.raw_text),
        );
        return None;
    }

    for (_, raw) in &names {
        if SUSPICIOUS_NAME_RE.is_match(raw) {
            diagnostics.warning(
                WarningKind::DataQuality,
                format!("artist name looks mistyped: '{raw}'"),
                Some(record.line_number),
                Some(&record.raw_text),
            );
        }
    }
    if names.len() > max_cobilled_artists {
        diagnostics.warning(
            WarningKind::DataQuality,
            format!(
                "{} co-billed artists on one event (threshold {})",
                names.len(),
                max_cobilled_artists
            ),
            Some(record.line_number),
            Some(&record.raw_text),
        );
    }

    let artist_ids: Vec<u64> = names
        .iter()
        .map(|(normalized, raw)| store.resolve_artist(raw, normalized))
        .collect();
    let venue_id = store.resolve_venue_mention(&venue_info, &normalized_venue, record.line_number);

    Some(Event {
        id: identity::event_id(parsed_date.date, &normalized_headliner, &normalized_venue),
        date: parsed_date.date,
        date_epoch_ms: parsed_date.epoch_ms,
        artist_ids,
        venue_id,
        age_restriction: venue_info.age_restriction,
        price: venue_info.price,
        time: venue_info.time,
        venue_type: venue_info.venue_type,
        tags: venue_info.tags,
        notes: venue_info.notes,
        source_line_number: record.line_number,
    })
}

/// Recompute `upcoming_event_count` on every artist and venue from the final
/// event set. A full recount keeps the entities consistent with the events
/// no matter what was dropped along the way.
pub fn recount_upcoming(
    artists: &mut [Artist],
    venues: &mut [Venue],
    events: &[Event],
    reference_epoch_ms: i64,
) {
    let mut artist_counts: HashMap<u64, usize> = HashMap::new();
    let mut venue_counts: HashMap<u64, usize> = HashMap::new();
    for event in events {
        if event.date_epoch_ms > reference_epoch_ms {
            for id in &event.artist_ids {
                *artist_counts.entry(*id).or_default() += 1;
            }
            *venue_counts.entry(event.venue_id).or_default() += 1;
        }
    }
    for artist in artists {
        artist.upcoming_event_count = artist_counts.get(&artist.id).copied().unwrap_or(0);
    }
    for venue in venues {
        venue.upcoming_event_count = venue_counts.get(&venue.id).copied().unwrap_or(0);
    }
}
