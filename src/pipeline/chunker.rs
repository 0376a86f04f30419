//! Monthly partitioning of the event set.
//!
//! Chunks are a total, non-overlapping partition of all emitted events by
//! calendar year-month, each carrying a checksum over its serialized events
//! so consumers can verify integrity without reparsing.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::instrument;

use crate::domain::Event;
use crate::error::Result;

/// One `events-<YYYY-MM>.json` artifact payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventChunk {
    /// `"YYYY-MM"`; doubles as the artifact's logical key
    pub chunk_id: String,
    pub date_range: ChunkDateRange,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDateRange {
    pub start_epoch_ms: i64,
    pub end_epoch_ms: i64,
}

/// A chunk plus the checksum of its serialized event content.
#[derive(Debug, Clone)]
pub struct ChunkedEvents {
    pub chunk: EventChunk,
    pub checksum: String,
}

/// Partition events into monthly chunks, sorted ascending by start instant.
#[instrument(skip_all, fields(events = events.len()))]
pub fn chunk_events(events: &[Event]) -> Result<Vec<ChunkedEvents>> {
    let mut by_month: BTreeMap<String, Vec<Event>> = BTreeMap::new();
    for event in events {
        let key = format!("{:04}-{:02}", event.date.year(), event.date.month());
        by_month.entry(key).or_default().push(event.clone());
    }

    let mut chunks = Vec::with_capacity(by_month.len());
    for (chunk_id, mut month_events) in by_month {
        month_events.sort_by_key(|e| (e.date_epoch_ms, e.id));
        let date_range = ChunkDateRange {
            start_epoch_ms: month_events[0].date_epoch_ms,
            end_epoch_ms: month_events[month_events.len() - 1].date_epoch_ms,
        };
        let serialized = serde_json::to_vec(&month_events)?;
        let mut hasher = Sha256::new();
        hasher.update(&serialized);
        let checksum = hex::encode(hasher.finalize());
        chunks.push(ChunkedEvents {
            chunk: EventChunk {
                chunk_id,
                date_range,
                events: month_events,
            },
            checksum,
        });
    }
    // BTreeMap order is already ascending by year-month, which matches
    // ascending start_epoch_ms; sort anyway to honor the contract
    chunks.sort_by_key(|c| c.chunk.date_range.start_epoch_ms);
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgeRestriction, PriceInfo, TimeInfo, VenueType};
    use crate::temporal::date_epoch_ms;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn event(id: u64, y: i32, m: u32, d: u32) -> Event {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Event {
            id,
            date,
            date_epoch_ms: date_epoch_ms(date),
            artist_ids: vec![1],
            venue_id: 2,
            age_restriction: AgeRestriction::AllAges,
            price: PriceInfo::default(),
            time: TimeInfo::default(),
            venue_type: VenueType::Club,
            tags: Vec::new(),
            notes: None,
            source_line_number: 1,
        }
    }

    #[test]
    fn partition_is_total_and_non_overlapping() {
        let events = vec![
            event(1, 2024, 8, 15),
            event(2, 2024, 8, 20),
            event(3, 2024, 9, 1),
            event(4, 2025, 1, 5),
        ];
        let chunks = chunk_events(&events).unwrap();
        assert_eq!(chunks.len(), 3);

        let all_ids: BTreeSet<u64> = chunks
            .iter()
            .flat_map(|c| c.chunk.events.iter().map(|e| e.id))
            .collect();
        let total: usize = chunks.iter().map(|c| c.chunk.events.len()).sum();
        assert_eq!(all_ids.len(), events.len());
        assert_eq!(total, events.len());
    }

    #[test]
    fn chunks_sort_ascending_with_tight_ranges() {
        let events = vec![event(3, 2024, 9, 1), event(1, 2024, 8, 20), event(2, 2024, 8, 15)];
        let chunks = chunk_events(&events).unwrap();
        assert_eq!(chunks[0].chunk.chunk_id, "2024-08");
        assert_eq!(chunks[1].chunk.chunk_id, "2024-09");
        let august = &chunks[0].chunk;
        assert_eq!(august.events[0].id, 2);
        assert_eq!(august.date_range.start_epoch_ms, august.events[0].date_epoch_ms);
        assert_eq!(august.date_range.end_epoch_ms, august.events[1].date_epoch_ms);
    }

    #[test]
    fn checksum_tracks_content() {
        let a = chunk_events(&[event(1, 2024, 8, 15)]).unwrap();
        let b = chunk_events(&[event(1, 2024, 8, 15)]).unwrap();
        let c = chunk_events(&[event(2, 2024, 8, 15)]).unwrap();
        assert_eq!(a[0].checksum, b[0].checksum);
        assert_ne!(a[0].checksum, c[0].checksum);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_events(&[]).unwrap().is_empty());
    }
}
