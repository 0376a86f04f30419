//! Derived lookup structures and aggregate statistics.
//!
//! Every map here is ordered so the serialized artifact bytes are stable
//! across runs over the same input.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::instrument;

use crate::domain::{AgeRestriction, Artist, Event, Venue};

/// The complete `indexes.json` payload.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetIndexes {
    /// ISO date -> event IDs
    pub events_by_date: BTreeMap<String, Vec<u64>>,
    pub events_by_venue: BTreeMap<u64, Vec<u64>>,
    pub events_by_artist: BTreeMap<u64, Vec<u64>>,
    pub events_by_city: BTreeMap<String, Vec<u64>>,
    /// Normalized artist name -> artist ID
    pub artist_id_by_name: BTreeMap<String, u64>,
    /// Normalized venue name -> venue ID
    pub venue_id_by_name: BTreeMap<String, u64>,
    pub venues_by_city: BTreeMap<String, Vec<u64>>,
    pub city_stats: Vec<CityStats>,
    pub price_buckets: PriceBuckets,
    /// Distinct age restrictions present across events
    pub age_restrictions: Vec<AgeRestriction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityStats {
    pub city: String,
    pub event_count: usize,
    pub venue_count: usize,
    pub upcoming_event_count: usize,
}

/// Histogram over the five fixed price bands, bucketed by the low end of an
/// event's price range. Unpriced events are not counted.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PriceBuckets {
    #[serde(rename = "free")]
    pub free: usize,
    #[serde(rename = "<20")]
    pub under_20: usize,
    #[serde(rename = "20-50")]
    pub from_20_to_50: usize,
    #[serde(rename = "50-100")]
    pub from_50_to_100: usize,
    #[serde(rename = ">100")]
    pub over_100: usize,
}

impl PriceBuckets {
    fn record(&mut self, event: &Event) {
        if event.price.is_free {
            self.free += 1;
            return;
        }
        let Some(amount) = event.price.min.or(event.price.max) else {
            return;
        };
        if amount < 20.0 {
            self.under_20 += 1;
        } else if amount <= 50.0 {
            self.from_20_to_50 += 1;
        } else if amount <= 100.0 {
            self.from_50_to_100 += 1;
        } else {
            self.over_100 += 1;
        }
    }
}

/// Build all indexes and aggregates in one pass over the final collections.
/// "Upcoming" means strictly after the run's reference instant.
#[instrument(skip_all, fields(events = events.len()))]
pub fn build_indexes(
    events: &[Event],
    artists: &[Artist],
    venues: &[Venue],
    reference_epoch_ms: i64,
) -> DatasetIndexes {
    let venue_by_id: HashMap<u64, &Venue> = venues.iter().map(|v| (v.id, v)).collect();

    let mut indexes = DatasetIndexes::default();
    let mut ages: BTreeSet<AgeRestriction> = BTreeSet::new();
    let mut city_events: HashMap<String, usize> = HashMap::new();
    let mut city_upcoming: HashMap<String, usize> = HashMap::new();

    for event in events {
        indexes
            .events_by_date
            .entry(event.date.format("%Y-%m-%d").to_string())
            .or_default()
            .push(event.id);
        indexes
            .events_by_venue
            .entry(event.venue_id)
            .or_default()
            .push(event.id);
        for artist_id in &event.artist_ids {
            indexes
                .events_by_artist
                .entry(*artist_id)
                .or_default()
                .push(event.id);
        }
        if let Some(venue) = venue_by_id.get(&event.venue_id) {
            if !venue.city.is_empty() {
                indexes
                    .events_by_city
                    .entry(venue.city.clone())
                    .or_default()
                    .push(event.id);
                *city_events.entry(venue.city.clone()).or_default() += 1;
                if event.date_epoch_ms > reference_epoch_ms {
                    *city_upcoming.entry(venue.city.clone()).or_default() += 1;
                }
            }
        }
        indexes.price_buckets.record(event);
        ages.insert(event.age_restriction);
    }

    for artist in artists {
        indexes
            .artist_id_by_name
            .insert(artist.normalized_name.clone(), artist.id);
    }
    let mut city_venues: HashMap<String, usize> = HashMap::new();
    for venue in venues {
        indexes
            .venue_id_by_name
            .insert(venue.normalized_name.clone(), venue.id);
        if !venue.city.is_empty() {
            indexes
                .venues_by_city
                .entry(venue.city.clone())
                .or_default()
                .push(venue.id);
            *city_venues.entry(venue.city.clone()).or_default() += 1;
        }
    }

    let mut city_stats: Vec<CityStats> = indexes
        .events_by_city
        .keys()
        .chain(indexes.venues_by_city.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|city| CityStats {
            city: city.clone(),
            event_count: city_events.get(city).copied().unwrap_or(0),
            venue_count: city_venues.get(city).copied().unwrap_or(0),
            upcoming_event_count: city_upcoming.get(city).copied().unwrap_or(0),
        })
        .collect();
    // Busiest cities first; name breaks ties so output order is stable
    city_stats.sort_by(|a, b| {
        b.event_count
            .cmp(&a.event_count)
            .then_with(|| a.city.cmp(&b.city))
    });
    indexes.city_stats = city_stats;
    indexes.age_restrictions = ages.into_iter().collect();

    indexes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::event_blocks::parse_event_blocks;
    use crate::pipeline::normalize::{normalize_records, EntityStore};
    use crate::temporal::date_epoch_ms;
    use chrono::NaiveDate;

    fn fixture() -> (Vec<Event>, Vec<Artist>, Vec<Venue>) {
        let text = "aug 15 fri\nThe Strokes\nat the Fox Theater, Oakland a/a $50 8pm\n\n\
                    aug 16 sat\nInterpol\nat Bottom of the Hill, sf 21+ $15 9pm\n\n\
                    aug 20 wed\nThe Strokes\nat Bottom of the Hill, sf free 9pm\n";
        let mut diagnostics = Diagnostics::new();
        let raw = parse_event_blocks(text, &mut diagnostics);
        let mut store = EntityStore::new();
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let mut events = normalize_records(&[], &raw, &mut store, &mut diagnostics, today, 8);
        events.sort_by_key(|e| (e.date_epoch_ms, e.id));
        let (artists, venues) = store.into_entities();
        (events, artists, venues)
    }

    #[test]
    fn primary_indexes_cover_every_event() {
        let (events, artists, venues) = fixture();
        let reference = date_epoch_ms(NaiveDate::from_ymd_opt(2024, 8, 16).unwrap());
        let indexes = build_indexes(&events, &artists, &venues, reference);

        let by_date_total: usize = indexes.events_by_date.values().map(Vec::len).sum();
        assert_eq!(by_date_total, events.len());
        assert_eq!(indexes.events_by_venue.len(), 2);
        assert_eq!(indexes.events_by_city["San Francisco"].len(), 2);
        assert_eq!(indexes.events_by_city["Oakland"].len(), 1);

        let strokes_id = artists
            .iter()
            .find(|a| a.normalized_name == "strokes")
            .unwrap()
            .id;
        assert_eq!(indexes.events_by_artist[&strokes_id].len(), 2);
    }

    #[test]
    fn city_stats_sort_by_event_count() {
        let (events, artists, venues) = fixture();
        let indexes = build_indexes(&events, &artists, &venues, 0);
        assert_eq!(indexes.city_stats[0].city, "San Francisco");
        assert_eq!(indexes.city_stats[0].event_count, 2);
        assert_eq!(indexes.city_stats[0].venue_count, 1);
        assert_eq!(indexes.city_stats[1].city, "Oakland");
    }

    #[test]
    fn price_buckets_follow_the_low_end() {
        let (events, artists, venues) = fixture();
        let indexes = build_indexes(&events, &artists, &venues, 0);
        assert_eq!(indexes.price_buckets.free, 1);
        assert_eq!(indexes.price_buckets.under_20, 1);
        assert_eq!(indexes.price_buckets.from_20_to_50, 1);
        assert_eq!(indexes.price_buckets.over_100, 0);
    }

    #[test]
    fn age_restrictions_list_distinct_values() {
        let (events, artists, venues) = fixture();
        let indexes = build_indexes(&events, &artists, &venues, 0);
        assert_eq!(
            indexes.age_restrictions,
            vec![AgeRestriction::AllAges, AgeRestriction::TwentyOnePlus]
        );
    }
}
