//! Minimal inverted search index over events, artists, and venues.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::instrument;

use crate::domain::{Artist, Event, Venue};

const MIN_TOKEN_LEN: usize = 3;

/// One searchable document; `id` is `"<type>:<entity id>"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    pub id: String,
    pub doc_type: DocType,
    pub entity_id: u64,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Event,
    Artist,
    Venue,
}

/// Documents plus the term -> document-id inverted index.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndex {
    pub documents: Vec<SearchDocument>,
    pub terms: BTreeMap<String, Vec<String>>,
}

/// Lower-cased, punctuation-stripped tokens of useful length, deduplicated
/// per document.
fn tokenize(content: &str) -> BTreeSet<String> {
    content
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

#[instrument(skip_all)]
pub fn build_search_index(events: &[Event], artists: &[Artist], venues: &[Venue]) -> SearchIndex {
    let artist_by_id: HashMap<u64, &Artist> = artists.iter().map(|a| (a.id, a)).collect();
    let venue_by_id: HashMap<u64, &Venue> = venues.iter().map(|v| (v.id, v)).collect();

    let mut index = SearchIndex::default();

    for event in events {
        let headliner = event
            .artist_ids
            .first()
            .and_then(|id| artist_by_id.get(id))
            .map(|a| a.name.as_str())
            .unwrap_or("");
        let (venue_name, city) = venue_by_id
            .get(&event.venue_id)
            .map(|v| (v.name.as_str(), v.city.as_str()))
            .unwrap_or(("", ""));
        let tags = event
            .tags
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join(" ");
        let content = format!(
            "{headliner} {venue_name} {city} {tags} {}",
            event.notes.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        index.documents.push(SearchDocument {
            id: format!("event:{}", event.id),
            doc_type: DocType::Event,
            entity_id: event.id,
            content,
        });
    }

    for artist in artists {
        let content = if artist.aliases.is_empty() {
            artist.name.clone()
        } else {
            format!("{} {}", artist.name, artist.aliases.join(" "))
        };
        index.documents.push(SearchDocument {
            id: format!("artist:{}", artist.id),
            doc_type: DocType::Artist,
            entity_id: artist.id,
            content,
        });
    }

    for venue in venues {
        let content = format!(
            "{} {} {}",
            venue.name,
            venue.address.as_deref().unwrap_or(""),
            venue.city
        )
        .trim()
        .to_string();
        index.documents.push(SearchDocument {
            id: format!("venue:{}", venue.id),
            doc_type: DocType::Venue,
            entity_id: venue.id,
            content,
        });
    }

    for document in &index.documents {
        for token in tokenize(&document.content) {
            let postings = index.terms.entry(token).or_default();
            // Per-document token sets already guarantee at most one posting
            // per term per document
            postings.push(document.id.clone());
        }
    }

    index
}
