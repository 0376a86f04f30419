//! Canonical entities and the supporting value types they carry.
//!
//! These are the shapes written to the output artifacts; field names
//! serialize in camelCase to match the downstream application's schema.

use serde::{Deserialize, Serialize};

/// Age restriction advertised for a venue or show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeRestriction {
    #[serde(rename = "all-ages")]
    AllAges,
    #[serde(rename = "21+")]
    TwentyOnePlus,
    #[serde(rename = "18+")]
    EighteenPlus,
    #[serde(rename = "16+")]
    SixteenPlus,
    #[serde(rename = "8+")]
    EightPlus,
    #[serde(rename = "6+")]
    SixPlus,
    #[serde(rename = "5+")]
    FivePlus,
}

impl AgeRestriction {
    pub fn label(&self) -> &'static str {
        match self {
            AgeRestriction::AllAges => "all-ages",
            AgeRestriction::TwentyOnePlus => "21+",
            AgeRestriction::EighteenPlus => "18+",
            AgeRestriction::SixteenPlus => "16+",
            AgeRestriction::EightPlus => "8+",
            AgeRestriction::SixPlus => "6+",
            AgeRestriction::FivePlus => "5+",
        }
    }
}

/// Venue classification derived from listing symbols or name keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueType {
    Major,
    Diy,
    Club,
}

/// Fixed tag vocabulary scanned from notes and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "sold-out")]
    SoldOut,
    #[serde(rename = "tribute")]
    Tribute,
    #[serde(rename = "hip-hop")]
    HipHop,
    #[serde(rename = "reggae")]
    Reggae,
    #[serde(rename = "festival")]
    Festival,
    #[serde(rename = "outdoor")]
    Outdoor,
    #[serde(rename = "matinee")]
    Matinee,
    #[serde(rename = "late-show")]
    LateShow,
}

impl Tag {
    pub fn label(&self) -> &'static str {
        match self {
            Tag::Free => "free",
            Tag::SoldOut => "sold-out",
            Tag::Tribute => "tribute",
            Tag::HipHop => "hip-hop",
            Tag::Reggae => "reggae",
            Tag::Festival => "festival",
            Tag::Outdoor => "outdoor",
            Tag::Matinee => "matinee",
            Tag::LateShow => "late-show",
        }
    }
}

/// Ticket price range extracted from a venue line. Absence of any price
/// match means the price is unknown, not free.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub is_free: bool,
}

/// Show and door times as zero-padded `HH:MM` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub door_time: Option<String>,
}

/// A canonical artist. Identity is a pure function of `normalized_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: u64,
    pub name: String,
    pub normalized_name: String,
    /// Raw spellings seen for this artist that differ from `name`.
    pub aliases: Vec<String>,
    pub upcoming_event_count: usize,
    pub total_event_count: usize,
}

/// A canonical venue. Identity is a pure function of `normalized_name`;
/// address and city may be backfilled by later mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: u64,
    pub name: String,
    pub normalized_name: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub age_restriction: AgeRestriction,
    pub venue_type: VenueType,
    pub upcoming_event_count: usize,
    pub total_event_count: usize,
    pub source_line_number: usize,
}

/// A canonical event. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: u64,
    pub date: chrono::NaiveDate,
    pub date_epoch_ms: i64,
    /// Headliner first.
    pub artist_ids: Vec<u64>,
    pub venue_id: u64,
    pub age_restriction: AgeRestriction,
    pub price: PriceInfo,
    pub time: TimeInfo,
    pub venue_type: VenueType,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub source_line_number: usize,
}
