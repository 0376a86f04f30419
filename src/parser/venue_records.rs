//! Parsing of the venues file: one comma-delimited venue per line.
//!
//! `name, address[, city][, age][, extra...][, phone]` — age restriction and
//! phone are located anywhere in the trailing fields by pattern, never by
//! column position.

use crate::constants::canonical_city;
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::domain::AgeRestriction;
use crate::parser::{find_age_restriction, find_phone};

/// One venue listing, still unvalidated text.
#[derive(Debug, Clone)]
pub struct RawVenueRecord {
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub age_restriction: Option<AgeRestriction>,
    pub phone: Option<String>,
    pub line_number: usize,
}

pub fn parse_venue_records(text: &str, diagnostics: &mut Diagnostics) -> Vec<RawVenueRecord> {
    let mut records = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if fields.len() < 2 || fields[0].is_empty() || fields[1].is_empty() {
            diagnostics.warning(
                WarningKind::Incomplete,
                "venue record needs at least 'name, address'",
                Some(line_number),
                Some(trimmed),
            );
            continue;
        }

        let mut city = None;
        let mut age_restriction = None;
        let mut phone = None;
        for field in &fields[2..] {
            if phone.is_none() {
                if let Some(number) = find_phone(field) {
                    phone = Some(number.to_string());
                    continue;
                }
            }
            if age_restriction.is_none() {
                if let Some((restriction, _)) = find_age_restriction(field) {
                    age_restriction = Some(restriction);
                    continue;
                }
            }
            if city.is_none() && !field.is_empty() {
                city = Some(canonical_city(field));
            }
        }

        records.push(RawVenueRecord {
            name: fields[0].to_string(),
            address: fields[1].to_string(),
            city,
            age_restriction,
            phone,
            line_number,
        });
    }

    records
}
