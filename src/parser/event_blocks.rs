//! Segmentation of the events file into raw record blocks.
//!
//! A block is one date line, one or more artist continuation lines, and a
//! venue line opening with "at ". The venue line may share a physical line
//! with the artist text; blank lines separate blocks but never terminate
//! them. A block still missing its venue line when the next date line or
//! end-of-file arrives is incomplete and produces a warning, not a record.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::diagnostics::{Diagnostics, WarningKind};
use crate::temporal::is_date_line;

static INLINE_AT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+at\s+").unwrap());

/// One segmented event block, still unvalidated text.
#[derive(Debug, Clone)]
pub struct RawEventRecord {
    pub date_line: String,
    pub artist_line: String,
    pub venue_line: String,
    pub raw_text: String,
    pub line_number: usize,
}

struct OpenBlock {
    date_line: String,
    line_number: usize,
    artist_lines: Vec<String>,
    venue_line: Option<String>,
    raw_lines: Vec<String>,
}

impl OpenBlock {
    fn new(date_line: &str, line_number: usize) -> Self {
        Self {
            date_line: date_line.trim().to_string(),
            line_number,
            artist_lines: Vec::new(),
            venue_line: None,
            raw_lines: vec![date_line.to_string()],
        }
    }

    fn finish(self, records: &mut Vec<RawEventRecord>, diagnostics: &mut Diagnostics) {
        let raw_text = self.raw_lines.join("\n");
        match self.venue_line {
            Some(venue_line) => records.push(RawEventRecord {
                date_line: self.date_line,
                artist_line: self.artist_lines.join(", "),
                venue_line,
                raw_text,
                line_number: self.line_number,
            }),
            None => diagnostics.warning(
                WarningKind::Incomplete,
                "event block has no venue line",
                Some(self.line_number),
                Some(&raw_text),
            ),
        }
    }
}

/// Split an artist line at an inline " at " boundary when the tail looks
/// like a venue line (it must carry a comma-separated city to qualify).
fn split_inline_venue(line: &str) -> Option<(String, String)> {
    for m in INLINE_AT_RE.find_iter(line) {
        let tail = &line[m.end()..];
        if tail.contains(',') {
            let head = line[..m.start()].trim().to_string();
            return Some((head, format!("at {}", tail.trim())));
        }
    }
    None
}

pub fn parse_event_blocks(text: &str, diagnostics: &mut Diagnostics) -> Vec<RawEventRecord> {
    let mut records = Vec::new();
    let mut open: Option<OpenBlock> = None;

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();

        // Blank lines separate blocks but do not close them
        if trimmed.is_empty() {
            continue;
        }

        if is_date_line(trimmed) {
            if let Some(block) = open.take() {
                block.finish(&mut records, diagnostics);
            }
            open = Some(OpenBlock::new(trimmed, line_number));
            continue;
        }

        let Some(block) = open.as_mut() else {
            diagnostics.warning(
                WarningKind::Format,
                "line outside of any event block",
                Some(line_number),
                Some(trimmed),
            );
            continue;
        };

        if block.venue_line.is_some() {
            diagnostics.warning(
                WarningKind::Format,
                "unexpected text after a completed event block",
                Some(line_number),
                Some(trimmed),
            );
            continue;
        }

        block.raw_lines.push(line.to_string());
        let lowered = trimmed.get(..3).map(str::to_lowercase);
        if lowered.as_deref() == Some("at ") {
            block.venue_line = Some(trimmed.to_string());
        } else if let Some((artists, venue)) = split_inline_venue(trimmed) {
            if !artists.is_empty() {
                block.artist_lines.push(artists);
            }
            block.venue_line = Some(venue);
        } else {
            block.artist_lines.push(trimmed.to_string());
        }
    }

    if let Some(block) = open.take() {
        block.finish(&mut records, diagnostics);
    }

    debug!(records = records.len(), "segmented event blocks");
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (Vec<RawEventRecord>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let records = parse_event_blocks(text, &mut diagnostics);
        (records, diagnostics)
    }

    #[test]
    fn segments_a_simple_block() {
        let (records, diagnostics) = parse(
            "aug 15 fri\nThe Strokes\nat the Fox Theater, Oakland a/a $50 7pm/8pm #\n",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_line, "aug 15 fri");
        assert_eq!(records[0].artist_line, "The Strokes");
        assert!(records[0].venue_line.starts_with("at the Fox Theater"));
        assert_eq!(records[0].line_number, 1);
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn joins_artist_continuation_lines() {
        let (records, _) = parse(
            "aug 15 fri\nThe Strokes\nInterpol\nat the Fox Theater, Oakland $50\n",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].artist_line, "The Strokes, Interpol");
    }

    #[test]
    fn splits_inline_venue_from_artist_line() {
        let (records, _) = parse("aug 15 fri\nThe Strokes at the Fox Theater, Oakland $50\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].artist_line, "The Strokes");
        assert_eq!(records[0].venue_line, "at the Fox Theater, Oakland $50");
    }

    #[test]
    fn blank_lines_are_separators_not_boundaries() {
        let (records, diagnostics) = parse(
            "aug 15 fri\nThe Strokes\n\nat the Fox Theater, Oakland $50\n\n\naug 16 sat\nInterpol\nat Bottom of the Hill, sf $15\n",
        );
        assert_eq!(records.len(), 2);
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn dangling_block_at_eof_warns_incomplete() {
        let (records, diagnostics) = parse("aug 15 fri\nThe Strokes\n");
        assert!(records.is_empty());
        assert_eq!(diagnostics.warning_count_of(WarningKind::Incomplete), 1);
    }

    #[test]
    fn block_without_venue_before_next_date_warns_incomplete() {
        let (records, diagnostics) = parse(
            "aug 15 fri\nThe Strokes\naug 16 sat\nInterpol\nat Bottom of the Hill, sf $15\n",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].artist_line, "Interpol");
        assert_eq!(diagnostics.warning_count_of(WarningKind::Incomplete), 1);
    }

    #[test]
    fn empty_artist_line_still_produces_a_record() {
        // Validation of missing artists happens during normalization
        let (records, _) = parse("aug 15 fri\nat the Fox Theater, Oakland $50\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].artist_line, "");
    }

    #[test]
    fn text_outside_blocks_is_flagged() {
        let (records, diagnostics) = parse("random preamble\naug 15 fri\nBand\nat Venue, sf $5\n");
        assert_eq!(records.len(), 1);
        assert_eq!(diagnostics.warning_count_of(WarningKind::Format), 1);
    }
}
