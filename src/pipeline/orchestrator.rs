//! Stage sequencing for the full ETL run.
//!
//! Per-record failures never abort the run; they accumulate as diagnostics.
//! Only file-level failures (or an internal serialization failure) are
//! critical, producing an outcome with `success: false` and no manifest.

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument};

use crate::config::PipelineConfig;
use crate::diagnostics::{Diagnostics, ErrorKind, PipelineError, PipelineWarning};
use crate::error::Result;
use crate::pipeline::artifacts::{
    emit_artifacts, read_source, write_manifest, DateRange, Manifest, SourceFiles,
};
use crate::pipeline::chunker::chunk_events;
use crate::pipeline::indexer::build_indexes;
use crate::pipeline::normalize::{normalize_records, recount_upcoming, EntityStore};
use crate::pipeline::search::build_search_index;
use crate::parser::event_blocks::parse_event_blocks;
use crate::parser::venue_records::parse_venue_records;

/// Options that vary per invocation rather than per deployment.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Reference instant for year inference and "upcoming" counts; defaults
    /// to wall-clock now. Pinning it makes runs reproducible.
    pub as_of: Option<DateTime<Utc>>,
    /// Skip artifact writing (validate/stats runs still compute everything).
    pub skip_write: bool,
}

/// Summary counters reported at the end of a run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub total_events: usize,
    pub total_artists: usize,
    pub total_venues: usize,
    pub total_chunks: usize,
    pub validation_errors: usize,
    pub validation_warnings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// Everything a caller learns about a run.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub success: bool,
    pub stats: PipelineStats,
    pub manifest: Option<Manifest>,
    pub errors: Vec<PipelineError>,
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineOutcome {
    fn failed(diagnostics: Diagnostics) -> Self {
        Self {
            success: false,
            stats: PipelineStats {
                validation_errors: diagnostics.errors.len(),
                validation_warnings: diagnostics.warnings.len(),
                ..PipelineStats::default()
            },
            manifest: None,
            errors: diagnostics.errors,
            warnings: diagnostics.warnings,
        }
    }
}

/// Run the full pipeline over the configured source files.
#[instrument(skip_all)]
pub fn run(config: &PipelineConfig, options: &RunOptions) -> PipelineOutcome {
    let started = Instant::now();
    let now = options.as_of.unwrap_or_else(Utc::now);
    let today = now.date_naive();
    let reference_epoch_ms = now.timestamp_millis();
    counter!("showlist_pipeline_runs_total").increment(1);
    info!("🚀 Starting ETL run (reference instant {})", now.to_rfc3339());

    let mut diagnostics = Diagnostics::new();

    // Stage 1: read both source files; either failing is fatal
    let (events_text, events_source) = match read_source(&config.events_file) {
        Ok(read) => read,
        Err(e) => {
            error!("failed to read events file '{}': {}", config.events_file, e);
            diagnostics.error(
                ErrorKind::Critical,
                format!("cannot read events file '{}': {e}", config.events_file),
                None,
                None,
            );
            return PipelineOutcome::failed(diagnostics);
        }
    };
    let (venues_text, venues_source) = match read_source(&config.venues_file) {
        Ok(read) => read,
        Err(e) => {
            error!("failed to read venues file '{}': {}", config.venues_file, e);
            diagnostics.error(
                ErrorKind::Critical,
                format!("cannot read venues file '{}': {e}", config.venues_file),
                None,
                None,
            );
            return PipelineOutcome::failed(diagnostics);
        }
    };

    // Stage 2: segment raw records
    let t_parse = Instant::now();
    let raw_venues = parse_venue_records(&venues_text, &mut diagnostics);
    let raw_events = parse_event_blocks(&events_text, &mut diagnostics);
    histogram!("showlist_stage_duration_seconds", "stage" => "parse")
        .record(t_parse.elapsed().as_secs_f64());
    info!(
        "📄 Segmented {} event blocks and {} venue records",
        raw_events.len(),
        raw_venues.len()
    );

    // Stage 3: normalize into canonical entities
    let t_normalize = Instant::now();
    let mut store = EntityStore::new();
    let mut events = normalize_records(
        &raw_venues,
        &raw_events,
        &mut store,
        &mut diagnostics,
        today,
        config.max_cobilled_artists,
    );
    events.sort_by_key(|e| (e.date_epoch_ms, e.id));
    let (mut artists, mut venues) = store.into_entities();
    histogram!("showlist_stage_duration_seconds", "stage" => "normalize")
        .record(t_normalize.elapsed().as_secs_f64());
    counter!("showlist_events_emitted_total").increment(events.len() as u64);
    counter!("showlist_records_rejected_total").increment(diagnostics.errors.len() as u64);
    info!(
        "✅ Normalized {} events, {} artists, {} venues ({} errors, {} warnings)",
        events.len(),
        artists.len(),
        venues.len(),
        diagnostics.errors.len(),
        diagnostics.warnings.len()
    );

    // Stage 4: full recount so entity counts agree with the final event set
    recount_upcoming(&mut artists, &mut venues, &events, reference_epoch_ms);

    // Stages 5-7: derived views
    let t_derive = Instant::now();
    let indexes = build_indexes(&events, &artists, &venues, reference_epoch_ms);
    let chunks = match chunk_events(&events) {
        Ok(chunks) => chunks,
        Err(e) => {
            diagnostics.error(ErrorKind::Critical, format!("chunking failed: {e}"), None, None);
            return PipelineOutcome::failed(diagnostics);
        }
    };
    let search = build_search_index(&events, &artists, &venues);
    histogram!("showlist_stage_duration_seconds", "stage" => "derive")
        .record(t_derive.elapsed().as_secs_f64());

    // Stage 8: artifacts and manifest
    let output_dir = (!options.skip_write).then(|| Path::new(&config.output_dir));
    let manifest = match build_manifest(
        config,
        output_dir,
        &chunks,
        &artists,
        &venues,
        &indexes,
        &search,
        &events_source,
        &venues_source,
        now,
        events.len(),
    ) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("artifact emission failed: {}", e);
            diagnostics.error(
                ErrorKind::Critical,
                format!("artifact emission failed: {e}"),
                None,
                None,
            );
            return PipelineOutcome::failed(diagnostics);
        }
    };

    let date_range = events.first().zip(events.last()).map(|(first, last)| DateRange {
        start: first.date.format("%Y-%m-%d").to_string(),
        end: last.date.format("%Y-%m-%d").to_string(),
    });
    let stats = PipelineStats {
        total_events: events.len(),
        total_artists: artists.len(),
        total_venues: venues.len(),
        total_chunks: chunks.len(),
        validation_errors: diagnostics.errors.len(),
        validation_warnings: diagnostics.warnings.len(),
        date_range,
    };

    histogram!("showlist_pipeline_duration_seconds").record(started.elapsed().as_secs_f64());
    info!(
        "🏁 Run complete: {} events across {} chunks in {:.2}s",
        stats.total_events,
        stats.total_chunks,
        started.elapsed().as_secs_f64()
    );

    PipelineOutcome {
        success: true,
        stats,
        manifest: Some(manifest),
        errors: diagnostics.errors,
        warnings: diagnostics.warnings,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_manifest(
    config: &PipelineConfig,
    output_dir: Option<&Path>,
    chunks: &[crate::pipeline::chunker::ChunkedEvents],
    artists: &[crate::domain::Artist],
    venues: &[crate::domain::Venue],
    indexes: &crate::pipeline::indexer::DatasetIndexes,
    search: &crate::pipeline::search::SearchIndex,
    events_source: &crate::pipeline::artifacts::SourceFileInfo,
    venues_source: &crate::pipeline::artifacts::SourceFileInfo,
    now: DateTime<Utc>,
    total_events: usize,
) -> Result<Manifest> {
    let manifest_chunks = emit_artifacts(output_dir, chunks, artists, venues, indexes, search)?;

    let date_range = chunks.first().zip(chunks.last()).map(|(first, last)| DateRange {
        start: first.chunk.events[0].date.format("%Y-%m-%d").to_string(),
        end: last.chunk.events[last.chunk.events.len() - 1]
            .date
            .format("%Y-%m-%d")
            .to_string(),
    });

    let manifest = Manifest {
        version: env!("CARGO_PKG_VERSION").to_string(),
        dataset_version: config.dataset_version.clone(),
        last_updated: now.to_rfc3339(),
        total_events,
        total_artists: artists.len(),
        total_venues: venues.len(),
        date_range,
        chunks: manifest_chunks,
        processed_at: now.to_rfc3339(),
        source_files: SourceFiles {
            events: events_source.clone(),
            venues: venues_source.clone(),
        },
        schema_version: crate::constants::SCHEMA_VERSION.to_string(),
    };

    if let Some(dir) = output_dir {
        write_manifest(dir, &manifest)?;
    }
    Ok(manifest)
}
