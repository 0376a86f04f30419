use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use showlist_etl::config::PipelineConfig;
use showlist_etl::diagnostics::WarningKind;
use showlist_etl::pipeline::chunker::EventChunk;
use showlist_etl::pipeline::orchestrator::{run, PipelineOutcome, RunOptions};

const EVENTS_FIXTURE: &str = "\
aug 15 fri
The Strokes
at the Fox Theater, Oakland a/a $50.60 7pm/8pm #

aug 15 fri
The Strokes
at the Fox Theater, Oakland a/a $50.60 7pm/8pm #

aug 16 sat
Interpol, the strokes
at Bottom of the Hill, sf 21+ $15 9pm

sep 1 sun
Sleater-Kinney
at Ashkenaz, Berkeley free 8pm (reggae night)

sep 2 mon
Band Without Venue
";

const VENUES_FIXTURE: &str = "\
Fox Theater, 1807 Telegraph Ave, Oakland, a/a, 510-302-2250
Bottom of the Hill, 1233 17th St, sf, 21+
OnlyAName
";

fn reference_instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-08-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn write_fixtures(root: &Path) -> Result<()> {
    fs::write(root.join("events.txt"), EVENTS_FIXTURE)?;
    fs::write(root.join("venues.txt"), VENUES_FIXTURE)?;
    Ok(())
}

fn fixture_config(root: &Path, output: &str) -> PipelineConfig {
    PipelineConfig {
        events_file: root.join("events.txt").to_string_lossy().to_string(),
        venues_file: root.join("venues.txt").to_string_lossy().to_string(),
        output_dir: root.join(output).to_string_lossy().to_string(),
        ..PipelineConfig::default()
    }
}

fn run_fixture(root: &Path, output: &str) -> Result<(PipelineOutcome, PipelineConfig)> {
    write_fixtures(root)?;
    let config = fixture_config(root, output);
    let options = RunOptions {
        as_of: Some(reference_instant()),
        skip_write: false,
    };
    Ok((run(&config, &options), config))
}

#[test]
fn full_run_emits_expected_entities_and_diagnostics() -> Result<()> {
    let temp = tempdir()?;
    let (outcome, _) = run_fixture(temp.path(), "out")?;

    assert!(outcome.success);
    assert_eq!(outcome.stats.total_events, 3);
    assert_eq!(outcome.stats.total_artists, 3);
    assert_eq!(outcome.stats.total_venues, 3);
    assert_eq!(outcome.stats.total_chunks, 2);

    // One duplicate block, one dangling event block, one short venue line
    let duplicates = outcome
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::DataQuality)
        .count();
    let incomplete = outcome
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::Incomplete)
        .count();
    assert_eq!(duplicates, 1);
    assert_eq!(incomplete, 2);
    assert!(outcome.errors.is_empty());

    let manifest = outcome.manifest.expect("manifest for successful run");
    assert_eq!(manifest.total_events, 3);
    assert_eq!(manifest.chunks.events.len(), 2);
    assert_eq!(manifest.chunks.artists.record_count, 3);
    let range = manifest.date_range.expect("date range");
    assert_eq!(range.start, "2024-08-15");
    assert_eq!(range.end, "2024-09-01");
    assert_eq!(manifest.source_files.events.line_count, EVENTS_FIXTURE.lines().count());
    Ok(())
}

#[test]
fn chunks_partition_the_event_set_totally() -> Result<()> {
    let temp = tempdir()?;
    let (outcome, config) = run_fixture(temp.path(), "out")?;
    let manifest = outcome.manifest.expect("manifest");

    let mut all_ids: Vec<u64> = Vec::new();
    for info in &manifest.chunks.events {
        let bytes = fs::read(Path::new(&config.output_dir).join(&info.filename))?;
        let chunk: EventChunk = serde_json::from_slice(&bytes)?;
        assert_eq!(chunk.events.len(), info.event_count);
        for event in &chunk.events {
            let month = event.date.format("%Y-%m").to_string();
            assert_eq!(month, chunk.chunk_id);
            all_ids.push(event.id);
        }
    }
    let unique: BTreeSet<u64> = all_ids.iter().copied().collect();
    assert_eq!(unique.len(), all_ids.len());
    assert_eq!(all_ids.len(), manifest.total_events);
    Ok(())
}

#[test]
fn repeated_runs_are_byte_identical() -> Result<()> {
    let temp = tempdir()?;
    write_fixtures(temp.path())?;
    let config_a = fixture_config(temp.path(), "out-a");
    let config_b = fixture_config(temp.path(), "out-b");
    let options = RunOptions {
        as_of: Some(reference_instant()),
        skip_write: false,
    };
    let first = run(&config_a, &options);
    let second = run(&config_b, &options);
    assert!(first.success && second.success);

    for filename in [
        "manifest.json",
        "events-2024-08.json",
        "events-2024-09.json",
        "artists.json",
        "venues.json",
        "indexes.json",
        "search-documents.json",
        "search-terms.json",
    ] {
        let a = fs::read(Path::new(&config_a.output_dir).join(filename))?;
        let b = fs::read(Path::new(&config_b.output_dir).join(filename))?;
        assert_eq!(a, b, "artifact {filename} differs between runs");
    }
    Ok(())
}

#[test]
fn missing_source_file_fails_the_run() -> Result<()> {
    let temp = tempdir()?;
    let config = PipelineConfig {
        events_file: temp.path().join("nope.txt").to_string_lossy().to_string(),
        venues_file: temp.path().join("also-nope.txt").to_string_lossy().to_string(),
        output_dir: temp.path().join("out").to_string_lossy().to_string(),
        ..PipelineConfig::default()
    };
    let outcome = run(&config, &RunOptions::default());
    assert!(!outcome.success);
    assert!(outcome.manifest.is_none());
    assert_eq!(outcome.stats.total_events, 0);
    assert_eq!(outcome.errors.len(), 1);
    Ok(())
}

#[test]
fn validate_mode_writes_nothing() -> Result<()> {
    let temp = tempdir()?;
    write_fixtures(temp.path())?;
    let config = fixture_config(temp.path(), "out");
    let output_dir = temp.path().join("out");
    let options = RunOptions {
        as_of: Some(reference_instant()),
        skip_write: true,
    };
    let outcome = run(&config, &options);
    assert!(outcome.success);
    assert!(outcome.manifest.is_some());
    assert!(!output_dir.exists());
    Ok(())
}
