//! Output artifact serialization and the manifest that ties them together.
//!
//! Every artifact records enough metadata (size, checksum, counts) for the
//! downstream application to verify integrity without reparsing, and the
//! manifest records the same provenance for the two source files.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::info;

use crate::constants::{
    ARTISTS_FILE, INDEXES_FILE, MANIFEST_FILE, SEARCH_DOCUMENTS_FILE, SEARCH_TERMS_FILE,
    VENUES_FILE,
};
use crate::domain::{Artist, Venue};
use crate::error::Result;
use crate::pipeline::chunker::ChunkedEvents;
use crate::pipeline::indexer::DatasetIndexes;
use crate::pipeline::search::SearchIndex;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Integrity metadata for one non-chunk artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub filename: String,
    pub size: u64,
    pub checksum: String,
    pub record_count: usize,
}

/// Integrity metadata for one monthly event chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    pub filename: String,
    pub size: u64,
    pub checksum: String,
    pub event_count: usize,
}

/// Provenance for one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileInfo {
    pub filename: String,
    pub size: u64,
    pub last_modified: i64,
    pub line_count: usize,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFiles {
    pub events: SourceFileInfo,
    pub venues: SourceFileInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestChunks {
    pub events: Vec<ChunkInfo>,
    pub artists: FileInfo,
    pub venues: FileInfo,
    pub indexes: FileInfo,
}

/// `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub dataset_version: String,
    pub last_updated: String,
    pub total_events: usize,
    pub total_artists: usize,
    pub total_venues: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub chunks: ManifestChunks,
    pub processed_at: String,
    pub source_files: SourceFiles,
    pub schema_version: String,
}

/// Read a source file along with its provenance record. The caller treats a
/// failure here as critical.
pub fn read_source(path: &str) -> Result<(String, SourceFileInfo)> {
    let content = fs::read_to_string(path)?;
    let metadata = fs::metadata(path)?;
    let last_modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    let info = SourceFileInfo {
        filename: Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string()),
        size: metadata.len(),
        last_modified,
        line_count: content.lines().count(),
        checksum: sha256_hex(content.as_bytes()),
    };
    Ok((content, info))
}

fn write_artifact(output_dir: Option<&Path>, filename: &str, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = output_dir {
        fs::write(dir.join(filename), bytes)?;
    }
    Ok(())
}

/// Serialize every artifact, returning the manifest chunk metadata. When
/// `output_dir` is given the files are written; otherwise only the metadata
/// is computed (validate/stats runs).
pub fn emit_artifacts(
    output_dir: Option<&Path>,
    chunks: &[ChunkedEvents],
    artists: &[Artist],
    venues: &[Venue],
    indexes: &DatasetIndexes,
    search: &SearchIndex,
) -> Result<ManifestChunks> {
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)?;
    }

    let mut chunk_infos = Vec::with_capacity(chunks.len());
    for chunked in chunks {
        let filename = format!("events-{}.json", chunked.chunk.chunk_id);
        let bytes = serde_json::to_vec_pretty(&chunked.chunk)?;
        write_artifact(output_dir, &filename, &bytes)?;
        chunk_infos.push(ChunkInfo {
            filename,
            size: bytes.len() as u64,
            checksum: chunked.checksum.clone(),
            event_count: chunked.chunk.events.len(),
        });
    }

    let artists_bytes = serde_json::to_vec_pretty(artists)?;
    write_artifact(output_dir, ARTISTS_FILE, &artists_bytes)?;
    let venues_bytes = serde_json::to_vec_pretty(venues)?;
    write_artifact(output_dir, VENUES_FILE, &venues_bytes)?;
    let indexes_bytes = serde_json::to_vec_pretty(indexes)?;
    write_artifact(output_dir, INDEXES_FILE, &indexes_bytes)?;

    let documents_bytes = serde_json::to_vec_pretty(&search.documents)?;
    write_artifact(output_dir, SEARCH_DOCUMENTS_FILE, &documents_bytes)?;
    let terms_bytes = serde_json::to_vec_pretty(&search.terms)?;
    write_artifact(output_dir, SEARCH_TERMS_FILE, &terms_bytes)?;

    if let Some(dir) = output_dir {
        info!("💾 Wrote {} artifacts to {}", chunk_infos.len() + 5, dir.display());
    }

    let indexed_events: usize = indexes.events_by_date.values().map(Vec::len).sum();
    Ok(ManifestChunks {
        events: chunk_infos,
        artists: FileInfo {
            filename: ARTISTS_FILE.to_string(),
            size: artists_bytes.len() as u64,
            checksum: sha256_hex(&artists_bytes),
            record_count: artists.len(),
        },
        venues: FileInfo {
            filename: VENUES_FILE.to_string(),
            size: venues_bytes.len() as u64,
            checksum: sha256_hex(&venues_bytes),
            record_count: venues.len(),
        },
        indexes: FileInfo {
            filename: INDEXES_FILE.to_string(),
            size: indexes_bytes.len() as u64,
            checksum: sha256_hex(&indexes_bytes),
            record_count: indexed_events,
        },
    })
}

pub fn write_manifest(output_dir: &Path, manifest: &Manifest) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(manifest)?;
    fs::write(output_dir.join(MANIFEST_FILE), bytes)?;
    Ok(())
}
