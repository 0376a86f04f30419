//! Per-record diagnostics collected across the run.
//!
//! Errors mean a record was rejected; warnings mean it was accepted but
//! flagged for review. Neither aborts the run — only a `Critical` error
//! does, and that is raised by the orchestrator for file-level failures.

use serde::{Deserialize, Serialize};

/// Why a record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Structurally invalid record (e.g. zero artists)
    Validation,
    /// A field failed to parse and the record could not be kept
    Data,
    /// File-level failure; aborts the run
    Critical,
}

/// Why an accepted record was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    #[serde(rename = "format")]
    Format,
    #[serde(rename = "incomplete")]
    Incomplete,
    #[serde(rename = "data-quality")]
    DataQuality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineWarning {
    pub kind: WarningKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

/// Accumulator threaded through every stage of the run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub errors: Vec<PipelineError>,
    pub warnings: Vec<PipelineWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(
        &mut self,
        kind: ErrorKind,
        message: impl Into<String>,
        line_number: Option<usize>,
        raw_text: Option<&str>,
    ) {
        self.errors.push(PipelineError {
            kind,
            message: message.into(),
            line_number,
            raw_text: raw_text.map(str::to_string),
        });
    }

    pub fn warning(
        &mut self,
        kind: WarningKind,
        message: impl Into<String>,
        line_number: Option<usize>,
        raw_text: Option<&str>,
    ) {
        self.warnings.push(PipelineWarning {
            kind,
            message: message.into(),
            line_number,
            raw_text: raw_text.map(str::to_string),
        });
    }

    pub fn has_critical(&self) -> bool {
        self.errors.iter().any(|e| e.kind == ErrorKind::Critical)
    }

    pub fn warning_count_of(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}
