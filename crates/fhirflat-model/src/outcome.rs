use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Furthest stage a document reached before it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStage {
    Read,
    Decoded,
    Validated,
    Extracted,
    Persisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The first entry is not a Patient resource.
    NotAPatientBundle,
    /// The patient's unique id is already stored.
    Duplicate,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NotAPatientBundle => "not a patient bundle",
            SkipReason::Duplicate => "already ingested",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DocumentStatus {
    Persisted,
    Skipped { reason: SkipReason },
    Failed { message: String },
}

/// Settled result of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub source_id: String,
    pub stage: DocumentStage,
    pub status: DocumentStatus,
    /// Child rows that could not be stored; the patient row is kept.
    pub child_failures: Vec<String>,
    /// Sub-elements dropped during extraction.
    pub skipped_elements: usize,
}

impl DocumentOutcome {
    pub fn persisted(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            stage: DocumentStage::Persisted,
            status: DocumentStatus::Persisted,
            child_failures: Vec::new(),
            skipped_elements: 0,
        }
    }

    pub fn skipped(source_id: impl Into<String>, stage: DocumentStage, reason: SkipReason) -> Self {
        Self {
            source_id: source_id.into(),
            stage,
            status: DocumentStatus::Skipped { reason },
            child_failures: Vec::new(),
            skipped_elements: 0,
        }
    }

    pub fn failed(
        source_id: impl Into<String>,
        stage: DocumentStage,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            stage,
            status: DocumentStatus::Failed {
                message: message.into(),
            },
            child_failures: Vec::new(),
            skipped_elements: 0,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self.status, DocumentStatus::Persisted)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, DocumentStatus::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, DocumentStatus::Failed { .. })
    }
}

/// End-of-batch counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[DocumentOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.status {
                DocumentStatus::Persisted => summary.persisted += 1,
                DocumentStatus::Skipped { .. } => summary.skipped += 1,
                DocumentStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// An event or patient the exporter could not write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFailure {
    pub subject: String,
    pub message: String,
}

/// Counts and failures of one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub patients: usize,
    pub summary_files: usize,
    pub event_files: usize,
    pub failures: Vec<ExportFailure>,
}

impl ExportSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
