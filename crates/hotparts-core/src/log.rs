//! The processing log: an append-only audit trail with one entry per
//! ingested document.
//!
//! Entries are never updated or deleted. Together with the merge counts they
//! make every record that entered the engine accountable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::RecordKind;

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
  /// At least one new record was added, or the document was empty.
  Success,
  /// Every record seen was already known; nothing was added.
  Duplicate,
  /// No sheet was usable, or the store failed mid-document.
  Error,
}

impl ProcessingStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Duplicate => "duplicate",
      Self::Error => "error",
    }
  }

  pub fn is_error(self) -> bool { matches!(self, Self::Error) }
}

/// A single audit-trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
  pub entry_id:    Uuid,
  pub filename:    String,
  pub kind:        RecordKind,
  pub status:      ProcessingStatus,
  /// Records produced by the normalizer.
  pub seen:        usize,
  pub added:       usize,
  /// Records skipped as duplicates or rejected by validation.
  pub skipped:     usize,
  /// Subset of `skipped` rejected by validation.
  pub invalid:     usize,
  /// Match rows added by the refresh that followed the merge.
  pub matches:     usize,
  /// SHA-256 of the document bytes, when the caller computed one.
  pub fingerprint: Option<String>,
  pub error:       Option<String>,
  pub recorded_at: DateTime<Utc>,
}

impl ProcessingLogEntry {
  /// A fresh entry with zero counts and the current timestamp.
  pub fn new(
    filename: impl Into<String>,
    kind: RecordKind,
    status: ProcessingStatus,
  ) -> Self {
    Self {
      entry_id: Uuid::new_v4(),
      filename: filename.into(),
      kind,
      status,
      seen: 0,
      added: 0,
      skipped: 0,
      invalid: 0,
      matches: 0,
      fingerprint: None,
      error: None,
      recorded_at: Utc::now(),
    }
  }
}
