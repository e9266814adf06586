//! Error types for `hotparts-core`.

use thiserror::Error;

use crate::merge::MergeReport;

/// A sheet that cannot be read as data. The sheet is skipped; sibling
/// sheets and documents are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
  #[error("sheet {sheet:?} in {document:?} has no MPN column")]
  MissingPartColumn { document: String, sheet: String },

  #[error(
    "sheet {sheet:?} in {document:?} has no YYYY.MM.DD period in its name or \
     the document name"
  )]
  MissingPeriod { document: String, sheet: String },
}

/// A single record that fails minimal validity. The record is dropped; the
/// rest of the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("part identifier is empty")]
  EmptyPartId,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Schema(#[from] SchemaError),

  #[error("invalid sample request: {0}")]
  InvalidSampleRequest(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The store failed while the merge engine was committing a batch.
///
/// `committed` holds every record that was durably written before the
/// fault; nothing else from the batch was stored.
#[derive(Debug, Error)]
#[error("store write failed after {} records were committed: {source}", .committed.added.len())]
pub struct MergeError<R, E>
where
  R: std::fmt::Debug,
  E: std::error::Error + 'static,
{
  pub committed: MergeReport<R>,
  #[source]
  pub source:    E,
}

/// Failure of a whole-document ingest. Schema and validation problems are
/// never surfaced here; they are recovered and reported in the outcome.
#[derive(Debug, Error)]
pub enum IngestError<E>
where
  E: std::error::Error + 'static,
{
  #[error("store error: {0}")]
  Store(#[source] E),

  #[error(
    "store error in {filename:?} after {committed} records were committed: \
     {source}"
  )]
  Merge {
    filename:  String,
    committed: usize,
    #[source]
    source:    E,
  },
}
