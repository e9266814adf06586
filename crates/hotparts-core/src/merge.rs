//! Merge engine: fold a batch of normalized records into the historical
//! store, adding only records whose identity key is not already present.
//!
//! Per batch:
//!   1. validate each record (invalid ones are skipped, never fatal)
//!   2. drop in-batch repeats of a key (first occurrence wins)
//!   3. drop records whose key the store already holds
//!   4. append the survivors in chunks, one transaction per chunk
//!
//! Every record that enters ends up in exactly one of `added` or `skipped`.

use std::{collections::HashSet, fmt, future::Future};

use crate::{
  error::{MergeError, ValidationError},
  record::{DemandRecord, Keyed, RecordKind, SupplyRecord},
  store::{AppendOutcome, HistoricalStore},
};

/// Chunk size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

// ─── Report ──────────────────────────────────────────────────────────────────

/// Why a record was not added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
  /// The store already held a record with this key.
  AlreadyStored,
  /// An earlier record in the same batch had this key.
  RepeatedInBatch,
  Invalid(ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped<R> {
  pub record: R,
  pub reason: SkipReason,
}

/// Accounting for one merge call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport<R> {
  pub seen:    usize,
  pub added:   Vec<R>,
  pub skipped: Vec<Skipped<R>>,
}

impl<R> Default for MergeReport<R> {
  fn default() -> Self { Self { seen: 0, added: Vec::new(), skipped: Vec::new() } }
}

impl<R> MergeReport<R> {
  pub fn added_count(&self) -> usize { self.added.len() }

  pub fn skipped_count(&self) -> usize { self.skipped.len() }

  /// Skipped records that failed validation.
  pub fn invalid_count(&self) -> usize {
    self
      .skipped
      .iter()
      .filter(|s| matches!(s.reason, SkipReason::Invalid(_)))
      .count()
  }

  /// Skipped records whose key was already known.
  pub fn duplicate_count(&self) -> usize {
    self.skipped_count() - self.invalid_count()
  }

  fn skip(&mut self, record: R, reason: SkipReason) {
    self.skipped.push(Skipped { record, reason });
  }
}

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
  /// Records per store transaction. Zero is treated as one.
  pub chunk_size: usize,
}

impl Default for MergeOptions {
  fn default() -> Self { Self { chunk_size: DEFAULT_CHUNK_SIZE } }
}

// ─── Mergeable ───────────────────────────────────────────────────────────────

/// A record kind the merge engine can fold into a [`HistoricalStore`].
pub trait Mergeable: Keyed + Clone + fmt::Debug + Send + Sync + 'static {
  const KIND: RecordKind;

  /// Minimal validity: a non-empty part identifier.
  fn validate(&self) -> Result<(), ValidationError> {
    if self.mpn().trim().is_empty() {
      return Err(ValidationError::EmptyPartId);
    }
    Ok(())
  }

  fn contains<S: HistoricalStore>(
    store: &S,
    key: Self::Key,
  ) -> impl Future<Output = Result<bool, S::Error>> + Send + '_;

  fn append<S: HistoricalStore>(
    store: &S,
    records: Vec<Self>,
  ) -> impl Future<Output = Result<AppendOutcome<Self>, S::Error>> + Send + '_;
}

impl Mergeable for DemandRecord {
  const KIND: RecordKind = RecordKind::Demand;

  fn contains<S: HistoricalStore>(
    store: &S,
    key: Self::Key,
  ) -> impl Future<Output = Result<bool, S::Error>> + Send + '_ {
    store.contains_demand(key)
  }

  fn append<S: HistoricalStore>(
    store: &S,
    records: Vec<Self>,
  ) -> impl Future<Output = Result<AppendOutcome<Self>, S::Error>> + Send + '_ {
    store.append_demand(records)
  }
}

impl Mergeable for SupplyRecord {
  const KIND: RecordKind = RecordKind::Supply;

  fn contains<S: HistoricalStore>(
    store: &S,
    key: Self::Key,
  ) -> impl Future<Output = Result<bool, S::Error>> + Send + '_ {
    store.contains_supply(key)
  }

  fn append<S: HistoricalStore>(
    store: &S,
    records: Vec<Self>,
  ) -> impl Future<Output = Result<AppendOutcome<Self>, S::Error>> + Send + '_ {
    store.append_supply(records)
  }
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Merge `batch` into `store`.
///
/// Re-merging the same batch adds nothing. On a store fault the error
/// carries the report of everything committed before it; chunks that were
/// not committed leave no trace in the store.
pub async fn merge<S, R>(
  store: &S,
  batch: impl IntoIterator<Item = R>,
  options: &MergeOptions,
) -> Result<MergeReport<R>, MergeError<R, S::Error>>
where
  S: HistoricalStore,
  R: Mergeable,
{
  let mut report = MergeReport::default();
  let mut keys = HashSet::new();
  let mut candidates = Vec::new();

  for record in batch {
    report.seen += 1;
    if let Err(e) = record.validate() {
      report.skip(record, SkipReason::Invalid(e));
      continue;
    }
    if !keys.insert(record.key()) {
      report.skip(record, SkipReason::RepeatedInBatch);
      continue;
    }
    candidates.push(record);
  }

  let mut fresh = Vec::with_capacity(candidates.len());
  for record in candidates {
    match R::contains(store, record.key()).await {
      Ok(true) => report.skip(record, SkipReason::AlreadyStored),
      Ok(false) => fresh.push(record),
      Err(source) => return Err(MergeError { committed: report, source }),
    }
  }

  for chunk in fresh.chunks(options.chunk_size.max(1)) {
    match R::append(store, chunk.to_vec()).await {
      Ok(outcome) => {
        report.added.extend(outcome.inserted);
        for record in outcome.skipped {
          report.skip(record, SkipReason::AlreadyStored);
        }
      }
      Err(source) => {
        tracing::warn!(
          kind = %R::KIND,
          committed = report.added.len(),
          "store write failed mid-merge"
        );
        return Err(MergeError { committed: report, source });
      }
    }
  }

  tracing::debug!(
    kind = %R::KIND,
    seen = report.seen,
    added = report.added.len(),
    skipped = report.skipped.len(),
    "merged batch"
  );

  Ok(report)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
