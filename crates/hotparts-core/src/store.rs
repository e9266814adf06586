//! The `HistoricalStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `hotparts-store-sqlite`). The merge engine, matcher and ingest pipeline
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  log::ProcessingLogEntry,
  record::{DemandKey, DemandRecord, MatchRecord, SupplyKey, SupplyRecord},
  summary::PartSummaries,
};

// ─── Supporting types ────────────────────────────────────────────────────────

/// Result of an append: which records were written and which were skipped
/// because their identity key was already present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome<R> {
  pub inserted: Vec<R>,
  pub skipped:  Vec<R>,
}

impl<R> Default for AppendOutcome<R> {
  fn default() -> Self { Self { inserted: Vec::new(), skipped: Vec::new() } }
}

/// Table-level counts, as returned by [`HistoricalStore::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
  pub demand_records:       usize,
  pub supply_records:       usize,
  pub matches:              usize,
  pub log_entries:          usize,
  pub distinct_demand_mpns: usize,
  pub distinct_supply_mpns: usize,
  pub distinct_match_mpns:  usize,
  /// Lowest and highest demand period label, if any demand exists.
  pub period_range:         Option<(String, String)>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a historical store backend.
///
/// Demand and supply writes are append-only and atomic per call: either the
/// whole batch (minus key collisions) is written, or none of it is. The
/// match table is a materialized view the store holds but never derives
/// itself.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait HistoricalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Membership ────────────────────────────────────────────────────────

  fn contains_demand(
    &self,
    key: DemandKey,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn contains_supply(
    &self,
    key: SupplyKey,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Append-only writes ────────────────────────────────────────────────

  /// Insert every record whose key is not yet stored, in one transaction.
  /// Colliding records are returned in `skipped`; their stored twin gets its
  /// `updated_at` bumped.
  fn append_demand(
    &self,
    records: Vec<DemandRecord>,
  ) -> impl Future<Output = Result<AppendOutcome<DemandRecord>, Self::Error>>
  + Send
  + '_;

  /// See [`HistoricalStore::append_demand`].
  fn append_supply(
    &self,
    records: Vec<SupplyRecord>,
  ) -> impl Future<Output = Result<AppendOutcome<SupplyRecord>, Self::Error>>
  + Send
  + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Every demand record, in insertion order.
  fn all_demand(
    &self,
  ) -> impl Future<Output = Result<Vec<DemandRecord>, Self::Error>> + Send + '_;

  /// Every supply record, in insertion order.
  fn all_supply(
    &self,
  ) -> impl Future<Output = Result<Vec<SupplyRecord>, Self::Error>> + Send + '_;

  /// Demand records whose part identifier is in `mpns`, in insertion order.
  fn demand_for_parts(
    &self,
    mpns: Vec<String>,
  ) -> impl Future<Output = Result<Vec<DemandRecord>, Self::Error>> + Send + '_;

  /// Supply records whose part identifier is in `mpns`, in insertion order.
  fn supply_for_parts(
    &self,
    mpns: Vec<String>,
  ) -> impl Future<Output = Result<Vec<SupplyRecord>, Self::Error>> + Send + '_;

  // ── Match view ────────────────────────────────────────────────────────

  fn all_matches(
    &self,
  ) -> impl Future<Output = Result<Vec<MatchRecord>, Self::Error>> + Send + '_;

  /// Add matches not already present. Returns the number added.
  fn append_matches(
    &self,
    matches: Vec<MatchRecord>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Atomically replace the whole view. Returns the number stored.
  fn replace_matches(
    &self,
    matches: Vec<MatchRecord>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Audit trail ───────────────────────────────────────────────────────

  fn record_processing(
    &self,
    entry: ProcessingLogEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Newest entries first; `None` returns the whole log.
  fn processing_log(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<ProcessingLogEntry>, Self::Error>>
  + Send
  + '_;

  fn stats(
    &self,
  ) -> impl Future<Output = Result<StoreStats, Self::Error>> + Send + '_;

  /// Per-part totals as defined by [`summarize`](crate::summary::summarize),
  /// at most `limit` rows per table.
  fn summaries(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<PartSummaries, Self::Error>> + Send + '_;
}
