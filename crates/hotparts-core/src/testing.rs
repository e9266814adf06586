//! In-memory [`HistoricalStore`] for unit tests in this crate.

use std::{
  collections::{BTreeSet, HashSet},
  sync::{Mutex, MutexGuard},
};

use thiserror::Error;

use crate::{
  log::ProcessingLogEntry,
  record::{
    DemandKey, DemandRecord, Keyed, MatchRecord, SupplyKey, SupplyRecord,
  },
  store::{AppendOutcome, HistoricalStore, StoreStats},
  summary::{PartSummaries, summarize},
};

#[derive(Debug, Error)]
#[error("injected store fault")]
pub struct Fault;

#[derive(Default)]
struct Inner {
  demand:  Vec<DemandRecord>,
  supply:  Vec<SupplyRecord>,
  matches: Vec<MatchRecord>,
  log:     Vec<ProcessingLogEntry>,
  appends: usize,
}

#[derive(Default)]
pub struct MemoryStore {
  inner:      Mutex<Inner>,
  fail_after: Option<usize>,
}

impl MemoryStore {
  /// Fail every demand/supply append after the first `n` succeed.
  pub fn fail_after_appends(mut self, n: usize) -> Self {
    self.fail_after = Some(n);
    self
  }

  pub fn demand(&self) -> Vec<DemandRecord> { self.lock().demand.clone() }

  pub fn supply(&self) -> Vec<SupplyRecord> { self.lock().supply.clone() }

  pub fn matches(&self) -> Vec<MatchRecord> { self.lock().matches.clone() }

  pub fn log(&self) -> Vec<ProcessingLogEntry> { self.lock().log.clone() }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn check_fault(&self, inner: &mut Inner) -> Result<(), Fault> {
    if self.fail_after.is_some_and(|n| inner.appends >= n) {
      return Err(Fault);
    }
    inner.appends += 1;
    Ok(())
  }
}

fn append<R: Keyed + Clone>(
  table: &mut Vec<R>,
  records: Vec<R>,
) -> AppendOutcome<R> {
  let mut outcome = AppendOutcome::default();
  for record in records {
    if table.iter().any(|r| r.key() == record.key()) {
      outcome.skipped.push(record);
    } else {
      table.push(record.clone());
      outcome.inserted.push(record);
    }
  }
  outcome
}

fn distinct<R: Keyed>(records: &[R]) -> usize {
  records.iter().map(Keyed::mpn).collect::<HashSet<_>>().len()
}

impl HistoricalStore for MemoryStore {
  type Error = Fault;

  async fn contains_demand(&self, key: DemandKey) -> Result<bool, Fault> {
    Ok(self.lock().demand.iter().any(|r| r.key() == key))
  }

  async fn contains_supply(&self, key: SupplyKey) -> Result<bool, Fault> {
    Ok(self.lock().supply.iter().any(|r| r.key() == key))
  }

  async fn append_demand(
    &self,
    records: Vec<DemandRecord>,
  ) -> Result<AppendOutcome<DemandRecord>, Fault> {
    let mut inner = self.lock();
    self.check_fault(&mut inner)?;
    Ok(append(&mut inner.demand, records))
  }

  async fn append_supply(
    &self,
    records: Vec<SupplyRecord>,
  ) -> Result<AppendOutcome<SupplyRecord>, Fault> {
    let mut inner = self.lock();
    self.check_fault(&mut inner)?;
    Ok(append(&mut inner.supply, records))
  }

  async fn all_demand(&self) -> Result<Vec<DemandRecord>, Fault> {
    Ok(self.demand())
  }

  async fn all_supply(&self) -> Result<Vec<SupplyRecord>, Fault> {
    Ok(self.supply())
  }

  async fn demand_for_parts(
    &self,
    mpns: Vec<String>,
  ) -> Result<Vec<DemandRecord>, Fault> {
    let inner = self.lock();
    Ok(inner.demand.iter().filter(|r| mpns.contains(&r.mpn)).cloned().collect())
  }

  async fn supply_for_parts(
    &self,
    mpns: Vec<String>,
  ) -> Result<Vec<SupplyRecord>, Fault> {
    let inner = self.lock();
    Ok(inner.supply.iter().filter(|r| mpns.contains(&r.mpn)).cloned().collect())
  }

  async fn all_matches(&self) -> Result<Vec<MatchRecord>, Fault> {
    Ok(self.matches())
  }

  async fn append_matches(
    &self,
    matches: Vec<MatchRecord>,
  ) -> Result<usize, Fault> {
    let mut inner = self.lock();
    Ok(append(&mut inner.matches, matches).inserted.len())
  }

  async fn replace_matches(
    &self,
    matches: Vec<MatchRecord>,
  ) -> Result<usize, Fault> {
    let mut inner = self.lock();
    inner.matches.clear();
    Ok(append(&mut inner.matches, matches).inserted.len())
  }

  async fn record_processing(
    &self,
    entry: ProcessingLogEntry,
  ) -> Result<(), Fault> {
    self.lock().log.push(entry);
    Ok(())
  }

  async fn processing_log(
    &self,
    limit: Option<usize>,
  ) -> Result<Vec<ProcessingLogEntry>, Fault> {
    let inner = self.lock();
    let newest_first = inner.log.iter().rev().cloned();
    Ok(match limit {
      Some(n) => newest_first.take(n).collect(),
      None => newest_first.collect(),
    })
  }

  async fn stats(&self) -> Result<StoreStats, Fault> {
    let inner = self.lock();
    let periods: BTreeSet<_> =
      inner.demand.iter().map(|r| r.period.clone()).collect();
    Ok(StoreStats {
      demand_records:       inner.demand.len(),
      supply_records:       inner.supply.len(),
      matches:              inner.matches.len(),
      log_entries:          inner.log.len(),
      distinct_demand_mpns: distinct(&inner.demand),
      distinct_supply_mpns: distinct(&inner.supply),
      distinct_match_mpns:  distinct(&inner.matches),
      period_range:         periods
        .first()
        .cloned()
        .zip(periods.last().cloned()),
    })
  }

  async fn summaries(&self, limit: Option<usize>) -> Result<PartSummaries, Fault> {
    let inner = self.lock();
    Ok(summarize(&inner.demand, &inner.supply, &inner.matches, limit))
  }
}
