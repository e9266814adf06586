//! Cross-reference matcher: the inner join of demand and supply on part
//! identifier.
//!
//! The match view is always a pure function of the stored demand and
//! supply. [`rebuild_matches`] recomputes it from scratch;
//! [`refresh_matches`] extends it after a merge and yields the same
//! contents.

use std::collections::HashMap;

use crate::{
  record::{DemandRecord, Keyed, MatchRecord, SupplyRecord},
  store::HistoricalStore,
};

/// Demand records grouped by part identifier.
pub struct DemandIndex<'a> {
  by_part: HashMap<&'a str, Vec<&'a DemandRecord>>,
}

impl<'a> DemandIndex<'a> {
  pub fn new(demand: &'a [DemandRecord]) -> Self {
    let mut by_part: HashMap<&str, Vec<&DemandRecord>> = HashMap::new();
    for record in demand {
      by_part.entry(record.mpn.as_str()).or_default().push(record);
    }
    Self { by_part }
  }

  pub fn get(&self, mpn: &str) -> &[&'a DemandRecord] {
    self.by_part.get(mpn).map(Vec::as_slice).unwrap_or_default()
  }
}

/// Sort into the canonical order and drop repeated match keys.
fn ordered(mut matches: Vec<MatchRecord>) -> Vec<MatchRecord> {
  matches.sort_by(|a, b| {
    (&a.mpn, &a.period, &a.supply_document, &a.supply_sheet, &a.demand_source)
      .cmp(&(
        &b.mpn,
        &b.period,
        &b.supply_document,
        &b.supply_sheet,
        &b.demand_source,
      ))
  });
  matches.dedup_by(|a, b| a.key() == b.key());
  matches
}

/// Every (demand, supply) pair sharing a part identifier, ordered by part,
/// period, supply document, supply sheet and demand source.
///
/// Parts present on only one side produce nothing. A part with `n` demand
/// and `m` supply records produces `n * m` matches.
pub fn cross_reference(
  demand: &[DemandRecord],
  supply: &[SupplyRecord],
) -> Vec<MatchRecord> {
  let index = DemandIndex::new(demand);
  let matches = supply
    .iter()
    .flat_map(|s| index.get(&s.mpn).iter().map(move |d| MatchRecord::join(d, s)))
    .collect();
  ordered(matches)
}

/// Recompute the whole match view from the store's demand and supply and
/// swap it in. Returns the number of matches stored.
pub async fn rebuild_matches<S: HistoricalStore>(
  store: &S,
) -> Result<usize, S::Error> {
  let demand = store.all_demand().await?;
  let supply = store.all_supply().await?;
  let matches = cross_reference(&demand, &supply);
  tracing::info!(
    demand = demand.len(),
    supply = supply.len(),
    matches = matches.len(),
    "rebuilding match view"
  );
  store.replace_matches(matches).await
}

fn parts<R: Keyed>(records: &[R]) -> Vec<String> {
  let mut mpns: Vec<String> = records.iter().map(|r| r.mpn().to_owned()).collect();
  mpns.sort_unstable();
  mpns.dedup();
  mpns
}

/// Extend the match view with the pairs a merge just made possible.
///
/// `new_demand` and `new_supply` are the records the merge added; both must
/// already be in the store. Returns the number of matches added.
pub async fn refresh_matches<S: HistoricalStore>(
  store: &S,
  new_demand: &[DemandRecord],
  new_supply: &[SupplyRecord],
) -> Result<usize, S::Error> {
  let mut matches = Vec::new();

  if !new_supply.is_empty() {
    let demand = store.demand_for_parts(parts(new_supply)).await?;
    matches.extend(cross_reference(&demand, new_supply));
  }
  if !new_demand.is_empty() {
    let supply = store.supply_for_parts(parts(new_demand)).await?;
    matches.extend(cross_reference(new_demand, &supply));
  }

  let matches = ordered(matches);
  if matches.is_empty() {
    return Ok(0);
  }
  store.append_matches(matches).await
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use rust_decimal::Decimal;

  use super::*;
  use crate::{
    merge::{MergeOptions, merge},
    testing::MemoryStore,
  };

  fn demand(mpn: &str, period: &str, source: &str) -> DemandRecord {
    DemandRecord::new(mpn, period, source)
  }

  fn supply(mpn: &str, document: &str, sheet: &str) -> SupplyRecord {
    SupplyRecord::new(mpn, document, sheet)
  }

  #[test]
  fn joins_one_demand_with_two_supply_sheets() {
    let mut d = demand("ABC123", "2025.06.30", "Weekly Hot Parts List 2025.07.07.xlsx");
    d.reqs_count = Some(5);
    let mut s1 = supply("ABC123", "X.xlsx", "Raw Data");
    s1.quantity = Some(1898);
    s1.price = Some(Decimal::new(112, 2));
    let s2 = supply("ABC123", "X.xlsx", "Summary");

    let matches = cross_reference(&[d], &[s2, s1]);
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].supply_sheet, "Raw Data");
    assert_eq!(matches[0].quantity, Some(1898));
    assert_eq!(matches[0].price, Some(Decimal::new(112, 2)));
    assert_eq!(matches[0].reqs_count, Some(5));
    assert_eq!(matches[1].supply_sheet, "Summary");
  }

  #[test]
  fn many_to_many_per_part() {
    let d = vec![
      demand("A", "2025.06.30", "w1.xlsx"),
      demand("A", "2025.07.07", "w2.xlsx"),
      demand("B", "2025.07.07", "w2.xlsx"),
    ];
    let s = vec![
      supply("A", "x.xlsx", "S1"),
      supply("A", "y.xlsx", "S1"),
      supply("C", "y.xlsx", "S1"),
    ];
    let matches = cross_reference(&d, &s);
    assert_eq!(matches.len(), 4);
    assert!(matches.iter().all(|m| m.mpn == "A"));
  }

  #[test]
  fn no_demand_means_no_matches() {
    assert!(cross_reference(&[], &[supply("A", "x", "s")]).is_empty());
    assert!(cross_reference(&[demand("A", "p", "d")], &[]).is_empty());
  }

  #[test]
  fn output_order_is_deterministic() {
    let d = vec![demand("B", "p1", "d"), demand("A", "p2", "d"), demand("A", "p1", "d")];
    let s = vec![supply("B", "z", "1"), supply("A", "y", "1"), supply("A", "x", "2")];
    let forward = cross_reference(&d, &s);

    let mut d_rev = d.clone();
    d_rev.reverse();
    let mut s_rev = s.clone();
    s_rev.reverse();
    assert_eq!(forward, cross_reference(&d_rev, &s_rev));

    let keys: Vec<_> = forward
      .iter()
      .map(|m| (m.mpn.as_str(), m.period.as_str(), m.supply_document.as_str()))
      .collect();
    assert_eq!(keys, vec![
      ("A", "p1", "x"),
      ("A", "p1", "y"),
      ("A", "p2", "x"),
      ("A", "p2", "y"),
      ("B", "p1", "z"),
    ]);
  }

  #[test]
  fn manufacturer_falls_back_to_supply() {
    let d = demand("A", "p", "d");
    let mut s = supply("A", "x", "s");
    s.manufacturer = Some("Acme".into());
    assert_eq!(cross_reference(&[d], &[s])[0].manufacturer.as_deref(), Some("Acme"));
  }

  #[tokio::test]
  async fn refresh_equals_rebuild() {
    let store = MemoryStore::default();
    let opts = MergeOptions::default();

    let steps: Vec<(Vec<DemandRecord>, Vec<SupplyRecord>)> = vec![
      (vec![], vec![supply("A", "x", "s1"), supply("B", "x", "s1")]),
      (vec![demand("A", "p1", "w1"), demand("C", "p1", "w1")], vec![]),
      (vec![], vec![supply("C", "y", "s1"), supply("A", "y", "s2")]),
      (vec![demand("A", "p2", "w2"), demand("B", "p2", "w2")], vec![]),
    ];

    for (d, s) in steps {
      let d = merge(&store, d, &opts).await.unwrap().added;
      let s = merge(&store, s, &opts).await.unwrap().added;
      refresh_matches(&store, &d, &s).await.unwrap();
    }

    let mut incremental = store.matches();
    incremental = ordered(incremental);

    let rebuilt = rebuild_matches(&store).await.unwrap();
    assert_eq!(rebuilt, incremental.len());
    assert_eq!(store.matches(), incremental);
    assert_eq!(incremental.len(), 6);
  }

  #[tokio::test]
  async fn refresh_with_nothing_new_adds_nothing() {
    let store = MemoryStore::default();
    assert_eq!(refresh_matches(&store, &[], &[]).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn rebuild_is_idempotent() {
    let store = MemoryStore::default();
    let opts = MergeOptions::default();
    merge(&store, vec![demand("A", "p", "w")], &opts).await.unwrap();
    merge(&store, vec![supply("A", "x", "s")], &opts).await.unwrap();

    assert_eq!(rebuild_matches(&store).await.unwrap(), 1);
    let first = store.matches();
    assert_eq!(rebuild_matches(&store).await.unwrap(), 1);
    assert_eq!(store.matches(), first);
  }
}
