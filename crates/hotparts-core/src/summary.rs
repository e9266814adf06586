//! Per-part totals over demand, supply and the match view.
//!
//! [`summarize`] defines the figures over in-memory records; store backends
//! compute the same figures with their own aggregation and return them from
//! [`HistoricalStore::summaries`](crate::store::HistoricalStore::summaries).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::record::{DemandRecord, MatchRecord, SupplyRecord};

/// Demand totals for one part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandSummary {
  pub mpn:          String,
  /// Greatest non-null manufacturer seen for the part.
  pub manufacturer: Option<String>,
  /// Stored demand records for the part.
  pub occurrences:  usize,
  pub periods:      usize,
  /// Sum of requirement counts; records without one contribute nothing.
  pub total_reqs:   u64,
  pub first_period: String,
  pub last_period:  String,
}

/// Supply totals for one part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplySummary {
  pub mpn:            String,
  pub manufacturer:   Option<String>,
  /// Stored supply records (document and sheet pairs) for the part.
  pub listings:       usize,
  pub documents:      usize,
  pub total_quantity: u64,
}

/// Match totals for one part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
  pub mpn:          String,
  pub manufacturer: Option<String>,
  pub matches:      usize,
  pub periods:      usize,
  /// Distinct supply documents the part was matched in.
  pub documents:    usize,
}

/// The three per-part tables. Demand is ordered by occurrences, supply by
/// total quantity and matches by match count, each descending with ties
/// broken by part identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSummaries {
  pub demand:  Vec<DemandSummary>,
  pub supply:  Vec<SupplySummary>,
  pub matches: Vec<MatchSummary>,
}

fn greatest(current: &mut Option<String>, candidate: &Option<String>) {
  if candidate.is_some() && *candidate > *current {
    current.clone_from(candidate);
  }
}

fn truncate<T>(mut rows: Vec<T>, limit: Option<usize>) -> Vec<T> {
  if let Some(limit) = limit {
    rows.truncate(limit);
  }
  rows
}

/// Compute [`PartSummaries`] over the given records, keeping at most
/// `limit` rows per table.
pub fn summarize(
  demand: &[DemandRecord],
  supply: &[SupplyRecord],
  matches: &[MatchRecord],
  limit: Option<usize>,
) -> PartSummaries {
  // ── Demand ────────────────────────────────────────────────────────────
  let mut by_part: BTreeMap<&str, (DemandSummary, BTreeSet<&str>)> = BTreeMap::new();
  for r in demand {
    let (row, periods) = by_part.entry(r.mpn.as_str()).or_insert_with(|| {
      (
        DemandSummary {
          mpn:          r.mpn.clone(),
          manufacturer: None,
          occurrences:  0,
          periods:      0,
          total_reqs:   0,
          first_period: r.period.clone(),
          last_period:  r.period.clone(),
        },
        BTreeSet::new(),
      )
    });
    row.occurrences += 1;
    row.total_reqs = row.total_reqs.saturating_add(r.reqs_count.unwrap_or(0));
    greatest(&mut row.manufacturer, &r.manufacturer);
    periods.insert(r.period.as_str());
  }
  let mut demand_rows: Vec<DemandSummary> = by_part
    .into_values()
    .map(|(mut row, periods)| {
      row.periods = periods.len();
      if let (Some(first), Some(last)) = (periods.first(), periods.last()) {
        row.first_period = (*first).to_owned();
        row.last_period = (*last).to_owned();
      }
      row
    })
    .collect();
  demand_rows.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then(a.mpn.cmp(&b.mpn)));

  // ── Supply ────────────────────────────────────────────────────────────
  let mut by_part: BTreeMap<&str, (SupplySummary, BTreeSet<&str>)> = BTreeMap::new();
  for r in supply {
    let (row, documents) = by_part.entry(r.mpn.as_str()).or_insert_with(|| {
      (
        SupplySummary {
          mpn:            r.mpn.clone(),
          manufacturer:   None,
          listings:       0,
          documents:      0,
          total_quantity: 0,
        },
        BTreeSet::new(),
      )
    });
    row.listings += 1;
    row.total_quantity = row.total_quantity.saturating_add(r.quantity.unwrap_or(0));
    greatest(&mut row.manufacturer, &r.manufacturer);
    documents.insert(r.document.as_str());
  }
  let mut supply_rows: Vec<SupplySummary> = by_part
    .into_values()
    .map(|(mut row, documents)| {
      row.documents = documents.len();
      row
    })
    .collect();
  supply_rows
    .sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity).then(a.mpn.cmp(&b.mpn)));

  // ── Matches ───────────────────────────────────────────────────────────
  let mut by_part: BTreeMap<&str, (MatchSummary, BTreeSet<&str>, BTreeSet<&str>)> =
    BTreeMap::new();
  for r in matches {
    let (row, periods, documents) = by_part.entry(r.mpn.as_str()).or_insert_with(|| {
      (
        MatchSummary {
          mpn:          r.mpn.clone(),
          manufacturer: None,
          matches:      0,
          periods:      0,
          documents:    0,
        },
        BTreeSet::new(),
        BTreeSet::new(),
      )
    });
    row.matches += 1;
    greatest(&mut row.manufacturer, &r.manufacturer);
    periods.insert(r.period.as_str());
    documents.insert(r.supply_document.as_str());
  }
  let mut match_rows: Vec<MatchSummary> = by_part
    .into_values()
    .map(|(mut row, periods, documents)| {
      row.periods = periods.len();
      row.documents = documents.len();
      row
    })
    .collect();
  match_rows.sort_by(|a, b| b.matches.cmp(&a.matches).then(a.mpn.cmp(&b.mpn)));

  PartSummaries {
    demand:  truncate(demand_rows, limit),
    supply:  truncate(supply_rows, limit),
    matches: truncate(match_rows, limit),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn demand(mpn: &str, period: &str, reqs: Option<u64>, mfg: Option<&str>) -> DemandRecord {
    let mut r = DemandRecord::new(mpn, period, "w.xlsx");
    r.reqs_count = reqs;
    r.manufacturer = mfg.map(str::to_owned);
    r
  }

  fn supply(mpn: &str, document: &str, sheet: &str, qty: Option<u64>) -> SupplyRecord {
    let mut r = SupplyRecord::new(mpn, document, sheet);
    r.quantity = qty;
    r
  }

  #[test]
  fn demand_is_ordered_by_occurrences() {
    let rows = vec![
      demand("B", "2025.06.30", Some(5), Some("TI")),
      demand("A", "2025.06.30", Some(1), None),
      demand("B", "2025.07.07", None, Some("ADI")),
      demand("C", "2025.07.07", Some(2), None),
    ];
    let s = summarize(&rows, &[], &[], None);

    let parts: Vec<_> = s.demand.iter().map(|r| r.mpn.as_str()).collect();
    assert_eq!(parts, vec!["B", "A", "C"]);

    let b = &s.demand[0];
    assert_eq!(b.occurrences, 2);
    assert_eq!(b.periods, 2);
    assert_eq!(b.total_reqs, 5);
    assert_eq!(b.manufacturer.as_deref(), Some("TI"));
    assert_eq!(b.first_period, "2025.06.30");
    assert_eq!(b.last_period, "2025.07.07");
  }

  #[test]
  fn supply_is_ordered_by_quantity() {
    let rows = vec![
      supply("A", "x.xlsx", "Raw", Some(10)),
      supply("B", "x.xlsx", "Raw", Some(100)),
      supply("A", "y.xlsx", "Raw", Some(20)),
      supply("A", "y.xlsx", "Other", None),
    ];
    let s = summarize(&[], &rows, &[], None);

    assert_eq!(s.supply[0].mpn, "B");
    let a = &s.supply[1];
    assert_eq!(a.listings, 3);
    assert_eq!(a.documents, 2);
    assert_eq!(a.total_quantity, 30);
  }

  #[test]
  fn matches_are_counted_per_part_and_limited() {
    let d1 = demand("A", "2025.06.30", None, None);
    let d2 = demand("A", "2025.07.07", None, None);
    let d3 = demand("B", "2025.07.07", None, None);
    let s1 = supply("A", "x.xlsx", "Raw", Some(1));
    let s2 = supply("B", "x.xlsx", "Raw", Some(1));
    let matches = vec![
      MatchRecord::join(&d1, &s1),
      MatchRecord::join(&d2, &s1),
      MatchRecord::join(&d3, &s2),
    ];

    let s = summarize(&[], &[], &matches, Some(1));
    assert_eq!(s.matches.len(), 1);
    assert_eq!(s.matches[0].mpn, "A");
    assert_eq!(s.matches[0].matches, 2);
    assert_eq!(s.matches[0].periods, 2);
    assert_eq!(s.matches[0].documents, 1);
  }

  #[test]
  fn empty_input_gives_empty_tables() {
    assert_eq!(summarize(&[], &[], &[], None), PartSummaries::default());
  }
}
