//! Constrained random sampling over the match view.
//!
//! A sample draws from matches at or above a price floor, limited to a
//! random subset of manufacturers and to [`PER_MANUFACTURER_CAP`] records
//! per manufacturer, then shuffled and cut to the requested count.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rand::{Rng, seq::SliceRandom};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  error::{Error, Result},
  record::MatchRecord,
};

/// Most records any one manufacturer may contribute to a sample.
pub const PER_MANUFACTURER_CAP: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRequest {
  pub count:             usize,
  /// Records priced below this are excluded. A positive floor also excludes
  /// records with no price.
  pub min_price:         Option<Decimal>,
  pub max_manufacturers: usize,
}

impl Default for SampleRequest {
  fn default() -> Self {
    Self {
      count:             10,
      min_price:         Some(Decimal::TEN),
      max_manufacturers: 5,
    }
  }
}

impl SampleRequest {
  fn validate(&self) -> Result<()> {
    if self.count == 0 {
      return Err(Error::InvalidSampleRequest("count must be at least 1".into()));
    }
    if self.max_manufacturers == 0 {
      return Err(Error::InvalidSampleRequest(
        "max_manufacturers must be at least 1".into(),
      ));
    }
    if self.min_price.is_some_and(|p| p.is_sign_negative() && !p.is_zero()) {
      return Err(Error::InvalidSampleRequest(
        "min_price must not be negative".into(),
      ));
    }
    Ok(())
  }

  fn admits_price(&self, price: Option<Decimal>) -> bool {
    match self.min_price {
      Some(floor) if floor > Decimal::ZERO => price.is_some_and(|p| p >= floor),
      _ => true,
    }
  }
}

fn manufacturer(record: &MatchRecord) -> Option<&str> {
  record
    .manufacturer
    .as_deref()
    .map(str::trim)
    .filter(|m| !m.is_empty())
}

/// Draw a sample from `pool`.
///
/// Returns fewer than `count` records when the constraints leave too few
/// eligible ones; that is not an error. Records without a manufacturer are
/// never sampled. The same `rng` state always produces the same sample.
pub fn sample<R: Rng + ?Sized>(
  pool: &[MatchRecord],
  request: &SampleRequest,
  rng: &mut R,
) -> Result<Vec<MatchRecord>> {
  request.validate()?;

  let eligible: Vec<(&str, &MatchRecord)> = pool
    .iter()
    .filter(|r| request.admits_price(r.price))
    .filter_map(|r| manufacturer(r).map(|m| (m, r)))
    .collect();

  let manufacturers: Vec<&str> = eligible
    .iter()
    .map(|(m, _)| *m)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();
  let chosen: HashSet<&str> = manufacturers
    .choose_multiple(rng, request.max_manufacturers)
    .copied()
    .collect();

  let mut groups: BTreeMap<&str, Vec<(u64, &MatchRecord)>> = BTreeMap::new();
  for (m, record) in eligible {
    if chosen.contains(m) {
      groups.entry(m).or_default().push((rng.r#gen(), record));
    }
  }

  let mut picked: Vec<MatchRecord> = groups
    .into_values()
    .flat_map(|mut group| {
      group.sort_by_key(|(rank, _)| *rank);
      group
        .into_iter()
        .take(PER_MANUFACTURER_CAP)
        .map(|(_, r)| r.clone())
    })
    .collect();

  picked.shuffle(rng);
  picked.truncate(request.count);

  tracing::debug!(
    pool = pool.len(),
    manufacturers = manufacturers.len(),
    chosen = chosen.len(),
    sampled = picked.len(),
    "drew sample"
  );

  Ok(picked)
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Aggregate figures for a drawn sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSummary {
  pub records:        usize,
  pub manufacturers:  usize,
  pub total_quantity: u64,
  /// Sum of price times quantity over records that have both.
  pub total_value:    Decimal,
}

impl SampleSummary {
  pub fn of(sample: &[MatchRecord]) -> Self {
    let manufacturers = sample
      .iter()
      .filter_map(manufacturer)
      .collect::<HashSet<_>>()
      .len();
    let total_quantity = sample
      .iter()
      .filter_map(|r| r.quantity)
      .fold(0u64, u64::saturating_add);
    let total_value = sample
      .iter()
      .filter_map(|r| Some(r.price?.saturating_mul(Decimal::from(r.quantity?))))
      .fold(Decimal::ZERO, Decimal::saturating_add);
    Self { records: sample.len(), manufacturers, total_quantity, total_value }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
