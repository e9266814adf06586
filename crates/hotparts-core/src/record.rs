//! Record types: the canonical form of every spreadsheet row the engine
//! accepts.
//!
//! Demand and supply records are immutable once stored. Match records are a
//! derived view over both and carry enough of each side to be rebuilt from
//! scratch at any time.

use std::{fmt, hash::Hash, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Record kind ─────────────────────────────────────────────────────────────

/// Which side of the reconciliation a document describes.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
  /// "Hot parts": requirement counts per part and period.
  Demand,
  /// "Excess inventory": available quantity and price per part.
  Supply,
}

impl RecordKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Demand => "demand",
      Self::Supply => "supply",
    }
  }
}

impl fmt::Display for RecordKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RecordKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "demand" | "hot_parts" => Ok(Self::Demand),
      "supply" | "excess" => Ok(Self::Supply),
      other => Err(format!("unknown record kind: {other:?}")),
    }
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Canonical form of a manufacturer part number: surrounding whitespace
/// removed, upper-cased. Internal whitespace is significant.
pub fn normalize_mpn(raw: &str) -> String { raw.trim().to_uppercase() }

/// A record with an identity key used for deduplication.
pub trait Keyed {
  type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

  fn key(&self) -> Self::Key;

  /// The part identifier this record is about.
  fn mpn(&self) -> &str;
}

/// Identity of a [`DemandRecord`]: (part, period, source document).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DemandKey {
  pub mpn:    String,
  pub period: String,
  pub source: String,
}

/// Identity of a [`SupplyRecord`]: (part, document, sheet).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplyKey {
  pub mpn:      String,
  pub document: String,
  pub sheet:    String,
}

/// Identity of a [`MatchRecord`]: the pair of keys it was joined from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchKey {
  pub mpn:             String,
  pub period:          String,
  pub demand_source:   String,
  pub supply_document: String,
  pub supply_sheet:    String,
}

// ─── Demand ──────────────────────────────────────────────────────────────────

/// One requirement entry for a part in a given period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DemandRecord {
  pub mpn:           String,
  /// Date-like period token, e.g. `2025.07.07`.
  pub period:        String,
  pub reqs_count:    Option<u64>,
  pub manufacturer:  Option<String>,
  pub product_class: Option<String>,
  pub description:   Option<String>,
  /// Name of the document the record was read from.
  pub source:        String,
}

impl DemandRecord {
  /// Convenience constructor with all optional fields unset.
  pub fn new(
    mpn: impl AsRef<str>,
    period: impl Into<String>,
    source: impl Into<String>,
  ) -> Self {
    Self {
      mpn:           normalize_mpn(mpn.as_ref()),
      period:        period.into(),
      reqs_count:    None,
      manufacturer:  None,
      product_class: None,
      description:   None,
      source:        source.into(),
    }
  }
}

impl Keyed for DemandRecord {
  type Key = DemandKey;

  fn key(&self) -> DemandKey {
    DemandKey {
      mpn:    self.mpn.clone(),
      period: self.period.clone(),
      source: self.source.clone(),
    }
  }

  fn mpn(&self) -> &str { &self.mpn }
}

// ─── Supply ──────────────────────────────────────────────────────────────────

/// One available-stock listing for a part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplyRecord {
  pub mpn:          String,
  /// Name of the document the record was read from.
  pub document:     String,
  pub quantity:     Option<u64>,
  /// Unit price with the ingestion markup already applied.
  pub price:        Option<Decimal>,
  pub manufacturer: Option<String>,
  /// Name of the sheet within `document`.
  pub sheet:        String,
}

impl SupplyRecord {
  /// Convenience constructor with all optional fields unset.
  pub fn new(
    mpn: impl AsRef<str>,
    document: impl Into<String>,
    sheet: impl Into<String>,
  ) -> Self {
    Self {
      mpn:          normalize_mpn(mpn.as_ref()),
      document:     document.into(),
      quantity:     None,
      price:        None,
      manufacturer: None,
      sheet:        sheet.into(),
    }
  }
}

impl Keyed for SupplyRecord {
  type Key = SupplyKey;

  fn key(&self) -> SupplyKey {
    SupplyKey {
      mpn:      self.mpn.clone(),
      document: self.document.clone(),
      sheet:    self.sheet.clone(),
    }
  }

  fn mpn(&self) -> &str { &self.mpn }
}

// ─── Match ───────────────────────────────────────────────────────────────────

/// A demand record paired with a supply record for the same part. Never
/// entered directly; always produced by the cross-reference matcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRecord {
  pub mpn:             String,
  pub period:          String,
  pub reqs_count:      Option<u64>,
  pub manufacturer:    Option<String>,
  pub product_class:   Option<String>,
  pub description:     Option<String>,
  pub demand_source:   String,
  pub supply_document: String,
  pub supply_sheet:    String,
  pub quantity:        Option<u64>,
  pub price:           Option<Decimal>,
}

impl MatchRecord {
  /// Join one demand record with one supply record. The manufacturer comes
  /// from the demand side and falls back to the supply side.
  pub fn join(demand: &DemandRecord, supply: &SupplyRecord) -> Self {
    Self {
      mpn:             demand.mpn.clone(),
      period:          demand.period.clone(),
      reqs_count:      demand.reqs_count,
      manufacturer:    demand
        .manufacturer
        .clone()
        .or_else(|| supply.manufacturer.clone()),
      product_class:   demand.product_class.clone(),
      description:     demand.description.clone(),
      demand_source:   demand.source.clone(),
      supply_document: supply.document.clone(),
      supply_sheet:    supply.sheet.clone(),
      quantity:        supply.quantity,
      price:           supply.price,
    }
  }
}

impl Keyed for MatchRecord {
  type Key = MatchKey;

  fn key(&self) -> MatchKey {
    MatchKey {
      mpn:             self.mpn.clone(),
      period:          self.period.clone(),
      demand_source:   self.demand_source.clone(),
      supply_document: self.supply_document.clone(),
      supply_sheet:    self.supply_sheet.clone(),
    }
  }

  fn mpn(&self) -> &str { &self.mpn }
}
