//! Encoding and decoding helpers between domain types and the plain-text
//! or integer representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings and
//! prices decimal strings (never floats, so no rounding drift).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use hotparts_core::{
  log::{ProcessingLogEntry, ProcessingStatus},
  record::{MatchRecord, RecordKind, SupplyRecord},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_price(p: Option<Decimal>) -> Option<String> {
  p.map(|p| p.to_string())
}

pub fn decode_price(s: Option<&str>) -> Result<Option<Decimal>> {
  Ok(s.map(Decimal::from_str).transpose()?)
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// SQLite integers are signed; counts beyond `i64::MAX` saturate.
pub fn encode_count(n: Option<u64>) -> Option<i64> {
  n.map(|n| i64::try_from(n).unwrap_or(i64::MAX))
}

pub fn decode_count(n: Option<i64>) -> Option<u64> {
  n.and_then(|n| u64::try_from(n).ok())
}

pub fn encode_usize(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_usize(n: i64) -> usize { usize::try_from(n).unwrap_or(0) }

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<RecordKind> {
  s.parse().map_err(|_| Error::UnknownValue {
    column: "kind",
    value:  s.to_owned(),
  })
}

pub fn decode_status(s: &str) -> Result<ProcessingStatus> {
  match s {
    "success" => Ok(ProcessingStatus::Success),
    "duplicate" => Ok(ProcessingStatus::Duplicate),
    "error" => Ok(ProcessingStatus::Error),
    other => Err(Error::UnknownValue {
      column: "status",
      value:  other.to_owned(),
    }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `supply_records` row.
pub struct RawSupply {
  pub mpn:          String,
  pub document:     String,
  pub sheet:        String,
  pub quantity:     Option<i64>,
  pub price:        Option<String>,
  pub manufacturer: Option<String>,
}

impl RawSupply {
  pub fn into_record(self) -> Result<SupplyRecord> {
    Ok(SupplyRecord {
      mpn:          self.mpn,
      document:     self.document,
      quantity:     decode_count(self.quantity),
      price:        decode_price(self.price.as_deref())?,
      manufacturer: self.manufacturer,
      sheet:        self.sheet,
    })
  }
}

/// Raw values read directly from a `matches` row.
pub struct RawMatch {
  pub mpn:             String,
  pub period:          String,
  pub demand_source:   String,
  pub supply_document: String,
  pub supply_sheet:    String,
  pub reqs_count:      Option<i64>,
  pub manufacturer:    Option<String>,
  pub product_class:   Option<String>,
  pub description:     Option<String>,
  pub quantity:        Option<i64>,
  pub price:           Option<String>,
}

impl RawMatch {
  pub fn into_record(self) -> Result<MatchRecord> {
    Ok(MatchRecord {
      mpn:             self.mpn,
      period:          self.period,
      reqs_count:      decode_count(self.reqs_count),
      manufacturer:    self.manufacturer,
      product_class:   self.product_class,
      description:     self.description,
      demand_source:   self.demand_source,
      supply_document: self.supply_document,
      supply_sheet:    self.supply_sheet,
      quantity:        decode_count(self.quantity),
      price:           decode_price(self.price.as_deref())?,
    })
  }
}

/// Raw values read directly from a `processing_log` row.
pub struct RawLogEntry {
  pub entry_id:    String,
  pub filename:    String,
  pub kind:        String,
  pub status:      String,
  pub seen:        i64,
  pub added:       i64,
  pub skipped:     i64,
  pub invalid:     i64,
  pub matches:     i64,
  pub fingerprint: Option<String>,
  pub error:       Option<String>,
  pub recorded_at: String,
}

impl RawLogEntry {
  pub fn into_entry(self) -> Result<ProcessingLogEntry> {
    Ok(ProcessingLogEntry {
      entry_id:    decode_uuid(&self.entry_id)?,
      filename:    self.filename,
      kind:        decode_kind(&self.kind)?,
      status:      decode_status(&self.status)?,
      seen:        decode_usize(self.seen),
      added:       decode_usize(self.added),
      skipped:     decode_usize(self.skipped),
      invalid:     decode_usize(self.invalid),
      matches:     decode_usize(self.matches),
      fingerprint: self.fingerprint,
      error:       self.error,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
