//! CSV export of stored records, the match view and samples.

use std::io::Write;

use hotparts_core::record::{DemandRecord, MatchRecord, SupplyRecord};
use rust_decimal::Decimal;

use crate::error::Result;

const DEMAND_HEADER: [&str; 7] = [
  "MPN",
  "Period",
  "Reqs Count",
  "Manufacturer",
  "Product Class",
  "Description",
  "Source",
];

const SUPPLY_HEADER: [&str; 6] =
  ["MPN", "Document", "Sheet", "QTY", "Price", "Manufacturer"];

const MATCH_HEADER: [&str; 11] = [
  "MPN",
  "Period",
  "Reqs Count",
  "Manufacturer",
  "Product Class",
  "Description",
  "Hot Parts Source",
  "Excess Document",
  "Excess Sheet",
  "QTY",
  "Price",
];

/// Price with exactly two decimal places; empty when absent.
pub fn format_price(price: Option<Decimal>) -> String {
  price
    .map(|p| {
      let mut p = p;
      p.rescale(2);
      p.to_string()
    })
    .unwrap_or_default()
}

fn count(n: Option<u64>) -> String { n.map(|n| n.to_string()).unwrap_or_default() }

fn text(s: &Option<String>) -> &str { s.as_deref().unwrap_or("") }

pub fn write_demand<W: Write>(out: W, records: &[DemandRecord]) -> Result<()> {
  let mut w = csv::Writer::from_writer(out);
  w.write_record(DEMAND_HEADER)?;
  for r in records {
    w.write_record([
      r.mpn.as_str(),
      r.period.as_str(),
      count(r.reqs_count).as_str(),
      text(&r.manufacturer),
      text(&r.product_class),
      text(&r.description),
      r.source.as_str(),
    ])?;
  }
  w.flush()?;
  Ok(())
}

pub fn write_supply<W: Write>(out: W, records: &[SupplyRecord]) -> Result<()> {
  let mut w = csv::Writer::from_writer(out);
  w.write_record(SUPPLY_HEADER)?;
  for r in records {
    w.write_record([
      r.mpn.as_str(),
      r.document.as_str(),
      r.sheet.as_str(),
      count(r.quantity).as_str(),
      format_price(r.price).as_str(),
      text(&r.manufacturer),
    ])?;
  }
  w.flush()?;
  Ok(())
}

/// Write matches, or a sample drawn from them.
pub fn write_matches<W: Write>(out: W, records: &[MatchRecord]) -> Result<()> {
  let mut w = csv::Writer::from_writer(out);
  w.write_record(MATCH_HEADER)?;
  for r in records {
    w.write_record([
      r.mpn.as_str(),
      r.period.as_str(),
      count(r.reqs_count).as_str(),
      text(&r.manufacturer),
      text(&r.product_class),
      text(&r.description),
      r.demand_source.as_str(),
      r.supply_document.as_str(),
      r.supply_sheet.as_str(),
      count(r.quantity).as_str(),
      format_price(r.price).as_str(),
    ])?;
  }
  w.flush()?;
  Ok(())
}
