//! Readers: spreadsheet and CSV bytes in, [`RawSheet`]s out.
//!
//! Pipeline:
//!   bytes
//!     └─ read_spreadsheet() / read_csv()  → rows of Cell per sheet
//!          └─ sheet_from_rows()            → header row located, RawSheet

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use hotparts_core::sheet::{Cell, RawSheet};

use crate::error::Result;

// ─── Header location ─────────────────────────────────────────────────────────

fn mentions_mpn(row: &[Cell]) -> bool {
  row.iter().any(|c| {
    c.as_text()
      .is_some_and(|t| t.to_lowercase().contains("mpn"))
  })
}

/// Build a sheet from raw rows. The header row is the first row with a cell
/// mentioning "MPN"; failing that, the first non-empty row. Rows above the
/// header are discarded.
pub fn sheet_from_rows(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> RawSheet {
  let name = name.into();
  let header_at = rows
    .iter()
    .position(|r| mentions_mpn(r))
    .or_else(|| rows.iter().position(|r| r.iter().any(|c| !c.is_empty())));

  let Some(header_at) = header_at else {
    return RawSheet::new(name, Vec::new());
  };

  let mut rows = rows.into_iter().skip(header_at);
  let headers = rows
    .next()
    .unwrap_or_default()
    .iter()
    .map(|c| c.as_text().map(|t| t.trim().to_owned()).unwrap_or_default())
    .collect();

  RawSheet { name, headers, rows: rows.collect() }
}

// ─── Spreadsheets ────────────────────────────────────────────────────────────

fn cell_from_data(data: &Data) -> Cell {
  match data {
    Data::Empty | Data::Error(_) => Cell::Empty,
    Data::String(s) if s.trim().is_empty() => Cell::Empty,
    Data::String(s) => Cell::Text(s.clone()),
    Data::Int(i) => Cell::Number(*i as f64),
    Data::Float(f) => Cell::Number(*f),
    Data::Bool(b) => Cell::Text(b.to_string()),
    Data::DateTime(dt) => Cell::Text(dt.to_string()),
    Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
  }
}

/// Read every sheet of an xlsx/xlsm/xls/xlsb/ods workbook, in workbook
/// order. Sheets for which `keep` returns false are not decoded.
pub fn read_spreadsheet(
  bytes: &[u8],
  keep: impl Fn(&str) -> bool,
) -> Result<Vec<RawSheet>> {
  let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
  let names: Vec<String> = workbook.sheet_names().to_vec();

  let mut sheets = Vec::with_capacity(names.len());
  for name in names {
    if !keep(&name) {
      tracing::info!(sheet = %name, "skipping sheet by rule");
      continue;
    }
    let range = workbook.worksheet_range(&name)?;
    let rows: Vec<Vec<Cell>> = range
      .rows()
      .map(|r| r.iter().map(cell_from_data).collect())
      .collect();
    tracing::debug!(sheet = %name, rows = rows.len(), "read sheet");
    sheets.push(sheet_from_rows(name, rows));
  }
  Ok(sheets)
}

// ─── CSV ─────────────────────────────────────────────────────────────────────

/// Read a CSV file as a single sheet called `name`. Ragged rows are
/// accepted.
pub fn read_csv(bytes: &[u8], name: impl Into<String>) -> Result<RawSheet> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_reader(bytes);

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    rows.push(
      record
        .iter()
        .map(|field| {
          if field.trim().is_empty() {
            Cell::Empty
          } else {
            Cell::from(field)
          }
        })
        .collect(),
    );
  }
  Ok(sheet_from_rows(name, rows))
}
