//! Document readers and exporters for the hot-parts engine.
//!
//! Turns spreadsheet and CSV files into [`hotparts_core::ingest::Document`]s
//! and writes stored data back out as CSV. Pure synchronous; no database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use hotparts_workbook::{DocumentRules, load_document};
//!
//! let doc = load_document("Weekly Hot Parts List 2025.07.07.xlsx", &DocumentRules::default(), None).unwrap();
//! println!("{} is {} with {} sheets", doc.filename, doc.kind, doc.sheets.len());
//! ```

mod classify;
pub mod error;
pub mod export;
mod fingerprint;
pub mod read;

use std::path::Path;

pub use classify::{DocumentRules, SheetRule};
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
use hotparts_core::{ingest::Document, record::RecordKind};

/// Input format, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  Spreadsheet,
  Csv,
}

impl Format {
  pub fn from_path(path: &Path) -> Option<Self> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
      "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Spreadsheet),
      "csv" => Some(Self::Csv),
      _ => None,
    }
  }
}

/// Whether `path` names a file this crate can read.
pub fn is_supported(path: &Path) -> bool { Format::from_path(path).is_some() }

/// Read the document at `path`.
///
/// The kind comes from `rules` unless `kind` overrides it. Sheets excluded
/// by `rules` are not decoded. The document carries a fingerprint of its
/// bytes.
pub fn load_document(
  path: impl AsRef<Path>,
  rules: &DocumentRules,
  kind: Option<RecordKind>,
) -> Result<Document> {
  let path = path.as_ref();
  let format =
    Format::from_path(path).ok_or_else(|| Error::UnsupportedFile(path.to_owned()))?;
  let filename = path
    .file_name()
    .and_then(|n| n.to_str())
    .ok_or_else(|| Error::NoFileName(path.to_owned()))?
    .to_owned();

  let kind = kind.unwrap_or_else(|| rules.classify(&filename));
  let bytes = std::fs::read(path)?;

  let sheets = match format {
    Format::Spreadsheet => read::read_spreadsheet(&bytes, |sheet| {
      !rules.skips_sheet(&filename, sheet, kind)
    })?,
    Format::Csv => {
      let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename.as_str());
      vec![read::read_csv(&bytes, stem)?]
    }
  };

  tracing::debug!(%filename, %kind, sheets = sheets.len(), "loaded document");

  Ok(Document::new(filename, kind, sheets).with_fingerprint(fingerprint(&bytes)))
}
