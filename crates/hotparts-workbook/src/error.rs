//! Error types for the hotparts-workbook readers and exporters.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("spreadsheet error: {0}")]
  Spreadsheet(#[from] calamine::Error),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("unsupported file type: {}", .0.display())]
  UnsupportedFile(PathBuf),

  #[error("path has no file name: {}", .0.display())]
  NoFileName(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
