//! Raw tabular input as handed over by a document reader.

use std::fmt;

static EMPTY: Cell = Cell::Empty;

/// A single raw cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Empty,
  Text(String),
  Number(f64),
}

impl Cell {
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Empty => true,
      Self::Text(s) => s.trim().is_empty(),
      Self::Number(_) => false,
    }
  }

  /// Text rendering of the cell; integral numbers print without a fraction.
  pub fn as_text(&self) -> Option<String> {
    match self {
      Self::Empty => None,
      Self::Text(s) => Some(s.clone()),
      Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
        Some(format!("{}", *n as i64))
      }
      Self::Number(n) => Some(n.to_string()),
    }
  }
}

impl From<&str> for Cell {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for Cell {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<f64> for Cell {
  fn from(n: f64) -> Self { Self::Number(n) }
}

impl fmt::Display for Cell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_text().as_deref().unwrap_or(""))
  }
}

/// One rectangular sheet: a header row of column labels and the data rows
/// below it. Row cells are positional; cell `i` belongs to `headers[i]`.
/// Short rows are treated as padded with [`Cell::Empty`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSheet {
  pub name:    String,
  pub headers: Vec<String>,
  pub rows:    Vec<Vec<Cell>>,
}

impl RawSheet {
  pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
    Self { name: name.into(), headers, rows: Vec::new() }
  }

  /// Append a data row; builder-style for tests and small fixtures.
  pub fn with_row<C: Into<Cell>>(
    mut self,
    row: impl IntoIterator<Item = C>,
  ) -> Self {
    self.rows.push(row.into_iter().map(Into::into).collect());
    self
  }

  /// The cell at `column` in `row`, or `Empty` if the row is short.
  pub fn cell(&self, row: usize, column: usize) -> &Cell {
    self
      .rows
      .get(row)
      .and_then(|r| r.get(column))
      .unwrap_or(&EMPTY)
  }
}

/// Where a sheet came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
  /// Document (file) name, without directories.
  pub document: String,
  pub sheet:    String,
}

impl Provenance {
  pub fn new(document: impl Into<String>, sheet: impl Into<String>) -> Self {
    Self { document: document.into(), sheet: sheet.into() }
  }
}
