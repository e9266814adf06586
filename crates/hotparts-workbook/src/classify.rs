//! Filename-based document classification and sheet skip rules.

use hotparts_core::record::RecordKind;
use serde::{Deserialize, Serialize};

/// Skip `sheet` (case-insensitive, exact) in documents whose filename
/// contains `filename_contains`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRule {
  pub filename_contains: String,
  pub sheet:             String,
}

/// How documents are classified and which of their sheets are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentRules {
  /// A filename containing this text is a demand document; every other
  /// supported file is supply.
  pub demand_pattern:      String,
  /// Supply sheets whose name contains any of these (case-insensitive) are
  /// skipped.
  pub skip_sheet_keywords: Vec<String>,
  pub skip_sheets:         Vec<SheetRule>,
}

impl Default for DocumentRules {
  fn default() -> Self {
    Self {
      demand_pattern:      "Weekly Hot Parts".to_string(),
      skip_sheet_keywords: vec!["match".to_string()],
      skip_sheets:         vec![SheetRule {
        filename_contains: "Micron stock".to_string(),
        sheet:             "Global".to_string(),
      }],
    }
  }
}

impl DocumentRules {
  /// Record kind for a document named `filename`.
  pub fn classify(&self, filename: &str) -> RecordKind {
    if filename
      .to_lowercase()
      .contains(&self.demand_pattern.to_lowercase())
    {
      RecordKind::Demand
    } else {
      RecordKind::Supply
    }
  }

  /// Whether `sheet` of a `kind` document named `filename` should be left
  /// unread.
  pub fn skips_sheet(&self, filename: &str, sheet: &str, kind: RecordKind) -> bool {
    if kind != RecordKind::Supply {
      return false;
    }
    let sheet_lower = sheet.trim().to_lowercase();
    let by_keyword = self
      .skip_sheet_keywords
      .iter()
      .any(|k| sheet_lower.contains(&k.to_lowercase()));
    let by_rule = self.skip_sheets.iter().any(|r| {
      filename.contains(&r.filename_contains)
        && sheet_lower == r.sheet.trim().to_lowercase()
    });
    by_keyword || by_rule
  }
}
