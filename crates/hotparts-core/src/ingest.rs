//! Whole-document ingestion: normalize every sheet, merge the union as one
//! batch, refresh the match view and write one processing-log entry.
//!
//! Schema problems on a sheet skip that sheet only. A document with no
//! usable sheet is logged as an error and changes nothing else.

use std::future::Future;

use crate::{
  error::{IngestError, MergeError, SchemaError},
  log::{ProcessingLogEntry, ProcessingStatus},
  matcher::refresh_matches,
  merge::{MergeOptions, MergeReport, Mergeable, merge},
  normalize::{Normalized, Records, normalize},
  record::{DemandRecord, RecordKind, SupplyRecord},
  sheet::{Provenance, RawSheet},
  store::HistoricalStore,
};

/// One input document, already split into sheets by a reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  /// File name without directories; becomes the records' provenance.
  pub filename:    String,
  pub kind:        RecordKind,
  pub sheets:      Vec<RawSheet>,
  pub fingerprint: Option<String>,
}

impl Document {
  pub fn new(
    filename: impl Into<String>,
    kind: RecordKind,
    sheets: Vec<RawSheet>,
  ) -> Self {
    Self { filename: filename.into(), kind, sheets, fingerprint: None }
  }

  pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
    self.fingerprint = Some(fingerprint.into());
    self
  }
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
  /// The entry that was written to the processing log.
  pub entry:       ProcessingLogEntry,
  pub sheets_used: usize,
  /// One per skipped sheet.
  pub issues:      Vec<SchemaError>,
}

// ─── Per-kind plumbing ───────────────────────────────────────────────────────

trait Ingestible: Mergeable {
  /// The records of this kind, if `normalized` holds them.
  fn from_normalized(normalized: Normalized<'_>) -> Option<Records<'_, Self>>;

  fn refresh<'a, S: HistoricalStore>(
    store: &'a S,
    added: &'a [Self],
  ) -> impl Future<Output = Result<usize, S::Error>> + Send + 'a;
}

impl Ingestible for DemandRecord {
  fn from_normalized(normalized: Normalized<'_>) -> Option<Records<'_, Self>> {
    match normalized {
      Normalized::Demand(records) => Some(records),
      Normalized::Supply(_) => None,
    }
  }

  fn refresh<'a, S: HistoricalStore>(
    store: &'a S,
    added: &'a [Self],
  ) -> impl Future<Output = Result<usize, S::Error>> + Send + 'a {
    refresh_matches(store, added, &[])
  }
}

impl Ingestible for SupplyRecord {
  fn from_normalized(normalized: Normalized<'_>) -> Option<Records<'_, Self>> {
    match normalized {
      Normalized::Supply(records) => Some(records),
      Normalized::Demand(_) => None,
    }
  }

  fn refresh<'a, S: HistoricalStore>(
    store: &'a S,
    added: &'a [Self],
  ) -> impl Future<Output = Result<usize, S::Error>> + Send + 'a {
    refresh_matches(store, &[], added)
  }
}

fn fill_counts<R>(entry: &mut ProcessingLogEntry, report: &MergeReport<R>) {
  entry.seen = report.seen;
  entry.added = report.added_count();
  entry.skipped = report.skipped_count();
  entry.invalid = report.invalid_count();
}

// ─── Ingest ──────────────────────────────────────────────────────────────────

/// Ingest one document as its declared kind.
///
/// Returns `Ok` whenever the store stayed healthy, including documents that
/// were logged as duplicates or errors. A store fault during the merge
/// returns [`IngestError::Merge`] with the number of records committed; an
/// error entry is still attempted for the log.
pub async fn ingest_document<S: HistoricalStore>(
  store: &S,
  document: &Document,
  options: &MergeOptions,
) -> Result<DocumentOutcome, IngestError<S::Error>> {
  match document.kind {
    RecordKind::Demand => ingest_as::<S, DemandRecord>(store, document, options).await,
    RecordKind::Supply => ingest_as::<S, SupplyRecord>(store, document, options).await,
  }
}

async fn ingest_as<S, R>(
  store: &S,
  document: &Document,
  options: &MergeOptions,
) -> Result<DocumentOutcome, IngestError<S::Error>>
where
  S: HistoricalStore,
  R: Ingestible,
{
  let mut entry = ProcessingLogEntry::new(
    document.filename.clone(),
    document.kind,
    ProcessingStatus::Success,
  );
  entry.fingerprint = document.fingerprint.clone();

  let mut issues = Vec::new();
  let mut records = Vec::new();
  let mut sheets_used = 0;

  for sheet in &document.sheets {
    let provenance = Provenance::new(document.filename.as_str(), sheet.name.as_str());
    match normalize(sheet, R::KIND, &provenance) {
      Ok(normalized) => {
        sheets_used += 1;
        records.extend(R::from_normalized(normalized).into_iter().flatten());
      }
      Err(e) => {
        tracing::warn!(
          document = %document.filename,
          sheet = %sheet.name,
          error = %e,
          "skipping sheet"
        );
        issues.push(e);
      }
    }
  }

  if sheets_used == 0 && !issues.is_empty() {
    entry.status = ProcessingStatus::Error;
    entry.error = Some(
      issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; "),
    );
    store
      .record_processing(entry.clone())
      .await
      .map_err(IngestError::Store)?;
    tracing::warn!(document = %document.filename, "no usable sheet");
    return Ok(DocumentOutcome { entry, sheets_used, issues });
  }

  let report = match merge(store, records, options).await {
    Ok(report) => report,
    Err(MergeError { committed, source }) => {
      fill_counts(&mut entry, &committed);
      entry.status = ProcessingStatus::Error;
      entry.error = Some(source.to_string());
      match R::refresh(store, &committed.added).await {
        Ok(n) => entry.matches = n,
        Err(e) => tracing::error!(error = %e, "match refresh failed"),
      }
      if let Err(e) = store.record_processing(entry).await {
        tracing::error!(error = %e, "could not record failed ingest");
      }
      return Err(IngestError::Merge {
        filename: document.filename.clone(),
        committed: committed.added.len(),
        source,
      });
    }
  };

  fill_counts(&mut entry, &report);
  entry.matches = R::refresh(store, &report.added)
    .await
    .map_err(IngestError::Store)?;
  if report.added.is_empty() && report.seen > 0 {
    entry.status = ProcessingStatus::Duplicate;
  }

  store
    .record_processing(entry.clone())
    .await
    .map_err(IngestError::Store)?;

  tracing::info!(
    document = %document.filename,
    kind = %document.kind,
    status = entry.status.as_str(),
    seen = entry.seen,
    added = entry.added,
    skipped = entry.skipped,
    invalid = entry.invalid,
    matches = entry.matches,
    "ingested document"
  );

  Ok(DocumentOutcome { entry, sheets_used, issues })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use rust_decimal::Decimal;

  use super::*;
  use crate::{matcher::rebuild_matches, sheet::Cell, testing::MemoryStore};

  fn headers(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
  }

  fn hot_parts() -> Document {
    let sheet = RawSheet::new("2025.06.30", headers(&["MPN", "Reqs Count", "MFG"]))
      .with_row(vec![Cell::from("ABC123"), Cell::Number(5.0), Cell::from("TI")])
      .with_row(vec![Cell::from("ZZZ999"), Cell::Number(1.0), Cell::from("ADI")]);
    Document::new("Weekly Hot Parts List 2025.07.07.xlsx", RecordKind::Demand, vec![
      sheet,
    ])
  }

  fn excess() -> Document {
    let raw = RawSheet::new("Raw Data", headers(&["MPN", "QTY", "Price"]))
      .with_row(["ABC123", "1,898", "1.00"]);
    let summary = RawSheet::new("Summary", headers(&["MPN", "Stock QTY"]))
      .with_row(["abc123", "10"]);
    Document::new("X.xlsx", RecordKind::Supply, vec![raw, summary])
  }

  #[tokio::test]
  async fn demand_then_supply_produces_matches() {
    let store = MemoryStore::default();
    let opts = MergeOptions::default();

    let d = ingest_document(&store, &hot_parts(), &opts).await.unwrap();
    assert_eq!(d.entry.status, ProcessingStatus::Success);
    assert_eq!(d.entry.added, 2);
    assert_eq!(d.entry.matches, 0);

    let s = ingest_document(&store, &excess(), &opts).await.unwrap();
    assert_eq!(s.entry.added, 2);
    assert_eq!(s.entry.matches, 2);
    assert_eq!(s.sheets_used, 2);

    let matches = store.matches();
    assert_eq!(matches.len(), 2);
    let raw = matches.iter().find(|m| m.supply_sheet == "Raw Data").unwrap();
    assert_eq!(raw.quantity, Some(1898));
    assert_eq!(raw.price, Some(Decimal::new(112, 2)));
    assert_eq!(raw.reqs_count, Some(5));
    assert_eq!(raw.period, "2025.06.30");

    assert_eq!(store.log().len(), 2);
  }

  #[tokio::test]
  async fn reingest_is_logged_as_duplicate() {
    let store = MemoryStore::default();
    let opts = MergeOptions::default();
    ingest_document(&store, &excess(), &opts).await.unwrap();

    let again = ingest_document(&store, &excess(), &opts).await.unwrap();
    assert_eq!(again.entry.status, ProcessingStatus::Duplicate);
    assert_eq!(again.entry.added, 0);
    assert_eq!(again.entry.skipped, 2);
    assert_eq!(store.supply().len(), 2);
  }

  #[tokio::test]
  async fn rows_without_part_id_are_counted_as_invalid() {
    let store = MemoryStore::default();
    let sheet = RawSheet::new("Raw Data", headers(&["MPN", "QTY", "Price"]))
      .with_row(["ABC", "5", "1.00"])
      .with_row(["   ", "7", "2.00"])
      .with_row(vec![Cell::Empty, Cell::Empty, Cell::Empty]);
    let doc = Document::new("X.xlsx", RecordKind::Supply, vec![sheet]);

    let outcome = ingest_document(&store, &doc, &MergeOptions::default())
      .await
      .unwrap();
    assert_eq!(outcome.entry.seen, 2);
    assert_eq!(outcome.entry.added, 1);
    assert_eq!(outcome.entry.skipped, 1);
    assert_eq!(outcome.entry.invalid, 1);
    assert_eq!(outcome.entry.status, ProcessingStatus::Success);
    assert_eq!(store.supply().len(), 1);
    assert_eq!(store.log()[0].invalid, 1);
  }

  #[tokio::test]
  async fn bad_sheet_is_skipped_siblings_proceed() {
    let store = MemoryStore::default();
    let mut doc = excess();
    doc
      .sheets
      .push(RawSheet::new("Notes", headers(&["Comment"])).with_row(["hello"]));

    let outcome = ingest_document(&store, &doc, &MergeOptions::default())
      .await
      .unwrap();
    assert_eq!(outcome.sheets_used, 2);
    assert_eq!(outcome.issues.len(), 1);
    assert!(matches!(outcome.issues[0], SchemaError::MissingPartColumn { .. }));
    assert_eq!(outcome.entry.status, ProcessingStatus::Success);
  }

  #[tokio::test]
  async fn document_without_usable_sheet_is_logged_as_error() {
    let store = MemoryStore::default();
    let doc = Document::new("hot parts.xlsx", RecordKind::Demand, vec![
      RawSheet::new("Sheet1", headers(&["MPN"])).with_row(["A"]),
    ]);

    let outcome = ingest_document(&store, &doc, &MergeOptions::default())
      .await
      .unwrap();
    assert_eq!(outcome.entry.status, ProcessingStatus::Error);
    assert!(outcome.entry.error.as_deref().unwrap().contains("period"));
    assert!(store.demand().is_empty());
    assert_eq!(store.log().len(), 1);
  }

  #[tokio::test]
  async fn store_fault_is_reported_and_logged() {
    let store = MemoryStore::default().fail_after_appends(0);
    let err = ingest_document(&store, &excess(), &MergeOptions::default())
      .await
      .unwrap_err();
    assert!(matches!(err, IngestError::Merge { committed: 0, .. }));

    let log = store.log();
    assert_eq!(log.len(), 1);
    assert!(log[0].status.is_error());
  }

  #[tokio::test]
  async fn fingerprint_is_logged() {
    let store = MemoryStore::default();
    let doc = excess().with_fingerprint("abc");
    let outcome = ingest_document(&store, &doc, &MergeOptions::default())
      .await
      .unwrap();
    assert_eq!(outcome.entry.fingerprint.as_deref(), Some("abc"));
  }

  #[tokio::test]
  async fn incremental_view_matches_rebuild() {
    let store = MemoryStore::default();
    let opts = MergeOptions::default();
    ingest_document(&store, &excess(), &opts).await.unwrap();
    ingest_document(&store, &hot_parts(), &opts).await.unwrap();

    let incremental = store.matches();
    assert_eq!(incremental.len(), 2);
    rebuild_matches(&store).await.unwrap();
    let mut rebuilt = store.matches();
    let mut incremental = incremental;
    incremental.sort_by(|a, b| a.supply_sheet.cmp(&b.supply_sheet));
    rebuilt.sort_by(|a, b| a.supply_sheet.cmp(&b.supply_sheet));
    assert_eq!(incremental, rebuilt);
  }
}
