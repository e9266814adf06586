//! [`SqliteStore`]: the SQLite implementation of [`HistoricalStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use hotparts_core::{
  log::ProcessingLogEntry,
  record::{DemandKey, DemandRecord, MatchRecord, SupplyKey, SupplyRecord},
  store::{AppendOutcome, HistoricalStore, StoreStats},
  summary::{DemandSummary, MatchSummary, PartSummaries, SupplySummary},
};

use crate::{
  Result,
  encode::{
    RawLogEntry, RawMatch, RawSupply, decode_count, decode_usize, encode_count,
    encode_dt, encode_price, encode_usize, encode_uuid,
  },
  schema::SCHEMA,
};

const DEMAND_COLUMNS: &str =
  "mpn, period, source, reqs_count, manufacturer, product_class, description";

const SUPPLY_COLUMNS: &str =
  "mpn, document, sheet, quantity, price, manufacturer";

const MATCH_COLUMNS: &str = "mpn, period, demand_source, supply_document, \
                             supply_sheet, reqs_count, manufacturer, \
                             product_class, description, quantity, price";

/// Canonical order of the match view.
const MATCH_ORDER: &str =
  "mpn, period, supply_document, supply_sheet, demand_source";

fn demand_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DemandRecord> {
  Ok(DemandRecord {
    mpn:           row.get(0)?,
    period:        row.get(1)?,
    source:        row.get(2)?,
    reqs_count:    decode_count(row.get(3)?),
    manufacturer:  row.get(4)?,
    product_class: row.get(5)?,
    description:   row.get(6)?,
  })
}

fn supply_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSupply> {
  Ok(RawSupply {
    mpn:          row.get(0)?,
    document:     row.get(1)?,
    sheet:        row.get(2)?,
    quantity:     row.get(3)?,
    price:        row.get(4)?,
    manufacturer: row.get(5)?,
  })
}

fn match_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMatch> {
  Ok(RawMatch {
    mpn:             row.get(0)?,
    period:          row.get(1)?,
    demand_source:   row.get(2)?,
    supply_document: row.get(3)?,
    supply_sheet:    row.get(4)?,
    reqs_count:      row.get(5)?,
    manufacturer:    row.get(6)?,
    product_class:   row.get(7)?,
    description:     row.get(8)?,
    quantity:        row.get(9)?,
    price:           row.get(10)?,
  })
}

/// Insert `matches` with `INSERT OR IGNORE`; returns how many were new.
fn insert_matches(
  tx: &rusqlite::Transaction<'_>,
  matches: &[MatchRecord],
  now: &str,
) -> rusqlite::Result<usize> {
  let mut stmt = tx.prepare_cached(&format!(
    "INSERT OR IGNORE INTO matches ({MATCH_COLUMNS}, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
  ))?;
  let mut added = 0;
  for m in matches {
    added += stmt.execute(rusqlite::params![
      m.mpn,
      m.period,
      m.demand_source,
      m.supply_document,
      m.supply_sheet,
      encode_count(m.reqs_count),
      m.manufacturer,
      m.product_class,
      m.description,
      encode_count(m.quantity),
      encode_price(m.price),
      now,
    ])?;
  }
  Ok(added)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A hot-parts historical store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-column `COUNT` style query.
  async fn count(&self, sql: &'static str) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(sql, [], |r| r.get(0))?))
      .await?;
    Ok(decode_usize(n))
  }

  async fn supply_where(
    &self,
    filter: &'static str,
    mpns_json: Option<String>,
  ) -> Result<Vec<SupplyRecord>> {
    let raws: Vec<RawSupply> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {SUPPLY_COLUMNS} FROM supply_records {filter} ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = match mpns_json {
          Some(json) => stmt
            .query_map([json], supply_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map([], supply_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSupply::into_record).collect()
  }

  async fn demand_where(
    &self,
    filter: &'static str,
    mpns_json: Option<String>,
  ) -> Result<Vec<DemandRecord>> {
    let records = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {DEMAND_COLUMNS} FROM demand_records {filter} ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = match mpns_json {
          Some(json) => stmt
            .query_map([json], demand_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map([], demand_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;
    Ok(records)
  }
}

/// Restricts a query to the part identifiers in a JSON array parameter.
const PART_FILTER: &str = "WHERE mpn IN (SELECT value FROM json_each(?1))";

// ─── HistoricalStore impl ────────────────────────────────────────────────────

impl HistoricalStore for SqliteStore {
  type Error = crate::Error;

  // ── Membership ────────────────────────────────────────────────────────────

  async fn contains_demand(&self, key: DemandKey) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM demand_records
               WHERE mpn = ?1 AND period = ?2 AND source = ?3",
              rusqlite::params![key.mpn, key.period, key.source],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  async fn contains_supply(&self, key: SupplyKey) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM supply_records
               WHERE mpn = ?1 AND document = ?2 AND sheet = ?3",
              rusqlite::params![key.mpn, key.document, key.sheet],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  // ── Append-only writes ────────────────────────────────────────────────────

  async fn append_demand(
    &self,
    records: Vec<DemandRecord>,
  ) -> Result<AppendOutcome<DemandRecord>> {
    let now = encode_dt(Utc::now());

    let (records, inserted): (Vec<DemandRecord>, Vec<bool>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(records.len());
        {
          let mut insert = tx.prepare_cached(&format!(
            "INSERT OR IGNORE INTO demand_records
               ({DEMAND_COLUMNS}, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)"
          ))?;
          let mut touch = tx.prepare_cached(
            "UPDATE demand_records SET updated_at = ?4
             WHERE mpn = ?1 AND period = ?2 AND source = ?3",
          )?;
          for r in &records {
            let n = insert.execute(rusqlite::params![
              r.mpn,
              r.period,
              r.source,
              encode_count(r.reqs_count),
              r.manufacturer,
              r.product_class,
              r.description,
              now,
            ])?;
            if n == 0 {
              touch.execute(rusqlite::params![r.mpn, r.period, r.source, now])?;
            }
            inserted.push(n > 0);
          }
        }
        tx.commit()?;
        Ok((records, inserted))
      })
      .await?;

    let mut outcome = AppendOutcome::default();
    for (record, new) in records.into_iter().zip(inserted) {
      if new {
        outcome.inserted.push(record);
      } else {
        outcome.skipped.push(record);
      }
    }
    tracing::debug!(
      inserted = outcome.inserted.len(),
      skipped = outcome.skipped.len(),
      "appended demand"
    );
    Ok(outcome)
  }

  async fn append_supply(
    &self,
    records: Vec<SupplyRecord>,
  ) -> Result<AppendOutcome<SupplyRecord>> {
    let now = encode_dt(Utc::now());

    let (records, inserted): (Vec<SupplyRecord>, Vec<bool>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(records.len());
        {
          let mut insert = tx.prepare_cached(&format!(
            "INSERT OR IGNORE INTO supply_records
               ({SUPPLY_COLUMNS}, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)"
          ))?;
          let mut touch = tx.prepare_cached(
            "UPDATE supply_records SET updated_at = ?4
             WHERE mpn = ?1 AND document = ?2 AND sheet = ?3",
          )?;
          for r in &records {
            let n = insert.execute(rusqlite::params![
              r.mpn,
              r.document,
              r.sheet,
              encode_count(r.quantity),
              encode_price(r.price),
              r.manufacturer,
              now,
            ])?;
            if n == 0 {
              touch.execute(rusqlite::params![r.mpn, r.document, r.sheet, now])?;
            }
            inserted.push(n > 0);
          }
        }
        tx.commit()?;
        Ok((records, inserted))
      })
      .await?;

    let mut outcome = AppendOutcome::default();
    for (record, new) in records.into_iter().zip(inserted) {
      if new {
        outcome.inserted.push(record);
      } else {
        outcome.skipped.push(record);
      }
    }
    tracing::debug!(
      inserted = outcome.inserted.len(),
      skipped = outcome.skipped.len(),
      "appended supply"
    );
    Ok(outcome)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn all_demand(&self) -> Result<Vec<DemandRecord>> {
    self.demand_where("", None).await
  }

  async fn all_supply(&self) -> Result<Vec<SupplyRecord>> {
    self.supply_where("", None).await
  }

  async fn demand_for_parts(&self, mpns: Vec<String>) -> Result<Vec<DemandRecord>> {
    if mpns.is_empty() {
      return Ok(Vec::new());
    }
    let json = serde_json::to_string(&mpns)?;
    self.demand_where(PART_FILTER, Some(json)).await
  }

  async fn supply_for_parts(&self, mpns: Vec<String>) -> Result<Vec<SupplyRecord>> {
    if mpns.is_empty() {
      return Ok(Vec::new());
    }
    let json = serde_json::to_string(&mpns)?;
    self.supply_where(PART_FILTER, Some(json)).await
  }

  // ── Match view ────────────────────────────────────────────────────────────

  async fn all_matches(&self) -> Result<Vec<MatchRecord>> {
    let raws: Vec<RawMatch> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MATCH_COLUMNS} FROM matches ORDER BY {MATCH_ORDER}"
        ))?;
        let rows = stmt
          .query_map([], match_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMatch::into_record).collect()
  }

  async fn append_matches(&self, matches: Vec<MatchRecord>) -> Result<usize> {
    let now = encode_dt(Utc::now());
    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let added = insert_matches(&tx, &matches, &now)?;
        tx.commit()?;
        Ok(added)
      })
      .await?;
    Ok(added)
  }

  async fn replace_matches(&self, matches: Vec<MatchRecord>) -> Result<usize> {
    let now = encode_dt(Utc::now());
    let stored = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM matches", [])?;
        let stored = insert_matches(&tx, &matches, &now)?;
        tx.commit()?;
        Ok(stored)
      })
      .await?;
    Ok(stored)
  }

  // ── Audit trail ───────────────────────────────────────────────────────────

  async fn record_processing(&self, entry: ProcessingLogEntry) -> Result<()> {
    let id_str = encode_uuid(entry.entry_id);
    let at_str = encode_dt(entry.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO processing_log (
             entry_id, filename, kind, status, seen, added, skipped,
             invalid, matches, fingerprint, error, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str,
            entry.filename,
            entry.kind.as_str(),
            entry.status.as_str(),
            encode_usize(entry.seen),
            encode_usize(entry.added),
            encode_usize(entry.skipped),
            encode_usize(entry.invalid),
            encode_usize(entry.matches),
            entry.fingerprint,
            entry.error,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn processing_log(
    &self,
    limit: Option<usize>,
  ) -> Result<Vec<ProcessingLogEntry>> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit_val = limit.map(encode_usize).unwrap_or(-1);

    let raws: Vec<RawLogEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, filename, kind, status, seen, added, skipped,
                  invalid, matches, fingerprint, error, recorded_at
           FROM processing_log
           ORDER BY rowid DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map([limit_val], |row| {
            Ok(RawLogEntry {
              entry_id:    row.get(0)?,
              filename:    row.get(1)?,
              kind:        row.get(2)?,
              status:      row.get(3)?,
              seen:        row.get(4)?,
              added:       row.get(5)?,
              skipped:     row.get(6)?,
              invalid:     row.get(7)?,
              matches:     row.get(8)?,
              fingerprint: row.get(9)?,
              error:       row.get(10)?,
              recorded_at: row.get(11)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLogEntry::into_entry).collect()
  }

  async fn stats(&self) -> Result<StoreStats> {
    let demand_records = self.count("SELECT COUNT(*) FROM demand_records").await?;
    let supply_records = self.count("SELECT COUNT(*) FROM supply_records").await?;
    let matches = self.count("SELECT COUNT(*) FROM matches").await?;
    let log_entries = self.count("SELECT COUNT(*) FROM processing_log").await?;
    let distinct_demand_mpns = self
      .count("SELECT COUNT(DISTINCT mpn) FROM demand_records")
      .await?;
    let distinct_supply_mpns = self
      .count("SELECT COUNT(DISTINCT mpn) FROM supply_records")
      .await?;
    let distinct_match_mpns =
      self.count("SELECT COUNT(DISTINCT mpn) FROM matches").await?;

    let (lo, hi): (Option<String>, Option<String>) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT MIN(period), MAX(period) FROM demand_records",
          [],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
      })
      .await?;

    Ok(StoreStats {
      demand_records,
      supply_records,
      matches,
      log_entries,
      distinct_demand_mpns,
      distinct_supply_mpns,
      distinct_match_mpns,
      period_range: lo.zip(hi),
    })
  }

  async fn summaries(&self, limit: Option<usize>) -> Result<PartSummaries> {
    let limit_val = limit.map(encode_usize).unwrap_or(-1);

    let summaries = self
      .conn
      .call(move |conn| {
        let demand = conn
          .prepare(
            "SELECT mpn, MAX(manufacturer), COUNT(*), COUNT(DISTINCT period),
                    COALESCE(SUM(reqs_count), 0), MIN(period), MAX(period)
             FROM demand_records
             GROUP BY mpn
             ORDER BY COUNT(*) DESC, mpn
             LIMIT ?1",
          )?
          .query_map([limit_val], |row| {
            Ok(DemandSummary {
              mpn:          row.get(0)?,
              manufacturer: row.get(1)?,
              occurrences:  decode_usize(row.get(2)?),
              periods:      decode_usize(row.get(3)?),
              total_reqs:   decode_count(row.get(4)?).unwrap_or(0),
              first_period: row.get(5)?,
              last_period:  row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let supply = conn
          .prepare(
            "SELECT mpn, MAX(manufacturer), COUNT(*), COUNT(DISTINCT document),
                    COALESCE(SUM(quantity), 0) AS total_quantity
             FROM supply_records
             GROUP BY mpn
             ORDER BY total_quantity DESC, mpn
             LIMIT ?1",
          )?
          .query_map([limit_val], |row| {
            Ok(SupplySummary {
              mpn:            row.get(0)?,
              manufacturer:   row.get(1)?,
              listings:       decode_usize(row.get(2)?),
              documents:      decode_usize(row.get(3)?),
              total_quantity: decode_count(row.get(4)?).unwrap_or(0),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let matches = conn
          .prepare(
            "SELECT mpn, MAX(manufacturer), COUNT(*), COUNT(DISTINCT period),
                    COUNT(DISTINCT supply_document)
             FROM matches
             GROUP BY mpn
             ORDER BY COUNT(*) DESC, mpn
             LIMIT ?1",
          )?
          .query_map([limit_val], |row| {
            Ok(MatchSummary {
              mpn:          row.get(0)?,
              manufacturer: row.get(1)?,
              matches:      decode_usize(row.get(2)?),
              periods:      decode_usize(row.get(3)?),
              documents:    decode_usize(row.get(4)?),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(PartSummaries { demand, supply, matches })
      })
      .await?;

    tracing::debug!(
      demand = summaries.demand.len(),
      supply = summaries.supply.len(),
      matches = summaries.matches.len(),
      "computed part summaries"
    );
    Ok(summaries)
  }
}
