//! SQL schema for the hot-parts SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Demand and supply are append-only. The only UPDATE ever issued bumps
-- updated_at when a known key arrives again.
CREATE TABLE IF NOT EXISTS demand_records (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    mpn           TEXT NOT NULL,
    period        TEXT NOT NULL,   -- YYYY.MM.DD
    source        TEXT NOT NULL,   -- document name
    reqs_count    INTEGER,
    manufacturer  TEXT,
    product_class TEXT,
    description   TEXT,
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC
    updated_at    TEXT NOT NULL,
    UNIQUE (mpn, period, source)
);

CREATE TABLE IF NOT EXISTS supply_records (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    mpn          TEXT NOT NULL,
    document     TEXT NOT NULL,
    sheet        TEXT NOT NULL,
    quantity     INTEGER,
    price        TEXT,             -- decimal, markup applied
    manufacturer TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (mpn, document, sheet)
);

-- Derived view; rebuilt wholesale or extended after each merge.
CREATE TABLE IF NOT EXISTS matches (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    mpn             TEXT NOT NULL,
    period          TEXT NOT NULL,
    demand_source   TEXT NOT NULL,
    supply_document TEXT NOT NULL,
    supply_sheet    TEXT NOT NULL,
    reqs_count      INTEGER,
    manufacturer    TEXT,
    product_class   TEXT,
    description     TEXT,
    quantity        INTEGER,
    price           TEXT,
    created_at      TEXT NOT NULL,
    UNIQUE (mpn, period, demand_source, supply_document, supply_sheet)
);

-- One row per ingested document. Never updated or deleted.
CREATE TABLE IF NOT EXISTS processing_log (
    entry_id    TEXT PRIMARY KEY,
    filename    TEXT NOT NULL,
    kind        TEXT NOT NULL,     -- 'demand' | 'supply'
    status      TEXT NOT NULL,     -- 'success' | 'duplicate' | 'error'
    seen        INTEGER NOT NULL,
    added       INTEGER NOT NULL,
    skipped     INTEGER NOT NULL,
    invalid     INTEGER NOT NULL,
    matches     INTEGER NOT NULL,
    fingerprint TEXT,
    error       TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS demand_mpn_idx          ON demand_records(mpn);
CREATE INDEX IF NOT EXISTS demand_period_idx       ON demand_records(period);
CREATE INDEX IF NOT EXISTS demand_manufacturer_idx ON demand_records(manufacturer);
CREATE INDEX IF NOT EXISTS supply_mpn_idx          ON supply_records(mpn);
CREATE INDEX IF NOT EXISTS matches_mpn_idx         ON matches(mpn);
CREATE INDEX IF NOT EXISTS matches_period_idx      ON matches(period);
CREATE INDEX IF NOT EXISTS matches_manufacturer_idx ON matches(manufacturer);
CREATE INDEX IF NOT EXISTS processing_log_file_idx ON processing_log(filename);

PRAGMA user_version = 1;
";
