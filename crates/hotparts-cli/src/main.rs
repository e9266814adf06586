//! `hotparts`: ingest hot-parts and excess-inventory documents, keep the
//! match view current, and draw constrained samples from it.

mod settings;

use std::{
  fs::File,
  io::BufWriter,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use hotparts_core::{
  ingest::{DocumentOutcome, ingest_document},
  log::{ProcessingLogEntry, ProcessingStatus},
  matcher::rebuild_matches,
  merge::MergeOptions,
  record::RecordKind,
  sampler::{SampleSummary, sample},
  store::HistoricalStore,
  summary::PartSummaries,
};
use hotparts_store_sqlite::SqliteStore;
use hotparts_workbook::{export, is_supported, load_document};
use rand::{SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use crate::settings::{Settings, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Hot parts / excess inventory reconciliation")]
struct Cli {
  /// Path to the TOML config file.
  #[arg(short, long, default_value = "hotparts.toml")]
  config: PathBuf,

  /// Database file; overrides `store_path` from the config.
  #[arg(long, env = "HOTPARTS_DB")]
  db: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Ingest documents. Directories are scanned (non-recursively) for
  /// supported files, in name order.
  Ingest {
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Treat every document as this kind instead of classifying by name.
    #[arg(long)]
    kind:  Option<RecordKind>,
  },
  /// Recompute the whole match view from stored demand and supply.
  RebuildMatches,
  /// Draw a random, manufacturer-diverse sample of matches.
  Random {
    #[arg(long)]
    count:             Option<usize>,
    #[arg(long)]
    min_price:         Option<Decimal>,
    #[arg(long)]
    max_manufacturers: Option<usize>,
    /// Seed for a reproducible draw.
    #[arg(long)]
    seed:              Option<u64>,
    /// Write the sample as CSV here.
    #[arg(short, long)]
    output:            Option<PathBuf>,
  },
  /// Show table counts.
  Stats {
    #[arg(long)]
    json: bool,
  },
  /// Show per-part totals: demand by occurrences, supply by available
  /// quantity, matches by match count.
  Summaries {
    /// Rows per table.
    #[arg(short = 'n', long, default_value_t = 10)]
    limit: usize,
    #[arg(long)]
    json:  bool,
  },
  /// Show the processing log, newest first.
  Log {
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: usize,
    #[arg(long)]
    json:  bool,
  },
  /// Write demand.csv, supply.csv and matches.csv.
  Export {
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let db = cli
    .db
    .as_deref()
    .map(expand_tilde)
    .unwrap_or_else(|| settings.store_path.clone());

  let store = SqliteStore::open(&db)
    .await
    .with_context(|| format!("failed to open store at {}", db.display()))?;
  info!(db = %db.display(), "store opened");

  match cli.command {
    Command::Ingest { paths, kind } => ingest(&store, &settings, &paths, kind).await,
    Command::RebuildMatches => {
      let n = rebuild_matches(&store).await?;
      println!("match view rebuilt: {n} matches");
      Ok(())
    }
    Command::Random { count, min_price, max_manufacturers, seed, output } => {
      let mut request = settings.sampler.request();
      if let Some(count) = count {
        request.count = count;
      }
      if let Some(min_price) = min_price {
        request.min_price = Some(min_price);
      }
      if let Some(max) = max_manufacturers {
        request.max_manufacturers = max;
      }
      let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
      };

      let pool = store.all_matches().await?;
      let drawn = sample(&pool, &request, &mut rng)?;
      match output {
        Some(path) => {
          export::write_matches(BufWriter::new(create(&path)?), &drawn)?;
          info!(path = %path.display(), "sample written");
        }
        None => export::write_matches(std::io::stdout().lock(), &drawn)?,
      }

      let summary = SampleSummary::of(&drawn);
      eprintln!(
        "{} records from {} manufacturers; total quantity {}; total value {}",
        summary.records,
        summary.manufacturers,
        summary.total_quantity,
        export::format_price(Some(summary.total_value)),
      );
      Ok(())
    }
    Command::Stats { json } => {
      let stats = store.stats().await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
      }
      println!("demand records  {:>8}  ({} parts)", stats.demand_records, stats.distinct_demand_mpns);
      println!("supply records  {:>8}  ({} parts)", stats.supply_records, stats.distinct_supply_mpns);
      println!("matches         {:>8}  ({} parts)", stats.matches, stats.distinct_match_mpns);
      println!("log entries     {:>8}", stats.log_entries);
      if let Some((first, last)) = stats.period_range {
        println!("periods         {first} .. {last}");
      }
      Ok(())
    }
    Command::Summaries { limit, json } => {
      let summaries = store.summaries(Some(limit)).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
      }
      print_summaries(&summaries);
      Ok(())
    }
    Command::Log { limit, json } => {
      let entries = store.processing_log(Some(limit)).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
      }
      for e in &entries {
        print_entry(e);
      }
      Ok(())
    }
    Command::Export { output_dir } => {
      std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

      let demand = store.all_demand().await?;
      export::write_demand(BufWriter::new(create(&output_dir.join("demand.csv"))?), &demand)?;
      let supply = store.all_supply().await?;
      export::write_supply(BufWriter::new(create(&output_dir.join("supply.csv"))?), &supply)?;
      let matches = store.all_matches().await?;
      export::write_matches(BufWriter::new(create(&output_dir.join("matches.csv"))?), &matches)?;

      println!(
        "exported {} demand, {} supply, {} matches to {}",
        demand.len(),
        supply.len(),
        matches.len(),
        output_dir.display()
      );
      Ok(())
    }
  }
}

// ─── Ingest ──────────────────────────────────────────────────────────────────

async fn ingest(
  store: &SqliteStore,
  settings: &Settings,
  paths: &[PathBuf],
  kind: Option<RecordKind>,
) -> anyhow::Result<()> {
  let files = collect_files(paths)?;
  if files.is_empty() {
    bail!("no supported documents found");
  }
  let options = MergeOptions { chunk_size: settings.merge_chunk_size };

  let mut failed = 0usize;
  for path in &files {
    let document = match load_document(path, &settings.documents, kind) {
      Ok(document) => document,
      Err(e) => {
        warn!(path = %path.display(), error = %e, "failed to read document");
        let filename = path
          .file_name()
          .map(|n| n.to_string_lossy().into_owned())
          .unwrap_or_else(|| path.display().to_string());
        let kind = kind.unwrap_or_else(|| settings.documents.classify(&filename));
        let mut entry = ProcessingLogEntry::new(filename, kind, ProcessingStatus::Error);
        entry.error = Some(e.to_string());
        store.record_processing(entry).await?;
        failed += 1;
        continue;
      }
    };

    let outcome = ingest_document(store, &document, &options)
      .await
      .with_context(|| format!("ingest of {} aborted", path.display()))?;
    if outcome.entry.status.is_error() {
      failed += 1;
    }
    print_outcome(&outcome);
  }

  println!("{} documents processed, {failed} with errors", files.len());
  Ok(())
}

/// Expand directories to the supported files directly inside them, sorted
/// by name. Explicit file arguments are kept in the order given.
fn collect_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
  let mut files = Vec::new();
  for path in paths {
    let path = expand_tilde(path);
    if !path.is_dir() {
      files.push(path);
      continue;
    }
    let mut found: Vec<PathBuf> = std::fs::read_dir(&path)
      .with_context(|| format!("failed to read directory {}", path.display()))?
      .filter_map(|entry| entry.ok().map(|e| e.path()))
      .filter(|p| p.is_file() && is_supported(p) && !is_lock_file(p))
      .collect();
    found.sort();
    files.extend(found);
  }
  Ok(files)
}

/// Office lock files (`~$Book.xlsx`) share the extension of the real file.
fn is_lock_file(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .is_some_and(|n| n.starts_with("~$"))
}

fn create(path: &Path) -> anyhow::Result<File> {
  File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn print_outcome(outcome: &DocumentOutcome) {
  let e = &outcome.entry;
  println!(
    "{:<9} {:<6} {}: {} seen, {} added, {} skipped ({} invalid), {} new matches, {} sheets",
    e.status.as_str(),
    e.kind.as_str(),
    e.filename,
    e.seen,
    e.added,
    e.skipped,
    e.invalid,
    e.matches,
    outcome.sheets_used,
  );
  for issue in &outcome.issues {
    println!("          {issue}");
  }
}

fn print_summaries(s: &PartSummaries) {
  println!("HOT PARTS");
  if s.demand.is_empty() {
    println!("  no demand stored");
  }
  for r in &s.demand {
    println!(
      "  {:<24} {:>5} occurrences  {:>3} periods  {:>8} reqs  {} .. {}  {}",
      r.mpn,
      r.occurrences,
      r.periods,
      r.total_reqs,
      r.first_period,
      r.last_period,
      r.manufacturer.as_deref().unwrap_or("-"),
    );
  }

  println!("EXCESS INVENTORY");
  if s.supply.is_empty() {
    println!("  no supply stored");
  }
  for r in &s.supply {
    println!(
      "  {:<24} {:>10} available  {:>3} listings  {:>3} documents  {}",
      r.mpn,
      r.total_quantity,
      r.listings,
      r.documents,
      r.manufacturer.as_deref().unwrap_or("-"),
    );
  }

  println!("MATCHES");
  if s.matches.is_empty() {
    println!("  no matches");
  }
  for r in &s.matches {
    println!(
      "  {:<24} {:>5} matches  {:>3} periods  {:>3} documents  {}",
      r.mpn,
      r.matches,
      r.periods,
      r.documents,
      r.manufacturer.as_deref().unwrap_or("-"),
    );
  }
}

fn print_entry(e: &ProcessingLogEntry) {
  println!(
    "{} {:<9} {:<6} {} (+{} / {} seen, {} matches)",
    e.recorded_at.format("%Y-%m-%d %H:%M:%S"),
    e.status.as_str(),
    e.kind.as_str(),
    e.filename,
    e.added,
    e.seen,
    e.matches,
  );
  if let Some(error) = &e.error {
    println!("    {error}");
  }
}
