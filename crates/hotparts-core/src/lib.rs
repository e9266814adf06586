//! Core types and operations for the hot-parts reconciliation engine.
//!
//! Demand ("hot parts") and supply ("excess inventory") spreadsheets are
//! normalized into records, merged append-only into a historical store,
//! joined on part number into a match view, and sampled from.
//!
//! This crate has no database or file-format dependencies. Storage is
//! reached through [`store::HistoricalStore`]; readers hand over
//! [`sheet::RawSheet`]s.

// Native `async fn` in traits; the store trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod ingest;
pub mod log;
pub mod matcher;
pub mod merge;
pub mod normalize;
pub mod record;
pub mod sampler;
pub mod sheet;
pub mod store;
pub mod summary;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
