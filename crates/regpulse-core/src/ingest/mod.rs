//! Record ingestion.
//!
//! One validated loader for all three families, replacing per-script
//! copies of the same load-and-derive logic.

pub mod csv_loader;

pub use csv_loader::CsvLoader;
