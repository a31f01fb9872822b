//! Data ingestion and storage
//!
//! Profile-page scraping, SQLite persistence and the deferred
//! cross-reference resolver.

pub mod database;
pub mod resolver;
pub mod scrapers;

pub use database::Database;
pub use resolver::Resolver;
