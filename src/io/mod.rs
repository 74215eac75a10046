//! Sources and sinks.

pub mod db;
pub mod file;
pub mod sink;
pub mod source;

#[cfg(feature = "db-postgres")]
pub mod postgres;
