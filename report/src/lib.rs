//! Report output for candia runs
//!
//! This crate provides renderers for the aggregate report:
//!
//! - Aligned plain-text table (stdout)
//! - JSON export

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod json_export;
pub mod table;

pub use json_export::JsonExporter;
pub use table::TableRenderer;
