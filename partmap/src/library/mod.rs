//! Local Component Library
//!
//! The fast, free first pass of the mapper: a curated table of common parts
//! keyed by component type.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Library JSON │───▶│  Component   │◀───│    Local     │◀── ComponentSpec
//! │ (or builtin) │    │   Library    │    │   Matcher    │
//! └──────────────┘    └──────────────┘    └──────┬───────┘
//!                                                │
//!                                                ▼
//!                                         MappingResult (0.95)
//! ```
//!
//! Passives are looked up by normalized value (`common_values`), named
//! parts by upper-cased name (`common_parts`).

pub mod builtin;
pub mod matcher;
pub mod schema;

use thiserror::Error;

pub use matcher::{LocalMatcher, LOCAL_MATCH_CONFIDENCE};
pub use schema::{ComponentLibrary, LibraryDocument, LibraryEntry, PartInfo};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Failed to read library file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse library JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
