//! Built-in and External Component Library
//!
//! The default library is compiled into the binary. A library file given in
//! the configuration replaces it when the file exists.

use std::path::Path;

use crate::library::schema::{ComponentLibrary, LibraryDocument};
use crate::library::LibraryError;

const EMBEDDED_DATABASE: &str = include_str!("../../data/component_database.json");

/// The embedded default library document
pub fn builtin_document() -> LibraryDocument {
    match serde_json::from_str::<LibraryDocument>(EMBEDDED_DATABASE) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Failed to parse embedded component database: {}", e);
            LibraryDocument::new()
        }
    }
}

/// Read a library document from a JSON file
pub fn load_document_from_file(path: &Path) -> Result<LibraryDocument, LibraryError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load the library from `path` if it exists, otherwise the built-in one.
///
/// A file that exists but cannot be parsed is an error rather than a silent
/// fallback.
pub fn load_library(path: Option<&Path>) -> Result<ComponentLibrary, LibraryError> {
    let document = match path {
        Some(path) if path.is_file() => {
            let document = load_document_from_file(path)?;
            tracing::info!(
                "Loaded component library with {} types from {:?}",
                document.len(),
                path
            );
            document
        }
        Some(path) => {
            tracing::debug!("No component library at {:?}, using built-in", path);
            builtin_document()
        }
        None => builtin_document(),
    };

    Ok(ComponentLibrary::from_document(document))
}
