//! Component Library Schema
//!
//! Serde types for the library JSON document and the in-memory index built
//! from it.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::normalize::normalize;

/// Catalog information stored for one library value or named part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartInfo {
    /// LCSC catalog number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcsc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Tolerance, voltage and anything else the author recorded
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PartInfo {
    /// All recorded fields as a flat string map
    pub fn to_specifications(&self) -> BTreeMap<String, String> {
        let mut specs = BTreeMap::new();
        let named = [
            ("lcsc", &self.lcsc),
            ("mpn", &self.mpn),
            ("manufacturer", &self.manufacturer),
            ("description", &self.description),
            ("package", &self.package),
        ];
        for (key, field) in named {
            if let Some(v) = field {
                specs.insert(key.to_string(), v.clone());
            }
        }
        for (key, value) in &self.extra {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            specs.insert(key.clone(), text);
        }
        specs
    }
}

/// One component type's section of the library document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Value recognizers; informational, never required for a hit
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Normalized value -> part (passives)
    #[serde(default)]
    pub common_values: BTreeMap<String, PartInfo>,

    /// Part name -> part (ICs, connectors)
    #[serde(default)]
    pub common_parts: BTreeMap<String, PartInfo>,

    /// Spec fields that matter for this type
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// The library file: component type -> entry
pub type LibraryDocument = BTreeMap<String, LibraryEntry>;

/// Lookup-ready form of a `LibraryEntry`
#[derive(Debug, Clone)]
pub struct IndexedEntry {
    values: HashMap<String, PartInfo>,
    parts: HashMap<String, PartInfo>,
    patterns: Vec<Regex>,
    pub attributes: Vec<String>,
}

impl IndexedEntry {
    fn build(component_type: &str, entry: LibraryEntry) -> Self {
        let values = entry
            .common_values
            .into_iter()
            .map(|(value, info)| (normalize(&value, component_type), info))
            .collect();

        let parts = entry
            .common_parts
            .into_iter()
            .map(|(name, info)| (name.trim().to_uppercase(), info))
            .collect();

        let patterns = entry
            .patterns
            .iter()
            .filter_map(|p| match RegexBuilder::new(p).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("Ignoring invalid {} pattern {:?}: {}", component_type, p, e);
                    None
                }
            })
            .collect();

        Self {
            values,
            parts,
            patterns,
            attributes: entry.attributes,
        }
    }

    /// Look up an already-normalized value
    pub fn value(&self, normalized: &str) -> Option<&PartInfo> {
        self.values.get(normalized)
    }

    /// Look up an upper-cased part name
    pub fn part(&self, name: &str) -> Option<&PartInfo> {
        self.parts.get(name)
    }

    pub fn recognizes(&self, raw_value: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(raw_value))
    }

    /// Number of values plus named parts
    pub fn count(&self) -> usize {
        self.values.len() + self.parts.len()
    }

    /// Lookup keys of every value and named part, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .values
            .keys()
            .chain(self.parts.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys
    }
}

/// In-memory component library keyed by component type
#[derive(Debug, Clone, Default)]
pub struct ComponentLibrary {
    entries: BTreeMap<String, IndexedEntry>,
}

impl ComponentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: LibraryDocument) -> Self {
        let mut library = Self::new();
        for (component_type, entry) in document {
            library.add(&component_type, entry);
        }
        library
    }

    /// Add or replace a component type's entry
    pub fn add(&mut self, component_type: &str, entry: LibraryEntry) {
        let key = component_type.trim().to_lowercase();
        let indexed = IndexedEntry::build(&key, entry);
        self.entries.insert(key, indexed);
    }

    pub fn get(&self, component_type: &str) -> Option<&IndexedEntry> {
        self.entries.get(component_type.trim().to_lowercase().as_str())
    }

    /// Component types, sorted
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn type_count(&self) -> usize {
        self.entries.len()
    }

    /// Total values and named parts across every type
    pub fn count(&self) -> usize {
        self.entries.values().map(IndexedEntry::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
