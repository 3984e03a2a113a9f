//! Result Cache
//!
//! One pretty-printed JSON document per spec key under the cache root.
//! Entries never expire; the cache has no in-memory layer.

use std::fs;
use std::io::{self, Write};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::schema::{ComponentSpec, MappingResult};

const ENTRY_EXTENSION: &str = "json";
const KEY_EXTENSION: &str = "key";

/// Longest encoded stem stored as-is; longer keys get a hashed name
const MAX_STEM_LEN: usize = 200;
/// Readable prefix kept in front of the digest of a hashed name
const HASHED_PREFIX_LEN: usize = 150;
const HASH_SEPARATOR: char = '~';

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Cache key for a spec: `type_value_package_tolerance`, lowercased.
///
/// Missing value reads as `none`, missing package and tolerance as `any`.
/// Power, voltage, temperature and attributes are not part of the key.
pub fn cache_key(spec: &ComponentSpec) -> String {
    [
        spec.component_type.as_str(),
        spec.value.as_deref().unwrap_or("none"),
        spec.package.as_deref().unwrap_or("any"),
        spec.tolerance.as_deref().unwrap_or("any"),
    ]
    .join("_")
    .to_lowercase()
}

fn is_plain(byte: u8) -> bool {
    matches!(byte, b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-')
}

/// Key to file name: bytes outside `[a-z0-9._-]` become `%XX`.
///
/// Stems over 200 bytes are cut to a 150-byte prefix followed by `~` and the
/// first 16 hex digits of the key's SHA-256, so every name stays well under
/// the usual 255-byte file name limit. Such names cannot be decoded; the
/// cache keeps the key in a `.key` file next to the entry.
pub fn encode_file_name(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if is_plain(byte) {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }

    if stem.len() > MAX_STEM_LEN {
        let mut cut = HASHED_PREFIX_LEN;
        // Never split a %XX escape
        if let Some(pos) = stem[..cut].rfind('%') {
            if pos + 3 > cut {
                cut = pos;
            }
        }
        let digest = Sha256::digest(key.as_bytes());
        stem = format!("{}{}{}", &stem[..cut], HASH_SEPARATOR, hex::encode(&digest[..8]));
    }

    format!("{}.{}", stem, ENTRY_EXTENSION)
}

/// Inverse of `encode_file_name`; `None` for hashed names and for names it
/// could not have produced
pub fn decode_file_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(".json")?;
    let raw = stem.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let digits = stem.get(i + 1..i + 3)?;
            bytes.push(u8::from_str_radix(digits, 16).ok()?);
            i += 3;
        } else if is_plain(raw[i]) {
            bytes.push(raw[i]);
            i += 1;
        } else {
            return None;
        }
    }
    String::from_utf8(bytes).ok()
}

fn is_hashed_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.contains(HASH_SEPARATOR))
}

fn key_path(entry: &Path) -> PathBuf {
    entry.with_extension(KEY_EXTENSION)
}

fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Persistent spec-key to `MappingResult` store
#[derive(Debug, Clone)]
pub struct ResultCache {
    root: PathBuf,
}

impl ResultCache {
    /// Open the cache at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!("Result cache at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(encode_file_name(key))
    }

    /// Cached result for `key`.
    ///
    /// Missing, unreadable and corrupt entries are all misses.
    pub fn get(&self, key: &str) -> Option<MappingResult> {
        let path = self.path_for(key);
        if is_hashed_name(&path) && self.stored_key(&path).as_deref() != Some(key) {
            tracing::debug!("Cache entry {} belongs to another key", path.display());
            return None;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Store `result` under `key`, replacing any previous entry.
    ///
    /// The document is written to a temporary file in the cache directory and
    /// renamed into place, so readers never see a partial entry.
    pub fn put(&self, key: &str, result: &MappingResult) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(result)?;
        let path = self.path_for(key);
        if is_hashed_name(&path) {
            fs::write(key_path(&path), key)?;
        }

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        tracing::debug!("Cached result for {}", key);
        Ok(())
    }

    /// Delete one entry; `false` if it was not cached
    pub fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let path = self.path_for(key);
        let removed = remove_if_present(&path)?;
        if is_hashed_name(&path) {
            remove_if_present(&key_path(&path))?;
        }
        Ok(removed)
    }

    /// Keys of every cached entry, sorted
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .entry_paths()?
            .iter()
            .filter_map(|p| {
                if is_hashed_name(p) {
                    self.stored_key(p)
                } else {
                    p.file_name().and_then(|n| n.to_str()).and_then(decode_file_name)
                }
            })
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Delete every entry, returning how many were removed
    pub fn clear(&self) -> Result<usize, CacheError> {
        let paths = self.entry_paths()?;
        for path in &paths {
            fs::remove_file(path)?;
            if is_hashed_name(path) {
                remove_if_present(&key_path(path))?;
            }
        }
        tracing::info!("Cleared {} cache entries", paths.len());
        Ok(paths.len())
    }

    fn stored_key(&self, entry: &Path) -> Option<String> {
        fs::read_to_string(key_path(entry)).ok()
    }

    fn entry_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_entry = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION);
            if is_entry {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}
