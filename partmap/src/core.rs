//! Core mapping logic shared by the library API and the CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{cache_key, CacheError, ResultCache};
use crate::library::{LibraryError, LocalMatcher};
use crate::schema::{ComponentSpec, MappingResult};
use crate::scorer::select_best_match;
use crate::suppliers::digikey::DEFAULT_DIGIKEY_URL;
use crate::suppliers::lcsc::DEFAULT_LCSC_URL;
use crate::suppliers::octopart::DEFAULT_OCTOPART_URL;
use crate::suppliers::{SupplierAdapter, SupplierFederation};

/// Local hits below this confidence also consult the suppliers
pub const LOCAL_CONFIDENCE_THRESHOLD: f64 = 0.8;

pub const DEFAULT_CACHE_DIR: &str = "cache/components";

#[derive(Debug, thiserror::Error)]
pub enum PartmapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Component database error: {0}")]
    Database(#[from] LibraryError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Invalid component spec: {0}")]
    InvalidSpec(String),
}

/// Mapper settings. Every field has a default, so a partial JSON file is
/// a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub cache_dir: PathBuf,
    /// Knowledge base JSON; built-in database when unset or missing
    pub database_path: Option<PathBuf>,
    pub lcsc_api_key: Option<String>,
    pub lcsc_base_url: String,
    pub octopart_api_key: Option<String>,
    pub octopart_base_url: String,
    pub digikey_api_key: Option<String>,
    pub digikey_client_id: Option<String>,
    pub digikey_base_url: String,
    pub supplier_timeout_secs: u64,
    pub search_limit: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            database_path: None,
            lcsc_api_key: None,
            lcsc_base_url: DEFAULT_LCSC_URL.to_string(),
            octopart_api_key: None,
            octopart_base_url: DEFAULT_OCTOPART_URL.to_string(),
            digikey_api_key: None,
            digikey_client_id: None,
            digikey_base_url: DEFAULT_DIGIKEY_URL.to_string(),
            supplier_timeout_secs: 10,
            search_limit: 10,
        }
    }
}

impl MapperConfig {
    /// Per-adapter search timeout, never shorter than one second
    pub fn supplier_timeout(&self) -> Duration {
        Duration::from_secs(self.supplier_timeout_secs.max(1))
    }

    /// Load a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, PartmapError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| PartmapError::Config(format!("{}: {}", path.display(), e)))?;
        if config.supplier_timeout_secs == 0 {
            return Err(PartmapError::Config(format!(
                "{}: supplier_timeout_secs must be at least 1",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Overlay the process environment on this config
    pub fn merge_env(self) -> Self {
        self.merge_with(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup` (an environment-like source).
    ///
    /// Reads `PARTMAP_CACHE_DIR`, `PARTMAP_DATABASE`, `LCSC_API_KEY`,
    /// `OCTOPART_API_KEY`, `DIGIKEY_API_KEY` and `DIGIKEY_CLIENT_ID`. Blank
    /// values are ignored.
    pub fn merge_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("PARTMAP_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(db) = get("PARTMAP_DATABASE") {
            self.database_path = Some(PathBuf::from(db));
        }
        if let Some(key) = get("LCSC_API_KEY") {
            self.lcsc_api_key = Some(key);
        }
        if let Some(key) = get("OCTOPART_API_KEY") {
            self.octopart_api_key = Some(key);
        }
        if let Some(key) = get("DIGIKEY_API_KEY") {
            self.digikey_api_key = Some(key);
        }
        if let Some(id) = get("DIGIKEY_CLIENT_ID") {
            self.digikey_client_id = Some(id);
        }
        self
    }
}

/// Resolves abstract component specs to purchasable parts.
///
/// Lookup order: result cache, local knowledge base, supplier federation.
/// Whatever is returned is cached, including the UNKNOWN placeholder.
pub struct ComponentMapper {
    cache: ResultCache,
    matcher: LocalMatcher,
    federation: SupplierFederation,
}

impl ComponentMapper {
    /// Mapper with the default LCSC, Octopart and Digi-Key adapters
    pub fn new(config: &MapperConfig) -> Result<Self, PartmapError> {
        let federation = SupplierFederation::from_config(config);
        Self::build(config, federation)
    }

    /// Mapper querying `adapters`, in the given order, instead of the
    /// default suppliers
    pub fn with_adapters(
        config: &MapperConfig,
        adapters: Vec<Arc<dyn SupplierAdapter>>,
    ) -> Result<Self, PartmapError> {
        let federation = adapters
            .into_iter()
            .fold(SupplierFederation::new().with_timeout(config.supplier_timeout()), |f, a| {
                f.with_adapter(a)
            });
        Self::build(config, federation)
    }

    pub fn from_parts(
        cache: ResultCache,
        matcher: LocalMatcher,
        federation: SupplierFederation,
    ) -> Self {
        Self {
            cache,
            matcher,
            federation,
        }
    }

    fn build(config: &MapperConfig, federation: SupplierFederation) -> Result<Self, PartmapError> {
        let cache = ResultCache::new(&config.cache_dir)?;
        let matcher = LocalMatcher::from_path(config.database_path.as_deref())?;
        Ok(Self::from_parts(cache, matcher, federation))
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn matcher(&self) -> &LocalMatcher {
        &self.matcher
    }

    pub fn federation(&self) -> &SupplierFederation {
        &self.federation
    }

    /// Map a spec to a physical part.
    ///
    /// Never fails: supplier errors degrade to fewer candidates and an
    /// unresolvable spec yields `MappingResult::unknown` with confidence 0.
    pub async fn map_component(&self, spec: &ComponentSpec) -> MappingResult {
        let key = cache_key(spec);

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Cache hit for {}", key);
            return cached;
        }
        tracing::debug!("Cache miss for {}", key);
        tracing::info!("Mapping {}", spec);

        let local = self.matcher.match_local(spec);
        let result = match local {
            Some(local) if local.confidence >= LOCAL_CONFIDENCE_THRESHOLD => local,
            local => {
                let candidates = self.federation.search(spec).await;
                tracing::debug!("{} supplier candidates for {}", candidates.len(), spec);
                // A below-threshold local hit still beats nothing
                select_best_match(spec, candidates)
                    .or(local)
                    .unwrap_or_else(|| MappingResult::unknown(spec))
            }
        };

        if result.is_unknown() {
            tracing::warn!("No suitable part found for {}", spec);
        }

        if let Err(e) = self.cache.put(&key, &result) {
            tracing::warn!("Failed to cache result for {}: {}", key, e);
        }

        result
    }
}
