//! Supplier Federation
//!
//! Fans a search out to every available adapter and concatenates what comes
//! back. Adapters run concurrently, each under its own timeout; a failing,
//! slow or panicking adapter contributes nothing and never blocks its peers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::core::MapperConfig;
use crate::schema::{ComponentSpec, PhysicalComponent};
use crate::suppliers::adapter::{SupplierAdapter, SupplierError};
use crate::suppliers::digikey::DigikeySupplier;
use crate::suppliers::lcsc::LcscSupplier;
use crate::suppliers::octopart::OctopartSupplier;

pub const DEFAULT_SUPPLIER_TIMEOUT: Duration = Duration::from_secs(10);

/// Availability of one registered adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierStatus {
    pub name: String,
    pub available: bool,
}

/// Ordered set of supplier adapters.
///
/// Registration order is significant: results are concatenated in this
/// order, which decides ties during selection.
pub struct SupplierFederation {
    adapters: Vec<Arc<dyn SupplierAdapter>>,
    timeout: Duration,
}

impl SupplierFederation {
    /// Create a federation with no adapters
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            timeout: DEFAULT_SUPPLIER_TIMEOUT,
        }
    }

    /// LCSC, Octopart and Digi-Key, configured from `config`
    pub fn from_config(config: &MapperConfig) -> Self {
        let timeout = config.supplier_timeout();

        let lcsc = LcscSupplier::new(config.lcsc_api_key.clone())
            .with_base_url(config.lcsc_base_url.clone())
            .with_limit(config.search_limit)
            .with_timeout(timeout);
        let octopart = OctopartSupplier::new(config.octopart_api_key.clone())
            .with_base_url(config.octopart_base_url.clone())
            .with_limit(config.search_limit)
            .with_timeout(timeout);
        let digikey = DigikeySupplier::new(
            config.digikey_api_key.clone(),
            config.digikey_client_id.clone(),
        )
        .with_base_url(config.digikey_base_url.clone())
        .with_limit(config.search_limit)
        .with_timeout(timeout);

        Self::new()
            .with_timeout(timeout)
            .with_adapter(Arc::new(lcsc))
            .with_adapter(Arc::new(octopart))
            .with_adapter(Arc::new(digikey))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn SupplierAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Append an adapter after those already registered
    pub fn register(&mut self, adapter: Arc<dyn SupplierAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Availability of every registered adapter, in registration order
    pub fn get_status(&self) -> Vec<SupplierStatus> {
        self.adapters
            .iter()
            .map(|a| SupplierStatus {
                name: a.name().to_string(),
                available: a.is_available(),
            })
            .collect()
    }

    /// Whether any adapter could be queried
    pub fn has_available(&self) -> bool {
        self.adapters.iter().any(|a| a.is_available())
    }

    /// Search every available adapter and concatenate the results.
    ///
    /// Output is ordered by adapter registration, then by each adapter's own
    /// result order, regardless of which request finished first.
    pub async fn search(&self, spec: &ComponentSpec) -> Vec<PhysicalComponent> {
        let mut pending = Vec::new();

        for adapter in &self.adapters {
            if !adapter.is_available() {
                tracing::warn!("Supplier {} is not configured, skipping", adapter.name());
                continue;
            }

            let name = adapter.name().to_string();
            let adapter = Arc::clone(adapter);
            let spec = spec.clone();
            let timeout = self.timeout;

            let handle = tokio::spawn(async move {
                match tokio::time::timeout(timeout, adapter.search(&spec)).await {
                    Ok(result) => result,
                    Err(_) => Err(SupplierError::Timeout(timeout)),
                }
            });
            pending.push((name, handle));
        }

        let mut candidates = Vec::new();
        for (name, handle) in pending {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(SupplierError::TaskFailed(e.to_string())),
            };

            match outcome {
                Ok(found) => {
                    tracing::debug!("Supplier {} returned {} candidates", name, found.len());
                    candidates.extend(found);
                }
                Err(e) => {
                    tracing::warn!("Supplier {} search failed: {}", name, e);
                }
            }
        }

        candidates
    }
}

impl Default for SupplierFederation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn part(mpn: &str, supplier: &str) -> PhysicalComponent {
        PhysicalComponent {
            mpn: mpn.to_string(),
            manufacturer: "Test".to_string(),
            description: String::new(),
            package: "0603".to_string(),
            supplier: supplier.to_string(),
            supplier_pn: format!("{}-{}", supplier, mpn),
            price: Some(0.05),
            stock: Some(1000),
            datasheet: None,
            specifications: BTreeMap::new(),
        }
    }

    enum Behavior {
        Return(Vec<&'static str>),
        Fail,
        Panic,
        Sleep(Duration),
    }

    struct StubSupplier {
        name: &'static str,
        available: bool,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubSupplier {
        fn new(name: &'static str, available: bool, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                available,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SupplierAdapter for StubSupplier {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn search(&self, _spec: &ComponentSpec) -> Result<Vec<PhysicalComponent>, SupplierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Return(mpns) => Ok(mpns.iter().map(|m| part(m, self.name)).collect()),
                Behavior::Fail => Err(SupplierError::ApiError {
                    status: 500,
                    message: "boom".to_string(),
                }),
                Behavior::Panic => panic!("adapter bug"),
                Behavior::Sleep(d) => {
                    tokio::time::sleep(*d).await;
                    Ok(vec![part("LATE", self.name)])
                }
            }
        }
    }

    #[tokio::test]
    async fn test_empty_federation_returns_nothing() {
        let federation = SupplierFederation::new();
        assert!(federation.search(&ComponentSpec::new("resistor")).await.is_empty());
        assert!(!federation.has_available());
    }

    #[tokio::test]
    async fn test_unavailable_adapters_are_not_called() {
        let offline = StubSupplier::new("offline", false, Behavior::Return(vec!["A"]));
        let federation = SupplierFederation::new().with_adapter(offline.clone());

        let found = federation.search(&ComponentSpec::new("resistor")).await;
        assert!(found.is_empty());
        assert_eq!(offline.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_follow_registration_order() {
        let slow = StubSupplier::new(
            "slow",
            true,
            Behavior::Sleep(Duration::from_millis(50)),
        );
        let fast = StubSupplier::new("fast", true, Behavior::Return(vec!["B1", "B2"]));
        let federation = SupplierFederation::new()
            .with_timeout(Duration::from_secs(5))
            .with_adapter(slow)
            .with_adapter(fast);

        let found = federation.search(&ComponentSpec::new("resistor")).await;
        let mpns: Vec<_> = found.iter().map(|p| p.mpn.as_str()).collect();
        assert_eq!(mpns, vec!["LATE", "B1", "B2"]);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_federation() {
        let federation = SupplierFederation::new()
            .with_adapter(StubSupplier::new("failing", true, Behavior::Fail))
            .with_adapter(StubSupplier::new("panicking", true, Behavior::Panic))
            .with_adapter(StubSupplier::new("good", true, Behavior::Return(vec!["OK"])));

        let found = federation.search(&ComponentSpec::new("resistor")).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].mpn, "OK");
    }

    #[tokio::test]
    async fn test_timed_out_adapter_contributes_nothing() {
        let federation = SupplierFederation::new()
            .with_timeout(Duration::from_millis(20))
            .with_adapter(StubSupplier::new(
                "stuck",
                true,
                Behavior::Sleep(Duration::from_secs(30)),
            ))
            .with_adapter(StubSupplier::new("good", true, Behavior::Return(vec!["OK"])));

        let found = federation.search(&ComponentSpec::new("resistor")).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].supplier, "good");
    }

    #[test]
    fn test_status_from_default_config() {
        let federation = SupplierFederation::from_config(&MapperConfig::default());
        let status = federation.get_status();
        let names: Vec<_> = status.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["lcsc", "octopart", "digikey"]);
        assert!(status.iter().all(|s| !s.available));
    }

    #[test]
    fn test_status_with_credentials() {
        let config = MapperConfig {
            octopart_api_key: Some("key".to_string()),
            ..Default::default()
        };
        let federation = SupplierFederation::from_config(&config);
        let available: Vec<_> = federation
            .get_status()
            .into_iter()
            .filter(|s| s.available)
            .map(|s| s.name)
            .collect();
        assert_eq!(available, vec!["octopart".to_string()]);
    }
}
