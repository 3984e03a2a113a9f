//! Supplier Adapter Trait
//!
//! Common interface for catalog search backends (LCSC, Octopart, Digi-Key).

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::schema::{ComponentSpec, PhysicalComponent};

#[derive(Debug, Error)]
pub enum SupplierError {
    #[error("Supplier request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Supplier API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Failed to parse supplier response: {0}")]
    ParseError(String),
    #[error("Missing credentials for {0}")]
    MissingCredentials(String),
    #[error("Supplier search timed out after {0:?}")]
    Timeout(Duration),
    #[error("Supplier task failed: {0}")]
    TaskFailed(String),
}

/// A searchable parts catalog
#[async_trait]
pub trait SupplierAdapter: Send + Sync {
    /// Name used in logs and status output
    fn name(&self) -> &str;

    /// Whether the adapter is configured well enough to be queried.
    ///
    /// Must not touch the network.
    fn is_available(&self) -> bool;

    /// Search the catalog for parts matching `spec`, one candidate per part
    async fn search(&self, spec: &ComponentSpec) -> Result<Vec<PhysicalComponent>, SupplierError>;
}

/// Free-text query sent to keyword search APIs: "<type> <value>"
pub fn build_query(spec: &ComponentSpec) -> String {
    let mut parts = vec![spec.component_type.as_str()];
    if let Some(ref value) = spec.value {
        parts.push(value.as_str());
    }
    parts.join(" ")
}

/// Pick the cheapest in-stock offer.
///
/// Offers without stock are discarded; offers without a price sort after
/// every priced offer. Equal prices keep their original order.
pub fn select_best_offer<T>(
    offers: &[T],
    stock: impl Fn(&T) -> i64,
    price: impl Fn(&T) -> Option<f64>,
) -> Option<&T> {
    let mut in_stock: Vec<&T> = offers.iter().filter(|o| stock(*o) > 0).collect();
    in_stock.sort_by(|a, b| {
        let pa = price(*a).unwrap_or(f64::INFINITY);
        let pb = price(*b).unwrap_or(f64::INFINITY);
        pa.total_cmp(&pb)
    });
    in_stock.into_iter().next()
}

/// Parameter names that carry a part's primary value
const VALUE_PARAMETERS: &[&str] = &["resistance", "capacitance", "frequency", "inductance", "color"];

/// Fill in `value` from the first value-like parameter if the source did not
/// report one directly.
pub fn derive_value(specs: &mut BTreeMap<String, String>) {
    if specs.contains_key("value") {
        return;
    }
    let found = VALUE_PARAMETERS.iter().find_map(|wanted| {
        specs
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value.clone())
    });
    if let Some(value) = found {
        specs.insert("value".to_string(), value);
    }
}

/// Read an explicit JSON `null` as the field's default.
///
/// Catalog APIs send `null` for unknown stock, ladders and parameter text;
/// one such field must not fail the whole payload.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Treat empty credential strings as missing
pub(crate) fn credential(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
