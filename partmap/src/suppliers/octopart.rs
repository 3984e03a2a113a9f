//! Octopart Search Client
//!
//! General parts search across many distributors. Each part's cheapest
//! in-stock offer becomes one candidate, attributed to the offering seller.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::schema::{ComponentSpec, PhysicalComponent};
use crate::suppliers::adapter::{
    build_query, credential, derive_value, null_as_default, select_best_offer, SupplierAdapter,
    SupplierError,
};

pub const DEFAULT_OCTOPART_URL: &str = "https://octopart.com/api/v4";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LIMIT: usize = 10;

/// Spec keys that may carry the package name, in lookup order
const PACKAGE_KEYS: &[&str] = &["case_package", "package", "case", "package_case"];

pub struct OctopartSupplier {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    part: Option<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    mpn: Option<String>,
    #[serde(default)]
    manufacturer: Option<Named>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    datasheet_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    specs: BTreeMap<String, Spec>,
    #[serde(default, deserialize_with = "null_as_default")]
    offers: Vec<Offer>,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Spec {
    #[serde(default, deserialize_with = "null_as_default")]
    value: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Offer {
    #[serde(default)]
    seller: Option<Named>,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    in_stock_quantity: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    prices: BTreeMap<String, Vec<PriceBreak>>,
}

#[derive(Debug, Deserialize)]
struct PriceBreak {
    #[serde(default)]
    price: Option<f64>,
}

impl Offer {
    fn usd_price(&self) -> Option<f64> {
        self.prices
            .get("USD")
            .and_then(|breaks| breaks.first())
            .and_then(|b| b.price)
    }
}

impl Spec {
    fn first_value(&self) -> Option<String> {
        self.value.first().map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

impl OctopartSupplier {
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: credential(api_key),
            base_url: DEFAULT_OCTOPART_URL.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }
}

/// Turn a search payload into candidates
pub(crate) fn parse_search_response(body: &str) -> Result<Vec<PhysicalComponent>, SupplierError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SupplierError::ParseError(e.to_string()))?;

    let mut components = Vec::new();
    for part in response.results.into_iter().filter_map(|r| r.part) {
        let mpn = match part.mpn.as_deref().map(str::trim) {
            Some(mpn) if !mpn.is_empty() => mpn.to_string(),
            _ => continue,
        };

        let offer = match select_best_offer(&part.offers, |o| o.in_stock_quantity, Offer::usd_price) {
            Some(offer) => offer,
            None => continue,
        };

        let package = PACKAGE_KEYS
            .iter()
            .find_map(|key| part.specs.get(*key).and_then(Spec::first_value))
            .unwrap_or_else(|| "Unknown".to_string());

        let mut specifications: BTreeMap<String, String> = part
            .specs
            .iter()
            .filter_map(|(key, spec)| spec.first_value().map(|v| (key.clone(), v)))
            .collect();
        derive_value(&mut specifications);

        components.push(PhysicalComponent {
            mpn,
            manufacturer: part
                .manufacturer
                .as_ref()
                .and_then(|m| m.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            description: part.description.clone().unwrap_or_default(),
            package,
            supplier: offer
                .seller
                .as_ref()
                .and_then(|s| s.name.clone())
                .unwrap_or_else(|| "Octopart".to_string()),
            supplier_pn: offer.sku.clone().unwrap_or_else(|| "Unknown".to_string()),
            price: offer.usd_price(),
            stock: Some(offer.in_stock_quantity.max(0) as u64),
            datasheet: part.datasheet_url.clone(),
            specifications,
        });
    }

    Ok(components)
}

#[async_trait]
impl SupplierAdapter for OctopartSupplier {
    fn name(&self) -> &str {
        "octopart"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, spec: &ComponentSpec) -> Result<Vec<PhysicalComponent>, SupplierError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SupplierError::MissingCredentials(self.name().to_string()))?;

        let url = format!("{}/search", self.base_url);
        let query = build_query(spec);
        let limit = self.limit.to_string();

        tracing::debug!("Octopart search: {} ({})", query, url);

        let response = self
            .client
            .get(&url)
            .header("apikey", api_key)
            .query(&[
                ("q", query.as_str()),
                ("start", "0"),
                ("limit", limit.as_str()),
                ("include", "specs,offers"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SupplierError::ApiError { status, message });
        }

        let body = response.text().await?;
        parse_search_response(&body)
    }
}
