//! Digi-Key Product Search Client
//!
//! Keyword search against the Digi-Key product API. Needs both an OAuth
//! bearer token and the application's client id.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::schema::{ComponentSpec, PhysicalComponent};
use crate::suppliers::adapter::{
    build_query, credential, derive_value, null_as_default, select_best_offer, SupplierAdapter,
    SupplierError,
};

pub const DEFAULT_DIGIKEY_URL: &str = "https://api.digikey.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LIMIT: usize = 10;

/// Parameter names that carry the package, in lookup order
const PACKAGE_PARAMETERS: &[&str] = &["Package / Case", "Supplier Device Package"];

pub struct DigikeySupplier {
    client: Client,
    api_key: Option<String>,
    client_id: Option<String>,
    base_url: String,
    limit: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct KeywordRequest {
    keywords: String,
    limit: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeywordResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Product {
    #[serde(default)]
    manufacturer_product_number: Option<String>,
    #[serde(default)]
    manufacturer: Option<Named>,
    #[serde(default)]
    description: Option<Description>,
    #[serde(default)]
    datasheet_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    product_variations: Vec<Variation>,
    #[serde(default, deserialize_with = "null_as_default")]
    parameters: Vec<Parameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Named {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Description {
    #[serde(default)]
    product_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Variation {
    #[serde(default, rename = "DigiKeyProductNumber")]
    digikey_product_number: Option<String>,
    #[serde(default, rename = "QuantityAvailableforPackageType", deserialize_with = "null_as_default")]
    quantity_available: i64,
    #[serde(default, rename = "StandardPricing", deserialize_with = "null_as_default")]
    standard_pricing: Vec<PriceBreak>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PriceBreak {
    #[serde(default, deserialize_with = "null_as_default")]
    break_quantity: u64,
    #[serde(default)]
    unit_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Parameter {
    #[serde(default, deserialize_with = "null_as_default")]
    parameter_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    value_text: String,
}

impl Variation {
    fn unit_price(&self) -> Option<f64> {
        self.standard_pricing
            .iter()
            .min_by_key(|p| p.break_quantity)
            .and_then(|p| p.unit_price)
    }
}

impl DigikeySupplier {
    pub fn new(api_key: Option<String>, client_id: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: credential(api_key),
            client_id: credential(client_id),
            base_url: DEFAULT_DIGIKEY_URL.to_string(),
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

/// Package code from a parameter value: `0603 (1608 Metric)` reads as `0603`
fn package_code(raw: &str) -> String {
    let code = raw.split(" (").next().unwrap_or(raw).trim();
    if code.is_empty() {
        raw.trim().to_string()
    } else {
        code.to_string()
    }
}

pub(crate) fn parse_search_response(body: &str) -> Result<Vec<PhysicalComponent>, SupplierError> {
    let response: KeywordResponse =
        serde_json::from_str(body).map_err(|e| SupplierError::ParseError(e.to_string()))?;

    let mut components = Vec::new();
    for product in &response.products {
        let mpn = match product.manufacturer_product_number.as_deref().map(str::trim) {
            Some(mpn) if !mpn.is_empty() => mpn,
            _ => continue,
        };

        let variation = match select_best_offer(
            &product.product_variations,
            |v| v.quantity_available,
            Variation::unit_price,
        ) {
            Some(variation) => variation,
            None => continue,
        };

        let mut specifications: BTreeMap<String, String> = product
            .parameters
            .iter()
            .filter(|p| !p.parameter_text.is_empty())
            .map(|p| (p.parameter_text.clone(), p.value_text.clone()))
            .collect();

        let package = PACKAGE_PARAMETERS
            .iter()
            .find_map(|name| {
                specifications
                    .get(*name)
                    .map(|raw| package_code(raw))
                    .filter(|code| !code.is_empty())
            })
            .unwrap_or_else(|| "Unknown".to_string());
        derive_value(&mut specifications);

        components.push(PhysicalComponent {
            mpn: mpn.to_string(),
            manufacturer: product
                .manufacturer
                .as_ref()
                .and_then(|m| m.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            description: product
                .description
                .as_ref()
                .and_then(|d| d.product_description.clone())
                .unwrap_or_default(),
            package,
            supplier: "Digikey".to_string(),
            supplier_pn: variation
                .digikey_product_number
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            price: variation.unit_price(),
            stock: Some(variation.quantity_available as u64),
            datasheet: product.datasheet_url.clone(),
            specifications,
        });
    }

    Ok(components)
}

#[async_trait]
impl SupplierAdapter for DigikeySupplier {
    fn name(&self) -> &str {
        "digikey"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some() && self.client_id.is_some()
    }

    async fn search(&self, spec: &ComponentSpec) -> Result<Vec<PhysicalComponent>, SupplierError> {
        let (api_key, client_id) = match (self.api_key.as_deref(), self.client_id.as_deref()) {
            (Some(key), Some(id)) => (key, id),
            _ => return Err(SupplierError::MissingCredentials(self.name().to_string())),
        };

        let url = format!("{}/products/v4/search/keyword", self.base_url);
        let request = KeywordRequest {
            keywords: build_query(spec),
            limit: self.limit,
        };

        tracing::debug!("Digi-Key search: {} ({})", request.keywords, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("X-DIGIKEY-Client-Id", client_id)
            .json(&request)
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
