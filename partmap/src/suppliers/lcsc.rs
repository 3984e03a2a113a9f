//! LCSC Catalog Client
//!
//! LCSC's API is credential-gated: without an API key the adapter reports
//! itself unavailable and is never queried.

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

pub const DEFAULT_LCSC_URL: &str = "https://api.lcsc.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LIMIT: usize = 10;

pub struct LcscSupplier {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default, rename = "productList", deserialize_with = "null_as_default")]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    #[serde(default)]
    product_code: Option<String>,
    #[serde(default)]
    product_model: Option<String>,
    #[serde(default)]
    brand_name_en: Option<String>,
    #[serde(default)]
    product_intro_en: Option<String>,
    #[serde(default)]
    encap_standard: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    stock_number: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    product_price_list: Vec<PriceLadder>,
    #[serde(default)]
    pdf_url: Option<String>,
    #[serde(default, rename = "paramVOList", deserialize_with = "null_as_default")]
    params: Vec<Param>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceLadder {
    #[serde(default, deserialize_with = "null_as_default")]
    ladder: u64,
    #[serde(default)]
    product_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Param {
    #[serde(default)]
    param_name_en: Option<String>,
    #[serde(default)]
    param_value_en: Option<String>,
}

impl Product {
    /// Unit price at the smallest quantity break
    fn unit_price(&self) -> Option<f64> {
        self.product_price_list
            .iter()
            .min_by_key(|p| p.ladder)
            .and_then(|p| p.product_price)
    }
}

impl LcscSupplier {
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: credential(api_key),
            base_url: DEFAULT_LCSC_URL.to_string(),
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

/// Turn a search payload into candidates.
///
/// Every LCSC product is a single offer priced at its smallest quantity
/// break. Catalog order is kept.
pub(crate) fn parse_search_response(body: &str) -> Result<Vec<PhysicalComponent>, SupplierError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SupplierError::ParseError(e.to_string()))?;
    let products = response.result.map(|r| r.products).unwrap_or_default();

    let mut components = Vec::new();
    for product in &products {
        // One-element offer list: drops the product when it is out of stock
        if select_best_offer(std::slice::from_ref(product), |p| p.stock_number, Product::unit_price)
            .is_none()
        {
            continue;
        }

        let (mpn, code) = match (product.product_model.as_deref(), product.product_code.as_deref()) {
            (Some(mpn), Some(code)) if !mpn.trim().is_empty() => (mpn.trim(), code),
            _ => continue,
        };

        let mut specifications: BTreeMap<String, String> = product
            .params
            .iter()
            .filter_map(|p| match (&p.param_name_en, &p.param_value_en) {
                (Some(name), Some(value)) if !name.trim().is_empty() => {
                    Some((name.clone(), value.clone()))
                }
                _ => None,
            })
            .collect();
        derive_value(&mut specifications);

        components.push(PhysicalComponent {
            mpn: mpn.to_string(),
            manufacturer: product
                .brand_name_en
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            description: product.product_intro_en.clone().unwrap_or_default(),
            package: product
                .encap_standard
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            supplier: "LCSC".to_string(),
            supplier_pn: code.to_string(),
            price: product.unit_price(),
            stock: Some(product.stock_number as u64),
            datasheet: product.pdf_url.clone(),
            specifications,
        });
    }

    Ok(components)
}

#[async_trait]
impl SupplierAdapter for LcscSupplier {
    fn name(&self) -> &str {
        "lcsc"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, spec: &ComponentSpec) -> Result<Vec<PhysicalComponent>, SupplierError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SupplierError::MissingCredentials(self.name().to_string()))?;

        let url = format!("{}/products/search", self.base_url);
        let keyword = build_query(spec);
        let limit = self.limit.to_string();

        tracing::debug!("LCSC search: {} ({})", keyword, url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", api_key)
            .query(&[("keyword", keyword.as_str()), ("limit", limit.as_str())])
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
