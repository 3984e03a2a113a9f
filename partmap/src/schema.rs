//! Component Mapping Data Types
//!
//! Requests (`ComponentSpec`), catalog candidates (`PhysicalComponent`) and
//! the mapper's answer (`MappingResult`). The serde shapes here are also the
//! on-disk cache document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::PartmapError;

/// MPN of the synthetic placeholder returned when nothing usable was found
pub const UNKNOWN_MPN: &str = "UNKNOWN";

/// High-level component request, e.g. "resistor, 10k, 0603"
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Component type (resistor, capacitor, ic, ...)
    #[serde(rename = "type")]
    pub component_type: String,

    /// Value as authored (10k, 100nF, NE555, blue)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<String>,

    /// Footprint (0603, SOIC-8)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,

    /// Anything not covered by the typed fields (dielectric, color, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl ComponentSpec {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: impl Into<String>) -> Self {
        self.tolerance = Some(tolerance.into());
        self
    }

    pub fn with_power(mut self, power: impl Into<String>) -> Self {
        self.power = Some(power.into());
        self
    }

    pub fn with_voltage(mut self, voltage: impl Into<String>) -> Self {
        self.voltage = Some(voltage.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_temperature(mut self, temperature: impl Into<String>) -> Self {
        self.temperature = Some(temperature.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Reject specs without a component type.
    ///
    /// The mapper does not call this; callers validate their input before
    /// handing it over.
    pub fn validate(&self) -> Result<(), PartmapError> {
        if self.component_type.trim().is_empty() {
            return Err(PartmapError::InvalidSpec(
                "component type is required".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.component_type)?;
        if let Some(ref value) = self.value {
            write!(f, " {}", value)?;
        }

        let mut extras = Vec::new();
        let typed = [
            ("package", &self.package),
            ("tolerance", &self.tolerance),
            ("power", &self.power),
            ("voltage", &self.voltage),
            ("temperature", &self.temperature),
        ];
        for (name, field) in typed {
            if let Some(v) = field {
                extras.push(format!("{}={}", name, v));
            }
        }
        for (k, v) in &self.attributes {
            extras.push(format!("{}={}", k, v));
        }

        if !extras.is_empty() {
            write!(f, " ({})", extras.join(", "))?;
        }
        Ok(())
    }
}

/// A concrete catalog entry with a manufacturer part number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalComponent {
    /// Manufacturer part number
    pub mpn: String,
    pub manufacturer: String,
    pub description: String,
    pub package: String,

    /// Source identifier (LCSC, Digikey, a marketplace seller name)
    pub supplier: String,

    /// Supplier catalog number
    pub supplier_pn: String,

    /// Unit price in USD
    #[serde(default)]
    pub price: Option<f64>,

    /// Units available
    #[serde(default)]
    pub stock: Option<u64>,

    #[serde(default)]
    pub datasheet: Option<String>,

    /// Source-reported attributes; `value` holds the raw value string when known
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl PhysicalComponent {
    /// The value string the source reported for this part, if any
    pub fn reported_value(&self) -> Option<&str> {
        self.specifications.get("value").map(String::as_str)
    }

    pub fn is_unknown(&self) -> bool {
        self.mpn == UNKNOWN_MPN
    }

    /// Copy without the specification bag, as alternatives are stored
    pub fn summary(&self) -> Self {
        Self {
            specifications: BTreeMap::new(),
            ..self.clone()
        }
    }
}

/// Outcome of a `map_component` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    /// Best match
    pub primary: PhysicalComponent,

    /// Next-best candidates, best first
    #[serde(default, serialize_with = "serialize_alternatives")]
    pub alternatives: Vec<PhysicalComponent>,

    /// 0.0 means no usable candidate was found
    pub confidence: f64,

    #[serde(default)]
    pub warnings: Vec<String>,
}

impl MappingResult {
    /// Placeholder result for a spec nothing could be found for
    pub fn unknown(spec: &ComponentSpec) -> Self {
        Self {
            primary: PhysicalComponent {
                mpn: UNKNOWN_MPN.to_string(),
                manufacturer: "Unknown".to_string(),
                description: format!("No match found for {}", spec.component_type),
                package: spec.package.clone().unwrap_or_else(|| "Unknown".to_string()),
                supplier: "None".to_string(),
                supplier_pn: "N/A".to_string(),
                price: None,
                stock: None,
                datasheet: None,
                specifications: BTreeMap::new(),
            },
            alternatives: vec![],
            confidence: 0.0,
            warnings: vec![format!("Could not find suitable part for {}", spec)],
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.primary.is_unknown()
    }
}

/// Alternatives as written to the cache document: every field except
/// `specifications`.
#[derive(Serialize)]
struct AlternativeView<'a> {
    mpn: &'a str,
    manufacturer: &'a str,
    description: &'a str,
    package: &'a str,
    supplier: &'a str,
    supplier_pn: &'a str,
    price: Option<f64>,
    stock: Option<u64>,
    datasheet: Option<&'a str>,
}

fn serialize_alternatives<S>(
    alternatives: &[PhysicalComponent],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(alternatives.iter().map(|alt| AlternativeView {
        mpn: &alt.mpn,
        manufacturer: &alt.manufacturer,
        description: &alt.description,
        package: &alt.package,
        supplier: &alt.supplier,
        supplier_pn: &alt.supplier_pn,
        price: alt.price,
        stock: alt.stock,
        datasheet: alt.datasheet.as_deref(),
    }))
}
