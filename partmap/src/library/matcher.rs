//! Local Library Matcher
//!
//! Resolves a `ComponentSpec` against the local library.

use std::path::Path;

use crate::library::builtin;
use crate::library::schema::{ComponentLibrary, PartInfo};
use crate::library::LibraryError;
use crate::normalize::normalize;
use crate::schema::{ComponentSpec, MappingResult, PhysicalComponent};

/// Confidence given to every library hit. Curated but not supplier-verified,
/// so it stays below 1.0.
pub const LOCAL_MATCH_CONFIDENCE: f64 = 0.95;

/// Matches specs to parts in a `ComponentLibrary`
pub struct LocalMatcher {
    library: ComponentLibrary,
}

impl LocalMatcher {
    pub fn new(library: ComponentLibrary) -> Self {
        Self { library }
    }

    /// Matcher over the embedded default library
    pub fn with_builtin_library() -> Self {
        Self::new(ComponentLibrary::from_document(builtin::builtin_document()))
    }

    /// Matcher over the library at `path`, or the built-in one when absent
    pub fn from_path(path: Option<&Path>) -> Result<Self, LibraryError> {
        let library = builtin::load_library(path)?;
        tracing::info!(
            "Component library ready: {} types, {} entries",
            library.type_count(),
            library.count()
        );
        Ok(Self::new(library))
    }

    pub fn library(&self) -> &ComponentLibrary {
        &self.library
    }

    /// (component types, total entries)
    pub fn stats(&self) -> (usize, usize) {
        (self.library.type_count(), self.library.count())
    }

    /// Look the spec up in the library.
    ///
    /// `None` means the library has no data for it, which is not an error.
    pub fn match_local(&self, spec: &ComponentSpec) -> Option<MappingResult> {
        let entry = self.library.get(&spec.component_type)?;
        let value = spec.value.as_deref()?;

        let normalized = normalize(value, &spec.component_type);
        if let Some(info) = entry.value(&normalized) {
            tracing::debug!("Library value hit for {} ({})", spec, normalized);
            return Some(self.create_mapping_result(spec, info));
        }

        if let Some(info) = entry.part(&value.trim().to_uppercase()) {
            tracing::debug!("Library part hit for {}", spec);
            return Some(self.create_mapping_result(spec, info));
        }

        None
    }

    /// Whether any of the type's patterns recognize `value`
    pub fn recognizes(&self, component_type: &str, value: &str) -> bool {
        self.library
            .get(component_type)
            .map(|entry| entry.recognizes(value))
            .unwrap_or(false)
    }

    fn create_mapping_result(&self, spec: &ComponentSpec, info: &PartInfo) -> MappingResult {
        let supplier_pn = info.lcsc.clone().unwrap_or_else(|| "Unknown".to_string());
        let primary = PhysicalComponent {
            mpn: info
                .mpn
                .clone()
                .or_else(|| info.lcsc.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            manufacturer: info
                .manufacturer
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            description: info.description.clone().unwrap_or_else(|| {
                format!(
                    "{} {}",
                    spec.component_type,
                    spec.value.as_deref().unwrap_or("")
                )
                .trim_end()
                .to_string()
            }),
            package: info
                .package
                .clone()
                .or_else(|| spec.package.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            supplier: if info.lcsc.is_some() { "LCSC" } else { "Unknown" }.to_string(),
            supplier_pn,
            price: None,
            stock: None,
            datasheet: None,
            specifications: info.to_specifications(),
        };

        MappingResult {
            primary,
            alternatives: vec![],
            confidence: LOCAL_MATCH_CONFIDENCE,
            warnings: vec![],
        }
    }
}

impl Default for LocalMatcher {
    fn default() -> Self {
        Self::with_builtin_library()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resistor_value_hit() {
        let matcher = LocalMatcher::with_builtin_library();
        let spec = ComponentSpec::new("resistor").with_value("10k").with_package("0603");

        let result = matcher.match_local(&spec).unwrap();
        assert_eq!(result.primary.supplier_pn, "C25804");
        assert_eq!(result.primary.supplier, "LCSC");
        assert_eq!(result.primary.package, "0603");
        assert_eq!(result.confidence, LOCAL_MATCH_CONFIDENCE);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_equivalent_spellings_hit_same_part() {
        let matcher = LocalMatcher::with_builtin_library();
        for value in ["4.7k", "4k7", "4K7 ohm", "4.70k"] {
            let spec = ComponentSpec::new("resistor").with_value(value);
            let result = matcher.match_local(&spec).unwrap();
            assert_eq!(result.primary.supplier_pn, "C23162", "{}", value);
        }

        let spec = ComponentSpec::new("capacitor").with_value("0.1 µF");
        assert!(matcher.match_local(&spec).is_none());
        let spec = ComponentSpec::new("capacitor").with_value("100nf");
        assert_eq!(matcher.match_local(&spec).unwrap().primary.supplier_pn, "C14663");
    }

    #[test]
    fn test_led_color_hit() {
        let matcher = LocalMatcher::with_builtin_library();
        let spec = ComponentSpec::new("led").with_value("blue");
        let result = matcher.match_local(&spec).unwrap();
        assert_eq!(result.primary.supplier_pn, "C72041");
        assert_eq!(result.primary.description, "led blue");
    }

    #[test]
    fn test_named_part_hit_is_case_insensitive() {
        let matcher = LocalMatcher::with_builtin_library();
        let spec = ComponentSpec::new("ic").with_value("atmega328p");
        let result = matcher.match_local(&spec).unwrap();
        assert_eq!(result.primary.supplier_pn, "C14877");
        assert_eq!(result.primary.package, "TQFP-32");
        assert_eq!(result.primary.description, "AVR MCU");

        let spec = ComponentSpec::new("crystal").with_value("16 MHz");
        assert_eq!(matcher.match_local(&spec).unwrap().primary.supplier_pn, "C16212");
    }

    #[test]
    fn test_misses_return_none() {
        let matcher = LocalMatcher::with_builtin_library();
        assert!(matcher.match_local(&ComponentSpec::new("unknown").with_value("x")).is_none());
        assert!(matcher.match_local(&ComponentSpec::new("resistor").with_value("3.3M")).is_none());
        assert!(matcher.match_local(&ComponentSpec::new("resistor")).is_none());
    }

    #[test]
    fn test_recognizes_uses_patterns() {
        let matcher = LocalMatcher::with_builtin_library();
        assert!(matcher.recognizes("led", "Green"));
        assert!(matcher.recognizes("crystal", "12 MHz"));
        assert!(!matcher.recognizes("ic", "NE555"));
        assert!(!matcher.recognizes("unknown", "anything"));
    }
}
