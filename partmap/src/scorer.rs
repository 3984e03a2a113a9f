//! Candidate Scoring and Selection
//!
//! Ranks supplier candidates against the requested spec with an additive
//! weighted model:
//!
//! | Factor                         | Weight       |
//! |--------------------------------|--------------|
//! | Package exact / compatible     | 0.30 / 0.15  |
//! | Normalized value match         | 0.30         |
//! | Stock > 100 / 1..=100          | 0.20 / 0.10  |
//! | Price < $0.10 / < $1.00        | 0.10 / 0.05  |
//! | Preferred supplier             | 0.10         |

use crate::normalize::values_match;
use crate::schema::{ComponentSpec, MappingResult, PhysicalComponent};

/// Suppliers that earn the preferred-supplier bonus
pub const PREFERRED_SUPPLIERS: &[&str] = &["LCSC", "Digikey"];

pub const MAX_ALTERNATIVES: usize = 5;

/// Alternatives must score strictly above this
pub const ALTERNATIVE_MIN_SCORE: f64 = 0.5;

const PACKAGE_EXACT: f64 = 0.30;
const PACKAGE_COMPATIBLE: f64 = 0.15;
const VALUE_MATCH: f64 = 0.30;
const STOCK_DEEP: f64 = 0.20;
const STOCK_SHALLOW: f64 = 0.10;
const PRICE_CHEAP: f64 = 0.10;
const PRICE_MODERATE: f64 = 0.05;
const PREFERRED_SUPPLIER: f64 = 0.10;

/// Equivalent footprints, over normalized names
const PACKAGE_CLASSES: &[&[&str]] = &[
    &["0402", "1005", "1005metric"],
    &["0603", "1608", "1608metric"],
    &["0805", "2012", "2012metric"],
    &["1206", "3216", "3216metric"],
    &["soic8", "so8"],
    &["sot23", "sot233"],
];

/// Lowercase and drop `-` and `_`: "SOIC-8" -> "soic8"
pub fn normalize_package(package: &str) -> String {
    package
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect()
}

fn package_class(normalized: &str) -> Option<usize> {
    PACKAGE_CLASSES
        .iter()
        .position(|class| class.contains(&normalized))
}

/// Whether two package names denote the same footprint.
///
/// True when they normalize to the same name or into the same equivalence
/// class. Symmetric.
pub fn packages_compatible(a: &str, b: &str) -> bool {
    let a = normalize_package(a);
    let b = normalize_package(b);
    if a == b {
        return true;
    }
    match (package_class(&a), package_class(&b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Score how well `candidate` satisfies `spec`, in [0, 1]
pub fn score(spec: &ComponentSpec, candidate: &PhysicalComponent) -> f64 {
    let mut score = 0.0;

    if let Some(ref wanted) = spec.package {
        if !wanted.trim().is_empty() && !candidate.package.trim().is_empty() {
            if wanted.trim().eq_ignore_ascii_case(candidate.package.trim()) {
                score += PACKAGE_EXACT;
            } else if packages_compatible(wanted, &candidate.package) {
                score += PACKAGE_COMPATIBLE;
            }
        }
    }

    if let (Some(wanted), Some(reported)) = (spec.value.as_deref(), candidate.reported_value()) {
        if values_match(wanted, reported, &spec.component_type) {
            score += VALUE_MATCH;
        }
    }

    match candidate.stock {
        Some(stock) if stock > 100 => score += STOCK_DEEP,
        Some(stock) if stock > 0 => score += STOCK_SHALLOW,
        _ => {}
    }

    match candidate.price {
        Some(price) if price > 0.0 && price < 0.10 => score += PRICE_CHEAP,
        Some(price) if price > 0.0 && price < 1.00 => score += PRICE_MODERATE,
        _ => {}
    }

    if PREFERRED_SUPPLIERS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(&candidate.supplier))
    {
        score += PREFERRED_SUPPLIER;
    }

    f64::min(score, 1.0)
}

/// Rank candidates and build a result from the best one.
///
/// Candidates scoring 0 or carrying the placeholder MPN are not usable and
/// are dropped; `None` when nothing usable remains. Equal scores keep their
/// input order.
pub fn select_best_match(
    spec: &ComponentSpec,
    candidates: Vec<PhysicalComponent>,
) -> Option<MappingResult> {
    let mut scored: Vec<(f64, PhysicalComponent)> = candidates
        .into_iter()
        .map(|c| (score(spec, &c), c))
        .inspect(|(s, c)| tracing::debug!("Candidate {} from {} scored {:.2}", c.mpn, c.supplier, s))
        .filter(|(s, c)| *s > 0.0 && !c.is_unknown())
        .collect();

    // Stable: ties stay in federation order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut ranked = scored.into_iter();
    let (best_score, best) = ranked.next()?;
    let alternatives = ranked
        .take(MAX_ALTERNATIVES)
        .filter(|(s, _)| *s > ALTERNATIVE_MIN_SCORE)
        .map(|(_, c)| c.summary())
        .collect();

    let warnings = generate_warnings(spec, &best);
    Some(MappingResult {
        primary: best,
        alternatives,
        confidence: best_score,
        warnings,
    })
}

/// Advisory warnings about a selected part
pub fn generate_warnings(spec: &ComponentSpec, matched: &PhysicalComponent) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(ref wanted) = spec.package {
        if !wanted.trim().is_empty()
            && !matched.package.trim().is_empty()
            && !packages_compatible(wanted, &matched.package)
        {
            warnings.push(format!(
                "Package mismatch: requested {}, matched {}",
                wanted, matched.package
            ));
        }
    }

    if let Some(stock) = matched.stock {
        if stock < 100 {
            warnings.push(format!("Low stock: only {} units available", stock));
        }
    }

    if let Some(price) = matched.price {
        if price > 10.0 {
            warnings.push(format!("High price: ${:.2} per unit", price));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn candidate(
        supplier: &str,
        package: &str,
        value: Option<&str>,
        stock: Option<u64>,
        price: Option<f64>,
    ) -> PhysicalComponent {
        let mut specifications = BTreeMap::new();
        if let Some(v) = value {
            specifications.insert("value".to_string(), v.to_string());
        }
        PhysicalComponent {
            mpn: format!("{}-{}", supplier, package),
            manufacturer: "Test".to_string(),
            description: String::new(),
            package: package.to_string(),
            supplier: supplier.to_string(),
            supplier_pn: "SPN".to_string(),
            price,
            stock,
            datasheet: None,
            specifications,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_package_compatibility() {
        assert!(packages_compatible("0603", "1608"));
        assert!(packages_compatible("0805", "2012Metric"));
        assert!(packages_compatible("SOIC-8", "SO-8"));
        assert!(packages_compatible("SOT-23", "SOT23"));
        assert!(packages_compatible("TQFP-32", "tqfp_32"));
        assert!(!packages_compatible("0603", "0805"));
        assert!(!packages_compatible("SOIC-8", "SOT-23"));
    }

    #[test]
    fn test_package_compatibility_is_symmetric() {
        let names = [
            "0402", "1005", "0603", "1608", "1608Metric", "0805", "2012", "1206", "3216",
            "SOIC-8", "SO-8", "SOT-23", "SOT-23-3", "TQFP-32", "QFN", "",
        ];
        for a in names {
            for b in names {
                assert_eq!(packages_compatible(a, b), packages_compatible(b, a), "{} / {}", a, b);
            }
        }
    }

    #[test]
    fn test_full_score() {
        let spec = ComponentSpec::new("resistor").with_value("10k").with_package("0603");
        let c = candidate("LCSC", "0603", Some("10kΩ"), Some(5000), Some(0.002));
        assert!(approx(score(&spec, &c), 1.0));
    }

    #[test]
    fn test_compatible_package_scores_less_than_exact() {
        let spec = ComponentSpec::new("resistor").with_package("0603");
        let exact = candidate("Mouser", "0603", None, None, None);
        let compatible = candidate("Mouser", "1608", None, None, None);
        let other = candidate("Mouser", "0805", None, None, None);
        assert!(approx(score(&spec, &exact), 0.30));
        assert!(approx(score(&spec, &compatible), 0.15));
        assert!(approx(score(&spec, &other), 0.0));
    }

    #[test]
    fn test_stock_and_price_tiers() {
        let spec = ComponentSpec::new("ic");
        assert!(approx(score(&spec, &candidate("X", "", None, Some(101), None)), 0.20));
        assert!(approx(score(&spec, &candidate("X", "", None, Some(100), None)), 0.10));
        assert!(approx(score(&spec, &candidate("X", "", None, Some(0), None)), 0.0));
        assert!(approx(score(&spec, &candidate("X", "", None, None, Some(0.099))), 0.10));
        assert!(approx(score(&spec, &candidate("X", "", None, None, Some(0.10))), 0.05));
        assert!(approx(score(&spec, &candidate("X", "", None, None, Some(1.00))), 0.0));
        assert!(approx(score(&spec, &candidate("digikey", "", None, None, None)), 0.10));
    }

    #[test]
    fn test_score_is_bounded() {
        let specs = [
            ComponentSpec::new("resistor").with_value("10k").with_package("0603"),
            ComponentSpec::new("capacitor").with_value("100nF").with_package("1608"),
            ComponentSpec::new("ic"),
        ];
        let candidates = [
            candidate("LCSC", "0603", Some("10k"), Some(1_000_000), Some(0.0001)),
            candidate("Digikey", "1608", Some("100n"), Some(5), Some(50.0)),
            candidate("Nobody", "", None, None, None),
        ];
        for spec in &specs {
            for c in &candidates {
                let s = score(spec, c);
                assert!((0.0..=1.0).contains(&s), "{} out of range", s);
            }
        }
    }

    #[test]
    fn test_selection_orders_and_caps_alternatives() {
        let spec = ComponentSpec::new("resistor").with_value("10k").with_package("0603");
        let mut candidates = vec![candidate("Mouser", "0805", None, Some(5), Some(20.0))];
        for i in 0..7 {
            let mut c = candidate("LCSC", "0603", Some("10k"), Some(500), Some(0.5));
            c.mpn = format!("ALT{}", i);
            candidates.push(c);
        }

        let result = select_best_match(&spec, candidates).unwrap();
        assert_eq!(result.primary.mpn, "ALT0");
        assert_eq!(result.alternatives.len(), MAX_ALTERNATIVES);
        assert_eq!(result.alternatives[0].mpn, "ALT1");
        assert!(result.alternatives.iter().all(|a| a.specifications.is_empty()));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let spec = ComponentSpec::new("resistor").with_value("10k").with_package("0603");
        let mut first = candidate("Mouser", "0603", Some("10k"), Some(50), None);
        first.mpn = "FIRST".to_string();
        let mut second = first.clone();
        second.mpn = "SECOND".to_string();

        for _ in 0..10 {
            let result = select_best_match(&spec, vec![first.clone(), second.clone()]).unwrap();
            assert_eq!(result.primary.mpn, "FIRST");
            assert!(approx(result.confidence, 0.70));
        }
    }

    #[test]
    fn test_unusable_candidates_dropped() {
        let spec = ComponentSpec::new("ic");
        assert!(select_best_match(&spec, vec![]).is_none());
        assert!(select_best_match(&spec, vec![candidate("Nobody", "", None, None, None)]).is_none());

        let mut placeholder = candidate("LCSC", "", None, Some(1000), None);
        placeholder.mpn = "UNKNOWN".to_string();
        assert!(select_best_match(&spec, vec![placeholder]).is_none());
    }

    #[test]
    fn test_warnings() {
        let spec = ComponentSpec::new("resistor").with_package("0603");
        let c = candidate("Mouser", "0805", None, Some(12), Some(12.5));
        let warnings = generate_warnings(&spec, &c);
        assert_eq!(
            warnings,
            vec![
                "Package mismatch: requested 0603, matched 0805".to_string(),
                "Low stock: only 12 units available".to_string(),
                "High price: $12.50 per unit".to_string(),
            ]
        );

        let ok = candidate("Mouser", "1608", None, Some(100), Some(10.0));
        assert!(generate_warnings(&spec, &ok).is_empty());
    }
}
