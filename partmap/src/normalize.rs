//! Value Normalization
//!
//! Canonicalizes free-form value strings ("10k ohm", "4k7", "0.1µF",
//! "16 MHz") so that values written by different people, or reported by
//! different catalogs, compare equal. Shared by the local library lookup and
//! the candidate scorer.
//!
//! Every rule here is idempotent: `normalize(normalize(v, t), t) ==
//! normalize(v, t)`.

/// What kind of quantity a component's value expresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Resistance,
    Capacitance,
    Frequency,
    /// Colors, part names, anything without a unit
    Generic,
}

impl ValueKind {
    /// Classify by component type name
    pub fn for_type(component_type: &str) -> Self {
        match component_type.trim().to_lowercase().as_str() {
            "resistor" | "potentiometer" | "thermistor" => ValueKind::Resistance,
            "capacitor" => ValueKind::Capacitance,
            "crystal" | "oscillator" | "resonator" => ValueKind::Frequency,
            _ => ValueKind::Generic,
        }
    }
}

/// Normalize a component value for matching.
///
/// Pure and deterministic. Lowercases, drops whitespace, then applies the
/// unit rules of the type's `ValueKind`.
pub fn normalize(raw: &str, component_type: &str) -> String {
    let value: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    match ValueKind::for_type(component_type) {
        ValueKind::Resistance => normalize_resistance(&value),
        ValueKind::Capacitance => normalize_capacitance(&value),
        ValueKind::Frequency => normalize_frequency(&value),
        ValueKind::Generic => value,
    }
}

/// Whether two values are the same once normalized for `component_type`
pub fn values_match(a: &str, b: &str, component_type: &str) -> bool {
    normalize(a, component_type) == normalize(b, component_type)
}

fn normalize_resistance(value: &str) -> String {
    // Uppercase omega and the ohm sign both lowercase to 'ω'
    let value = value
        .replace("ohms", "")
        .replace("ohm", "")
        .replace(['ω', 'Ω'], "");

    let value = if let Some(expanded) = expand_separator_notation(&value) {
        expanded
    } else if let Some(number) = value.strip_suffix('r').filter(|n| is_number(n)) {
        // 100r: trailing R marks plain ohms
        number.to_string()
    } else {
        value
    };

    match split_number(&value) {
        Some((number, suffix)) if matches!(suffix, "" | "k" | "m" | "g") => {
            format!("{}{}", canonical_number(number), suffix)
        }
        _ => value,
    }
}

/// European notation: one letter used as the decimal point (4r7, 4k7, 1m5)
fn expand_separator_notation(value: &str) -> Option<String> {
    for (separator, multiplier) in [('r', "k"), ('k', "k"), ('m', "m")] {
        let parts: Vec<&str> = value.split(separator).collect();
        if parts.len() == 2 && is_digits(parts[0]) && is_digits(parts[1]) {
            return Some(format!("{}.{}{}", parts[0], parts[1], multiplier));
        }
    }
    None
}

fn normalize_capacitance(value: &str) -> String {
    let value = value.replace(['µ', 'μ'], "u");

    if let Some((number, suffix)) = split_number(&value) {
        let unit = match suffix {
            "pf" | "p" => Some("pF"),
            "nf" | "n" => Some("nF"),
            "uf" | "u" => Some("uF"),
            "mf" | "m" => Some("mF"),
            "f" => Some("F"),
            "" => Some(""),
            _ => None,
        };
        if let Some(unit) = unit {
            return format!("{}{}", canonical_number(number), unit);
        }
    }

    value
        .replace("uf", "uF")
        .replace("nf", "nF")
        .replace("pf", "pF")
}

fn normalize_frequency(value: &str) -> String {
    if let Some((number, suffix)) = split_number(value) {
        let unit = match suffix {
            "hz" => Some("Hz"),
            "khz" | "k" => Some("kHz"),
            "mhz" | "m" => Some("MHz"),
            "ghz" | "g" => Some("GHz"),
            "" => Some(""),
            _ => None,
        };
        if let Some(unit) = unit {
            return format!("{}{}", canonical_number(number), unit);
        }
    }
    value.to_string()
}

/// Split "4.7k" into ("4.7", "k"). `None` unless the value starts with a
/// well-formed decimal number.
fn split_number(value: &str) -> Option<(&str, &str)> {
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, suffix) = value.split_at(end);
    if is_number(number) {
        Some((number, suffix))
    } else {
        None
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Digits with at most one decimal point, and at least one digit
fn is_number(s: &str) -> bool {
    let mut parts = s.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    match parts.next() {
        None => is_digits(whole),
        Some(frac) => {
            (whole.is_empty() || is_digits(whole))
                && (frac.is_empty() || is_digits(frac))
                && !(whole.is_empty() && frac.is_empty())
        }
    }
}

/// Shortest decimal form: "10.0" -> "10", "4.70" -> "4.7", ".1" -> "0.1"
fn canonical_number(number: &str) -> String {
    match number.parse::<f64>() {
        Ok(n) => format!("{}", n),
        Err(_) => number.to_string(),
    }
}
