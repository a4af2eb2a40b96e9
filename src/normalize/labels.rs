//! Header/label recognition and cell parsing for assay tables.

use super::DropReason;

/// Markers used by assay sources for "no value".
const MISSING_MARKERS: &[&str] = &["", "-", "--", "—", "n/a", "na", "nan", "null", "none"];

fn squash(label: &str) -> String {
    label
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '[' | ']'))
        .collect()
}

/// Score how strongly a header names the temperature axis (0 = not at all).
///
/// An explicit "temperature"/"temp" wins over a bare unit such as `(oC)`,
/// so `Temperature( oC )` beats `Average( oC )`.
pub fn is_temperature_label(label: &str) -> u8 {
    let s = squash(label);
    if s.contains("temp") {
        2
    } else if s.contains("°c") || s.ends_with("oc") || s.contains("degc") {
        1
    } else {
        0
    }
}

/// Score how strongly a header names the percent-evaporated axis (0 = not at all).
pub fn is_percent_label(label: &str) -> u8 {
    let s = squash(label);
    if s.contains("evap") || s.contains("recover") || s.contains("distil") {
        2
    } else if s.contains('%') || s.contains("percent") {
        1
    } else {
        0
    }
}

/// Parse a numeric cell; thousands separators are removed.
pub fn parse_cell(raw: &str) -> Result<f64, DropReason> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if MISSING_MARKERS.contains(&cleaned.to_lowercase().as_str()) {
        return Err(DropReason::Missing);
    }
    let value = cleaned.parse::<f64>().map_err(|_| DropReason::NotNumeric)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DropReason::NotNumeric)
    }
}

/// Parse a percent-evaporated label (`IBP`, `FBP`, `5`, `10%`, `50 vol%`) into percent.
pub fn parse_percent_label(raw: &str) -> Option<f64> {
    let upper = raw.trim().to_ascii_uppercase();
    match upper.as_str() {
        "IBP" => return Some(0.0),
        "FBP" | "EP" => return Some(100.0),
        _ => {}
    }
    leading_number(&upper)
}

/// Parse a temperature label such as `150`, `150.5 °C` or `1,050`.
pub fn parse_temperature_label(raw: &str) -> Option<f64> {
    leading_number(raw)
}

fn leading_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let end = cleaned
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(cleaned.len());
    cleaned[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
