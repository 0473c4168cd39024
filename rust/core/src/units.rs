// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length values in tags
//!
//! `height`, `width` and similar tags are meters by default but often carry
//! a unit suffix ("12 m", "40 ft", "12'6\""). Everything is returned in
//! meters.

const FOOT: f64 = 0.3048;
const INCH: f64 = 0.0254;

/// Multiplier converting a unit suffix to meters
#[inline]
pub fn unit_multiplier(unit: &str) -> Option<f64> {
    match unit {
        "" | "m" | "meter" | "meters" | "metre" | "metres" => Some(1.0),
        "km" => Some(1e3),
        "cm" => Some(1e-2),
        "mm" => Some(1e-3),
        "ft" | "feet" | "foot" | "'" => Some(FOOT),
        "in" | "inch" | "inches" | "\"" => Some(INCH),
        "mi" => Some(1609.344),
        _ => None,
    }
}

/// Split the leading number, with an optional exponent, from its suffix
fn split_number(value: &str) -> Option<(f64, &str)> {
    let bytes = value.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }

    // `e`/`E`, optional sign, at least one digit
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let digits = bytes[exp.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 {
            end = exp + digits;
        }
    }

    let number = value[..end].parse::<f64>().ok().filter(|n| n.is_finite())?;
    Some((number, value[end..].trim()))
}

/// Parse a length tag value into meters.
///
/// Accepts a bare number, a number with a unit suffix, or feet and inches
/// (`12'6"`). A decimal comma is accepted. An unknown suffix is ignored and
/// the number taken as meters.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim().replace(',', ".");
    let (number, rest) = split_number(&value)?;

    // Feet and inches
    if let Some(inches) = rest.strip_prefix('\'') {
        let inches = inches.trim();
        if inches.is_empty() {
            return Some(number * FOOT);
        }
        let (extra, unit) = split_number(inches)?;
        if unit == "\"" || unit.is_empty() {
            return Some(number * FOOT + extra * INCH);
        }
        return None;
    }

    let unit = rest.to_ascii_lowercase();
    match unit_multiplier(&unit) {
        Some(scale) => Some(number * scale),
        None => {
            tracing::trace!(value = %value, "Unknown length unit, assuming meters");
            Some(number)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plain_and_metric() {
        assert_eq!(parse_length("12"), Some(12.0));
        assert_eq!(parse_length(" 7.5m"), Some(7.5));
        assert_eq!(parse_length("4,5 m"), Some(4.5));
        assert_eq!(parse_length("-3"), Some(-3.0));
        assert_relative_eq!(parse_length("250 cm").unwrap(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_imperial() {
        assert_relative_eq!(parse_length("10 ft").unwrap(), 3.048, epsilon = 1e-12);
        assert_relative_eq!(parse_length("10'").unwrap(), 3.048, epsilon = 1e-12);
        assert_relative_eq!(parse_length("12'6\"").unwrap(), 12.0 * 0.3048 + 6.0 * 0.0254, epsilon = 1e-12);
    }

    #[test]
    fn test_exponent() {
        assert_eq!(parse_length("1e3"), Some(1000.0));
        assert_eq!(parse_length("2.5E-1 m"), Some(0.25));
        assert_eq!(parse_length("1e+1ft"), Some(10.0 * 0.3048));
        // No digits after the marker: plain number with an unknown suffix
        assert_eq!(parse_length("4e"), Some(4.0));
    }

    #[test]
    fn test_unknown_suffix_and_garbage() {
        assert_eq!(parse_length("8 storeys"), Some(8.0));
        assert_eq!(parse_length("tall"), None);
        assert_eq!(parse_length(""), None);
    }
}
