//! Numeric cell cleaning.
//!
//! Price cells arrive as free text: thousands separators, currency signs,
//! quotes and stray whitespace are common. Anything that does not reduce to a
//! finite number becomes a missing value instead of an error.

/// Markers that explicitly denote "no data" (compared case-insensitively).
pub const MISSING_MARKERS: &[&str] = &["nan", "na", "n/a", "null", "none", "-"];

/// Clean a raw cell into a price, or `None` when the cell is missing.
///
/// Keeps digits, a single leading sign and the first decimal point; every
/// other character is discarded before parsing.
pub fn clean_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_missing_marker(trimmed) {
        return None;
    }

    let mut kept = String::with_capacity(trimmed.len());
    let mut seen_dot = false;
    let mut seen_digit = false;

    for ch in trimmed.chars() {
        match ch {
            '0'..='9' => {
                seen_digit = true;
                kept.push(ch);
            }
            '-' | '+' if kept.is_empty() => kept.push(ch),
            '.' if !seen_dot => {
                seen_dot = true;
                kept.push(ch);
            }
            _ => {}
        }
    }

    if !seen_digit {
        return None;
    }

    kept.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_missing_marker(value: &str) -> bool {
    MISSING_MARKERS
        .iter()
        .any(|marker| value.eq_ignore_ascii_case(marker))
}
