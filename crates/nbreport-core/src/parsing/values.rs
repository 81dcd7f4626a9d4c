use rust_decimal::{Decimal, RoundingStrategy};
use std::num::IntErrorKind;
use std::str::FromStr;

const KB_PER_GB: u32 = 1024 * 1024;

/// Convert a kilobyte figure from the export into GB, rounded to 2 decimals.
///
/// Handles formats like:
/// - "1,048,576" -> 1.00
/// - "  524288 " -> 0.50
/// - "0" -> 0.00
/// - "" or "n/a" -> None
pub fn kb_to_gb(s: &str) -> Option<Decimal> {
    let cleaned = strip_separators(s);
    if cleaned.is_empty() {
        return None;
    }
    let kb = Decimal::from_str(&cleaned).ok()?;
    Some((kb / Decimal::from(KB_PER_GB)).round_dp(2))
}

/// Parse a kilobyte figure as an integer, ignoring thousands separators.
///
/// Figures too large for `u64` saturate, so they still sort above every
/// split range.
pub fn parse_kilobytes(s: &str) -> Option<u64> {
    let cleaned = strip_separators(s);
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<u64>() {
        Ok(kb) => Some(kb),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(u64::MAX),
        Err(_) => None,
    }
}

/// Render a GB value: whole numbers (within 0.005) without decimals,
/// everything else rounded half away from zero to exactly two.
pub fn format_gb(value: Decimal) -> String {
    let whole = value.round();
    if (value - whole).abs() < Decimal::new(5, 3) {
        format!("{}", whole.trunc())
    } else {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.2}", rounded)
    }
}

fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect()
}
