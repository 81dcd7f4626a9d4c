//! Strategies for recovering the kilobyte figure of a job line.
//!
//! Multi-byte client and path names shift the console's column alignment, so
//! the sliced "Kilobytes" span is often truncated. The default strategy scans
//! the whole line for integer tokens and keeps the numerically largest one,
//! which favors the complete comma-grouped figure over a partial slice.

use regex::bytes::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Comma-grouped figures like `1,234,567`, else plain digit runs. ASCII
/// word boundaries, so multi-byte text next to a number does not hide it.
static NUMERIC_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)\b\d{1,3}(?:,\d{3})+\b|\b\d+\b").expect("numeric token pattern")
});

/// Picks the raw capacity text for one data line.
pub trait CapacityRecovery: Send + Sync {
    /// `line` is the raw data line, `sliced` the decoded capacity column.
    fn recover(&self, line: &[u8], sliced: &str) -> String;

    /// Name of this strategy (for diagnostics).
    fn name(&self) -> &str;
}

/// Largest integer token anywhere on the line, falling back to the column slice.
#[derive(Debug, Default, Clone, Copy)]
pub struct LargestNumericToken;

impl CapacityRecovery for LargestNumericToken {
    fn recover(&self, line: &[u8], sliced: &str) -> String {
        let mut best: Option<(Vec<u8>, &[u8])> = None;
        for token in numeric_tokens(line) {
            let digits = significant_digits(token);
            // first token wins ties
            let larger = match &best {
                Some((current, _)) => compare_digits(&digits, current) == Ordering::Greater,
                None => true,
            };
            if larger {
                best = Some((digits, token));
            }
        }
        match best {
            Some((_, token)) => String::from_utf8_lossy(token).into_owned(),
            None => sliced.to_string(),
        }
    }

    fn name(&self) -> &str {
        "largest-token"
    }
}

/// Only ever use the aligned column slice.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictColumn;

impl CapacityRecovery for StrictColumn {
    fn recover(&self, _line: &[u8], sliced: &str) -> String {
        sliced.to_string()
    }

    fn name(&self) -> &str {
        "strict-column"
    }
}

/// Integer tokens in left-to-right order.
pub fn numeric_tokens(line: &[u8]) -> Vec<&[u8]> {
    NUMERIC_TOKEN.find_iter(line).map(|m| m.as_bytes()).collect()
}

/// Digits of a token without separators or leading zeros.
fn significant_digits(token: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = token.iter().copied().filter(u8::is_ascii_digit).collect();
    let first = digits.iter().position(|&b| b != b'0').unwrap_or(digits.len());
    digits[first..].to_vec()
}

/// Numeric order of two digit strings of any length.
fn compare_digits(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
