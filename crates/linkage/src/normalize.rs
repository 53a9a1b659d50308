//! Field-level cleaning shared by the loaders.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

static SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" (JR\.?|II|III|IV)$").expect("valid suffix regex"));

/// Normalize a payroll name: strip one trailing generational suffix, then
/// keep only `A`-`Z`.
///
/// The output never contains a space, so applying it twice is a no-op.
pub fn payroll_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = SUFFIX_RE.replace(trimmed, "");
    stripped.chars().filter(|c| c.is_ascii_uppercase()).collect()
}

/// Parse a month/day/year date. Month and day may have one or two digits,
/// the year any number of digits.
pub fn parse_mdy(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y").ok()
}

/// Parse a pay amount such as `$85,312.40`. Parenthesized values are negative.
pub fn parse_pay(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negative, inner) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}
