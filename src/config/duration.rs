//! # Duration Parsing
//!
//! Parses duration strings such as `60s`, `1.5m`, `1h30m` or `300us`.

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

static FULL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h|d))+$").ok()
});

static COMPONENT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?P<whole>\d*)(?:\.(?P<frac>\d*))?(?P<unit>ns|us|µs|μs|ms|s|m|h|d)").ok()
});

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        "d" => 86_400 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Nanoseconds in `<whole>.<frac>` units, truncating below one nanosecond
fn component_nanos(whole: &str, frac: &str, unit: u128) -> Option<u128> {
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(unit)?;
    // Digits past 18 cannot change the result for any supported unit
    let frac = &frac[..frac.len().min(18)];
    if !frac.is_empty() {
        let scale = 10u128.pow(u32::try_from(frac.len()).ok()?);
        let value: u128 = frac.parse().ok()?;
        nanos = nanos.checked_add(value.checked_mul(unit)? / scale)?;
    }
    Some(nanos)
}

/// Parse a duration string made of one or more `<number><unit>` groups.
///
/// Numbers may be fractional (`1.5m`, `.5h`). Supported units are `ns`, `us`
/// (or `µs`), `ms`, `s`, `m`, `h` and `d`, case insensitive.
///
/// # Errors
///
/// Returns an error if the string is empty, malformed, overflows, or adds up to zero.
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    let trimmed = duration_str.trim();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("Duration string cannot be empty"));
    }

    let full = FULL_PATTERN
        .as_ref()
        .context("Failed to compile duration regex")?;
    let component = COMPONENT_PATTERN
        .as_ref()
        .context("Failed to compile duration regex")?;

    let lower = trimmed.to_lowercase();
    if !full.is_match(&lower) {
        return Err(anyhow::anyhow!(
            "Invalid duration format '{trimmed}'. Expected <number><unit> groups with units ns, us, ms, s, m, h or d (e.g., '60s', '1.5m', '1h30m')"
        ));
    }

    let mut total: u128 = 0;
    for captures in component.captures_iter(&lower) {
        let unit = unit_nanos(&captures["unit"])
            .with_context(|| format!("Unsupported duration unit '{}'", &captures["unit"]))?;
        let whole = captures.name("whole").map_or("", |m| m.as_str());
        let frac = captures.name("frac").map_or("", |m| m.as_str());
        total = component_nanos(whole, frac, unit)
            .and_then(|part| total.checked_add(part))
            .with_context(|| format!("Duration '{trimmed}' overflows"))?;
    }

    if total == 0 {
        return Err(anyhow::anyhow!(
            "Duration must be greater than 0, got '{trimmed}'"
        ));
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .with_context(|| format!("Duration '{trimmed}' overflows"))?;
    let nanos = u32::try_from(total % NANOS_PER_SEC)
        .with_context(|| format!("Duration '{trimmed}' overflows"))?;
    Ok(Duration::new(secs, nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_units() {
        assert_eq!(parse_duration("60s").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7_200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("300us").unwrap(), Duration::from_micros(300));
        assert_eq!(parse_duration("300µs").unwrap(), Duration::from_micros(300));
        assert_eq!(parse_duration("42ns").unwrap(), Duration::from_nanos(42));
    }

    #[test]
    fn test_parse_compound() {
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(
            parse_duration("1h1m1s500ms").unwrap(),
            Duration::from_millis(3_661_500)
        );
    }

    #[test]
    fn test_parse_fractional() {
        assert_eq!(parse_duration("1.5m").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration(".5h").unwrap(), Duration::from_secs(1_800));
        assert_eq!(parse_duration("2.h").unwrap(), Duration::from_secs(7_200));
        assert_eq!(parse_duration("0.1s").unwrap(), Duration::from_millis(100));
        assert_eq!(
            parse_duration("1.5h30.25s").unwrap(),
            Duration::from_millis(5_430_250)
        );
    }

    #[test]
    fn test_parse_trims_and_ignores_case() {
        assert_eq!(parse_duration("  30S ").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration(".s").is_err());
        assert!(parse_duration("1..5m").is_err());
    }

    #[test]
    fn test_parse_rejects_zero() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("0m0s").is_err());
        assert!(parse_duration("0.0001ns").is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(parse_duration("99999999999999999999999999999999999999999h").is_err());
    }
}
