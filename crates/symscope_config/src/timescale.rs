//! Timescale strings (`1ps`, `10ns`, `100us`) as base-10 exponents.

use crate::error::ConfigError;

/// Unit suffixes and their exponents, longest suffix first so `ms` is not
/// mistaken for `s`.
const UNITS: [(&str, i8); 6] = [
    ("ms", -3),
    ("us", -6),
    ("ns", -9),
    ("ps", -12),
    ("fs", -15),
    ("s", 0),
];

/// Parses a timescale like `1ps` or `100ns` into a base-10 exponent of
/// seconds (`1ps` → -12, `100ns` → -7).
///
/// The magnitude must be 1, 10 or 100.
pub fn parse_timescale(s: &str) -> Result<i8, ConfigError> {
    let s = s.trim();
    let digit_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if digit_end == 0 {
        return Err(ConfigError::ValidationError(format!(
            "no magnitude in timescale '{s}'"
        )));
    }
    let magnitude = match &s[..digit_end] {
        "1" => 0,
        "10" => 1,
        "100" => 2,
        other => {
            return Err(ConfigError::ValidationError(format!(
                "timescale magnitude must be 1, 10 or 100, got '{other}'"
            )))
        }
    };
    let unit = s[digit_end..].trim();
    let base = UNITS
        .iter()
        .find(|(suffix, _)| *suffix == unit)
        .map(|(_, exp)| *exp)
        .ok_or_else(|| ConfigError::ValidationError(format!("unknown time unit '{unit}'")))?;
    Ok(base + magnitude)
}

/// Formats an exponent back into its canonical timescale string
/// (`-12` → `1ps`, `-7` → `100ns`).
pub fn format_timescale(exponent: i8) -> String {
    let base = exponent.div_euclid(3) * 3;
    let magnitude = 10u32.pow(exponent.rem_euclid(3) as u32);
    let unit = match base {
        0 => "s",
        -3 => "ms",
        -6 => "us",
        -9 => "ns",
        -12 => "ps",
        -15 => "fs",
        _ => return format!("1e{exponent}s"),
    };
    format!("{magnitude}{unit}")
}
