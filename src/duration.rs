//! Duration strings as typed on a command line: `90s`, `72h`, `1h30m`,
//! `1.5h`, `250ms`.

use std::time::Duration;

use crate::error::ReaperError;

/// Parse a sequence of decimal numbers, each followed by a unit
/// (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`). A bare `0` is also accepted.
pub fn parse(input: &str) -> Result<Duration, ReaperError> {
    let invalid = || ReaperError::InvalidDuration(input.to_string());

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid());
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    let mut secs = 0f64;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        secs += value * scale;
        rest = &rest[unit..];
    }

    Duration::try_from_secs_f64(secs).map_err(|_| invalid())
}

/// [`parse`], rejecting zero. Suitable as a clap value parser.
pub fn parse_expiry(input: &str) -> Result<Duration, ReaperError> {
    let d = parse(input)?;
    if d.is_zero() {
        return Err(ReaperError::InvalidExpiry);
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_units() {
        assert_eq!(parse("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse("72h").unwrap(), Duration::from_secs(72 * 3600));
        assert_eq!(parse("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn compound_and_fractional() {
        assert_eq!(parse("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse("2m3s").unwrap(), Duration::from_secs(123));
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "s", "10", "10x", "-5s", "1..5s", "h1"] {
            assert!(parse(input).is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn expiry_must_be_positive() {
        assert!(matches!(parse_expiry("0s"), Err(ReaperError::InvalidExpiry)));
        assert_eq!(parse_expiry("1s").unwrap(), Duration::from_secs(1));
    }
}
