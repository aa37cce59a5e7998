//! Duration strings in the `15s` / `1m30s` / `250ms` grammar.
//!
//! A duration is a sequence of decimal numbers, each with an optional fraction
//! and a mandatory unit suffix (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`). The bare
//! string `"0"` is accepted without a unit. A negative sign is only accepted
//! when the value is zero (`-0`, `-0s`); any other negative duration is
//! rejected, since a timeout cannot be negative.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while parsing a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("negative duration {0:?} is not allowed")]
    Negative(String),

    #[error("duration {0:?} is out of range")]
    Overflow(String),
}

const NANOS_PER_UNIT: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

// Fractions beyond this many digits cannot change a nanosecond count.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parse a duration string such as `"15s"` or `"1m30s"`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let mut rest = input;
    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('-') {
        rest = stripped;
        negative = true;
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let overflow = || DurationError::Overflow(input.to_string());
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DurationError::Invalid(input.to_string()));
        }

        let unit_len = after_number
            .char_indices()
            .find(|(_, c)| *c == '.' || c.is_ascii_digit())
            .map_or(after_number.len(), |(i, _)| i);
        let (unit, remainder) = after_number.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }

        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, nanos)| *nanos)
            .ok_or_else(|| DurationError::UnknownUnit {
                unit: unit.to_string(),
                input: input.to_string(),
            })?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        if !frac_part.is_empty() {
            let mut fraction: u128 = 0;
            let mut divisor: u128 = 1;
            for digit in frac_part.bytes().take(MAX_FRACTION_DIGITS) {
                fraction = fraction * 10 + u128::from(digit - b'0');
                divisor *= 10;
            }
            nanos = nanos
                .checked_add(fraction * scale / divisor)
                .ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = remainder;
    }

    let total = u64::try_from(total)
        .ok()
        .filter(|nanos| *nanos <= i64::MAX as u64)
        .ok_or_else(overflow)?;

    if negative && total != 0 {
        return Err(DurationError::Negative(input.to_string()));
    }
    Ok(Duration::from_nanos(total))
}
