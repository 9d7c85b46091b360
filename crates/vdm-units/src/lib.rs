#![forbid(unsafe_code)]

//! Byte-size units for exabyte-scale virtual data files.
//!
//! Sizes in this workspace sit near the top of the `u64` range (a
//! mega-extent seed file is 4 EiB), so suffixed sizes are parsed with
//! 128-bit integer arithmetic. `f64` has 53 mantissa bits and silently
//! corrupts exabyte-sized values, which would break extent alignment.

use thiserror::Error;

pub const KIB: u64 = 1 << 10;
pub const MIB: u64 = 1 << 20;
pub const GIB: u64 = 1 << 30;
pub const TIB: u64 = 1 << 40;
pub const PIB: u64 = 1 << 50;
pub const EIB: u64 = 1 << 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SizeParseError {
    #[error("empty size string")]
    Empty,
    #[error("invalid number in byte size: {input:?}")]
    InvalidNumber { input: String },
    #[error("unknown byte size suffix in: {input:?}")]
    UnknownSuffix { input: String },
    #[error("byte size does not fit in u64: {input:?}")]
    Overflow { input: String },
}

/// Convert `"4EiB"` to `4 * EIB`. Suffixes are case-insensitive; the bare
/// binary prefixes (`K`, `M`, ...) are accepted as shorthand for `KiB`,
/// `MiB`, etc. Fractional values round half to even, exactly.
///
/// No exponent notation, no NaN, no negatives: this is just for byte
/// sizes, and byte sizes are unsigned.
pub fn parse_byte_size(text: &str) -> Result<u64, SizeParseError> {
    if text.is_empty() {
        return Err(SizeParseError::Empty);
    }

    let bytes = text.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == 0 {
        return Err(SizeParseError::InvalidNumber {
            input: text.to_string(),
        });
    }
    let int_digits = &text[..pos];

    let mut frac_digits = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        pos = frac_start;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        frac_digits = text[frac_start..pos].trim_end_matches('0');
    }

    let factor = match suffix_factor(&text[pos..]) {
        Some(factor) => u128::from(factor),
        None => {
            return Err(SizeParseError::UnknownSuffix {
                input: text.to_string(),
            })
        }
    };

    let overflow = || SizeParseError::Overflow {
        input: text.to_string(),
    };

    // Digits-only input, so the only possible parse failure is overflow.
    let int_part: u128 = int_digits.parse().map_err(|_| overflow())?;
    let mut value = int_part.checked_mul(factor).ok_or_else(overflow)?;

    if !frac_digits.is_empty() {
        let frac: u128 = frac_digits.parse().map_err(|_| overflow())?;
        let denom = 10u128
            .checked_pow(frac_digits.len() as u32)
            .ok_or_else(overflow)?;
        let scaled = frac.checked_mul(factor).ok_or_else(overflow)?;
        value = value.checked_add(scaled / denom).ok_or_else(overflow)?;
        let remainder = scaled % denom;
        // Ties round to even on the full truncated value, not just the
        // fractional quotient.
        let carry = match (2 * remainder).cmp(&denom) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Equal => value & 1,
            std::cmp::Ordering::Less => 0,
        };
        value = value.checked_add(carry).ok_or_else(overflow)?;
    }

    u64::try_from(value).map_err(|_| overflow())
}

fn suffix_factor(suffix: &str) -> Option<u64> {
    match suffix.to_ascii_lowercase().as_str() {
        "" => Some(1),
        "k" | "kib" => Some(KIB),
        "m" | "mib" => Some(MIB),
        "g" | "gib" => Some(GIB),
        "t" | "tib" => Some(TIB),
        "p" | "pib" => Some(PIB),
        "e" | "eib" => Some(EIB),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixed_sizes() {
        assert_eq!(parse_byte_size("1KiB").unwrap(), KIB);
        assert_eq!(parse_byte_size("1m").unwrap(), MIB);
        assert_eq!(parse_byte_size("1GiB").unwrap(), GIB);
        assert_eq!(parse_byte_size("1T").unwrap(), TIB);
        assert_eq!(parse_byte_size("3P").unwrap(), 3 * PIB);
        assert_eq!(parse_byte_size("4E").unwrap(), 4 * EIB);
        assert_eq!(parse_byte_size("512").unwrap(), 512);
    }

    #[test]
    fn test_exact_exabyte_fraction() {
        // f64 gets this wrong: (0.1070816951805893162 * 2f64.powi(60)) as u64
        // ends in ...790 instead of ...789.
        assert_eq!(
            parse_byte_size("0.1070816951805893162E").unwrap(),
            123_456_789_123_456_789
        );
    }

    #[test]
    fn test_fractions() {
        assert_eq!(parse_byte_size("0.5K").unwrap(), 512);
        assert_eq!(parse_byte_size("1.5M").unwrap(), 3 * MIB / 2);
        assert_eq!(parse_byte_size("2.25G").unwrap(), 9 * GIB / 4);
        assert_eq!(parse_byte_size("1.").unwrap(), 1);
        assert_eq!(parse_byte_size("1.000K").unwrap(), KIB);
    }

    #[test]
    fn test_rounds_half_to_even() {
        assert_eq!(parse_byte_size("0.5").unwrap(), 0);
        assert_eq!(parse_byte_size("1.5").unwrap(), 2);
        assert_eq!(parse_byte_size("2.5").unwrap(), 2);
        assert_eq!(parse_byte_size("3.5").unwrap(), 4);
        assert_eq!(parse_byte_size("2.75").unwrap(), 3);
    }

    #[test]
    fn test_overflow() {
        // 16 EiB is exactly 2^64.
        assert!(matches!(
            parse_byte_size("16E"),
            Err(SizeParseError::Overflow { .. })
        ));
        assert!(matches!(
            parse_byte_size("123E"),
            Err(SizeParseError::Overflow { .. })
        ));
        assert_eq!(parse_byte_size("15E").unwrap(), 15 * EIB);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_byte_size(""), Err(SizeParseError::Empty));
        assert!(matches!(
            parse_byte_size("bytes"),
            Err(SizeParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_byte_size("-5K"),
            Err(SizeParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_byte_size(".5K"),
            Err(SizeParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_byte_size("1X"),
            Err(SizeParseError::UnknownSuffix { .. })
        ));
        assert!(matches!(
            parse_byte_size("1 K"),
            Err(SizeParseError::UnknownSuffix { .. })
        ));
        assert!(matches!(
            parse_byte_size("1e3"),
            Err(SizeParseError::UnknownSuffix { .. })
        ));
    }
}
