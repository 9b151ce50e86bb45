//! Parsing of token amounts and bounds written in descriptions.
//!
//! Amounts may be JSON numbers or strings in plain (`"1000"`), decimal
//! (`"1.5e3"`) or scientific (`"1e18"`) notation, as long as they denote a
//! whole number of base units.

use serde_json::Value;

/// Parses a non-negative whole amount of base units.
pub fn parse_amount(text: &str) -> Result<u128, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty amount".to_string());
    }

    let (mantissa, exponent) = match text.split_once(['e', 'E']) {
        Some((m, e)) => {
            let exp: u32 = e
                .trim_start_matches('+')
                .parse()
                .map_err(|_| format!("invalid exponent in '{text}'"))?;
            (m, exp)
        }
        None => (text, 0),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(format!("no digits in '{text}'"));
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(format!("'{text}' is not a non-negative number"));
    }

    let frac_len = u32::try_from(frac_part.len()).map_err(|_| format!("'{text}' is too long"))?;
    let (digits, scale) = if frac_len > exponent {
        // Fractional digits beyond the exponent must all be zero.
        let keep = exponent as usize;
        let (kept, dropped) = frac_part.split_at(keep);
        if dropped.bytes().any(|b| b != b'0') {
            return Err(format!("'{text}' is not a whole number of base units"));
        }
        (format!("{int_part}{kept}"), 0)
    } else {
        (format!("{int_part}{frac_part}"), exponent - frac_len)
    };

    let base: u128 = if digits.is_empty() {
        0
    } else {
        digits
            .parse()
            .map_err(|_| format!("'{text}' does not fit in 128 bits"))?
    };

    10u128
        .checked_pow(scale)
        .and_then(|factor| base.checked_mul(factor))
        .ok_or_else(|| format!("'{text}' does not fit in 128 bits"))
}

/// Parses an amount held in a JSON value.
pub fn amount_from_value(value: &Value) -> Result<u128, String> {
    match value {
        Value::String(text) => parse_amount(text),
        Value::Number(number) => number
            .as_u64()
            .map(u128::from)
            .map_or_else(|| parse_amount(&number.to_string()), Ok),
        other => Err(format!("expected a number, got {other}")),
    }
}

/// Parses a signed integer held in a JSON value (number or string).
pub fn integer_from_value(value: &Value) -> Result<i128, String> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(i128::from)
            .ok_or_else(|| format!("{number} is not an integer")),
        Value::String(text) => {
            let text = text.trim();
            let (negative, magnitude) = match text.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, text),
            };
            let magnitude = parse_amount(magnitude)?;
            let magnitude =
                i128::try_from(magnitude).map_err(|_| format!("'{text}' is out of range"))?;
            Ok(if negative { -magnitude } else { magnitude })
        }
        other => Err(format!("expected an integer, got {other}")),
    }
}
