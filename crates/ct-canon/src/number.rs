//! Number serialization in the ECMAScript `Number.prototype.toString` layout.

use crate::CanonicalizationError;
use serde_json::Number;

/// Largest magnitude at which every integer is exactly representable as f64.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

pub(crate) fn write_number(number: &Number, out: &mut String) -> Result<(), CanonicalizationError> {
    if let Some(value) = number.as_i64() {
        if value.unsigned_abs() <= MAX_EXACT_INTEGER {
            out.push_str(&value.to_string());
            return Ok(());
        }
    } else if let Some(value) = number.as_u64() {
        if value <= MAX_EXACT_INTEGER {
            out.push_str(&value.to_string());
            return Ok(());
        }
    }

    let value = number
        .as_f64()
        .ok_or_else(|| CanonicalizationError::Number(number.to_string()))?;
    write_double(value, out)
}

fn write_double(value: f64, out: &mut String) -> Result<(), CanonicalizationError> {
    if !value.is_finite() {
        return Err(CanonicalizationError::Number(value.to_string()));
    }
    // Covers -0 as well.
    if value == 0.0 {
        out.push('0');
        return Ok(());
    }
    if value.is_sign_negative() {
        out.push('-');
    }

    // `{:e}` yields the shortest round-tripping digits, e.g. "1.2345e-7".
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .ok_or_else(|| CanonicalizationError::Number(scientific.clone()))?;
    let exponent: i32 = exponent
        .parse()
        .map_err(|_| CanonicalizationError::Number(scientific.clone()))?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    // value = 0.<digits> * 10^point
    let len = digits.len() as i32;
    let point = exponent + 1;

    if len <= point && point <= 21 {
        out.push_str(&digits);
        push_zeros(out, point - len);
    } else if 0 < point && point <= 21 {
        let (whole, fraction) = digits.split_at(point as usize);
        out.push_str(whole);
        out.push('.');
        out.push_str(fraction);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        push_zeros(out, -point);
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if point - 1 >= 0 { '+' } else { '-' });
        out.push_str(&(point - 1).unsigned_abs().to_string());
    }
    Ok(())
}

fn push_zeros(out: &mut String, count: i32) {
    for _ in 0..count {
        out.push('0');
    }
}
