//! Number formatting and string-to-number coercion.
//!
//! The runtime only has one numeric type, a double. Text conversion follows
//! the C library conventions the embedding API is built on: `%.14g` when a
//! number is converted to a string, `%g` when the stack printer shows it.

/// Significant digits used by `tostring` and `lua_tostring`.
pub const TOSTRING_PRECISION: usize = 14;

/// Significant digits used by the stack printer (plain `%g`).
pub const PRINT_PRECISION: usize = 6;

/// Formats a number like C's `%.<precision>g`.
///
/// Trailing zeros are removed, the exponent form is used when the exponent
/// is below -4 or at least `precision`, and exponents carry a sign and at
/// least two digits.
#[must_use]
pub fn format_g(x: f64, precision: usize) -> String {
    if x.is_nan() {
        return if x.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if x.is_infinite() {
        return if x < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let p = precision.max(1);
    let scientific = format!("{:.*e}", p - 1, x);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let p_i32 = p as i32;
    if exponent < -4 || exponent >= p_i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        #[allow(clippy::cast_sign_loss)]
        let decimals = (p_i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{x:.decimals$}")).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Converts a number to its string form (`%.14g`).
#[must_use]
pub fn number_to_string(x: f64) -> String {
    format_g(x, TOSTRING_PRECISION)
}

/// Converts a number to an integer by truncation, saturating at the bounds.
///
/// NaN converts to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn number_to_integer(x: f64) -> i64 {
    x as i64
}

/// Parses a string as a number, the way implicit coercion does.
///
/// Accepts surrounding whitespace, an optional sign, decimal and exponent
/// forms, and `0x` hexadecimal integers. Returns `None` for anything else.
#[must_use]
pub fn str_to_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return None;
    }

    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        #[allow(clippy::cast_precision_loss)]
        let value = u64::from_str_radix(hex, 16).ok()? as f64;
        value
    } else {
        body.parse::<f64>().ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}
