use std::fmt;

use super::Cell;

/// Money is represented as integer cents to keep the running balance exact.
/// ₹1,200.50 = 120050 cents.
pub type Cents = i64;

/// Currency glyph that spreadsheet cells may carry in front of amounts.
pub const CURRENCY_GLYPH: char = '₹';

/// Format cents as a plain decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Format cents with thousands separators and the currency glyph.
/// Example: 120050 -> "₹1,200.50"
pub fn format_currency(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = (abs_cents / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}{}.{:02}", sign, CURRENCY_GLYPH, grouped, abs_cents % 100)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, decimal_str) = match digits.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (digits, ""),
    };

    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !decimal_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::OutOfRange)?
    };

    // Pad or truncate the fractional part to two digits
    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        1 => decimal_str[..1].parse::<i64>().unwrap_or(0) * 10,
        _ => decimal_str[..2].parse().unwrap_or(0),
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::OutOfRange)?;
    Ok(if negative { -cents } else { cents })
}

/// Convert a numeric cell value into cents, rounding to the nearest cent.
pub fn cents_from_f64(value: f64) -> Result<Cents, ParseCentsError> {
    if !value.is_finite() {
        return Err(ParseCentsError::NonFinite);
    }
    let scaled = (value * 100.0).round();
    if scaled.abs() >= i64::MAX as f64 {
        return Err(ParseCentsError::OutOfRange);
    }
    Ok(scaled as Cents)
}

/// Convert cents back into the numeric value a spreadsheet cell would hold.
pub fn cents_to_f64(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Largest amount magnitude a cell may carry: ₹10 lakh crore.
///
/// Keeps every running balance well inside `i64`, and every amount exactly
/// representable as a spreadsheet number.
pub const MAX_AMOUNT_CENTS: Cents = 1_000_000_000_000_000;

/// Strictly normalize a raw amount cell.
///
/// Numbers pass through. Text has the currency glyph, comma separators and
/// whitespace removed before parsing. Empty cells are zero. Magnitudes above
/// [`MAX_AMOUNT_CENTS`] are `OutOfRange`.
pub fn try_normalize_amount(cell: &Cell) -> Result<Cents, ParseCentsError> {
    let cents = try_normalize_cents(cell)?;
    if cents.unsigned_abs() > MAX_AMOUNT_CENTS.unsigned_abs() {
        return Err(ParseCentsError::OutOfRange);
    }
    Ok(cents)
}

/// Normalize a money cell with no bound beyond `i64` itself. Used for
/// derived cells such as balances.
pub fn try_normalize_cents(cell: &Cell) -> Result<Cents, ParseCentsError> {
    match cell {
        Cell::Empty => Ok(0),
        Cell::Number(value) => cents_from_f64(*value),
        Cell::Text(text) => {
            if text.trim().is_empty() {
                return Ok(0);
            }
            let cleaned: String = text
                .chars()
                .filter(|c| *c != CURRENCY_GLYPH && *c != ',' && !c.is_whitespace())
                .collect();
            parse_cents(&cleaned)
        }
    }
}

/// Normalize a raw amount cell, degrading to zero on any parse failure.
///
/// The failure is logged so a malformed cell never goes unnoticed, but it
/// never blocks the ledger.
pub fn normalize_amount(cell: &Cell) -> Cents {
    try_normalize_amount(cell).unwrap_or_else(|error| {
        tracing::warn!(raw = %cell, %error, "unparsable amount, using 0");
        0
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    NonFinite,
    OutOfRange,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::NonFinite => write!(f, "amount is not a finite number"),
            ParseCentsError::OutOfRange => write!(f, "amount is out of range"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(120050), "₹1,200.50");
        assert_eq!(format_currency(99), "₹0.99");
        assert_eq!(format_currency(123456789), "₹1,234,567.89");
        assert_eq!(format_currency(-100000), "-₹1,000.00");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("7."), Ok(700));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents("100.999"), Ok(10099)); // Truncates
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert!(parse_cents("abc").is_err());
        assert!(parse_cents("12.34.56").is_err());
        assert!(parse_cents("").is_err());
        assert!(parse_cents("-").is_err());
        assert!(parse_cents(".").is_err());
        assert!(parse_cents("--5").is_err());
        assert!(parse_cents("1e3").is_err());
        assert_eq!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::OutOfRange)
        );
    }

    #[test]
    fn test_normalize_currency_text() {
        assert_eq!(normalize_amount(&Cell::text("₹1,200.50")), 120050);
        assert_eq!(normalize_amount(&Cell::text(" ₹ 12,34,567 ")), 123456700);
        assert_eq!(normalize_amount(&Cell::text("300")), 30000);
    }

    #[test]
    fn test_normalize_numbers_pass_through() {
        assert_eq!(normalize_amount(&Cell::Number(500.0)), 50000);
        assert_eq!(normalize_amount(&Cell::Number(1200.5)), 120050);
        assert_eq!(normalize_amount(&Cell::Number(0.1)), 10);
    }

    #[test]
    fn test_normalize_missing_is_zero() {
        assert_eq!(try_normalize_amount(&Cell::Empty), Ok(0));
        assert_eq!(try_normalize_amount(&Cell::Text("   ".into())), Ok(0));
    }

    #[test]
    fn test_normalize_garbage_degrades_to_zero() {
        assert_eq!(
            try_normalize_amount(&Cell::text("garbage")),
            Err(ParseCentsError::InvalidFormat)
        );
        assert_eq!(normalize_amount(&Cell::text("garbage")), 0);
        assert_eq!(normalize_amount(&Cell::text("₹")), 0);
        assert_eq!(
            try_normalize_amount(&Cell::Number(f64::NAN)),
            Err(ParseCentsError::NonFinite)
        );
        assert_eq!(normalize_amount(&Cell::Number(f64::INFINITY)), 0);
    }

    #[test]
    fn test_normalize_rejects_oversized_amounts() {
        assert_eq!(
            try_normalize_amount(&Cell::text("₹50,000,000,000,000,000")),
            Err(ParseCentsError::OutOfRange)
        );
        assert_eq!(
            try_normalize_amount(&Cell::Number(-1e14)),
            Err(ParseCentsError::OutOfRange)
        );
        assert_eq!(normalize_amount(&Cell::text("50000000000000000")), 0);

        // The bound itself is accepted
        assert_eq!(
            try_normalize_amount(&Cell::text("10,000,000,000,000")),
            Ok(MAX_AMOUNT_CENTS)
        );

        // Balances are not bounded
        assert_eq!(
            try_normalize_cents(&Cell::text("50000000000000000")),
            Ok(5_000_000_000_000_000_000)
        );
    }
}
