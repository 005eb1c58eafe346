use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For EUR/USD/INR, 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// A participant's portion of an amount, in cents.
/// Equal splits rarely divide evenly, so shares keep the exact quotient and
/// are only rounded when formatted.
pub type Share = f64;

/// Currency symbols accepted (and ignored) in front of an amount.
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '₹', '¥'];

/// Format cents as a human-readable currency string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Round a share to the nearest cent.
pub fn round_share(share: Share) -> Cents {
    share.round() as Cents
}

/// Format a share, rounded to the nearest cent.
/// Example: 333.333.. -> "3.33", 1000.0 -> "10.00"
pub fn format_share(share: Share) -> String {
    format_cents(round_share(share))
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
///
/// Digits past the cent are accepted only when they are zeros ("1.500");
/// an amount finer than a cent is an `InvalidFormat`.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    if !input.chars().any(|c| c.is_ascii_digit())
        || !input.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let parts: Vec<&str> = input.split('.').collect();
    let cents = match parts.len() {
        // No decimal point, treat as whole units
        1 => parse_units(parts[0])?
            .checked_mul(100)
            .ok_or(ParseCentsError::Overflow)?,
        2 => {
            let units = if parts[0].is_empty() {
                0
            } else {
                parse_units(parts[0])?
            };

            // Pad the decimal part to 2 digits
            let decimal_str = parts[1];
            let decimal_cents: i64 = match decimal_str.len() {
                0 => 0,
                // Single digit like "5" means 50 cents
                1 => parse_units(decimal_str)? * 10,
                2 => parse_units(decimal_str)?,
                _ => {
                    let (cents, rest) = decimal_str.split_at(2);
                    if rest.chars().any(|c| c != '0') {
                        return Err(ParseCentsError::InvalidFormat);
                    }
                    parse_units(cents)?
                }
            };

            units
                .checked_mul(100)
                .and_then(|c| c.checked_add(decimal_cents))
                .ok_or(ParseCentsError::Overflow)?
        }
        _ => return Err(ParseCentsError::InvalidFormat),
    };

    Ok(if negative { -cents } else { cents })
}

/// Parse an amount as typed or dictated by a person: like [`parse_cents`],
/// but tolerates a leading currency symbol ("$15", "₹ 120.50", "-$3").
pub fn parse_amount(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, input),
    };
    let rest = rest.trim_start_matches(CURRENCY_SYMBOLS).trim_start();
    // One sign at most, and only in front of the symbol
    if rest.starts_with('-') {
        return Err(ParseCentsError::InvalidFormat);
    }
    let cents = parse_cents(rest)?;
    Ok(if negative { -cents } else { cents })
}

fn parse_units(digits: &str) -> Result<i64, ParseCentsError> {
    digits.parse().map_err(|e: std::num::ParseIntError| {
        if matches!(
            e.kind(),
            std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow
        ) {
            ParseCentsError::Overflow
        } else {
            ParseCentsError::InvalidFormat
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
