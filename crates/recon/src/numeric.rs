use crate::model::{Coerced, CoercionTally};

/// Parse a numeric cell:
/// - Strip whitespace, thousands separators and a leading `$` / `₹`
/// - Handle `(123.45)` → `-123.45`
/// - Returns None if non-numeric characters remain after stripping
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (is_negative, inner) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | '₹' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '0'..='9' | '.' => {}
            '-' | '+' if i == 0 && !is_negative => {}
            // Spreadsheet exports write large counts as 1.2E+3
            'e' | 'E' if i > 0 => {}
            '-' | '+' if i > 0 => {}
            _ => return None,
        }
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if is_negative { -value } else { value })
}

/// Total parse of a quantity cell: fractions truncate toward zero, anything
/// blank or unparseable is 0 and counted in `tally`.
pub fn coerce_quantity(s: &str, tally: &mut CoercionTally) -> Coerced<i64> {
    match parse_number(s) {
        Some(v) => Coerced::exact(v.trunc() as i64),
        None => {
            record_failure(s, tally);
            Coerced::fallback(0)
        }
    }
}

/// Total parse of an amount cell (cost price). Same fallback as quantities.
pub fn coerce_amount(s: &str, tally: &mut CoercionTally) -> Coerced<f64> {
    match parse_number(s) {
        Some(v) => Coerced::exact(v),
        None => {
            record_failure(s, tally);
            Coerced::fallback(0.0)
        }
    }
}

fn record_failure(s: &str, tally: &mut CoercionTally) {
    if s.trim().is_empty() {
        tally.blank += 1;
    } else {
        tally.unparseable += 1;
    }
}
