//! Operator application on single values.

use confpatch_pattern::Operator;
use regex_lite::Regex;

use super::error::EditError;

/// Combine `old` with `new` under `operator`.
///
/// Numeric operators need both sides to parse as numbers; the result is
/// printed without a trailing `.0`. `^` treats the first character of
/// `new` as a delimiter: `/pattern/replacement/`.
pub fn apply(operator: Operator, old: &str, new: &str) -> Result<String, EditError> {
    let (a, b) = match operator {
        Operator::Assign => return Ok(new.to_string()),
        Operator::RegexReplace => return regex_replace(old, new),
        _ => (number(operator, old)?, number(operator, new)?),
    };
    let result = match operator {
        Operator::Add => a + b,
        Operator::Subtract => a - b,
        Operator::Multiply => a * b,
        Operator::Divide => a / b,
        _ => a.powf(b),
    };
    if !result.is_finite() {
        return Err(EditError::NotFinite {
            operator,
            value: old.to_string(),
        });
    }
    Ok(format_number(result))
}

fn number(operator: Operator, s: &str) -> Result<f64, EditError> {
    s.trim().parse::<f64>().map_err(|_| EditError::NotNumeric {
        operator,
        value: s.to_string(),
    })
}

/// Print `n` rounded to 15 significant digits, without trailing zeros.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let rounded = format!("{:.14e}", n).parse::<f64>().unwrap_or(n);
    rounded.to_string()
}

fn regex_replace(old: &str, spec: &str) -> Result<String, EditError> {
    let mut chars = spec.chars();
    let delimiter = chars
        .next()
        .ok_or_else(|| EditError::MalformedReplacement(spec.to_string()))?;
    let mut parts = chars.as_str().split(delimiter);
    let (pattern, replacement) = match (parts.next(), parts.next()) {
        (Some(pattern), Some(replacement)) => (pattern, replacement),
        _ => return Err(EditError::MalformedReplacement(spec.to_string())),
    };
    let regex = Regex::new(pattern).map_err(|e| EditError::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(regex.replace_all(old, replacement).into_owned())
}
