//! Loose value coercions.
//!
//! Editor configuration arrives as strings and step outputs are untyped
//! JSON, so comparisons and arithmetic follow JavaScript's permissive rules
//! rather than failing on a type mismatch.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

/// `parseFloat` semantics: the longest numeric prefix of the trimmed string,
/// `NaN` when there is none.
pub fn parse_float(value: &Value) -> f64 {
  match value {
    Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
    Value::String(s) => parse_float_str(s),
    _ => f64::NAN,
  }
}

pub fn parse_float_str(s: &str) -> f64 {
  let s = s.trim_start();
  let bytes = s.as_bytes();
  let mut end = 0;

  if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
    end += 1;
  }
  if s[end..].starts_with("Infinity") {
    return if bytes.first() == Some(&b'-') {
      f64::NEG_INFINITY
    } else {
      f64::INFINITY
    };
  }

  let int_start = end;
  while end < bytes.len() && bytes[end].is_ascii_digit() {
    end += 1;
  }
  let mut digits = end - int_start;
  if end < bytes.len() && bytes[end] == b'.' {
    let frac_start = end + 1;
    let mut frac_end = frac_start;
    while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
      frac_end += 1;
    }
    digits += frac_end - frac_start;
    if digits > 0 {
      end = frac_end;
    }
  }
  if digits == 0 {
    return f64::NAN;
  }

  // Exponent only counts when followed by at least one digit.
  if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
    let mut exp_end = end + 1;
    if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
      exp_end += 1;
    }
    let exp_digits_start = exp_end;
    while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
      exp_end += 1;
    }
    if exp_end > exp_digits_start {
      end = exp_end;
    }
  }

  s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// `parseInt(String(v), 10)` semantics. `None` stands in for `NaN`.
pub fn parse_int(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
    Value::String(s) => {
      let s = s.trim_start();
      let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
      };
      let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
      digits.parse::<i64>().ok().map(|n| sign * n)
    }
    _ => None,
  }
}

/// JSON number for an `f64`, using an integer representation when the value
/// is integral so that `8.0` serializes as `8`.
pub fn number_value(n: f64) -> Value {
  if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
    Value::Number(Number::from(n as i64))
  } else {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
  }
}

/// `String(v)`: strings verbatim, `null` as `"null"`, containers as JSON.
pub fn display_string(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => "null".to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => display_number(n),
    Value::Array(_) | Value::Object(_) => value.to_string(),
  }
}

/// Like [`display_string`] but `null` renders as an empty string.
pub fn template_string(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    other => display_string(other),
  }
}

fn display_number(n: &Number) -> String {
  if n.is_f64() {
    // `{}` on f64 prints integral values without a trailing `.0`.
    n.as_f64().map(|f| format!("{}", f)).unwrap_or_default()
  } else {
    n.to_string()
  }
}

/// Case-insensitive ordering with a byte-order tie break, approximating
/// `localeCompare` for the plain-text values found in deal data.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
  a.to_lowercase()
    .cmp(&b.to_lowercase())
    .then_with(|| a.cmp(b))
}

/// Parse a value as a point in time, in epoch milliseconds.
///
/// Numbers are taken as epoch milliseconds; strings may be RFC 3339,
/// `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` (UTC).
pub fn parse_date(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
    Value::String(s) => parse_date_str(s.trim()),
    _ => None,
  }
}

fn parse_date_str(s: &str) -> Option<i64> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.timestamp_millis());
  }
  for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
      return Some(dt.and_utc().timestamp_millis());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_float_prefixes() {
    assert_eq!(parse_float(&json!("3")), 3.0);
    assert_eq!(parse_float(&json!("  -2.5kg")), -2.5);
    assert_eq!(parse_float(&json!(".5")), 0.5);
    assert_eq!(parse_float(&json!("1e3x")), 1000.0);
    assert_eq!(parse_float(&json!("7e")), 7.0);
    assert_eq!(parse_float(&json!(5)), 5.0);
    assert!(parse_float(&json!("x")).is_nan());
    assert!(parse_float(&json!("")).is_nan());
    assert!(parse_float(&json!(".")).is_nan());
    assert!(parse_float(&json!(true)).is_nan());
    assert!(parse_float(&Value::Null).is_nan());
    assert_eq!(parse_float(&json!("-Infinity")), f64::NEG_INFINITY);
  }

  #[test]
  fn test_parse_int() {
    assert_eq!(parse_int(&json!("2")), Some(2));
    assert_eq!(parse_int(&json!("2.9")), Some(2));
    assert_eq!(parse_int(&json!(" -4 items")), Some(-4));
    assert_eq!(parse_int(&json!(3.7)), Some(3));
    assert_eq!(parse_int(&json!("abc")), None);
    assert_eq!(parse_int(&Value::Null), None);
  }

  #[test]
  fn test_number_value() {
    assert_eq!(number_value(8.0), json!(8));
    assert_eq!(number_value(2.5), json!(2.5));
    assert_eq!(number_value(f64::NAN), Value::Null);
  }

  #[test]
  fn test_display_string() {
    assert_eq!(display_string(&json!("a")), "a");
    assert_eq!(display_string(&json!(1)), "1");
    assert_eq!(display_string(&json!(2.0)), "2");
    assert_eq!(display_string(&json!(true)), "true");
    assert_eq!(display_string(&Value::Null), "null");
    assert_eq!(display_string(&json!({ "a": 1 })), r#"{"a":1}"#);
    assert_eq!(template_string(&Value::Null), "");
  }

  #[test]
  fn test_locale_compare() {
    assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
    assert_eq!(locale_compare("b", "B"), Ordering::Greater);
    assert_eq!(locale_compare("same", "same"), Ordering::Equal);
  }

  #[test]
  fn test_parse_date() {
    let day = parse_date(&json!("2024-03-01")).unwrap();
    let rfc = parse_date(&json!("2024-03-01T00:00:00Z")).unwrap();
    let naive = parse_date(&json!("2024-03-01 12:00:00")).unwrap();

    assert_eq!(day, rfc);
    assert_eq!(naive - day, 12 * 60 * 60 * 1000);
    assert_eq!(parse_date(&json!(1_700_000_000_000_i64)), Some(1_700_000_000_000));
    assert_eq!(parse_date(&json!("not a date")), None);
  }
}
