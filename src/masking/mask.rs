//! Mask types and scalar transforms

use std::str::FromStr;

use serde_json::Value;

/// Characters revealed by `left`/`right` when no count is given
pub const DEFAULT_REVEAL: usize = 4;

/// Replacement for strings under an `all` mask
pub const REDACTED: &str = "******";

const MASK_CHAR: char = '*';

/// How a masked field is transformed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskType {
    /// Delete the field
    Remove,
    /// Strings become `******`, numbers become 0
    All,
    /// Keep the first character of local part and domain, and the TLD
    Email,
    /// Reveal only the first N characters
    Left(usize),
    /// Reveal only the last N characters
    Right(usize),
}

impl FromStr for MaskType {
    type Err = String;

    /// Exact match on `remove`, `all`, `email`, `left`, `leftN`, `left[N]`,
    /// `right`, `rightN` and `right[N]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remove" => return Ok(MaskType::Remove),
            "all" => return Ok(MaskType::All),
            "email" => return Ok(MaskType::Email),
            _ => {}
        }

        if let Some(rest) = s.strip_prefix("left") {
            return reveal_count(rest).map(MaskType::Left).ok_or_else(|| s.to_string());
        }
        if let Some(rest) = s.strip_prefix("right") {
            return reveal_count(rest).map(MaskType::Right).ok_or_else(|| s.to_string());
        }

        Err(s.to_string())
    }
}

/// Parse the count suffix: empty, `N` or `[N]`
fn reveal_count(suffix: &str) -> Option<usize> {
    if suffix.is_empty() {
        return Some(DEFAULT_REVEAL);
    }
    let digits = suffix
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(suffix);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl MaskType {
    /// Transform a scalar in place. `Remove` is handled by the caller.
    pub fn apply(&self, value: &mut Value) {
        match self {
            MaskType::Remove => {}
            MaskType::All => match value {
                Value::String(s) => *s = REDACTED.to_string(),
                Value::Number(_) => *value = Value::from(0),
                _ => {}
            },
            MaskType::Email => {
                if let Some(text) = scalar_text(value) {
                    *value = Value::String(mask_email(&text));
                }
            }
            MaskType::Left(n) => {
                if let Some(text) = scalar_text(value) {
                    *value = Value::String(reveal_left(&text, *n));
                }
            }
            MaskType::Right(n) => {
                if let Some(text) = scalar_text(value) {
                    *value = Value::String(reveal_right(&text, *n));
                }
            }
        }
    }
}

/// String form of strings and numbers; other scalars are left alone
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn reveal_left(text: &str, n: usize) -> String {
    text.chars()
        .enumerate()
        .map(|(i, c)| if i < n { c } else { MASK_CHAR })
        .collect()
}

fn reveal_right(text: &str, n: usize) -> String {
    let len = text.chars().count();
    let hidden = len.saturating_sub(n);
    text.chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { MASK_CHAR } else { c })
        .collect()
}

fn mask_email(text: &str) -> String {
    let Some((local, domain)) = text.rsplit_once('@') else {
        return reveal_left(text, 1);
    };

    let masked_domain = match domain.rsplit_once('.') {
        Some((name, tld)) => format!("{}.{}", reveal_left(name, 1), tld),
        None => reveal_left(domain, 1),
    };

    format!("{}@{}", reveal_left(local, 1), masked_domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_exact_names() {
        assert_eq!("remove".parse::<MaskType>(), Ok(MaskType::Remove));
        assert_eq!("all".parse::<MaskType>(), Ok(MaskType::All));
        assert_eq!("email".parse::<MaskType>(), Ok(MaskType::Email));
        assert_eq!("left".parse::<MaskType>(), Ok(MaskType::Left(4)));
        assert_eq!("left2".parse::<MaskType>(), Ok(MaskType::Left(2)));
        assert_eq!("right[6]".parse::<MaskType>(), Ok(MaskType::Right(6)));
    }

    #[test]
    fn test_parse_rejects_near_misses() {
        for bad in ["rem", "alls", "emailx", "leftx", "left[]", "right[3", "Right4", ""] {
            assert!(bad.parse::<MaskType>().is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn test_all() {
        let mut s = json!("secret");
        MaskType::All.apply(&mut s);
        assert_eq!(s, json!("******"));

        let mut n = json!(123.45);
        MaskType::All.apply(&mut n);
        assert_eq!(n, json!(0));

        let mut b = json!(true);
        MaskType::All.apply(&mut b);
        assert_eq!(b, json!(true));
    }

    #[test]
    fn test_left_and_right() {
        let mut v = json!("4111111111111111");
        MaskType::Right(4).apply(&mut v);
        assert_eq!(v, json!("************1111"));

        let mut v = json!("4111111111111111");
        MaskType::Left(2).apply(&mut v);
        assert_eq!(v, json!("41**************"));

        let mut short = json!("abc");
        MaskType::Left(4).apply(&mut short);
        assert_eq!(short, json!("abc"));
    }

    #[test]
    fn test_numbers_masked_as_strings() {
        let mut v = json!(5551234);
        MaskType::Right(2).apply(&mut v);
        assert_eq!(v, json!("*****34"));
    }

    #[test]
    fn test_email() {
        let mut v = json!("john.doe@example.com");
        MaskType::Email.apply(&mut v);
        assert_eq!(v, json!("j*******@e******.com"));

        let mut v = json!("root@localhost");
        MaskType::Email.apply(&mut v);
        assert_eq!(v, json!("r***@l********"));
    }
}
