//! `$match` filter evaluation
//!
//! Filters compare values without type coercion, except that integer and
//! float numbers compare numerically. Extended JSON wrappers (`$date`,
//! `$oid`) compare by their inner string. A field holding an array matches
//! when any element matches.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use crate::placeholder::field_at;

/// Evaluates `$match` filters against documents
pub struct DocumentMatcher;

impl DocumentMatcher {
    /// Checks if a document matches every clause of `filter`
    pub fn matches(document: &Value, filter: &Map<String, Value>) -> StoreResult<bool> {
        for (key, condition) in filter {
            if !Self::matches_clause(document, key, condition)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_clause(document: &Value, key: &str, condition: &Value) -> StoreResult<bool> {
        match key {
            "$and" => {
                for sub in filter_list(key, condition)? {
                    if !Self::matches(document, sub)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            "$or" => {
                for sub in filter_list(key, condition)? {
                    if Self::matches(document, sub)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            op if op.starts_with('$') => Err(StoreError::UnsupportedOperator(op.to_string())),
            path => {
                let actual = field_at(document, path);
                match operator_map(condition) {
                    Some(ops) => {
                        for (op, operand) in ops {
                            if !Self::matches_operator(actual, op, operand)? {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    None => Ok(eq_match(actual, condition)),
                }
            }
        }
    }

    fn matches_operator(actual: Option<&Value>, op: &str, operand: &Value) -> StoreResult<bool> {
        let matched = match op {
            "$eq" => eq_match(actual, operand),
            "$ne" => !eq_match(actual, operand),
            "$gt" => range_match(actual, operand, |o| o == Ordering::Greater),
            "$gte" => range_match(actual, operand, |o| o != Ordering::Less),
            "$lt" => range_match(actual, operand, |o| o == Ordering::Less),
            "$lte" => range_match(actual, operand, |o| o != Ordering::Greater),
            "$in" => in_match(actual, in_list(op, operand)?),
            "$nin" => !in_match(actual, in_list(op, operand)?),
            "$exists" => {
                let wanted = operand.as_bool().ok_or_else(|| {
                    StoreError::invalid_stage("$match", "$exists expects a boolean")
                })?;
                actual.is_some() == wanted
            }
            other => return Err(StoreError::UnsupportedOperator(other.to_string())),
        };
        Ok(matched)
    }
}

/// Operator form `{"$gt": 1, "$lt": 5}`; any other value is an equality test
fn operator_map(condition: &Value) -> Option<&Map<String, Value>> {
    let map = condition.as_object()?;
    if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) && !is_extended_json(condition) {
        Some(map)
    } else {
        None
    }
}

fn filter_list<'a>(op: &str, condition: &'a Value) -> StoreResult<Vec<&'a Map<String, Value>>> {
    condition
        .as_array()
        .filter(|items| !items.is_empty())
        .and_then(|items| items.iter().map(Value::as_object).collect::<Option<Vec<_>>>())
        .ok_or_else(|| {
            StoreError::invalid_stage(
                "$match",
                format!("{} expects a non-empty array of filters", op),
            )
        })
}

fn in_list<'a>(op: &str, operand: &'a Value) -> StoreResult<&'a [Value]> {
    operand
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| StoreError::invalid_stage("$match", format!("{} expects an array", op)))
}

fn eq_match(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn in_match(actual: Option<&Value>, candidates: &[Value]) -> bool {
    candidates.iter().any(|candidate| eq_match(actual, candidate))
}

fn range_match(actual: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let check = |value: &Value| comparable(value, bound).map_or(false, |o| accept(o));
    match actual {
        None => false,
        Some(Value::Array(items)) => items.iter().any(check),
        Some(value) => check(value),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(xf), Some(yf)) => xf == yf,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Ordering between two values of the same comparable type
fn comparable(a: &Value, b: &Value) -> Option<Ordering> {
    match (unwrap_extended(a), unwrap_extended(b)) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total ordering used by `$sort`.
///
/// Missing < null < bool < number < string < array < object.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(a), Some(b)) => (unwrap_extended(a), unwrap_extended(b)),
    };

    let type_order = |v: &Value| -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    };

    let (a_type, b_type) = (type_order(a), type_order(b));
    if a_type != b_type {
        return a_type.cmp(&b_type);
    }

    comparable(a, b).unwrap_or(Ordering::Equal)
}

fn is_extended_json(value: &Value) -> bool {
    matches!(value.as_object(), Some(map) if map.len() == 1
        && (map.contains_key("$date") || map.contains_key("$oid")))
}

/// Inner string of `{"$date": ..}` / `{"$oid": ..}`, otherwise the value itself
fn unwrap_extended(value: &Value) -> &Value {
    if is_extended_json(value) {
        if let Some(inner) = value.as_object().and_then(|m| m.values().next()) {
            return inner;
        }
    }
    value
}
