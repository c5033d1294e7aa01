//! Placeholder resolution
//!
//! Scalar kinds read caller variables, falling back to the reference itself
//! as a literal. Data kinds read the saved results of earlier queries.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};

use super::errors::{PlaceholderError, PlaceholderResult};
use super::parser::{DataOp, Placeholder, PlaceholderKind};
use super::saved::{field_at, SavedResults};

const DATE_ONLY: &str = "%Y-%m-%d";
const DATE_TIME_MILLIS: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const DATE_TIME_MILLIS_UTC: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Resolves parsed placeholders to typed values
pub struct Resolver<'a> {
    vars: &'a HashMap<String, String>,
    saved: &'a SavedResults,
}

impl<'a> Resolver<'a> {
    pub fn new(vars: &'a HashMap<String, String>, saved: &'a SavedResults) -> Self {
        Self { vars, saved }
    }

    /// Resolve a placeholder to its value
    pub fn resolve(&self, placeholder: &Placeholder) -> PlaceholderResult<Value> {
        match placeholder.kind {
            PlaceholderKind::Number => {
                let raw = self.variable(&placeholder.reference);
                raw.trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| PlaceholderError::InvalidNumber(raw.to_string()))
            }
            PlaceholderKind::String => Ok(Value::String(
                self.variable(&placeholder.reference).to_string(),
            )),
            PlaceholderKind::Date => parse_date(self.variable(&placeholder.reference)),
            PlaceholderKind::ObjectId => parse_object_id(self.variable(&placeholder.reference)),
            PlaceholderKind::Data(op) => self.resolve_data(placeholder, op),
        }
    }

    /// Resolve a placeholder that is the whole value of a `$in` key.
    ///
    /// Only data placeholders are allowed there. A single value is wrapped
    /// so `$in` always receives an array.
    pub fn resolve_in(&self, placeholder: &Placeholder) -> PlaceholderResult<Value> {
        if !placeholder.is_data() {
            return Err(PlaceholderError::InvalidInPlaceholder(placeholder.raw.clone()));
        }
        match self.resolve(placeholder)? {
            Value::Array(items) => Ok(Value::Array(items)),
            single => Ok(Value::Array(vec![single])),
        }
    }

    fn variable<'r>(&'r self, reference: &'r str) -> &'r str {
        self.vars.get(reference).map(String::as_str).unwrap_or(reference)
    }

    fn resolve_data(&self, placeholder: &Placeholder, op: DataOp) -> PlaceholderResult<Value> {
        let (key, field) = placeholder.data_ref()?;

        let docs = self
            .saved
            .get(key)
            .ok_or_else(|| PlaceholderError::KeyNotFound(key.to_string()))?;

        if docs.iter().any(|doc| !doc.is_object()) {
            return Err(PlaceholderError::NotDocumentList(key.to_string()));
        }

        let field_missing = || PlaceholderError::FieldNotFound {
            field: field.to_string(),
            key: key.to_string(),
        };

        match op {
            DataOp::All => {
                if docs.is_empty() {
                    return Err(PlaceholderError::EmptyResults(key.to_string()));
                }
                let values: Vec<Value> = docs
                    .iter()
                    .filter_map(|doc| field_at(doc, field).cloned())
                    .collect();
                if values.is_empty() {
                    return Err(field_missing());
                }
                Ok(Value::Array(values))
            }
            DataOp::Index(index) => {
                let doc = docs.get(index).ok_or(PlaceholderError::IndexOutOfRange {
                    index,
                    total: docs.len(),
                })?;
                field_at(doc, field).cloned().ok_or_else(field_missing)
            }
        }
    }
}

/// Parse a date by layout length and emit it as extended JSON
fn parse_date(raw: &str) -> PlaceholderResult<Value> {
    let invalid = || PlaceholderError::InvalidDate(raw.to_string());

    let naive = match raw.len() {
        10 => NaiveDate::parse_from_str(raw, DATE_ONLY)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        23 => NaiveDateTime::parse_from_str(raw, DATE_TIME_MILLIS).ok(),
        24 => NaiveDateTime::parse_from_str(raw, DATE_TIME_MILLIS_UTC).ok(),
        _ => None,
    }
    .ok_or_else(invalid)?;

    let instant = Utc.from_utc_datetime(&naive);
    Ok(json!({ "$date": instant.to_rfc3339_opts(SecondsFormat::Millis, true) }))
}

/// Validate a 24 character hex object id and emit it as extended JSON
fn parse_object_id(raw: &str) -> PlaceholderResult<Value> {
    if raw.len() != 24 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PlaceholderError::InvalidObjectId(raw.to_string()));
    }
    Ok(json!({ "$oid": raw.to_ascii_lowercase() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolve(token: &str, vars: &HashMap<String, String>, saved: &SavedResults) -> PlaceholderResult<Value> {
        Resolver::new(vars, saved).resolve(&Placeholder::parse(token)?)
    }

    fn stations() -> SavedResults {
        let mut saved = SavedResults::new();
        saved.insert(
            "list",
            vec![
                json!({"station_id": "42021", "loc": {"lat": 28.5}}),
                json!({"name": "no id"}),
                json!({"station_id": "42022", "loc": {"lat": 27.1}}),
            ],
        );
        saved.insert("station", vec![json!({"station_id": "42021"})]);
        saved.insert("empty", vec![]);
        saved
    }

    #[test]
    fn test_number_from_variable_and_literal() {
        let v = vars(&[("limit", "5")]);
        let saved = SavedResults::new();
        assert_eq!(resolve("#number:limit", &v, &saved).unwrap(), json!(5));
        assert_eq!(resolve("#number:12", &v, &saved).unwrap(), json!(12));
        assert_eq!(
            resolve("#number:name", &vars(&[("name", "abc")]), &saved),
            Err(PlaceholderError::InvalidNumber("abc".into()))
        );
    }

    #[test]
    fn test_string_verbatim() {
        let v = vars(&[("station_id", "42021")]);
        let saved = SavedResults::new();
        assert_eq!(resolve("#string:station_id", &v, &saved).unwrap(), json!("42021"));
        assert_eq!(resolve("#string:literal", &v, &saved).unwrap(), json!("literal"));
    }

    #[test]
    fn test_date_layouts() {
        let saved = SavedResults::new();
        let empty = HashMap::new();
        assert_eq!(
            resolve("#date:2000-01-01", &empty, &saved).unwrap(),
            json!({"$date": "2000-01-01T00:00:00.000Z"})
        );
        assert_eq!(
            resolve("#date:d", &vars(&[("d", "2013-04-07T12:30:45.120")]), &saved).unwrap(),
            json!({"$date": "2013-04-07T12:30:45.120Z"})
        );
        assert_eq!(
            resolve("#date:d", &vars(&[("d", "2013-04-07T12:30:45.120Z")]), &saved).unwrap(),
            json!({"$date": "2013-04-07T12:30:45.120Z"})
        );
    }

    #[test]
    fn test_date_invalid() {
        let saved = SavedResults::new();
        let err = resolve("#date:d", &vars(&[("d", "2000-1-1")]), &saved).unwrap_err();
        assert_eq!(err.to_string(), "Invalid date value \"2000-1-1\"");

        // Right length, wrong content
        let err = resolve("#date:d", &vars(&[("d", "2000-13-01")]), &saved).unwrap_err();
        assert_eq!(err, PlaceholderError::InvalidDate("2000-13-01".into()));
    }

    #[test]
    fn test_object_id() {
        let saved = SavedResults::new();
        let v = vars(&[("id", "507F1F77BCF86CD799439011")]);
        assert_eq!(
            resolve("#objid:id", &v, &saved).unwrap(),
            json!({"$oid": "507f1f77bcf86cd799439011"})
        );
        assert_eq!(
            resolve("#objid:xyz", &v, &saved),
            Err(PlaceholderError::InvalidObjectId("xyz".into()))
        );
    }

    #[test]
    fn test_data_all_skips_docs_without_field() {
        let saved = stations();
        let v = HashMap::new();
        assert_eq!(
            resolve("#data.*:list.station_id", &v, &saved).unwrap(),
            json!(["42021", "42022"])
        );
        assert_eq!(
            resolve("#data.*:list.loc.lat", &v, &saved).unwrap(),
            json!([28.5, 27.1])
        );
    }

    #[test]
    fn test_data_all_errors() {
        let saved = stations();
        let v = HashMap::new();
        assert_eq!(
            resolve("#data.*:empty.station_id", &v, &saved),
            Err(PlaceholderError::EmptyResults("empty".into()))
        );
        assert!(matches!(
            resolve("#data.*:list.missing", &v, &saved),
            Err(PlaceholderError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_data_index() {
        let saved = stations();
        let v = HashMap::new();
        assert_eq!(
            resolve("#data.0:station.station_id", &v, &saved).unwrap(),
            json!("42021")
        );
        let err = resolve("#data.8:station.station_id", &v, &saved).unwrap_err();
        assert_eq!(err.to_string(), "Index \"8\" out of range, total \"1\"");
        assert!(matches!(
            resolve("#data.1:list.station_id", &v, &saved),
            Err(PlaceholderError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_data_unknown_key() {
        let saved = stations();
        let err = resolve("#data.*:later.station_id", &HashMap::new(), &saved).unwrap_err();
        assert_eq!(err.to_string(), "Key \"later\" not found in saved results");
    }

    #[test]
    fn test_non_document_saved_entry_is_fatal() {
        let mut saved = SavedResults::new();
        saved.insert("counts", vec![json!(3)]);
        let err = resolve("#data.0:counts.n", &HashMap::new(), &saved).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_resolve_in_wraps_scalar() {
        let saved = stations();
        let v = HashMap::new();
        let resolver = Resolver::new(&v, &saved);

        let single = Placeholder::parse("#data.0:station.station_id").unwrap();
        assert_eq!(resolver.resolve_in(&single).unwrap(), json!(["42021"]));

        let all = Placeholder::parse("#data.*:list.station_id").unwrap();
        assert_eq!(resolver.resolve_in(&all).unwrap(), json!(["42021", "42022"]));

        let scalar = Placeholder::parse("#string:x").unwrap();
        assert!(matches!(
            resolver.resolve_in(&scalar),
            Err(PlaceholderError::InvalidInPlaceholder(_))
        ));
    }
}
