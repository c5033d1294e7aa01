//! Parameter validation
//!
//! Runs once per execution, before any query. Defaults are filled in
//! first, then every still-missing param is reported together, then each
//! declared regex is checked against the (possibly defaulted) value.

use std::collections::HashMap;

use crate::definition::{Param, RegexLookup};

use super::errors::{ParamError, ParamResult};

/// Reconciles declared params with caller variables
pub struct ParamValidator<'a> {
    regexes: &'a dyn RegexLookup,
}

impl<'a> ParamValidator<'a> {
    pub fn new(regexes: &'a dyn RegexLookup) -> Self {
        Self { regexes }
    }

    /// Fill defaults into `vars` and validate every declared param.
    ///
    /// Variables not declared by any param are left alone.
    pub fn validate(
        &self,
        params: &[Param],
        vars: &mut HashMap<String, String>,
    ) -> ParamResult<()> {
        for param in params {
            if vars.contains_key(&param.name) {
                continue;
            }
            if let Some(default) = &param.default {
                vars.insert(param.name.clone(), default.clone());
            }
        }

        let missing: Vec<String> = params
            .iter()
            .filter(|p| !vars.contains_key(&p.name))
            .map(|p| p.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(ParamError::Missing(missing));
        }

        for param in params {
            let Some(regex_name) = param.regex_name.as_deref().filter(|r| !r.is_empty()) else {
                continue;
            };

            let regex = self.regexes.regex_by_name(regex_name).map_err(|e| {
                if e.is_not_found() {
                    ParamError::RegexNotFound {
                        param: param.name.clone(),
                        regex: regex_name.to_string(),
                    }
                } else {
                    ParamError::Lookup(e)
                }
            })?;

            let value = vars.get(&param.name).map(String::as_str).unwrap_or_default();
            if !regex.is_match(value) {
                return Err(ParamError::NoMatch {
                    param: param.name.clone(),
                    value: value.to_string(),
                    regex: regex_name.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DefinitionRegistry, RegexDef};

    fn registry() -> DefinitionRegistry {
        let registry = DefinitionRegistry::new();
        registry.upsert_regex(RegexDef::new("number", "^[0-9]+$")).unwrap();
        registry
            .upsert_regex(RegexDef::new("email", r"^[^@\s]+@[^@\s]+\.[a-z]+$"))
            .unwrap();
        registry
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_fill_missing() {
        let registry = registry();
        let params = vec![Param::required("limit").with_default("5")];
        let mut v = HashMap::new();

        ParamValidator::new(&registry).validate(&params, &mut v).unwrap();
        assert_eq!(v.get("limit").map(String::as_str), Some("5"));
    }

    #[test]
    fn test_caller_value_wins_over_default() {
        let registry = registry();
        let params = vec![Param::required("limit").with_default("5")];
        let mut v = vars(&[("limit", "9")]);

        ParamValidator::new(&registry).validate(&params, &mut v).unwrap();
        assert_eq!(v["limit"], "9");
    }

    #[test]
    fn test_missing_reported_together() {
        let registry = registry();
        let params = vec![
            Param::required("a"),
            Param::required("b").with_default("x"),
            Param::required("c"),
        ];
        let mut v = HashMap::new();

        let err = ParamValidator::new(&registry).validate(&params, &mut v).unwrap_err();
        assert_eq!(err.to_string(), "Variables [a c] were not included with the call");
    }

    #[test]
    fn test_regex_not_found() {
        let registry = registry();
        let params = vec![Param::required("station_id").with_regex("zip")];
        let mut v = vars(&[("station_id", "42021")]);

        let err = ParamValidator::new(&registry).validate(&params, &mut v).unwrap_err();
        assert_eq!(err.to_string(), "Regex \"zip\" for param \"station_id\" not found");
    }

    #[test]
    fn test_regex_mismatch() {
        let registry = registry();
        let params = vec![Param::required("station_id").with_regex("email")];
        let mut v = vars(&[("station_id", "42021")]);

        let err = ParamValidator::new(&registry).validate(&params, &mut v).unwrap_err();
        assert!(matches!(err, ParamError::NoMatch { .. }));
        let msg = err.to_string();
        assert!(msg.contains("42021"));
        assert!(msg.contains("email"));
        assert!(msg.contains("does not match"));
    }

    #[test]
    fn test_default_checked_against_regex() {
        let registry = registry();
        let params = vec![Param::required("limit").with_default("ten").with_regex("number")];
        let mut v = HashMap::new();

        let err = ParamValidator::new(&registry).validate(&params, &mut v).unwrap_err();
        assert!(matches!(err, ParamError::NoMatch { ref value, .. } if value == "ten"));
    }

    #[test]
    fn test_extra_variables_ignored() {
        let registry = registry();
        let mut v = vars(&[("unused", "1")]);
        ParamValidator::new(&registry).validate(&[], &mut v).unwrap();
        assert_eq!(v.len(), 1);
    }
}
