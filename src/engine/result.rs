//! Set results
//!
//! Success: `{"results": [{"Name": .., "Docs": [..]}, ..], "error": false}`
//! Failure: `{"results": {"error": "<message>"}, "error": true}`

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use super::errors::ExecResult;

/// Output of one returned query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Docs")]
    pub docs: Vec<Value>,
}

impl QueryResult {
    pub fn new(name: impl Into<String>, docs: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            docs,
        }
    }
}

/// Final output of one set execution
#[derive(Debug, Clone, PartialEq)]
pub enum SetResult {
    /// One entry per returned query, in execution order
    Success(Vec<QueryResult>),
    /// The first fatal error message
    Failure(String),
}

impl SetResult {
    pub fn is_error(&self) -> bool {
        matches!(self, SetResult::Failure(_))
    }

    pub fn results(&self) -> Option<&[QueryResult]> {
        match self {
            SetResult::Success(results) => Some(results),
            SetResult::Failure(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SetResult::Success(_) => None,
            SetResult::Failure(message) => Some(message),
        }
    }

    /// Wire form of the result
    pub fn to_json(&self) -> Value {
        match self {
            SetResult::Success(results) => json!({ "results": results, "error": false }),
            SetResult::Failure(message) => {
                json!({ "results": { "error": message }, "error": true })
            }
        }
    }
}

impl From<ExecResult<Vec<QueryResult>>> for SetResult {
    fn from(result: ExecResult<Vec<QueryResult>>) -> Self {
        match result {
            Ok(results) => SetResult::Success(results),
            Err(e) => SetResult::Failure(e.to_string()),
        }
    }
}

impl Serialize for SetResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::errors::ExecError;

    #[test]
    fn test_success_wire_form() {
        let result = SetResult::Success(vec![QueryResult::new(
            "Basic",
            vec![json!({"name": "C14 - Pasco County Buoy, FL"})],
        )]);
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"results":[{"Name":"Basic","Docs":[{"name":"C14 - Pasco County Buoy, FL"}]}],"error":false}"#
        );
    }

    #[test]
    fn test_empty_success() {
        assert_eq!(
            SetResult::Success(vec![]).to_json(),
            json!({"results": [], "error": false})
        );
    }

    #[test]
    fn test_failure_wire_form() {
        let result: SetResult = Err(ExecError::SetDisabled("stations".into())).into();
        assert!(result.is_error());
        assert_eq!(
            result.to_json(),
            json!({"results": {"error": "Set \"stations\" is disabled"}, "error": true})
        );
    }
}
