//! Observable lifecycle events
//!
//! Events are explicit and typed. Their upper-snake-case names are carried
//! as the `event` field of every structured log line.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot
    /// Definitions and store data loaded
    BootComplete,
    /// HTTP server listening
    ServerStart,

    // Set execution
    /// Set execution begins
    SetExecStart,
    /// Set execution finished with a result list
    SetExecComplete,
    /// Set execution stopped on a fatal error
    SetExecAborted,

    // Query execution
    /// Query finished successfully
    QueryComplete,
    /// Query failed and the set aborts
    QueryFailed,
    /// Query failed and the set continues
    QuerySkippedOnError,
    /// Pre/post script finished
    ScriptComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootComplete => "BOOT_COMPLETE",
            Event::ServerStart => "SERVER_START",
            Event::SetExecStart => "SET_EXEC_START",
            Event::SetExecComplete => "SET_EXEC_COMPLETE",
            Event::SetExecAborted => "SET_EXEC_ABORTED",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::QueryFailed => "QUERY_FAILED",
            Event::QuerySkippedOnError => "QUERY_SKIPPED_ON_ERROR",
            Event::ScriptComplete => "SCRIPT_COMPLETE",
        }
    }

    /// Events logged at warn level
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::SetExecAborted | Event::QueryFailed | Event::QuerySkippedOnError
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::SetExecStart.as_str(), "SET_EXEC_START");
        assert_eq!(Event::QuerySkippedOnError.to_string(), "QUERY_SKIPPED_ON_ERROR");
    }

    #[test]
    fn test_failure_events() {
        assert!(Event::QueryFailed.is_failure());
        assert!(!Event::QueryComplete.is_failure());
    }
}
