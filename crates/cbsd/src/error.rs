//! Error types for the cbsd binding.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, CbsdError>;

/// Errors that can occur while driving the `cbsd` tool.
#[derive(Error, Debug)]
pub enum CbsdError {
    /// The external process could not be spawned or its output could not
    /// be read. The exit status of a process that did run is never
    /// inspected; `cbsd` reports logical failures in its output text.
    #[error("failed to run {program}: {source}")]
    Exec {
        /// Program that failed to launch
        program: String,
        /// Underlying OS error
        source: io::Error,
    },

    /// The process ran to completion but its output says the target domain
    /// does not exist. The message is the raw text captured from the tool,
    /// either the full output (start/stop) or the single offending line
    /// (remove), so callers see exactly what `cbsd` printed.
    #[error("{0}")]
    NoSuchDomain(String),
}

impl CbsdError {
    /// Check if this error indicates the target domain did not exist.
    pub fn is_no_such_domain(&self) -> bool {
        matches!(self, CbsdError::NoSuchDomain(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_such_domain_display_is_raw_message() {
        let err = CbsdError::NoSuchDomain("No such domain: no-domain".to_string());
        assert_eq!(err.to_string(), "No such domain: no-domain");
        assert!(err.is_no_such_domain());
    }

    #[test]
    fn test_exec_display_names_program() {
        let err = CbsdError::Exec {
            program: "cbsd".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("cbsd"));
        assert!(!err.is_no_such_domain());
    }
}
