use std::fmt;

use thiserror::Error;

use crate::flags::CheckFlagResult;

#[derive(Error, Debug)]
pub enum RulesEngineError {
    #[error("flag not found")]
    FlagNotFound,
    #[error("expected metric value for condition {0}, but received none")]
    MissingMetricValue(String),
    #[error("failed to parse input: {0}")]
    InputParsingError(#[from] serde_json::Error),
    #[error("input exceeds the {limit} byte limit")]
    InputTooLarge { limit: usize },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl RulesEngineError {
    /// Returns (error_code, status_code) for this error.
    fn error_metadata(&self) -> (&'static str, u16) {
        match self {
            RulesEngineError::InputParsingError(_) => ("input_parsing_error", 400),
            RulesEngineError::FlagNotFound => ("flag_not_found", 404),
            RulesEngineError::InputTooLarge { .. } => ("input_too_large", 413),
            // Malformed rule data means something upstream is broken, not the caller
            RulesEngineError::MissingMetricValue(_) => ("missing_metric_value", 500),
            RulesEngineError::Unexpected(_) => ("unexpected_error", 500),
        }
    }

    /// Returns a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        self.error_metadata().0
    }

    /// Returns the HTTP status code a serving layer should answer with.
    pub fn status_code(&self) -> u16 {
        self.error_metadata().1
    }

    pub fn is_5xx(&self) -> bool {
        self.status_code() >= 500
    }
}

/// A check that failed part way through. The result carries the flag's
/// identifiers, its default value, a displayable reason and the error in `err`.
#[derive(Debug)]
pub struct FlagCheckError {
    result: Box<CheckFlagResult>,
}

impl FlagCheckError {
    pub fn new(mut result: CheckFlagResult, source: RulesEngineError) -> Self {
        result.err = Some(source);
        Self {
            result: Box::new(result),
        }
    }

    /// The partial result; its `err` holds the failure.
    pub fn result(&self) -> &CheckFlagResult {
        &self.result
    }

    pub fn error(&self) -> Option<&RulesEngineError> {
        self.result.err.as_ref()
    }

    /// Splits off the error, leaving `err` on the returned result empty.
    pub fn into_parts(self) -> (CheckFlagResult, RulesEngineError) {
        let mut result = *self.result;
        let source = result
            .err
            .take()
            .unwrap_or_else(|| RulesEngineError::Unexpected(result.reason.clone()));
        (result, source)
    }

    pub fn into_result(self) -> CheckFlagResult {
        *self.result
    }
}

impl fmt::Display for FlagCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error() {
            Some(err) => fmt::Display::fmt(err, f),
            None => f.write_str(&self.result.reason),
        }
    }
}

impl std::error::Error for FlagCheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.error() {
            Some(err) => Some(err),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RulesEngineError::FlagNotFound, "flag_not_found", 404)]
    #[case(
        RulesEngineError::MissingMetricValue("cond_1".to_string()),
        "missing_metric_value",
        500
    )]
    #[case(RulesEngineError::InputTooLarge { limit: 10 }, "input_too_large", 413)]
    #[case(RulesEngineError::Unexpected("boom".to_string()), "unexpected_error", 500)]
    fn test_error_metadata(
        #[case] error: RulesEngineError,
        #[case] code: &str,
        #[case] status: u16,
    ) {
        assert_eq!(error.error_code(), code);
        assert_eq!(error.status_code(), status);
    }

    #[test]
    fn test_parsing_errors_are_client_errors() {
        let error: RulesEngineError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();

        assert_eq!(error.error_code(), "input_parsing_error");
        assert!(!error.is_5xx());
    }

    #[test]
    fn test_flag_check_error_keeps_result() {
        let result = CheckFlagResult {
            reason: "Server error; rule evaluation failed".to_string(),
            ..Default::default()
        };
        let error = FlagCheckError::new(
            result,
            RulesEngineError::MissingMetricValue("cond_1".to_string()),
        );

        assert_eq!(
            error.to_string(),
            "expected metric value for condition cond_1, but received none"
        );
        assert!(std::error::Error::source(&error).is_some());

        assert!(matches!(
            error.result().err,
            Some(RulesEngineError::MissingMetricValue(_))
        ));

        let (result, source) = error.into_parts();
        assert_eq!(result.reason, "Server error; rule evaluation failed");
        assert!(result.err.is_none());
        assert!(matches!(source, RulesEngineError::MissingMetricValue(_)));
    }
}
