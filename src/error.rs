use thiserror::Error;

/// Failures of a single evaluation attempt.
///
/// None of these invalidate the session: the score log is only appended to
/// after a fully parsed result.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Enter a prompt first")]
    EmptyInput,

    #[error("Evaluation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Malformed evaluation response: {0}")]
    MalformedResponse(String),

    #[error("Unknown scenario: {0}")]
    NotFound(String),
}

impl EvalError {
    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::EmptyInput => "empty_input",
            EvalError::ServiceUnavailable(_) => "service_unavailable",
            EvalError::MalformedResponse(_) => "malformed_response",
            EvalError::NotFound(_) => "not_found",
        }
    }
}
