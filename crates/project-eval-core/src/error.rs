use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectEvalError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ProjectEvalError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ProjectEvalError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ProjectEvalError {
    fn from(e: serde_json::Error) -> Self {
        ProjectEvalError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::ProjectInputs;

    #[test]
    fn test_parse_failure_becomes_serialization_error() {
        let err: ProjectEvalError = serde_json::from_str::<ProjectInputs>(r#"{ "basic": "#)
            .unwrap_err()
            .into();
        assert!(matches!(err, ProjectEvalError::SerializationError(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }
}
