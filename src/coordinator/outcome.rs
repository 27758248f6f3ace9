use std::fmt::Display;

use serde::Serialize;

/// Outcome of a single analysis step.
///
/// Serializes as the step result with `"status": "success"`, or as
/// `{"status": "error", "error_message": …}`.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success(T),
    Error { error_message: String },
}

impl<T> Outcome<T> {
    pub fn error(error: impl Display) -> Self {
        Self::Error { error_message: error.to_string() }
    }

    #[must_use]
    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Error { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T, E: Display> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::error(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{error::ValidationError, quantity::energy::KilowattHours};

    #[derive(Serialize)]
    struct Total {
        total: KilowattHours,
    }

    #[test]
    fn test_serialize_success() {
        let outcome = Outcome::Success(Total { total: KilowattHours(1.5) });
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": "success", "total": 1.5}),
        );
    }

    #[test]
    fn test_serialize_error() {
        let outcome: Outcome<Total> = Err(ValidationError::EmptyReadings).into();
        assert!(!outcome.is_success());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": "error", "error_message": "consumption readings must not be empty"}),
        );
    }
}
