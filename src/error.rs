use std::fmt;

/// Application error types
#[derive(Debug)]
pub enum AllocError {
    /// Malformed allocator configuration
    ConfigError(String),
    /// Invalid request data
    ValidationError(String),
    /// Internal error
    InternalError(String),
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AllocError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AllocError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AllocError {}

#[cfg(feature = "api")]
mod http {
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};

    use super::AllocError;
    use crate::models::ErrorResponse;

    impl ResponseError for AllocError {
        fn status_code(&self) -> StatusCode {
            match self {
                AllocError::ValidationError(_) => StatusCode::BAD_REQUEST,
                AllocError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AllocError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }

        fn error_response(&self) -> HttpResponse {
            let (error_code, message) = match self {
                AllocError::ConfigError(msg) => ("config_error", msg.clone()),
                AllocError::ValidationError(msg) => ("validation_error", msg.clone()),
                AllocError::InternalError(msg) => ("internal_error", msg.clone()),
            };

            HttpResponse::build(self.status_code()).json(ErrorResponse {
                error: error_code.to_string(),
                message,
            })
        }
    }
}

/// Validation functions
pub fn validate_probability(id: &str, prob: f64) -> Result<(), AllocError> {
    if !(0.0..=1.0).contains(&prob) {
        return Err(AllocError::ValidationError(format!(
            "Probability for candidate {} must be between 0 and 1, got {}",
            id, prob
        )));
    }
    Ok(())
}

pub fn validate_odds(id: &str, odds: f64) -> Result<(), AllocError> {
    if !odds.is_finite() || odds < 0.0 {
        return Err(AllocError::ValidationError(format!(
            "Odds for candidate {} must be non-negative, got {}",
            id, odds
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_probability_valid() {
        assert!(validate_probability("1", 0.0).is_ok());
        assert!(validate_probability("1", 0.5).is_ok());
        assert!(validate_probability("1", 1.0).is_ok());
    }

    #[test]
    fn test_validate_probability_invalid() {
        assert!(validate_probability("1", -0.1).is_err());
        assert!(validate_probability("1", 1.1).is_err());
        assert!(validate_probability("1", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_odds_valid() {
        assert!(validate_odds("3", 0.0).is_ok());
        assert!(validate_odds("3", 5.5).is_ok());
        assert!(validate_odds("3", 100.0).is_ok());
    }

    #[test]
    fn test_validate_odds_invalid() {
        assert!(validate_odds("3", -1.0).is_err());
        assert!(validate_odds("3", f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = AllocError::ValidationError("test error".to_string());
        assert!(err.to_string().contains("Validation error"));

        let err = AllocError::ConfigError("bad unit".to_string());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_validation_error_names_candidate() {
        let err = validate_odds("7", -2.0).unwrap_err();
        assert!(err.to_string().contains("candidate 7"));
    }
}
