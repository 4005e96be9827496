use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    /// The backend answered with an explicit error object.
    #[error("backend error {code}: {message}")]
    Backend { code: String, message: String },
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Other(String),
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Other(value)
    }
}

impl From<&str> for AppError {
    fn from(value: &str) -> Self {
        AppError::Other(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_carries_code_and_message() {
        let err = AppError::Backend {
            code: "401".into(),
            message: "API key not valid".into(),
        };
        assert_eq!(err.to_string(), "backend error 401: API key not valid");
    }

    #[test]
    fn plain_strings_become_other() {
        let err: AppError = "boom".into();
        assert!(matches!(err, AppError::Other(ref s) if s == "boom"));
    }
}
