use thiserror::Error;

/// Top-level error type for the Courier system.
///
/// Subsystem crates define their own error types and convert into
/// `CourierError` at the composition root so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CourierError {
    fn from(err: toml::de::Error) -> Self {
        CourierError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CourierError {
    fn from(err: toml::ser::Error) -> Self {
        CourierError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        CourierError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Courier operations.
pub type Result<T> = std::result::Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CourierError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = CourierError::Backend("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Backend error: quota exceeded");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CourierError = io_err.into();
        assert!(matches!(err, CourierError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: CourierError = parsed.unwrap_err().into();
        assert!(matches!(err, CourierError::Config(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parsed: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{ not json }");
        let err: CourierError = parsed.unwrap_err().into();
        assert!(matches!(err, CourierError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}
