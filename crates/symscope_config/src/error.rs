//! Error types for layout loading and validation.

/// Errors that can occur when loading or validating a `symscope.toml` layout.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the layout file.
    #[error("failed to read layout: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse layout: {0}")]
    ParseError(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A scope names a parent that is not declared before it.
    #[error("unknown parent scope '{parent}' for scope '{scope}'")]
    UnknownScope {
        /// The scope whose `parent` is dangling.
        scope: String,
        /// The parent qualified name that did not resolve.
        parent: String,
    },

    /// A layout value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("model.instance".to_string());
        assert_eq!(format!("{err}"), "missing required field: model.instance");
    }

    #[test]
    fn display_unknown_scope() {
        let err = ConfigError::UnknownScope {
            scope: "distortion".to_string(),
            parent: "core".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "unknown parent scope 'core' for scope 'distortion'"
        );
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse layout: expected '=' at line 3"
        );
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("bad timescale '3ns'".to_string());
        assert_eq!(format!("{err}"), "validation error: bad timescale '3ns'");
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("failed to read layout:"));
    }
}
