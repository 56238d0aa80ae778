//! Error types for the pw-core crate.
//!
//! This module provides the [`ConfigError`] type for configuration loading and
//! option parsing failures.

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use pw_core::ConfigError;
///
/// let error = ConfigError::InvalidOption {
///     option: "encoding".to_owned(),
///     reason: "unknown encoding 'ucs9'".to_owned(),
/// };
/// assert!(error.to_string().contains("encoding"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_display() {
        let error = ConfigError::InvalidOption {
            option: "encoding".to_owned(),
            reason: "unknown encoding 'ucs9'".to_owned(),
        };
        insta::assert_snapshot!(
            error,
            @"invalid configuration option 'encoding': unknown encoding 'ucs9'"
        );
    }

    #[test]
    fn test_parse_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = ConfigError::from(source);
        assert!(error.to_string().starts_with("failed to parse configuration"));
    }

    #[test]
    fn test_io_error_display() {
        let error = ConfigError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert!(error.to_string().contains("missing"));
    }
}
