//! CLI errors and their exit codes

use bouncer_core::StatusCode;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The call itself failed
    #[error("{0}")]
    Call(#[from] bouncer_core::Error),

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("{} is not valid {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Flags that cannot be used together or with this call
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// An error with a note on what was being done
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// The error under any added context
    pub fn root(&self) -> &Error {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Process exit code
    ///
    /// A failed call exits with 20 plus its status class, so scripts can
    /// tell an invalid request from a missing call.
    pub fn exit_code(&self) -> i32 {
        match self.root() {
            Self::Call(err) => {
                20 + match err.code() {
                    StatusCode::InvalidArgument => 0,
                    StatusCode::OutOfRange => 1,
                    StatusCode::DataLoss => 2,
                    StatusCode::Unimplemented => 3,
                    StatusCode::Internal => 4,
                }
            }
            Self::Io(_) => 1,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::TomlDe(_) | Self::TomlSer(_) => 14,
            Self::Logging(_) => 15,
            Self::Context { .. } => 99,
        }
    }

    pub fn should_show_help(&self) -> bool {
        matches!(self.root(), Self::InvalidArgs(_))
    }
}

/// Attach a description of the failed step to an error
pub trait ErrorContext<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::Context {
            context: f(),
            source: Box::new(e.into()),
        })
    }
}

/// One line for stderr; failed calls carry their status name
pub fn format_error(error: &Error, color: bool) -> String {
    use colored::Colorize;

    let label = match error.root() {
        Error::Call(err) => format!("Error [{}]:", err.code()),
        _ => "Error:".to_string(),
    };

    if color {
        format!("{} {}", label.red().bold(), error)
    } else {
        format!("{} {}", label, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_errors_map_to_status_exit_codes() {
        let err = Error::from(bouncer_core::Error::DataLoss {
            message: "no metadata".to_string(),
        });
        assert_eq!(err.exit_code(), 22);
        assert_eq!(
            format_error(&err, false),
            "Error [DATA_LOSS]: Data loss: no metadata"
        );

        let err = Error::from(bouncer_core::Error::UnknownMethod {
            method: "Nope".to_string(),
        });
        assert_eq!(err.exit_code(), 23);
    }

    #[test]
    fn test_context_keeps_the_root_error() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::Other, "boom"));
        let err = result.with_context(|| "reading request".to_string()).unwrap_err();

        assert_eq!(err.to_string(), "reading request: IO error: boom");
        assert_eq!(err.exit_code(), 1);
        assert!(matches!(err.root(), Error::Io(_)));

        let nested: Result<()> = Err(Error::invalid_args("x"));
        let nested = nested.with_context(|| "call".to_string()).unwrap_err();
        assert!(nested.should_show_help());
        assert_eq!(nested.exit_code(), 6);
    }
}
