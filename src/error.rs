use std::fmt;

/// Error returned when a wrapper is misconfigured at instrumentation
/// setup.
///
/// Misconfiguration fails fast at wrap time, before any wrapped call
/// executes, so a bad kind or argument selection cannot silently disable
/// detection at runtime. Violations detected at sinks are deliberately
/// not errors; they are policy decisions handled by the sink itself.
///
/// # Examples
///
/// ```
/// use taintflow::{ConfigError, ConfigErrorKind};
///
/// let error = ConfigError::new(ConfigErrorKind::UnknownKind, "kind index 9 not registered");
/// assert_eq!(error.kind(), ConfigErrorKind::UnknownKind);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "instrumentation config error ({}): {}",
            self.kind, self.message
        )
    }
}

impl std::error::Error for ConfigError {}

/// Kind of configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A vulnerability kind that is not in the registry.
    UnknownKind,
    /// The same positional index was listed twice.
    DuplicatePosition,
    /// The same keyword name was listed twice.
    DuplicateKeyword,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind => write!(f, "unknown vulnerability kind"),
            Self::DuplicatePosition => write!(f, "duplicate positional index"),
            Self::DuplicateKeyword => write!(f, "duplicate keyword name"),
        }
    }
}
