//! Resolution errors

use std::fmt;
use thiserror::Error;

/// Allowed interval for a numeric setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Strictly greater than zero
    Positive,
    /// (0, 1]
    UnitInterval,
    /// (0, 1)
    OpenUnitInterval,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Positive => write!(f, "(0, +inf)"),
            Bound::UnitInterval => write!(f, "(0, 1]"),
            Bound::OpenUnitInterval => write!(f, "(0, 1)"),
        }
    }
}

/// Discriminant of a [`ConfigError`], handy for assertions and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    InvalidEnum,
    InvalidType,
    OutOfRange,
    MissingRequired,
    InconsistentFields,
}

/// A single violated rule found while resolving settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Value is not one of the accepted variants
    #[error("{field} ({variable}): '{value}' is not one of [{}]", .allowed.join(", "))]
    InvalidEnum {
        field: String,
        variable: String,
        value: String,
        allowed: Vec<&'static str>,
    },
    /// Value could not be parsed into the expected type
    #[error("{field} ({variable}): '{value}' is not a valid {expected}")]
    InvalidType {
        field: String,
        variable: String,
        value: String,
        expected: &'static str,
    },
    /// Value parsed but lies outside its allowed interval
    #[error("{field} ({variable}): {value} is outside {bound}")]
    OutOfRange {
        field: String,
        variable: String,
        value: String,
        bound: Bound,
    },
    /// A required value resolved to nothing
    #[error("{field} ({variable}): at least one value is required")]
    MissingRequired { field: String, variable: String },
    /// Individually valid fields that contradict each other
    #[error("{}: {reason}", .fields.join(" / "))]
    InconsistentFields { fields: Vec<String>, reason: String },
}

impl ConfigError {
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            ConfigError::InvalidEnum { .. } => ConfigErrorKind::InvalidEnum,
            ConfigError::InvalidType { .. } => ConfigErrorKind::InvalidType,
            ConfigError::OutOfRange { .. } => ConfigErrorKind::OutOfRange,
            ConfigError::MissingRequired { .. } => ConfigErrorKind::MissingRequired,
            ConfigError::InconsistentFields { .. } => ConfigErrorKind::InconsistentFields,
        }
    }

    /// Settings field the error refers to (first one for cross-field errors)
    pub fn field(&self) -> &str {
        match self {
            ConfigError::InvalidEnum { field, .. }
            | ConfigError::InvalidType { field, .. }
            | ConfigError::OutOfRange { field, .. }
            | ConfigError::MissingRequired { field, .. } => field,
            ConfigError::InconsistentFields { fields, .. } => {
                fields.first().map(String::as_str).unwrap_or_default()
            }
        }
    }
}

/// Every violation found during one resolution attempt
///
/// Never empty: a resolution either yields complete settings or at least
/// one error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErrors {
    errors: Vec<ConfigError>,
}

impl ConfigErrors {
    pub(crate) fn new(errors: Vec<ConfigError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any collected error has the given kind
    pub fn has_kind(&self, kind: ConfigErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    /// First error recorded for a settings field
    pub fn for_field(&self, field: &str) -> Option<&ConfigError> {
        self.errors.iter().find(|e| e.field() == field)
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration ({} error", self.errors.len())?;
        if self.errors.len() != 1 {
            write!(f, "s")?;
        }
        write!(f, ")")?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
