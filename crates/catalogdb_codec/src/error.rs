//! Error types for the codec crate.

use crate::product::Field;
use std::fmt;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while decoding a stored record line.
///
/// Every variant carries the 1-based line number the record starts on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A field failed to parse or violated a field rule.
    #[error("line {line}: invalid {field}: {message}")]
    InvalidField {
        /// Line the record starts on.
        line: usize,
        /// The failing field.
        field: Field,
        /// What was wrong with it.
        message: String,
    },

    /// The record did not split into the expected number of fields.
    #[error("line {line}: expected {expected} fields, found {actual}")]
    FieldCount {
        /// Line the record starts on.
        line: usize,
        /// Required field count.
        expected: usize,
        /// Fields actually found.
        actual: usize,
    },

    /// A quoted span was still open at the end of the record.
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote {
        /// Line the record starts on.
        line: usize,
    },

    /// The record is not valid UTF-8.
    #[error("line {line}: not valid UTF-8")]
    NotText {
        /// Line the record starts on.
        line: usize,
    },
}

impl CodecError {
    /// Creates an invalid field error.
    pub fn invalid_field(line: usize, field: Field, message: impl Into<String>) -> Self {
        Self::InvalidField {
            line,
            field,
            message: message.into(),
        }
    }

    /// Returns the line the failing record starts on.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::InvalidField { line, .. }
            | Self::FieldCount { line, .. }
            | Self::UnterminatedQuote { line }
            | Self::NotText { line } => *line,
        }
    }

    /// Returns the failing field, if the error is about a single field.
    #[must_use]
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::InvalidField { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Errors from parsing a [`Price`](crate::Price).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// The text was empty.
    #[error("price is empty")]
    Empty,
    /// The value was below zero.
    #[error("price must not be negative")]
    Negative,
    /// More than two digits after the decimal point.
    #[error("price must have at most 2 decimal places")]
    TooManyDecimals,
    /// Not a decimal number.
    #[error("price is not a decimal number")]
    Invalid,
    /// Too large to represent.
    #[error("price is too large")]
    Overflow,
}

/// One broken rule on one field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The field the rule applies to.
    pub field: Field,
    /// Human readable description.
    pub message: String,
}

impl Violation {
    /// Creates a violation.
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for Violation {}
