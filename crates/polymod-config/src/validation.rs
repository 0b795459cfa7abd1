//! Routing validation.
//!
//! Every route is checked against the matrix it targets: the row must
//! exist and appear once, ids must resolve, and amounts must be finite.
//! All problems in a description are collected so a single pass reports
//! everything wrong with a file.
//!
//! Finite amounts outside their nominal range are not errors; they are
//! clamped (with a warning) by [`clamp_depth`] and [`clamp_scale`].

use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Row index outside the target matrix.
    #[error("row {row} out of range (matrix has {rows} rows)")]
    RowOutOfRange {
        /// Requested row.
        row: usize,
        /// Rows available in the target matrix.
        rows: usize,
    },

    /// The same row appears in more than one route.
    #[error("row {row} is configured more than once")]
    DuplicateRow {
        /// Repeated row.
        row: usize,
    },

    /// Source or scale id that does not name a known source.
    #[error("row {row}: unknown {field} '{id}'")]
    UnknownSource {
        /// Row of the route.
        row: usize,
        /// Field holding the id (`source` or `scale`).
        field: &'static str,
        /// The id as written.
        id: String,
    },

    /// Destination id that does not name a known destination.
    #[error("row {row}: unknown {field} '{id}'")]
    UnknownDestination {
        /// Row of the route.
        row: usize,
        /// Field holding the id (`destination_1` or `destination_2`).
        field: &'static str,
        /// The id as written.
        id: String,
    },

    /// Amount that is NaN or infinite.
    #[error("row {row}: {field} must be finite, got {value}")]
    NonFinite {
        /// Row of the route.
        row: usize,
        /// Amount field.
        field: &'static str,
        /// The offending value.
        value: f32,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", join_errors(.0))]
    Multiple(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Collapse a list of errors: `Ok` if empty, the error itself if alone,
    /// [`ValidationError::Multiple`] otherwise.
    pub fn from_list(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check that an amount is finite.
pub fn validate_finite(row: usize, field: &'static str, value: f32) -> ValidationResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFinite { row, field, value })
    }
}

/// Clamp a depth into [-1, 1], warning when it had to move.
pub fn clamp_depth(row: usize, field: &'static str, value: f32) -> f32 {
    clamp_with_warning(row, field, value, -1.0, 1.0)
}

/// Clamp a scale depth into [0, 1], warning when it had to move.
pub fn clamp_scale(row: usize, field: &'static str, value: f32) -> f32 {
    clamp_with_warning(row, field, value, 0.0, 1.0)
}

fn clamp_with_warning(row: usize, field: &'static str, value: f32, min: f32, max: f32) -> f32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        tracing::warn!(row, field, value, clamped, "amount outside [{min}, {max}], clamped");
    }
    clamped
}
