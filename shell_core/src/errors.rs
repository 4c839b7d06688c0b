//! # Error Types
//!
//! Structured error types for shell_core. Every failure is a deterministic
//! defect in the input (a bad field, a dangling material id, an impossible
//! ply index), so nothing here is retried. Each variant carries enough
//! context (card, pid, field, ply) to locate the offending entry.
//!
//! ## Example
//!
//! ```rust
//! use shell_core::errors::{PropertyError, PropResult};
//!
//! fn check_thickness(pid: i64, t: f64) -> PropResult<()> {
//!     if t <= 0.0 {
//!         return Err(PropertyError::validation_failed(pid, "t", "thickness must be positive"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_thickness(1, 0.1).is_ok());
//! assert_eq!(check_thickness(1, 0.0).unwrap_err().error_code(), "VALIDATION_FAILED");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for shell_core operations
pub type PropResult<T> = Result<T, PropertyError>;

/// Structured error type for card parsing, derived quantities and cross-referencing.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PropertyError {
    /// A required field is blank or past the end of the card
    #[error("Missing required field '{field}' (field {index}) on {card}")]
    MissingRequiredField {
        card: String,
        field: String,
        index: usize,
    },

    /// A field holds a token of the wrong primitive type
    #[error("Invalid type for '{field}' (field {index}): expected {expected}, found {found}")]
    InvalidFieldType {
        field: String,
        index: usize,
        expected: String,
        found: String,
    },

    /// A token field holds a value outside its allowed set
    #[error("Invalid value for '{field}': {value} (allowed: {allowed:?})")]
    InvalidEnumValue {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    /// A laminate ply resolved to a non-positive thickness
    #[error("Invalid ply thickness on {card} pid={pid} ply={ply}: t={thickness}")]
    InvalidPlyThickness {
        card: String,
        pid: i64,
        ply: usize,
        thickness: f64,
    },

    /// A ply index outside the effective ply range
    #[error("Ply index {index} is out of range (effective plies: {nplies})")]
    PlyIndexOutOfRange { index: usize, nplies: usize },

    /// Unknown non-structural mass smearing method
    #[error("Unsupported smear method: '{method}'")]
    UnsupportedSmearMethod { method: String },

    /// A material or coordinate system id could not be resolved
    #[error("Unresolved {kind} reference {id} required by {required_by}")]
    UnresolvedReference {
        kind: String,
        id: i64,
        required_by: String,
    },

    /// A field position that does not map to any declared slot
    #[error("Field {index} is not a valid {card} entry: {reason}")]
    FieldCountMismatch {
        card: String,
        index: usize,
        reason: String,
    },

    /// A record failed verification
    #[error("Validation failed for pid={pid} field '{field}': {reason}")]
    ValidationFailed {
        pid: i64,
        field: String,
        reason: String,
    },

    /// Malformed binary tuple or ply-density input
    #[error("Invalid {card} data: {reason}")]
    InvalidData { card: String, reason: String },

    /// The operation has no meaning for this card type
    #[error("{operation} is not supported by {card}")]
    UnsupportedOperation { card: String, operation: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl PropertyError {
    /// Create a MissingRequiredField error
    pub fn missing_field(card: impl Into<String>, field: impl Into<String>, index: usize) -> Self {
        PropertyError::MissingRequiredField {
            card: card.into(),
            field: field.into(),
            index,
        }
    }

    /// Create an InvalidFieldType error
    pub fn invalid_type(
        field: impl Into<String>,
        index: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        PropertyError::InvalidFieldType {
            field: field.into(),
            index,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an InvalidEnumValue error
    pub fn invalid_enum(field: impl Into<String>, value: impl Into<String>, allowed: &[&str]) -> Self {
        PropertyError::InvalidEnumValue {
            field: field.into(),
            value: value.into(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create an UnresolvedReference error
    pub fn unresolved(kind: impl Into<String>, id: i64, required_by: impl Into<String>) -> Self {
        PropertyError::UnresolvedReference {
            kind: kind.into(),
            id,
            required_by: required_by.into(),
        }
    }

    /// Create a FieldCountMismatch error
    pub fn field_mismatch(card: impl Into<String>, index: usize, reason: impl Into<String>) -> Self {
        PropertyError::FieldCountMismatch {
            card: card.into(),
            index,
            reason: reason.into(),
        }
    }

    /// Create a ValidationFailed error
    pub fn validation_failed(pid: i64, field: impl Into<String>, reason: impl Into<String>) -> Self {
        PropertyError::ValidationFailed {
            pid,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidData error
    pub fn invalid_data(card: impl Into<String>, reason: impl Into<String>) -> Self {
        PropertyError::InvalidData {
            card: card.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedOperation error
    pub fn unsupported(card: impl Into<String>, operation: impl Into<String>) -> Self {
        PropertyError::UnsupportedOperation {
            card: card.into(),
            operation: operation.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PropertyError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            PropertyError::InvalidFieldType { .. } => "INVALID_FIELD_TYPE",
            PropertyError::InvalidEnumValue { .. } => "INVALID_ENUM_VALUE",
            PropertyError::InvalidPlyThickness { .. } => "INVALID_PLY_THICKNESS",
            PropertyError::PlyIndexOutOfRange { .. } => "PLY_INDEX_OUT_OF_RANGE",
            PropertyError::UnsupportedSmearMethod { .. } => "UNSUPPORTED_SMEAR_METHOD",
            PropertyError::UnresolvedReference { .. } => "UNRESOLVED_REFERENCE",
            PropertyError::FieldCountMismatch { .. } => "FIELD_COUNT_MISMATCH",
            PropertyError::ValidationFailed { .. } => "VALIDATION_FAILED",
            PropertyError::InvalidData { .. } => "INVALID_DATA",
            PropertyError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            PropertyError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }

    /// Errors raised while building a record; no partial record survives them
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            PropertyError::MissingRequiredField { .. }
                | PropertyError::InvalidFieldType { .. }
                | PropertyError::InvalidEnumValue { .. }
                | PropertyError::InvalidPlyThickness { .. }
                | PropertyError::InvalidData { .. }
        )
    }
}

impl From<serde_json::Error> for PropertyError {
    fn from(err: serde_json::Error) -> Self {
        PropertyError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = PropertyError::unresolved("material", 300704, "PCOMP pid=701512 iply=0");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"UnresolvedReference\""));
        let roundtrip: PropertyError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PropertyError::missing_field("PSHEAR", "t", 3).error_code(), "MISSING_REQUIRED_FIELD");
        assert_eq!(
            PropertyError::UnsupportedSmearMethod { method: "mass".into() }.error_code(),
            "UNSUPPORTED_SMEAR_METHOD"
        );
    }

    #[test]
    fn test_display_names_context() {
        let err = PropertyError::InvalidPlyThickness {
            card: "PCOMP".into(),
            pid: 7,
            ply: 2,
            thickness: -0.1,
        };
        let msg = err.to_string();
        assert!(msg.contains("pid=7"));
        assert!(msg.contains("ply=2"));
        assert!(err.is_construction_error());
        assert!(!PropertyError::PlyIndexOutOfRange { index: 4, nplies: 2 }.is_construction_error());
    }

    #[test]
    fn test_from_serde_json() {
        let err: PropertyError = serde_json::from_str::<Vec<i64>>("[1,").unwrap_err().into();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
