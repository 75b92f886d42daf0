//! Engine error taxonomy.
//!
//! Every fallible engine operation returns [`CareResult`]. Expected domain outcomes (missing
//! fields, blocked restraints, locked history) are values of [`CareError`], never panics.
//! [`CareError::kind`] projects an error onto the caller-facing [`ErrorKind`] taxonomy and
//! [`CareError::details`] exposes the optional structured payload callers log or display.

use crate::store::StoreError;
use careguard_uuid::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Caller-facing error kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationRequiredField,
    ValidationInvalidFormat,
    ValidationBedElevation,
    BusinessJustificationRequired,
    BusinessChemicalRestraintBlocked,
    BusinessHistoricalRecordImmutable,
    SystemStorageFailure,
    SystemExportFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationRequiredField => "VALIDATION_REQUIRED_FIELD",
            ErrorKind::ValidationInvalidFormat => "VALIDATION_INVALID_FORMAT",
            ErrorKind::ValidationBedElevation => "VALIDATION_BED_ELEVATION",
            ErrorKind::BusinessJustificationRequired => "BUSINESS_JUSTIFICATION_REQUIRED",
            ErrorKind::BusinessChemicalRestraintBlocked => "BUSINESS_CHEMICAL_RESTRAINT_BLOCKED",
            ErrorKind::BusinessHistoricalRecordImmutable => {
                "BUSINESS_HISTORICAL_RECORD_IMMUTABLE"
            }
            ErrorKind::SystemStorageFailure => "SYSTEM_STORAGE_FAILURE",
            ErrorKind::SystemExportFailed => "SYSTEM_EXPORT_FAILED",
        }
    }

    /// True for the kinds a caller can fix by re-presenting a corrected record.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorKind::ValidationRequiredField
                | ErrorKind::ValidationInvalidFormat
                | ErrorKind::ValidationBedElevation
        )
    }

    pub fn is_system(&self) -> bool {
        matches!(
            self,
            ErrorKind::SystemStorageFailure | ErrorKind::SystemExportFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CareError {
    /// A validation or business rule rejected the input.
    #[error("{message}")]
    Rule { kind: ErrorKind, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: RecordId },

    #[error("care event {id} was created at {created_at} and can no longer be edited or deleted")]
    HistoricalRecordImmutable {
        id: RecordId,
        created_at: DateTime<Utc>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("export failed: {0}")]
    Export(#[source] serde_json::Error),
}

impl CareError {
    pub fn rule(kind: ErrorKind, message: impl Into<String>) -> Self {
        CareError::Rule {
            kind,
            message: message.into(),
        }
    }

    pub fn required_field(message: impl Into<String>) -> Self {
        Self::rule(ErrorKind::ValidationRequiredField, message)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::rule(ErrorKind::ValidationInvalidFormat, message)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CareError::Rule { kind, .. } => *kind,
            // A missing record is reported as a missing required reference.
            CareError::NotFound { .. } => ErrorKind::ValidationRequiredField,
            CareError::HistoricalRecordImmutable { .. } => {
                ErrorKind::BusinessHistoricalRecordImmutable
            }
            CareError::InvalidConfig(_) => ErrorKind::ValidationInvalidFormat,
            CareError::Storage(_) => ErrorKind::SystemStorageFailure,
            CareError::Export(_) => ErrorKind::SystemExportFailed,
        }
    }

    /// Structured context for logging or display, when the error carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CareError::Rule { .. } | CareError::InvalidConfig(_) => None,
            CareError::NotFound { entity, id } => Some(json!({
                "entity": entity,
                "id": id.to_string(),
            })),
            CareError::HistoricalRecordImmutable { id, created_at } => Some(json!({
                "id": id.to_string(),
                "createdAt": crate::history::iso_timestamp(created_at),
            })),
            CareError::Storage(source) => Some(json!({
                "collection": source.collection(),
                "cause": source.to_string(),
            })),
            CareError::Export(source) => Some(json!({
                "cause": source.to_string(),
            })),
        }
    }
}

pub type CareResult<T> = std::result::Result<T, CareError>;
