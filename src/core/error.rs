//! Typed error handling for the ledger core
//!
//! Every fallible operation returns a [`LedgerError`] so callers can match on
//! the failure kind instead of unpacking a generic `anyhow::Error`. The
//! taxonomy follows the request lifecycle: validation failures are raised
//! before any side effect, conflict failures (`DuplicatePeriod`,
//! `Overpayment`) before or instead of the atomic mutation, and storage
//! failures whenever the underlying store cannot complete an atomic step.
//!
//! Only `Storage(Unavailable)` is worth retrying by the caller; everything
//! else needs corrected input.

use crate::core::invoice::Domain;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// The main error type for ledger operations.
#[derive(Debug)]
pub enum LedgerError {
    /// Malformed input, rejected before any mutation
    Validation(ValidationError),

    /// Missing invoice, payment, or report
    NotFound { entity: &'static str, id: String },

    /// Second rent/utility invoice for the same (property, month)
    DuplicatePeriod {
        property_id: String,
        month: String,
        domain: Domain,
    },

    /// Payment that would push an invoice's paid total above its due amount
    Overpayment {
        invoice_id: Uuid,
        attempted: Decimal,
        amount_due: Decimal,
        amount_paid: Decimal,
    },

    /// Export format outside the supported set
    UnsupportedFormat { format: String },

    /// The underlying store failed or could not complete an atomic step
    Storage(StorageError),

    /// Internal errors that should not happen in normal operation
    Internal(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Validation(e) => write!(f, "{}", e),
            LedgerError::NotFound { entity, id } => {
                write!(f, "{} with id '{}' not found", entity, id)
            }
            LedgerError::DuplicatePeriod {
                property_id,
                month,
                domain,
            } => write!(
                f,
                "a {} invoice already exists for property '{}' in {}",
                domain, property_id, month
            ),
            LedgerError::Overpayment {
                invoice_id,
                attempted,
                amount_due,
                amount_paid,
            } => write!(
                f,
                "payment of {} would overpay invoice '{}' ({} already paid of {} due)",
                attempted, invoice_id, amount_paid, amount_due
            ),
            LedgerError::UnsupportedFormat { format } => {
                write!(f, "unsupported export format: '{}'", format)
            }
            LedgerError::Storage(e) => write!(f, "{}", e),
            LedgerError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Validation(e) => Some(e),
            LedgerError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// Error response body for HTTP surfaces.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LedgerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::DuplicatePeriod { .. } => StatusCode::CONFLICT,
            LedgerError::Overpayment { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::UnsupportedFormat { .. } => StatusCode::BAD_REQUEST,
            LedgerError::Storage(StorageError::Unavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::DuplicatePeriod { .. } => "DUPLICATE_PERIOD",
            LedgerError::Overpayment { .. } => "OVERPAYMENT",
            LedgerError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            LedgerError::Storage(StorageError::Unavailable { .. }) => "STORAGE_UNAVAILABLE",
            LedgerError::Storage(_) => "STORAGE_ERROR",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            LedgerError::NotFound { entity, id } => Some(serde_json::json!({
                "entity": entity,
                "id": id,
            })),
            LedgerError::DuplicatePeriod {
                property_id,
                month,
                domain,
            } => Some(serde_json::json!({
                "property_id": property_id,
                "month": month,
                "domain": domain.as_str(),
            })),
            LedgerError::Overpayment {
                invoice_id,
                attempted,
                amount_due,
                amount_paid,
            } => Some(serde_json::json!({
                "invoice_id": invoice_id.to_string(),
                "attempted": attempted.to_string(),
                "amount_due": amount_due.to_string(),
                "amount_paid": amount_paid.to_string(),
            })),
            LedgerError::Validation(ValidationError::Field { field, .. })
            | LedgerError::Validation(ValidationError::UnknownValue { field, .. }) => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Validation errors
// =============================================================================

/// Errors raised by the explicit validation functions before any side effect.
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// A field failed a constraint
    Field { field: String, message: String },

    /// A field carried a value outside its enum's recognized set
    UnknownValue { field: String, value: String },
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ValidationError::Field {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn unknown_value(field: &str, value: &str) -> Self {
        ValidationError::UnknownValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Field { field, message } => {
                write!(f, "invalid '{}': {}", field, message)
            }
            ValidationError::UnknownValue { field, value } => {
                write!(f, "unrecognized {} '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Validation(err)
    }
}

// =============================================================================
// Storage errors
// =============================================================================

/// Failures surfaced by a [`LedgerStorage`](crate::storage::LedgerStorage)
/// backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// The store cannot be reached or an atomic step timed out
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },

    /// A unique index rejected the write
    #[error("unique constraint '{constraint}' violated")]
    UniqueViolation { constraint: &'static str },

    /// A compare-and-set saw a newer version than the caller read
    #[error("version conflict on {entity} '{id}'")]
    VersionConflict { entity: &'static str, id: Uuid },
}

impl StorageError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StorageError::Unavailable {
            reason: reason.into(),
        }
    }
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        LedgerError::Storage(err)
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
