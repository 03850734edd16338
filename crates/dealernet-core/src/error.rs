//! # Error Types
//!
//! Domain-specific error types for dealernet-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dealernet-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  dealernet-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  dashboard-api errors (in app)                                         │
//! │  └── ApiError         - What callers see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Missing join references are NOT errors: the join layer filters them out.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Vehicle cannot be found by VIN.
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    /// User cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Dealership cannot be found.
    #[error("Dealership not found: {0}")]
    DealershipNotFound(String),

    /// Transfer request cannot be found.
    #[error("Transfer request not found: {0}")]
    TransferNotFound(String),

    /// The vehicle is not in a status that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Selling a vehicle that is not in stock
    /// - Assigning a vehicle that already left the factory
    /// - Accepting delivery of a vehicle that is not on its way
    #[error("Vehicle {vin} is {status}, cannot {action}")]
    InvalidVehicleStatus {
        vin: String,
        status: String,
        action: String,
    },

    /// The caller lacks the role or ownership required for the action.
    #[error("User {user_id} is not allowed to {action}")]
    NotAuthorized { user_id: String, action: String },

    /// The transfer request was already decided.
    ///
    /// ## User Workflow
    /// ```text
    /// Admin A approves ──► status: approved
    /// Admin B approves ──► TransferAlreadyProcessed { status: "approved" }
    /// ```
    #[error("Transfer request {transfer_id} is already {status}")]
    TransferAlreadyProcessed { transfer_id: String, status: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The CSV export could not be encoded.
    #[error("Report encoding failed: {0}")]
    Export(String),
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Export(err.to_string())
    }
}

impl CoreError {
    /// Creates a NotAuthorized error.
    pub fn not_authorized(user_id: impl Into<String>, action: impl Into<String>) -> Self {
        CoreError::NotAuthorized {
            user_id: user_id.into(),
            action: action.into(),
        }
    }

    /// Creates an InvalidVehicleStatus error.
    pub fn invalid_vehicle_status(
        vin: impl Into<String>,
        status: impl ToString,
        action: impl Into<String>,
    ) -> Self {
        CoreError::InvalidVehicleStatus {
            vin: vin.into(),
            status: status.to_string(),
            action: action.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request fields don't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid date, invalid month).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate VIN).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Creates a Required error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
