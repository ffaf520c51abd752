//! Error types for the dasledger core.
//!
//! All errors use the `DL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Balance errors
//! - 2xx: Account relationship errors
//! - 3xx: Balance-limit errors
//! - 4xx: Object lookup errors
//! - 5xx: Order errors
//! - 6xx: Authority errors
//! - 7xx: Operation errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, AssetId, ObjectId};

/// Central error enum for all dasledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // =================================================================
    // Balance Errors (1xx)
    // =================================================================
    /// The cash or reserved amount is below the requested debit.
    #[error(
        "DL_ERR_100: Insufficient balance on {account} for {asset}: need {needed}, have {available}"
    )]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        needed: i64,
        available: i64,
    },

    /// An arithmetic result left the representable amount range.
    #[error("DL_ERR_101: Amount overflow: {reason}")]
    AmountOverflow { reason: String },

    // =================================================================
    // Account Relationship Errors (2xx)
    // =================================================================
    /// Account class mismatch, missing or wrong-direction tether, or a
    /// self-referential transfer.
    #[error("DL_ERR_200: Invalid account relationship: {reason}")]
    InvalidAccountRelationship { reason: String },

    // =================================================================
    // Balance-Limit Errors (3xx)
    // =================================================================
    /// A vault-to-wallet transfer exceeds the remaining limit window.
    #[error(
        "DL_ERR_300: Limit exceeded on {account} for {asset}: requested {requested}, remaining {remaining}"
    )]
    LimitExceeded {
        account: AccountId,
        asset: AssetId,
        requested: i64,
        remaining: i64,
    },

    // =================================================================
    // Object Errors (4xx)
    // =================================================================
    /// A referenced id does not resolve in the object store.
    #[error("DL_ERR_400: Unknown object: {0}")]
    UnknownObject(ObjectId),

    // =================================================================
    // Order Errors (5xx)
    // =================================================================
    /// The order failed validation (bad amounts, past expiration, self-cross).
    #[error("DL_ERR_500: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    // =================================================================
    // Authority Errors (6xx)
    // =================================================================
    /// The acting account has no authority over the target object.
    #[error("DL_ERR_600: {account} has no authority over {object}")]
    NotOwner { account: AccountId, object: ObjectId },

    // =================================================================
    // Operation Errors (7xx)
    // =================================================================
    /// A non-order operation is malformed (negative amount, non-zero fee,
    /// restricted asset, ...).
    #[error("DL_ERR_700: Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// A mutation failed after evaluation succeeded. Fatal: the state
    /// machine guarantees apply cannot fail for an evaluated operation.
    #[error("DL_ERR_900: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// Configuration error (invalid parameters, malformed file).
    #[error("DL_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("DL_ERR_902: Serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Shorthand for [`LedgerError::InvalidOrder`].
    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidOrder {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`LedgerError::InvalidOperation`].
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`LedgerError::InvalidAccountRelationship`].
    pub fn relationship(reason: impl Into<String>) -> Self {
        Self::InvalidAccountRelationship {
            reason: reason.into(),
        }
    }

    /// Whether this error is a fatal invariant violation rather than an
    /// ordinary rejection.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
