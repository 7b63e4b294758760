//! Payment error taxonomy
//!
//! Every failure surfaced by the core carries a stable numeric code so
//! callers can branch without parsing messages. Concurrency conflicts are
//! deliberately worded as "system busy" — internal versioning is not part
//! of the contract.

use thiserror::Error;

/// Stable error codes exposed to callers.
pub mod code {
    pub const ILLEGAL_ARGUMENT: i32 = 1010;
    pub const OBJECT_NOT_FOUND: i32 = 1011;
    pub const INVALID_ACCOUNT_STATE: i32 = 2010;
    pub const INVALID_PASSWORD: i32 = 2011;
    pub const INSUFFICIENT_FUNDS: i32 = 2012;
    pub const OPERATION_NOT_ALLOWED: i32 = 2013;
    pub const CONCURRENT_UPDATE: i32 = 2014;
    pub const DATABASE_ERROR: i32 = 9000;
    pub const OPERATION_FAILED: i32 = 9001;
}

/// Error type for all fund-account and trade-settlement operations.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Malformed or missing input - caller bug, not retryable.
    #[error("{0}")]
    IllegalArgument(String),

    /// Missing trade/payment/merchant/account record.
    #[error("{0}")]
    ObjectNotFound(String),

    /// Account frozen or voided - terminal for this attempt.
    #[error("{0}")]
    InvalidAccountState(String),

    /// Wrong trade password.
    #[error("invalid trade password")]
    InvalidPassword,

    /// Wrong trade password, next failure locks the account.
    #[error("invalid trade password, one more failure will lock the account")]
    PasswordWillLock,

    /// Wrong trade password, account has been locked.
    #[error("invalid trade password, account locked")]
    AccountLocked,

    /// An outgo would drive the running balance negative.
    #[error("insufficient account funds")]
    InsufficientFunds,

    /// Business-rule violation (funded account deletion, cross-merchant
    /// trade, invalid trade state for the requested operation).
    #[error("{0}")]
    OperationNotAllowed(String),

    /// Optimistic-lock conflict - retryable after re-reading fresh state.
    #[error("system busy, please retry")]
    ConcurrentUpdate,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unexpected lower-layer fault.
    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl PaymentError {
    /// Stable numeric code for this error.
    pub fn code(&self) -> i32 {
        match self {
            PaymentError::IllegalArgument(_) => code::ILLEGAL_ARGUMENT,
            PaymentError::ObjectNotFound(_) => code::OBJECT_NOT_FOUND,
            PaymentError::InvalidAccountState(_) => code::INVALID_ACCOUNT_STATE,
            PaymentError::InvalidPassword
            | PaymentError::PasswordWillLock
            | PaymentError::AccountLocked => code::INVALID_PASSWORD,
            PaymentError::InsufficientFunds => code::INSUFFICIENT_FUNDS,
            PaymentError::OperationNotAllowed(_) => code::OPERATION_NOT_ALLOWED,
            PaymentError::ConcurrentUpdate => code::CONCURRENT_UPDATE,
            PaymentError::Database(_) => code::DATABASE_ERROR,
            PaymentError::OperationFailed(_) => code::OPERATION_FAILED,
        }
    }

    /// Whether the caller may retry the whole settlement after re-reading
    /// fresh state. Only concurrency conflicts qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::ConcurrentUpdate)
    }

    /// Whether this failure froze the account as a side effect. The
    /// service facade commits the enclosing transaction for these instead
    /// of rolling it back.
    pub fn is_lockout(&self) -> bool {
        matches!(self, PaymentError::AccountLocked)
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_stable() {
        assert_eq!(PaymentError::IllegalArgument("x".into()).code(), 1010);
        assert_eq!(PaymentError::ObjectNotFound("x".into()).code(), 1011);
        assert_eq!(PaymentError::InvalidAccountState("x".into()).code(), 2010);
        assert_eq!(PaymentError::InvalidPassword.code(), 2011);
        assert_eq!(PaymentError::PasswordWillLock.code(), 2011);
        assert_eq!(PaymentError::AccountLocked.code(), 2011);
        assert_eq!(PaymentError::InsufficientFunds.code(), 2012);
        assert_eq!(PaymentError::OperationNotAllowed("x".into()).code(), 2013);
        assert_eq!(PaymentError::ConcurrentUpdate.code(), 2014);
    }

    #[test]
    fn test_retryable_only_for_conflicts() {
        assert!(PaymentError::ConcurrentUpdate.is_retryable());
        assert!(!PaymentError::InvalidPassword.is_retryable());
        assert!(!PaymentError::InsufficientFunds.is_retryable());
    }

    #[test]
    fn test_lockout_marker() {
        assert!(PaymentError::AccountLocked.is_lockout());
        assert!(!PaymentError::PasswordWillLock.is_lockout());
        assert!(!PaymentError::InvalidPassword.is_lockout());
    }

    #[test]
    fn test_conflict_message_hides_versioning() {
        let msg = PaymentError::ConcurrentUpdate.to_string();
        assert!(msg.contains("busy"));
        assert!(!msg.contains("version"));
    }
}
