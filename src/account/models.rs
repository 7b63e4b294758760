//! Fund account data models

use chrono::{DateTime, Utc};

/// Lifecycle state of a fund account.
///
/// VOID is terminal: a voided account never trades, freezes or thaws again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum AccountState {
    Normal = 1,
    Frozen = 2,
    Void = 3,
}

impl AccountState {
    #[inline]
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(AccountState::Normal),
            2 => Some(AccountState::Frozen),
            3 => Some(AccountState::Void),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AccountState::Normal => "normal",
            AccountState::Frozen => "frozen",
            AccountState::Void => "unregistered",
        }
    }
}

/// Account category. Merchant accounts are provisioned by the platform
/// and cannot be registered through the public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum AccountType {
    Merchant = 1,
    Personal = 2,
    Corporate = 3,
}

impl AccountType {
    #[inline]
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(AccountType::Merchant),
            2 => Some(AccountType::Personal),
            3 => Some(AccountType::Corporate),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AccountType::Merchant => "merchant account",
            AccountType::Personal => "personal account",
            AccountType::Corporate => "corporate account",
        }
    }
}

/// A customer fund account. Sub-accounts (`parent_id != 0`) share their
/// master's `AccountFund`; the balance lives at the master only.
#[derive(Debug, Clone)]
pub struct FundAccount {
    pub account_id: i64,
    /// 0 when this account is itself a master account.
    pub parent_id: i64,
    pub customer_id: i64,
    pub mch_id: i64,
    pub account_type: AccountType,
    pub use_for: i16,
    pub name: String,
    pub mobile: String,
    /// Argon2 digest of the trade password.
    pub password: String,
    /// Salt used to derive the password digest.
    pub secret_key: String,
    pub state: AccountState,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl FundAccount {
    /// Whether this account is a master account holding its own fund.
    #[inline]
    pub fn is_master(&self) -> bool {
        self.parent_id == 0
    }

    /// The account whose `AccountFund` tracks this account's balance.
    #[inline]
    pub fn master_id(&self) -> i64 {
        if self.is_master() {
            self.account_id
        } else {
            self.parent_id
        }
    }
}

/// Balance record of one master account, in integer minor-currency units.
/// Mutated only through the fund stream engine.
#[derive(Debug, Clone)]
pub struct AccountFund {
    pub account_id: i64,
    pub balance: i64,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Registration request for a new fund account.
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub customer_id: i64,
    pub account_type: AccountType,
    pub use_for: i16,
    pub name: String,
    pub mobile: String,
    /// Plaintext trade password, hashed before it reaches storage.
    pub password: String,
    /// Non-zero to register a sub-account under an existing master.
    pub parent_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_state_codes() {
        assert_eq!(AccountState::Normal.code(), 1);
        assert_eq!(AccountState::Frozen.code(), 2);
        assert_eq!(AccountState::Void.code(), 3);
        assert_eq!(AccountState::from_code(2), Some(AccountState::Frozen));
        assert_eq!(AccountState::from_code(0), None);
        assert_eq!(AccountState::from_code(9), None);
    }

    #[test]
    fn test_account_type_lookup() {
        assert_eq!(AccountType::from_code(1), Some(AccountType::Merchant));
        assert_eq!(AccountType::from_code(4), None);
    }

    #[test]
    fn test_master_resolution() {
        let mut account = FundAccount {
            account_id: 1001,
            parent_id: 0,
            customer_id: 1,
            mch_id: 10,
            account_type: AccountType::Personal,
            use_for: 1,
            name: "a".into(),
            mobile: "1".into(),
            password: String::new(),
            secret_key: String::new(),
            state: AccountState::Normal,
            version: 0,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        assert!(account.is_master());
        assert_eq!(account.master_id(), 1001);

        account.parent_id = 2002;
        assert!(!account.is_master());
        assert_eq!(account.master_id(), 2002);
    }
}
