//! Account state machine
//!
//! Pure transition checks: no I/O, no side effects. Each function answers
//! one question - may this account take the requested transition from its
//! current state - and fails with the caller-facing error otherwise.

use super::models::{AccountFund, AccountState, FundAccount};
use crate::error::{PaymentError, Result};

/// An account can be frozen unless it is already frozen or voided.
pub fn freeze_check(account: &FundAccount) -> Result<()> {
    if account.state == AccountState::Void {
        return Err(PaymentError::InvalidAccountState(
            "fund account is unregistered".into(),
        ));
    }
    if account.state == AccountState::Frozen {
        return Err(PaymentError::InvalidAccountState(
            "fund account is already frozen".into(),
        ));
    }
    Ok(())
}

/// Only a frozen account can be unfrozen.
pub fn unfreeze_check(account: &FundAccount) -> Result<()> {
    if account.state == AccountState::Void {
        return Err(PaymentError::InvalidAccountState(
            "fund account is unregistered".into(),
        ));
    }
    if account.state != AccountState::Frozen {
        return Err(PaymentError::InvalidAccountState(
            "fund account is not frozen".into(),
        ));
    }
    Ok(())
}

/// Unregistration is currently unconditional: "*" -> VOID.
// TODO(product): confirm whether frozen accounts may be unregistered.
pub fn unregister_account_check(_account: &FundAccount) -> Result<()> {
    Ok(())
}

/// Account details (password, profile) can change while not voided.
pub fn update_check(account: &FundAccount) -> Result<()> {
    if account.state == AccountState::Void {
        return Err(PaymentError::InvalidAccountState(
            "fund account is unregistered".into(),
        ));
    }
    Ok(())
}

/// A fund holding a balance cannot be unregistered.
pub fn unregister_fund_check(fund: &AccountFund) -> Result<()> {
    if fund.balance > 0 {
        return Err(PaymentError::OperationNotAllowed(
            "cannot unregister a fund account holding funds".into(),
        ));
    }
    Ok(())
}

/// Trade eligibility of one account record. Callers must apply the same
/// check to the parent account when `parent_id != 0` - a sub-account never
/// trades while its master is frozen or voided.
pub fn trade_state_check(account: &FundAccount) -> Result<()> {
    if account.state != AccountState::Normal {
        return Err(PaymentError::InvalidAccountState(format!(
            "fund account is {}",
            account.state.name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::models::AccountType;
    use chrono::Utc;

    fn account(state: AccountState) -> FundAccount {
        FundAccount {
            account_id: 1001,
            parent_id: 0,
            customer_id: 1,
            mch_id: 10,
            account_type: AccountType::Personal,
            use_for: 1,
            name: "t".into(),
            mobile: "1".into(),
            password: String::new(),
            secret_key: String::new(),
            state,
            version: 0,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    fn fund(balance: i64) -> AccountFund {
        AccountFund {
            account_id: 1001,
            balance,
            version: 0,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    #[test]
    fn test_freeze_check() {
        assert!(freeze_check(&account(AccountState::Normal)).is_ok());
        assert!(matches!(
            freeze_check(&account(AccountState::Frozen)),
            Err(PaymentError::InvalidAccountState(_))
        ));
        assert!(matches!(
            freeze_check(&account(AccountState::Void)),
            Err(PaymentError::InvalidAccountState(_))
        ));
    }

    #[test]
    fn test_unfreeze_check() {
        assert!(unfreeze_check(&account(AccountState::Frozen)).is_ok());
        assert!(matches!(
            unfreeze_check(&account(AccountState::Normal)),
            Err(PaymentError::InvalidAccountState(_))
        ));
        assert!(matches!(
            unfreeze_check(&account(AccountState::Void)),
            Err(PaymentError::InvalidAccountState(_))
        ));
    }

    #[test]
    fn test_unregister_account_check_unconditional() {
        assert!(unregister_account_check(&account(AccountState::Normal)).is_ok());
        assert!(unregister_account_check(&account(AccountState::Frozen)).is_ok());
        assert!(unregister_account_check(&account(AccountState::Void)).is_ok());
    }

    #[test]
    fn test_update_check() {
        assert!(update_check(&account(AccountState::Normal)).is_ok());
        assert!(update_check(&account(AccountState::Frozen)).is_ok());
        assert!(update_check(&account(AccountState::Void)).is_err());
    }

    #[test]
    fn test_unregister_fund_check() {
        assert!(unregister_fund_check(&fund(0)).is_ok());
        assert!(matches!(
            unregister_fund_check(&fund(1)),
            Err(PaymentError::OperationNotAllowed(_))
        ));
    }

    #[test]
    fn test_trade_state_check() {
        assert!(trade_state_check(&account(AccountState::Normal)).is_ok());
        for state in [AccountState::Frozen, AccountState::Void] {
            let err = trade_state_check(&account(state)).unwrap_err();
            assert!(matches!(err, PaymentError::InvalidAccountState(_)));
            assert!(err.to_string().contains(state.name()));
        }
    }
}
