//! Service facade - the inbound operation surface of the core.
//!
//! Each operation validates its inputs, opens one database transaction,
//! drives the stores/orchestrator on it, and commits. Any failure rolls
//! the whole unit of work back; nothing a failed attempt did is ever
//! visible. The single exception is a password lockout: the freeze it
//! applied must outlive the failed permission check, so that transaction
//! is committed before the error is returned.

use std::sync::Arc;

use crate::account::{AccountFund, AccountType, FundAccount, FundAccountStore, RegisterAccount};
use crate::db::Database;
use crate::error::{PaymentError, Result};
use crate::permission::{RetryCounterStore, TradePermissionGuard};
use crate::trade::{
    Payment, PaymentResult, Refund, TradeOrder, TradeSettlementOrchestrator, TradeStore,
};

pub struct FundService {
    db: Database,
    guard: TradePermissionGuard,
    max_password_errors: i32,
}

impl FundService {
    pub fn new(
        db: Database,
        counters: Arc<dyn RetryCounterStore>,
        max_password_errors: i32,
    ) -> Self {
        Self {
            db,
            guard: TradePermissionGuard::new(counters),
            max_password_errors,
        }
    }

    /// Register a fund account under a merchant and return its id.
    pub async fn register_account(
        &self,
        mch_id: i64,
        registration: RegisterAccount,
    ) -> Result<i64> {
        if registration.name.is_empty() {
            return Err(PaymentError::IllegalArgument("name missed".into()));
        }
        if registration.mobile.is_empty() {
            return Err(PaymentError::IllegalArgument("mobile missed".into()));
        }
        if registration.password.is_empty() {
            return Err(PaymentError::IllegalArgument("password missed".into()));
        }
        if registration.account_type == AccountType::Merchant {
            return Err(PaymentError::IllegalArgument(
                "cannot register a merchant account".into(),
            ));
        }

        let mut tx = self.db.pool().begin().await?;
        let account_id = FundAccountStore::create(&mut tx, mch_id, &registration).await?;
        tx.commit().await?;
        Ok(account_id)
    }

    pub async fn freeze_account(&self, account_id: i64) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        FundAccountStore::freeze(&mut tx, account_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn unfreeze_account(&self, account_id: i64) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        FundAccountStore::unfreeze(&mut tx, account_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Unregister an account: irreversible, and refused while the account
    /// still holds funds.
    pub async fn unregister_account(&self, mch_id: i64, account_id: i64) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        FundAccountStore::unregister(&mut tx, mch_id, account_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn reset_password(&self, account_id: i64, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(PaymentError::IllegalArgument("password missed".into()));
        }
        let mut tx = self.db.pool().begin().await?;
        FundAccountStore::reset_password(&mut tx, account_id, new_password).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Balance of an account, resolved through its master when the id
    /// names a sub-account.
    pub async fn query_account_fund(&self, account_id: i64) -> Result<AccountFund> {
        let mut conn = self.db.pool().acquire().await?;
        let account = FundAccountStore::find_by_id(&mut conn, account_id).await?;
        FundAccountStore::find_fund_by_id(&mut conn, account.master_id()).await
    }

    /// Standalone trade-permission check with the configured retry bound.
    /// A lockout freeze is committed even though the check itself fails.
    pub async fn check_trade_permission(
        &self,
        account_id: i64,
        password: &str,
    ) -> Result<FundAccount> {
        let mut tx = self.db.pool().begin().await?;
        match self
            .guard
            .check_with_password(&mut tx, account_id, password, self.max_password_errors)
            .await
        {
            Ok(account) => {
                tx.commit().await?;
                Ok(account)
            }
            Err(e) if e.is_lockout() => {
                tx.commit().await?;
                Err(e)
            }
            Err(e) => {
                tx.rollback().await.ok();
                Err(e)
            }
        }
    }

    /// Re-read a trade order, e.g. before retrying a conflicted settlement.
    pub async fn find_trade(&self, trade_id: i64) -> Result<TradeOrder> {
        let mut conn = self.db.pool().acquire().await?;
        TradeStore::find_trade_by_id(&mut conn, trade_id).await
    }

    /// Commit an instant trade as one atomic unit of work.
    pub async fn commit_trade(
        &self,
        trade: &TradeOrder,
        payment: &Payment,
    ) -> Result<PaymentResult> {
        let mut tx = self.db.pool().begin().await?;
        let result = TradeSettlementOrchestrator::commit(&mut tx, &self.guard, trade, payment).await?;
        tx.commit().await?;
        Ok(result)
    }

    /// Cancel a previously committed trade as one atomic unit of work.
    pub async fn cancel_trade(&self, trade: &TradeOrder, cancel: &Refund) -> Result<PaymentResult> {
        let mut tx = self.db.pool().begin().await?;
        let result = TradeSettlementOrchestrator::cancel(&mut tx, &self.guard, trade, cancel).await?;
        tx.commit().await?;
        Ok(result)
    }
}
