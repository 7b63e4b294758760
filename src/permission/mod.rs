//! Trade permission guard
//!
//! Combined state + password eligibility check required before a party can
//! move funds. Wrong-password attempts are counted per account per
//! calendar day in an external best-effort store; reaching the configured
//! maximum freezes the account. A counter-store outage must never block
//! legitimate trading, only disable lockout.

pub mod retry_store;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgConnection;
use tracing::{error, info};

use crate::account::{FundAccount, FundAccountStore, state_machine};
use crate::error::{PaymentError, Result};
use crate::password;
pub use retry_store::{MemoryCounterStore, RetryCounterStore};

const PASSWORD_KEY_PREFIX: &str = "fund:permission:password:";

/// Daily counters expire after two days.
const PASSWORD_ERROR_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 2);

pub struct TradePermissionGuard {
    counters: Arc<dyn RetryCounterStore>,
}

impl TradePermissionGuard {
    pub fn new(counters: Arc<dyn RetryCounterStore>) -> Self {
        Self { counters }
    }

    /// Password-checked permission. `max_errors <= 0` disables attempt
    /// counting; otherwise the `max_errors`-th wrong password of the day
    /// freezes the account.
    pub async fn check_with_password(
        &self,
        conn: &mut PgConnection,
        account_id: i64,
        trade_password: &str,
        max_errors: i32,
    ) -> Result<FundAccount> {
        if trade_password.is_empty() {
            return Err(PaymentError::IllegalArgument("password missed".into()));
        }
        let account = FundAccountStore::find_by_id(conn, account_id).await?;
        state_machine::trade_state_check(&account)?;

        if !password::verify_password(trade_password, &account.secret_key, &account.password)? {
            if max_errors > 0 {
                let errors = self.incr_and_get_errors(&daily_key(account_id)).await;
                if errors >= max_errors as i64 {
                    FundAccountStore::freeze(conn, account_id).await?;
                    info!(account_id, errors, "account locked after password retries");
                    return Err(PaymentError::AccountLocked);
                } else if errors == max_errors as i64 - 1 {
                    return Err(PaymentError::PasswordWillLock);
                }
            }
            return Err(PaymentError::InvalidPassword);
        }

        // Correct password clears the day's counter.
        if max_errors > 0 {
            self.remove_errors(&daily_key(account_id)).await;
        }
        Ok(account)
    }

    /// State-only permission, used by non-authenticated flows such as
    /// cancellation initiated by the payee side.
    pub async fn check(&self, conn: &mut PgConnection, account_id: i64) -> Result<FundAccount> {
        let account = FundAccountStore::find_by_id(conn, account_id).await?;
        state_machine::trade_state_check(&account)?;
        Ok(account)
    }

    /// Counter failures degrade to -1: no lockout branch ever fires.
    async fn incr_and_get_errors(&self, key: &str) -> i64 {
        match self.counters.incr_and_get(key, PASSWORD_ERROR_TTL).await {
            Ok(errors) => errors,
            Err(e) => {
                error!(key, error = %e, "failed to count password errors");
                -1
            }
        }
    }

    async fn remove_errors(&self, key: &str) {
        if let Err(e) = self.counters.remove(key).await {
            error!(key, error = %e, "failed to clear password error counter");
        }
    }
}

/// Trading eligibility of an account including its master: a sub-account
/// cannot trade while its parent is frozen or voided.
pub async fn check_trade_eligibility(
    conn: &mut PgConnection,
    account: &FundAccount,
) -> Result<()> {
    state_machine::trade_state_check(account)?;
    if account.parent_id != 0 {
        let parent = FundAccountStore::find_by_id(conn, account.parent_id).await?;
        state_machine::trade_state_check(&parent)?;
    }
    Ok(())
}

fn daily_key(account_id: i64) -> String {
    format!(
        "{}{}{}",
        PASSWORD_KEY_PREFIX,
        Utc::now().format("%Y%m%d"),
        account_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_key_shape() {
        let key = daily_key(1001);
        assert!(key.starts_with(PASSWORD_KEY_PREFIX));
        assert!(key.ends_with("1001"));
        // prefix + YYYYMMDD + account id
        assert_eq!(key.len(), PASSWORD_KEY_PREFIX.len() + 8 + 4);
    }
}
