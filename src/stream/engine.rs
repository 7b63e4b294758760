//! Fund stream engine
//!
//! Turns one finalized `FundTransaction` into persisted ledger entries and
//! an updated master balance. For each movement, one immutable
//! `fund_activities_tb` row records the resulting running balance, then the
//! balance is written with a version-checked compare-and-set; a losing race
//! surfaces as a concurrency conflict for the caller to retry the whole
//! settlement.

use chrono::Utc;
use sqlx::PgConnection;
use tracing::debug;

use super::transaction::{ActionType, FundTransaction, TransactionStatus};
use crate::account::FundAccountStore;
use crate::error::{PaymentError, Result};

pub struct FundStreamEngine;

impl FundStreamEngine {
    /// Submit a fund transaction: apply every movement in finalized order
    /// against the master fund and append one ledger entry per movement.
    pub async fn submit(
        conn: &mut PgConnection,
        transaction: &FundTransaction,
    ) -> Result<TransactionStatus> {
        let movements = transaction.ordered_movements()?;

        let fund = FundAccountStore::find_fund_by_id(conn, transaction.master_id).await?;
        let mut balance = fund.balance;
        let mut version = fund.version;

        for movement in &movements {
            balance = match movement.action {
                ActionType::Income => balance
                    .checked_add(movement.amount)
                    .ok_or_else(|| PaymentError::OperationFailed("balance overflow".into()))?,
                ActionType::Outgo => {
                    if movement.amount > balance {
                        return Err(PaymentError::InsufficientFunds);
                    }
                    balance - movement.amount
                }
            };

            sqlx::query(
                r#"
                INSERT INTO fund_activities_tb
                    (account_id, payment_id, trade_type, action, amount, balance,
                     type_code, type_name, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(transaction.master_id)
            .bind(&transaction.payment_id)
            .bind(transaction.trade_type.code())
            .bind(movement.action.code())
            .bind(movement.amount)
            .bind(balance)
            .bind(movement.type_code)
            .bind(&movement.type_name)
            .bind(transaction.when)
            .execute(&mut *conn)
            .await?;

            let result = sqlx::query(
                r#"
                UPDATE account_funds_tb
                SET balance = $1, version = version + 1, modified_at = $2
                WHERE account_id = $3 AND version = $4
                "#,
            )
            .bind(balance)
            .bind(Utc::now())
            .bind(transaction.master_id)
            .bind(version)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(PaymentError::ConcurrentUpdate);
            }
            version += 1;
        }

        debug!(
            account_id = transaction.master_id,
            payment_id = %transaction.payment_id,
            movements = movements.len(),
            balance,
            "fund transaction applied"
        );

        Ok(TransactionStatus {
            account_id: transaction.account_id,
            payment_id: transaction.payment_id.clone(),
            trade_type: transaction.trade_type,
            balance,
            when: transaction.when,
            relation: None,
        })
    }
}
