//! Fund account store
//!
//! Exclusive owner of `fund_accounts_tb` / `account_funds_tb` mutation.
//! Every state or password write is version-gated: the UPDATE carries the
//! version observed at read time and zero affected rows is reported as a
//! concurrency conflict, never as silent success.
//!
//! All operations run on a caller-supplied connection so the service
//! facade can span one atomic transaction over a whole settlement.

use chrono::Utc;
use sqlx::{PgConnection, Row, postgres::PgRow};
use tracing::info;

use super::models::{AccountFund, AccountState, AccountType, FundAccount, RegisterAccount};
use super::state_machine;
use crate::error::{PaymentError, Result};
use crate::password;

pub struct FundAccountStore;

impl FundAccountStore {
    /// Register a new fund account under a merchant and return its id.
    ///
    /// A non-zero `parent_id` registers a sub-account: the parent must
    /// exist under the same merchant, be a master account, and not be
    /// voided. Master accounts get a zero-balance fund row; sub-accounts
    /// share their master's fund.
    pub async fn create(
        conn: &mut PgConnection,
        mch_id: i64,
        registration: &RegisterAccount,
    ) -> Result<i64> {
        if registration.parent_id != 0 {
            let parent = Self::find_by_id(conn, registration.parent_id).await?;
            if parent.mch_id != mch_id {
                return Err(PaymentError::OperationNotAllowed(
                    "parent account belongs to another merchant".into(),
                ));
            }
            if !parent.is_master() {
                return Err(PaymentError::IllegalArgument(
                    "a sub-account cannot own sub-accounts".into(),
                ));
            }
            state_machine::update_check(&parent)?;
        }

        let secret_key = password::generate_secret_key();
        let password_hash = password::hash_password(&registration.password, &secret_key)?;
        let now = Utc::now();

        let account_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO fund_accounts_tb
                (parent_id, customer_id, mch_id, account_type, use_for, name,
                 mobile, password, secret_key, state, version, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $11, $11)
            RETURNING account_id
            "#,
        )
        .bind(registration.parent_id)
        .bind(registration.customer_id)
        .bind(mch_id)
        .bind(registration.account_type.code())
        .bind(registration.use_for)
        .bind(&registration.name)
        .bind(&registration.mobile)
        .bind(&password_hash)
        .bind(&secret_key)
        .bind(AccountState::Normal.code())
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        if registration.parent_id == 0 {
            sqlx::query(
                r#"
                INSERT INTO account_funds_tb (account_id, balance, version, created_at, modified_at)
                VALUES ($1, 0, 0, $2, $2)
                "#,
            )
            .bind(account_id)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }

        info!(account_id, mch_id, "fund account registered");
        Ok(account_id)
    }

    /// Freeze an account. Fails when already frozen or voided, or when a
    /// concurrent writer bumped the version between read and write.
    pub async fn freeze(conn: &mut PgConnection, account_id: i64) -> Result<()> {
        let account = Self::find_by_id(conn, account_id).await?;
        state_machine::freeze_check(&account)?;
        Self::compare_and_set_state(conn, &account, AccountState::Frozen).await?;
        info!(account_id, "fund account frozen");
        Ok(())
    }

    /// Unfreeze a frozen account.
    pub async fn unfreeze(conn: &mut PgConnection, account_id: i64) -> Result<()> {
        let account = Self::find_by_id(conn, account_id).await?;
        state_machine::unfreeze_check(&account)?;
        Self::compare_and_set_state(conn, &account, AccountState::Normal).await?;
        info!(account_id, "fund account unfrozen");
        Ok(())
    }

    /// Unregister an account: terminal, irreversible VOID. Master accounts
    /// must hold a zero balance; sub-accounts carry no balance of their own.
    pub async fn unregister(conn: &mut PgConnection, mch_id: i64, account_id: i64) -> Result<()> {
        let account = Self::find_by_id(conn, account_id).await?;
        if account.mch_id != mch_id {
            return Err(PaymentError::OperationNotAllowed(
                "account belongs to another merchant".into(),
            ));
        }
        state_machine::unregister_account_check(&account)?;
        if account.is_master() {
            let fund = Self::find_fund_by_id(conn, account.account_id).await?;
            state_machine::unregister_fund_check(&fund)?;
        }
        Self::compare_and_set_state(conn, &account, AccountState::Void).await?;
        info!(account_id, mch_id, "fund account unregistered");
        Ok(())
    }

    /// Look up an account by its externally visible id.
    pub async fn find_by_id(conn: &mut PgConnection, account_id: i64) -> Result<FundAccount> {
        let row = sqlx::query(
            r#"
            SELECT account_id, parent_id, customer_id, mch_id, account_type, use_for,
                   name, mobile, password, secret_key, state, version, created_at, modified_at
            FROM fund_accounts_tb
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|r| Self::row_to_account(&r))
            .transpose()?
            .ok_or_else(|| PaymentError::ObjectNotFound("fund account not found".into()))
    }

    /// List the sub-accounts of a master account.
    pub async fn find_by_parent_id(
        conn: &mut PgConnection,
        parent_id: i64,
    ) -> Result<Vec<FundAccount>> {
        let rows = sqlx::query(
            r#"
            SELECT account_id, parent_id, customer_id, mch_id, account_type, use_for,
                   name, mobile, password, secret_key, state, version, created_at, modified_at
            FROM fund_accounts_tb
            WHERE parent_id = $1
            ORDER BY account_id
            "#,
        )
        .bind(parent_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Fund record of a master account.
    pub async fn find_fund_by_id(conn: &mut PgConnection, account_id: i64) -> Result<AccountFund> {
        let row = sqlx::query(
            r#"
            SELECT account_id, balance, version, created_at, modified_at
            FROM account_funds_tb
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|r| AccountFund {
            account_id: r.get("account_id"),
            balance: r.get("balance"),
            version: r.get("version"),
            created_at: r.get("created_at"),
            modified_at: r.get("modified_at"),
        })
        .ok_or_else(|| PaymentError::ObjectNotFound("account fund not found".into()))
    }

    /// Replace the trade password with a freshly salted digest.
    pub async fn reset_password(
        conn: &mut PgConnection,
        account_id: i64,
        new_password: &str,
    ) -> Result<()> {
        let account = Self::find_by_id(conn, account_id).await?;
        state_machine::update_check(&account)?;

        let secret_key = password::generate_secret_key();
        let password_hash = password::hash_password(new_password, &secret_key)?;

        let result = sqlx::query(
            r#"
            UPDATE fund_accounts_tb
            SET password = $1, secret_key = $2, version = version + 1, modified_at = $3
            WHERE account_id = $4 AND version = $5
            "#,
        )
        .bind(&password_hash)
        .bind(&secret_key)
        .bind(Utc::now())
        .bind(account.account_id)
        .bind(account.version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PaymentError::ConcurrentUpdate);
        }
        info!(account_id, "trade password reset");
        Ok(())
    }

    /// Version-gated state write: succeeds iff the version observed at
    /// read time is still current.
    async fn compare_and_set_state(
        conn: &mut PgConnection,
        account: &FundAccount,
        new_state: AccountState,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE fund_accounts_tb
            SET state = $1, version = version + 1, modified_at = $2
            WHERE account_id = $3 AND version = $4
            "#,
        )
        .bind(new_state.code())
        .bind(Utc::now())
        .bind(account.account_id)
        .bind(account.version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PaymentError::ConcurrentUpdate);
        }
        Ok(())
    }

    fn row_to_account(row: &PgRow) -> Result<FundAccount> {
        let state_code: i16 = row.get("state");
        let state = AccountState::from_code(state_code).ok_or_else(|| {
            PaymentError::OperationFailed(format!("invalid account state code: {}", state_code))
        })?;
        let type_code: i16 = row.get("account_type");
        let account_type = AccountType::from_code(type_code).ok_or_else(|| {
            PaymentError::OperationFailed(format!("invalid account type code: {}", type_code))
        })?;

        Ok(FundAccount {
            account_id: row.get("account_id"),
            parent_id: row.get("parent_id"),
            customer_id: row.get("customer_id"),
            mch_id: row.get("mch_id"),
            account_type,
            use_for: row.get("use_for"),
            name: row.get("name"),
            mobile: row.get("mobile"),
            password: row.get("password"),
            secret_key: row.get("secret_key"),
            state,
            version: row.get("version"),
            created_at: row.get("created_at"),
            modified_at: row.get("modified_at"),
        })
    }
}
