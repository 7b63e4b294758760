//! Trade order / payment store
//!
//! Exclusive owner of trade-order, payment, fee and refund rows. State
//! advances only through compare-and-set: an UPDATE guarded by the version
//! observed at read time, with zero affected rows meaning another writer
//! won the race.

use chrono::Utc;
use sqlx::{PgConnection, Row, postgres::PgRow};

use super::models::{
    FeeUseFor, PaymentFee, PaymentState, PaymentStateDto, RefundPayment, TradeOrder, TradePayment,
    TradeState, TradeStateDto, TradeType,
};
use crate::error::{PaymentError, Result};

pub struct TradeStore;

impl TradeStore {
    pub async fn insert_trade(conn: &mut PgConnection, trade: &TradeOrder) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trade_orders_tb
                (trade_id, trade_type, account_id, mch_id, amount, fee, state,
                 version, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(trade.trade_id)
        .bind(trade.trade_type.code())
        .bind(trade.account_id)
        .bind(trade.mch_id)
        .bind(trade.amount)
        .bind(trade.fee)
        .bind(trade.state.code())
        .bind(trade.version)
        .bind(trade.created_at)
        .bind(trade.modified_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn find_trade_by_id(conn: &mut PgConnection, trade_id: i64) -> Result<TradeOrder> {
        let row = sqlx::query(
            r#"
            SELECT trade_id, trade_type, account_id, mch_id, amount, fee, state,
                   version, created_at, modified_at
            FROM trade_orders_tb
            WHERE trade_id = $1
            "#,
        )
        .bind(trade_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|r| Self::row_to_trade(&r))
            .transpose()?
            .ok_or_else(|| PaymentError::ObjectNotFound("trade order not found".into()))
    }

    /// Advance a trade order's state (and optionally its seller-side fee)
    /// iff the version is unchanged. Returns whether the write landed.
    pub async fn compare_and_set_trade_state(
        conn: &mut PgConnection,
        state: &TradeStateDto,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trade_orders_tb
            SET state = $1, fee = COALESCE($2, fee), version = version + 1, modified_at = $3
            WHERE trade_id = $4 AND version = $5
            "#,
        )
        .bind(state.state.code())
        .bind(state.fee)
        .bind(state.when)
        .bind(state.trade_id)
        .bind(state.version)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_payment(conn: &mut PgConnection, payment: &TradePayment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trade_payments_tb
                (payment_id, trade_id, channel_id, account_id, name, amount, fee,
                 state, description, version, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&payment.payment_id)
        .bind(payment.trade_id)
        .bind(payment.channel_id)
        .bind(payment.account_id)
        .bind(&payment.name)
        .bind(payment.amount)
        .bind(payment.fee)
        .bind(payment.state.code())
        .bind(&payment.description)
        .bind(payment.version)
        .bind(payment.created_at)
        .bind(payment.modified_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// The single payment of a trade. Instant trade has no combined or
    /// split payments, so one trade maps to at most one payment record.
    pub async fn find_payment_by_trade_id(
        conn: &mut PgConnection,
        trade_id: i64,
    ) -> Result<Option<TradePayment>> {
        let row = sqlx::query(
            r#"
            SELECT payment_id, trade_id, channel_id, account_id, name, amount, fee,
                   state, description, version, created_at, modified_at
            FROM trade_payments_tb
            WHERE trade_id = $1
            "#,
        )
        .bind(trade_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|r| Self::row_to_payment(&r)).transpose()
    }

    /// Advance a payment record's state iff the version is unchanged.
    pub async fn compare_and_set_payment_state(
        conn: &mut PgConnection,
        state: &PaymentStateDto,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trade_payments_tb
            SET state = $1, version = version + 1, modified_at = $2
            WHERE payment_id = $3 AND version = $4
            "#,
        )
        .bind(state.state.code())
        .bind(state.when)
        .bind(&state.payment_id)
        .bind(state.version)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_payment_fees(conn: &mut PgConnection, fees: &[PaymentFee]) -> Result<()> {
        for fee in fees {
            sqlx::query(
                r#"
                INSERT INTO payment_fees_tb
                    (payment_id, use_for, amount, type_code, type_name, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&fee.payment_id)
            .bind(fee.use_for.code())
            .bind(fee.amount)
            .bind(fee.type_code)
            .bind(&fee.type_name)
            .bind(fee.created_at)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn find_payment_fees(
        conn: &mut PgConnection,
        payment_id: &str,
    ) -> Result<Vec<PaymentFee>> {
        let rows = sqlx::query(
            r#"
            SELECT payment_id, use_for, amount, type_code, type_name, created_at
            FROM payment_fees_tb
            WHERE payment_id = $1
            ORDER BY id
            "#,
        )
        .bind(payment_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.iter()
            .map(|r| {
                let use_for_code: i16 = r.get("use_for");
                let use_for = FeeUseFor::from_code(use_for_code).ok_or_else(|| {
                    PaymentError::OperationFailed(format!(
                        "invalid fee use_for code: {}",
                        use_for_code
                    ))
                })?;
                Ok(PaymentFee {
                    payment_id: r.get("payment_id"),
                    use_for,
                    amount: r.get("amount"),
                    type_code: r.get("type_code"),
                    type_name: r.get("type_name"),
                    created_at: r.get("created_at"),
                })
            })
            .collect()
    }

    pub async fn insert_refund(conn: &mut PgConnection, refund: &RefundPayment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refund_payments_tb
                (payment_id, refund_type, trade_id, trade_type, amount, fee, state,
                 version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&refund.payment_id)
        .bind(refund.refund_type.code())
        .bind(refund.trade_id)
        .bind(refund.trade_type.code())
        .bind(refund.amount)
        .bind(refund.fee)
        .bind(refund.state.code())
        .bind(refund.version)
        .bind(refund.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    fn row_to_trade(row: &PgRow) -> Result<TradeOrder> {
        let type_code: i16 = row.get("trade_type");
        let trade_type = TradeType::from_code(type_code).ok_or_else(|| {
            PaymentError::OperationFailed(format!("invalid trade type code: {}", type_code))
        })?;
        let state_code: i16 = row.get("state");
        let state = TradeState::from_code(state_code).ok_or_else(|| {
            PaymentError::OperationFailed(format!("invalid trade state code: {}", state_code))
        })?;

        Ok(TradeOrder {
            trade_id: row.get("trade_id"),
            trade_type,
            account_id: row.get("account_id"),
            mch_id: row.get("mch_id"),
            amount: row.get("amount"),
            fee: row.get("fee"),
            state,
            version: row.get("version"),
            created_at: row.get("created_at"),
            modified_at: row.get("modified_at"),
        })
    }

    fn row_to_payment(row: &PgRow) -> Result<TradePayment> {
        let state_code: i16 = row.get("state");
        let state = PaymentState::from_code(state_code).ok_or_else(|| {
            PaymentError::OperationFailed(format!("invalid payment state code: {}", state_code))
        })?;

        Ok(TradePayment {
            payment_id: row.get("payment_id"),
            trade_id: row.get("trade_id"),
            channel_id: row.get("channel_id"),
            account_id: row.get("account_id"),
            name: row.get("name"),
            amount: row.get("amount"),
            fee: row.get("fee"),
            state,
            description: row.get("description"),
            version: row.get("version"),
            created_at: row.get("created_at"),
            modified_at: row.get("modified_at"),
        })
    }
}
