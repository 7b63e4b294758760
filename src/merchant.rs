//! Merchant records
//!
//! A merchant owns the platform-side accounts a settlement touches: the
//! profit account collecting fees, plus vouch and pledge accounts carried
//! for guarantee-style trades (loaded but not consulted by instant-trade
//! settlement).

use sqlx::{PgConnection, Row};

use crate::error::{PaymentError, Result};

/// Merchant permit: the per-merchant settlement parameters.
#[derive(Debug, Clone)]
pub struct MerchantPermit {
    pub mch_id: i64,
    pub code: String,
    /// Account receiving trade fees.
    pub profit_account: i64,
    pub vouch_account: i64,
    pub pledge_account: i64,
}

pub struct MerchantStore;

impl MerchantStore {
    /// Load the permit of a registered merchant.
    pub async fn find_permit_by_id(conn: &mut PgConnection, mch_id: i64) -> Result<MerchantPermit> {
        let row = sqlx::query(
            r#"
            SELECT mch_id, code, profit_account, vouch_account, pledge_account
            FROM merchants_tb
            WHERE mch_id = $1
            "#,
        )
        .bind(mch_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|r| MerchantPermit {
            mch_id: r.get("mch_id"),
            code: r.get("code"),
            profit_account: r.get("profit_account"),
            vouch_account: r.get("vouch_account"),
            pledge_account: r.get("pledge_account"),
        })
        .ok_or_else(|| PaymentError::ObjectNotFound("merchant not registered".into()))
    }
}
