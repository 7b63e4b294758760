//! Trade settlement orchestrator
//!
//! Instant trade: funds settle immediately, with optional buyer-side and
//! seller-side commissions collected into the merchant's profit account.
//! Commit moves money buyer -> seller (+ fees -> merchant); cancel reverses
//! a previously successful commit exactly.
//!
//! Every settlement runs on one caller-owned database transaction: any
//! validation, permission or concurrency failure aborts all effects of the
//! attempt. Movement composition keeps income ahead of outgo on each leg so
//! the ledger never records a spurious negative running balance.

use chrono::Utc;
use sqlx::PgConnection;
use tracing::info;

use super::models::{
    ChannelType, Payment, PaymentFee, PaymentResult, PaymentState, PaymentStateDto, Refund,
    RefundPayment, TradeOrder, TradePayment, TradeState, TradeStateDto, TradeType,
};
use super::store::TradeStore;
use crate::account::FundAccountStore;
use crate::error::{PaymentError, Result};
use crate::merchant::MerchantStore;
use crate::permission::{self, TradePermissionGuard};
use crate::sequence::PaymentId;
use crate::stream::{FundChannel, FundStreamEngine, FundType};

pub struct TradeSettlementOrchestrator;

impl TradeSettlementOrchestrator {
    /// The trade type this orchestrator settles.
    pub fn supported_type() -> TradeType {
        TradeType::DirectTrade
    }

    /// Commit an instant trade: buyer pays, seller receives, the merchant
    /// profit account collects all fees.
    pub async fn commit(
        conn: &mut PgConnection,
        guard: &TradePermissionGuard,
        trade: &TradeOrder,
        payment: &Payment,
    ) -> Result<PaymentResult> {
        if trade.trade_type != Self::supported_type() {
            return Err(PaymentError::OperationNotAllowed(
                "trade type not supported by instant-trade settlement".into(),
            ));
        }
        if !ChannelType::supports_trade(payment.channel_id) {
            return Err(PaymentError::IllegalArgument(
                "channel does not support instant trade".into(),
            ));
        }
        if trade.account_id == payment.account_id {
            return Err(PaymentError::IllegalArgument(
                "buyer and seller cannot be the same account".into(),
            ));
        }
        let fees = payment.extensions.fees().unwrap_or_default();
        if let Some(fee) = fees.iter().find(|f| f.amount <= 0) {
            return Err(PaymentError::IllegalArgument(format!(
                "fee amount must be positive: {}",
                fee.amount
            )));
        }

        // Buyer side: password-checked permission, unlimited attempts.
        let now = Utc::now();
        let buyer = guard
            .check_with_password(conn, payment.account_id, &payment.password, -1)
            .await?;
        permission::check_trade_eligibility(conn, &buyer).await?;
        if buyer.mch_id != trade.mch_id {
            return Err(PaymentError::OperationNotAllowed(
                "cross-merchant trade is not allowed".into(),
            ));
        }

        let payment_id = PaymentId::new().to_string();

        // Buyer pays the trade amount plus any buyer-side fees.
        let buyer_channel = FundChannel::of(payment_id.clone(), buyer.account_id, buyer.parent_id);
        let mut buyer_tx = buyer_channel.open_transaction(trade.trade_type, now);
        buyer_tx.outgo(trade.amount, FundType::Fund.code(), FundType::Fund.name());
        for fee in fees.iter().filter(|f| f.for_buyer()) {
            buyer_tx.outgo(fee.amount, fee.type_code, &fee.type_name);
        }
        let mut status = FundStreamEngine::submit(conn, &buyer_tx).await?;

        // Seller side: state-only eligibility, the seller is not the actor.
        let seller = FundAccountStore::find_by_id(conn, trade.account_id).await?;
        permission::check_trade_eligibility(conn, &seller).await?;
        let seller_channel =
            FundChannel::of(payment_id.clone(), seller.account_id, seller.parent_id);
        let mut seller_tx = seller_channel.open_transaction(trade.trade_type, now);
        seller_tx.income(trade.amount, FundType::Fund.code(), FundType::Fund.name());
        for fee in fees.iter().filter(|f| f.for_seller()) {
            seller_tx.outgo(fee.amount, fee.type_code, &fee.type_name);
        }
        status.link(FundStreamEngine::submit(conn, &seller_tx).await?);

        // Merchant profit: fee collection is a side effect of settlement,
        // not a leg of the buyer<->seller transfer - left unlinked.
        if !fees.is_empty() {
            let merchant = payment.extensions.merchant_permit().ok_or_else(|| {
                PaymentError::IllegalArgument("merchant permit missed".into())
            })?;
            let merchant_channel = FundChannel::of(payment_id.clone(), merchant.profit_account, 0);
            let mut merchant_tx = merchant_channel.open_transaction(trade.trade_type, now);
            for fee in fees {
                merchant_tx.income(fee.amount, fee.type_code, &fee.type_name);
            }
            FundStreamEngine::submit(conn, &merchant_tx).await?;
        }

        // Seller-side commission lives on the trade order.
        let seller_fee: i64 = fees.iter().filter(|f| f.for_seller()).map(|f| f.amount).sum();
        let trade_state = TradeStateDto {
            trade_id: trade.trade_id,
            fee: Some(seller_fee),
            state: TradeState::Success,
            version: trade.version,
            when: now,
        };
        if !TradeStore::compare_and_set_trade_state(conn, &trade_state).await? {
            return Err(PaymentError::ConcurrentUpdate);
        }

        // Buyer-side commission lives on the payment record.
        let buyer_fee: i64 = fees.iter().filter(|f| f.for_buyer()).map(|f| f.amount).sum();
        let payment_record = TradePayment {
            payment_id: payment_id.clone(),
            trade_id: trade.trade_id,
            channel_id: payment.channel_id,
            account_id: payment.account_id,
            name: buyer.name.clone(),
            amount: payment.amount,
            fee: buyer_fee,
            state: PaymentState::Success,
            description: Some(TradeType::DirectTrade.name().to_string()),
            version: 0,
            created_at: now,
            modified_at: now,
        };
        TradeStore::insert_payment(conn, &payment_record).await?;
        if !fees.is_empty() {
            let fee_records: Vec<PaymentFee> = fees
                .iter()
                .map(|fee| PaymentFee::of(&payment_id, fee, now))
                .collect();
            TradeStore::insert_payment_fees(conn, &fee_records).await?;
        }

        info!(
            trade_id = trade.trade_id,
            payment_id = %payment_id,
            amount = trade.amount,
            buyer_fee,
            seller_fee,
            "instant trade committed"
        );
        Ok(PaymentResult::success(payment_id, status))
    }

    /// Cancel a previously successful instant trade: refund the trade
    /// amount and every collected fee, and advance payment and order to
    /// CANCELED.
    pub async fn cancel(
        conn: &mut PgConnection,
        guard: &TradePermissionGuard,
        trade: &TradeOrder,
        _cancel: &Refund,
    ) -> Result<PaymentResult> {
        if trade.state != TradeState::Success {
            return Err(PaymentError::OperationNotAllowed(
                "invalid trade state for cancellation".into(),
            ));
        }

        // Instant trade never splits payments: one trade, one payment row.
        let payment = TradeStore::find_payment_by_trade_id(conn, trade.trade_id)
            .await?
            .ok_or_else(|| PaymentError::ObjectNotFound("payment record not found".into()))?;

        // The refunding side is validated by state only: cancellation may
        // be system- or merchant-initiated and needs no password.
        let now = Utc::now();
        let seller = guard.check(conn, trade.account_id).await?;
        permission::check_trade_eligibility(conn, &seller).await?;
        let merchant = MerchantStore::find_permit_by_id(conn, trade.mch_id).await?;
        let payment_id = PaymentId::new().to_string();

        // Seller returns the trade amount and receives its fee refunds.
        // Income movements settle first, so the refunded fees land before
        // the outgoing amount and the running balance stays non-negative.
        let fees = TradeStore::find_payment_fees(conn, &payment.payment_id).await?;
        let seller_channel =
            FundChannel::of(payment_id.clone(), seller.account_id, seller.parent_id);
        let mut seller_tx = seller_channel.open_transaction(TradeType::CancelTrade, now);
        seller_tx.outgo(trade.amount, FundType::Fund.code(), FundType::Fund.name());
        for fee in fees.iter().filter(|f| f.for_seller()) {
            seller_tx.income(fee.amount, fee.type_code, &fee.type_name);
        }
        let mut status = FundStreamEngine::submit(conn, &seller_tx).await?;

        // Buyer receives its fee refunds and the trade amount back.
        let buyer = FundAccountStore::find_by_id(conn, payment.account_id).await?;
        permission::check_trade_eligibility(conn, &buyer).await?;
        let buyer_channel = FundChannel::of(payment_id.clone(), buyer.account_id, buyer.parent_id);
        let mut buyer_tx = buyer_channel.open_transaction(TradeType::CancelTrade, now);
        for fee in fees.iter().filter(|f| f.for_buyer()) {
            buyer_tx.income(fee.amount, fee.type_code, &fee.type_name);
        }
        buyer_tx.income(trade.amount, FundType::Fund.code(), FundType::Fund.name());
        status.link(FundStreamEngine::submit(conn, &buyer_tx).await?);

        // Fees go back to the parties, debited from merchant profit.
        if !fees.is_empty() {
            let merchant_channel = FundChannel::of(payment_id.clone(), merchant.profit_account, 0);
            let mut merchant_tx = merchant_channel.open_transaction(TradeType::CancelTrade, now);
            for fee in &fees {
                merchant_tx.outgo(fee.amount, fee.type_code, &fee.type_name);
            }
            FundStreamEngine::submit(conn, &merchant_tx).await?;
        }

        let refund = RefundPayment {
            payment_id: payment_id.clone(),
            refund_type: TradeType::CancelTrade,
            trade_id: trade.trade_id,
            trade_type: trade.trade_type,
            amount: trade.amount,
            fee: 0,
            state: TradeState::Success,
            version: 0,
            created_at: now,
        };
        TradeStore::insert_refund(conn, &refund).await?;

        let payment_state = PaymentStateDto {
            payment_id: payment.payment_id.clone(),
            state: PaymentState::Canceled,
            version: payment.version,
            when: now,
        };
        if !TradeStore::compare_and_set_payment_state(conn, &payment_state).await? {
            return Err(PaymentError::ConcurrentUpdate);
        }

        let trade_state = TradeStateDto {
            trade_id: trade.trade_id,
            fee: None,
            state: TradeState::Canceled,
            version: trade.version,
            when: now,
        };
        if !TradeStore::compare_and_set_trade_state(conn, &trade_state).await? {
            return Err(PaymentError::ConcurrentUpdate);
        }

        info!(
            trade_id = trade.trade_id,
            payment_id = %payment_id,
            amount = trade.amount,
            "instant trade canceled"
        );
        Ok(PaymentResult::success(payment_id, status))
    }
}
