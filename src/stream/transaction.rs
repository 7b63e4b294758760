//! Fund transaction proposals
//!
//! A `FundTransaction` is an ephemeral, ordered list of income/outgo
//! movements against one account, opened through a `FundChannel` and
//! consumed exactly once by the stream engine. Finalization places income
//! movements before outgo movements (stable within each direction), so the
//! running balance recorded in the ledger never dips negative when the net
//! effect of the transaction is non-negative.

use chrono::{DateTime, Utc};

use crate::error::{PaymentError, Result};
use crate::trade::models::TradeType;

/// Direction of one fund movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum ActionType {
    Income = 1,
    Outgo = 2,
}

impl ActionType {
    #[inline]
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(ActionType::Income),
            2 => Some(ActionType::Outgo),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionType::Income => "income",
            ActionType::Outgo => "outgo",
        }
    }

    /// Settlement order: income settles before outgo.
    #[inline]
    fn apply_order(&self) -> u8 {
        match self {
            ActionType::Income => 0,
            ActionType::Outgo => 1,
        }
    }
}

/// Well-known fund type codes. Fee movements may carry merchant-defined
/// codes outside this table, so movements store raw code + label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum FundType {
    /// The traded principal.
    Fund = 1,
    /// Trade commission collected by the merchant.
    TradeFee = 10,
}

impl FundType {
    #[inline]
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(FundType::Fund),
            10 => Some(FundType::TradeFee),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FundType::Fund => "trade fund",
            FundType::TradeFee => "trade commission",
        }
    }
}

/// One income or outgo movement within a transaction.
#[derive(Debug, Clone)]
pub struct FundMovement {
    pub action: ActionType,
    pub amount: i64,
    pub type_code: i16,
    pub type_name: String,
}

/// Addressing of a fund stream: which account the movements are for and
/// which settlement (`payment_id`) they belong to.
#[derive(Debug, Clone)]
pub struct FundChannel {
    payment_id: String,
    account_id: i64,
    parent_id: i64,
}

impl FundChannel {
    pub fn of(payment_id: String, account_id: i64, parent_id: i64) -> Self {
        Self {
            payment_id,
            account_id,
            parent_id,
        }
    }

    /// Open an empty transaction proposal on this channel.
    pub fn open_transaction(&self, trade_type: TradeType, when: DateTime<Utc>) -> FundTransaction {
        FundTransaction {
            payment_id: self.payment_id.clone(),
            account_id: self.account_id,
            master_id: if self.parent_id == 0 {
                self.account_id
            } else {
                self.parent_id
            },
            trade_type,
            when,
            movements: Vec::new(),
        }
    }
}

/// An in-flight fund transaction: exists only for one submission.
#[derive(Debug, Clone)]
pub struct FundTransaction {
    pub payment_id: String,
    pub account_id: i64,
    /// The master account whose fund the movements apply to.
    pub master_id: i64,
    pub trade_type: TradeType,
    pub when: DateTime<Utc>,
    movements: Vec<FundMovement>,
}

impl FundTransaction {
    /// Record an income movement.
    pub fn income(&mut self, amount: i64, type_code: i16, type_name: &str) {
        self.movements.push(FundMovement {
            action: ActionType::Income,
            amount,
            type_code,
            type_name: type_name.to_string(),
        });
    }

    /// Record an outgo movement.
    pub fn outgo(&mut self, amount: i64, type_code: i16, type_name: &str) {
        self.movements.push(FundMovement {
            action: ActionType::Outgo,
            amount,
            type_code,
            type_name: type_name.to_string(),
        });
    }

    /// Finalize the proposal: validate movements and return them in
    /// settlement order, income before outgo. The engine applies this
    /// order verbatim.
    pub fn ordered_movements(&self) -> Result<Vec<FundMovement>> {
        if self.movements.is_empty() {
            return Err(PaymentError::IllegalArgument("no fund transaction".into()));
        }
        if let Some(movement) = self.movements.iter().find(|m| m.amount <= 0) {
            return Err(PaymentError::IllegalArgument(format!(
                "movement amount must be positive: {} {}",
                movement.action.name(),
                movement.amount
            )));
        }
        let mut ordered = self.movements.clone();
        ordered.sort_by_key(|m| m.action.apply_order());
        Ok(ordered)
    }
}

/// Outcome of one submitted fund transaction. Settlements link the legs of
/// one logical trade into a chain through `link`.
#[derive(Debug, Clone)]
pub struct TransactionStatus {
    pub account_id: i64,
    pub payment_id: String,
    pub trade_type: TradeType,
    /// Balance of the master fund after the whole transaction.
    pub balance: i64,
    pub when: DateTime<Utc>,
    pub relation: Option<Box<TransactionStatus>>,
}

impl TransactionStatus {
    /// Chain another leg of the same logical trade onto this status.
    pub fn link(&mut self, relation: TransactionStatus) {
        self.relation = Some(Box::new(relation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> FundTransaction {
        FundChannel::of("PAY1".into(), 1001, 0)
            .open_transaction(TradeType::DirectTrade, Utc::now())
    }

    #[test]
    fn test_action_type_codes() {
        assert_eq!(ActionType::Income.code(), 1);
        assert_eq!(ActionType::Outgo.code(), 2);
        assert_eq!(ActionType::from_code(2), Some(ActionType::Outgo));
        assert_eq!(ActionType::from_code(3), None);
    }

    #[test]
    fn test_fund_type_lookup() {
        assert_eq!(FundType::Fund.code(), 1);
        assert_eq!(FundType::from_code(10), Some(FundType::TradeFee));
        assert_eq!(FundType::from_code(99), None);
    }

    #[test]
    fn test_channel_resolves_master() {
        let tx = FundChannel::of("PAY1".into(), 2002, 1001)
            .open_transaction(TradeType::DirectTrade, Utc::now());
        assert_eq!(tx.account_id, 2002);
        assert_eq!(tx.master_id, 1001);

        let tx = open();
        assert_eq!(tx.master_id, 1001);
    }

    #[test]
    fn test_empty_transaction_rejected() {
        let tx = open();
        assert!(matches!(
            tx.ordered_movements(),
            Err(PaymentError::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut tx = open();
        tx.income(0, FundType::Fund.code(), FundType::Fund.name());
        assert!(tx.ordered_movements().is_err());

        let mut tx = open();
        tx.outgo(-5, FundType::Fund.code(), FundType::Fund.name());
        assert!(tx.ordered_movements().is_err());
    }

    #[test]
    fn test_income_ordered_before_outgo() {
        // Submission order: outgo first. Finalized order must still apply
        // all income ahead of any outgo.
        let mut tx = open();
        tx.outgo(5000, FundType::Fund.code(), FundType::Fund.name());
        tx.income(50, FundType::TradeFee.code(), FundType::TradeFee.name());
        tx.income(100, FundType::TradeFee.code(), FundType::TradeFee.name());

        let ordered = tx.ordered_movements().unwrap();
        let actions: Vec<ActionType> = ordered.iter().map(|m| m.action).collect();
        assert_eq!(
            actions,
            vec![ActionType::Income, ActionType::Income, ActionType::Outgo]
        );
        // Stable within a direction: 50 was recorded before 100.
        assert_eq!(ordered[0].amount, 50);
        assert_eq!(ordered[1].amount, 100);
    }

    #[test]
    fn test_status_link() {
        let mut buyer = TransactionStatus {
            account_id: 1,
            payment_id: "P".into(),
            trade_type: TradeType::DirectTrade,
            balance: 100,
            when: Utc::now(),
            relation: None,
        };
        let seller = TransactionStatus {
            account_id: 2,
            balance: 200,
            ..buyer.clone()
        };
        buyer.link(seller);
        assert_eq!(buyer.relation.as_ref().unwrap().account_id, 2);
    }
}
