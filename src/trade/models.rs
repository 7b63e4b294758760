//! Trade and payment data models

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::merchant::MerchantPermit;

/// Trade business types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum TradeType {
    Deposit = 10,
    Withdraw = 11,
    DirectTrade = 20,
    AuthTrade = 21,
    VouchTrade = 22,
    Transfer = 23,
    CancelTrade = 40,
    RefundTrade = 41,
}

impl TradeType {
    #[inline]
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            10 => Some(TradeType::Deposit),
            11 => Some(TradeType::Withdraw),
            20 => Some(TradeType::DirectTrade),
            21 => Some(TradeType::AuthTrade),
            22 => Some(TradeType::VouchTrade),
            23 => Some(TradeType::Transfer),
            40 => Some(TradeType::CancelTrade),
            41 => Some(TradeType::RefundTrade),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TradeType::Deposit => "account deposit",
            TradeType::Withdraw => "account withdrawal",
            TradeType::DirectTrade => "instant trade",
            TradeType::AuthTrade => "pre-authorized trade",
            TradeType::VouchTrade => "vouched trade",
            TradeType::Transfer => "account transfer",
            TradeType::CancelTrade => "trade cancellation",
            TradeType::RefundTrade => "trade refund",
        }
    }
}

/// Trade order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum TradeState {
    Pending = 1,
    Success = 2,
    Canceled = 3,
}

impl TradeState {
    #[inline]
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(TradeState::Pending),
            2 => Some(TradeState::Success),
            3 => Some(TradeState::Canceled),
            _ => None,
        }
    }
}

/// Payment record lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum PaymentState {
    Pending = 1,
    Success = 2,
    Canceled = 3,
}

impl PaymentState {
    #[inline]
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(PaymentState::Pending),
            2 => Some(PaymentState::Success),
            3 => Some(PaymentState::Canceled),
            _ => None,
        }
    }
}

/// Payment channels. Only fund-account channels settle instant trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum ChannelType {
    Cash = 1,
    Account = 4,
    EBank = 10,
}

impl ChannelType {
    #[inline]
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(ChannelType::Cash),
            4 => Some(ChannelType::Account),
            10 => Some(ChannelType::EBank),
            _ => None,
        }
    }

    /// Whether this channel supports instant trade settlement.
    pub fn for_trade(&self) -> bool {
        matches!(self, ChannelType::Cash | ChannelType::Account)
    }

    /// Channel lookup for trade settlement: unknown codes do not trade.
    pub fn supports_trade(code: i16) -> bool {
        Self::from_code(code).map(|c| c.for_trade()).unwrap_or(false)
    }
}

/// Which party a fee is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum FeeUseFor {
    Buyer = 1,
    Seller = 2,
}

impl FeeUseFor {
    #[inline]
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(FeeUseFor::Buyer),
            2 => Some(FeeUseFor::Seller),
            _ => None,
        }
    }
}

/// One fee charged within a settlement.
#[derive(Debug, Clone)]
pub struct Fee {
    pub use_for: FeeUseFor,
    pub amount: i64,
    pub type_code: i16,
    pub type_name: String,
}

impl Fee {
    pub fn of(use_for: FeeUseFor, amount: i64, type_code: i16, type_name: &str) -> Self {
        Self {
            use_for,
            amount,
            type_code,
            type_name: type_name.to_string(),
        }
    }

    #[inline]
    pub fn for_buyer(&self) -> bool {
        self.use_for == FeeUseFor::Buyer
    }

    #[inline]
    pub fn for_seller(&self) -> bool {
        self.use_for == FeeUseFor::Seller
    }
}

/// Keys of the closed extension set a request may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKey {
    Fees,
    MerchantPermit,
}

#[derive(Debug, Clone)]
enum ExtensionValue {
    Fees(Vec<Fee>),
    MerchantPermit(MerchantPermit),
}

/// Typed optional-extension bag: each known key maps to one fixed value
/// type, inserted and read only through the typed accessors.
#[derive(Debug, Clone, Default)]
pub struct Extensions {
    values: HashMap<ExtensionKey, ExtensionValue>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fees(mut self, fees: Vec<Fee>) -> Self {
        self.values
            .insert(ExtensionKey::Fees, ExtensionValue::Fees(fees));
        self
    }

    pub fn with_merchant_permit(mut self, permit: MerchantPermit) -> Self {
        self.values.insert(
            ExtensionKey::MerchantPermit,
            ExtensionValue::MerchantPermit(permit),
        );
        self
    }

    pub fn fees(&self) -> Option<&[Fee]> {
        match self.values.get(&ExtensionKey::Fees) {
            Some(ExtensionValue::Fees(fees)) => Some(fees),
            _ => None,
        }
    }

    pub fn merchant_permit(&self) -> Option<&MerchantPermit> {
        match self.values.get(&ExtensionKey::MerchantPermit) {
            Some(ExtensionValue::MerchantPermit(permit)) => Some(permit),
            _ => None,
        }
    }
}

/// A trade order between one seller and one buyer under a merchant.
/// Created upstream; mutated here only by compare-and-set.
#[derive(Debug, Clone)]
pub struct TradeOrder {
    pub trade_id: i64,
    pub trade_type: TradeType,
    /// Seller account.
    pub account_id: i64,
    pub mch_id: i64,
    pub amount: i64,
    /// Seller-side commission, written on commit.
    pub fee: i64,
    pub state: TradeState,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A payment attempt of one trade: one-to-one with a successful commit.
#[derive(Debug, Clone)]
pub struct TradePayment {
    pub payment_id: String,
    pub trade_id: i64,
    pub channel_id: i16,
    /// Buyer account.
    pub account_id: i64,
    pub name: String,
    pub amount: i64,
    /// Buyer-side commission.
    pub fee: i64,
    pub state: PaymentState,
    pub description: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Append-only record of one fee collected under a payment.
#[derive(Debug, Clone)]
pub struct PaymentFee {
    pub payment_id: String,
    pub use_for: FeeUseFor,
    pub amount: i64,
    pub type_code: i16,
    pub type_name: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentFee {
    pub fn of(payment_id: &str, fee: &Fee, when: DateTime<Utc>) -> Self {
        Self {
            payment_id: payment_id.to_string(),
            use_for: fee.use_for,
            amount: fee.amount,
            type_code: fee.type_code,
            type_name: fee.type_name.clone(),
            created_at: when,
        }
    }

    #[inline]
    pub fn for_buyer(&self) -> bool {
        self.use_for == FeeUseFor::Buyer
    }

    #[inline]
    pub fn for_seller(&self) -> bool {
        self.use_for == FeeUseFor::Seller
    }
}

/// Append-only record of one settlement reversal.
#[derive(Debug, Clone)]
pub struct RefundPayment {
    /// Payment id generated for the reversal itself.
    pub payment_id: String,
    /// Reversal kind: cancellation, refund or correction.
    pub refund_type: TradeType,
    pub trade_id: i64,
    /// Type of the reversed trade.
    pub trade_type: TradeType,
    pub amount: i64,
    pub fee: i64,
    pub state: TradeState,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// Payment request for committing a trade.
#[derive(Debug, Clone)]
pub struct Payment {
    pub channel_id: i16,
    /// Buyer account.
    pub account_id: i64,
    /// Plaintext trade password of the buyer.
    pub password: String,
    pub amount: i64,
    pub extensions: Extensions,
}

/// Cancellation/refund request. Settlement derives everything it needs
/// from the trade and its payment record; the fields here identify the
/// requesting side and carry optional extensions.
#[derive(Debug, Clone)]
pub struct Refund {
    pub account_id: i64,
    pub amount: i64,
    pub extensions: Extensions,
}

/// Compare-and-set payload for advancing a trade order.
#[derive(Debug, Clone)]
pub struct TradeStateDto {
    pub trade_id: i64,
    /// Seller-side commission to persist alongside the state, when known.
    pub fee: Option<i64>,
    pub state: TradeState,
    /// Version observed at read time.
    pub version: i32,
    pub when: DateTime<Utc>,
}

/// Compare-and-set payload for advancing a payment record.
#[derive(Debug, Clone)]
pub struct PaymentStateDto {
    pub payment_id: String,
    pub state: PaymentState,
    pub version: i32,
    pub when: DateTime<Utc>,
}

/// Result of one commit or cancel settlement.
#[derive(Debug, Clone)]
pub struct PaymentResult {
    pub code: i32,
    pub payment_id: String,
    pub status: crate::stream::TransactionStatus,
}

impl PaymentResult {
    pub const CODE_SUCCESS: i32 = 0;

    pub fn success(payment_id: String, status: crate::stream::TransactionStatus) -> Self {
        Self {
            code: Self::CODE_SUCCESS,
            payment_id,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_type_codes() {
        assert_eq!(TradeType::DirectTrade.code(), 20);
        assert_eq!(TradeType::CancelTrade.code(), 40);
        assert_eq!(TradeType::from_code(20), Some(TradeType::DirectTrade));
        assert_eq!(TradeType::from_code(99), None);
        assert_eq!(TradeType::DirectTrade.name(), "instant trade");
    }

    #[test]
    fn test_state_code_lookup() {
        assert_eq!(TradeState::from_code(1), Some(TradeState::Pending));
        assert_eq!(TradeState::from_code(2), Some(TradeState::Success));
        assert_eq!(TradeState::from_code(7), None);
        assert_eq!(PaymentState::from_code(3), Some(PaymentState::Canceled));
        assert_eq!(PaymentState::from_code(0), None);
    }

    #[test]
    fn test_channel_supports_trade() {
        assert!(ChannelType::supports_trade(ChannelType::Cash.code()));
        assert!(ChannelType::supports_trade(ChannelType::Account.code()));
        assert!(!ChannelType::supports_trade(ChannelType::EBank.code()));
        assert!(!ChannelType::supports_trade(77));
    }

    #[test]
    fn test_fee_sides() {
        let buyer_fee = Fee::of(FeeUseFor::Buyer, 100, 10, "trade commission");
        let seller_fee = Fee::of(FeeUseFor::Seller, 50, 10, "trade commission");
        assert!(buyer_fee.for_buyer() && !buyer_fee.for_seller());
        assert!(seller_fee.for_seller() && !seller_fee.for_buyer());
        assert_eq!(FeeUseFor::from_code(2), Some(FeeUseFor::Seller));
        assert_eq!(FeeUseFor::from_code(3), None);
    }

    #[test]
    fn test_extensions_typed_access() {
        let fees = vec![Fee::of(FeeUseFor::Buyer, 100, 10, "trade commission")];
        let permit = MerchantPermit {
            mch_id: 10,
            code: "M10".into(),
            profit_account: 9001,
            vouch_account: 9002,
            pledge_account: 9003,
        };
        let extensions = Extensions::new()
            .with_fees(fees)
            .with_merchant_permit(permit);

        assert_eq!(extensions.fees().unwrap().len(), 1);
        assert_eq!(extensions.merchant_permit().unwrap().profit_account, 9001);

        let empty = Extensions::new();
        assert!(empty.fees().is_none());
        assert!(empty.merchant_permit().is_none());
    }
}
