//! Trade module
//!
//! Trade order, payment and fee records, their optimistic-concurrency
//! store, and the commit/cancel settlement orchestrator.

pub mod models;
pub mod settlement;
pub mod store;

pub use models::{
    ChannelType, Extensions, Fee, FeeUseFor, Payment, PaymentFee, PaymentResult, PaymentState,
    Refund, RefundPayment, TradeOrder, TradePayment, TradeState, TradeType,
};
pub use settlement::TradeSettlementOrchestrator;
pub use store::TradeStore;
