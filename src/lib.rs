//! fundcore - Fund-Custody Transactional Core
//!
//! The transactional heart of a multi-tenant fund-custody platform: it
//! owns customer fund accounts, records every money movement as an
//! immutable ledger entry, and settles multi-party trades (buyer pays,
//! seller receives, platform collects fees) as atomic, auditable units.
//!
//! # Modules
//!
//! - [`account`] - Fund accounts, the pure state machine, and the
//!   optimistic-concurrency account/fund store
//! - [`merchant`] - Merchant permits (profit/vouch/pledge accounts)
//! - [`stream`] - Ordered income/outgo fund transactions and the stream
//!   engine writing ledger entries plus balances
//! - [`permission`] - Trade permission guard with daily password-retry
//!   lockout over a best-effort counter store
//! - [`trade`] - Trade orders, payments, fees, and the commit/cancel
//!   settlement orchestrator
//! - [`service`] - The inbound operation surface, one database
//!   transaction per operation
//! - [`sequence`] - Monotonic payment id generation
//! - [`error`] - Error taxonomy with stable caller-facing codes

pub mod account;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod merchant;
pub mod password;
pub mod permission;
pub mod sequence;
pub mod service;
pub mod stream;
pub mod trade;

// Convenient re-exports at crate root
pub use account::{AccountFund, AccountState, AccountType, FundAccount, FundAccountStore,
    RegisterAccount};
pub use config::AppConfig;
pub use db::Database;
pub use error::{PaymentError, Result};
pub use merchant::{MerchantPermit, MerchantStore};
pub use permission::{MemoryCounterStore, RetryCounterStore, TradePermissionGuard};
pub use sequence::PaymentId;
pub use service::FundService;
pub use stream::{ActionType, FundChannel, FundStreamEngine, FundTransaction, FundType,
    TransactionStatus};
pub use trade::{
    ChannelType, Extensions, Fee, FeeUseFor, Payment, PaymentResult, PaymentState, Refund,
    TradeOrder, TradePayment, TradeSettlementOrchestrator, TradeState, TradeStore, TradeType,
};
