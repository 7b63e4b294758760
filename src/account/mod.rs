//! Fund account module
//!
//! Account records, the pure state machine, and the optimistic-concurrency
//! store that owns all account and fund mutation.

pub mod models;
pub mod state_machine;
pub mod store;

pub use models::{AccountFund, AccountState, AccountType, FundAccount, RegisterAccount};
pub use store::FundAccountStore;
