//! Fund stream module
//!
//! The ordered income/outgo transaction model and the engine that turns a
//! proposal into ledger entries plus an updated balance.

pub mod engine;
pub mod transaction;

pub use engine::FundStreamEngine;
pub use transaction::{
    ActionType, FundChannel, FundMovement, FundTransaction, FundType, TransactionStatus,
};
