//! The deposit/withdraw ledger.
//!
//! This module contains everything related to ledger transactions:
//! - The `Transaction` model and the `Deposit`/`Withdraw` kind enum
//! - Database functions for appending and querying transactions
//! - The deposit and withdraw state transitions with their validation

mod core;
mod operations;

pub use core::{
    NewTransaction, Transaction, TransactionKind, count_transactions, create_transaction_table,
    map_transaction_row, record_transaction, transactions_for_goal,
};
pub use operations::{DepositOutcome, deposit, withdraw};
