//! The ledger of money movements for each friend.
//!
//! This module contains everything related to ledger entries:
//! - The `Transaction` model and `TransactionBuilder` for creating entries
//! - Debits and credits against a friend's spendable balance
//! - The running total of today's debits
//! - Route handlers for debits, credits and reading the ledger

mod balance;
mod core;
mod credit_endpoint;
mod debit_endpoint;
mod ledger_endpoint;
mod today;

pub use balance::{BalanceChange, apply_balance_change};
pub use core::{
    Transaction, TransactionType, create_transaction, create_transaction_table,
    get_loan_entries_for_friend, get_transaction, get_transactions_for_friend,
};
pub use credit_endpoint::credit_endpoint;
pub use debit_endpoint::{BalanceChangeRequest, deduct_endpoint, send_endpoint};
pub use ledger_endpoint::get_ledger_endpoint;
pub use today::get_todays_spend;

#[cfg(test)]
pub use core::count_transactions_for_friend;
