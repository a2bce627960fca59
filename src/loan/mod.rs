//! Informal loans to friends and the owed amount derived from them.

mod core;
mod create_endpoint;
mod edit_endpoint;
mod ledger_endpoint;
mod notify_endpoint;

pub use core::{
    AmountChange, LoanAmendment, LoanChange, LoanLedger, LoanOverview, amend_loan,
    create_loan, delete_loan, get_loan_entry, get_loan_ledger, get_loan_overview,
    record_repayment,
};
pub use create_endpoint::{create_loan_endpoint, repay_loan_endpoint};
pub use edit_endpoint::{amend_loan_endpoint, delete_loan_endpoint};
pub use ledger_endpoint::{get_friend_loans_endpoint, get_loan_overview_endpoint};
pub use notify_endpoint::{notify_friend_loans_endpoint, notify_loan_endpoint};
