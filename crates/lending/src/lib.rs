//! `familib-lending` — the Lending Ledger.
//!
//! Owns the rules for creating a loan, returning a loan, and keeping a
//! book's availability flag synchronized with loan state, given stores that
//! offer per-row atomic updates but no cross-table transactions.

pub mod ledger;
pub mod loan;
pub mod store;

pub use ledger::{LedgerError, LendingLedger, OpenLoan, ReturnOutcome};
pub use loan::{CreateLoan, Loan};
pub use store::LoanStore;
