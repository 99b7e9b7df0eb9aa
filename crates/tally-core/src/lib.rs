//! Tally Core Library
//!
//! Shared functionality for the Tally transaction ledger:
//! - Database access and migrations
//! - Dynamic filters for owner-scoped transaction queries
//! - Deterministic pagination with pre-pagination match counts
//! - Transaction lifecycle (create, wholesale update, soft delete)
//! - Exact date-range summaries (totals, category and account breakdowns)
//!
//! HTTP routing, authentication, and request validation live in the services
//! that consume this crate; every operation here takes the owner id
//! explicitly and trusts its inputs were validated at that boundary.

pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod summary;

pub use db::{Database, FilterResult, TransactionFilter};
pub use error::{Error, Result};
pub use ledger::{Ledger, MAX_PAGE_SIZE};
pub use models::{
    CategorySource, NewTransaction, Summary, Transaction, TransactionKind, TransactionPage,
};
pub use summary::summarize;
