//! Transaction lifecycle and query engine
//!
//! [`Ledger`] is the entry point the (external) API layer calls: create,
//! get, list, update, soft delete, and summarize. Every operation takes the
//! owner id explicitly, so the engine holds no ambient per-request state and
//! multiple tenants can be exercised side by side in one process.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::{Database, TransactionFilter};
use crate::error::{Error, Result};
use crate::models::{CategorySource, NewTransaction, Summary, Transaction, TransactionPage};
use crate::summary::summarize;

/// Largest accepted page size for listings
pub const MAX_PAGE_SIZE: u32 = 100;

/// Current time at the precision the store round-trips.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Normalize a monetary amount to exactly 2 fractional digits.
fn normalize_amount(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount
}

/// Owner-scoped transaction operations over a shared [`Database`]
///
/// Stateless between calls; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Ledger {
    db: Database,
}

impl Ledger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a transaction for `owner_id` and return the persisted record.
    ///
    /// Assigns the id and creation timestamp, and derives the category
    /// provenance from whether a category was supplied. Field validation
    /// (lengths, positive amount, no future dates) belongs to the caller
    /// boundary and is not repeated here.
    pub fn create(&self, owner_id: Uuid, fields: NewTransaction) -> Result<Transaction> {
        let transaction = Transaction {
            id: Uuid::new_v4(),
            owner_id,
            date: fields.date,
            amount: normalize_amount(fields.amount),
            kind: fields.kind,
            merchant: fields.merchant,
            account: fields.account,
            category_source: CategorySource::from_category(fields.category.as_deref()),
            category: fields.category,
            category_confidence: None,
            notes: fields.notes,
            import_batch_id: None,
            created_at: now(),
            updated_at: None,
        };

        self.db.insert_transaction(&transaction)?;

        Ok(transaction)
    }

    /// Get a live transaction by id.
    ///
    /// `None` covers absent, soft-deleted, and other-owner rows alike; the
    /// read path does not treat a miss as an error.
    pub fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Transaction>> {
        self.db.get_transaction(owner_id, id)
    }

    /// List transactions matching `filter`, one page at a time.
    ///
    /// `page` starts at 1; `page_size` must be in `[1, MAX_PAGE_SIZE]`.
    /// Out-of-range values are rejected rather than silently clamped - the
    /// caller boundary owns any clamping policy. The returned `total_count`
    /// is computed with the identical filter before pagination, so page
    /// counts agree with what scanning every page would find.
    pub fn list(
        &self,
        owner_id: Uuid,
        filter: &TransactionFilter,
        page: u32,
        page_size: u32,
    ) -> Result<TransactionPage> {
        if page < 1 {
            return Err(Error::InvalidArgument(format!(
                "page must be at least 1, got {}",
                page
            )));
        }
        if page_size < 1 || page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }

        let offset = (page as i64 - 1) * page_size as i64;

        let total_count = self.db.count_transactions(owner_id, filter)?;
        let transactions =
            self.db
                .query_transactions(owner_id, filter, page_size as i64, offset)?;

        let total_pages = (total_count + page_size as i64 - 1) / page_size as i64;

        Ok(TransactionPage {
            transactions,
            page,
            page_size,
            total_count,
            total_pages,
        })
    }

    /// Replace every mutable field of a live transaction.
    ///
    /// No partial patch: the supplied fields overwrite the old ones
    /// wholesale, category provenance is re-derived, and any automated
    /// confidence is cleared. Fails with [`Error::NotFound`] when the id has
    /// no live row for this owner.
    pub fn update(&self, owner_id: Uuid, id: Uuid, fields: NewTransaction) -> Result<Transaction> {
        let mut transaction = self
            .db
            .get_transaction(owner_id, id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;

        transaction.date = fields.date;
        transaction.amount = normalize_amount(fields.amount);
        transaction.kind = fields.kind;
        transaction.merchant = fields.merchant;
        transaction.account = fields.account;
        transaction.category_source = CategorySource::from_category(fields.category.as_deref());
        transaction.category = fields.category;
        transaction.category_confidence = None;
        transaction.notes = fields.notes;
        transaction.updated_at = Some(now());

        if !self.db.update_transaction(&transaction)? {
            // Deleted between the read and the write.
            return Err(Error::NotFound(format!("transaction {}", id)));
        }

        Ok(transaction)
    }

    /// Soft-delete a transaction.
    ///
    /// Returns `true` when a live row was deleted, `false` when there was
    /// nothing to delete - including a second delete of the same id, which
    /// consistently reports not-found instead of erroring.
    pub fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
        self.db.soft_delete_transaction(owner_id, id, now())
    }

    /// Summarize the owner's transactions over `[start, end]` inclusive.
    ///
    /// The whole range is fetched without pagination and aggregated exactly;
    /// see [`crate::summary::summarize`] for the grouping semantics.
    pub fn summarize(&self, owner_id: Uuid, start: NaiveDate, end: NaiveDate) -> Result<Summary> {
        if start > end {
            return Err(Error::InvalidArgument(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }

        let transactions = self.db.transactions_in_range(owner_id, start, end)?;

        Ok(summarize(&transactions, start, end))
    }
}
