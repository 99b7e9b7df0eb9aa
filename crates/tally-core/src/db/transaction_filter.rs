//! Transaction filter builder for constructing dynamic SQL queries
//!
//! This module provides a builder pattern for constructing WHERE clauses
//! and parameters for transaction queries. The page query and the count
//! query are built from the same filter, so they can never disagree on
//! which rows match.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::TransactionKind;

/// Builder for constructing transaction query filters
///
/// Every constraint is optional; present constraints are AND-ed. Owner
/// scoping and the live-rows-only predicate are not optional: `build`
/// bakes both into every query this produces, which keeps the
/// exclude-deleted rule at a single choke point.
///
/// The lifetime `'query` represents how long the string filter values
/// (account, category, merchant) must remain valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter<'query> {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub account: Option<&'query str>,
    pub category: Option<&'query str>,
    pub merchant: Option<&'query str>,
    pub kind: Option<TransactionKind>,
}

/// Result of building a filter - contains SQL components and parameters
pub struct FilterResult {
    /// WHERE clause including the "WHERE" keyword (never empty: owner
    /// scoping and soft-delete exclusion are always present)
    pub where_clause: String,
    /// ORDER BY clause; the listing order is fixed and stable across pages
    pub order_clause: &'static str,
    /// Parameters for the query (boxed for rusqlite compatibility)
    pub params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl<'query> TransactionFilter<'query> {
    /// Create a new filter with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Include transactions dated on or after `date`
    pub fn start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = date;
        self
    }

    /// Include transactions dated on or before `date`
    pub fn end_date(mut self, date: Option<NaiveDate>) -> Self {
        self.end_date = date;
        self
    }

    /// Set account filter (exact, case-sensitive match)
    ///
    /// A blank string is treated as "not set", matching the observed
    /// behavior of the service this replaces.
    pub fn account(mut self, account: Option<&'query str>) -> Self {
        self.account = account;
        self
    }

    /// Set category filter (exact, case-sensitive match; blank = not set)
    pub fn category(mut self, category: Option<&'query str>) -> Self {
        self.category = category;
        self
    }

    /// Set merchant filter (case-insensitive substring match; blank = not set)
    pub fn merchant(mut self, merchant: Option<&'query str>) -> Self {
        self.merchant = merchant;
        self
    }

    /// Set kind filter (income or expense)
    pub fn kind(mut self, kind: Option<TransactionKind>) -> Self {
        self.kind = kind;
        self
    }

    /// Build the filter components for `owner_id`'s ledger
    pub fn build(&self, owner_id: Uuid) -> FilterResult {
        let mut conditions = vec![
            "t.owner_id = ?".to_string(),
            "t.deleted_at IS NULL".to_string(),
        ];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id.to_string())];

        if let Some(date) = self.start_date {
            conditions.push("t.date >= ?".to_string());
            params.push(Box::new(date.to_string()));
        }

        if let Some(date) = self.end_date {
            conditions.push("t.date <= ?".to_string());
            params.push(Box::new(date.to_string()));
        }

        if let Some(account) = self.account {
            if !account.trim().is_empty() {
                conditions.push("t.account = ?".to_string());
                params.push(Box::new(account.to_string()));
            }
        }

        if let Some(category) = self.category {
            if !category.trim().is_empty() {
                conditions.push("t.category = ?".to_string());
                params.push(Box::new(category.to_string()));
            }
        }

        if let Some(merchant) = self.merchant {
            if !merchant.trim().is_empty() {
                conditions.push("t.merchant LIKE ? COLLATE NOCASE".to_string());
                params.push(Box::new(format!("%{}%", merchant)));
            }
        }

        if let Some(kind) = self.kind {
            conditions.push("t.kind = ?".to_string());
            params.push(Box::new(kind.as_str().to_string()));
        }

        FilterResult {
            where_clause: format!("WHERE {}", conditions.join(" AND ")),
            // Newest date first, ties broken by most recent creation; the
            // trailing id keeps the order total when both collide.
            order_clause: "ORDER BY t.date DESC, t.created_at DESC, t.id DESC",
            params,
        }
    }
}

impl FilterResult {
    /// Build a COUNT query over the same matching rows
    pub fn build_count_query(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM transactions t {}",
            self.where_clause
        )
    }

    /// Get parameter references for query execution
    pub fn params_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }

    /// Get the parameter vector to append pagination params
    pub fn into_params(self) -> Vec<Box<dyn rusqlite::ToSql>> {
        self.params
    }
}
