//! Domain models for Tally

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a transaction brings money in or takes it out
///
/// Amounts are always positive; direction is carried here, never by a
/// negative amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a transaction's category came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    /// No category set
    #[default]
    None,
    /// Category supplied by the owner
    User,
    /// Category assigned by automated categorization (not invoked by this
    /// core; the variant exists so stored rows from that path still load)
    Automated,
}

impl CategorySource {
    /// Derive the provenance tag from the presence of a caller-supplied
    /// category. Recomputed on every write; never trusted from the caller.
    pub fn from_category(category: Option<&str>) -> Self {
        if category.is_some() {
            Self::User
        } else {
            Self::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::User => "user",
            Self::Automated => "automated",
        }
    }
}

impl std::str::FromStr for CategorySource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "user" => Ok(Self::User),
            "automated" => Ok(Self::Automated),
            _ => Err(format!("Unknown category source: {}", s)),
        }
    }
}

impl std::fmt::Display for CategorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction
///
/// Every read is scoped to `owner_id`; soft-deleted rows never reach this
/// type, so the deletion timestamp lives only in the storage schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    /// The user this transaction belongs to; never changes
    pub owner_id: Uuid,
    /// Calendar date the transaction occurred (no time component)
    pub date: NaiveDate,
    /// Monetary value, always positive, fixed at 2 fractional digits
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub merchant: String,
    /// Free-text account bucket (not a foreign key)
    pub account: String,
    pub category: Option<String>,
    /// Set only by automated categorization; always `None` for user-set
    /// categories
    pub category_confidence: Option<i32>,
    pub category_source: CategorySource,
    pub notes: Option<String>,
    /// Import batch this transaction arrived in, if any (imports are handled
    /// by a separate service; this core only persists the link)
    pub import_batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// `None` until the first update
    pub updated_at: Option<DateTime<Utc>>,
}

/// Caller-supplied fields for creating or replacing a transaction
///
/// Updates are wholesale: every mutable field is replaced, there is no
/// partial-patch path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub merchant: String,
    pub account: String,
    pub category: Option<String>,
    pub notes: Option<String>,
}

/// One page of a transaction listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub page: u32,
    pub page_size: u32,
    /// Count of matching rows before pagination
    pub total_count: i64,
    pub total_pages: i64,
}

/// Financial summary over an inclusive date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    /// `total_income - total_expenses`, exact
    pub net_cash_flow: Decimal,
    pub transaction_count: i64,
    /// Unsigned sum of amounts per category; uncategorized rows excluded
    pub category_breakdown: BTreeMap<String, Decimal>,
    /// Signed net per account: income adds, expense subtracts
    pub account_breakdown: BTreeMap<String, Decimal>,
}
