//! Transaction reads and writes

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use super::transaction_filter::TransactionFilter;
use super::{format_timestamp, parse_timestamp, parse_uuid, Database};
use crate::error::Result;
use crate::models::Transaction;

/// Column list shared by every SELECT so the row mapper can't drift
const TRANSACTION_COLUMNS: &str = "t.id, t.owner_id, t.date, t.amount, t.kind, t.merchant, \
     t.account, t.category, t.category_confidence, t.category_source, t.notes, \
     t.import_batch_id, t.created_at, t.updated_at";

impl Database {
    /// Insert a transaction
    pub fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transactions (id, owner_id, date, amount, kind, merchant, account,
                                      category, category_confidence, category_source, notes,
                                      import_batch_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.id.to_string(),
                tx.owner_id.to_string(),
                tx.date.to_string(),
                tx.amount.to_string(),
                tx.kind.as_str(),
                tx.merchant,
                tx.account,
                tx.category,
                tx.category_confidence,
                tx.category_source.as_str(),
                tx.notes,
                tx.import_batch_id.map(|id| id.to_string()),
                format_timestamp(&tx.created_at),
                tx.updated_at.as_ref().map(format_timestamp),
            ],
        )?;

        Ok(())
    }

    /// Get a single live transaction by id, scoped to its owner
    ///
    /// Returns `None` for soft-deleted rows and for rows belonging to a
    /// different owner; the two cases are indistinguishable by design.
    pub fn get_transaction(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions t
             WHERE t.id = ? AND t.owner_id = ? AND t.deleted_at IS NULL"
        ))?;

        let transaction = stmt
            .query_row(
                params![id.to_string(), owner_id.to_string()],
                Self::row_to_transaction,
            )
            .optional()?;

        Ok(transaction)
    }

    /// Query transactions matching `filter`, ordered newest-first
    pub fn query_transactions(
        &self,
        owner_id: Uuid,
        filter: &TransactionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let built = filter.build(owner_id);
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions t {} {} LIMIT ? OFFSET ?",
            built.where_clause, built.order_clause
        );

        let mut query_params = built.into_params();
        query_params.push(Box::new(limit));
        query_params.push(Box::new(offset));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            query_params.iter().map(|p| p.as_ref()).collect();

        let transactions = stmt
            .query_map(params_refs.as_slice(), Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Count transactions matching `filter`, before any pagination
    pub fn count_transactions(&self, owner_id: Uuid, filter: &TransactionFilter) -> Result<i64> {
        let conn = self.conn()?;

        let built = filter.build(owner_id);
        let sql = built.build_count_query();

        let mut stmt = conn.prepare(&sql)?;
        let params_refs = built.params_refs();

        let count: i64 = stmt.query_row(params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    /// Fetch every live transaction for `owner_id` with a date in
    /// `[from, to]` inclusive. No pagination: summaries are exact, not
    /// sampled.
    pub fn transactions_in_range(
        &self,
        owner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let filter = TransactionFilter::new()
            .start_date(Some(from))
            .end_date(Some(to));

        let conn = self.conn()?;

        let built = filter.build(owner_id);
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions t {} {}",
            built.where_clause, built.order_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs = built.params_refs();

        let transactions = stmt
            .query_map(params_refs.as_slice(), Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Replace the mutable fields of a live transaction
    ///
    /// Returns `false` when no live row matched (absent, soft-deleted, or
    /// owned by someone else). Last writer wins on concurrent updates.
    pub fn update_transaction(&self, tx: &Transaction) -> Result<bool> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            UPDATE transactions
            SET date = ?, amount = ?, kind = ?, merchant = ?, account = ?,
                category = ?, category_confidence = ?, category_source = ?,
                notes = ?, updated_at = ?
            WHERE id = ? AND owner_id = ? AND deleted_at IS NULL
            "#,
            params![
                tx.date.to_string(),
                tx.amount.to_string(),
                tx.kind.as_str(),
                tx.merchant,
                tx.account,
                tx.category,
                tx.category_confidence,
                tx.category_source.as_str(),
                tx.notes,
                tx.updated_at.as_ref().map(format_timestamp),
                tx.id.to_string(),
                tx.owner_id.to_string(),
            ],
        )?;

        Ok(changed > 0)
    }

    /// Soft-delete a live transaction (sets `deleted_at`, never removes the
    /// row)
    ///
    /// Returns `false` when no live row matched, so a repeated delete of the
    /// same id reports not-found rather than re-deleting.
    pub fn soft_delete_transaction(
        &self,
        owner_id: Uuid,
        id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE transactions SET deleted_at = ?
             WHERE id = ? AND owner_id = ? AND deleted_at IS NULL",
            params![
                format_timestamp(&deleted_at),
                id.to_string(),
                owner_id.to_string()
            ],
        )?;

        if changed > 0 {
            debug!("Soft-deleted transaction {}", id);
        }

        Ok(changed > 0)
    }

    /// Helper to convert a row to Transaction
    /// Column order: id, owner_id, date, amount, kind, merchant, account,
    ///               category, category_confidence, category_source, notes,
    ///               import_batch_id, created_at, updated_at
    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let id: String = row.get(0)?;
        let owner_id: String = row.get(1)?;
        let date: String = row.get(2)?;
        let amount: String = row.get(3)?;
        let kind: String = row.get(4)?;
        let category_source: String = row.get(9)?;
        let import_batch_id: Option<String> = row.get(11)?;
        let created_at: String = row.get(12)?;
        let updated_at: Option<String> = row.get(13)?;

        Ok(Transaction {
            id: parse_uuid(0, &id)?,
            owner_id: parse_uuid(1, &owner_id)?,
            date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
            amount: amount
                .parse::<Decimal>()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
            kind: kind
                .parse()
                .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?,
            merchant: row.get(5)?,
            account: row.get(6)?,
            category: row.get(7)?,
            category_confidence: row.get(8)?,
            category_source: category_source
                .parse()
                .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, e.into()))?,
            notes: row.get(10)?,
            import_batch_id: import_batch_id
                .map(|s| parse_uuid(11, &s))
                .transpose()?,
            created_at: parse_timestamp(12, &created_at)?,
            updated_at: updated_at.map(|s| parse_timestamp(13, &s)).transpose()?,
        })
    }
}
