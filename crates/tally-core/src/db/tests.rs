//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, SubsecRound, Utc};
    use rust_decimal::Decimal;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// A live expense with sensible defaults; tests tweak fields as needed.
    fn base_tx(owner: Uuid) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            owner_id: owner,
            date: "2024-01-10".parse().unwrap(),
            amount: dec("10.00"),
            kind: TransactionKind::Expense,
            merchant: "Cafe".to_string(),
            account: "Checking".to_string(),
            category: None,
            category_confidence: None,
            category_source: CategorySource::None,
            notes: None,
            import_batch_id: None,
            created_at: Utc::now().trunc_subsecs(6),
            updated_at: None,
        }
    }

    #[test]
    fn test_transactions_schema_exists() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('transactions') WHERE name IN \
                 ('id', 'owner_id', 'date', 'amount', 'kind', 'merchant', 'account', \
                  'category', 'category_confidence', 'category_source', 'notes', \
                  'import_batch_id', 'created_at', 'updated_at', 'deleted_at')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(
            result, 15,
            "transactions table should have 15 expected columns"
        );
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        // Exercise every column, including the ones this core only loads.
        let tx = Transaction {
            date: "2023-11-02".parse().unwrap(),
            amount: dec("1234.56"),
            kind: TransactionKind::Income,
            merchant: "Employer".to_string(),
            account: "Savings".to_string(),
            category: Some("Salary".to_string()),
            category_confidence: Some(88),
            category_source: CategorySource::Automated,
            notes: Some("November paycheck".to_string()),
            import_batch_id: Some(Uuid::new_v4()),
            updated_at: Some(ts("2023-11-03T10:00:00.000001Z")),
            ..base_tx(owner)
        };

        db.insert_transaction(&tx).unwrap();

        let stored = db.get_transaction(owner, tx.id).unwrap().unwrap();
        assert_eq!(stored, tx);
    }

    #[test]
    fn test_get_is_owner_scoped_and_live_only() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        let tx = base_tx(owner);
        db.insert_transaction(&tx).unwrap();

        assert!(db.get_transaction(Uuid::new_v4(), tx.id).unwrap().is_none());
        assert!(db.get_transaction(owner, Uuid::new_v4()).unwrap().is_none());

        assert!(db
            .soft_delete_transaction(owner, tx.id, Utc::now())
            .unwrap());
        assert!(db.get_transaction(owner, tx.id).unwrap().is_none());
    }

    #[test]
    fn test_soft_delete_only_hits_live_rows() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        let tx = base_tx(owner);
        db.insert_transaction(&tx).unwrap();

        // Wrong owner deletes nothing.
        assert!(!db
            .soft_delete_transaction(Uuid::new_v4(), tx.id, Utc::now())
            .unwrap());

        assert!(db
            .soft_delete_transaction(owner, tx.id, Utc::now())
            .unwrap());
        // Already deleted: nothing left to delete.
        assert!(!db
            .soft_delete_transaction(owner, tx.id, Utc::now())
            .unwrap());

        // The row itself is still there.
        let conn = db.conn().unwrap();
        let raw_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM transactions WHERE id = ?",
                [tx.id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(raw_count, 1);
    }

    #[test]
    fn test_update_skips_deleted_rows() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        let mut tx = base_tx(owner);
        db.insert_transaction(&tx).unwrap();

        tx.merchant = "Bistro".to_string();
        tx.updated_at = Some(Utc::now().trunc_subsecs(6));
        assert!(db.update_transaction(&tx).unwrap());

        let stored = db.get_transaction(owner, tx.id).unwrap().unwrap();
        assert_eq!(stored.merchant, "Bistro");

        assert!(db
            .soft_delete_transaction(owner, tx.id, Utc::now())
            .unwrap());
        assert!(!db.update_transaction(&tx).unwrap());
    }

    #[test]
    fn test_query_orders_newest_first_with_created_at_tiebreak() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        let early = Transaction {
            date: "2024-01-10".parse().unwrap(),
            merchant: "First".to_string(),
            created_at: ts("2024-01-10T08:00:00.000000Z"),
            ..base_tx(owner)
        };
        let late = Transaction {
            date: "2024-01-10".parse().unwrap(),
            merchant: "Second".to_string(),
            created_at: ts("2024-01-10T09:30:00.000000Z"),
            ..base_tx(owner)
        };
        let newest_date = Transaction {
            date: "2024-01-12".parse().unwrap(),
            merchant: "Third".to_string(),
            created_at: ts("2024-01-12T07:00:00.000000Z"),
            ..base_tx(owner)
        };
        for tx in [&early, &late, &newest_date] {
            db.insert_transaction(tx).unwrap();
        }

        let filter = TransactionFilter::new();
        let result = db.query_transactions(owner, &filter, 10, 0).unwrap();

        let merchants: Vec<&str> = result.iter().map(|t| t.merchant.as_str()).collect();
        assert_eq!(merchants, ["Third", "Second", "First"]);

        // Same query, same order.
        let again = db.query_transactions(owner, &filter, 10, 0).unwrap();
        assert_eq!(result, again);
    }

    #[test]
    fn test_query_excludes_deleted_and_other_owners() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        let mine = base_tx(owner);
        let doomed = Transaction {
            merchant: "Doomed".to_string(),
            ..base_tx(owner)
        };
        let theirs = base_tx(Uuid::new_v4());
        for tx in [&mine, &doomed, &theirs] {
            db.insert_transaction(tx).unwrap();
        }
        assert!(db
            .soft_delete_transaction(owner, doomed.id, Utc::now())
            .unwrap());

        let filter = TransactionFilter::new();
        let result = db.query_transactions(owner, &filter, 10, 0).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, mine.id);
        assert_eq!(db.count_transactions(owner, &filter).unwrap(), 1);
    }

    #[test]
    fn test_date_range_filter_bounds_are_inclusive() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        for date in ["2024-01-31", "2024-02-01", "2024-02-29", "2024-03-01"] {
            db.insert_transaction(&Transaction {
                date: date.parse().unwrap(),
                ..base_tx(owner)
            })
            .unwrap();
        }

        let filter = TransactionFilter::new()
            .start_date(Some("2024-02-01".parse().unwrap()))
            .end_date(Some("2024-02-29".parse().unwrap()));

        let result = db.query_transactions(owner, &filter, 10, 0).unwrap();
        let dates: Vec<String> = result.iter().map(|t| t.date.to_string()).collect();
        assert_eq!(dates, ["2024-02-29", "2024-02-01"]);
    }

    #[test]
    fn test_account_filter_is_exact_and_case_sensitive() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        db.insert_transaction(&base_tx(owner)).unwrap();

        let miss = TransactionFilter::new().account(Some("checking"));
        assert_eq!(db.count_transactions(owner, &miss).unwrap(), 0);

        let prefix = TransactionFilter::new().account(Some("Check"));
        assert_eq!(db.count_transactions(owner, &prefix).unwrap(), 0);

        let hit = TransactionFilter::new().account(Some("Checking"));
        assert_eq!(db.count_transactions(owner, &hit).unwrap(), 1);
    }

    #[test]
    fn test_category_filter_is_exact() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        db.insert_transaction(&Transaction {
            category: Some("Food".to_string()),
            category_source: CategorySource::User,
            ..base_tx(owner)
        })
        .unwrap();
        db.insert_transaction(&base_tx(owner)).unwrap();

        let hit = TransactionFilter::new().category(Some("Food"));
        assert_eq!(db.count_transactions(owner, &hit).unwrap(), 1);

        let wrong_case = TransactionFilter::new().category(Some("food"));
        assert_eq!(db.count_transactions(owner, &wrong_case).unwrap(), 0);
    }

    #[test]
    fn test_merchant_filter_is_case_insensitive_substring() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        db.insert_transaction(&base_tx(owner)).unwrap(); // merchant "Cafe"
        db.insert_transaction(&Transaction {
            merchant: "Grocery Store".to_string(),
            ..base_tx(owner)
        })
        .unwrap();

        for pattern in ["caf", "CAF", "afe", "Cafe"] {
            let filter = TransactionFilter::new().merchant(Some(pattern));
            let result = db.query_transactions(owner, &filter, 10, 0).unwrap();
            assert_eq!(result.len(), 1, "pattern {:?}", pattern);
            assert_eq!(result[0].merchant, "Cafe");
        }

        let miss = TransactionFilter::new().merchant(Some("bakery"));
        assert_eq!(db.count_transactions(owner, &miss).unwrap(), 0);
    }

    #[test]
    fn test_kind_filter() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        db.insert_transaction(&base_tx(owner)).unwrap();
        db.insert_transaction(&Transaction {
            kind: TransactionKind::Income,
            merchant: "Employer".to_string(),
            ..base_tx(owner)
        })
        .unwrap();

        let income = TransactionFilter::new().kind(Some(TransactionKind::Income));
        let result = db.query_transactions(owner, &income, 10, 0).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, TransactionKind::Income);
    }

    #[test]
    fn test_blank_string_filters_are_ignored() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        db.insert_transaction(&base_tx(owner)).unwrap();

        // Blank or whitespace-only values mean "no filter", never
        // "match the empty string".
        let filter = TransactionFilter::new()
            .account(Some(""))
            .category(Some("   "))
            .merchant(Some(""));
        assert_eq!(db.count_transactions(owner, &filter).unwrap(), 1);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        db.insert_transaction(&Transaction {
            category: Some("Food".to_string()),
            category_source: CategorySource::User,
            ..base_tx(owner)
        })
        .unwrap();
        db.insert_transaction(&Transaction {
            account: "Savings".to_string(),
            category: Some("Food".to_string()),
            category_source: CategorySource::User,
            ..base_tx(owner)
        })
        .unwrap();

        let filter = TransactionFilter::new()
            .account(Some("Checking"))
            .category(Some("Food"))
            .merchant(Some("caf"))
            .kind(Some(TransactionKind::Expense));
        assert_eq!(db.count_transactions(owner, &filter).unwrap(), 1);

        let narrower = filter.kind(Some(TransactionKind::Income));
        assert_eq!(db.count_transactions(owner, &narrower).unwrap(), 0);
    }

    #[test]
    fn test_count_and_page_reflect_the_same_filter() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        for day in 1..=5 {
            db.insert_transaction(&Transaction {
                date: format!("2024-05-{:02}", day).parse().unwrap(),
                created_at: ts(&format!("2024-05-{:02}T12:00:00.000000Z", day)),
                ..base_tx(owner)
            })
            .unwrap();
        }

        let filter = TransactionFilter::new()
            .start_date(Some("2024-05-02".parse().unwrap()))
            .end_date(Some("2024-05-04".parse().unwrap()));

        assert_eq!(db.count_transactions(owner, &filter).unwrap(), 3);

        let first = db.query_transactions(owner, &filter, 2, 0).unwrap();
        let second = db.query_transactions(owner, &filter, 2, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);

        let dates: Vec<String> = first
            .iter()
            .chain(second.iter())
            .map(|t| t.date.to_string())
            .collect();
        assert_eq!(dates, ["2024-05-04", "2024-05-03", "2024-05-02"]);
    }

    #[test]
    fn test_transactions_in_range_is_live_and_inclusive() {
        let db = Database::in_memory().unwrap();
        let owner = Uuid::new_v4();

        let inside = Transaction {
            date: "2024-01-01".parse().unwrap(),
            ..base_tx(owner)
        };
        let edge = Transaction {
            date: "2024-01-31".parse().unwrap(),
            ..base_tx(owner)
        };
        let outside = Transaction {
            date: "2024-02-01".parse().unwrap(),
            ..base_tx(owner)
        };
        let doomed = Transaction {
            date: "2024-01-15".parse().unwrap(),
            ..base_tx(owner)
        };
        for tx in [&inside, &edge, &outside, &doomed] {
            db.insert_transaction(tx).unwrap();
        }
        assert!(db
            .soft_delete_transaction(owner, doomed.id, Utc::now())
            .unwrap());

        let result = db
            .transactions_in_range(
                owner,
                "2024-01-01".parse().unwrap(),
                "2024-01-31".parse().unwrap(),
            )
            .unwrap();

        let mut ids: Vec<Uuid> = result.iter().map(|t| t.id).collect();
        ids.sort();
        let mut expected = vec![inside.id, edge.id];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
