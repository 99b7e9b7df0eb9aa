//! Date-range summary aggregation
//!
//! Pure computation over an already-resolved set of transactions: totals,
//! net cash flow, and the per-category / per-account breakdowns. All sums
//! are `Decimal`, so precision holds for any number of terms.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Summary, Transaction, TransactionKind};

/// Summarize `transactions` over `[start_date, end_date]`.
///
/// Callers are expected to have resolved the set with the same range; the
/// dates are echoed into the result, not re-checked here.
///
/// Grouping semantics:
/// - `category_breakdown` sums raw amounts per category (income and expense
///   amounts in the same category add, they do not offset); rows without a
///   category are left out entirely.
/// - `account_breakdown` sums signed amounts per account (`+` income,
///   `-` expense), giving each account's net position.
pub fn summarize(
    transactions: &[Transaction],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Summary {
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut category_breakdown: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut account_breakdown: BTreeMap<String, Decimal> = BTreeMap::new();

    for tx in transactions {
        let signed = match tx.kind {
            TransactionKind::Income => {
                total_income += tx.amount;
                tx.amount
            }
            TransactionKind::Expense => {
                total_expenses += tx.amount;
                -tx.amount
            }
        };

        if let Some(category) = &tx.category {
            *category_breakdown
                .entry(category.clone())
                .or_insert(Decimal::ZERO) += tx.amount;
        }

        *account_breakdown
            .entry(tx.account.clone())
            .or_insert(Decimal::ZERO) += signed;
    }

    Summary {
        start_date,
        end_date,
        total_income,
        total_expenses,
        net_cash_flow: total_income - total_expenses,
        transaction_count: transactions.len() as i64,
        category_breakdown,
        account_breakdown,
    }
}
