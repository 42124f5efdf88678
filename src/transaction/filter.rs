//! Narrow a list of transactions down to the ones matching a set of filters.

use serde::Deserialize;
use time::Date;

use crate::transaction::core::{Category, Transaction, TransactionKind};

/// The filters the transaction list can be narrowed by.
///
/// `None` and an empty search mean "any". A transaction is kept only if it
/// matches every filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionFilter {
    /// Keep only income or only expenses.
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    /// Keep only transactions in this category.
    #[serde(default)]
    pub category: Option<Category>,
    /// Keep only transactions whose description contains this text, ignoring case.
    #[serde(default)]
    pub search: String,
    /// Keep only transactions that occurred on this day.
    #[serde(default)]
    pub date: Option<Date>,
}

impl TransactionFilter {
    /// Whether this filter keeps every transaction.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.category.is_none()
            && self.search.is_empty()
            && self.date.is_none()
    }

    fn matches(&self, transaction: &Transaction, search: &str) -> bool {
        self.kind.is_none_or(|kind| transaction.kind == kind)
            && self
                .category
                .is_none_or(|category| transaction.category == category)
            && (search.is_empty() || transaction.description.to_lowercase().contains(search))
            && self.date.is_none_or(|date| transaction.occurred_on == date)
    }
}

/// Return the transactions that match `filter`, in their original order.
pub fn filter_transactions(
    transactions: &[Transaction],
    filter: &TransactionFilter,
) -> Vec<Transaction> {
    let search = filter.search.to_lowercase();

    transactions
        .iter()
        .filter(|transaction| filter.matches(transaction, &search))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use axum_extra::extract::Query;
    use rust_decimal::Decimal;
    use time::{Date, OffsetDateTime, macros::date};

    use crate::{
        auth::UserId,
        transaction::core::{Category, Transaction, TransactionId, TransactionKind},
    };

    use super::{TransactionFilter, filter_transactions};

    fn transaction(
        id: i64,
        kind: TransactionKind,
        description: &str,
        category: Category,
        occurred_on: Date,
    ) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            kind,
            description: description.to_owned(),
            amount: Decimal::new(id * 10, 0),
            category,
            occurred_on,
            owner_id: UserId::new("alice"),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn example_transactions() -> Vec<Transaction> {
        vec![
            transaction(
                1,
                TransactionKind::Expense,
                "Groceries",
                Category::Food,
                date!(2024 - 03 - 01),
            ),
            transaction(
                2,
                TransactionKind::Income,
                "Salary",
                Category::Work,
                date!(2024 - 03 - 15),
            ),
            transaction(
                3,
                TransactionKind::Expense,
                "Bus pass",
                Category::Transport,
                date!(2024 - 04 - 02),
            ),
        ]
    }

    fn ids(transactions: &[Transaction]) -> Vec<i64> {
        transactions
            .iter()
            .map(|transaction| transaction.id.as_i64())
            .collect()
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let transactions = example_transactions();
        let filter = TransactionFilter::default();

        assert!(filter.is_empty());
        assert_eq!(filter_transactions(&transactions, &filter), transactions);
    }

    #[test]
    fn expense_filter_keeps_expenses_in_order() {
        let filter = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            ..Default::default()
        };

        let got = filter_transactions(&example_transactions(), &filter);

        assert_eq!(ids(&got), vec![1, 3]);
    }

    #[test]
    fn category_filter() {
        let filter = TransactionFilter {
            category: Some(Category::Work),
            ..Default::default()
        };

        let got = filter_transactions(&example_transactions(), &filter);

        assert_eq!(ids(&got), vec![2]);
    }

    #[test]
    fn search_ignores_case() {
        let filter = TransactionFilter {
            search: "BUS".to_owned(),
            ..Default::default()
        };

        let got = filter_transactions(&example_transactions(), &filter);

        assert_eq!(ids(&got), vec![3]);
    }

    #[test]
    fn search_ignores_case_for_non_ascii_text() {
        let transactions = vec![transaction(
            1,
            TransactionKind::Expense,
            "Padaria: pão francês",
            Category::Food,
            date!(2024 - 03 - 01),
        )];
        let filter = TransactionFilter {
            search: "PÃO".to_owned(),
            ..Default::default()
        };

        let got = filter_transactions(&transactions, &filter);

        assert_eq!(ids(&got), vec![1]);
    }

    #[test]
    fn date_filter_matches_exact_day() {
        let filter = TransactionFilter {
            date: Some(date!(2024 - 03 - 15)),
            ..Default::default()
        };

        let got = filter_transactions(&example_transactions(), &filter);

        assert_eq!(ids(&got), vec![2]);
    }

    #[test]
    fn filters_combine_as_conjunction() {
        let filter = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            category: Some(Category::Work),
            ..Default::default()
        };

        let got = filter_transactions(&example_transactions(), &filter);

        assert!(got.is_empty());
    }

    #[test]
    fn filtering_twice_gives_the_same_result() {
        let filter = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            search: "s".to_owned(),
            ..Default::default()
        };

        let once = filter_transactions(&example_transactions(), &filter);
        let twice = filter_transactions(&once, &filter);

        assert_eq!(once, twice);
    }

    fn parse_query(uri: &str) -> TransactionFilter {
        let Query(filter) = Query::<TransactionFilter>::try_from_uri(&uri.parse().unwrap())
            .unwrap_or_else(|rejection| panic!("could not parse {uri}: {rejection}"));
        filter
    }

    #[test]
    fn empty_query_values_mean_any() {
        let filter = parse_query("/transactions?kind=&category=&search=&date=");

        assert_eq!(filter, TransactionFilter::default());
        assert!(filter.is_empty());
    }

    #[test]
    fn query_values_are_parsed() {
        let filter =
            parse_query("/transactions?kind=income&category=work&search=sal&date=2024-03-15");

        assert_eq!(
            filter,
            TransactionFilter {
                kind: Some(TransactionKind::Income),
                category: Some(Category::Work),
                search: "sal".to_owned(),
                date: Some(date!(2024 - 03 - 15)),
            }
        );
    }
}
