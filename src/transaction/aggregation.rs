//! Totals and monthly buckets derived from a list of transactions.
//!
//! Everything here is a pure function of its inputs. Nothing is cached, so
//! the balance is always `income - expense` for the list it was computed from.
//! Sums saturate at [Decimal::MAX] instead of overflowing.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use time::Month;

use crate::transaction::core::{Transaction, TransactionKind};

/// Income and expense sums for a list of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sum of the amounts of all income transactions.
    pub income: Decimal,
    /// Sum of the amounts of all expense transactions.
    pub expense: Decimal,
}

impl Totals {
    /// Income minus expenses.
    pub fn balance(&self) -> Decimal {
        self.income.saturating_sub(self.expense)
    }

    fn add(&mut self, transaction: &Transaction) {
        match transaction.kind {
            TransactionKind::Income => {
                self.income = self.income.saturating_add(transaction.amount);
            }
            TransactionKind::Expense => {
                self.expense = self.expense.saturating_add(transaction.amount);
            }
        }
    }
}

/// Sum the income and expenses in `transactions`.
pub fn totals(transactions: &[Transaction]) -> Totals {
    transactions
        .iter()
        .fold(Totals::default(), |mut totals, transaction| {
            totals.add(transaction);
            totals
        })
}

/// The income and expense sums for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyBucket {
    /// The month this bucket covers.
    pub month: Month,
    /// Sum of income in the month.
    pub income: Decimal,
    /// Sum of expenses in the month.
    pub expense: Decimal,
}

impl MonthlyBucket {
    fn empty(month: Month) -> Self {
        Self {
            month,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        }
    }
}

/// Sum income and expenses per month for the transactions that occurred in `year`.
///
/// Always returns twelve buckets, January first. Months without transactions
/// are zero.
pub fn monthly_buckets(transactions: &[Transaction], year: i32) -> [MonthlyBucket; 12] {
    let mut month = Month::January;
    let mut buckets = [MonthlyBucket::empty(Month::January); 12];
    for bucket in &mut buckets {
        *bucket = MonthlyBucket::empty(month);
        month = month.next();
    }

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.occurred_on.year() == year)
    {
        let bucket = &mut buckets[transaction.occurred_on.month() as usize - 1];

        match transaction.kind {
            TransactionKind::Income => {
                bucket.income = bucket.income.saturating_add(transaction.amount);
            }
            TransactionKind::Expense => {
                bucket.expense = bucket.expense.saturating_add(transaction.amount);
            }
        }
    }

    buckets
}

/// The distinct years that transactions occurred in, oldest first.
pub fn years_with_transactions(transactions: &[Transaction]) -> Vec<i32> {
    transactions
        .iter()
        .map(|transaction| transaction.occurred_on.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::{Date, Month, OffsetDateTime, macros::date};

    use crate::{
        auth::UserId,
        transaction::core::{Category, Transaction, TransactionId, TransactionKind},
    };

    use super::{monthly_buckets, totals, years_with_transactions};

    fn transaction(
        id: i64,
        kind: TransactionKind,
        amount: i64,
        category: Category,
        occurred_on: Date,
    ) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            kind,
            description: format!("transaction {id}"),
            amount: Decimal::new(amount, 0),
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
                50,
                Category::Food,
                date!(2024 - 03 - 01),
            ),
            transaction(
                2,
                TransactionKind::Income,
                200,
                Category::Work,
                date!(2024 - 03 - 15),
            ),
            transaction(
                3,
                TransactionKind::Expense,
                30,
                Category::Transport,
                date!(2024 - 04 - 02),
            ),
        ]
    }

    #[test]
    fn totals_for_example_transactions() {
        let totals = totals(&example_transactions());

        assert_eq!(totals.income, Decimal::new(200, 0));
        assert_eq!(totals.expense, Decimal::new(80, 0));
        assert_eq!(totals.balance(), Decimal::new(120, 0));
    }

    #[test]
    fn monthly_buckets_for_example_transactions() {
        let buckets = monthly_buckets(&example_transactions(), 2024);

        assert_eq!(buckets[2].month, Month::March);
        assert_eq!(buckets[2].income, Decimal::new(200, 0));
        assert_eq!(buckets[2].expense, Decimal::new(50, 0));
        assert_eq!(buckets[3].month, Month::April);
        assert_eq!(buckets[3].income, Decimal::ZERO);
        assert_eq!(buckets[3].expense, Decimal::new(30, 0));

        for (index, bucket) in buckets.iter().enumerate() {
            if index == 2 || index == 3 {
                continue;
            }

            assert_eq!(bucket.income, Decimal::ZERO, "income in {}", bucket.month);
            assert_eq!(bucket.expense, Decimal::ZERO, "expense in {}", bucket.month);
        }
    }

    #[test]
    fn buckets_are_in_calendar_order() {
        let buckets = monthly_buckets(&[], 2024);

        assert_eq!(buckets[0].month, Month::January);
        assert_eq!(buckets[11].month, Month::December);
    }

    #[test]
    fn empty_input_gives_zero_totals_and_buckets() {
        let totals = totals(&[]);
        let buckets = monthly_buckets(&[], 2024);

        assert_eq!(totals.income, Decimal::ZERO);
        assert_eq!(totals.expense, Decimal::ZERO);
        assert_eq!(totals.balance(), Decimal::ZERO);
        assert_eq!(buckets.len(), 12);
        assert!(
            buckets
                .iter()
                .all(|bucket| bucket.income.is_zero() && bucket.expense.is_zero())
        );
    }

    #[test]
    fn year_without_transactions_gives_zero_buckets() {
        let buckets = monthly_buckets(&example_transactions(), 1999);

        assert!(
            buckets
                .iter()
                .all(|bucket| bucket.income.is_zero() && bucket.expense.is_zero())
        );
    }

    #[test]
    fn monthly_income_sums_to_income_for_the_year() {
        let mut transactions = example_transactions();
        transactions.push(transaction(
            4,
            TransactionKind::Income,
            1000,
            Category::Work,
            date!(2023 - 12 - 31),
        ));
        transactions.push(transaction(
            5,
            TransactionKind::Income,
            15,
            Category::Other,
            date!(2024 - 12 - 31),
        ));

        let in_2024: Vec<_> = transactions
            .iter()
            .filter(|transaction| transaction.occurred_on.year() == 2024)
            .cloned()
            .collect();
        let bucket_income: Decimal = monthly_buckets(&transactions, 2024)
            .iter()
            .map(|bucket| bucket.income)
            .sum();

        assert_eq!(bucket_income, totals(&in_2024).income);
        assert_eq!(bucket_income, Decimal::new(215, 0));
    }

    #[test]
    fn balance_is_exact_for_fractional_amounts() {
        let mut transactions = Vec::new();
        for id in 0..10 {
            let mut income = transaction(
                id,
                TransactionKind::Income,
                0,
                Category::Work,
                date!(2024 - 01 - 01),
            );
            income.amount = Decimal::new(10, 2);
            transactions.push(income);
        }
        let mut expense = transaction(
            10,
            TransactionKind::Expense,
            0,
            Category::Food,
            date!(2024 - 01 - 01),
        );
        expense.amount = Decimal::new(30, 2);
        transactions.push(expense);

        let totals = totals(&transactions);

        assert_eq!(totals.income, Decimal::ONE);
        assert_eq!(totals.balance(), totals.income - totals.expense);
        assert_eq!(totals.balance(), Decimal::new(70, 2));
    }

    #[test]
    fn totals_do_not_depend_on_order() {
        let mut transactions = example_transactions();
        let forwards = totals(&transactions);
        transactions.reverse();

        assert_eq!(totals(&transactions), forwards);
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let mut transactions = Vec::new();
        for (id, kind) in [
            (1, TransactionKind::Income),
            (2, TransactionKind::Income),
            (3, TransactionKind::Expense),
            (4, TransactionKind::Expense),
        ] {
            let mut huge = transaction(id, kind, 0, Category::Other, date!(2024 - 05 - 01));
            huge.amount = Decimal::MAX;
            transactions.push(huge);
        }

        let totals = totals(&transactions);
        let buckets = monthly_buckets(&transactions, 2024);

        assert_eq!(totals.income, Decimal::MAX);
        assert_eq!(totals.expense, Decimal::MAX);
        assert_eq!(totals.balance(), Decimal::ZERO);
        assert_eq!(buckets[4].income, Decimal::MAX);
        assert_eq!(buckets[4].expense, Decimal::MAX);
    }

    #[test]
    fn years_are_distinct_and_ascending() {
        let mut transactions = example_transactions();
        transactions.push(transaction(
            4,
            TransactionKind::Income,
            1,
            Category::Work,
            date!(2021 - 06 - 01),
        ));

        assert_eq!(years_with_transactions(&transactions), vec![2021, 2024]);
        assert!(years_with_transactions(&[]).is_empty());
    }
}
