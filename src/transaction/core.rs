//! Defines the core data models and database schema for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, auth::UserId};

// ============================================================================
// MODELS
// ============================================================================

/// The store assigned ID of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(i64);

impl TransactionId {
    /// Wrap a raw database ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw database ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for TransactionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for TransactionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(TransactionId)
    }
}

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// All kinds in display order.
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Income, TransactionKind::Expense];

    /// The value used in forms, query strings and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == slug)
    }
}

/// The closed set of categories a transaction can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Groceries, restaurants and the like.
    Food,
    /// Public transport, fuel, car costs.
    Transport,
    /// Rent, mortgage, utilities.
    Housing,
    /// Medical costs and insurance.
    Health,
    /// Courses, books, tuition.
    Education,
    /// Entertainment and hobbies.
    Leisure,
    /// Salary and other work related money.
    Work,
    /// Anything else.
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Transport,
        Category::Housing,
        Category::Health,
        Category::Education,
        Category::Leisure,
        Category::Work,
        Category::Other,
    ];

    /// The value used in forms, query strings and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Housing => "housing",
            Category::Health => "health",
            Category::Education => "education",
            Category::Leisure => "leisure",
            Category::Work => "work",
            Category::Other => "other",
        }
    }

    /// The human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Housing => "Housing",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Leisure => "Leisure",
            Category::Work => "Work",
            Category::Other => "Other",
        }
    }

    fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == slug)
    }
}

macro_rules! impl_sql_for_slug_enum {
    ($type:ty, $name:literal) => {
        impl ToSql for $type {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $type {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let slug = value.as_str()?;
                <$type>::from_slug(slug)
                    .ok_or_else(|| FromSqlError::Other(format!("unknown {} {slug:?}", $name).into()))
            }
        }
    };
}

impl_sql_for_slug_enum!(TransactionKind, "transaction kind");
impl_sql_for_slug_enum!(Category, "category");

/// An income or expense recorded by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money, never negative. The sign comes from `kind`.
    pub amount: Decimal,
    /// The category the transaction is filed under.
    pub category: Category,
    /// The day the transaction happened.
    pub occurred_on: Date,
    /// The user that owns this transaction.
    pub owner_id: UserId,
    /// When the store first saved the transaction.
    pub created_at: OffsetDateTime,
    /// When the store last saved the transaction.
    pub updated_at: OffsetDateTime,
}

/// A validated transaction that has not been saved yet.
///
/// The store assigns the ID, owner and timestamps when saving.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub(crate) kind: TransactionKind,
    pub(crate) description: String,
    pub(crate) amount: Decimal,
    pub(crate) category: Category,
    pub(crate) occurred_on: Date,
}

impl NewTransaction {
    /// Validate the fields of a new transaction.
    ///
    /// The description is trimmed before it is stored.
    ///
    /// # Errors
    /// Returns a:
    /// - [Error::EmptyDescription] if the description is blank,
    /// - [Error::NegativeAmount] if `amount` is less than zero.
    pub fn new(
        kind: TransactionKind,
        description: &str,
        amount: Decimal,
        category: Category,
        occurred_on: Date,
    ) -> Result<Self, Error> {
        Ok(Self {
            kind,
            description: validate_description(description)?,
            amount: validate_amount(amount)?,
            category,
            occurred_on,
        })
    }

    /// The amount of money.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Whether the money was earned or spent.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }
}

/// A partial update to a transaction. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub(crate) kind: Option<TransactionKind>,
    pub(crate) description: Option<String>,
    pub(crate) amount: Option<Decimal>,
    pub(crate) category: Option<Category>,
    pub(crate) occurred_on: Option<Date>,
}

impl TransactionPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the kind.
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Change the description.
    ///
    /// # Errors
    /// Returns [Error::EmptyDescription] if the description is blank.
    pub fn description(mut self, description: &str) -> Result<Self, Error> {
        self.description = Some(validate_description(description)?);
        Ok(self)
    }

    /// Change the amount.
    ///
    /// # Errors
    /// Returns [Error::NegativeAmount] if `amount` is less than zero.
    pub fn amount(mut self, amount: Decimal) -> Result<Self, Error> {
        self.amount = Some(validate_amount(amount)?);
        Ok(self)
    }

    /// Change the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Change the date.
    pub fn occurred_on(mut self, occurred_on: Date) -> Self {
        self.occurred_on = Some(occurred_on);
        self
    }

    /// Apply the patch to `transaction` in place.
    pub(crate) fn apply_to(self, transaction: &mut Transaction) {
        if let Some(kind) = self.kind {
            transaction.kind = kind;
        }
        if let Some(description) = self.description {
            transaction.description = description;
        }
        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }
        if let Some(category) = self.category {
            transaction.category = category;
        }
        if let Some(occurred_on) = self.occurred_on {
            transaction.occurred_on = occurred_on;
        }
    }
}

fn validate_description(description: &str) -> Result<String, Error> {
    let description = description.trim();

    if description.is_empty() {
        Err(Error::EmptyDescription)
    } else {
        Ok(description.to_owned())
    }
}

/// The largest amount a single transaction can have, one trillion.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Err(Error::NegativeAmount(amount))
    } else if amount > MAX_AMOUNT {
        Err(Error::AmountTooLarge(amount))
    } else {
        Ok(amount)
    }
}

/// Parse a user entered amount such as "12.30".
///
/// # Errors
/// Returns an [Error::InvalidAmount] if `text` is not a decimal number,
/// [Error::NegativeAmount] if it is less than zero, or [Error::AmountTooLarge]
/// if it is more than [MAX_AMOUNT].
pub fn parse_amount(text: &str) -> Result<Decimal, Error> {
    let amount = text
        .trim()
        .parse::<Decimal>()
        .map_err(|_| Error::InvalidAmount(text.to_owned()))?;

    validate_amount(amount)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table and its indexes.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY,
            owner_id TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            description TEXT NOT NULL CHECK (length(description) > 0),
            amount TEXT NOT NULL,
            category TEXT NOT NULL,
            occurred_on TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_owner_occurred_on
            ON transactions(owner_id, occurred_on);",
    )
}

/// The columns selected by [map_transaction_row], in order.
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, kind, description, amount, category, occurred_on, owner_id, created_at, updated_at";

/// Map a row selected with [TRANSACTION_COLUMNS] to a [Transaction].
///
/// # Errors
/// Returns an error if a column has the wrong type or the amount is not a
/// decimal number.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_amount: String = row.get(3)?;
    let amount = raw_amount.parse::<Decimal>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error))
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        kind: row.get(1)?,
        description: row.get(2)?,
        amount,
        category: row.get(4)?,
        occurred_on: row.get(5)?,
        owner_id: UserId::new(row.get::<_, String>(6)?),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
