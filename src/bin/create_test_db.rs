use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::{Arc, Mutex};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime, Weekday};

use finance_tracker::{
    Category, Identity, NewTransaction, SqliteTransactionStore, TransactionKind,
    TransactionStore, UserId, ensure_user_profile, initialize_db,
};

/// A utility for creating a test database for the finance_tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The user ID the proxy will send for the test user.
    #[arg(long, default_value = "demo")]
    user_id: String,

    /// The name shown for the test user.
    #[arg(long, default_value = "Demo User")]
    name: String,
}

/// The sample transactions for a single day, if any.
fn transactions_on(date: Date) -> Vec<(TransactionKind, &'static str, Decimal, Category)> {
    let mut transactions = Vec::new();
    // Varies the amounts from day to day without needing a random number generator.
    let wobble = Decimal::from(date.ordinal() % 17);

    match date.day() {
        1 => transactions.push((
            TransactionKind::Income,
            "Salary",
            Decimal::new(4200_00, 2),
            Category::Work,
        )),
        2 => transactions.push((
            TransactionKind::Expense,
            "Rent",
            Decimal::new(1650_00, 2),
            Category::Housing,
        )),
        15 => transactions.push((
            TransactionKind::Expense,
            "Power and internet",
            Decimal::new(180_00, 2) + wobble,
            Category::Housing,
        )),
        _ => {}
    }

    match date.weekday() {
        Weekday::Saturday => transactions.push((
            TransactionKind::Expense,
            "Groceries",
            Decimal::new(95_40, 2) + wobble * Decimal::new(3, 0),
            Category::Food,
        )),
        Weekday::Monday => transactions.push((
            TransactionKind::Expense,
            "Bus pass top up",
            Decimal::new(20_00, 2),
            Category::Transport,
        )),
        Weekday::Friday if date.day() % 2 == 0 => transactions.push((
            TransactionKind::Expense,
            "Dinner with friends",
            Decimal::new(45_00, 2) + wobble,
            Category::Leisure,
        )),
        _ => {}
    }

    if date.ordinal() % 45 == 0 {
        transactions.push((
            TransactionKind::Expense,
            "Doctor's visit",
            Decimal::new(65_00, 2),
            Category::Health,
        ));
    }

    if date.ordinal() % 90 == 0 {
        transactions.push((
            TransactionKind::Income,
            "Sold old books",
            Decimal::new(35_50, 2),
            Category::Other,
        ));
    }

    transactions
}

/// Create and populate a database for manual testing.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let identity = Identity {
        id: UserId::new(&args.user_id),
        display_name: args.name,
        email: None,
        avatar_url: None,
    };
    ensure_user_profile(&identity, &conn)?;

    println!("Creating a year of transactions...");

    let store = SqliteTransactionStore::new(Arc::new(Mutex::new(conn)));
    let today = OffsetDateTime::now_utc().date();
    let mut date = today - Duration::days(365);
    let mut count = 0;

    while date <= today {
        for (kind, description, amount, category) in transactions_on(date) {
            let transaction = NewTransaction::new(kind, description, amount, category, date)?;
            store.create(&identity.id, transaction).await?;
            count += 1;
        }

        date += Duration::days(1);
    }

    println!("Created {count} transactions for {}", identity.id);
    println!("Success!");

    Ok(())
}
