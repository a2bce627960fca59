use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use friend_ledger::{
    BalanceChange, NewFriend, apply_balance_change, create_friend, create_loan, initialize_db,
    record_repayment,
};

/// A utility for creating a test database for the REST API server of friend_ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let now = OffsetDateTime::now_utc();
    let week_ago = now - Duration::days(7);

    println!("Creating test friends...");

    let asha = create_friend(
        NewFriend::new("Asha", "+91 98765 43210")?
            .saved_amount(5000.0)
            .total_balance(1200.0),
        week_ago,
        &conn,
    )?;
    let ben = create_friend(
        NewFriend::new("Ben", "+1 555 010 2030")?.total_balance(300.0),
        week_ago,
        &conn,
    )?;
    create_friend(NewFriend::new("Chen", "+65 8123 4567")?, now, &conn)?;

    println!("Recording debits and loans...");

    apply_balance_change(
        asha.id,
        BalanceChange::Debit,
        250.0,
        Some("groceries".to_owned()),
        now - Duration::days(1),
        &conn,
    )?;
    apply_balance_change(
        asha.id,
        BalanceChange::Debit,
        80.0,
        Some("coffee".to_owned()),
        now,
        &conn,
    )?;
    apply_balance_change(asha.id, BalanceChange::Credit, 500.0, None, now, &conn)?;

    create_loan(
        ben.id,
        2000.0,
        Some("rent".to_owned()),
        week_ago,
        &conn,
    )?;
    record_repayment(ben.id, 750.0, None, now - Duration::days(2), &conn)?;
    create_loan(asha.id, 150.0, Some("movie tickets".to_owned()), now, &conn)?;

    println!("Success!");

    Ok(())
}
