use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use splitledger::{
    Email, Expense, ExpenseKind, GroupName, PasswordHash, ValidatedPassword, create_expense,
    create_group, create_user, initialize_db,
};

/// The password shared by every demo user.
const DEMO_PASSWORD: &str = "test";

/// A utility for creating a test database for the REST API server of splitledger.
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

    println!("Creating demo users...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;

    let mut users = Vec::new();
    for name in ["Alice", "Bob", "Carol"] {
        let email = Email::new(&format!("{}@example.com", name.to_lowercase()))?;
        let user = create_user(name, email, password_hash.clone(), &conn)?;
        println!("  {} <{}>", user.name, user.email);
        users.push(user);
    }
    let [alice, bob, carol] = [&users[0], &users[1], &users[2]];

    println!("Creating demo group...");

    let group = create_group(
        GroupName::new("Road trip")?,
        alice.id,
        &[bob.id, carol.id],
        &conn,
    )?;

    println!("Creating demo expenses...");

    create_expense(
        Expense::build(group.id, alice.id, 90.0)
            .description("Fuel")
            .split(alice.id, 30.0)
            .split(bob.id, 30.0)
            .split(carol.id, 30.0),
        &conn,
    )?;
    create_expense(
        Expense::build(group.id, bob.id, 45.0)
            .description("Dinner")
            .split(alice.id, 15.0)
            .split(bob.id, 15.0)
            .split(carol.id, 15.0),
        &conn,
    )?;
    create_expense(
        Expense::build(group.id, carol.id, 20.0)
            .description("Settlement from Carol to Alice")
            .kind(ExpenseKind::Settlement)
            .split(alice.id, 20.0),
        &conn,
    )?;

    println!("Success! Log in as any demo user with the password {DEMO_PASSWORD:?}.");

    Ok(())
}
