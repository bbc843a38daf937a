//! Database operations for expenses and their splits.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error, ExpenseId, GroupId, UserID,
    expense::{Expense, ExpenseBuilder, Split},
    group::get_group_member_ids,
};

/// Create the expense and expense split tables.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_expense_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            group_id INTEGER NOT NULL,
            paid_by INTEGER NOT NULL,
            amount REAL NOT NULL,
            description TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'expense' CHECK(kind IN ('expense', 'settlement')),
            created_at TEXT NOT NULL,
            FOREIGN KEY(group_id) REFERENCES expense_group(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(paid_by) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_group ON expense(group_id);

        CREATE TABLE IF NOT EXISTS expense_split (
            id INTEGER PRIMARY KEY,
            expense_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            UNIQUE(expense_id, user_id),
            FOREIGN KEY(expense_id) REFERENCES expense(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_split_expense ON expense_split(expense_id);",
    )?;

    Ok(())
}

/// Validate `builder` against its group's members and store it with its splits.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if the group has no members, i.e. it does not exist,
/// - validation error from [ExpenseBuilder::validate],
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_expense(builder: ExpenseBuilder, connection: &Connection) -> Result<Expense, Error> {
    let members = get_group_member_ids(builder.group_id, connection)?;

    if members.is_empty() {
        return Err(Error::NotFound);
    }

    builder.validate(&members)?;

    let created_at = OffsetDateTime::now_utc();
    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "INSERT INTO expense (group_id, paid_by, amount, description, kind, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            builder.group_id,
            builder.paid_by.as_i64(),
            builder.amount,
            &builder.description,
            builder.kind.as_str(),
            created_at,
        ),
    )?;

    let id = transaction.last_insert_rowid();

    {
        let mut statement = transaction.prepare(
            "INSERT INTO expense_split (expense_id, user_id, amount) VALUES (?1, ?2, ?3)",
        )?;

        for split in &builder.splits {
            statement.execute((id, split.user_id.as_i64(), split.amount))?;
        }
    }

    transaction.commit()?;

    Ok(Expense {
        id,
        group_id: builder.group_id,
        paid_by: builder.paid_by,
        amount: builder.amount,
        description: builder.description,
        kind: builder.kind,
        splits: builder.splits,
        created_at,
    })
}

/// Retrieve an expense and its splits by `id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if `id` does not refer to a stored expense,
/// - [Error::SqlError] if there is some other SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let mut expense = connection
        .prepare(
            "SELECT id, group_id, paid_by, amount, description, kind, created_at
             FROM expense WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_expense_row)?;

    expense.splits = connection
        .prepare("SELECT user_id, amount FROM expense_split WHERE expense_id = :id ORDER BY id")?
        .query_map(&[(":id", &id)], map_split_row)?
        .collect::<Result<Vec<Split>, rusqlite::Error>>()?;

    Ok(expense)
}

/// Retrieve every expense in a group, oldest first, with their splits.
///
/// Balances depend on the order members are first seen, so the order here is
/// the order the expenses were recorded.
///
/// # Errors
///
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn get_group_expenses(group_id: GroupId, connection: &Connection) -> Result<Vec<Expense>, Error> {
    let mut expenses: Vec<Expense> = connection
        .prepare(
            "SELECT id, group_id, paid_by, amount, description, kind, created_at
             FROM expense WHERE group_id = :group_id ORDER BY id ASC",
        )?
        .query_map(&[(":group_id", &group_id)], map_expense_row)?
        .collect::<Result<_, rusqlite::Error>>()?;

    let mut splits_by_expense: HashMap<ExpenseId, Vec<Split>> = HashMap::new();
    let mut statement = connection.prepare(
        "SELECT expense_split.expense_id, expense_split.user_id, expense_split.amount
         FROM expense_split
         INNER JOIN expense ON expense.id = expense_split.expense_id
         WHERE expense.group_id = :group_id
         ORDER BY expense_split.id ASC",
    )?;
    let rows = statement.query_map(&[(":group_id", &group_id)], |row| {
        let expense_id: ExpenseId = row.get(0)?;
        let user_id = UserID::new(row.get(1)?);
        let amount = row.get(2)?;

        Ok((expense_id, Split::new(user_id, amount)))
    })?;

    for row in rows {
        let (expense_id, split) = row?;
        splits_by_expense.entry(expense_id).or_default().push(split);
    }

    for expense in &mut expenses {
        expense.splits = splits_by_expense.remove(&expense.id).unwrap_or_default();
    }

    Ok(expenses)
}

/// Get the sum of the amounts of the purchases in a group.
///
/// Settle-up payments are not counted.
///
/// # Errors
///
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn get_group_expense_total(group_id: GroupId, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expense WHERE group_id = ?1 AND kind = 'expense'",
            [group_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Retrieve the most recent expenses, newest first, across all the groups
/// `user_id` belongs to. Splits are not loaded.
///
/// # Errors
///
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn get_recent_expenses_for_user(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT expense.id, expense.group_id, expense.paid_by, expense.amount,
                expense.description, expense.kind, expense.created_at
             FROM expense
             INNER JOIN group_member ON group_member.group_id = expense.group_id
             WHERE group_member.user_id = ?1
             ORDER BY expense.created_at DESC, expense.id DESC
             LIMIT ?2",
        )?
        .query_map((user_id.as_i64(), limit), map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        group_id: row.get(1)?,
        paid_by: UserID::new(row.get(2)?),
        amount: row.get(3)?,
        description: row.get(4)?,
        kind: row.get(5)?,
        splits: Vec::new(),
        created_at: row.get(6)?,
    })
}

fn map_split_row(row: &Row) -> Result<Split, rusqlite::Error> {
    Ok(Split::new(UserID::new(row.get(0)?), row.get(1)?))
}

#[cfg(test)]
mod expense_query_tests {
    use rusqlite::Connection;

    use crate::{
        Email, Error, PasswordHash, User, create_user,
        db::initialize,
        expense::{
            Expense, ExpenseKind, create_expense, get_expense, get_group_expense_total,
            get_group_expenses, get_recent_expenses_for_user,
        },
        group::{GroupName, add_group_member, create_group},
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn insert_user(name: &str, connection: &Connection) -> User {
        create_user(
            name,
            Email::new_unchecked(&format!("{}@example.com", name.to_lowercase())),
            PasswordHash::new_unchecked("hunter2"),
            connection,
        )
        .unwrap()
    }

    #[test]
    fn create_expense_stores_splits_in_order() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);
        let bob = insert_user("Bob", &connection);
        let group = create_group(
            GroupName::new_unchecked("Trip"),
            alice.id,
            &[bob.id],
            &connection,
        )
        .unwrap();

        let created = create_expense(
            Expense::build(group.id, alice.id, 100.0)
                .description("Dinner")
                .split(bob.id, 60.0)
                .split(alice.id, 40.0),
            &connection,
        )
        .unwrap();

        let got = get_expense(created.id, &connection).unwrap();
        assert_eq!(got, created);
        assert_eq!(got.splits[0].user_id, bob.id);
        assert_eq!(got.splits[1].user_id, alice.id);
    }

    #[test]
    fn create_expense_rejects_invalid_expense() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);
        let group = create_group(GroupName::new_unchecked("Solo"), alice.id, &[], &connection)
            .unwrap();

        let result = create_expense(
            Expense::build(group.id, alice.id, 100.0).split(alice.id, 50.0),
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::SplitSumMismatch {
                amount: 100.0,
                split_total: 50.0
            })
        );
        assert!(get_group_expenses(group.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn create_expense_for_missing_group_fails() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);

        let result = create_expense(
            Expense::build(42, alice.id, 10.0).split(alice.id, 10.0),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn unknown_kind_cannot_be_stored() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);
        let group = create_group(GroupName::new_unchecked("Trip"), alice.id, &[], &connection)
            .unwrap();

        let result = connection.execute(
            "INSERT INTO expense (group_id, paid_by, amount, description, kind, created_at)
             VALUES (?1, ?2, 10.0, '', 'refund', '2025-01-01T00:00:00Z')",
            (group.id, alice.id.as_i64()),
        );

        assert!(result.is_err());
    }

    #[test]
    fn unknown_kind_is_not_read_as_expense() {
        let connection = get_test_connection();

        let known: ExpenseKind = connection
            .query_row("SELECT 'settlement'", [], |row| row.get(0))
            .unwrap();
        let unknown = connection.query_row("SELECT 'refund'", [], |row| row.get::<_, ExpenseKind>(0));

        assert_eq!(known, ExpenseKind::Settlement);
        assert!(unknown.is_err());
    }

    #[test]
    fn get_missing_expense_fails() {
        let connection = get_test_connection();

        assert_eq!(get_expense(1, &connection), Err(Error::NotFound));
    }

    #[test]
    fn group_expenses_are_oldest_first_with_splits() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);
        let bob = insert_user("Bob", &connection);
        let group = create_group(
            GroupName::new_unchecked("Flat"),
            alice.id,
            &[bob.id],
            &connection,
        )
        .unwrap();
        let first = create_expense(
            Expense::build(group.id, alice.id, 10.0).split(bob.id, 10.0),
            &connection,
        )
        .unwrap();
        let second = create_expense(
            Expense::build(group.id, bob.id, 30.0)
                .split(alice.id, 15.0)
                .split(bob.id, 15.0),
            &connection,
        )
        .unwrap();

        let expenses = get_group_expenses(group.id, &connection).unwrap();

        assert_eq!(expenses, vec![first, second]);
    }

    #[test]
    fn group_expenses_exclude_other_groups() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);
        let home = create_group(GroupName::new_unchecked("Home"), alice.id, &[], &connection)
            .unwrap();
        let work = create_group(GroupName::new_unchecked("Work"), alice.id, &[], &connection)
            .unwrap();
        create_expense(
            Expense::build(work.id, alice.id, 10.0).split(alice.id, 10.0),
            &connection,
        )
        .unwrap();

        assert!(get_group_expenses(home.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn expense_total_skips_settlements() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);
        let bob = insert_user("Bob", &connection);
        let group = create_group(
            GroupName::new_unchecked("Trip"),
            alice.id,
            &[bob.id],
            &connection,
        )
        .unwrap();
        create_expense(
            Expense::build(group.id, alice.id, 80.0)
                .split(alice.id, 40.0)
                .split(bob.id, 40.0),
            &connection,
        )
        .unwrap();
        create_expense(
            Expense::build(group.id, bob.id, 40.0)
                .kind(ExpenseKind::Settlement)
                .split(alice.id, 40.0),
            &connection,
        )
        .unwrap();

        assert_eq!(get_group_expense_total(group.id, &connection), Ok(80.0));
    }

    #[test]
    fn recent_expenses_cover_only_the_users_groups() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);
        let bob = insert_user("Bob", &connection);
        let shared = create_group(
            GroupName::new_unchecked("Shared"),
            alice.id,
            &[bob.id],
            &connection,
        )
        .unwrap();
        let private = create_group(GroupName::new_unchecked("Bob's"), bob.id, &[], &connection)
            .unwrap();
        let visible = create_expense(
            Expense::build(shared.id, bob.id, 20.0).split(alice.id, 20.0),
            &connection,
        )
        .unwrap();
        create_expense(
            Expense::build(private.id, bob.id, 5.0).split(bob.id, 5.0),
            &connection,
        )
        .unwrap();

        let recent = get_recent_expenses_for_user(alice.id, 50, &connection).unwrap();

        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, visible.id);
    }

    #[test]
    fn recent_expenses_respect_limit_and_order() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);
        let group = create_group(GroupName::new_unchecked("Solo"), alice.id, &[], &connection)
            .unwrap();
        let mut ids = Vec::new();
        for amount in [1.0, 2.0, 3.0] {
            let expense = create_expense(
                Expense::build(group.id, alice.id, amount).split(alice.id, amount),
                &connection,
            )
            .unwrap();
            ids.push(expense.id);
        }

        let recent = get_recent_expenses_for_user(alice.id, 2, &connection).unwrap();

        let got: Vec<_> = recent.iter().map(|expense| expense.id).collect();
        assert_eq!(got, vec![ids[2], ids[1]]);
    }

    #[test]
    fn newly_added_member_can_be_in_splits() {
        let connection = get_test_connection();
        let alice = insert_user("Alice", &connection);
        let carol = insert_user("Carol", &connection);
        let group = create_group(GroupName::new_unchecked("Club"), alice.id, &[], &connection)
            .unwrap();
        add_group_member(group.id, carol.id, &connection).unwrap();

        let result = create_expense(
            Expense::build(group.id, alice.id, 10.0).split(carol.id, 10.0),
            &connection,
        );

        assert!(result.is_ok());
    }
}
