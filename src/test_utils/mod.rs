#![allow(missing_docs)]

use rusqlite::Connection;

use crate::{AppState, Email, PasswordHash, User, ValidatedPassword, create_user};

/// The password every user made by [insert_test_user] logs in with.
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// An [AppState] backed by a fresh in-memory database.
pub(crate) fn get_test_state() -> AppState {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");

    AppState::new(connection, "42").expect("could not create app state")
}

/// Insert a user called `name` with the email `<name>@example.com` and the
/// password [TEST_PASSWORD].
pub(crate) fn insert_test_user(name: &str, connection: &Connection) -> User {
    let email = Email::new_unchecked(&format!("{}@example.com", name.to_lowercase()));
    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4)
        .expect("could not hash test password");

    create_user(name, email, password_hash, connection).expect("could not create test user")
}
