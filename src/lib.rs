//! splitledger is a REST backend for sharing expenses within groups.
//!
//! Users register, form groups and record who paid for what and how each
//! expense is split. The service works out each member's net balance and a
//! short list of payments that settles the group up.
//!
//! The settlement engine itself lives in [settlement] and is independent of
//! the web and storage layers.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod activity;
mod app_state;
mod auth;
mod database_id;
mod db;
mod email;
mod endpoints;
mod expense;
mod group;
mod logging;
mod not_found;
mod routing;
pub mod settlement;
mod timestamp;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use database_id::{DatabaseId, ExpenseId, GroupId};
pub use db::initialize as initialize_db;
pub use email::Email;
pub use expense::{Expense, ExpenseBuilder, ExpenseKind, Split, create_expense, get_expense};
pub use group::{GroupName, add_group_member, create_group};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::{build_router, cors_layer};
pub use user::{
    User, UserID, create_user, get_user_by_email, get_user_by_id, update_password,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The request did not carry an auth cookie.
    #[error("Missing credentials")]
    CookieMissing,

    /// The auth cookie could not be decoded or has expired.
    #[error("Invalid token")]
    InvalidToken,

    /// There was an error formatting or parsing the date time in an auth
    /// token.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not handle the auth token expiry date-time: {0}")]
    InvalidDateFormat(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string used to create an email address is not a valid email.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// An empty string was used for a user's name.
    #[error("Name cannot be empty")]
    EmptyUserName,

    /// An empty string was used for a group's name.
    #[error("Group name cannot be empty")]
    EmptyGroupName,

    /// The email used to register a user already belongs to another user.
    #[error("Email already registered")]
    DuplicateEmail,

    /// A user ID given by the client does not belong to a registered user.
    #[error("the user {0} does not exist")]
    UnknownUser(UserID),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The current user tried to access a group they do not belong to.
    #[error("you are not a member of this group")]
    NotGroupMember,

    /// An expense or settlement amount was zero, negative or not a number.
    #[error("Amount must be > 0, got {0}")]
    InvalidAmount(f64),

    /// An expense was submitted without anyone to split it between.
    #[error("Provide splits list")]
    EmptySplits,

    /// A split entry had a zero, negative or non-numeric amount.
    #[error("the split for user {0} must be greater than zero")]
    InvalidSplitAmount(UserID),

    /// The same user appeared more than once in an expense's splits.
    #[error("user {0} appears more than once in the splits")]
    DuplicateSplitMember(UserID),

    /// The split amounts of an expense do not add up to its total.
    #[error("the splits add up to {split_total:.2} but the expense amount is {amount:.2}")]
    SplitSumMismatch {
        /// The total amount of the expense.
        amount: f64,
        /// The sum of the split amounts.
        split_total: f64,
    },

    /// The payer or a split member of an expense is not in the expense's
    /// group.
    #[error("user {0} is not a member of the group")]
    NonMemberParticipant(UserID),

    /// A settle-up payment was recorded with the same payer and receiver.
    #[error("the payer and receiver of a settlement must be different users")]
    SelfSettlement,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::CookieMissing | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::NotGroupMember => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidCredentials
            | Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::EmptyUserName
            | Error::EmptyGroupName
            | Error::DuplicateEmail
            | Error::UnknownUser(_)
            | Error::InvalidAmount(_)
            | Error::EmptySplits
            | Error::InvalidSplitAmount(_)
            | Error::DuplicateSplitMember(_)
            | Error::SplitSumMismatch { .. }
            | Error::NonMemberParticipant(_)
            | Error::SelfSettlement => StatusCode::BAD_REQUEST,
            Error::InvalidDateFormat(_)
            | Error::HashingError(_)
            | Error::JSONSerializationError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = match status {
            StatusCode::NOT_FOUND => "Not found".to_owned(),
            // Internal errors are not intended to be shown to the client.
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", self);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::Value;

    use crate::{Error, UserID};

    async fn into_status_and_body(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests_with_detail() {
        let (status, body) = into_status_and_body(Error::SplitSumMismatch {
            amount: 100.0,
            split_total: 90.0,
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "the splits add up to 90.00 but the expense amount is 100.00"
        );
    }

    #[tokio::test]
    async fn membership_errors_are_forbidden() {
        let (status, _) = into_status_and_body(Error::NotGroupMember).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized() {
        let (status, body) = into_status_and_body(Error::CookieMissing).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Missing credentials");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = into_status_and_body(Error::DatabaseLockError).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["detail"],
            "An unexpected error occurred, check the server logs for more details."
        );
    }

    #[tokio::test]
    async fn unknown_user_names_the_id() {
        let (status, body) = into_status_and_body(Error::UnknownUser(UserID::new(42))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "the user 42 does not exist");
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
