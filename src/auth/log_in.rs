//! This file defines the route for handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Email, Error,
    app_state::lock_connection,
    auth::cookie::set_auth_cookie,
    user::{Member, get_user_by_email},
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
pub const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the client to log in.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password hash in the database.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInData {
    /// The email the user registered with.
    pub email: String,

    /// Password entered during log-in.
    pub password: String,

    /// Whether to extend the initial auth cookie duration to one week.
    #[serde(default)]
    pub remember_me: bool,
}

/// The response body after a successful log-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The user that logged in.
    pub user: Member,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the user's
/// public details are returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email is not registered or the password is not correct, both reported as [Error::InvalidCredentials].
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Json(user_data): Json<LogInData>,
) -> Result<(PrivateCookieJar, Json<LogInResponse>), Error> {
    let email = Email::new(&user_data.email).map_err(|_| Error::InvalidCredentials)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(&user_data.password)? {
        tracing::info!("Failed log-in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if user_data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;

    Ok((
        jar,
        Json(LogInResponse {
            user: Member::from(&user),
        }),
    ))
}

#[cfg(test)]
mod log_in_tests {
    use axum::{
        Json,
        extract::State,
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::PrivateCookieJar;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::{
            COOKIE_TOKEN,
            log_in::{LogInData, LoginState, REMEMBER_ME_COOKIE_DURATION, post_log_in},
        },
        test_utils::{TEST_PASSWORD, get_test_state, insert_test_user},
    };

    fn get_login_state() -> LoginState {
        let state = get_test_state();
        insert_test_user("Alice", &state.db_connection.lock().unwrap());

        LoginState {
            cookie_key: state.cookie_key,
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection,
        }
    }

    fn log_in_data(email: &str, password: &str, remember_me: bool) -> LogInData {
        LogInData {
            email: email.to_owned(),
            password: password.to_owned(),
            remember_me,
        }
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_login_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let (jar, Json(response)) = post_log_in(
            State(state.clone()),
            jar,
            Json(log_in_data("alice@example.com", TEST_PASSWORD, false)),
        )
        .await
        .unwrap();

        assert_eq!(response.user.name, "Alice");
        let cookie = jar.get(COOKIE_TOKEN).expect("auth cookie should be set");
        assert_date_time_close(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + state.cookie_duration,
        );
    }

    #[tokio::test]
    async fn email_is_case_insensitive() {
        let state = get_login_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let result = post_log_in(
            State(state),
            jar,
            Json(log_in_data("ALICE@Example.com", TEST_PASSWORD, false)),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn remember_me_extends_cookie_duration() {
        let state = get_login_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let (jar, _) = post_log_in(
            State(state),
            jar,
            Json(log_in_data("alice@example.com", TEST_PASSWORD, true)),
        )
        .await
        .unwrap();

        let cookie = jar.get(COOKIE_TOKEN).unwrap();
        assert_date_time_close(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION,
        );
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let state = get_login_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let result = post_log_in(
            State(state),
            jar,
            Json(log_in_data("alice@example.com", "wrongpassword", false)),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unknown_email_looks_like_wrong_password() {
        let state = get_login_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let result = post_log_in(
            State(state),
            jar,
            Json(log_in_data("nobody@example.com", TEST_PASSWORD, false)),
        )
        .await;

        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let state = get_login_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let result = post_log_in(
            State(state),
            jar,
            Json(log_in_data("not an email", TEST_PASSWORD, false)),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidCredentials)));
    }
}
