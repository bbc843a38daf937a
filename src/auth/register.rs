//! The route for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Email, Error, PasswordHash, UserID, ValidatedPassword,
    app_state::lock_connection,
    user::{create_user, validate_user_name},
};

/// The state needed for registering users and reading their profiles.
#[derive(Debug, Clone)]
pub struct UserState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The details a new user signs up with.
#[derive(Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// The response body after registering a user.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// The new user's ID.
    pub id: UserID,
    pub message: String,
}

/// Create a new user.
///
/// The user is not logged in, the client should follow up with a log-in request.
///
/// # Errors
///
/// Returns a 400 error if the name is empty, the email is invalid or
/// already registered, or the password is too weak.
pub async fn register_user(
    State(state): State<UserState>,
    Json(user_data): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), Error> {
    let name = validate_user_name(&user_data.name)?;
    let email = Email::new(&user_data.email)?;
    let validated_password =
        ValidatedPassword::new(&user_data.password, &[&name, email.as_ref()])?;

    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)
        .inspect_err(|error| {
            tracing::error!("an error occurred while hashing a password: {error}");
        })?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(&name, email, password_hash, &connection)?;
    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            message: "User registered".to_owned(),
        }),
    ))
}
