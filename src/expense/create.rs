//! Defines the endpoint for recording a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, ExpenseId, GroupId, UserID,
    app_state::lock_connection,
    expense::{Expense, Split, create_expense},
    group::get_group_for_member,
};

/// The state needed to record and list expenses.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for recording an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub group_id: GroupId,
    pub paid_by: UserID,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub splits: Vec<Split>,
}

/// The response body after recording an expense.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseResponse {
    pub expense_id: ExpenseId,
}

/// A route handler for recording an expense in a group the current user belongs to.
///
/// The payer and everyone in the splits must be members of the group, and the
/// splits must add up to the amount.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<CreateExpenseResponse>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_group_for_member(request.group_id, user_id, &connection)?;

    let builder = Expense::build(request.group_id, request.paid_by, request.amount)
        .description(&request.description)
        .splits(request.splits);
    let expense = create_expense(builder, &connection)?;

    tracing::debug!(
        "User {user_id} recorded expense {} of {:.2} in group {}",
        expense.id,
        expense.amount,
        expense.group_id
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateExpenseResponse {
            expense_id: expense.id,
        }),
    ))
}
