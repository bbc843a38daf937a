//! The feed of recent expenses and settlements across a user's groups.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, ExpenseId, UserID,
    app_state::lock_connection,
    expense::{Expense, ExpenseKind, get_recent_expenses_for_user},
    timestamp::format_activity_time,
};

/// The most items returned in an activity feed.
pub const ACTIVITY_LIMIT: u32 = 50;

/// The description shown for expenses entered without one.
const DEFAULT_DESCRIPTION: &str = "New expense";

/// The state needed to build a user's activity feed.
#[derive(Debug, Clone)]
pub struct ActivityState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ActivityState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// What kind of event an activity item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Expense,
    Settle,
}

impl From<ExpenseKind> for ActivityType {
    fn from(kind: ExpenseKind) -> Self {
        match kind {
            ExpenseKind::Expense => ActivityType::Expense,
            ExpenseKind::Settlement => ActivityType::Settle,
        }
    }
}

/// One entry in the activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: ExpenseId,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: String,
    /// When the expense was recorded, e.g. "2025-01-31 18:04:05".
    pub time: String,
}

impl TryFrom<Expense> for ActivityItem {
    type Error = Error;

    fn try_from(expense: Expense) -> Result<Self, Self::Error> {
        let description = if expense.description.is_empty() {
            DEFAULT_DESCRIPTION.to_owned()
        } else {
            expense.description
        };

        Ok(Self {
            id: expense.id,
            activity_type: expense.kind.into(),
            description,
            time: format_activity_time(expense.created_at)?,
        })
    }
}

/// A route handler for the most recent expenses in any of the current user's groups, newest first.
pub async fn get_activity(
    State(state): State<ActivityState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<ActivityItem>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let items = get_recent_expenses_for_user(user_id, ACTIVITY_LIMIT, &connection)?
        .into_iter()
        .map(ActivityItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(items))
}
