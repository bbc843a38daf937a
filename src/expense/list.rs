//! Defines the endpoint for listing a group's expenses.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, ExpenseId, GroupId, UserID,
    app_state::lock_connection,
    expense::{Expense, ExpenseKind, ExpenseState, get_group_expenses},
    group::{get_group_for_member, get_group_members},
    timestamp::format_rfc3339,
};

const UNKNOWN_USER_NAME: &str = "Unknown";

/// A split with the name of the member who owes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitView {
    pub user_id: UserID,
    pub user_name: String,
    pub amount: f64,
}

/// An expense as shown in a group's expense list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    pub id: ExpenseId,
    pub group_id: GroupId,
    pub paid_by: UserID,
    pub paid_by_name: String,
    pub amount: f64,
    pub description: String,
    pub kind: ExpenseKind,
    pub splits: Vec<SplitView>,
    pub created_at: String,
}

impl ExpenseView {
    fn new(expense: Expense, names: &HashMap<UserID, String>) -> Result<Self, Error> {
        let name_of = |user_id: &UserID| {
            names
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_USER_NAME.to_owned())
        };

        Ok(Self {
            id: expense.id,
            group_id: expense.group_id,
            paid_by: expense.paid_by,
            paid_by_name: name_of(&expense.paid_by),
            amount: expense.amount,
            description: expense.description,
            kind: expense.kind,
            splits: expense
                .splits
                .iter()
                .map(|split| SplitView {
                    user_id: split.user_id,
                    user_name: name_of(&split.user_id),
                    amount: split.amount,
                })
                .collect(),
            created_at: format_rfc3339(expense.created_at)?,
        })
    }
}

/// A route handler that lists a group's expenses, newest first.
pub async fn list_group_expenses_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<Vec<ExpenseView>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_group_for_member(group_id, user_id, &connection)?;

    let names: HashMap<UserID, String> = get_group_members(group_id, &connection)?
        .into_iter()
        .map(|member| (member.id, member.name))
        .collect();

    let expenses = get_group_expenses(group_id, &connection)?
        .into_iter()
        .rev()
        .map(|expense| ExpenseView::new(expense, &names))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(Json(expenses))
}
