//! Defines the endpoint for a group's overview: its members, totals and who owes whom.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::{
    Error, GroupId, UserID,
    app_state::lock_connection,
    expense::{get_group_expense_total, get_group_expenses},
    group::{GroupState, get_group_for_member, get_group_members},
    settlement::{MemberBalance, Transfer, calculate_balances, member_balances, simplify_debts},
    timestamp::format_rfc3339,
    user::Member,
};

/// The overview of a group.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetails {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<Member>,
    /// The sum of the group's purchases, not counting settle-up payments.
    pub total_expenses: f64,
    pub balances: Vec<MemberBalance>,
    /// The payments that would settle the group.
    pub debts: Vec<Transfer<UserID>>,
    pub created_at: String,
}

/// A route handler for getting a group's overview.
///
/// Only members of the group may view it.
pub async fn get_group_endpoint(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<GroupDetails>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let group = get_group_for_member(group_id, user_id, &connection)?;
    let members = get_group_members(group_id, &connection)?;
    let expenses = get_group_expenses(group_id, &connection)?;

    let total_expenses = get_group_expense_total(group_id, &connection)?;
    let balances = calculate_balances(&expenses);
    let debts = simplify_debts(&balances);

    Ok(Json(GroupDetails {
        id: group.id,
        name: group.name.to_string(),
        members,
        total_expenses,
        balances: member_balances(&balances),
        debts,
        created_at: format_rfc3339(group.created_at)?,
    }))
}
