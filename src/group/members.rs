//! Defines the endpoint for adding a user to a group.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error, GroupId, UserID,
    app_state::lock_connection,
    group::{GroupState, add_group_member, get_group_for_member},
};

/// The request body for adding a member.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    /// The user to add.
    pub user_id: UserID,
}

/// A route handler that adds a user to a group the current user belongs to.
///
/// Adding someone who is already a member succeeds without changing anything.
pub async fn add_member_endpoint(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<GroupId>,
    Json(request): Json<AddMemberRequest>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_group_for_member(group_id, user_id, &connection)?;
    add_group_member(group_id, request.user_id, &connection)?;

    Ok(Json(json!({ "message": "Member added" })))
}
