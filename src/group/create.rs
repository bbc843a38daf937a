//! Defines the endpoint for creating a new group.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, GroupId, UserID,
    app_state::lock_connection,
    group::{GroupName, create_group},
};

/// The state needed to create, list and update groups.
#[derive(Debug, Clone)]
pub struct GroupState {
    /// The database connection for managing groups.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GroupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a group.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    /// The group's name.
    pub name: String,
    /// The other users to add to the group. The creator is always added.
    #[serde(default)]
    pub members: Vec<UserID>,
}

/// The response body after creating a group.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupResponse {
    /// The ID of the new group.
    pub group_id: GroupId,
}

/// A route handler for creating a new group with the current user as a member.
pub async fn create_group_endpoint(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<CreateGroupResponse>), Error> {
    let name = GroupName::new(&request.name)?;
    let connection = lock_connection(&state.db_connection)?;

    let group = create_group(name, user_id, &request.members, &connection)?;
    tracing::info!("User {user_id} created group {}", group.id);

    Ok((
        StatusCode::CREATED,
        Json(CreateGroupResponse { group_id: group.id }),
    ))
}
