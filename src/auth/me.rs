//! The route for the logged in user's own profile.

use axum::{Extension, Json, extract::State};

use crate::{
    Error, UserID,
    app_state::lock_connection,
    auth::register::UserState,
    group::get_group_ids_for_user,
    user::{UserProfile, get_user_by_id},
};

/// Get the current user's details and the IDs of their groups.
pub async fn get_me(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<UserProfile>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = get_user_by_id(user_id, &connection)?;
    let groups = get_group_ids_for_user(user_id, &connection)?;

    Ok(Json(UserProfile::new(&user, groups)))
}
