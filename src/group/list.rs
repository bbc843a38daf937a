//! Defines the endpoint for listing the current user's groups.

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{
    Error, GroupId, UserID,
    app_state::lock_connection,
    group::{GroupState, GroupSummary, get_groups_for_user},
    timestamp::format_rfc3339,
};

/// A group as shown in the group list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupListItem {
    pub id: GroupId,
    pub name: String,
    pub member_count: i64,
    pub total_expenses: f64,
    pub created_at: String,
}

impl TryFrom<GroupSummary> for GroupListItem {
    type Error = Error;

    fn try_from(summary: GroupSummary) -> Result<Self, Self::Error> {
        Ok(Self {
            id: summary.id,
            name: summary.name.to_string(),
            member_count: summary.member_count,
            total_expenses: summary.total_expenses,
            created_at: format_rfc3339(summary.created_at)?,
        })
    }
}

/// A route handler that lists the groups the current user is a member of.
pub async fn list_groups_endpoint(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<GroupListItem>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let groups = get_groups_for_user(user_id, &connection)?
        .into_iter()
        .map(GroupListItem::try_from)
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(Json(groups))
}

#[cfg(test)]
mod list_groups_tests {
    use axum::{Extension, Json, extract::State};

    use crate::{
        group::{GroupName, GroupState, create_group, list_groups_endpoint},
        test_utils::{get_test_state, insert_test_user},
    };

    #[tokio::test]
    async fn lists_only_groups_the_user_belongs_to() {
        let state = get_test_state();
        let (alice, trip) = {
            let connection = state.db_connection.lock().unwrap();
            let alice = insert_test_user("Alice", &connection);
            let bob = insert_test_user("Bob", &connection);
            let trip =
                create_group(GroupName::new_unchecked("Trip"), alice.id, &[bob.id], &connection)
                    .unwrap();
            create_group(GroupName::new_unchecked("Bob's"), bob.id, &[], &connection).unwrap();
            (alice, trip)
        };

        let Json(groups) = list_groups_endpoint(
            State(GroupState {
                db_connection: state.db_connection.clone(),
            }),
            Extension(alice.id),
        )
        .await
        .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, trip.id);
        assert_eq!(groups[0].name, "Trip");
        assert_eq!(groups[0].member_count, 2);
        assert_eq!(groups[0].total_expenses, 0.0);
    }
}
