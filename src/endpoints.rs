//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/groups/{group_id}', use [format_endpoint].

/// The root route which reports that the service is up.
pub const ROOT: &str = "/";

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/auth/logout";
/// The route for the current user's profile.
pub const ME: &str = "/api/auth/me";

/// The route to list and create groups.
pub const GROUPS: &str = "/api/groups";
/// The route to a single group's details.
pub const GROUP: &str = "/api/groups/{group_id}";
/// The route to add members to a group.
pub const GROUP_MEMBERS: &str = "/api/groups/{group_id}/members";

/// The route to create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to list a group's expenses.
pub const GROUP_EXPENSES: &str = "/api/expenses/group/{group_id}";

/// The route to record settle-up payments.
pub const SETTLEMENTS: &str = "/api/settlements";
/// The route to a group's member balances.
pub const GROUP_BALANCES: &str = "/api/settlements/group/{group_id}";
/// The route to the payments that settle a group.
pub const SETTLEMENT_PLAN: &str = "/api/settlements/group/{group_id}/plan";

/// The route to the current user's recent activity.
pub const ACTIVITY: &str = "/api/activity";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/groups/{group_id}', '{group_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
/// Only the first parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.char_indices() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
