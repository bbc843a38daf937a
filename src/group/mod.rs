//! Groups of users who share expenses.

mod create;
mod db;
mod details;
mod domain;
mod list;
mod members;

pub use create::{GroupState, create_group_endpoint};
pub use db::{
    add_group_member, create_group, create_group_tables, get_group, get_group_for_member,
    get_group_ids_for_user, get_group_member_ids, get_group_members, get_groups_for_user,
    is_group_member,
};
pub use details::get_group_endpoint;
pub use domain::{Group, GroupName, GroupSummary};
pub use list::list_groups_endpoint;
pub use members::add_member_endpoint;
