//! Database operations for groups and their members.

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    Error, GroupId, UserID,
    group::{Group, GroupName, GroupSummary},
    user::{Member, get_users_by_ids},
};

/// Initialize the group and group member tables.
pub fn create_group_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense_group (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            created_by INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(created_by) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS group_member (
            id INTEGER PRIMARY KEY,
            group_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            UNIQUE(group_id, user_id),
            FOREIGN KEY(group_id) REFERENCES expense_group(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_group_member_user ON group_member(user_id);",
    )?;

    Ok(())
}

/// Create a group owned by `creator` with `creator` and `members` as its members.
///
/// The creator is always the first member. Repeated IDs in `members` are
/// ignored.
///
/// # Errors
///
/// Returns a:
/// - [Error::UnknownUser] if an ID in `members` does not belong to a registered user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_group(
    name: GroupName,
    creator: UserID,
    members: &[UserID],
    connection: &Connection,
) -> Result<Group, Error> {
    let known_users = get_users_by_ids(members, connection)?;

    if let Some(unknown) = members
        .iter()
        .find(|member| !known_users.iter().any(|user| user.id == **member))
    {
        return Err(Error::UnknownUser(*unknown));
    }

    let created_at = OffsetDateTime::now_utc();
    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "INSERT INTO expense_group (name, created_by, created_at) VALUES (?1, ?2, ?3)",
        (name.as_ref(), creator.as_i64(), created_at),
    )?;

    let id = transaction.last_insert_rowid();

    for member in std::iter::once(&creator).chain(members) {
        transaction.execute(
            "INSERT OR IGNORE INTO group_member (group_id, user_id) VALUES (?1, ?2)",
            (id, member.as_i64()),
        )?;
    }

    transaction.commit()?;

    Ok(Group {
        id,
        name,
        created_at,
    })
}

/// Add `user_id` to a group. Adding an existing member does nothing.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if the group does not exist,
/// - [Error::UnknownUser] if `user_id` does not belong to a registered user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn add_group_member(
    group_id: GroupId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    get_group(group_id, connection)?;

    if get_users_by_ids(&[user_id], connection)?.is_empty() {
        return Err(Error::UnknownUser(user_id));
    }

    connection.execute(
        "INSERT OR IGNORE INTO group_member (group_id, user_id) VALUES (?1, ?2)",
        (group_id, user_id.as_i64()),
    )?;

    Ok(())
}

/// Retrieve a single group by ID.
///
/// # Errors
///
/// Returns a [Error::NotFound] if there is no such group.
pub fn get_group(group_id: GroupId, connection: &Connection) -> Result<Group, Error> {
    connection
        .prepare("SELECT id, name, created_at FROM expense_group WHERE id = :id")?
        .query_row(&[(":id", &group_id)], map_group_row)
        .map_err(|error| error.into())
}

/// Retrieve a group on behalf of `user_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if there is no such group,
/// - [Error::NotGroupMember] if `user_id` is not a member of the group.
pub fn get_group_for_member(
    group_id: GroupId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Group, Error> {
    let group = get_group(group_id, connection)?;

    if !is_group_member(group_id, user_id, connection)? {
        return Err(Error::NotGroupMember);
    }

    Ok(group)
}

/// Whether `user_id` is a member of the group.
pub fn is_group_member(
    group_id: GroupId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    let found = connection
        .query_row(
            "SELECT 1 FROM group_member WHERE group_id = ?1 AND user_id = ?2",
            (group_id, user_id.as_i64()),
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

/// The IDs of a group's members in the order they joined.
///
/// An empty list means the group does not exist, since every group has at
/// least its creator as a member.
pub fn get_group_member_ids(
    group_id: GroupId,
    connection: &Connection,
) -> Result<Vec<UserID>, Error> {
    connection
        .prepare("SELECT user_id FROM group_member WHERE group_id = ?1 ORDER BY id ASC")?
        .query_map([group_id], |row| row.get(0).map(UserID::new))?
        .map(|maybe_id| maybe_id.map_err(|error| error.into()))
        .collect()
}

/// The public details of a group's members in the order they joined.
pub fn get_group_members(group_id: GroupId, connection: &Connection) -> Result<Vec<Member>, Error> {
    connection
        .prepare(
            "SELECT user.id, user.name, user.email
             FROM group_member
             INNER JOIN user ON user.id = group_member.user_id
             WHERE group_member.group_id = ?1
             ORDER BY group_member.id ASC",
        )?
        .query_map([group_id], |row| {
            let raw_email: String = row.get(2)?;

            Ok(Member {
                id: UserID::new(row.get(0)?),
                name: row.get(1)?,
                email: crate::Email::new_unchecked(&raw_email),
            })
        })?
        .map(|maybe_member| maybe_member.map_err(|error| error.into()))
        .collect()
}

/// The IDs of the groups `user_id` is a member of, oldest first.
pub fn get_group_ids_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<GroupId>, Error> {
    connection
        .prepare("SELECT group_id FROM group_member WHERE user_id = ?1 ORDER BY group_id ASC")?
        .query_map([user_id.as_i64()], |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(|error| error.into()))
        .collect()
}

/// The groups `user_id` is a member of, oldest first, with member counts and
/// purchase totals.
pub fn get_groups_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<GroupSummary>, Error> {
    connection
        .prepare(
            "SELECT expense_group.id, expense_group.name, expense_group.created_at,
                (SELECT COUNT(*) FROM group_member AS m WHERE m.group_id = expense_group.id),
                (SELECT COALESCE(SUM(e.amount), 0.0) FROM expense AS e
                    WHERE e.group_id = expense_group.id AND e.kind = 'expense')
             FROM expense_group
             INNER JOIN group_member ON group_member.group_id = expense_group.id
             WHERE group_member.user_id = ?1
             ORDER BY expense_group.id ASC",
        )?
        .query_map([user_id.as_i64()], |row| {
            let raw_name: String = row.get(1)?;

            Ok(GroupSummary {
                id: row.get(0)?,
                name: GroupName::new_unchecked(&raw_name),
                created_at: row.get(2)?,
                member_count: row.get(3)?,
                total_expenses: row.get(4)?,
            })
        })?
        .map(|maybe_summary| maybe_summary.map_err(|error| error.into()))
        .collect()
}

fn map_group_row(row: &Row) -> Result<Group, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Group {
        id: row.get(0)?,
        name: GroupName::new_unchecked(&raw_name),
        created_at: row.get(2)?,
    })
}
