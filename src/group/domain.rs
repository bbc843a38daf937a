//! Core group domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, GroupId};

/// A validated, non-empty group name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct GroupName(String);

impl GroupName {
    /// Create a group name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyGroupName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyGroupName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a group name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for GroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for GroupName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of users who share expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub name: GroupName,
    pub created_at: OffsetDateTime,
}

/// A group as listed for one of its members.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: GroupName,
    pub member_count: i64,
    /// The sum of the group's purchases, not counting settle-up payments.
    pub total_expenses: f64,
    pub created_at: OffsetDateTime,
}
