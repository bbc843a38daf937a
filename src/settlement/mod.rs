//! Works out who owes whom within a group.
//!
//! [calculate_balances] folds a group's expenses into a net balance per
//! member, and [simplify_debts] turns those balances into a list of payments
//! that settles everyone up. Both are pure functions over [LedgerEntry] values
//! and know nothing about HTTP or the database.

mod balances;
mod endpoints;
mod ledger;
mod simplify;

use serde::Serialize;

pub use balances::{Balances, calculate_balances};
pub(crate) use endpoints::{get_group_balances, get_settlement_plan, record_settlement};
pub use ledger::LedgerEntry;
pub use simplify::{Transfer, simplify_debts};

use crate::UserID;

/// Balances and amounts within this tolerance of zero are treated as zero.
pub const EPSILON: f64 = 0.01;

/// A member's net balance in API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBalance {
    /// The member.
    pub user_id: UserID,
    /// Positive when the member is owed money, negative when they owe money.
    pub balance: f64,
}

/// Flatten `balances` into a list, keeping the first-seen order.
pub fn member_balances(balances: &Balances<UserID>) -> Vec<MemberBalance> {
    balances
        .iter()
        .map(|(user_id, balance)| MemberBalance {
            user_id: *user_id,
            balance,
        })
        .collect()
}
