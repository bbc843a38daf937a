//! Defines the expense model and the checks an expense must pass before it is stored.

use std::collections::HashSet;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, ExpenseId, GroupId, UserID,
    settlement::{EPSILON, LedgerEntry},
};

/// Whether a ledger row is a shared purchase or a settle-up payment.
///
/// Both kinds are folded into balances the same way; the kind only changes how
/// the row is presented in activity feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseKind {
    /// Something one member paid for on behalf of others.
    Expense,
    /// A payment from one member to another to pay off a debt.
    Settlement,
}

impl ExpenseKind {
    /// The name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseKind::Expense => "expense",
            ExpenseKind::Settlement => "settlement",
        }
    }

}

impl FromSql for ExpenseKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "expense" => Ok(ExpenseKind::Expense),
            "settlement" => Ok(ExpenseKind::Settlement),
            other => Err(FromSqlError::Other(
                format!("unknown expense kind {other:?}").into(),
            )),
        }
    }
}

/// How much of an expense one member owes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    /// The member who owes the share.
    pub user_id: UserID,
    /// The size of the share.
    pub amount: f64,
}

impl Split {
    /// Create a split owed by `user_id`.
    pub fn new(user_id: UserID, amount: f64) -> Self {
        Self { user_id, amount }
    }
}

/// A payment made by one member of a group and shared between members.
///
/// To create a new `Expense`, use [Expense::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The group the expense belongs to.
    pub group_id: GroupId,
    /// The member who paid the full amount.
    pub paid_by: UserID,
    /// The full amount paid.
    pub amount: f64,
    /// What the expense was for.
    pub description: String,
    /// Whether this is a purchase or a settle-up payment.
    pub kind: ExpenseKind,
    /// The shares owed by each member, in the order they were entered.
    pub splits: Vec<Split>,
    /// When the expense was recorded.
    pub created_at: OffsetDateTime,
}

impl Expense {
    /// Start building a new expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(group_id: GroupId, paid_by: UserID, amount: f64) -> ExpenseBuilder {
        ExpenseBuilder {
            group_id,
            paid_by,
            amount,
            description: String::new(),
            kind: ExpenseKind::Expense,
            splits: Vec::new(),
        }
    }
}

impl LedgerEntry for Expense {
    type Member = UserID;

    fn payer(&self) -> &UserID {
        &self.paid_by
    }

    fn total_amount(&self) -> f64 {
        self.amount
    }

    fn shares(&self) -> impl Iterator<Item = (&UserID, f64)> {
        self.splits.iter().map(|split| (&split.user_id, split.amount))
    }
}

/// A builder for creating [Expense] instances.
///
/// The builder holds everything the client sends. The ID and creation time
/// are assigned when the expense is stored with [crate::create_expense].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseBuilder {
    /// The group the expense belongs to.
    pub group_id: GroupId,
    /// The member who paid.
    pub paid_by: UserID,
    /// The full amount paid.
    pub amount: f64,
    /// What the expense was for. Surrounding whitespace is removed.
    pub description: String,
    /// Purchase or settle-up payment, defaults to a purchase.
    pub kind: ExpenseKind,
    /// The shares owed by each member.
    pub splits: Vec<Split>,
}

impl ExpenseBuilder {
    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.trim().to_owned();
        self
    }

    /// Set the kind.
    pub fn kind(mut self, kind: ExpenseKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a share owed by `user_id`.
    pub fn split(mut self, user_id: UserID, amount: f64) -> Self {
        self.splits.push(Split::new(user_id, amount));
        self
    }

    /// Replace all of the shares.
    pub fn splits(mut self, splits: Vec<Split>) -> Self {
        self.splits = splits;
        self
    }

    /// Check the expense against the current members of its group.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, checked in this order:
    /// - [Error::InvalidAmount] if the amount is not a finite number above zero,
    /// - [Error::EmptySplits] if there are no splits,
    /// - [Error::NonMemberParticipant] if the payer is not in `members`,
    /// - [Error::InvalidSplitAmount] if a split is not a finite number above zero,
    /// - [Error::DuplicateSplitMember] if a member has more than one split,
    /// - [Error::NonMemberParticipant] if a split member is not in `members`,
    /// - [Error::SplitSumMismatch] if the splits do not add up to the amount.
    pub fn validate(&self, members: &[UserID]) -> Result<(), Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        if self.splits.is_empty() {
            return Err(Error::EmptySplits);
        }

        if !members.contains(&self.paid_by) {
            return Err(Error::NonMemberParticipant(self.paid_by));
        }

        let mut seen = HashSet::with_capacity(self.splits.len());

        for split in &self.splits {
            if !split.amount.is_finite() || split.amount <= 0.0 {
                return Err(Error::InvalidSplitAmount(split.user_id));
            }

            if !seen.insert(split.user_id) {
                return Err(Error::DuplicateSplitMember(split.user_id));
            }

            if !members.contains(&split.user_id) {
                return Err(Error::NonMemberParticipant(split.user_id));
            }
        }

        let split_total: f64 = self.splits.iter().map(|split| split.amount).sum();

        if (split_total - self.amount).abs() > EPSILON {
            return Err(Error::SplitSumMismatch {
                amount: self.amount,
                split_total,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod expense_validation_tests {
    use crate::{Error, UserID, expense::Expense};

    const ALICE: UserID = UserID::new(1);
    const BOB: UserID = UserID::new(2);
    const CAROL: UserID = UserID::new(3);
    const MEMBERS: [UserID; 3] = [ALICE, BOB, CAROL];

    #[test]
    fn valid_expense_passes() {
        let expense = Expense::build(1, ALICE, 90.0)
            .split(ALICE, 30.0)
            .split(BOB, 30.0)
            .split(CAROL, 30.0);

        assert_eq!(expense.validate(&MEMBERS), Ok(()));
    }

    #[test]
    fn split_sum_within_epsilon_passes() {
        let expense = Expense::build(1, ALICE, 100.0)
            .split(ALICE, 33.335)
            .split(BOB, 33.33)
            .split(CAROL, 33.33);

        assert_eq!(expense.validate(&MEMBERS), Ok(()));
    }

    #[test]
    fn zero_amount_fails() {
        let expense = Expense::build(1, ALICE, 0.0).split(BOB, 0.0);

        assert_eq!(expense.validate(&MEMBERS), Err(Error::InvalidAmount(0.0)));
    }

    #[test]
    fn negative_amount_fails() {
        let expense = Expense::build(1, ALICE, -5.0).split(BOB, 5.0);

        assert_eq!(expense.validate(&MEMBERS), Err(Error::InvalidAmount(-5.0)));
    }

    #[test]
    fn nan_amount_fails() {
        let expense = Expense::build(1, ALICE, f64::NAN).split(BOB, 5.0);

        assert!(matches!(
            expense.validate(&MEMBERS),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn empty_splits_fail() {
        let expense = Expense::build(1, ALICE, 10.0);

        assert_eq!(expense.validate(&MEMBERS), Err(Error::EmptySplits));
    }

    #[test]
    fn payer_outside_group_fails() {
        let outsider = UserID::new(99);
        let expense = Expense::build(1, outsider, 10.0).split(BOB, 10.0);

        assert_eq!(
            expense.validate(&MEMBERS),
            Err(Error::NonMemberParticipant(outsider))
        );
    }

    #[test]
    fn split_member_outside_group_fails() {
        let outsider = UserID::new(99);
        let expense = Expense::build(1, ALICE, 10.0)
            .split(BOB, 5.0)
            .split(outsider, 5.0);

        assert_eq!(
            expense.validate(&MEMBERS),
            Err(Error::NonMemberParticipant(outsider))
        );
    }

    #[test]
    fn non_positive_split_fails() {
        let expense = Expense::build(1, ALICE, 10.0)
            .split(BOB, 10.0)
            .split(CAROL, 0.0);

        assert_eq!(
            expense.validate(&MEMBERS),
            Err(Error::InvalidSplitAmount(CAROL))
        );
    }

    #[test]
    fn duplicate_split_member_fails() {
        let expense = Expense::build(1, ALICE, 10.0)
            .split(BOB, 5.0)
            .split(BOB, 5.0);

        assert_eq!(
            expense.validate(&MEMBERS),
            Err(Error::DuplicateSplitMember(BOB))
        );
    }

    #[test]
    fn split_sum_mismatch_fails() {
        let expense = Expense::build(1, ALICE, 100.0)
            .split(ALICE, 50.0)
            .split(BOB, 40.0);

        assert_eq!(
            expense.validate(&MEMBERS),
            Err(Error::SplitSumMismatch {
                amount: 100.0,
                split_total: 90.0
            })
        );
    }

    #[test]
    fn description_is_trimmed() {
        let expense = Expense::build(1, ALICE, 10.0).description("  Dinner \n");

        assert_eq!(expense.description, "Dinner");
    }
}
