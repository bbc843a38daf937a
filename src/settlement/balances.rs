//! Folds a group's expenses into a net balance per member.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::settlement::{EPSILON, LedgerEntry, Transfer};

/// The net position of every member of a group.
///
/// Positive balances are owed money, negative balances owe money. Members are
/// kept in the order they were first seen, which is also the order the debt
/// simplifier visits creditors and debtors in.
#[derive(Debug, Clone, PartialEq)]
pub struct Balances<M: Eq + Hash> {
    entries: IndexMap<M, f64>,
}

impl<M: Clone + Eq + Hash> Balances<M> {
    /// Create an empty set of balances.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add `amount` to the balance of `member`, adding the member if needed.
    pub fn add(&mut self, member: M, amount: f64) {
        *self.entries.entry(member).or_insert(0.0) += amount;
    }

    /// The balance of `member`, or `None` if they never appeared.
    pub fn get(&self, member: &M) -> Option<f64> {
        self.entries.get(member).copied()
    }

    /// Iterate over members and their balances in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&M, f64)> {
        self.entries.iter().map(|(member, balance)| (member, *balance))
    }

    /// The number of members with a balance.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no member has a balance.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The sum of all balances, zero for a consistent ledger.
    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    /// Whether every balance is within [EPSILON] of zero.
    pub fn is_settled(&self) -> bool {
        self.entries.values().all(|balance| balance.abs() <= EPSILON)
    }

    /// Move `transfer.amount` from the debtor to the creditor.
    pub fn apply(&mut self, transfer: &Transfer<M>) {
        self.add(transfer.from.clone(), transfer.amount);
        self.add(transfer.to.clone(), -transfer.amount);
    }
}

impl<M: Clone + Eq + Hash> Default for Balances<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Clone + Eq + Hash> FromIterator<(M, f64)> for Balances<M> {
    fn from_iter<I: IntoIterator<Item = (M, f64)>>(iter: I) -> Self {
        let mut balances = Self::new();

        for (member, amount) in iter {
            balances.add(member, amount);
        }

        balances
    }
}

/// Compute each member's net balance across `expenses`.
///
/// Every share owed by someone other than the payer is credited to the payer
/// and debited from that member. The payer's own share moves no money, so a
/// payer who is also in the split ends up with `total - own share` for that
/// expense. Each expense therefore contributes zero in total and the result
/// always sums to zero.
///
/// The result covers exactly the members that appear as a payer or in a
/// split. Input is not validated here, that happens when expenses are
/// created.
pub fn calculate_balances<'a, E>(expenses: impl IntoIterator<Item = &'a E>) -> Balances<E::Member>
where
    E: LedgerEntry + 'a,
{
    let mut balances = Balances::new();

    for expense in expenses {
        let payer = expense.payer();
        balances.add(payer.clone(), 0.0);

        for (member, owed_amount) in expense.shares() {
            if member == payer {
                balances.add(member.clone(), 0.0);
                continue;
            }

            balances.add(payer.clone(), owed_amount);
            balances.add(member.clone(), -owed_amount);
        }
    }

    balances
}
