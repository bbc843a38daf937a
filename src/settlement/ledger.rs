//! The read-only view of an expense that the settlement engine folds over.

use std::hash::Hash;

/// An expense as seen by the balance calculation.
///
/// The engine never looks at anything other than who paid, how much, and who
/// owes which share, so anything that can answer those three questions can be
/// settled. Member identifiers are opaque.
pub trait LedgerEntry {
    /// The identifier for a member of the group.
    type Member: Clone + Eq + Hash;

    /// The member who paid the full amount.
    fn payer(&self) -> &Self::Member;

    /// The full amount paid.
    fn total_amount(&self) -> f64;

    /// Each member's share of the expense, in the order they were entered.
    fn shares(&self) -> impl Iterator<Item = (&Self::Member, f64)>;
}
