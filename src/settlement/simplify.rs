//! Turns net balances into a short list of payments that settles everyone up.

use std::hash::Hash;

use serde::Serialize;

use crate::settlement::{Balances, EPSILON};

/// An instruction for `from` to pay `amount` to `to`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer<M> {
    /// The member paying, always a net debtor.
    pub from: M,
    /// The member being paid, always a net creditor.
    pub to: M,
    /// How much to pay, always greater than [EPSILON].
    pub amount: f64,
}

/// Produce the transfers that settle `balances`.
///
/// Creditors and debtors are matched greedily in the order they appear in
/// `balances`: the current debtor pays the current creditor as much as
/// possible, and whichever side is (within [EPSILON]) paid off is moved past.
/// Each transfer closes out at least one member, so there are never more than
/// `creditors + debtors - 1` transfers. This is not guaranteed to be the
/// smallest possible set of transfers.
///
/// Amounts at or below [EPSILON] are never emitted. If `balances` does not sum
/// to zero the leftover is not settled.
///
/// A cursor moves on once its remainder is at or below [EPSILON], so every
/// pass through the loop advances at least one of them. This also means
/// several creditors each owed no more than [EPSILON] are skipped even when
/// together they are owed more: `{A: 0.01, B: 0.01, C: -0.02}` yields no
/// transfers and leaves C at -0.02.
pub fn simplify_debts<M: Clone + Eq + Hash>(balances: &Balances<M>) -> Vec<Transfer<M>> {
    let mut creditors: Vec<(&M, f64)> = balances
        .iter()
        .filter(|(_, balance)| *balance > 0.0)
        .collect();
    let mut debtors: Vec<(&M, f64)> = balances
        .iter()
        .filter(|(_, balance)| *balance < 0.0)
        .map(|(member, balance)| (member, -balance))
        .collect();

    let mut transfers = Vec::new();
    let mut creditor_index = 0;
    let mut debtor_index = 0;

    while creditor_index < creditors.len() && debtor_index < debtors.len() {
        let (creditor, credit) = &mut creditors[creditor_index];
        let (debtor, debt) = &mut debtors[debtor_index];

        let settle_amount = credit.min(*debt);

        if settle_amount > EPSILON {
            transfers.push(Transfer {
                from: (*debtor).clone(),
                to: (*creditor).clone(),
                amount: settle_amount,
            });

            *credit -= settle_amount;
            *debt -= settle_amount;
        }

        if *credit <= EPSILON {
            creditor_index += 1;
        }

        if *debt <= EPSILON {
            debtor_index += 1;
        }
    }

    transfers
}


#[cfg(test)]
mod settlement_property_tests {
    use proptest::prelude::*;

    use crate::settlement::{
        EPSILON, calculate_balances, ledger::test_entry::TestExpense, simplify_debts,
    };

    const MEMBERS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

    /// Well-formed expenses in whole currency units, so the shares always
    /// add up to the total exactly.
    fn well_formed_expenses() -> impl Strategy<Value = Vec<TestExpense>> {
        let expense = (0..MEMBERS.len(), prop::collection::vec(0u32..=500, MEMBERS.len()))
            .prop_map(|(payer, shares)| {
                let splits: Vec<(&'static str, f64)> = MEMBERS
                    .iter()
                    .zip(shares)
                    .filter(|(_, share)| *share > 0)
                    .map(|(member, share)| (*member, f64::from(share)))
                    .collect();
                let total = splits.iter().map(|(_, amount)| amount).sum();

                TestExpense {
                    payer: MEMBERS[payer],
                    total,
                    splits,
                }
            });

        prop::collection::vec(expense, 0..=25)
    }

    /// Well-formed expenses in cents, with shares of up to 500.00.
    fn cent_expenses() -> impl Strategy<Value = Vec<TestExpense>> {
        let expense = (0..MEMBERS.len(), prop::collection::vec(0u32..=50_000, MEMBERS.len()))
            .prop_map(|(payer, shares)| {
                let splits: Vec<(&'static str, f64)> = MEMBERS
                    .iter()
                    .zip(shares)
                    .filter(|(_, cents)| *cents > 0)
                    .map(|(member, cents)| (*member, f64::from(cents) / 100.0))
                    .collect();
                let total = splits.iter().map(|(_, amount)| amount).sum();

                TestExpense {
                    payer: MEMBERS[payer],
                    total,
                    splits,
                }
            });

        prop::collection::vec(expense, 0..=25)
    }

    proptest! {
        #[test]
        fn balances_sum_to_zero(expenses in well_formed_expenses()) {
            let balances = calculate_balances(&expenses);

            prop_assert!(balances.total().abs() < EPSILON);
        }

        #[test]
        fn transfers_settle_every_balance(expenses in well_formed_expenses()) {
            let mut balances = calculate_balances(&expenses);

            for transfer in simplify_debts(&balances) {
                balances.apply(&transfer);
            }

            prop_assert!(balances.is_settled(), "unsettled balances: {:?}", balances);
        }

        #[test]
        fn transfers_are_positive_and_between_different_members(expenses in well_formed_expenses()) {
            let balances = calculate_balances(&expenses);

            for transfer in simplify_debts(&balances) {
                prop_assert!(transfer.amount > EPSILON);
                prop_assert_ne!(transfer.from, transfer.to);
            }
        }

        #[test]
        fn transfer_count_is_bounded(expenses in well_formed_expenses()) {
            let balances = calculate_balances(&expenses);
            let creditors = balances.iter().filter(|(_, balance)| *balance > 0.0).count();
            let debtors = balances.iter().filter(|(_, balance)| *balance < 0.0).count();

            let transfers = simplify_debts(&balances);

            prop_assert!(transfers.len() <= (creditors + debtors).saturating_sub(1));
        }

        #[test]
        fn cent_balances_sum_to_zero(expenses in cent_expenses()) {
            let balances = calculate_balances(&expenses);

            prop_assert!(balances.total().abs() < EPSILON);
        }

        #[test]
        fn cent_transfers_leave_bounded_residue(expenses in cent_expenses()) {
            let mut balances = calculate_balances(&expenses);
            let creditors = balances.iter().filter(|(_, balance)| *balance > 0.0).count();
            let debtors = balances.iter().filter(|(_, balance)| *balance < 0.0).count();

            let transfers = simplify_debts(&balances);
            prop_assert!(transfers.len() <= (creditors + debtors).saturating_sub(1));
            for transfer in &transfers {
                prop_assert!(transfer.amount > EPSILON);
                prop_assert_ne!(transfer.from, transfer.to);
                balances.apply(transfer);
            }

            let residue: f64 = balances.iter().map(|(_, balance)| balance.abs()).sum();
            let bound = 2.0 * EPSILON * balances.len() as f64 + 1e-6;
            prop_assert!(residue <= bound, "unsettled balances: {:?}", balances);
        }

        #[test]
        fn recomputation_is_stable(expenses in well_formed_expenses()) {
            prop_assert_eq!(calculate_balances(&expenses), calculate_balances(&expenses));
        }
    }
}
