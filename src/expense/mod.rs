//! Expenses paid by one group member and split between members.

mod core;
mod create;
mod db;
mod list;

pub use core::{Expense, ExpenseBuilder, ExpenseKind, Split};
pub use create::{ExpenseState, create_expense_endpoint};
pub use db::{
    create_expense, create_expense_tables, get_expense, get_group_expense_total,
    get_group_expenses, get_recent_expenses_for_user,
};
pub use list::list_group_expenses_endpoint;
