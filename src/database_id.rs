//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a group of users sharing expenses.
pub type GroupId = DatabaseId;
/// The ID of an expense or recorded settlement.
pub type ExpenseId = DatabaseId;
