//! Route handlers for a group's balances, its settle-up plan and recording settle-up payments.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, ExpenseId, GroupId, UserID,
    app_state::lock_connection,
    expense::{Expense, ExpenseKind, create_expense, get_group_expenses},
    group::{get_group_for_member, get_group_members},
    settlement::{MemberBalance, Transfer, calculate_balances, member_balances, simplify_debts},
};

/// The state needed to compute and record settlements.
#[derive(Debug, Clone)]
pub struct SettlementState {
    /// The database connection for reading and recording expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettlementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for the net balance of everyone who appears in a group's expenses.
pub async fn get_group_balances(
    State(state): State<SettlementState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<Vec<MemberBalance>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_group_for_member(group_id, user_id, &connection)?;
    let expenses = get_group_expenses(group_id, &connection)?;

    Ok(Json(member_balances(&calculate_balances(&expenses))))
}

/// A route handler for the payments that would settle a group.
pub async fn get_settlement_plan(
    State(state): State<SettlementState>,
    Extension(user_id): Extension<UserID>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<Vec<Transfer<UserID>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_group_for_member(group_id, user_id, &connection)?;
    let expenses = get_group_expenses(group_id, &connection)?;

    Ok(Json(simplify_debts(&calculate_balances(&expenses))))
}

/// The request body for recording a settle-up payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSettlementRequest {
    pub group_id: GroupId,
    /// The member paying off their debt.
    pub payer_id: UserID,
    /// The member being paid.
    pub receiver_id: UserID,
    pub amount: f64,
}

/// The response body after recording a settle-up payment.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSettlementResponse {
    pub expense_id: ExpenseId,
}

/// A route handler for recording that one member paid another.
///
/// The payment is stored as a settlement-kind expense paid by the payer with
/// the whole amount owed by the receiver, so the payer's balance goes up and
/// the receiver's goes down by the amount.
pub async fn record_settlement(
    State(state): State<SettlementState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<RecordSettlementRequest>,
) -> Result<(StatusCode, Json<RecordSettlementResponse>), Error> {
    if request.payer_id == request.receiver_id {
        return Err(Error::SelfSettlement);
    }

    let connection = lock_connection(&state.db_connection)?;

    get_group_for_member(request.group_id, user_id, &connection)?;

    let members = get_group_members(request.group_id, &connection)?;
    let name_of = |id: UserID| {
        members
            .iter()
            .find(|member| member.id == id)
            .map(|member| member.name.as_str())
            .unwrap_or("Unknown")
    };
    let description = format!(
        "Settlement from {} to {}",
        name_of(request.payer_id),
        name_of(request.receiver_id)
    );

    let builder = Expense::build(request.group_id, request.payer_id, request.amount)
        .description(&description)
        .kind(ExpenseKind::Settlement)
        .split(request.receiver_id, request.amount);
    let expense = create_expense(builder, &connection)?;

    tracing::info!(
        "Recorded settlement {} of {:.2} from {} to {} in group {}",
        expense.id,
        expense.amount,
        request.payer_id,
        request.receiver_id,
        request.group_id
    );

    Ok((
        StatusCode::CREATED,
        Json(RecordSettlementResponse {
            expense_id: expense.id,
        }),
    ))
}
