//! The deposit and withdraw state transitions.
//!
//! Both operations validate their input before touching the store, so a
//! rejected operation has no side effects. Withdrawals additionally check
//! the derived saved amount at call time; the ledger can never report a
//! negative balance.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::GoalId,
    goal::{get_goal, saved_amount},
    ledger::core::{NewTransaction, Transaction, TransactionKind, record_transaction},
    money::parse_amount,
};

/// The result of a successful deposit.
#[derive(Debug, Clone, PartialEq)]
pub struct DepositOutcome {
    /// The appended ledger record.
    pub transaction: Transaction,
    /// True exactly when this deposit moved the goal from below its target
    /// to at or above it.
    ///
    /// This is a one-time signal for the caller to react to (confetti, a
    /// notification). Achieved state is always derived from the ledger and
    /// never stored, so the signal does not repeat for later deposits.
    pub goal_achieved: bool,
}

/// Deposit money towards a goal.
///
/// `amount_input` is the raw user-entered string; it is validated and
/// rounded to the canonical precision before the ledger row is written.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount_input` is not a positive decimal,
/// - [Error::NotFound] if `goal_id` does not refer to a valid goal,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn deposit(
    goal_id: GoalId,
    amount_input: &str,
    timestamp: OffsetDateTime,
    notes: &str,
    connection: &Connection,
) -> Result<DepositOutcome, Error> {
    let amount = parse_amount(amount_input)?;
    let goal = get_goal(goal_id, connection)?;
    let saved_before = saved_amount(goal_id, connection)?;

    let transaction = record_transaction(
        NewTransaction {
            goal_id,
            kind: TransactionKind::Deposit,
            timestamp,
            amount,
            notes: notes.to_string(),
        },
        connection,
    )?;

    let saved_after = saved_amount(goal_id, connection)?;
    let goal_achieved = saved_before < goal.target_amount && saved_after >= goal.target_amount;

    tracing::info!(
        "deposited {} towards goal {} (saved {} of {})",
        amount,
        goal_id,
        saved_after,
        goal.target_amount
    );

    Ok(DepositOutcome {
        transaction,
        goal_achieved,
    })
}

/// Withdraw money from a goal.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount_input` is not a positive decimal,
/// - [Error::NotFound] if `goal_id` does not refer to a valid goal,
/// - [Error::InsufficientFunds] if the rounded amount exceeds the goal's
///   currently saved amount (nothing is written in that case),
/// - or [Error::SqlError] if there is some other SQL error.
pub fn withdraw(
    goal_id: GoalId,
    amount_input: &str,
    timestamp: OffsetDateTime,
    notes: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = parse_amount(amount_input)?;
    get_goal(goal_id, connection)?;
    let available = saved_amount(goal_id, connection)?;

    if amount > available {
        return Err(Error::InsufficientFunds {
            requested: amount,
            available,
        });
    }

    let transaction = record_transaction(
        NewTransaction {
            goal_id,
            kind: TransactionKind::Withdraw,
            timestamp,
            amount,
            notes: notes.to_string(),
        },
        connection,
    )?;

    tracing::info!("withdrew {} from goal {}", amount, goal_id);

    Ok(transaction)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        db::initialize,
        goal::{Goal, NewGoal, create_goal, saved_amount},
        ledger::count_transactions,
    };

    use super::{deposit, withdraw};

    const WHEN: time::OffsetDateTime = datetime!(2026 - 04 - 01 08:00 UTC);

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_goal(target_amount: f64, conn: &Connection) -> Goal {
        create_goal(
            NewGoal::new("Savings", target_amount, date!(2026 - 12 - 31)).unwrap(),
            conn,
        )
        .unwrap()
    }

    #[test]
    fn deposit_then_withdraw_scenario() {
        let conn = get_test_connection();
        let goal = insert_goal(100.0, &conn);

        let first = deposit(goal.id, "60.00", WHEN, "", &conn).unwrap();
        assert!(!first.goal_achieved);
        assert_eq!(saved_amount(goal.id, &conn), Ok(60.0));

        let second = deposit(goal.id, "40.00", WHEN, "", &conn).unwrap();
        assert!(second.goal_achieved);
        assert_eq!(saved_amount(goal.id, &conn), Ok(100.0));

        let overdraw = withdraw(goal.id, "150.00", WHEN, "", &conn);
        assert_eq!(
            overdraw,
            Err(Error::InsufficientFunds {
                requested: 150.0,
                available: 100.0
            })
        );
        assert_eq!(saved_amount(goal.id, &conn), Ok(100.0));

        withdraw(goal.id, "30.00", WHEN, "", &conn).unwrap();
        assert_eq!(saved_amount(goal.id, &conn), Ok(70.0));
    }

    #[test]
    fn achieved_signal_fires_only_on_the_crossing_deposit() {
        let conn = get_test_connection();
        let goal = insert_goal(100.0, &conn);

        assert!(!deposit(goal.id, "99.99", WHEN, "", &conn).unwrap().goal_achieved);
        assert!(deposit(goal.id, "0.01", WHEN, "", &conn).unwrap().goal_achieved);
        // Already at target, so later deposits do not re-fire the signal.
        assert!(!deposit(goal.id, "25.00", WHEN, "", &conn).unwrap().goal_achieved);
    }

    #[test]
    fn rejected_withdrawal_writes_no_transaction() {
        let conn = get_test_connection();
        let goal = insert_goal(100.0, &conn);
        deposit(goal.id, "50.00", WHEN, "", &conn).unwrap();

        let result = withdraw(goal.id, "50.01", WHEN, "", &conn);

        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        assert_eq!(count_transactions(&conn), Ok(1));
    }

    #[test]
    fn withdrawing_the_exact_balance_empties_the_goal() {
        let conn = get_test_connection();
        let goal = insert_goal(100.0, &conn);
        deposit(goal.id, "80.00", WHEN, "", &conn).unwrap();

        withdraw(goal.id, "80.00", WHEN, "", &conn).unwrap();

        assert_eq!(saved_amount(goal.id, &conn), Ok(0.0));
    }

    #[test]
    fn deposit_rounds_input_before_storage() {
        let conn = get_test_connection();
        let goal = insert_goal(100.0, &conn);

        let outcome = deposit(goal.id, "12.3456", WHEN, "", &conn).unwrap();

        assert_eq!(outcome.transaction.amount, 12.35);
        assert_eq!(saved_amount(goal.id, &conn), Ok(12.35));
    }

    #[test]
    fn invalid_amounts_are_rejected_before_any_write() {
        let conn = get_test_connection();
        let goal = insert_goal(100.0, &conn);

        for input in ["", "abc", "-1", "0"] {
            assert!(matches!(
                deposit(goal.id, input, WHEN, "", &conn),
                Err(Error::InvalidAmount(_))
            ));
            assert!(matches!(
                withdraw(goal.id, input, WHEN, "", &conn),
                Err(Error::InvalidAmount(_))
            ));
        }

        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn operations_on_a_missing_goal_return_not_found() {
        let conn = get_test_connection();

        assert_eq!(
            deposit(404, "10.00", WHEN, "", &conn).unwrap_err(),
            Error::NotFound
        );
        assert_eq!(
            withdraw(404, "10.00", WHEN, "", &conn).unwrap_err(),
            Error::NotFound
        );
    }
}
