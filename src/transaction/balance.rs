//! Debits and credits against a friend's spendable balance.

use rusqlite::{Connection, params};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::FriendId,
    friend::{Friend, get_friend},
    transaction::{Transaction, TransactionType, create_transaction},
};

/// The direction of a change to a friend's spendable balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    /// Take money from the balance.
    Debit,
    /// Add money to the balance.
    Credit,
}

impl BalanceChange {
    fn transaction_type(self) -> TransactionType {
        match self {
            Self::Debit => TransactionType::Debit,
            Self::Credit => TransactionType::Credit,
        }
    }

    fn apply(self, balance: f64, amount: f64) -> f64 {
        match self {
            Self::Debit => balance - amount,
            Self::Credit => balance + amount,
        }
    }
}

/// The friend and ledger entry after a balance change has been committed.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedBalanceChange {
    /// The friend with their new balance.
    pub friend: Friend,
    /// The ledger entry that records the change.
    pub transaction: Transaction,
}

/// Apply a debit or credit of `amount` to a friend's spendable balance and
/// record it in the ledger.
///
/// The ledger entry snapshots the balance before and after the change, and the
/// friend's `last_updated_at` is set to the entry's timestamp. The balance is
/// not clamped, so a debit may take it below zero.
///
/// The read of the current balance, the insert and the update run in one SQL
/// transaction, so either all of them are committed or none are.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
/// - [Error::FriendNotFound] if `friend_id` does not refer to a valid friend,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn apply_balance_change(
    friend_id: FriendId,
    change: BalanceChange,
    amount: f64,
    note: Option<String>,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<AppliedBalanceChange, Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(
            "amount must be a number greater than zero".to_owned(),
        ));
    }

    let sql_transaction = connection.unchecked_transaction()?;

    let friend = get_friend(friend_id, &sql_transaction)?;
    let previous_balance = friend.total_balance;
    let new_balance = change.apply(previous_balance, amount);

    let transaction = create_transaction(
        Transaction::build(friend_id, change.transaction_type(), amount, now)
            .balances(previous_balance, new_balance)
            .note(note),
        &sql_transaction,
    )?;

    sql_transaction.execute(
        "UPDATE friend SET total_balance = ?1, last_updated_at = ?2 WHERE id = ?3",
        params![new_balance, transaction.created_at, friend_id],
    )?;

    sql_transaction.commit()?;

    tracing::debug!(
        "{} of {amount} applied to friend {friend_id}: {previous_balance} -> {new_balance}",
        change.transaction_type()
    );

    Ok(AppliedBalanceChange {
        friend: Friend {
            total_balance: new_balance,
            last_updated_at: Some(transaction.created_at),
            ..friend
        },
        transaction,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        friend::{Friend, NewFriend, create_friend, get_friend},
        transaction::{
            BalanceChange, TransactionType, apply_balance_change, count_transactions_for_friend,
        },
    };

    fn get_test_connection_with_friend(total_balance: f64) -> (Connection, Friend) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let friend = create_friend(
            NewFriend::new("A", "+911234567890")
                .unwrap()
                .total_balance(total_balance),
            datetime!(2026-10-18 09:00 UTC),
            &conn,
        )
        .unwrap();

        (conn, friend)
    }

    #[test]
    fn debit_reduces_balance_and_records_snapshots() {
        let (conn, friend) = get_test_connection_with_friend(100.0);
        let now = datetime!(2026-10-18 10:00 UTC);

        let applied = apply_balance_change(
            friend.id,
            BalanceChange::Debit,
            30.0,
            Some("groceries".to_owned()),
            now,
            &conn,
        )
        .unwrap();

        assert_eq!(applied.friend.total_balance, 70.0);
        assert_eq!(applied.friend.last_updated_at, Some(now));
        assert_eq!(applied.transaction.kind, TransactionType::Debit);
        assert_eq!(applied.transaction.amount, 30.0);
        assert_eq!(applied.transaction.previous_balance, Some(100.0));
        assert_eq!(applied.transaction.new_balance, Some(70.0));
        assert_eq!(applied.transaction.note.as_deref(), Some("groceries"));
        assert_eq!(get_friend(friend.id, &conn), Ok(applied.friend));
    }

    #[test]
    fn debit_may_go_negative() {
        let (conn, friend) = get_test_connection_with_friend(100.0);

        let applied = apply_balance_change(
            friend.id,
            BalanceChange::Debit,
            150.0,
            None,
            datetime!(2026-10-18 10:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(applied.friend.total_balance, -50.0);
        assert_eq!(applied.transaction.new_balance, Some(-50.0));
    }

    #[test]
    fn debits_apply_sequentially() {
        let (conn, friend) = get_test_connection_with_friend(100.0);
        let now = datetime!(2026-10-18 10:00 UTC);

        apply_balance_change(friend.id, BalanceChange::Debit, 10.0, None, now, &conn).unwrap();
        let second =
            apply_balance_change(friend.id, BalanceChange::Debit, 15.0, None, now, &conn).unwrap();

        assert_eq!(second.transaction.previous_balance, Some(90.0));
        assert_eq!(second.friend.total_balance, 75.0);
    }

    #[test]
    fn credit_increases_balance() {
        let (conn, friend) = get_test_connection_with_friend(-20.0);

        let applied = apply_balance_change(
            friend.id,
            BalanceChange::Credit,
            50.0,
            None,
            datetime!(2026-10-18 10:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(applied.friend.total_balance, 30.0);
        assert_eq!(applied.transaction.kind, TransactionType::Credit);
    }

    #[test]
    fn invalid_amount_writes_nothing() {
        let (conn, friend) = get_test_connection_with_friend(100.0);
        let now = datetime!(2026-10-18 10:00 UTC);

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result =
                apply_balance_change(friend.id, BalanceChange::Debit, amount, None, now, &conn);

            assert!(matches!(result, Err(Error::InvalidAmount(_))));
        }

        assert_eq!(count_transactions_for_friend(friend.id, &conn), Ok(0));
        assert_eq!(get_friend(friend.id, &conn).unwrap().total_balance, 100.0);
    }

    #[test]
    fn missing_friend_is_not_found() {
        let (conn, _) = get_test_connection_with_friend(100.0);

        let result = apply_balance_change(
            999,
            BalanceChange::Debit,
            1.0,
            None,
            datetime!(2026-10-18 10:00 UTC),
            &conn,
        );

        assert_eq!(result, Err(Error::FriendNotFound));
    }
}
