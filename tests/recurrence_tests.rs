// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{add_account, add_user, balance_of, setup, ts, tx_input};
use moneta::engine::balance::create_transaction;
use moneta::engine::recurrence::{
    is_due, next_date, process_recurring, scan_due, ProcessOutcome,
};
use moneta::models::{Recurrence, RecurringInterval, TxStatus, TxType};
use rusqlite::params;
use rust_decimal_macros::dec;

#[test]
fn next_date_clamps_into_shorter_months() {
    assert_eq!(
        next_date(ts("2024-01-31"), RecurringInterval::Monthly),
        ts("2024-02-29")
    );
    assert_eq!(
        next_date(ts("2023-01-31"), RecurringInterval::Monthly),
        ts("2023-02-28")
    );
    assert_eq!(
        next_date(ts("2024-02-29"), RecurringInterval::Yearly),
        ts("2025-02-28")
    );
}

#[test]
fn next_date_saturates_past_the_calendar_horizon() {
    use chrono::{DateTime, Duration, Utc};

    // Close enough to the maximum timestamp that one more step overflows.
    let from = DateTime::<Utc>::MAX_UTC - Duration::days(10);
    let next = next_date(from, RecurringInterval::Monthly);
    assert!(next > from);
    assert_eq!(next, DateTime::<Utc>::MAX_UTC);
    assert_eq!(
        next_date(from, RecurringInterval::Yearly),
        DateTime::<Utc>::MAX_UTC
    );
}

#[test]
fn next_date_steps_days_and_weeks() {
    assert_eq!(
        next_date(ts("2025-03-31"), RecurringInterval::Daily),
        ts("2025-04-01")
    );
    assert_eq!(
        next_date(ts("2025-03-01"), RecurringInterval::Weekly),
        ts("2025-03-08")
    );
}

#[test]
fn due_when_never_processed_or_schedule_passed() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let account = add_account(&mut conn, user, "Personal", true);

    let mut input = tx_input(account, TxType::Expense, dec!(25), "Rent", ts("2025-03-01"));
    input.recurring = Some(RecurringInterval::Monthly);
    let t = create_transaction(&mut conn, user, &input).unwrap();

    // Never processed: due even though next_due (Apr 1) is in the future.
    assert!(is_due(&t, ts("2025-03-02")));

    // Pending transactions never fire.
    let mut pending = input.clone();
    pending.status = TxStatus::Pending;
    let p = create_transaction(&mut conn, user, &pending).unwrap();
    assert!(!is_due(&p, ts("2025-03-02")));

    let due = scan_due(&conn, ts("2025-03-02")).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].transaction_id, t.id);
}

#[test]
fn materialization_copies_the_row_and_advances_the_schedule() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let account = add_account(&mut conn, user, "Personal", true);

    let mut input = tx_input(account, TxType::Expense, dec!(25), "Rent", ts("2025-03-01"));
    input.description = Some("Flat 4".to_string());
    input.recurring = Some(RecurringInterval::Monthly);
    let t = create_transaction(&mut conn, user, &input).unwrap();
    assert_eq!(balance_of(&conn, account), dec!(-25));

    let now = ts("2025-04-01T08:00:00Z");
    let outcome = process_recurring(&mut conn, t.id, user, now).unwrap();
    let new_id = match outcome {
        ProcessOutcome::Materialized(id) => id,
        other => panic!("expected materialization, got {other:?}"),
    };

    let copy = moneta::store::get_transaction(&conn, user, new_id).unwrap();
    assert_eq!(copy.kind, TxType::Expense);
    assert_eq!(copy.amount, dec!(25));
    assert_eq!(copy.category, "Rent");
    assert_eq!(copy.date, now);
    assert_eq!(copy.description.as_deref(), Some("Flat 4 (Recurring)"));
    assert_eq!(copy.status, TxStatus::Completed);
    assert_eq!(copy.recurrence, Recurrence::OneTime);

    assert_eq!(balance_of(&conn, account), dec!(-50));

    let template = moneta::store::get_transaction(&conn, user, t.id).unwrap();
    match template.recurrence {
        Recurrence::Recurring {
            next_due,
            last_processed,
            ..
        } => {
            assert_eq!(last_processed, Some(now));
            assert_eq!(next_due, ts("2025-05-01T08:00:00Z"));
        }
        Recurrence::OneTime => panic!("template lost its schedule"),
    }
}

#[test]
fn redelivered_processing_is_a_no_op() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let account = add_account(&mut conn, user, "Personal", true);

    let mut input = tx_input(account, TxType::Expense, dec!(25), "Rent", ts("2025-03-01"));
    input.recurring = Some(RecurringInterval::Monthly);
    let t = create_transaction(&mut conn, user, &input).unwrap();

    let now = ts("2025-04-01T08:00:00Z");
    assert!(matches!(
        process_recurring(&mut conn, t.id, user, now).unwrap(),
        ProcessOutcome::Materialized(_)
    ));
    assert!(matches!(
        process_recurring(&mut conn, t.id, user, now).unwrap(),
        ProcessOutcome::SkippedNotDue
    ));

    // Template plus exactly one occurrence, one balance delta.
    assert_eq!(common::tx_count(&conn, account), 2);
    assert_eq!(balance_of(&conn, account), dec!(-50));
}

#[test]
fn vanished_rows_are_skipped_not_failed() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let account = add_account(&mut conn, user, "Personal", true);

    let mut input = tx_input(account, TxType::Expense, dec!(25), "Rent", ts("2025-03-01"));
    input.recurring = Some(RecurringInterval::Monthly);
    let t = create_transaction(&mut conn, user, &input).unwrap();

    // The account (and, by cascade, the transaction) is deleted between
    // the scan and the worker run.
    conn.execute("DELETE FROM accounts WHERE id=?1", params![account])
        .unwrap();

    let outcome = process_recurring(&mut conn, t.id, user, ts("2025-04-01")).unwrap();
    assert_eq!(outcome, ProcessOutcome::SkippedMissing);
}

#[test]
fn scan_ignores_one_time_and_future_schedules() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let account = add_account(&mut conn, user, "Personal", true);

    create_transaction(
        &mut conn,
        user,
        &tx_input(account, TxType::Expense, dec!(5), "Food", ts("2025-03-01")),
    )
    .unwrap();

    let mut input = tx_input(account, TxType::Expense, dec!(25), "Rent", ts("2025-03-01"));
    input.recurring = Some(RecurringInterval::Monthly);
    let t = create_transaction(&mut conn, user, &input).unwrap();
    process_recurring(&mut conn, t.id, user, ts("2025-04-01")).unwrap();

    // Processed last month; next occurrence is May 1.
    assert!(scan_due(&conn, ts("2025-04-15")).unwrap().is_empty());
    assert_eq!(scan_due(&conn, ts("2025-05-01")).unwrap().len(), 1);
}
