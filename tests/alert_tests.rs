// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{add_account, add_user, setup, ts, tx_input, CapturingSink, FailingSink};
use moneta::engine::alerts::{check_budgets, percentage_used};
use moneta::engine::balance::create_transaction;
use moneta::models::TxType;
use moneta::notify::EmailTemplate;
use moneta::store;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn spend(conn: &mut rusqlite::Connection, user: i64, account: i64, amount: Decimal, date: &str) {
    create_transaction(
        conn,
        user,
        &tx_input(account, TxType::Expense, amount, "Food", ts(date)),
    )
    .unwrap();
}

#[test]
fn percentage_used_guards_zero_budgets() {
    assert_eq!(percentage_used(dec!(85), dec!(100)), dec!(85));
    assert_eq!(percentage_used(dec!(85), Decimal::ZERO), Decimal::ZERO);
}

#[test]
fn alerts_at_eighty_percent_of_budget() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let account = add_account(&mut conn, user, "Personal", true);
    store::upsert_budget(&conn, user, dec!(100)).unwrap();
    spend(&mut conn, user, account, dec!(85), "2025-03-10");

    let sink = CapturingSink::default();
    let summary = check_budgets(&mut conn, ts("2025-03-15"), &sink).unwrap();
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.alerted, 1);

    let sent = sink.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada@example.com");
    match &sent[0].template {
        EmailTemplate::BudgetAlert {
            percentage_used,
            total_expenses,
            budget_amount,
            ..
        } => {
            assert_eq!(*percentage_used, dec!(85.0));
            assert_eq!(*total_expenses, dec!(85));
            assert_eq!(*budget_amount, dec!(100));
        }
        other => panic!("expected a budget alert, got {other:?}"),
    }

    let budget = store::get_budget(&conn, user).unwrap().unwrap();
    assert_eq!(budget.last_alert_sent, Some(ts("2025-03-15")));
}

#[test]
fn stays_quiet_below_threshold() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let account = add_account(&mut conn, user, "Personal", true);
    store::upsert_budget(&conn, user, dec!(100)).unwrap();
    spend(&mut conn, user, account, dec!(79), "2025-03-10");

    let sink = CapturingSink::default();
    let summary = check_budgets(&mut conn, ts("2025-03-15"), &sink).unwrap();
    assert_eq!(summary.alerted, 0);
    assert!(sink.sent.borrow().is_empty());
}

#[test]
fn alerts_once_per_calendar_month() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let account = add_account(&mut conn, user, "Personal", true);
    store::upsert_budget(&conn, user, dec!(100)).unwrap();
    spend(&mut conn, user, account, dec!(90), "2025-03-10");

    let sink = CapturingSink::default();
    check_budgets(&mut conn, ts("2025-03-15"), &sink).unwrap();
    let again = check_budgets(&mut conn, ts("2025-03-20"), &sink).unwrap();
    assert_eq!(again.alerted, 0);
    assert_eq!(sink.sent.borrow().len(), 1);

    // A new month resets the gate.
    spend(&mut conn, user, account, dec!(90), "2025-04-05");
    let next_month = check_budgets(&mut conn, ts("2025-04-10"), &sink).unwrap();
    assert_eq!(next_month.alerted, 1);
    assert_eq!(sink.sent.borrow().len(), 2);
}

#[test]
fn only_the_default_account_is_measured() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let default = add_account(&mut conn, user, "Personal", true);
    let other = add_account(&mut conn, user, "Savings", false);
    store::upsert_budget(&conn, user, dec!(100)).unwrap();
    spend(&mut conn, user, other, dec!(95), "2025-03-10");
    spend(&mut conn, user, default, dec!(10), "2025-03-10");

    let sink = CapturingSink::default();
    let summary = check_budgets(&mut conn, ts("2025-03-15"), &sink).unwrap();
    assert_eq!(summary.alerted, 0);
}

#[test]
fn budget_without_a_default_account_is_skipped() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    store::upsert_budget(&conn, user, dec!(100)).unwrap();

    let sink = CapturingSink::default();
    let summary = check_budgets(&mut conn, ts("2025-03-15"), &sink).unwrap();
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.alerted, 0);
    assert_eq!(summary.failed, 0);
}

#[test]
fn failed_send_rolls_the_stamp_back() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");
    let account = add_account(&mut conn, user, "Personal", true);
    store::upsert_budget(&conn, user, dec!(100)).unwrap();
    spend(&mut conn, user, account, dec!(90), "2025-03-10");

    let sink = FailingSink::default();
    let summary = check_budgets(&mut conn, ts("2025-03-15"), &sink).unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.alerted, 0);

    // Unstamped, so the next sweep retries and succeeds.
    let budget = store::get_budget(&conn, user).unwrap().unwrap();
    assert_eq!(budget.last_alert_sent, None);

    let retry = CapturingSink::default();
    let summary = check_budgets(&mut conn, ts("2025-03-16"), &retry).unwrap();
    assert_eq!(summary.alerted, 1);
    assert_eq!(retry.sent.borrow().len(), 1);
}
