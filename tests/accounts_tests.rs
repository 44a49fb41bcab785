// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{add_user, setup};
use moneta::engine::balance::{create_account, set_default_account};
use moneta::error::Error;
use moneta::models::AccountType;
use moneta::store;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn default_count(conn: &rusqlite::Connection, user: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE user_id=?1 AND is_default=1",
        rusqlite::params![user],
        |r| r.get(0),
    )
    .unwrap()
}

#[test]
fn first_account_becomes_default_regardless_of_flag() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");

    let a = create_account(&mut conn, user, "Personal", AccountType::Current, dec!(250), false)
        .unwrap();
    assert!(a.is_default);
    assert_eq!(a.balance, dec!(250));
    assert_eq!(default_count(&conn, user), 1);
}

#[test]
fn default_flag_moves_to_the_newest_default_account() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");

    let a = create_account(&mut conn, user, "Personal", AccountType::Current, Decimal::ZERO, true)
        .unwrap();
    let b = create_account(&mut conn, user, "Savings", AccountType::Savings, Decimal::ZERO, true)
        .unwrap();
    assert!(b.is_default);
    assert!(!store::get_account(&conn, user, a.id).unwrap().is_default);
    assert_eq!(default_count(&conn, user), 1);
}

#[test]
fn non_default_second_account_leaves_the_first_alone() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");

    let a = create_account(&mut conn, user, "Personal", AccountType::Current, Decimal::ZERO, true)
        .unwrap();
    let b = create_account(&mut conn, user, "Savings", AccountType::Savings, Decimal::ZERO, false)
        .unwrap();
    assert!(!b.is_default);
    assert!(store::get_account(&conn, user, a.id).unwrap().is_default);
}

#[test]
fn set_default_switches_exactly_one_flag() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");

    let a = create_account(&mut conn, user, "Personal", AccountType::Current, Decimal::ZERO, true)
        .unwrap();
    let b = create_account(&mut conn, user, "Savings", AccountType::Savings, Decimal::ZERO, false)
        .unwrap();

    let switched = set_default_account(&mut conn, user, b.id).unwrap();
    assert!(switched.is_default);
    assert!(!store::get_account(&conn, user, a.id).unwrap().is_default);
    assert_eq!(default_count(&conn, user), 1);

    let found = store::default_account(&conn, user).unwrap().unwrap();
    assert_eq!(found.id, b.id);
}

#[test]
fn defaults_are_scoped_per_user() {
    let mut conn = setup();
    let ada = add_user(&conn, "ada@example.com");
    let bob = add_user(&conn, "bob@example.com");

    create_account(&mut conn, ada, "Personal", AccountType::Current, Decimal::ZERO, true)
        .unwrap();
    let b = create_account(&mut conn, bob, "Personal", AccountType::Current, Decimal::ZERO, true)
        .unwrap();

    // Bob cannot repoint Ada's default, and his own stays put.
    let err = set_default_account(&mut conn, ada, b.id).unwrap_err();
    assert!(matches!(err, Error::NotFound("account")));
    assert_eq!(default_count(&conn, ada), 1);
    assert_eq!(default_count(&conn, bob), 1);
}

#[test]
fn blank_account_names_are_rejected() {
    let mut conn = setup();
    let user = add_user(&conn, "ada@example.com");

    let err = create_account(&mut conn, user, "  ", AccountType::Current, Decimal::ZERO, false)
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
