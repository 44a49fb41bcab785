// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Demo data: a demo user with one default account, 90 days of sample
//! activity, and a recurring rent payment for the scheduler to chew on.
//! The account's existing transactions are wiped and the balance rebuilt
//! in the same store transaction.

use anyhow::Result;
use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;

use crate::engine::balance::{self, TransactionInput};
use crate::models::{AccountType, RecurringInterval, TxStatus, TxType};
use crate::store;
use crate::utils::fmt_ts;

pub const DEMO_EMAIL: &str = "demo@moneta.dev";

const EXPENSES: &[(&str, i64, i64)] = &[
    ("groceries", 40, 180),
    ("transportation", 10, 60),
    ("food", 15, 90),
    ("entertainment", 10, 120),
    ("utilities", 60, 220),
    ("shopping", 30, 250),
    ("healthcare", 20, 300),
];

pub fn handle(conn: &mut Connection) -> Result<()> {
    let user_id = ensure_demo_user(conn)?;
    let account_id = ensure_demo_account(conn, user_id)?;
    let now = Utc::now();

    let inserted = {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM transactions WHERE account_id=?1",
            params![account_id],
        )?;

        let mut net = Decimal::ZERO;
        let mut inserted = 0usize;
        for day in (0..90).rev() {
            let date = now - Duration::days(day);

            // Paycheck roughly monthly, expenses every day, amounts varied
            // by a fixed per-day stride so reseeding is reproducible.
            if day % 30 == 0 {
                net += insert_demo_tx(&tx, user_id, account_id, TxType::Income, "salary",
                    Decimal::from(5200), &fmt_ts(date))?;
                inserted += 1;
            }
            let (category, min, max) = EXPENSES[(day as usize) % EXPENSES.len()];
            let amount = Decimal::from(min + (day * 13) % (max - min));
            net += insert_demo_tx(&tx, user_id, account_id, TxType::Expense, category,
                amount, &fmt_ts(date))?;
            inserted += 1;
        }

        let opening: String = tx.query_row(
            "SELECT opening_balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )?;
        let balance = opening.parse::<Decimal>().unwrap_or_default() + net;
        tx.execute(
            "UPDATE accounts SET balance=?1 WHERE id=?2",
            params![balance.to_string(), account_id],
        )?;
        tx.commit()?;
        inserted
    };

    // One live recurring schedule so `jobs tick` has something to process.
    balance::create_transaction(
        conn,
        user_id,
        &TransactionInput {
            account_id,
            kind: TxType::Expense,
            amount: Decimal::from(1200),
            category: "housing".to_string(),
            date: now,
            description: Some("Rent".to_string()),
            status: TxStatus::Completed,
            recurring: Some(RecurringInterval::Monthly),
        },
    )?;

    println!(
        "Seeded demo user <{}> with {} transactions and a recurring rent payment",
        DEMO_EMAIL,
        inserted + 1
    );
    Ok(())
}

fn insert_demo_tx(
    conn: &Connection,
    user_id: i64,
    account_id: i64,
    kind: TxType,
    category: &str,
    amount: Decimal,
    date: &str,
) -> Result<Decimal> {
    conn.execute(
        "INSERT INTO transactions(user_id, account_id, type, amount, category, date, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id,
            account_id,
            kind.as_str(),
            amount.to_string(),
            category,
            date,
            format!("Demo {}", category),
        ],
    )?;
    Ok(crate::models::signed_effect(kind, amount))
}

fn ensure_demo_user(conn: &Connection) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO users(email, name) VALUES (?1, 'Demo User')",
        params![DEMO_EMAIL],
    )?;
    Ok(store::find_user_by_email(conn, DEMO_EMAIL)?.id)
}

fn ensure_demo_account(conn: &mut Connection, user_id: i64) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM accounts WHERE user_id=?1 AND name='Personal'",
            params![user_id],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    let account = balance::create_account(
        conn,
        user_id,
        "Personal",
        AccountType::Current,
        Decimal::from(2500),
        true,
    )?;
    Ok(account.id)
}
