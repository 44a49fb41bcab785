// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use std::cell::RefCell;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use moneta::engine::balance::{self, TransactionInput};
use moneta::error::{Error, Result};
use moneta::insights::InsightGenerator;
use moneta::models::{AccountType, MonthlyStats, TxStatus, TxType};
use moneta::notify::{EmailMessage, NotificationSink};

pub fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    moneta::db::init_schema(&mut conn).unwrap();
    conn
}

pub fn ts(s: &str) -> DateTime<Utc> {
    let full = if s.len() == 10 {
        format!("{}T00:00:00Z", s)
    } else {
        s.to_string()
    };
    DateTime::parse_from_rfc3339(&full)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn add_user(conn: &Connection, email: &str) -> i64 {
    conn.execute(
        "INSERT INTO users(email, name) VALUES (?1, ?2)",
        params![email, email.split('@').next().unwrap()],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn add_account(conn: &mut Connection, user_id: i64, name: &str, is_default: bool) -> i64 {
    balance::create_account(
        conn,
        user_id,
        name,
        AccountType::Current,
        Decimal::ZERO,
        is_default,
    )
    .unwrap()
    .id
}

pub fn tx_input(
    account_id: i64,
    kind: TxType,
    amount: Decimal,
    category: &str,
    date: DateTime<Utc>,
) -> TransactionInput {
    TransactionInput {
        account_id,
        kind,
        amount,
        category: category.to_string(),
        date,
        description: None,
        status: TxStatus::Completed,
        recurring: None,
    }
}

pub fn balance_of(conn: &Connection, account_id: i64) -> Decimal {
    let s: String = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .unwrap();
    s.parse().unwrap()
}

pub fn tx_count(conn: &Connection, account_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE account_id=?1",
        params![account_id],
        |r| r.get(0),
    )
    .unwrap()
}

/// Records every message instead of sending it.
#[derive(Default)]
pub struct CapturingSink {
    pub sent: RefCell<Vec<EmailMessage>>,
}

impl NotificationSink for CapturingSink {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}

/// Fails every send, or only sends addressed to `fail_for`.
#[derive(Default)]
pub struct FailingSink {
    pub fail_for: Option<String>,
    pub sent: RefCell<Vec<EmailMessage>>,
}

impl NotificationSink for FailingSink {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        match &self.fail_for {
            Some(to) if *to != message.to => {
                self.sent.borrow_mut().push(message.clone());
                Ok(())
            }
            _ => Err(Error::External("smtp down".to_string())),
        }
    }
}

/// Always returns the given insight lines.
pub struct ScriptedInsights(pub Vec<String>);

impl InsightGenerator for ScriptedInsights {
    fn generate(&self, _stats: &MonthlyStats, _period: &str) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Always fails, as an unreachable or misbehaving generator would.
pub struct BrokenInsights;

impl InsightGenerator for BrokenInsights {
    fn generate(&self, _stats: &MonthlyStats, _period: &str) -> Result<Vec<String>> {
        Err(Error::External("model unavailable".to_string()))
    }
}
