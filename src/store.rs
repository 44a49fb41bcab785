// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Row mapping and ownership-scoped lookups over the ledger tables.
//!
//! Every lookup that takes a `user_id` refuses to see other users' rows:
//! a wrong owner and a missing row are the same `NotFound`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{
    Account, AccountType, Budget, Recurrence, RecurringInterval, Transaction, TxStatus, TxType,
    User,
};
use crate::utils::{fmt_ts, parse_ts};

const TX_COLS: &str = "id, user_id, account_id, type, amount, category, date, description, \
                           status, is_recurring, recurring_interval, last_processed, next_recurring_date";

const ACCOUNT_COLS: &str = "id, user_id, name, type, balance, is_default";

/// Raw column values for a transaction row, before domain parsing.
struct RawTx {
    id: i64,
    user_id: i64,
    account_id: i64,
    kind: String,
    amount: String,
    category: String,
    date: String,
    description: Option<String>,
    status: String,
    is_recurring: bool,
    recurring_interval: Option<String>,
    last_processed: Option<String>,
    next_recurring_date: Option<String>,
}

fn raw_tx(r: &Row) -> rusqlite::Result<RawTx> {
    Ok(RawTx {
        id: r.get(0)?,
        user_id: r.get(1)?,
        account_id: r.get(2)?,
        kind: r.get(3)?,
        amount: r.get(4)?,
        category: r.get(5)?,
        date: r.get(6)?,
        description: r.get(7)?,
        status: r.get(8)?,
        is_recurring: r.get(9)?,
        recurring_interval: r.get(10)?,
        last_processed: r.get(11)?,
        next_recurring_date: r.get(12)?,
    })
}

fn parse_amount(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .map_err(|e| Error::Corrupt(format!("bad amount '{}': {}", s, e)))
}

fn tx_from_raw(raw: RawTx) -> Result<Transaction> {
    let kind = TxType::parse(&raw.kind)
        .ok_or_else(|| Error::Corrupt(format!("bad transaction type '{}'", raw.kind)))?;
    let status = TxStatus::parse(&raw.status)
        .ok_or_else(|| Error::Corrupt(format!("bad transaction status '{}'", raw.status)))?;
    let recurrence = if raw.is_recurring {
        let interval = raw
            .recurring_interval
            .as_deref()
            .and_then(RecurringInterval::parse)
            .ok_or_else(|| {
                Error::Corrupt(format!("recurring transaction {} has no interval", raw.id))
            })?;
        let next_due = raw
            .next_recurring_date
            .as_deref()
            .map(parse_ts)
            .transpose()?
            .ok_or_else(|| {
                Error::Corrupt(format!("recurring transaction {} has no next date", raw.id))
            })?;
        let last_processed = raw.last_processed.as_deref().map(parse_ts).transpose()?;
        Recurrence::Recurring {
            interval,
            next_due,
            last_processed,
        }
    } else {
        Recurrence::OneTime
    };
    Ok(Transaction {
        id: raw.id,
        user_id: raw.user_id,
        account_id: raw.account_id,
        kind,
        amount: parse_amount(&raw.amount)?,
        category: raw.category,
        date: parse_ts(&raw.date)?,
        description: raw.description,
        status,
        recurrence,
    })
}

fn account_from_row(r: &Row) -> rusqlite::Result<(i64, i64, String, String, String, bool)> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
    ))
}

fn account_from_raw(raw: (i64, i64, String, String, String, bool)) -> Result<Account> {
    let (id, user_id, name, kind, balance, is_default) = raw;
    Ok(Account {
        id,
        user_id,
        name,
        kind: AccountType::parse(&kind)
            .ok_or_else(|| Error::Corrupt(format!("bad account type '{}'", kind)))?,
        balance: parse_amount(&balance)?,
        is_default,
    })
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<User> {
    let mut stmt = conn.prepare("SELECT id, email, name FROM users WHERE email=?1")?;
    stmt.query_row(params![email], |r| {
        Ok(User {
            id: r.get(0)?,
            email: r.get(1)?,
            name: r.get(2)?,
        })
    })
    .optional()?
    .ok_or(Error::Unauthorized)
}

pub fn get_user(conn: &Connection, id: i64) -> Result<User> {
    let mut stmt = conn.prepare("SELECT id, email, name FROM users WHERE id=?1")?;
    stmt.query_row(params![id], |r| {
        Ok(User {
            id: r.get(0)?,
            email: r.get(1)?,
            name: r.get(2)?,
        })
    })
    .optional()?
    .ok_or(Error::NotFound("user"))
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, email, name FROM users ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok(User {
            id: r.get(0)?,
            email: r.get(1)?,
            name: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Fetch an account owned by `user_id`. Wrong owner is indistinguishable
/// from a missing row.
pub fn get_account(conn: &Connection, user_id: i64, account_id: i64) -> Result<Account> {
    let sql = format!(
        "SELECT {} FROM accounts WHERE id=?1 AND user_id=?2",
        ACCOUNT_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let raw = stmt
        .query_row(params![account_id, user_id], account_from_row)
        .optional()?;
    match raw {
        Some(raw) => account_from_raw(raw),
        None => Err(Error::NotFound("account")),
    }
}

pub fn default_account(conn: &Connection, user_id: i64) -> Result<Option<Account>> {
    let sql = format!(
        "SELECT {} FROM accounts WHERE user_id=?1 AND is_default=1",
        ACCOUNT_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let raw = stmt.query_row(params![user_id], account_from_row).optional()?;
    raw.map(account_from_raw).transpose()
}

pub fn list_accounts(conn: &Connection, user_id: i64) -> Result<Vec<Account>> {
    let sql = format!(
        "SELECT {} FROM accounts WHERE user_id=?1 ORDER BY name",
        ACCOUNT_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], account_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(account_from_raw(row?)?);
    }
    Ok(out)
}

pub fn get_transaction(conn: &Connection, user_id: i64, id: i64) -> Result<Transaction> {
    let sql = format!(
        "SELECT {} FROM transactions WHERE id=?1 AND user_id=?2",
        TX_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let raw = stmt.query_row(params![id, user_id], raw_tx).optional()?;
    match raw {
        Some(raw) => tx_from_raw(raw),
        None => Err(Error::NotFound("transaction")),
    }
}

pub fn list_transactions(
    conn: &Connection,
    user_id: i64,
    account_id: Option<i64>,
    limit: Option<usize>,
) -> Result<Vec<Transaction>> {
    let mut sql = format!(
        "SELECT {} FROM transactions WHERE user_id=?1",
        TX_COLS
    );
    if account_id.is_some() {
        sql.push_str(" AND account_id=?2");
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {}", n));
    }
    let mut stmt = conn.prepare(&sql)?;
    let mut out = Vec::new();
    let collect = |rows: &mut rusqlite::Rows| -> Result<Vec<RawTx>> {
        let mut raws = Vec::new();
        while let Some(r) = rows.next()? {
            raws.push(raw_tx(r)?);
        }
        Ok(raws)
    };
    let raws = if let Some(acct) = account_id {
        let mut rows = stmt.query(params![user_id, acct])?;
        collect(&mut rows)?
    } else {
        let mut rows = stmt.query(params![user_id])?;
        collect(&mut rows)?
    };
    for raw in raws {
        out.push(tx_from_raw(raw)?);
    }
    Ok(out)
}

/// All of a user's transactions dated within the half-open window
/// [from, to).
pub fn transactions_in_window(
    conn: &Connection,
    user_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {} FROM transactions WHERE user_id=?1 AND date>=?2 AND date<?3 ORDER BY date, id",
        TX_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![user_id, fmt_ts(from), fmt_ts(to)])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(tx_from_raw(raw_tx(r)?)?);
    }
    Ok(out)
}

/// Sum of EXPENSE amounts on one account within [from, to], accumulated as
/// decimals in Rust. SQLite's SUM would coerce the TEXT amounts to floats.
pub fn sum_expenses(
    conn: &Connection,
    user_id: i64,
    account_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions
         WHERE user_id=?1 AND account_id=?2 AND type='EXPENSE' AND date>=?3 AND date<=?4",
    )?;
    let mut rows = stmt.query(params![user_id, account_id, fmt_ts(from), fmt_ts(to)])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let s: String = r.get(0)?;
        total += parse_amount(&s)?;
    }
    Ok(total)
}

/// Adjust an account's stored balance by `delta`. Must run inside the
/// caller's store transaction so the read-modify-write is serialized with
/// the row mutation that produced the delta.
pub fn apply_balance_delta(conn: &Connection, account_id: i64, delta: Decimal) -> Result<()> {
    let balance: Option<String> = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .optional()?;
    let balance = balance.ok_or(Error::NotFound("account"))?;
    let new_balance = parse_amount(&balance)? + delta;
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![new_balance.to_string(), account_id],
    )?;
    Ok(())
}

fn budget_from_row(r: &Row) -> rusqlite::Result<(i64, i64, String, Option<String>)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
}

fn budget_from_raw(raw: (i64, i64, String, Option<String>)) -> Result<Budget> {
    let (id, user_id, amount, last_alert_sent) = raw;
    Ok(Budget {
        id,
        user_id,
        amount: parse_amount(&amount)?,
        last_alert_sent: last_alert_sent.as_deref().map(parse_ts).transpose()?,
    })
}

pub fn get_budget(conn: &Connection, user_id: i64) -> Result<Option<Budget>> {
    let mut stmt = conn
        .prepare("SELECT id, user_id, amount, last_alert_sent FROM budgets WHERE user_id=?1")?;
    let raw = stmt.query_row(params![user_id], budget_from_row).optional()?;
    raw.map(budget_from_raw).transpose()
}

pub fn list_budgets(conn: &Connection) -> Result<Vec<Budget>> {
    let mut stmt =
        conn.prepare("SELECT id, user_id, amount, last_alert_sent FROM budgets ORDER BY id")?;
    let rows = stmt.query_map([], budget_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(budget_from_raw(row?)?);
    }
    Ok(out)
}

/// One budget per owner: update the amount if a row exists, create it
/// otherwise. The alert stamp survives amount changes.
pub fn upsert_budget(conn: &Connection, user_id: i64, amount: Decimal) -> Result<Budget> {
    conn.execute(
        "INSERT INTO budgets(user_id, amount) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET amount=excluded.amount",
        params![user_id, amount.to_string()],
    )?;
    get_budget(conn, user_id)?.ok_or(Error::NotFound("budget"))
}
