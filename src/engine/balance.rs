// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance maintenance: every transaction-row mutation and its balance
//! delta commit in one store transaction, and deltas are always computed
//! from rows re-read inside that transaction, never from client-echoed
//! state.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use rust_decimal::Decimal;

use crate::error::{Error, FieldErrors, Result};
use crate::models::{
    signed_effect, Account, AccountType, Recurrence, RecurringInterval, Transaction, TxStatus,
    TxType,
};
use crate::store;
use crate::utils::fmt_ts;

use super::recurrence::next_date;

/// Client-supplied fields for creating or overwriting a transaction.
/// `recurring: Some(interval)` is the only way to ask for a schedule, so a
/// recurring transaction without an interval cannot be expressed.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub account_id: i64,
    pub kind: TxType,
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub status: TxStatus,
    pub recurring: Option<RecurringInterval>,
}

impl TransactionInput {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        if self.amount <= Decimal::ZERO {
            errors.insert("amount", "Amount must be a positive number.".into());
        }
        if self.category.trim().is_empty() {
            errors.insert("category", "Category is required.".into());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

pub fn create_transaction(
    conn: &mut Connection,
    user_id: i64,
    input: &TransactionInput,
) -> Result<Transaction> {
    input.validate()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let account = store::get_account(&tx, user_id, input.account_id)?;

    // The same pure function sets the first due date here and advances it
    // when the scheduler processes the transaction.
    let next_due = input.recurring.map(|iv| next_date(input.date, iv));
    tx.execute(
        "INSERT INTO transactions(user_id, account_id, type, amount, category, date, description,
                                  status, is_recurring, recurring_interval, next_recurring_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            user_id,
            account.id,
            input.kind.as_str(),
            input.amount.to_string(),
            input.category,
            fmt_ts(input.date),
            input.description,
            input.status.as_str(),
            input.recurring.is_some(),
            input.recurring.map(|iv| iv.as_str()),
            next_due.map(fmt_ts),
        ],
    )?;
    let id = tx.last_insert_rowid();
    store::apply_balance_delta(&tx, account.id, signed_effect(input.kind, input.amount))?;
    let created = store::get_transaction(&tx, user_id, id)?;
    tx.commit()?;
    Ok(created)
}

pub fn update_transaction(
    conn: &mut Connection,
    user_id: i64,
    id: i64,
    input: &TransactionInput,
) -> Result<Transaction> {
    input.validate()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let original = store::get_transaction(&tx, user_id, id)?;
    let account = store::get_account(&tx, user_id, input.account_id)?;

    let old_effect = original.signed_effect();
    let new_effect = signed_effect(input.kind, input.amount);

    // A schedule that survives the edit keeps its processing history; one
    // that is added or removed starts clean.
    let last_processed = match (&original.recurrence, input.recurring) {
        (Recurrence::Recurring { last_processed, .. }, Some(_)) => *last_processed,
        _ => None,
    };
    let next_due = input.recurring.map(|iv| next_date(input.date, iv));

    tx.execute(
        "UPDATE transactions
         SET account_id=?1, type=?2, amount=?3, category=?4, date=?5, description=?6, status=?7,
             is_recurring=?8, recurring_interval=?9, last_processed=?10, next_recurring_date=?11
         WHERE id=?12 AND user_id=?13",
        params![
            account.id,
            input.kind.as_str(),
            input.amount.to_string(),
            input.category,
            fmt_ts(input.date),
            input.description,
            input.status.as_str(),
            input.recurring.is_some(),
            input.recurring.map(|iv| iv.as_str()),
            last_processed.map(fmt_ts),
            next_due.map(fmt_ts),
            id,
            user_id,
        ],
    )?;

    if account.id == original.account_id {
        store::apply_balance_delta(&tx, account.id, new_effect - old_effect)?;
    } else {
        // Moved between accounts: reverse on the old one, apply on the new.
        store::apply_balance_delta(&tx, original.account_id, -old_effect)?;
        store::apply_balance_delta(&tx, account.id, new_effect)?;
    }

    let updated = store::get_transaction(&tx, user_id, id)?;
    tx.commit()?;
    Ok(updated)
}

/// Delete one or more transactions, reversing their balance effects. The
/// reversal is grouped per account, so a batch spanning accounts decrements
/// each account by exactly its own share. Repeated ids count once: each
/// row's effect is reversed exactly one time.
pub fn delete_transactions(conn: &mut Connection, user_id: i64, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Err(Error::invalid("ids", "At least one transaction id is required."));
    }
    let ids: BTreeSet<i64> = ids.iter().copied().collect();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut by_account: BTreeMap<i64, Decimal> = BTreeMap::new();
    for &id in &ids {
        let t = store::get_transaction(&tx, user_id, id)?;
        *by_account.entry(t.account_id).or_insert(Decimal::ZERO) += t.signed_effect();
    }
    for &id in &ids {
        tx.execute(
            "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
    }
    for (account_id, effect) in by_account {
        store::apply_balance_delta(&tx, account_id, -effect)?;
    }
    tx.commit()?;
    Ok(ids.len())
}

/// Create an account. The owner's first account becomes the default
/// regardless of the flag; making a later account default unsets the
/// previous one in the same store transaction.
pub fn create_account(
    conn: &mut Connection,
    user_id: i64,
    name: &str,
    kind: AccountType,
    opening_balance: Decimal,
    is_default: bool,
) -> Result<Account> {
    if name.trim().is_empty() {
        return Err(Error::invalid("name", "Account name is required."));
    }
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    store::get_user(&tx, user_id)?;

    let existing: i64 = tx.query_row(
        "SELECT COUNT(*) FROM accounts WHERE user_id=?1",
        params![user_id],
        |r| r.get(0),
    )?;
    let make_default = existing == 0 || is_default;
    if make_default {
        tx.execute(
            "UPDATE accounts SET is_default=0 WHERE user_id=?1 AND is_default=1",
            params![user_id],
        )?;
    }
    tx.execute(
        "INSERT INTO accounts(user_id, name, type, balance, opening_balance, is_default)
         VALUES (?1, ?2, ?3, ?4, ?4, ?5)",
        params![
            user_id,
            name,
            kind.as_str(),
            opening_balance.to_string(),
            make_default,
        ],
    )?;
    let id = tx.last_insert_rowid();
    let account = store::get_account(&tx, user_id, id)?;
    tx.commit()?;
    Ok(account)
}

pub fn set_default_account(
    conn: &mut Connection,
    user_id: i64,
    account_id: i64,
) -> Result<Account> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    store::get_account(&tx, user_id, account_id)?;
    tx.execute(
        "UPDATE accounts SET is_default=0 WHERE user_id=?1 AND is_default=1",
        params![user_id],
    )?;
    tx.execute(
        "UPDATE accounts SET is_default=1 WHERE id=?1 AND user_id=?2",
        params![account_id, user_id],
    )?;
    let account = store::get_account(&tx, user_id, account_id)?;
    tx.commit()?;
    Ok(account)
}
