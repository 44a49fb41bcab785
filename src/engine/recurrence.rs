// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurring-transaction schedule: due-date arithmetic, the daily due scan,
//! and idempotent materialization of one occurrence per due cycle.

use chrono::{DateTime, Duration, Months, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{Recurrence, RecurringInterval, Transaction, TxStatus};
use crate::store;
use crate::utils::fmt_ts;

/// Next occurrence after `from`. Pure: the same function sets the first due
/// date at creation time and advances it at processing time. Month and year
/// steps clamp into shorter months (Jan 31 + 1 month = Feb 29 or Feb 28);
/// past the calendar's representable horizon they saturate at the maximum
/// timestamp, which parks the schedule instead of leaving it due forever.
pub fn next_date(from: DateTime<Utc>, interval: RecurringInterval) -> DateTime<Utc> {
    let horizon = DateTime::<Utc>::MAX_UTC;
    match interval {
        RecurringInterval::Daily => from + Duration::days(1),
        RecurringInterval::Weekly => from + Duration::days(7),
        RecurringInterval::Monthly => from.checked_add_months(Months::new(1)).unwrap_or(horizon),
        RecurringInterval::Yearly => from.checked_add_months(Months::new(12)).unwrap_or(horizon),
    }
}

/// A recurring transaction is due when it has never been processed, or its
/// next scheduled occurrence has passed. Pending transactions never fire.
pub fn is_due(t: &Transaction, now: DateTime<Utc>) -> bool {
    if t.status != TxStatus::Completed {
        return false;
    }
    match t.recurrence {
        Recurrence::OneTime => false,
        Recurrence::Recurring {
            last_processed: None,
            ..
        } => true,
        Recurrence::Recurring { next_due, .. } => next_due <= now,
    }
}

/// One unit of work for the dispatcher: process a single due transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    pub transaction_id: i64,
    pub user_id: i64,
}

/// The daily scan. Emits one independent work item per due transaction so
/// one failure cannot block the rest.
pub fn scan_due(conn: &Connection, now: DateTime<Utc>) -> Result<Vec<WorkItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id FROM transactions
         WHERE is_recurring=1 AND status='COMPLETED'
           AND (last_processed IS NULL OR next_recurring_date<=?1)
         ORDER BY id",
    )?;
    let rows = stmt.query_map(params![fmt_ts(now)], |r| {
        Ok(WorkItem {
            transaction_id: r.get(0)?,
            user_id: r.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// What one delivery of a `transaction.recurring.process` signal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// A new one-time transaction was created with this id.
    Materialized(i64),
    /// Re-delivered after a successful run, or edited out of due-ness.
    SkippedNotDue,
    /// The recurring transaction or its account no longer exists.
    SkippedMissing,
}

/// Process one due recurring transaction. Everything happens in a single
/// IMMEDIATE store transaction: due-ness is re-checked against the freshly
/// read row, the occurrence is materialized as a one-time transaction dated
/// `now`, the balance delta is applied, and the schedule advances. A
/// redelivered signal re-reads the advanced schedule and no-ops.
pub fn process_recurring(
    conn: &mut Connection,
    transaction_id: i64,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<ProcessOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let original = match store::get_transaction(&tx, user_id, transaction_id) {
        Ok(t) => t,
        Err(Error::NotFound(_)) => {
            warn!(transaction_id, user_id, "recurring transaction vanished; skipping");
            return Ok(ProcessOutcome::SkippedMissing);
        }
        Err(e) => return Err(e),
    };
    if !is_due(&original, now) {
        return Ok(ProcessOutcome::SkippedNotDue);
    }
    let interval = match original.recurrence {
        Recurrence::Recurring { interval, .. } => interval,
        Recurrence::OneTime => return Ok(ProcessOutcome::SkippedNotDue),
    };
    match store::get_account(&tx, user_id, original.account_id) {
        Ok(_) => {}
        Err(Error::NotFound(_)) => {
            warn!(
                transaction_id,
                account_id = original.account_id,
                "account behind recurring transaction is gone; skipping"
            );
            return Ok(ProcessOutcome::SkippedMissing);
        }
        Err(e) => return Err(e),
    }

    // Materialized copies are one-time so they can never re-enter the scan.
    let description = match &original.description {
        Some(d) => format!("{} (Recurring)", d),
        None => "(Recurring)".to_string(),
    };
    tx.execute(
        "INSERT INTO transactions(user_id, account_id, type, amount, category, date, description,
                                  status, is_recurring)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'COMPLETED', 0)",
        params![
            user_id,
            original.account_id,
            original.kind.as_str(),
            original.amount.to_string(),
            original.category,
            fmt_ts(now),
            description,
        ],
    )?;
    let new_id = tx.last_insert_rowid();
    store::apply_balance_delta(&tx, original.account_id, original.signed_effect())?;
    tx.execute(
        "UPDATE transactions SET last_processed=?1, next_recurring_date=?2 WHERE id=?3",
        params![
            fmt_ts(now),
            fmt_ts(next_date(now, interval)),
            transaction_id,
        ],
    )?;
    tx.commit()?;
    Ok(ProcessOutcome::Materialized(new_id))
}
