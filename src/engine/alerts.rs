// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget alert evaluation: month-to-date spend on the owner's default
//! account against the budget amount, alerting at most once per calendar
//! month.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use rust_decimal::Decimal;
use tracing::{debug, error};

use crate::error::Result;
use crate::models::Budget;
use crate::notify::{EmailMessage, EmailTemplate, NotificationSink};
use crate::store;
use crate::utils::{fmt_ts, month_start, same_month};

pub fn alert_threshold() -> Decimal {
    Decimal::from(80)
}

pub fn percentage_used(total_expenses: Decimal, budget_amount: Decimal) -> Decimal {
    if budget_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    total_expenses / budget_amount * Decimal::from(100)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AlertSummary {
    pub checked: usize,
    pub alerted: usize,
    pub failed: usize,
}

/// Sweep every budget. One budget's failure is logged and does not stop
/// the others.
pub fn check_budgets(
    conn: &mut Connection,
    now: DateTime<Utc>,
    sink: &dyn NotificationSink,
) -> Result<AlertSummary> {
    let mut summary = AlertSummary::default();
    for budget in store::list_budgets(conn)? {
        summary.checked += 1;
        match check_budget(conn, &budget, now, sink) {
            Ok(true) => summary.alerted += 1,
            Ok(false) => {}
            Err(e) => {
                summary.failed += 1;
                error!(budget_id = budget.id, error = %e, "budget check failed");
            }
        }
    }
    Ok(summary)
}

/// Evaluate one budget; returns whether an alert went out. The stamp is a
/// conditional update keyed on the last_alert_sent value this run read, so
/// two concurrent evaluators cannot both send. The send happens before the
/// commit: a send failure rolls the stamp back and a retry may resend.
fn check_budget(
    conn: &mut Connection,
    budget: &Budget,
    now: DateTime<Utc>,
    sink: &dyn NotificationSink,
) -> Result<bool> {
    let account = match store::default_account(conn, budget.user_id)? {
        Some(a) => a,
        None => {
            debug!(user_id = budget.user_id, "no default account; skipping budget");
            return Ok(false);
        }
    };

    let total_expenses =
        store::sum_expenses(conn, budget.user_id, account.id, month_start(now), now)?;
    let used = percentage_used(total_expenses, budget.amount);
    if used < alert_threshold() {
        return Ok(false);
    }
    if let Some(last) = budget.last_alert_sent {
        if same_month(last, now) {
            return Ok(false);
        }
    }

    let user = store::get_user(conn, budget.user_id)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let stamped = tx.execute(
        "UPDATE budgets SET last_alert_sent=?1 WHERE id=?2 AND last_alert_sent IS ?3",
        params![
            fmt_ts(now),
            budget.id,
            budget.last_alert_sent.map(fmt_ts),
        ],
    )?;
    if stamped == 0 {
        // A concurrent evaluator stamped (and sent) first.
        return Ok(false);
    }
    sink.send(&EmailMessage {
        to: user.email.clone(),
        subject: format!("Budget Alert for {}", account.name),
        template: EmailTemplate::BudgetAlert {
            user_name: user.name,
            account_name: account.name,
            percentage_used: used.round_dp(1),
            budget_amount: budget.amount,
            total_expenses,
        },
    })?;
    tx.commit()?;
    Ok(true)
}
