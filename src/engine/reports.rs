// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly report pipeline: aggregate each user's prior-month activity and
//! send one report notification per user.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::warn;

use crate::error::Result;
use crate::insights::{fallback_insights, InsightGenerator};
use crate::models::{MonthlyStats, TxType, User};
use crate::notify::{EmailMessage, EmailTemplate, NotificationSink};
use crate::store;
use crate::utils::{month_label, prior_month_window};

/// Aggregate one user's transactions dated in [from, to).
pub fn monthly_stats(
    conn: &Connection,
    user_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<MonthlyStats> {
    let txs = store::transactions_in_window(conn, user_id, from, to)?;
    let mut stats = MonthlyStats {
        transaction_count: txs.len(),
        ..MonthlyStats::default()
    };
    for t in txs {
        match t.kind {
            TxType::Income => stats.total_income += t.amount,
            TxType::Expense => {
                stats.total_expenses += t.amount;
                *stats.by_category.entry(t.category).or_default() += t.amount;
            }
        }
    }
    Ok(stats)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Generate and send the prior-month report for every user. A failure for
/// one user is logged and the sweep continues.
pub fn generate_monthly_reports(
    conn: &mut Connection,
    now: DateTime<Utc>,
    sink: &dyn NotificationSink,
    insights: &dyn InsightGenerator,
) -> Result<ReportSummary> {
    let users = store::list_users(conn)?;
    let (from, to) = prior_month_window(now);
    let label = month_label(from);

    let mut summary = ReportSummary::default();
    for user in users {
        match report_for_user(conn, &user, from, to, &label, sink, insights) {
            Ok(()) => summary.processed += 1,
            Err(e) => {
                summary.failed += 1;
                warn!(user_id = user.id, error = %e, "monthly report failed");
            }
        }
    }
    Ok(summary)
}

fn report_for_user(
    conn: &Connection,
    user: &User,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    label: &str,
    sink: &dyn NotificationSink,
    insights: &dyn InsightGenerator,
) -> Result<()> {
    let stats = monthly_stats(conn, user.id, from, to)?;

    // Insight generation is best-effort; a broken generator degrades to
    // the static lines instead of blocking the report.
    let lines = insights.generate(&stats, label).unwrap_or_else(|e| {
        warn!(user_id = user.id, error = %e, "insight generation failed; using fallback");
        fallback_insights()
    });

    sink.send(&EmailMessage {
        to: user.email.clone(),
        subject: format!("Your Monthly Financial Report for {}", label),
        template: EmailTemplate::MonthlyReport {
            user_name: user.name.clone(),
            month: label.to_string(),
            stats,
            insights: lines,
        },
    })
}
