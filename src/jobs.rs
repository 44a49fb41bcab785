// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The scheduler: three fixed periodic jobs plus a durable work queue for
//! per-transaction recurring processing.
//!
//! Delivery is at-least-once everywhere. A job's `job_runs` stamp is only
//! written after the job succeeds, so a failed job reruns on the next
//! tick. A queue item is only marked processed after the worker's store
//! transaction commits, so a crash in between redelivers the item; the
//! worker re-checks due-ness and no-ops on redelivery.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{error, info};

use crate::engine::alerts::{self, AlertSummary};
use crate::engine::recurrence::{self, ProcessOutcome};
use crate::engine::reports::{self, ReportSummary};
use crate::error::Result;
use crate::insights::InsightGenerator;
use crate::notify::NotificationSink;
use crate::utils::{fmt_ts, parse_ts, same_month};

pub const EVENT_RECURRING_PROCESS: &str = "transaction.recurring.process";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    BudgetCheck,
    RecurringScan,
    MonthlyReport,
}

impl Job {
    pub const ALL: [Job; 3] = [Job::BudgetCheck, Job::RecurringScan, Job::MonthlyReport];

    pub fn name(&self) -> &'static str {
        match self {
            Job::BudgetCheck => "budget-check",
            Job::RecurringScan => "recurring-scan",
            Job::MonthlyReport => "monthly-report",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Job::ALL.into_iter().find(|j| j.name() == s)
    }

    /// Budget checks run every 6 hours, the recurring scan daily, and the
    /// monthly report on the first tick of each new calendar month.
    fn is_due(&self, last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match (self, last_run) {
            (_, None) => true,
            (Job::BudgetCheck, Some(t)) => now - t >= Duration::hours(6),
            (Job::RecurringScan, Some(t)) => now - t >= Duration::hours(24),
            (Job::MonthlyReport, Some(t)) => !same_month(t, now),
        }
    }
}

/// Per-owner burst cap on recurring processing, matching the dispatcher's
/// throttle of 10 items per owner per minute.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleConfig {
    pub per_owner_limit: i64,
    pub window: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            per_owner_limit: 10,
            window: Duration::seconds(60),
        }
    }
}

/// Collaborators the jobs need; injected so tests can fake them.
pub struct JobContext<'a> {
    pub sink: &'a dyn NotificationSink,
    pub insights: &'a dyn InsightGenerator,
    pub throttle: ThrottleConfig,
}

pub fn last_run(conn: &Connection, job: Job) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT last_run FROM job_runs WHERE name=?1",
            params![job.name()],
            |r| r.get(0),
        )
        .optional()?;
    raw.as_deref().map(parse_ts).transpose()
}

fn stamp_run(conn: &Connection, job: Job, now: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT INTO job_runs(name, last_run) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET last_run=excluded.last_run",
        params![job.name(), fmt_ts(now)],
    )?;
    Ok(())
}

/// Fan out: one queue item per due recurring transaction. A transaction
/// that already has a pending item is not enqueued again, so re-running
/// the scan does not multiply work.
pub fn enqueue_due(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    let mut added = 0;
    for item in recurrence::scan_due(conn, now)? {
        let pending: i64 = conn.query_row(
            "SELECT COUNT(*) FROM work_queue WHERE transaction_id=?1 AND processed_at IS NULL",
            params![item.transaction_id],
            |r| r.get(0),
        )?;
        if pending > 0 {
            continue;
        }
        conn.execute(
            "INSERT INTO work_queue(event, transaction_id, user_id, enqueued_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                EVENT_RECURRING_PROCESS,
                item.transaction_id,
                item.user_id,
                fmt_ts(now)
            ],
        )?;
        added += 1;
    }
    Ok(added)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub processed: usize,
    pub materialized: usize,
    pub deferred: usize,
    pub failed: usize,
}

/// Work through pending queue items oldest-first. Items beyond an owner's
/// throttle window stay pending for the next tick; items whose worker
/// fails stay pending too and are retried.
pub fn drain_queue(
    conn: &mut Connection,
    now: DateTime<Utc>,
    throttle: &ThrottleConfig,
) -> Result<DrainStats> {
    let pending: Vec<(i64, i64, i64)> = {
        let mut stmt = conn.prepare(
            "SELECT id, transaction_id, user_id FROM work_queue
             WHERE event=?1 AND processed_at IS NULL
             ORDER BY enqueued_at, id",
        )?;
        let rows = stmt.query_map(params![EVENT_RECURRING_PROCESS], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        out
    };

    let window_start = fmt_ts(now - throttle.window);
    let mut stats = DrainStats::default();
    for (queue_id, transaction_id, user_id) in pending {
        let recent: i64 = conn.query_row(
            "SELECT COUNT(*) FROM work_queue
             WHERE user_id=?1 AND processed_at IS NOT NULL AND processed_at>=?2",
            params![user_id, window_start],
            |r| r.get(0),
        )?;
        if recent >= throttle.per_owner_limit {
            stats.deferred += 1;
            continue;
        }

        conn.execute(
            "UPDATE work_queue SET attempts=attempts+1 WHERE id=?1",
            params![queue_id],
        )?;
        match recurrence::process_recurring(conn, transaction_id, user_id, now) {
            Ok(outcome) => {
                conn.execute(
                    "UPDATE work_queue SET processed_at=?1 WHERE id=?2",
                    params![fmt_ts(now), queue_id],
                )?;
                stats.processed += 1;
                if let ProcessOutcome::Materialized(_) = outcome {
                    stats.materialized += 1;
                }
            }
            Err(e) => {
                stats.failed += 1;
                error!(
                    queue_id,
                    transaction_id,
                    error = %e,
                    "recurring processing failed; item stays pending"
                );
            }
        }
    }
    Ok(stats)
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub ran: Vec<&'static str>,
    pub alerts: Option<AlertSummary>,
    pub reports: Option<ReportSummary>,
    pub enqueued: usize,
    pub drain: DrainStats,
}

/// One scheduler tick: run whichever jobs are due, then drain the queue.
/// Jobs are isolated; a failing job is logged and retried next tick
/// because its stamp is only written on success.
pub fn tick(conn: &mut Connection, now: DateTime<Utc>, ctx: &JobContext) -> Result<TickReport> {
    let mut report = TickReport::default();
    for job in Job::ALL {
        let last = last_run(conn, job)?;
        if !job.is_due(last, now) {
            continue;
        }
        match run_job(conn, job, now, ctx, &mut report) {
            Ok(()) => {
                stamp_run(conn, job, now)?;
                report.ran.push(job.name());
                info!(job = job.name(), "job completed");
            }
            Err(e) => {
                error!(job = job.name(), error = %e, "job failed; will retry next tick");
            }
        }
    }
    report.drain = drain_queue(conn, now, &ctx.throttle)?;
    Ok(report)
}

/// Run one job unconditionally (the `jobs run <name>` surface). Stamps on
/// success like the tick path.
pub fn force_run(
    conn: &mut Connection,
    job: Job,
    now: DateTime<Utc>,
    ctx: &JobContext,
) -> Result<TickReport> {
    let mut report = TickReport::default();
    run_job(conn, job, now, ctx, &mut report)?;
    stamp_run(conn, job, now)?;
    report.ran.push(job.name());
    if job == Job::RecurringScan {
        report.drain = drain_queue(conn, now, &ctx.throttle)?;
    }
    Ok(report)
}

fn run_job(
    conn: &mut Connection,
    job: Job,
    now: DateTime<Utc>,
    ctx: &JobContext,
    report: &mut TickReport,
) -> Result<()> {
    match job {
        Job::BudgetCheck => {
            report.alerts = Some(alerts::check_budgets(conn, now, ctx.sink)?);
        }
        Job::RecurringScan => {
            report.enqueued = enqueue_due(conn, now)?;
        }
        Job::MonthlyReport => {
            report.reports = Some(reports::generate_monthly_reports(
                conn,
                now,
                ctx.sink,
                ctx.insights,
            )?);
        }
    }
    Ok(())
}
