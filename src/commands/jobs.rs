// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::insights::{HttpInsightGenerator, InsightGenerator, NoInsights};
use crate::jobs::{self, Job, JobContext, ThrottleConfig, TickReport};
use crate::notify::LogSink;
use crate::utils::{parse_now, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("tick", sub)) => tick(conn, sub)?,
        Some(("run", sub)) => run(conn, sub)?,
        Some(("queue", _)) => queue(conn)?,
        _ => {}
    }
    Ok(())
}

fn insight_generator() -> Box<dyn InsightGenerator> {
    match HttpInsightGenerator::from_env() {
        Some(g) => Box::new(g),
        None => Box::new(NoInsights),
    }
}

fn print_report(report: &TickReport) {
    if report.ran.is_empty() {
        println!("No jobs due");
    } else {
        println!("Ran: {}", report.ran.join(", "));
    }
    if let Some(a) = report.alerts {
        println!(
            "Budgets: {} checked, {} alerted, {} failed",
            a.checked, a.alerted, a.failed
        );
    }
    if report.enqueued > 0 {
        println!("Enqueued {} recurring transaction(s)", report.enqueued);
    }
    if let Some(r) = report.reports {
        println!("Reports: {} sent, {} failed", r.processed, r.failed);
    }
    let d = report.drain;
    if d.processed + d.deferred + d.failed > 0 {
        println!(
            "Queue: {} processed ({} materialized), {} deferred, {} failed",
            d.processed, d.materialized, d.deferred, d.failed
        );
    }
}

fn tick(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let now = parse_now(sub.get_one::<String>("now"))?;
    let sink = LogSink;
    let insights = insight_generator();
    let ctx = JobContext {
        sink: &sink,
        insights: insights.as_ref(),
        throttle: ThrottleConfig::default(),
    };
    let report = jobs::tick(conn, now, &ctx)?;
    print_report(&report);
    Ok(())
}

fn run(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let job = Job::parse(name)
        .with_context(|| format!("Unknown job '{}', expected budget-check | recurring-scan | monthly-report", name))?;
    let now = parse_now(sub.get_one::<String>("now"))?;
    let sink = LogSink;
    let insights = insight_generator();
    let ctx = JobContext {
        sink: &sink,
        insights: insights.as_ref(),
        throttle: ThrottleConfig::default(),
    };
    let report = jobs::force_run(conn, job, now, &ctx)?;
    print_report(&report);
    Ok(())
}

fn queue(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, event, transaction_id, user_id, enqueued_at, attempts FROM work_queue
         WHERE processed_at IS NULL ORDER BY enqueued_at, id",
    )?;
    let rows = stmt.query_map(params![], |r| {
        Ok(vec![
            r.get::<_, i64>(0)?.to_string(),
            r.get::<_, String>(1)?,
            r.get::<_, i64>(2)?.to_string(),
            r.get::<_, i64>(3)?.to_string(),
            r.get::<_, String>(4)?,
            r.get::<_, i64>(5)?.to_string(),
        ])
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    println!(
        "{}",
        pretty_table(
            &["Id", "Event", "Transaction", "User", "Enqueued", "Attempts"],
            data,
        )
    );
    Ok(())
}
