// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::engine::reports::monthly_stats;
use crate::store;
use crate::utils::{maybe_print_json, month_label, parse_now, pretty_table, prior_month_window};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("monthly", sub)) => monthly(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn monthly(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let now = parse_now(sub.get_one::<String>("now"))?;
    let (from, to) = prior_month_window(now);
    let stats = monthly_stats(conn, user.id, from, to)?;

    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &stats)? {
        return Ok(());
    }

    println!("Report for {}", month_label(from));
    println!(
        "{}",
        pretty_table(
            &["Income", "Expenses", "Net", "Transactions"],
            vec![vec![
                format!("{:.2}", stats.total_income),
                format!("{:.2}", stats.total_expenses),
                format!("{:.2}", stats.net()),
                stats.transaction_count.to_string(),
            ]],
        )
    );
    if !stats.by_category.is_empty() {
        let data = stats
            .by_category
            .iter()
            .map(|(c, a)| vec![c.clone(), format!("{:.2}", a)])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent"], data));
    }
    Ok(())
}
