// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::engine::alerts::percentage_used;
use crate::error::Error;
use crate::store;
use crate::utils::{maybe_print_json, month_start, parse_decimal, parse_now, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    if amount <= Decimal::ZERO {
        return Err(Error::invalid("amount", "Amount must be a positive number.").into());
    }
    let budget = store::upsert_budget(conn, user.id, amount)?;
    println!("Monthly budget set to {}", budget.amount);
    Ok(())
}

#[derive(Serialize)]
struct BudgetStatus {
    budget_amount: Decimal,
    current_expenses: Decimal,
    percentage_used: Decimal,
}

/// Budget usage is always measured against the default account, month to
/// date.
fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let now = parse_now(sub.get_one::<String>("now"))?;

    let budget = match store::get_budget(conn, user.id)? {
        Some(b) => b,
        None => {
            println!("No budget set");
            return Ok(());
        }
    };
    let account = match store::default_account(conn, user.id)? {
        Some(a) => a,
        None => {
            println!("No default account");
            return Ok(());
        }
    };
    let expenses = store::sum_expenses(conn, user.id, account.id, month_start(now), now)?;
    let status = BudgetStatus {
        budget_amount: budget.amount,
        current_expenses: expenses,
        percentage_used: percentage_used(expenses, budget.amount).round_dp(1),
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &status)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Budget", "Spent (MTD)", "Used %", "Account"],
            vec![vec![
                status.budget_amount.to_string(),
                format!("{:.2}", status.current_expenses),
                status.percentage_used.to_string(),
                account.name,
            ]],
        )
    );
    Ok(())
}
