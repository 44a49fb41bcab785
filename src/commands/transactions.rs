// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::engine::balance::{self, TransactionInput};
use crate::models::{Recurrence, RecurringInterval, TxStatus, TxType};
use crate::store;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("delete", sub)) => delete(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn input_from_args(sub: &clap::ArgMatches) -> Result<TransactionInput> {
    let kind = TxType::parse(sub.get_one::<String>("type").unwrap())
        .context("Invalid type, expected income|expense")?;
    let recurring = sub
        .get_one::<String>("recurring")
        .map(|s| {
            RecurringInterval::parse(s)
                .context("Invalid interval, expected daily|weekly|monthly|yearly")
        })
        .transpose()?;
    Ok(TransactionInput {
        account_id: *sub.get_one::<i64>("account").unwrap(),
        kind,
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        category: sub.get_one::<String>("category").unwrap().clone(),
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        description: sub.get_one::<String>("description").cloned(),
        status: if sub.get_flag("pending") {
            TxStatus::Pending
        } else {
            TxStatus::Completed
        },
        recurring,
    })
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let input = input_from_args(sub)?;
    let tx = balance::create_transaction(conn, user.id, &input)?;
    match &tx.recurrence {
        Recurrence::Recurring { next_due, .. } => println!(
            "Recorded {} {} in '{}' (id {}), next occurrence {}",
            tx.kind.as_str(),
            tx.amount,
            tx.category,
            tx.id,
            next_due.format("%Y-%m-%d"),
        ),
        Recurrence::OneTime => println!(
            "Recorded {} {} in '{}' (id {})",
            tx.kind.as_str(),
            tx.amount,
            tx.category,
            tx.id
        ),
    }
    Ok(())
}

fn update(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let input = input_from_args(sub)?;
    let tx = balance::update_transaction(conn, user.id, id, &input)?;
    println!("Updated transaction {} ({} {})", tx.id, tx.kind.as_str(), tx.amount);
    Ok(())
}

fn delete(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let ids: Vec<i64> = sub.get_many::<i64>("ids").unwrap().copied().collect();
    let n = balance::delete_transactions(conn, user.id, &ids)?;
    println!("Deleted {} transaction(s)", n);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let account_id = sub.get_one::<i64>("account").copied();
    let limit = sub.get_one::<usize>("limit").copied();
    let txs = store::list_transactions(conn, user.id, account_id, limit)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &txs)? {
        return Ok(());
    }

    let names: HashMap<i64, String> = store::list_accounts(conn, user.id)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let data = txs
        .into_iter()
        .map(|t| {
            let schedule = match &t.recurrence {
                Recurrence::OneTime => String::new(),
                Recurrence::Recurring {
                    interval, next_due, ..
                } => format!("{} (next {})", interval.as_str(), next_due.format("%Y-%m-%d")),
            };
            vec![
                t.id.to_string(),
                t.date.format("%Y-%m-%d").to_string(),
                names.get(&t.account_id).cloned().unwrap_or_default(),
                t.kind.as_str().to_string(),
                t.amount.to_string(),
                t.category.clone(),
                t.status.as_str().to_string(),
                schedule,
                t.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Date", "Account", "Type", "Amount", "Category", "Status", "Schedule", "Description"],
            data,
        )
    );
    Ok(())
}
