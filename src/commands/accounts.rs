// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::engine::balance;
use crate::models::AccountType;
use crate::store;
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("set-default", sub)) => set_default(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let name = sub.get_one::<String>("name").unwrap();
    let kind = AccountType::parse(sub.get_one::<String>("type").unwrap())
        .context("Invalid account type, expected current|savings")?;
    let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
    let is_default = sub.get_flag("default");

    let account = balance::create_account(conn, user.id, name, kind, balance, is_default)?;
    println!(
        "Added account '{}' ({}, balance {}){}",
        account.name,
        account.kind.as_str(),
        account.balance,
        if account.is_default { " [default]" } else { "" }
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let accounts = store::list_accounts(conn, user.id)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
        return Ok(());
    }
    let data = accounts
        .into_iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.name,
                a.kind.as_str().to_string(),
                format!("{:.2}", a.balance),
                if a.is_default { "yes".into() } else { "".into() },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Id", "Name", "Type", "Balance", "Default"], data)
    );
    Ok(())
}

fn set_default(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = store::find_user_by_email(conn, sub.get_one::<String>("user").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let account = balance::set_default_account(conn, user.id, id)?;
    println!("'{}' is now the default account", account.name);
    Ok(())
}
