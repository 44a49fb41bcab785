// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let email = sub.get_one::<String>("email").unwrap();
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute(
                "INSERT INTO users(email, name) VALUES (?1, ?2)",
                params![email, name],
            )?;
            println!("Added user '{}' <{}>", name, email);
        }
        Some(("list", _)) => {
            let users = store::list_users(conn)?;
            let data = users
                .into_iter()
                .map(|u| vec![u.id.to_string(), u.email, u.name])
                .collect();
            println!("{}", pretty_table(&["Id", "Email", "Name"], data));
        }
        _ => {}
    }
    Ok(())
}
