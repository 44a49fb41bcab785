// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger integrity sweep. The headline check is the balance invariant:
//! every account's stored balance must equal its opening balance plus the
//! signed effects of its live transactions.

use anyhow::Result;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::models::TxType;
use crate::utils::pretty_table;

/// One finding: (issue kind, detail).
pub type Finding = (String, String);

pub fn handle(conn: &Connection) -> Result<()> {
    let findings = scan(conn)?;
    if findings.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = findings.into_iter().map(|(k, d)| vec![k, d]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn scan(conn: &Connection) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    // 1) Unparseable amounts, then balance drift. An account with a corrupt
    // amount anywhere in its ledger gets the corrupt_amount finding and no
    // drift check: the expected balance cannot be computed for it.
    let mut stmt =
        conn.prepare("SELECT id, name, balance, opening_balance FROM accounts ORDER BY id")?;
    let accounts = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    for acc in accounts {
        let (id, name, balance_s, opening_s) = acc?;
        let mut corrupt = false;
        let balance = balance_s.parse::<Decimal>().unwrap_or_else(|_| {
            findings.push((
                "corrupt_amount".into(),
                format!("account '{}': balance '{}'", name, balance_s),
            ));
            corrupt = true;
            Decimal::ZERO
        });
        let mut expected = opening_s.parse::<Decimal>().unwrap_or_else(|_| {
            findings.push((
                "corrupt_amount".into(),
                format!("account '{}': opening balance '{}'", name, opening_s),
            ));
            corrupt = true;
            Decimal::ZERO
        });

        let mut tstmt =
            conn.prepare("SELECT id, type, amount FROM transactions WHERE account_id=?1")?;
        let mut cur = tstmt.query(params![id])?;
        while let Some(r) = cur.next()? {
            let tx_id: i64 = r.get(0)?;
            let kind: String = r.get(1)?;
            let amount_s: String = r.get(2)?;
            match (TxType::parse(&kind), amount_s.parse::<Decimal>()) {
                (Some(k), Ok(amount)) => {
                    expected += crate::models::signed_effect(k, amount);
                }
                _ => {
                    findings.push((
                        "corrupt_amount".into(),
                        format!("transaction {}: type '{}', amount '{}'", tx_id, kind, amount_s),
                    ));
                    corrupt = true;
                }
            }
        }
        if !corrupt && expected != balance {
            findings.push((
                "balance_drift".into(),
                format!("account '{}': stored {}, expected {}", name, balance, expected),
            ));
        }
    }

    // 2) Recurring rows missing their schedule columns
    let mut stmt2 = conn.prepare(
        "SELECT id FROM transactions
         WHERE is_recurring=1 AND (recurring_interval IS NULL OR next_recurring_date IS NULL)",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        findings.push((
            "recurring_missing_schedule".into(),
            format!("transaction {}", id),
        ));
    }

    // 3) Queue items that keep failing
    let mut stmt3 = conn.prepare(
        "SELECT id, transaction_id, attempts FROM work_queue
         WHERE processed_at IS NULL AND attempts >= 3",
    )?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let (id, txid, attempts): (i64, i64, i64) = (r.get(0)?, r.get(1)?, r.get(2)?);
        findings.push((
            "stuck_queue_item".into(),
            format!("queue item {} for transaction {} ({} attempts)", id, txid, attempts),
        ));
    }

    Ok(findings)
}
