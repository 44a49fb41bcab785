// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;

use crate::error;

/// Canonical timestamp encoding for every date column: RFC 3339 UTC with
/// whole seconds. Fixed width, so string comparison in SQL matches
/// chronological order.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_ts(s: &str) -> error::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| error::Error::Corrupt(format!("bad timestamp '{}': {}", s, e)))
}

/// CLI date input: YYYY-MM-DD, taken as midnight UTC.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))?;
    let naive = d
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid date '{}'", s))?;
    Ok(Utc.from_utc_datetime(&naive))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Clock override for the `--now` flag: RFC 3339 timestamp or plain date,
/// defaulting to the real current time.
pub fn parse_now(s: Option<&String>) -> Result<DateTime<Utc>> {
    match s {
        None => Ok(Utc::now()),
        Some(s) => {
            if let Ok(ts) = parse_ts(s) {
                Ok(ts)
            } else {
                parse_date(s)
            }
        }
    }
}

/// Midnight UTC on the first day of `ts`'s calendar month.
pub fn month_start(ts: DateTime<Utc>) -> DateTime<Utc> {
    let first = NaiveDate::from_ymd_opt(ts.year(), ts.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_else(|| ts.naive_utc());
    Utc.from_utc_datetime(&first)
}

/// Half-open window covering the calendar month before `now`:
/// [first day of previous month, first day of current month).
pub fn prior_month_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = month_start(now);
    let (y, m) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    let start = NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| Utc.from_utc_datetime(&d))
        .unwrap_or(end);
    (start, end)
}

pub fn same_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// "July 2025" style label for report subjects and prompts.
pub fn month_label(ts: DateTime<Utc>) -> String {
    ts.format("%B %Y").to_string()
}
