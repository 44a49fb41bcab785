// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Current,
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Current => "CURRENT",
            AccountType::Savings => "SAVINGS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CURRENT" => Some(AccountType::Current),
            "SAVINGS" => Some(AccountType::Savings),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub kind: AccountType,
    pub balance: Decimal,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    Income,
    Expense,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Income => "INCOME",
            TxType::Expense => "EXPENSE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INCOME" => Some(TxType::Income),
            "EXPENSE" => Some(TxType::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Completed,
    Pending,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Completed => "COMPLETED",
            TxStatus::Pending => "PENDING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "COMPLETED" => Some(TxStatus::Completed),
            "PENDING" => Some(TxStatus::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurringInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringInterval::Daily => "DAILY",
            RecurringInterval::Weekly => "WEEKLY",
            RecurringInterval::Monthly => "MONTHLY",
            RecurringInterval::Yearly => "YEARLY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DAILY" => Some(RecurringInterval::Daily),
            "WEEKLY" => Some(RecurringInterval::Weekly),
            "MONTHLY" => Some(RecurringInterval::Monthly),
            "YEARLY" => Some(RecurringInterval::Yearly),
            _ => None,
        }
    }
}

/// A transaction either happens once or carries its own schedule. The
/// interval only exists on a scheduled transaction, so "recurring with no
/// interval" is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schedule", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    OneTime,
    Recurring {
        interval: RecurringInterval,
        next_due: DateTime<Utc>,
        last_processed: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub kind: TxType,
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub status: TxStatus,
    pub recurrence: Recurrence,
}

impl Transaction {
    /// Contribution to the owning account's balance: +amount for income,
    /// -amount for expense.
    pub fn signed_effect(&self) -> Decimal {
        signed_effect(self.kind, self.amount)
    }
}

pub fn signed_effect(kind: TxType, amount: Decimal) -> Decimal {
    match kind {
        TxType::Income => amount,
        TxType::Expense => -amount,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub last_alert_sent: Option<DateTime<Utc>>,
}

/// Aggregated activity for one user over one calendar month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub by_category: BTreeMap<String, Decimal>,
    pub transaction_count: usize,
}

impl MonthlyStats {
    pub fn net(&self) -> Decimal {
        self.total_income - self.total_expenses
    }
}
