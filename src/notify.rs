// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Outbound notification seam. Delivery itself is an external concern; the
//! core only needs a sink it can hand a typed message to, and a failure it
//! can propagate without stamping any "already notified" state.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::models::MonthlyStats;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "templateType", rename_all = "kebab-case")]
pub enum EmailTemplate {
    BudgetAlert {
        user_name: String,
        account_name: String,
        percentage_used: Decimal,
        budget_amount: Decimal,
        total_expenses: Decimal,
    },
    MonthlyReport {
        user_name: String,
        month: String,
        stats: MonthlyStats,
        insights: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub template: EmailTemplate,
}

pub trait NotificationSink {
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Default sink: logs the message instead of delivering it. Useful for
/// local runs and as the stand-in while no mail provider is wired up.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = serde_json::to_string(&message.template).unwrap_or_default();
        info!(to = %message.to, subject = %message.subject, %payload, "email");
        Ok(())
    }
}
