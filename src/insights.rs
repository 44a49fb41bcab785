// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Generative-model collaborators: monthly insight text and receipt field
//! extraction. Both are injected as traits so the core can run against a
//! fake, and both must tolerate malformed model output.

use anyhow::Result as AnyResult;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::MonthlyStats;

const UA: &str = concat!("moneta/", env!("CARGO_PKG_VERSION"));

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const MODEL: &str = "gemini-1.5-flash";
pub const API_KEY_ENV: &str = "MONETA_GEMINI_API_KEY";

pub trait InsightGenerator {
    fn generate(&self, stats: &MonthlyStats, period: &str) -> Result<Vec<String>>;
}

/// Static insights used whenever generation fails. Generation failure is
/// never fatal to a report.
pub fn fallback_insights() -> Vec<String> {
    vec![
        "Your highest expense category this month might need attention.".to_string(),
        "Consider setting up a budget for better financial management.".to_string(),
        "Track your recurring expenses to identify potential savings.".to_string(),
    ]
}

// Models fence their JSON in ```json blocks more often than not.
static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?\n?").expect("fence regex"));

pub fn strip_code_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").trim().to_string()
}

/// Parse a model response expected to be a JSON array of insight strings.
pub fn parse_insights(text: &str) -> Result<Vec<String>> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str::<Vec<String>>(&cleaned)
        .map_err(|e| Error::External(format!("insight response was not a JSON array: {}", e)))
}

/// Used when no generator is configured; reports always degrade to the
/// fallback lines.
pub struct NoInsights;

impl InsightGenerator for NoInsights {
    fn generate(&self, _stats: &MonthlyStats, _period: &str) -> Result<Vec<String>> {
        Err(Error::External("no insight generator configured".to_string()))
    }
}

pub struct HttpInsightGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl HttpInsightGenerator {
    pub fn new(api_key: impl Into<String>) -> AnyResult<Self> {
        Ok(Self {
            client: reqwest::blocking::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .user_agent(UA)
                .build()?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Built from the environment; None when no API key is configured, in
    /// which case callers should expect fallback insights.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var(API_KEY_ENV).ok()?;
        Self::new(key).ok()
    }

    fn prompt(stats: &MonthlyStats, period: &str) -> String {
        let categories = stats
            .by_category
            .iter()
            .map(|(c, a)| format!("{}: ${}", c, a))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Analyze this financial data and provide 3 concise, actionable insights.\n\
             Focus on spending patterns and practical advice.\n\
             Keep it friendly and conversational.\n\n\
             Financial Data for {}:\n\
             - Total Income: ${}\n\
             - Total Expenses: ${}\n\
             - Net Income: ${}\n\
             - Expense Categories: {}\n\n\
             Format the response as a JSON array of strings, like this:\n\
             [\"insight 1\", \"insight 2\", \"insight 3\"]",
            period,
            stats.total_income,
            stats.total_expenses,
            stats.net(),
            categories,
        )
    }
}

impl InsightGenerator for HttpInsightGenerator {
    fn generate(&self, stats: &MonthlyStats, period: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, MODEL, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": Self::prompt(stats, period) }] }]
        });
        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::External(format!("insight request failed: {}", e)))?;
        let v: serde_json::Value = resp
            .json()
            .map_err(|e| Error::External(format!("insight response unreadable: {}", e)))?;
        let text = v["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| Error::External("insight response had no text part".to_string()))?;
        parse_insights(text)
    }
}

/// Structured fields pulled out of a receipt image by the extraction
/// service. Consumed by the transaction-creation surface, not the core.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptFields {
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub description: String,
    pub merchant_name: String,
    pub category: String,
}

pub trait ReceiptExtractor {
    /// Ok(None) means the image was readable but is not a receipt.
    fn extract(&self, image: &[u8], mime: &str) -> Result<Option<ReceiptFields>>;
}

/// Parse the extraction service's response: a JSON object of receipt
/// fields, or an empty object when the image is not a receipt.
pub fn parse_receipt_response(text: &str) -> Result<Option<ReceiptFields>> {
    let cleaned = strip_code_fences(text);
    let v: serde_json::Value = serde_json::from_str(&cleaned)
        .map_err(|e| Error::External(format!("receipt response was not JSON: {}", e)))?;
    if v.as_object().map(|o| o.is_empty()).unwrap_or(false) {
        return Ok(None);
    }
    serde_json::from_value(v)
        .map(Some)
        .map_err(|e| Error::External(format!("receipt response missing fields: {}", e)))
}
