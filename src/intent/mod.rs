//! Turning free text into a structured intent.
//!
//! The extraction service answers with JSON shaped like
//! `{"intent": "catat", "entities": {...}}`. `Intent::from_json` reads that shape leniently (the
//! model is not always consistent) into a typed `Intent`.

mod gemini;
mod prompt;

pub use gemini::GeminiExtractor;

use crate::model::{Amount, Category, Transaction, TransactionKind};
use crate::report::Period;
use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

/// Maps free text to an `Intent`. Implementations never fail: problems are reported as
/// `Intent::Error`.
#[async_trait::async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, text: &str, today: NaiveDate) -> Intent;
}

/// What the user wants.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// `catat`: record one or more transactions.
    Record(RecordEntities),
    /// `laporan`: show a report.
    Report(ReportEntities),
    /// The request was not understood.
    Unclear,
    /// Extraction itself failed.
    Error { details: String },
}

impl Intent {
    /// Reads the JSON produced by the extraction service.
    pub fn from_json(value: Value) -> Intent {
        match parse(value) {
            Ok(intent) => intent,
            Err(e) => Intent::Error {
                details: format!("{e:#}"),
            },
        }
    }

    /// Strips Markdown code fences and parses the text as JSON.
    pub fn from_reply(reply: &str) -> Intent {
        let cleaned = strip_fences(reply);
        match serde_json::from_str::<Value>(cleaned) {
            Ok(value) => Intent::from_json(value),
            Err(e) => Intent::Error {
                details: format!("JSON parsing error: {e}"),
            },
        }
    }
}

fn parse(value: Value) -> anyhow::Result<Intent> {
    let name = value
        .get("intent")
        .and_then(Value::as_str)
        .context("The reply has no 'intent'")?
        .to_lowercase();
    let entities = value.get("entities").cloned().unwrap_or(Value::Null);
    debug!("Extracted intent '{name}' with entities {entities}");
    let intent = match name.as_str() {
        "catat" => {
            let entities = if entities.get("transactions").is_some() {
                #[derive(Deserialize)]
                struct Multiple {
                    transactions: Vec<TransactionEntity>,
                }
                let multiple: Multiple = serde_json::from_value(entities)
                    .context("Unable to read the transactions")?;
                RecordEntities::Multiple(multiple.transactions)
            } else {
                RecordEntities::Single(
                    serde_json::from_value(entities).context("Unable to read the transaction")?,
                )
            };
            Intent::Record(entities)
        }
        "laporan" => Intent::Report(if entities.is_null() {
            ReportEntities::default()
        } else {
            serde_json::from_value(entities).context("Unable to read the report request")?
        }),
        "unclear" | "tidak_paham" => Intent::Unclear,
        "error" => Intent::Error {
            details: entities
                .get("details")
                .or_else(|| value.get("details"))
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        },
        other => bail!("Unknown intent '{other}'"),
    };
    Ok(intent)
}

/// Removes a surrounding ```json ... ``` fence, if any.
pub(crate) fn strip_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// The transactions of a `catat` intent.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEntities {
    Single(TransactionEntity),
    Multiple(Vec<TransactionEntity>),
}

impl RecordEntities {
    pub fn entities(&self) -> &[TransactionEntity] {
        match self {
            RecordEntities::Single(entity) => std::slice::from_ref(entity),
            RecordEntities::Multiple(entities) => entities,
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, RecordEntities::Multiple(_))
    }
}

/// One transaction as extracted. Every field is optional here; `to_transaction` decides what
/// is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntity {
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de_amount")]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl TransactionEntity {
    /// Builds a transaction. The date defaults to `today` and the category is resolved to the
    /// closest known one.
    pub fn to_transaction(&self, today: NaiveDate) -> anyhow::Result<Transaction> {
        let missing: Vec<&str> = [
            ("transaction_type", self.transaction_type.is_none()),
            ("category", self.category.is_none()),
            ("amount", self.amount.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            bail!("Missing {}", missing.join(", "));
        }

        let kind = TransactionKind::from_str(self.transaction_type.as_deref().unwrap_or_default())?;
        let date = match self.date.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() && d != "null" => crate::model::parse_date(d)?,
            _ => today,
        };
        Ok(Transaction::new(
            date,
            kind,
            Category::resolve(self.category.as_deref().unwrap_or_default()),
            self.amount.unwrap_or_default(),
            self.description.as_deref(),
        ))
    }
}

/// Accepts `150000`, `150000.0`, `"150000"` and `"150.000"`.
fn de_amount<'de, D>(deserializer: D) -> Result<Option<Amount>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }
    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    let amount = match raw {
        None => None,
        Some(Raw::Int(n)) => Some(Amount::from(n)),
        Some(Raw::Float(f)) => {
            let decimal = rust_decimal::Decimal::from_f64_retain(f.trunc())
                .ok_or_else(|| serde::de::Error::custom(format!("Invalid amount {f}")))?;
            Some(Amount::new(decimal.normalize()))
        }
        Some(Raw::Text(s)) => {
            Some(Amount::parse_input(&s).map_err(serde::de::Error::custom)?)
        }
    };
    Ok(amount)
}

/// Whether a report covers a month or a year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    #[default]
    #[serde(alias = "bulanan")]
    Monthly,
    #[serde(alias = "tahunan", alias = "annual")]
    Yearly,
}

/// The entities of a `laporan` intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntities {
    #[serde(default)]
    pub period: ReportKind,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
}

impl ReportEntities {
    /// The requested period, filling in the current year and month.
    pub fn to_period(self, today: NaiveDate) -> anyhow::Result<Period> {
        let year = self.year.unwrap_or(today.year());
        match self.period {
            ReportKind::Monthly => Period::monthly(year, self.month.unwrap_or(today.month())),
            ReportKind::Yearly => Ok(Period::annual(year)),
        }
    }
}
