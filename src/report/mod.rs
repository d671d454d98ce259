//! Monthly and annual reports, rendered as Telegram Markdown text in Indonesian.
//!
//! Rendering never fails: problems reading the spreadsheet become a message for the user.

mod annual;
mod monthly;

pub use annual::HealthTier;

use crate::model::month_name;
use crate::store::{PartitionName, Store};
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info};

/// Number of most recent transactions listed in a monthly report.
pub const RECENT_COUNT: usize = 5;

/// Number of categories listed in the annual ranking.
pub const TOP_CATEGORIES: usize = 5;

const RULE_WIDTH: usize = 40;

/// The period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "snake_case")]
pub enum Period {
    Monthly { year: i32, month: u32 },
    Annual { year: i32 },
}

impl Period {
    pub fn monthly(year: i32, month: u32) -> anyhow::Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("Month must be between 1 and 12, got {month}");
        }
        Ok(Period::Monthly { year, month })
    }

    pub fn annual(year: i32) -> Self {
        Period::Annual { year }
    }

    pub fn year(&self) -> i32 {
        match self {
            Period::Monthly { year, .. } | Period::Annual { year } => *year,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Monthly { year, month } => write!(f, "{} {year}", month_name(*month)),
            Period::Annual { year } => write!(f, "{year}"),
        }
    }
}

/// Renders the report for `period`, reading whatever it needs from `store`.
pub async fn render(store: &mut Store, period: Period) -> String {
    if !store.ensure_connection().await {
        return "❌ Tidak dapat terhubung ke Google Sheets untuk mengambil data laporan.".into();
    }
    info!("Rendering the report for {period}");
    match period {
        Period::Monthly { year, month } => render_monthly(store, year, month).await,
        Period::Annual { year } => {
            let summaries = store.monthly_partitions().await;
            annual::format_annual(year, &summaries)
        }
    }
}

async fn render_monthly(store: &mut Store, year: i32, month: u32) -> String {
    let label = format!("{} {year}", month_name(month));
    let name = match PartitionName::new(year, month) {
        Ok(name) => name,
        Err(_) => return no_monthly_data(&label),
    };
    match store.partition_records(name).await {
        Ok(Some(records)) if !records.is_empty() => {
            monthly::format_monthly(year, month, &name.to_string(), &records)
        }
        Ok(_) => no_monthly_data(&label),
        Err(e) => {
            error!("Unable to render the report for {label}: {e}");
            format!("❌ Gagal membuat laporan bulanan: {e}")
        }
    }
}

fn no_monthly_data(label: &str) -> String {
    format!("📊 Tidak ada data transaksi untuk {label}.")
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// `part / whole` as a percentage, or zero when `whole` is zero.
fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
