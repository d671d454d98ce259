use crate::model::{month_name, Amount};
use crate::report::{percentage, rule, TOP_CATEGORIES};
use crate::store::MonthlySummaries;
use serde::{Deserialize, Serialize};

/// How healthy a savings rate is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTier {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl HealthTier {
    /// Buckets a savings rate given in percent.
    pub fn from_savings_rate(rate: f64) -> Self {
        if rate > 20.0 {
            HealthTier::Excellent
        } else if rate > 10.0 {
            HealthTier::Good
        } else if rate > 0.0 {
            HealthTier::Fair
        } else {
            HealthTier::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthTier::Excellent => "Sangat Baik ✅",
            HealthTier::Good => "Baik 👍",
            HealthTier::Fair => "Cukup ⚠️",
            HealthTier::NeedsImprovement => "Perlu Perbaikan ❌",
        }
    }
}

pub(super) fn format_annual(year: i32, summaries: &MonthlySummaries) -> String {
    if summaries.for_year(year).next().is_none() {
        return format!("📊 Tidak ada data transaksi untuk tahun {year}.");
    }
    let total = summaries.year_total(year);

    let mut lines = vec![
        format!("📊 *LAPORAN TAHUNAN - {year}*"),
        rule(),
        String::new(),
        "💰 *RINGKASAN TAHUNAN*".to_string(),
        format!("- Total Pemasukan: {}", total.total_income),
        format!("- Total Pengeluaran: {}", total.total_expense),
        format!("- Selisih Bersih: {}", total.net),
        String::new(),
        "📅 *BREAKDOWN BULANAN*".to_string(),
    ];
    for month in 1..=12 {
        let short: String = month_name(month).chars().take(3).collect();
        match summaries.get(year, month) {
            Some(s) => lines.push(format!(
                "- {short}: +{} | -{} | Net: {}",
                s.total_income, s.total_expense, s.net
            )),
            None => lines.push(format!("- {short}: Tidak ada data")),
        }
    }
    lines.push(String::new());

    if !total.categories.is_empty() {
        lines.push(format!("📈 *TOP {TOP_CATEGORIES} KATEGORI PENGELUARAN*"));
        let whole = total.total_expense.as_f64();
        for (ix, (category, amount)) in total.categories.top(TOP_CATEGORIES).iter().enumerate() {
            lines.push(format!(
                "{}. {category}: {amount} ({:.1}%)",
                ix + 1,
                percentage(amount.as_f64(), whole)
            ));
        }
        lines.push(String::new());
    }

    lines.push("🏥 *INDIKATOR KESEHATAN KEUANGAN*".to_string());
    if total.total_income.is_positive() {
        let rate = percentage(total.net.as_f64(), total.total_income.as_f64());
        let tier = HealthTier::from_savings_rate(rate);
        lines.push(format!("- Tingkat Tabungan: {rate:.1}% ({})", tier.label()));
        lines.push(format!(
            "- Rata-rata Pengeluaran/Bulan: {}",
            monthly_average(total.total_expense)
        ));
        lines.push(format!(
            "- Rata-rata Pemasukan/Bulan: {}",
            monthly_average(total.total_income)
        ));
    }

    lines.join("\n").trim_end().to_string()
}

/// The yearly amount spread over twelve months, rounded to whole rupiah.
fn monthly_average(amount: Amount) -> Amount {
    Amount::new(amount.div_whole(12).value().round())
}
