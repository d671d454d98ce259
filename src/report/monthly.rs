use crate::model::{month_name, Amount, Column, Record, Records, NO_DESCRIPTION};
use crate::report::{percentage, rule, RECENT_COUNT};
use crate::store::SheetSummary;
use std::str::FromStr;

pub(super) fn format_monthly(year: i32, month: u32, sheet_name: &str, records: &Records) -> String {
    let summary = SheetSummary::from_records(sheet_name, records);
    let mut lines = vec![
        format!(
            "📊 *LAPORAN BULANAN - {} {year}*",
            month_name(month).to_uppercase()
        ),
        rule(),
        String::new(),
        "💰 *RINGKASAN KEUANGAN*".to_string(),
        format!("- Total Pemasukan: {}", summary.total_income),
        format!("- Total Pengeluaran: {}", summary.total_expense),
        format!("- Selisih Bersih: {}", summary.net),
        String::new(),
    ];

    if !summary.categories.is_empty() {
        lines.push("📈 *PENGELUARAN PER KATEGORI*".to_string());
        let total = summary.total_expense.as_f64();
        for (category, amount) in summary.categories.sorted() {
            lines.push(format!(
                "- {category}: {amount} ({:.1}%)",
                percentage(amount.as_f64(), total)
            ));
        }
        lines.push(String::new());
    }

    let recent: Vec<&Record> = records
        .data()
        .iter()
        .filter(|r| !r.is_blank())
        .rev()
        .take(RECENT_COUNT)
        .collect();
    if !recent.is_empty() {
        lines.push(format!("📝 *{RECENT_COUNT} TRANSAKSI TERAKHIR*"));
        lines.extend(recent.into_iter().map(recent_line));
    }

    lines.join("\n").trim_end().to_string()
}

/// `- 2025-06-10 | food_dining | -Rp 25,000 | makan siang`
fn recent_line(record: &Record) -> String {
    let amount = |column: Column| {
        Amount::from_str(record.get(column.header()))
            .ok()
            .filter(|a| !a.is_zero())
    };
    let mut line = format!(
        "- {} | {}",
        record.get(Column::Date.header()),
        record.get(Column::Category.header())
    );
    if let Some(income) = amount(Column::Income) {
        line.push_str(&format!(" | +{income}"));
    } else if let Some(expense) = amount(Column::Expense) {
        line.push_str(&format!(" | -{expense}"));
    }
    let description = record.get(Column::Description.header()).trim();
    if !description.is_empty() && description != NO_DESCRIPTION {
        line.push_str(&format!(" | {description}"));
    }
    line
}
