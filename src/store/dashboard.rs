//! The fixed layout of the `Dashboard` sheet and the ranges written on each recompute.
//!
//! ```text
//!     A          B           C             D         E  F                        G
//!  1  REEFFICIENCY DASHBOARD
//!  3  Tahun      2025
//!  4  Bulan      Juni
//!  6  Bulan      Pemasukan   Pengeluaran   Selisih
//!  7  Januari    ...         ...           ...          Total Pemasukan          ...
//!  8  Februari                                          Total Pengeluaran        ...
//!  9  Maret                                             Selisih Bersih           ...
//! 12                                                    Top 5 Kategori (Tahun)   Total
//! 13..17                                                category                 amount
//! 18 Desember
//! 20                                                    Top 5 Kategori (Bulan)   Total
//! 21..25                                                category                 amount
//! ```
//!
//! Only `B3` and `B4` are inputs. Everything below row 6 is derived and overwritten in full.

use crate::api::{literal, SheetRange};
use crate::model::{month_name, parse_month, Amount, Cell};
use crate::store::{CategoryTotals, MonthlySummaries};
use serde::{Deserialize, Serialize};

pub const DASHBOARD: &str = "Dashboard";
pub(crate) const DASHBOARD_ROWS: u32 = 30;
pub(crate) const DASHBOARD_COLS: u32 = 10;

const TITLE: &str = "REEFFICIENCY DASHBOARD";
pub(crate) const TOP_N: usize = 5;

const TITLE_CELL: Cell = Cell::new(1, 1);
const YEAR_LABEL: Cell = Cell::new(3, 1);
pub(crate) const YEAR_CELL: Cell = Cell::new(3, 2);
const MONTH_LABEL: Cell = Cell::new(4, 1);
pub(crate) const MONTH_CELL: Cell = Cell::new(4, 2);
const TABLE_HEADER: Cell = Cell::new(6, 1);
const TABLE_LABELS: Cell = Cell::new(7, 1);
const TABLE_VALUES: Cell = Cell::new(7, 2);
const TOTAL_LABELS: Cell = Cell::new(7, 6);
const TOTAL_VALUES: Cell = Cell::new(7, 7);
const ANNUAL_TOP_HEADER: Cell = Cell::new(12, 6);
const ANNUAL_TOP: Cell = Cell::new(13, 6);
const MONTHLY_TOP_HEADER: Cell = Cell::new(20, 6);
const MONTHLY_TOP: Cell = Cell::new(21, 6);

/// The four independent parts of a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardStep {
    MonthlyTable,
    AnnualTotals,
    AnnualTopCategories,
    MonthlyTopCategories,
}

serde_plain::derive_display_from_serialize!(DashboardStep);

impl DashboardStep {
    pub const ALL: [DashboardStep; 4] = [
        DashboardStep::MonthlyTable,
        DashboardStep::AnnualTotals,
        DashboardStep::AnnualTopCategories,
        DashboardStep::MonthlyTopCategories,
    ];
}

/// The selector values a recompute runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub year: i32,
    /// `None` when the month cell is blank or not a month name.
    pub month: Option<u32>,
}

impl Selection {
    /// Interprets the raw contents of the year and month selector cells. A blank or
    /// non-numeric year falls back to `current_year`.
    pub fn from_cells(year: &str, month: &str, current_year: i32) -> Self {
        let year = year
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|y| (1900..=2100).contains(y))
            .unwrap_or(current_year);
        Self {
            year,
            month: parse_month(month),
        }
    }
}

/// The static layout written once when the dashboard is created.
pub(crate) fn layout(year: i32, month: u32) -> Vec<SheetRange> {
    let months: Vec<Vec<String>> = (1..=12).map(|m| vec![month_name(m).to_string()]).collect();
    vec![
        SheetRange::new(DASHBOARD, &TITLE_CELL.to_string(), row(&[TITLE])),
        SheetRange::new(
            DASHBOARD,
            &YEAR_LABEL.to(MONTH_CELL),
            vec![
                vec!["Tahun".to_string(), year.to_string()],
                vec!["Bulan".to_string(), month_name(month).to_string()],
            ],
        ),
        SheetRange::new(
            DASHBOARD,
            &TABLE_HEADER.to(TABLE_HEADER.offset(0, 3)),
            row(&["Bulan", "Pemasukan", "Pengeluaran", "Selisih"]),
        ),
        SheetRange::new(DASHBOARD, &TABLE_LABELS.to(TABLE_LABELS.offset(11, 0)), months),
        SheetRange::new(
            DASHBOARD,
            &TOTAL_LABELS.to(TOTAL_LABELS.offset(2, 0)),
            vec![
                vec!["Total Pemasukan".to_string()],
                vec!["Total Pengeluaran".to_string()],
                vec!["Selisih Bersih".to_string()],
            ],
        ),
        SheetRange::new(
            DASHBOARD,
            &ANNUAL_TOP_HEADER.to(ANNUAL_TOP_HEADER.offset(0, 1)),
            row(&["Top 5 Kategori (Tahun)", "Total"]),
        ),
        SheetRange::new(
            DASHBOARD,
            &MONTHLY_TOP_HEADER.to(MONTHLY_TOP_HEADER.offset(0, 1)),
            row(&["Top 5 Kategori (Bulan)", "Total"]),
        ),
    ]
}

/// The A1 range holding both selectors, `B3:B4`.
pub(crate) fn selector_range() -> String {
    YEAR_CELL.to(MONTH_CELL)
}

/// Writes new selector values. A `None` month blanks the month selector.
pub(crate) fn selectors(year: i32, month: Option<u32>) -> SheetRange {
    let month = month.map(month_name).unwrap_or_default();
    SheetRange::new(
        DASHBOARD,
        &selector_range(),
        vec![vec![year.to_string()], vec![month.to_string()]],
    )
}

/// Income, expense and net for each month of `year`; blank rows for months without a sheet.
pub(crate) fn monthly_table(summaries: &MonthlySummaries, year: i32) -> SheetRange {
    let values = (1..=12)
        .map(|month| match summaries.get(year, month) {
            Some(s) => vec![
                s.total_income.plain(),
                s.total_expense.plain(),
                s.net.plain(),
            ],
            None => vec![String::new(); 3],
        })
        .collect();
    SheetRange::new(
        DASHBOARD,
        &TABLE_VALUES.to(TABLE_VALUES.offset(11, 2)),
        values,
    )
}

/// Total income, expense and net over the sheets of `year`.
pub(crate) fn annual_totals(summaries: &MonthlySummaries, year: i32) -> SheetRange {
    let total = summaries.year_total(year);
    SheetRange::new(
        DASHBOARD,
        &TOTAL_VALUES.to(TOTAL_VALUES.offset(2, 0)),
        vec![
            vec![total.total_income.plain()],
            vec![total.total_expense.plain()],
            vec![total.net.plain()],
        ],
    )
}

/// The top expense categories of `year`.
pub(crate) fn annual_top(summaries: &MonthlySummaries, year: i32) -> SheetRange {
    top_range(ANNUAL_TOP, Some(&summaries.year_total(year).categories))
}

/// The top expense categories of the selected month, or a blank table when no valid month is
/// selected or that month has no sheet.
pub(crate) fn monthly_top(summaries: &MonthlySummaries, selection: Selection) -> SheetRange {
    let categories = selection
        .month
        .and_then(|month| summaries.get(selection.year, month))
        .map(|s| &s.categories);
    top_range(MONTHLY_TOP, categories)
}

fn top_range(start: Cell, categories: Option<&CategoryTotals>) -> SheetRange {
    let mut values: Vec<Vec<String>> = categories
        .map(|c| c.top(TOP_N))
        .unwrap_or_default()
        .into_iter()
        .map(|(category, amount): (String, Amount)| vec![literal(&category), amount.plain()])
        .collect();
    values.resize(TOP_N, vec![String::new(); 2]);
    SheetRange::new(
        DASHBOARD,
        &start.to(start.offset(TOP_N as u32 - 1, 1)),
        values,
    )
}

fn row(values: &[&str]) -> Vec<Vec<String>> {
    vec![values.iter().map(|v| v.to_string()).collect()]
}
