//! Aggregation over the rows of monthly sheets.

use crate::model::{Amount, Column, Records};
use crate::store::PartitionName;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Expense totals per category, kept in the order the categories were first seen.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals(Vec<(String, Amount)>);

impl CategoryTotals {
    pub fn add(&mut self, category: &str, amount: Amount) {
        match self.0.iter_mut().find(|(c, _)| c == category) {
            Some((_, total)) => *total += amount,
            None => self.0.push((category.to_string(), amount)),
        }
    }

    /// Adds every entry of `other`, preserving first-seen order.
    pub fn merge(&mut self, other: &CategoryTotals) {
        for (category, amount) in other.iter() {
            self.add(category, amount);
        }
    }

    pub fn get(&self, category: &str) -> Option<Amount> {
        self.0.iter().find(|(c, _)| c == category).map(|(_, a)| *a)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> {
        self.0.iter().map(|(c, a)| (c.as_str(), *a))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All entries, largest first. Equal totals keep the order in which they were first seen.
    pub fn sorted(&self) -> Vec<(String, Amount)> {
        let mut sorted = self.0.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    /// The `n` largest entries, see `sorted`.
    pub fn top(&self, n: usize) -> Vec<(String, Amount)> {
        let mut sorted = self.sorted();
        sorted.truncate(n);
        sorted
    }
}

impl<'a> FromIterator<(&'a str, Amount)> for CategoryTotals {
    fn from_iter<T: IntoIterator<Item = (&'a str, Amount)>>(iter: T) -> Self {
        let mut totals = CategoryTotals::default();
        for (category, amount) in iter {
            totals.add(category, amount);
        }
        totals
    }
}

/// The totals of one monthly sheet.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub total_income: Amount,
    pub total_expense: Amount,
    pub net: Amount,
    /// Expense totals only; income is not broken down by category.
    pub categories: CategoryTotals,
}

impl SheetSummary {
    /// Sums the income and expense columns of `records`. Cells that are not numbers count as
    /// zero and are logged.
    pub fn from_records(sheet_name: &str, records: &Records) -> Self {
        let mut summary = SheetSummary::default();
        for (ix, record) in records.data().iter().enumerate() {
            // Header is row 1.
            let row = ix + 2;
            let income = parse_cell(sheet_name, row, record.get(Column::Income.header()));
            let expense = parse_cell(sheet_name, row, record.get(Column::Expense.header()));
            accumulate(&mut summary.total_income, income, sheet_name, row);
            accumulate(&mut summary.total_expense, expense, sheet_name, row);
            if !expense.is_zero() {
                let category = record.get(Column::Category.header()).trim();
                summary.categories.add(category, expense);
            }
        }
        summary.net = summary.total_income - summary.total_expense;
        summary
    }

    /// Whether the sheet holds any money movement at all.
    pub fn has_data(&self) -> bool {
        !self.total_income.is_zero() || !self.total_expense.is_zero()
    }
}

fn parse_cell(sheet_name: &str, row: usize, value: &str) -> Amount {
    match Amount::from_str(value) {
        Ok(amount) => amount,
        Err(e) => {
            warn!("Treating an unreadable amount in '{sheet_name}' row {row} as zero: {e}");
            Amount::ZERO
        }
    }
}

/// Adds `value` to `total`, skipping the cell if the sum would overflow.
fn accumulate(total: &mut Amount, value: Amount, sheet_name: &str, row: usize) {
    match total.checked_add(value) {
        Some(sum) => *total = sum,
        None => warn!("Skipping an amount in '{sheet_name}' row {row}: the total overflowed"),
    }
}

/// A monthly sheet found in the spreadsheet together with its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub name: PartitionName,
    pub summary: SheetSummary,
}

impl MonthlySummary {
    pub fn year(&self) -> i32 {
        self.name.year()
    }

    pub fn month(&self) -> u32 {
        self.name.month()
    }
}

/// All monthly sheets in chronological order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummaries(Vec<MonthlySummary>);

impl MonthlySummaries {
    pub fn new(mut summaries: Vec<MonthlySummary>) -> Self {
        summaries.sort_by_key(|m| m.name);
        Self(summaries)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonthlySummary> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, year: i32, month: u32) -> Option<&SheetSummary> {
        self.0
            .iter()
            .find(|m| m.year() == year && m.month() == month)
            .map(|m| &m.summary)
    }

    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &MonthlySummary> {
        self.0.iter().filter(move |m| m.year() == year)
    }

    /// Income, expense and category totals over every sheet of `year`.
    pub fn year_total(&self, year: i32) -> SheetSummary {
        let mut total = SheetSummary::default();
        for m in self.for_year(year) {
            total.total_income += m.summary.total_income;
            total.total_expense += m.summary.total_expense;
            total.categories.merge(&m.summary.categories);
        }
        total.net = total.total_income - total.total_expense;
        total
    }
}
