//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets (see `Mode::Testing`).
//!
//! State is kept in a process-wide map keyed by spreadsheet id, so a `TestSheet` created by the
//! code under test and one created by the test itself see the same data as long as they use the
//! same id.

use crate::api::{split_a1, Sheet, SheetRange};
use crate::error::Res;
use crate::model::{column_letters, Cell};
use anyhow::{bail, Context};
use std::collections::{BTreeSet, HashMap};
#[cfg(test)]
use std::io::Cursor;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

const DEFAULT_TITLE: &str = "Reefficiency (test)";

/// One tab of the in-memory spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TestTab {
    pub(crate) name: String,
    pub(crate) row_count: u32,
    pub(crate) col_count: u32,
    /// Ragged rows; a missing cell is blank.
    pub(crate) cells: Vec<Vec<String>>,
    /// `(row, col)` of every cell that was entered as a formula.
    pub(crate) formulas: BTreeSet<(u32, u32)>,
}

impl TestTab {
    pub(crate) fn new(name: impl Into<String>, row_count: u32, col_count: u32) -> Self {
        Self {
            name: name.into(),
            row_count,
            col_count,
            cells: Vec::new(),
            formulas: BTreeSet::new(),
        }
    }

    /// Stores `input` the way Sheets treats user-entered input: a leading `'` makes the rest
    /// literal text, a leading `=` makes a formula.
    fn enter(&mut self, row: u32, col: u32, input: &str) {
        match input.strip_prefix('\'') {
            Some(text) => {
                self.formulas.remove(&(row, col));
                self.set(row, col, text);
            }
            None => {
                if input.starts_with('=') {
                    self.formulas.insert((row, col));
                } else {
                    self.formulas.remove(&(row, col));
                }
                self.set(row, col, input);
            }
        }
    }

    fn set(&mut self, row: u32, col: u32, value: &str) {
        let (r, c) = ((row - 1) as usize, (col - 1) as usize);
        if self.cells.len() <= r {
            self.cells.resize(r + 1, Vec::new());
        }
        let line = &mut self.cells[r];
        if line.len() <= c {
            line.resize(c + 1, String::new());
        }
        line[c] = value.to_string();
    }

    fn value(&self, row: u32, col: u32) -> &str {
        self.cells
            .get((row - 1) as usize)
            .and_then(|line| line.get((col - 1) as usize))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// The 1-based index of the last row holding any non-blank cell, or 0.
    fn last_used_row(&self) -> u32 {
        self.cells
            .iter()
            .rposition(|line| line.iter().any(|v| !v.is_empty()))
            .map(|ix| ix as u32 + 1)
            .unwrap_or(0)
    }
}

/// The full state of one in-memory spreadsheet, including knobs for simulating failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestSheetState {
    pub(crate) title: String,
    pub(crate) tabs: Vec<TestTab>,
    /// When true every call fails as if the network were down.
    pub(crate) offline: bool,
    /// Names of tabs whose reads and writes fail.
    pub(crate) failing: BTreeSet<String>,
}

impl Default for TestSheetState {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            tabs: Vec::new(),
            offline: false,
            failing: BTreeSet::new(),
        }
    }
}

impl TestSheetState {
    pub(crate) fn tab(&self, name: &str) -> Option<&TestTab> {
        self.tabs.iter().find(|t| t.name == name)
    }

    fn tab_mut(&mut self, name: &str) -> Res<&mut TestTab> {
        self.tabs
            .iter_mut()
            .find(|t| t.name == name)
            .with_context(|| format!("Unable to parse range: sheet '{name}' not found"))
    }

    /// Adds a tab pre-filled with `rows`, sized generously.
    #[cfg(test)]
    pub(crate) fn with_tab(mut self, name: &str, rows: Vec<Vec<String>>) -> Self {
        let mut tab = TestTab::new(name, 1000, 26);
        tab.cells = rows;
        self.tabs.push(tab);
        self
    }

    /// The values of tab `name` as the API would return them.
    #[cfg(test)]
    pub(crate) fn values(&self, name: &str) -> Vec<Vec<String>> {
        self.tab(name)
            .map(|t| trim(t.cells.clone()))
            .unwrap_or_default()
    }
}

fn store() -> &'static Mutex<HashMap<String, TestSheetState>> {
    static STORE: OnceLock<Mutex<HashMap<String, TestSheetState>>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// An implementation of the `Sheet` trait that does not use Google sheets.
pub(crate) struct TestSheet {
    id: String,
}

impl TestSheet {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub(crate) fn get_state(&self) -> TestSheetState {
        match store().lock() {
            Ok(map) => map.get(&self.id).cloned().unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().get(&self.id).cloned().unwrap_or_default(),
        }
    }

    pub(crate) fn set_state(&self, state: TestSheetState) {
        match store().lock() {
            Ok(mut map) => map.insert(self.id.clone(), state),
            Err(poisoned) => poisoned.into_inner().insert(self.id.clone(), state),
        };
    }

    /// Runs `f` against the state, failing first if the sheet is offline or `tab` is marked as
    /// failing.
    fn with_state<T>(
        &self,
        tab: Option<&str>,
        f: impl FnOnce(&mut TestSheetState) -> Res<T>,
    ) -> Res<T> {
        let mut state = self.get_state();
        if state.offline {
            bail!("Connection refused: the test spreadsheet '{}' is offline", self.id);
        }
        if let Some(tab) = tab {
            if state.failing.contains(tab) {
                bail!("Simulated failure for sheet '{tab}'");
            }
        }
        let result = f(&mut state)?;
        self.set_state(state);
        Ok(result)
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn title(&mut self) -> Res<String> {
        self.with_state(None, |s| Ok(s.title.clone()))
    }

    async fn sheet_names(&mut self) -> Res<Vec<String>> {
        self.with_state(None, |s| Ok(s.tabs.iter().map(|t| t.name.clone()).collect()))
    }

    async fn add_sheet(&mut self, name: &str, rows: u32, cols: u32) -> Res<()> {
        self.with_state(Some(name), |s| {
            if s.tab(name).is_some() {
                bail!("A sheet with the name \"{name}\" already exists");
            }
            s.tabs.push(TestTab::new(name, rows, cols));
            Ok(())
        })
    }

    async fn get_range(&mut self, range: &str) -> Res<Vec<Vec<String>>> {
        let (name, rest) = split_a1(range)?;
        let bounds = Bounds::parse(rest)?;
        self.with_state(Some(&name), |s| {
            let tab = s
                .tab(&name)
                .with_context(|| format!("Unable to parse range: {range}"))?;
            let last_row = bounds.end_row.unwrap_or(tab.row_count).min(tab.row_count);
            let last_col = bounds.end_col.min(tab.col_count);
            let mut values = Vec::new();
            for row in bounds.start_row..=last_row {
                let line: Vec<String> = (bounds.start_col..=last_col)
                    .map(|col| tab.value(row, col).to_string())
                    .collect();
                values.push(line);
            }
            Ok(trim(values))
        })
    }

    async fn append_rows(&mut self, sheet_name: &str, rows: &[Vec<String>]) -> Res<()> {
        self.with_state(Some(sheet_name), |s| {
            let tab = s.tab_mut(sheet_name)?;
            let mut row = tab.last_used_row();
            for values in rows {
                row += 1;
                for (ix, value) in values.iter().enumerate() {
                    tab.enter(row, ix as u32 + 1, value);
                }
            }
            tab.row_count = tab.row_count.max(row);
            Ok(())
        })
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Res<()> {
        // Check every range up front so that a failing batch writes nothing.
        let mut parsed = Vec::new();
        for sr in data {
            let (name, rest) = split_a1(&sr.range)?;
            let bounds = Bounds::parse(rest)?;
            parsed.push((name, bounds, &sr.values));
        }
        let names: Vec<&str> = parsed.iter().map(|(n, _, _)| n.as_str()).collect();
        let failing = self.get_state().failing;
        if let Some(bad) = names.iter().find(|n| failing.contains(**n)) {
            bail!("Simulated failure for sheet '{bad}'");
        }
        self.with_state(None, |s| {
            for (name, bounds, values) in &parsed {
                let tab = s.tab_mut(name)?;
                for (r, line) in values.iter().enumerate() {
                    for (c, value) in line.iter().enumerate() {
                        let row = bounds.start_row + r as u32;
                        let col = bounds.start_col + c as u32;
                        if row > tab.row_count || col > tab.col_count {
                            bail!(
                                "Range ('{name}'!{}{row}) exceeds grid limits. Max rows: {}, \
                                max columns: {}",
                                column_letters(col),
                                tab.row_count,
                                tab.col_count
                            );
                        }
                        tab.enter(row, col, value);
                    }
                }
            }
            Ok(())
        })
    }
}

/// The rectangle described by the part of an A1 range after the `!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    start_row: u32,
    start_col: u32,
    /// `None` for whole-column ranges such as `A:ZZ`.
    end_row: Option<u32>,
    end_col: u32,
}

impl Bounds {
    fn parse(s: &str) -> Res<Self> {
        let (start, end) = s.split_once(':').unwrap_or((s, s));
        let (start_row, start_col) = parse_endpoint(start)?;
        let (end_row, end_col) = parse_endpoint(end)?;
        Ok(Self {
            start_row: start_row.unwrap_or(1),
            start_col,
            end_row,
            end_col,
        })
    }
}

/// Parses `B7` into `(Some(7), 2)` and `ZZ` into `(None, 702)`.
fn parse_endpoint(s: &str) -> Res<(Option<u32>, u32)> {
    if s.chars().all(|c| c.is_ascii_alphabetic()) && !s.is_empty() {
        let cell = Cell::from_str(&format!("{s}1"))?;
        return Ok((None, cell.col()));
    }
    let cell = Cell::from_str(s)?;
    Ok((Some(cell.row()), cell.col()))
}

/// Removes trailing blank cells from each row and trailing empty rows, as the Sheets API does.
fn trim(mut values: Vec<Vec<String>>) -> Vec<Vec<String>> {
    for line in values.iter_mut() {
        while line.last().is_some_and(|v| v.is_empty()) {
            line.pop();
        }
    }
    while values.last().is_some_and(|line| line.is_empty()) {
        values.pop();
    }
    values
}

/// Loads rows from a CSV-formatted string.
#[cfg(test)]
pub(crate) fn load_csv(csv_data: &str) -> Res<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("Invalid CSV data")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_sheet() -> TestSheet {
        TestSheet::new(Uuid::new_v4().to_string())
    }

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_add_and_list_sheets() {
        let mut sheet = new_sheet();
        sheet.add_sheet("Dashboard", 30, 10).await.unwrap();
        sheet.add_sheet("6/25", 1000, 10).await.unwrap();
        assert_eq!(sheet.sheet_names().await.unwrap(), vec!["Dashboard", "6/25"]);
        assert!(sheet.add_sheet("6/25", 1000, 10).await.is_err());
        assert_eq!(sheet.title().await.unwrap(), DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_append_and_get() {
        let mut sheet = new_sheet();
        sheet.add_sheet("6/25", 1000, 10).await.unwrap();
        assert!(sheet.get("6/25").await.unwrap().is_empty());
        sheet
            .append_rows("6/25", &strings(&[&["Tanggal", "Kategori"]]))
            .await
            .unwrap();
        sheet
            .append_rows("6/25", &strings(&[&["2025-06-10", "food_dining", ""]]))
            .await
            .unwrap();
        let values = sheet.get("6/25").await.unwrap();
        assert_eq!(
            values,
            strings(&[&["Tanggal", "Kategori"], &["2025-06-10", "food_dining"]])
        );
    }

    #[tokio::test]
    async fn test_write_and_read_range() {
        let mut sheet = new_sheet();
        sheet.add_sheet("Dashboard", 30, 10).await.unwrap();
        sheet
            .write_ranges(&[SheetRange::new(
                "Dashboard",
                "B7:D8",
                strings(&[&["1", "2", "3"], &["", "", ""]]),
            )])
            .await
            .unwrap();
        let values = sheet.get_range("'Dashboard'!B7:D18").await.unwrap();
        assert_eq!(values, strings(&[&["1", "2", "3"]]));
        let values = sheet.get_range("'Dashboard'!A6:B7").await.unwrap();
        assert_eq!(values, strings(&[&[], &["", "1"]]));
    }

    #[tokio::test]
    async fn test_write_outside_grid_fails() {
        let mut sheet = new_sheet();
        sheet.add_sheet("Small", 2, 2).await.unwrap();
        let res = sheet
            .write_ranges(&[SheetRange::new("Small", "C1", strings(&[&["x"]]))])
            .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_offline_and_failing() {
        let mut sheet = new_sheet();
        sheet.add_sheet("Bad", 10, 10).await.unwrap();
        let mut state = sheet.get_state();
        state.failing.insert("Bad".to_string());
        sheet.set_state(state);
        assert!(sheet.get("Bad").await.is_err());
        assert!(sheet.sheet_names().await.is_ok());

        let mut state = sheet.get_state();
        state.offline = true;
        sheet.set_state(state);
        assert!(sheet.title().await.is_err());
        assert!(sheet.sheet_names().await.is_err());
    }

    #[test]
    fn test_bounds_parse() {
        let b = Bounds::parse("A:ZZ").unwrap();
        assert_eq!((b.start_row, b.start_col, b.end_row, b.end_col), (1, 1, None, 702));
        let b = Bounds::parse("B3").unwrap();
        assert_eq!((b.start_row, b.start_col, b.end_row, b.end_col), (3, 2, Some(3), 2));
        let b = Bounds::parse("F13:G17").unwrap();
        assert_eq!((b.start_row, b.start_col, b.end_row, b.end_col), (13, 6, Some(17), 7));
    }

    #[test]
    fn test_load_csv() {
        let rows = load_csv("Tanggal,Kategori\n2025-06-10,\"food, drinks\"\n").unwrap();
        assert_eq!(
            rows,
            strings(&[&["Tanggal", "Kategori"], &["2025-06-10", "food, drinks"]])
        );
    }
}
