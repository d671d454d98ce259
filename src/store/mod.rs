//! The spreadsheet store.
//!
//! Transactions live in one sheet per month (see `PartitionName`), each starting with the header
//! row `Tanggal, Kategori, Deskripsi, Pemasukan, Pengeluaran`. Rows are only ever appended. The
//! `Dashboard` sheet is derived from the monthly sheets and is recomputed in full after every
//! successful write, so it is fresh as of the last write. A failure between a write and its
//! recompute leaves the dashboard stale until the next write.
//!
//! Nothing is cached: every summary or recompute reads the monthly sheets again.
//!
//! The store assumes a single writer. It does not lock the spreadsheet, and two processes writing
//! at the same time race on the dashboard. Within one process the bot wraps the store in a
//! `tokio::sync::Mutex`, which serializes calls.

mod dashboard;
mod partition;
mod summary;

pub use dashboard::{DashboardStep, Selection, DASHBOARD};
pub use partition::PartitionName;
pub use summary::{CategoryTotals, MonthlySummaries, MonthlySummary, SheetSummary};

use crate::api::{self, a1, literal, Sheet};
use crate::error::{IntoResult, Res};
use crate::model::{date_only, Column, Mapping, Record, Records, Transaction};
use crate::{Config, Error, ErrorType, Mode, Result};
use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error, info, warn};

/// Initial grid size of a new monthly sheet. Appends grow it as needed.
pub(crate) const PARTITION_ROWS: u32 = 1000;
pub(crate) const PARTITION_COLS: u32 = 10;

/// The spreadsheet store. Construct it once and hand it to whoever needs it.
pub struct Store {
    config: Config,
    mode: Mode,
    sheet: Option<Box<dyn Sheet>>,
}

/// What a recompute did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStatus {
    pub selection: Selection,
    pub failures: Vec<StepFailure>,
}

impl DashboardStatus {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A recompute step that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: DashboardStep,
    pub message: String,
}

/// The outcome of appending one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recorded {
    pub partition: PartitionName,
    pub dashboard: DashboardStatus,
}

/// The outcome of appending several rows with a single recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecorded {
    /// The partition of each row that was written, in input order.
    pub written: Vec<PartitionName>,
    /// The input index and error message of each row that was not written.
    pub failures: Vec<(usize, String)>,
    /// `None` when nothing was written and so nothing was recomputed.
    pub dashboard: Option<DashboardStatus>,
}

impl Store {
    /// Creates a store. No connection is made until `init` or the first operation.
    pub fn new(config: Config, mode: Mode) -> Self {
        Self {
            config,
            mode,
            sheet: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens the spreadsheet and makes sure the dashboard exists, creating it with its full
    /// layout if it does not.
    pub async fn init(&mut self) -> Result<()> {
        let mut sheet = api::sheet(&self.config, self.mode)
            .await
            .pub_result(ErrorType::Connection)?;
        let title = sheet.title().await.pub_result(ErrorType::Connection)?;
        info!("Connected to spreadsheet '{title}'");
        ensure_dashboard(sheet.as_mut(), today())
            .await
            .pub_result(ErrorType::Sheet)?;
        self.sheet = Some(sheet);
        Ok(())
    }

    /// Connects if not yet connected. Returns whether a usable connection exists.
    pub async fn ensure_connection(&mut self) -> bool {
        if self.sheet.is_some() {
            return true;
        }
        match self.init().await {
            Ok(()) => true,
            Err(e) => {
                error!("Unable to connect to the spreadsheet: {e}");
                false
            }
        }
    }

    async fn connected(&mut self) -> Result<&mut dyn Sheet> {
        if !self.ensure_connection().await {
            return Err(Error::msg(
                ErrorType::Connection,
                "Not connected to the spreadsheet",
            ));
        }
        match self.sheet.as_mut() {
            Some(sheet) => Ok(sheet.as_mut()),
            None => Err(Error::msg(
                ErrorType::Connection,
                "Not connected to the spreadsheet",
            )),
        }
    }

    /// The title of the spreadsheet.
    pub async fn title(&mut self) -> Result<String> {
        let sheet = self.connected().await?;
        sheet.title().await.pub_result(ErrorType::Sheet)
    }

    /// The names of all monthly sheets, in chronological order.
    pub async fn partition_names(&mut self) -> Result<Vec<PartitionName>> {
        let sheet = self.connected().await?;
        let names = sheet.sheet_names().await.pub_result(ErrorType::Sheet)?;
        let mut partitions: Vec<PartitionName> = names
            .iter()
            .filter_map(|n| PartitionName::from_str(n).ok())
            .collect();
        partitions.sort();
        Ok(partitions)
    }

    /// Returns the monthly sheet `name`, creating it with its header row if it does not exist.
    /// Returns true if the sheet was created.
    pub async fn get_or_create_partition(&mut self, name: PartitionName) -> Result<bool> {
        let sheet = self.connected().await?;
        ensure_partition(sheet, name)
            .await
            .pub_result(ErrorType::Sheet)
    }

    /// Validates and appends a transaction, then recomputes the dashboard.
    pub async fn add_transaction(&mut self, transaction: &Transaction) -> Result<Recorded> {
        transaction
            .validate()
            .pub_result(ErrorType::Validation)?;
        self.add_row(transaction.to_record()).await
    }

    /// Appends a row keyed by header name to the monthly sheet of its `Tanggal` value, then
    /// recomputes the dashboard. Keys that match no header are ignored.
    pub async fn add_row(&mut self, record: Record) -> Result<Recorded> {
        let (partition, record) = route(record).pub_result(ErrorType::Validation)?;
        let sheet = self.connected().await?;
        append(sheet, partition, &record)
            .await
            .pub_result(ErrorType::Sheet)?;
        let dashboard = recompute(sheet, today()).await;
        Ok(Recorded {
            partition,
            dashboard,
        })
    }

    /// Validates and appends several transactions, recomputing the dashboard once if at least
    /// one was written. A row that fails does not stop the others.
    pub async fn add_transactions(&mut self, transactions: &[Transaction]) -> Result<BatchRecorded> {
        let sheet = self.connected().await?;
        let mut outcome = BatchRecorded::default();
        for (ix, transaction) in transactions.iter().enumerate() {
            let routed = transaction
                .validate()
                .and_then(|()| route(transaction.to_record()));
            let result = match routed {
                Ok((partition, record)) => append(sheet, partition, &record)
                    .await
                    .map(|()| partition),
                Err(e) => Err(e),
            };
            match result {
                Ok(partition) => outcome.written.push(partition),
                Err(e) => {
                    warn!("Transaction {} of the batch was not recorded: {e:#}", ix + 1);
                    outcome.failures.push((ix, format!("{e:#}")));
                }
            }
        }
        if !outcome.written.is_empty() {
            outcome.dashboard = Some(recompute(sheet, today()).await);
        }
        Ok(outcome)
    }

    /// The totals of monthly sheet `name`. Zero if the sheet is missing or unreadable.
    pub async fn sheet_summary(&mut self, name: PartitionName) -> SheetSummary {
        let Ok(sheet) = self.connected().await else {
            return SheetSummary::default();
        };
        match read_records(sheet, &name.to_string()).await {
            Ok(Some(records)) => SheetSummary::from_records(&name.to_string(), &records),
            Ok(None) => SheetSummary::default(),
            Err(e) => {
                warn!("Unable to summarize '{name}': {e:#}");
                SheetSummary::default()
            }
        }
    }

    /// Every monthly sheet with its totals. Sheets whose names are not `month/yy`, or which
    /// cannot be read, are skipped. Empty if the spreadsheet cannot be reached.
    pub async fn monthly_partitions(&mut self) -> MonthlySummaries {
        match self.connected().await {
            Ok(sheet) => discover(sheet).await,
            Err(e) => {
                warn!("Unable to list monthly sheets: {e}");
                MonthlySummaries::default()
            }
        }
    }

    /// The rows of monthly sheet `name`, or `None` if there is no such sheet.
    pub async fn partition_records(&mut self, name: PartitionName) -> Result<Option<Records>> {
        let sheet = self.connected().await?;
        read_records(sheet, &name.to_string())
            .await
            .pub_result(ErrorType::Sheet)
    }

    /// Regenerates every derived cell of the dashboard from the monthly sheets.
    pub async fn update_dashboard(&mut self) -> Result<DashboardStatus> {
        let sheet = self.connected().await?;
        Ok(recompute(sheet, today()).await)
    }

    /// Points the dashboard at `year` (and optionally a month), then recomputes it.
    pub async fn select_dashboard_period(
        &mut self,
        year: i32,
        month: Option<u32>,
    ) -> Result<DashboardStatus> {
        let sheet = self.connected().await?;
        sheet
            .write_ranges(&[dashboard::selectors(year, month)])
            .await
            .context("Unable to write the dashboard selectors")
            .pub_result(ErrorType::Sheet)?;
        Ok(recompute(sheet, today()).await)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Finds the partition of a row and normalizes its date to the date-only form.
fn route(mut record: Record) -> Res<(PartitionName, Record)> {
    let date = date_only(record.get(Column::Date.header())).to_string();
    let partition = PartitionName::from_date_str(&date)
        .context("Unable to determine the monthly sheet for the transaction")?;
    record.insert(Column::Date.header(), date);
    Ok((partition, record))
}

async fn ensure_dashboard(sheet: &mut dyn Sheet, today: NaiveDate) -> Res<()> {
    let names = sheet.sheet_names().await?;
    if names.iter().any(|n| n == DASHBOARD) {
        debug!("The dashboard already exists");
        return Ok(());
    }
    info!("Creating the dashboard");
    sheet
        .add_sheet(
            DASHBOARD,
            dashboard::DASHBOARD_ROWS,
            dashboard::DASHBOARD_COLS,
        )
        .await?;
    sheet
        .write_ranges(&dashboard::layout(today.year(), today.month()))
        .await
        .context("Unable to write the dashboard layout")
}

async fn ensure_partition(sheet: &mut dyn Sheet, name: PartitionName) -> Res<bool> {
    let name = name.to_string();
    let names = sheet.sheet_names().await?;
    if names.iter().any(|n| *n == name) {
        return Ok(false);
    }
    info!("Creating monthly sheet '{name}'");
    sheet
        .add_sheet(&name, PARTITION_ROWS, PARTITION_COLS)
        .await?;
    sheet
        .append_rows(&name, &[Column::headers()])
        .await
        .with_context(|| format!("Unable to write the header row of '{name}'"))?;
    Ok(true)
}

async fn append(sheet: &mut dyn Sheet, partition: PartitionName, record: &Record) -> Res<()> {
    ensure_partition(sheet, partition).await?;
    let name = partition.to_string();
    let header = sheet
        .get_range(&a1(&name, "A1:ZZ1"))
        .await
        .with_context(|| format!("Unable to read the header row of '{name}'"))?
        .into_iter()
        .next()
        .unwrap_or_default();
    let mapping = if header.iter().all(|h| h.trim().is_empty()) {
        warn!("Monthly sheet '{name}' has no header row, writing it again");
        sheet.append_rows(&name, &[Column::headers()]).await?;
        Mapping::new(Column::headers())?
    } else {
        Mapping::new(header)?
    };
    // Free text must not be read as a formula, number or date; the amounts stay numeric.
    let fields: Vec<(&str, String)> = record
        .iter()
        .map(|(header, value)| {
            let amount = header == Column::Income.header() || header == Column::Expense.header();
            (header, if amount { value.to_string() } else { literal(value) })
        })
        .collect();
    let row = mapping.place(fields.iter().map(|(h, v)| (*h, v.as_str())));
    sheet
        .append_rows(&name, &[row])
        .await
        .with_context(|| format!("Unable to append to '{name}'"))?;
    info!("Recorded a transaction in '{name}'");
    Ok(())
}

async fn read_records(sheet: &mut dyn Sheet, name: &str) -> Res<Option<Records>> {
    let names = sheet.sheet_names().await?;
    if !names.iter().any(|n| n == name) {
        return Ok(None);
    }
    let values = sheet.get(name).await?;
    if values.is_empty() {
        return Ok(Some(Records::default()));
    }
    Ok(Some(Records::parse(values)?))
}

async fn discover(sheet: &mut dyn Sheet) -> MonthlySummaries {
    let names = match sheet.sheet_names().await {
        Ok(names) => names,
        Err(e) => {
            warn!("Unable to list sheets: {e:#}");
            return MonthlySummaries::default();
        }
    };
    let mut found = Vec::new();
    for name in names {
        let partition = match PartitionName::from_str(&name) {
            Ok(p) => p,
            Err(e) if name == DASHBOARD => {
                debug!("{e:#}");
                continue;
            }
            Err(e) => {
                warn!("Skipping sheet: {e:#}");
                continue;
            }
        };
        let values = match sheet.get(&name).await {
            Ok(values) => values,
            Err(e) => {
                warn!("Skipping unreadable sheet '{name}': {e:#}");
                continue;
            }
        };
        let summary = if values.is_empty() {
            SheetSummary::default()
        } else {
            match Records::parse(values) {
                Ok(records) => SheetSummary::from_records(&name, &records),
                Err(e) => {
                    warn!("Skipping sheet '{name}': {e:#}");
                    continue;
                }
            }
        };
        found.push(MonthlySummary {
            name: partition,
            summary,
        });
    }
    MonthlySummaries::new(found)
}

/// Reads the selectors and writes the four derived regions of the dashboard. Each region is
/// written separately so that one failure does not prevent the others.
async fn recompute(sheet: &mut dyn Sheet, today: NaiveDate) -> DashboardStatus {
    let selector_cells = match sheet
        .get_range(&a1(DASHBOARD, &dashboard::selector_range()))
        .await
    {
        Ok(values) => values,
        Err(e) => {
            warn!("Unable to read the dashboard selectors, using defaults: {e:#}");
            Vec::new()
        }
    };
    let cell = |row: usize| {
        selector_cells
            .get(row)
            .and_then(|r| r.first())
            .map(String::as_str)
            .unwrap_or("")
    };
    let selection = Selection::from_cells(cell(0), cell(1), today.year());
    debug!(
        "Recomputing the dashboard for {} (month {:?})",
        selection.year, selection.month
    );

    let summaries = discover(sheet).await;
    let mut failures = Vec::new();
    for step in DashboardStep::ALL {
        let range = match step {
            DashboardStep::MonthlyTable => dashboard::monthly_table(&summaries, selection.year),
            DashboardStep::AnnualTotals => dashboard::annual_totals(&summaries, selection.year),
            DashboardStep::AnnualTopCategories => {
                dashboard::annual_top(&summaries, selection.year)
            }
            DashboardStep::MonthlyTopCategories => dashboard::monthly_top(&summaries, selection),
        };
        if let Err(e) = sheet.write_ranges(&[range]).await {
            error!("Dashboard step {step} failed: {e:#}");
            failures.push(StepFailure {
                step,
                message: format!("{e:#}"),
            });
        }
    }
    if failures.is_empty() {
        info!("Dashboard updated for {}", selection.year);
    }
    DashboardStatus {
        selection,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheetState;
    use crate::model::{Amount, Category, TransactionKind};
    use crate::test::TestEnv;

    fn tx(date: &str, kind: TransactionKind, category: Category, amount: i64) -> Transaction {
        Transaction::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            kind,
            category,
            Amount::from(amount),
            None,
        )
    }

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    async fn store(env: &TestEnv) -> Store {
        let mut store = Store::new(env.config(), Mode::Testing);
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_init_creates_dashboard_once() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let state = env.get_state();
        let tab = state.tab(DASHBOARD).unwrap();
        assert_eq!((tab.row_count, tab.col_count), (30, 10));
        let values = state.values(DASHBOARD);
        assert_eq!(values[0][0], "REEFFICIENCY DASHBOARD");
        assert_eq!(values[2][0], "Tahun");
        assert_eq!(values[2][1], today().year().to_string());

        // Move the year selector, then init again: the existing dashboard is left alone.
        store.select_dashboard_period(2020, None).await.unwrap();
        store.init().await.unwrap();
        assert_eq!(env.get_state().values(DASHBOARD)[2][1], "2020");
        assert_eq!(env.get_state().tabs.len(), 1);
    }

    #[tokio::test]
    async fn test_free_text_is_stored_literally() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        for description in ["=HYPERLINK(\"http://example.com\")", "1/2 kg beras"] {
            let t = Transaction::new(
                NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
                TransactionKind::Expense,
                Category::Groceries,
                Amount::from(20000),
                Some(description),
            );
            store.add_transaction(&t).await.unwrap();
        }
        let state = env.get_state();
        assert!(state.tab("6/25").unwrap().formulas.is_empty());
        assert_eq!(
            state.values("6/25")[1..].to_vec(),
            strings(&[
                &["2025-06-10", "groceries", "=HYPERLINK(\"http://example.com\")", "", "20000"],
                &["2025-06-10", "groceries", "1/2 kg beras", "", "20000"],
            ])
        );
        let dashboard = state.tab(DASHBOARD).unwrap();
        assert!(dashboard.formulas.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_connection_offline_then_online() {
        let env = TestEnv::new().await;
        let mut state = env.get_state();
        state.offline = true;
        env.set_state(state);

        let mut store = Store::new(env.config(), Mode::Testing);
        assert!(!store.ensure_connection().await);
        let t = tx("2025-06-10", TransactionKind::Expense, Category::Groceries, 10);
        let err = store.add_transaction(&t).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Connection);
        assert!(store.monthly_partitions().await.is_empty());

        let mut state = env.get_state();
        state.offline = false;
        env.set_state(state);
        assert!(store.ensure_connection().await);
        assert!(store.add_transaction(&t).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_or_create_partition_is_idempotent() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let name = PartitionName::from_str("6/25").unwrap();
        assert!(store.get_or_create_partition(name).await.unwrap());
        assert!(!store.get_or_create_partition(name).await.unwrap());
        let values = env.get_state().values("6/25");
        assert_eq!(values, vec![Column::headers()]);
        let tab = env.get_state().tab("6/25").cloned().unwrap();
        assert_eq!((tab.row_count, tab.col_count), (1000, 10));
    }

    #[tokio::test]
    async fn test_add_transaction_end_to_end() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let t = Transaction::from_parts(
            "2025-06-10",
            "expense",
            "transportation",
            Amount::from(150000),
            None,
        )
        .unwrap();
        let recorded = store.add_transaction(&t).await.unwrap();
        assert_eq!(recorded.partition.to_string(), "6/25");
        assert!(recorded.dashboard.is_complete());

        let values = env.get_state().values("6/25");
        assert_eq!(
            values,
            strings(&[
                &["Tanggal", "Kategori", "Deskripsi", "Pemasukan", "Pengeluaran"],
                &["2025-06-10", "transportation", "-", "", "150000"],
            ])
        );
        let summary = store.sheet_summary(recorded.partition).await;
        assert_eq!(summary.total_expense, Amount::from(150000));
        assert_eq!(summary.categories.get("transportation"), Some(Amount::from(150000)));
    }

    #[tokio::test]
    async fn test_add_transaction_rejects_invalid_amount() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let t = tx("2025-06-10", TransactionKind::Expense, Category::Groceries, 0);
        let err = store.add_transaction(&t).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert!(env.get_state().tab("6/25").is_none());
    }

    #[tokio::test]
    async fn test_add_row_places_by_header_name() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        // A hand-edited sheet with reordered columns and an extra one.
        let state = env.get_state().with_tab(
            "7/25",
            strings(&[&["Pengeluaran", "Catatan", "Tanggal", "Kategori"]]),
        );
        env.set_state(state);

        let record: Record = [
            ("Tanggal", "2025-07-01T08:30:00"),
            ("Kategori", "groceries"),
            ("Pengeluaran", "12000"),
            ("Unknown", "ignored"),
        ]
        .into_iter()
        .collect();
        store.add_row(record).await.unwrap();
        let values = env.get_state().values("7/25");
        assert_eq!(values[1], vec!["12000", "", "2025-07-01", "groceries"]);
    }

    #[tokio::test]
    async fn test_add_row_recreates_missing_header() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let state = env.get_state().with_tab("8/25", Vec::new());
        env.set_state(state);
        let t = tx("2025-08-02", TransactionKind::Income, Category::Salary, 500);
        store.add_transaction(&t).await.unwrap();
        let values = env.get_state().values("8/25");
        assert_eq!(values[0], Column::headers());
        assert_eq!(values[1], vec!["2025-08-02", "salary", "-", "500"]);
    }

    #[tokio::test]
    async fn test_add_row_rejects_bad_date() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let record: Record = [("Tanggal", "not-a-date"), ("Pengeluaran", "5")]
            .into_iter()
            .collect();
        let err = store.add_row(record).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(env.get_state().tabs.len(), 1);
    }

    #[tokio::test]
    async fn test_two_incomes_in_one_month() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let batch = vec![
            tx("2025-03-01", TransactionKind::Income, Category::Salary, 2_000_000),
            tx("2025-03-15", TransactionKind::Income, Category::Bonus, 3_000_000),
        ];
        let outcome = store.add_transactions(&batch).await.unwrap();
        assert_eq!(outcome.written.len(), 2);
        assert!(outcome.failures.is_empty());
        assert!(outcome.dashboard.is_some());

        let summary = store
            .sheet_summary(PartitionName::from_str("3/25").unwrap())
            .await;
        assert_eq!(summary.total_income, Amount::from(5_000_000));
        assert_eq!(summary.total_expense, Amount::ZERO);
        assert_eq!(summary.net, Amount::from(5_000_000));
    }

    #[tokio::test]
    async fn test_add_transactions_reports_failures() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let batch = vec![
            tx("2025-03-01", TransactionKind::Expense, Category::Groceries, 0),
            tx("2025-03-02", TransactionKind::Expense, Category::Groceries, 10),
        ];
        let outcome = store.add_transactions(&batch).await.unwrap();
        assert_eq!(outcome.written.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, 0);

        let nothing = store
            .add_transactions(&[tx("2025-03-01", TransactionKind::Expense, Category::Travel, 0)])
            .await
            .unwrap();
        assert!(nothing.dashboard.is_none());
    }

    #[tokio::test]
    async fn test_monthly_partitions_skips_other_sheets() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let state = env
            .get_state()
            .with_tab("Notes", strings(&[&["anything"]]))
            .with_tab(
                "6/25",
                strings(&[
                    &["Tanggal", "Kategori", "Deskripsi", "Pemasukan", "Pengeluaran"],
                    &["2025-06-01", "food", "-", "", "50000"],
                    &["2025-06-02", "food", "-", "", "bad"],
                    &["2025-06-03", "food", "-", "", ""],
                    &["2025-06-04", "food", "-", "", "25,000"],
                ]),
            )
            .with_tab("5/25", Vec::new());
        env.set_state(state);

        let all = store.monthly_partitions().await;
        assert_eq!(all.len(), 2);
        let june = all.get(2025, 6).unwrap();
        assert_eq!(june.total_expense, Amount::from(75000));
        assert_eq!(june.categories.get("food"), Some(Amount::from(75000)));
        assert_eq!(all.get(2025, 5), Some(&SheetSummary::default()));
    }

    #[tokio::test]
    async fn test_monthly_partitions_skips_unreadable_sheet() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let mut state = env
            .get_state()
            .with_tab("1/25", strings(&[&["Tanggal"]]))
            .with_tab("2/25", strings(&[&["Tanggal"]]));
        state.failing.insert("1/25".to_string());
        env.set_state(state);
        let all = store.monthly_partitions().await;
        assert_eq!(all.len(), 1);
        assert!(all.get(2025, 2).is_some());
        assert_eq!(
            store
                .sheet_summary(PartitionName::from_str("1/25").unwrap())
                .await,
            SheetSummary::default()
        );
    }

    #[tokio::test]
    async fn test_update_dashboard() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let batch = vec![
            tx("2025-06-01", TransactionKind::Income, Category::Salary, 1000),
            tx("2025-06-02", TransactionKind::Expense, Category::FoodDining, 300),
            tx("2025-07-02", TransactionKind::Expense, Category::Travel, 500),
            tx("2024-07-02", TransactionKind::Expense, Category::Travel, 9),
        ];
        store.add_transactions(&batch).await.unwrap();
        let status = store.select_dashboard_period(2025, Some(6)).await.unwrap();
        assert!(status.is_complete());
        assert_eq!(
            status.selection,
            Selection {
                year: 2025,
                month: Some(6)
            }
        );

        let values = env.get_state().values(DASHBOARD);
        assert_eq!(values[3][1], "Juni");
        // June row of the monthly table.
        assert_eq!(&values[11][1..4], &["1000", "300", "700"]);
        // July row.
        assert_eq!(&values[12][1..4], &["0", "500", "-500"]);
        // January row is blank.
        assert!(values[6][1..4].iter().all(String::is_empty));
        // Annual totals.
        assert_eq!(values[6][6], "1000");
        assert_eq!(values[7][6], "800");
        assert_eq!(values[8][6], "200");
        // Annual top categories.
        assert_eq!(&values[12][5..7], &["travel", "500"]);
        assert_eq!(&values[13][5..7], &["food_dining", "300"]);
        // Monthly top categories for June.
        assert_eq!(&values[20][5..7], &["food_dining", "300"]);
    }

    #[tokio::test]
    async fn test_update_dashboard_is_idempotent() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        store
            .add_transaction(&tx("2025-06-02", TransactionKind::Expense, Category::Travel, 7))
            .await
            .unwrap();
        store.select_dashboard_period(2025, Some(6)).await.unwrap();
        let first = env.get_state().values(DASHBOARD);
        store.update_dashboard().await.unwrap();
        let second = env.get_state().values(DASHBOARD);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_month_selector_blanks_monthly_top() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        store
            .add_transaction(&tx("2025-06-02", TransactionKind::Expense, Category::Travel, 7))
            .await
            .unwrap();
        store.select_dashboard_period(2025, Some(6)).await.unwrap();
        assert_eq!(env.get_state().values(DASHBOARD)[20][5], "travel");

        store
            .connected()
            .await
            .unwrap()
            .write_ranges(&[api::SheetRange::new(
                DASHBOARD,
                "B4",
                vec![vec!["Smarch".to_string()]],
            )])
            .await
            .unwrap();
        let status = store.update_dashboard().await.unwrap();
        assert!(status.is_complete());
        assert_eq!(status.selection.month, None);
        let values = env.get_state().values(DASHBOARD);
        assert!(values.get(20).map_or(true, |r| r.len() <= 5));
    }

    #[tokio::test]
    async fn test_blank_year_selector_defaults_to_current_year() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        store
            .connected()
            .await
            .unwrap()
            .write_ranges(&[api::SheetRange::new(
                DASHBOARD,
                "B3",
                vec![vec![String::new()]],
            )])
            .await
            .unwrap();
        let status = store.update_dashboard().await.unwrap();
        assert_eq!(status.selection.year, today().year());
    }

    #[tokio::test]
    async fn test_recompute_failure_is_reported() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let mut state: TestSheetState = env.get_state();
        state.failing.insert(DASHBOARD.to_string());
        env.set_state(state);

        let t = tx("2025-06-02", TransactionKind::Expense, Category::Travel, 7);
        let recorded = store.add_transaction(&t).await.unwrap();
        assert_eq!(recorded.dashboard.failures.len(), 4);
        assert_eq!(
            recorded.dashboard.failures[0].step,
            DashboardStep::MonthlyTable
        );
        // The row itself was written.
        assert_eq!(env.get_state().values("6/25").len(), 2);
    }

    #[tokio::test]
    async fn test_partition_records_and_names() {
        let env = TestEnv::new().await;
        let mut store = store(&env).await;
        let june = PartitionName::from_str("6/25").unwrap();
        assert!(store.partition_records(june).await.unwrap().is_none());
        store
            .add_transaction(&tx("2025-06-02", TransactionKind::Expense, Category::Travel, 7))
            .await
            .unwrap();
        store
            .add_transaction(&tx("2025-01-02", TransactionKind::Expense, Category::Travel, 7))
            .await
            .unwrap();
        let records = store.partition_records(june).await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records.data()[0].get("Kategori"), "travel");
        let names: Vec<String> = store
            .partition_names()
            .await
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["1/25", "6/25"]);
        assert_eq!(store.title().await.unwrap(), "Reefficiency (test)");
    }
}
