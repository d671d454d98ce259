//! The boundary to the backing spreadsheet.
//!
//! Everything that talks to Google goes through the `Sheet` trait so that the rest of the program
//! can run against `TestSheet`, an in-memory stand-in, when `Mode::Testing` is selected.

mod oauth;
mod sheet;
mod sheet_test_client;

use crate::error::Res;
use crate::{Config, Mode};
use anyhow::Context;
use tracing::debug;

pub(crate) use oauth::TokenProvider;
pub(crate) use sheet::GoogleSheet;
pub(crate) use sheet_test_client::TestSheet;
#[cfg(test)]
pub(crate) use sheet_test_client::{load_csv, TestSheetState};

// OAuth scopes required by the service account. drive.readonly is needed to find the spreadsheet
// by name.
pub(crate) const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// A batch of values destined for one A1 range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetRange {
    pub(crate) range: String,
    pub(crate) values: Vec<Vec<String>>,
}

impl SheetRange {
    /// Creates a range on `sheet_name`; `range` is the part after the `!`, e.g. `B7:D18`.
    pub(crate) fn new(sheet_name: &str, range: &str, values: Vec<Vec<String>>) -> Self {
        Self {
            range: a1(sheet_name, range),
            values,
        }
    }
}

/// Builds a fully-qualified A1 range. The sheet name is always quoted because partition names
/// contain `/`.
pub(crate) fn a1(sheet_name: &str, range: &str) -> String {
    format!("'{}'!{range}", sheet_name.replace('\'', "''"))
}

/// Marks `text` as a literal string for user-entered writes, so Sheets stores it as typed instead
/// of reading it as a formula, number or date. The apostrophe is not part of the stored value.
pub(crate) fn literal(text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        format!("'{text}")
    }
}

/// Splits a fully-qualified A1 range into its sheet name and the remainder.
pub(crate) fn split_a1(range: &str) -> Res<(String, &str)> {
    let (sheet, rest) = range
        .rsplit_once('!')
        .with_context(|| format!("Range '{range}' is missing a sheet name"))?;
    let sheet = match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => sheet.to_string(),
    };
    Ok((sheet, rest))
}

/// The operations the store needs from a spreadsheet. Values are read as formatted strings and
/// written as if typed by a user.
#[async_trait::async_trait]
pub(crate) trait Sheet: Send {
    /// The title of the spreadsheet itself.
    async fn title(&mut self) -> Res<String>;

    /// The names of all sheets (tabs) in the spreadsheet, in tab order.
    async fn sheet_names(&mut self) -> Res<Vec<String>>;

    /// Adds an empty sheet with the given grid size.
    async fn add_sheet(&mut self, name: &str, rows: u32, cols: u32) -> Res<()>;

    /// Reads a fully-qualified A1 range. Trailing blank cells and rows are not returned.
    async fn get_range(&mut self, range: &str) -> Res<Vec<Vec<String>>>;

    /// Appends rows after the last non-empty row of `sheet_name`.
    async fn append_rows(&mut self, sheet_name: &str, rows: &[Vec<String>]) -> Res<()>;

    /// Writes several ranges in one request.
    async fn write_ranges(&mut self, data: &[SheetRange]) -> Res<()>;

    /// Reads every value of `sheet_name`.
    async fn get(&mut self, sheet_name: &str) -> Res<Vec<Vec<String>>> {
        self.get_range(&a1(sheet_name, "A:ZZ")).await
    }
}

/// Opens the spreadsheet described by `config`. For `Mode::Google` this authenticates with the
/// service account and, when the config has no sheet URL, looks the spreadsheet up by name.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Res<Box<dyn Sheet>> {
    match mode {
        Mode::Testing => {
            debug!("Using the in-memory test sheet for '{}'", config.sheet_key());
            Ok(Box::new(TestSheet::new(config.sheet_key())))
        }
        Mode::Google => {
            let mut token_provider = TokenProvider::load(&config.service_account_path())
                .await
                .context("Unable to load the service account key")?;
            let spreadsheet_id = match config.spreadsheet_id() {
                Some(id) => id.to_string(),
                None => sheet::find_spreadsheet_id(&mut token_provider, config.sheet_name())
                    .await
                    .with_context(|| {
                        format!("Unable to find a spreadsheet named '{}'", config.sheet_name())
                    })?,
            };
            debug!("Opening spreadsheet {spreadsheet_id}");
            Ok(Box::new(
                GoogleSheet::new(spreadsheet_id, token_provider).await?,
            ))
        }
    }
}
