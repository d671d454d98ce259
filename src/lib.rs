mod api;
pub mod args;
pub mod bot;
pub mod commands;
mod config;
mod error;
pub mod intent;
pub mod locale;
pub mod model;
pub mod prefs;
pub mod report;
pub mod store;
pub mod telegram;
mod utils;


pub use config::Config;
pub use error::{Error, ErrorType, Result};
pub use model::Amount;

/// The environment variable that switches the program to the in-memory test spreadsheet.
pub const TEST_MODE_ENV: &str = "REEF_IN_TEST_MODE";

/// Which spreadsheet backend to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The real Google Sheets API.
    #[default]
    Google,
    /// An in-memory spreadsheet that lives as long as the process.
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `REEF_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}
