//! These structs provide the CLI interface for the reef CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// reef: record income and expenses into a Google spreadsheet, by chat or from the command line.
///
/// Every transaction lands in a monthly sheet named like `6/25` and a `Dashboard` sheet with
/// monthly, annual and top-category summaries is kept up to date after every write. The `run`
/// command starts a Telegram bot that understands free text through Gemini.
///
/// The spreadsheet is reached with a Google Cloud service account. Share the spreadsheet with the
/// service account's email address before running `reef init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and its configuration file.
    ///
    /// - Decide where the home directory goes and pass it as --home. By default it is
    ///   $HOME/reefficiency.
    ///
    /// - Create a service account in Google Cloud, download its JSON key and pass the key file
    ///   as --service-account. The key is copied into the home directory.
    ///
    /// - Share the spreadsheet with the service account. Pass its title as --sheet-name and,
    ///   optionally, its URL as --sheet-url. Without a URL the spreadsheet is looked up by title.
    Init(InitArgs),
    /// Connect to the spreadsheet and list its monthly sheets.
    Verify,
    /// Record one transaction.
    Record(RecordArgs),
    /// Print a monthly or annual report.
    Report(ReportArgs),
    /// Recompute the dashboard, optionally pointing it at another year or month first.
    Dashboard(DashboardArgs),
    /// Run the Telegram bot.
    Run(RunArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration and secrets are held. Defaults to ~/reefficiency
    #[arg(long, env = "REEF_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `reef init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The title of the spreadsheet.
    #[arg(long)]
    sheet_name: String,

    /// The URL of the spreadsheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: Option<String>,

    /// The path to the downloaded service account key. This file will be copied into the
    /// secrets directory of the home directory.
    #[arg(long)]
    service_account: PathBuf,

    /// A Telegram user id allowed to use the bot. Repeat for several users.
    #[arg(long = "allow")]
    allowed_user_ids: Vec<i64>,
}

impl InitArgs {
    pub fn new(
        sheet_name: impl Into<String>,
        sheet_url: Option<String>,
        service_account: impl Into<PathBuf>,
        allowed_user_ids: Vec<i64>,
    ) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            sheet_url,
            service_account: service_account.into(),
            allowed_user_ids,
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url.as_deref()
    }

    pub fn service_account(&self) -> &Path {
        &self.service_account
    }

    pub fn allowed_user_ids(&self) -> &[i64] {
        &self.allowed_user_ids
    }
}

/// (Not shown): Args for the `reef record` command.
#[derive(Debug, Parser, Clone)]
pub struct RecordArgs {
    /// `pemasukan` (income) or `pengeluaran` (expense).
    kind: String,

    /// A category tag such as `food_dining`, or an Indonesian keyword such as `bensin`.
    category: String,

    /// The amount in Rupiah. Both `,` and `.` are accepted as thousands separators.
    amount: String,

    /// An optional description.
    description: Vec<String>,

    /// The date as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,
}

impl RecordArgs {
    pub fn new(
        kind: impl Into<String>,
        category: impl Into<String>,
        amount: impl Into<String>,
        description: Vec<String>,
        date: Option<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            category: category.into(),
            amount: amount.into(),
            description,
            date,
        }
    }

    /// The positional arguments in `/catat` order.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = vec![self.kind.clone(), self.category.clone(), self.amount.clone()];
        tokens.extend(self.description.iter().cloned());
        tokens
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

/// (Not shown): Args for the `reef report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// A month name (`juni`), a year (`2024`) or both (`juni 2024`).
    period: Vec<String>,
}

impl ReportArgs {
    pub fn new(period: Vec<String>) -> Self {
        Self { period }
    }

    pub fn period(&self) -> &[String] {
        &self.period
    }
}

/// (Not shown): Args for the `reef dashboard` command.
#[derive(Debug, Parser, Clone)]
pub struct DashboardArgs {
    /// The year the dashboard should show.
    #[arg(long)]
    year: Option<i32>,

    /// The month the top-category table should show, by name. Requires --year.
    #[arg(long, requires = "year")]
    month: Option<String>,
}

impl DashboardArgs {
    pub fn new(year: Option<i32>, month: Option<String>) -> Self {
        Self { year, month }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }
}

/// (Not shown): Args for the `reef run` command.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// The Telegram bot token from @BotFather.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_token: String,

    /// The Gemini API key used to understand free-text messages.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Overrides the Gemini model from the config file.
    #[arg(long)]
    gemini_model: Option<String>,
}

impl RunArgs {
    pub fn new(
        telegram_token: impl Into<String>,
        gemini_api_key: impl Into<String>,
        gemini_model: Option<String>,
    ) -> Self {
        Self {
            telegram_token: telegram_token.into(),
            gemini_api_key: gemini_api_key.into(),
            gemini_model,
        }
    }

    pub fn telegram_token(&self) -> &str {
        &self.telegram_token
    }

    pub fn gemini_api_key(&self) -> &str {
        &self.gemini_api_key
    }

    pub fn gemini_model(&self) -> Option<&str> {
        self.gemini_model.as_deref()
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("reefficiency"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or REEF_HOME instead of relying on the default home \
                directory. If you continue using the program right now, you may have problems!",
            );
            PathBuf::from("reefficiency")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
