//! Slash commands and their positional arguments.
//!
//! The argument parsers are shared with the CLI so that `reef record` and `/catat` accept exactly
//! the same input.

use crate::model::{
    month_name, parse_date, parse_month, Amount, Category, Transaction, TransactionKind,
};
use crate::report::Period;
use chrono::{Datelike, NaiveDate};
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub(crate) const RECORD_USAGE: &str = "Format salah. Gunakan: `/catat jenis kategori jumlah \
    [deskripsi] [YYYY-MM-DD]`\nContoh: `/catat pengeluaran makanan 50000 Nasi Padang`";

pub(crate) const REPORT_USAGE: &str = "Format salah. Gunakan:\n\
    `/laporan [bulan]` - Laporan bulan terakhir\n\
    `/laporan [tahun]` - Laporan tahun terakhir\n\
    `/laporan [bulan] [tahun]` - Laporan bulan dan tahun spesifik\n\n\
    Contoh:\n\
    `/laporan januari`\n\
    `/laporan 2024`\n\
    `/laporan februari 2024`";

const INVALID_MONTH: &str = "Format bulan tidak valid. Gunakan nama bulan dalam bahasa \
    Indonesia.\nContoh: januari, februari, maret, dst.";

const INVALID_YEAR: &str = "Format tahun tidak valid.";

const INVALID_AMOUNT: &str = "Jumlah harus berupa angka positif.";

const TOO_MANY: &str = "Terlalu banyak parameter. Maksimal 2 parameter.";

/// Input that a command refused. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection(String);

impl Rejection {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for Rejection {}

/// A message that starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Lang(Vec<String>),
    Record(Vec<String>),
    Report(Vec<String>),
    Dashboard(Vec<String>),
    Unknown(String),
}

impl Command {
    /// Returns `None` for text that is not a command. A `@botname` suffix on the command is
    /// ignored.
    pub fn parse(text: &str) -> Option<Command> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let args: Vec<String> = tokens.map(str::to_string).collect();
        Some(match name.as_str() {
            "start" => Command::Start,
            "lang" => Command::Lang(args),
            "catat" => Command::Record(args),
            "laporan" => Command::Report(args),
            "dashboard" => Command::Dashboard(args),
            _ => Command::Unknown(name),
        })
    }
}

/// Parses `KIND CATEGORY AMOUNT [DESCRIPTION...] [YYYY-MM-DD]`. A trailing token that is a date
/// becomes the transaction date, otherwise the date is `today`.
pub fn parse_record<S: AsRef<str>>(args: &[S], today: NaiveDate) -> Result<Transaction, Rejection> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    if args.len() < 3 {
        return Err(Rejection::new(RECORD_USAGE));
    }
    let kind = TransactionKind::from_str(args[0]).map_err(|e| Rejection::new(format!("{e}")))?;
    let category = Category::resolve(args[1]);
    let amount = Amount::parse_input(args[2]).map_err(|_| Rejection::new(INVALID_AMOUNT))?;

    let mut rest = &args[3..];
    let mut date = today;
    if let Some((last, init)) = rest.split_last() {
        if let Ok(parsed) = parse_date(last) {
            date = parsed;
            rest = init;
        }
    }
    let description = rest.join(" ");

    let transaction = Transaction::new(date, kind, category, amount, Some(&description));
    transaction
        .validate()
        .map_err(|_| Rejection::new(INVALID_AMOUNT))?;
    Ok(transaction)
}

/// Parses the arguments of `/laporan`: a year, a month name, or a month name and a year. A month
/// name alone means its most recent occurrence, so in June `agustus` is last year's August.
pub fn parse_report<S: AsRef<str>>(args: &[S], today: NaiveDate) -> Result<Period, Rejection> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    match args.as_slice() {
        [] => Err(Rejection::new(REPORT_USAGE)),
        [arg] => {
            if let Some(year) = parse_year(arg) {
                if year > today.year() {
                    return Err(Rejection::new(format!("❌ Tahun {year} belum berlangsung.")));
                }
                return Ok(Period::annual(year));
            }
            let month = parse_month(arg).ok_or_else(|| Rejection::new(INVALID_MONTH))?;
            let year = if month > today.month() {
                today.year() - 1
            } else {
                today.year()
            };
            monthly(year, month)
        }
        [month, year] => {
            let month = parse_month(month).ok_or_else(|| Rejection::new(INVALID_MONTH))?;
            let year = parse_year(year).ok_or_else(|| Rejection::new(INVALID_YEAR))?;
            if (year, month) > (today.year(), today.month()) {
                return Err(Rejection::new(format!(
                    "❌ Bulan {} dan tahun {year} belum berlangsung.",
                    month_name(month)
                )));
            }
            monthly(year, month)
        }
        _ => Err(Rejection::new(TOO_MANY)),
    }
}

/// Parses the arguments of `/dashboard`. No arguments means "keep the current selection";
/// otherwise the same forms as `/laporan` are accepted, except that a year alone clears the month
/// and future periods are allowed.
pub fn parse_dashboard<S: AsRef<str>>(
    args: &[S],
    today: NaiveDate,
) -> Result<Option<(i32, Option<u32>)>, Rejection> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    match args.as_slice() {
        [] => Ok(None),
        [arg] => {
            if let Some(year) = parse_year(arg) {
                return Ok(Some((year, None)));
            }
            let month = parse_month(arg).ok_or_else(|| Rejection::new(INVALID_MONTH))?;
            Ok(Some((today.year(), Some(month))))
        }
        [month, year] => {
            let month = parse_month(month).ok_or_else(|| Rejection::new(INVALID_MONTH))?;
            let year = parse_year(year).ok_or_else(|| Rejection::new(INVALID_YEAR))?;
            Ok(Some((year, Some(month))))
        }
        _ => Err(Rejection::new(TOO_MANY)),
    }
}

fn parse_year(s: &str) -> Option<i32> {
    s.trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (1900..=2100).contains(y))
}

fn monthly(year: i32, month: u32) -> Result<Period, Rejection> {
    Period::monthly(year, month).map_err(|e| Rejection::new(format!("{e}")))
}
