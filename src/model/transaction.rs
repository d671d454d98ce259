use crate::model::{Amount, Category, Record};
use anyhow::{bail, ensure, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The placeholder written into `Deskripsi` when no description was given.
pub const NO_DESCRIPTION: &str = "-";

/// The date format used in the `Tanggal` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[serde(alias = "pemasukan")]
    Income,
    #[serde(alias = "pengeluaran")]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionKind);

impl FromStr for TransactionKind {
    type Err = anyhow::Error;

    /// Accepts `income`, `expense`, `pemasukan` or `pengeluaran` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        serde_plain::from_str(&lower).with_context(|| {
            format!("Transaction kind must be 'pemasukan' or 'pengeluaran', got '{s}'")
        })
    }
}

/// A single income or expense, validated before it is written to its monthly sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    date: NaiveDate,
    kind: TransactionKind,
    category: Category,
    amount: Amount,
    description: String,
}

impl Transaction {
    /// Creates a transaction. A blank description becomes `NO_DESCRIPTION`. Call `validate`
    /// before persisting.
    pub fn new(
        date: NaiveDate,
        kind: TransactionKind,
        category: Category,
        amount: Amount,
        description: Option<&str>,
    ) -> Self {
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(NO_DESCRIPTION)
            .to_string();
        Self {
            date,
            kind,
            category,
            amount,
            description,
        }
    }

    /// Creates a transaction from loosely-typed parts such as those extracted from a chat
    /// message. The category is resolved with `Category::resolve` and so never fails.
    pub fn from_parts(
        date: &str,
        kind: &str,
        category: &str,
        amount: Amount,
        description: Option<&str>,
    ) -> anyhow::Result<Self> {
        let date = parse_date(date)?;
        let kind = TransactionKind::from_str(kind)?;
        Ok(Self::new(
            date,
            kind,
            Category::resolve(category),
            amount,
            description,
        ))
    }

    /// Fails unless the amount is a positive whole number of Rupiah no larger than `i64::MAX`.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.amount.is_positive(),
            "The amount must be greater than 0, got {}",
            self.amount.plain()
        );
        ensure!(
            self.amount.is_whole(),
            "The amount must be a whole number, got {}",
            self.amount.plain()
        );
        ensure!(
            self.amount.is_in_range(),
            "The amount {} is too large",
            self.amount.plain()
        );
        Ok(())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Flattens the transaction into a row keyed by sheet header. Exactly one of the income and
    /// expense cells is filled.
    pub fn to_record(&self) -> Record {
        let (income, expense) = match self.kind {
            TransactionKind::Income => (self.amount.plain(), String::new()),
            TransactionKind::Expense => (String::new(), self.amount.plain()),
        };
        let mut record = Record::default();
        record.insert(Column::Date.header(), self.date.format(DATE_FORMAT).to_string());
        record.insert(Column::Category.header(), self.category.to_string());
        record.insert(Column::Description.header(), self.description.clone());
        record.insert(Column::Income.header(), income);
        record.insert(Column::Expense.header(), expense);
        record
    }
}

/// Parses the date-only portion of `s`. Timestamps such as `2025-06-10 14:03:00` or
/// `2025-06-10T14:03:00` are accepted and truncated.
pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    let date_part = date_only(s);
    if date_part.is_empty() {
        bail!("A date is required");
    }
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

/// Returns the part of `s` before any time-of-day component.
pub fn date_only(s: &str) -> &str {
    let s = s.trim();
    s.split([' ', 'T']).next().unwrap_or(s)
}

/// The columns of a monthly sheet, in canonical order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Date,
    Category,
    Description,
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(Column);

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Date,
        Column::Category,
        Column::Description,
        Column::Income,
        Column::Expense,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Date => DATE_STR,
            Column::Category => CATEGORY_STR,
            Column::Description => DESCRIPTION_STR,
            Column::Income => INCOME_STR,
            Column::Expense => EXPENSE_STR,
        }
    }

    pub fn from_header(header: impl AsRef<str>) -> anyhow::Result<Column> {
        match header.as_ref() {
            DATE_STR => Ok(Column::Date),
            CATEGORY_STR => Ok(Column::Category),
            DESCRIPTION_STR => Ok(Column::Description),
            INCOME_STR => Ok(Column::Income),
            EXPENSE_STR => Ok(Column::Expense),
            bad => bail!("Invalid column name '{bad}'"),
        }
    }

    /// The canonical header row.
    pub fn headers() -> Vec<String> {
        Column::ALL.iter().map(|c| c.header().to_string()).collect()
    }
}

pub(crate) const DATE_STR: &str = "Tanggal";
pub(crate) const CATEGORY_STR: &str = "Kategori";
pub(crate) const DESCRIPTION_STR: &str = "Deskripsi";
pub(crate) const INCOME_STR: &str = "Pemasukan";
pub(crate) const EXPENSE_STR: &str = "Pengeluaran";

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            TransactionKind::from_str("income").unwrap(),
            TransactionKind::Income
        );
        assert_eq!(
            TransactionKind::from_str("Pengeluaran").unwrap(),
            TransactionKind::Expense
        );
        assert_eq!(
            TransactionKind::from_str("PEMASUKAN").unwrap(),
            TransactionKind::Income
        );
        assert!(TransactionKind::from_str("transfer").is_err());
        assert!(TransactionKind::from_str("").is_err());
        assert_eq!(TransactionKind::Expense.to_string(), "expense");
    }

    #[test]
    fn test_validate_positive_amount() {
        let t = Transaction::new(
            date("2025-06-10"),
            TransactionKind::Expense,
            Category::FoodDining,
            Amount::from(1),
            None,
        );
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_and_negative_amount() {
        for value in [0, -100] {
            let t = Transaction::new(
                date("2025-06-10"),
                TransactionKind::Income,
                Category::Salary,
                Amount::from(value),
                Some("gaji"),
            );
            assert!(t.validate().is_err(), "amount {value} should be rejected");
        }
    }

    #[test]
    fn test_validate_fractional_and_huge_amount() {
        for value in ["1.5", "100000000000000000000"] {
            let t = Transaction::new(
                date("2025-06-10"),
                TransactionKind::Expense,
                Category::FoodDining,
                Amount::new(rust_decimal::Decimal::from_str(value).unwrap()),
                None,
            );
            assert!(t.validate().is_err(), "amount {value} should be rejected");
        }
    }

    #[test]
    fn test_from_parts_rejects_bad_kind() {
        let res = Transaction::from_parts(
            "2025-06-10",
            "transfer",
            "transportation",
            Amount::from(100),
            None,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_from_parts_resolves_category() {
        let t = Transaction::from_parts(
            "2025-06-10 08:30:00",
            "pengeluaran",
            "bensin",
            Amount::from(150000),
            Some("isi bensin"),
        )
        .unwrap();
        assert_eq!(t.category(), Category::Transportation);
        assert_eq!(t.kind(), TransactionKind::Expense);
        assert_eq!(t.date(), date("2025-06-10"));
        assert_eq!(t.description(), "isi bensin");
    }

    #[test]
    fn test_description_defaults_to_placeholder() {
        let t = Transaction::new(
            date("2025-06-10"),
            TransactionKind::Expense,
            Category::Transportation,
            Amount::from(150000),
            Some("   "),
        );
        assert_eq!(t.description(), NO_DESCRIPTION);
    }

    #[test]
    fn test_to_record_expense() {
        let t = Transaction::new(
            date("2025-06-10"),
            TransactionKind::Expense,
            Category::Transportation,
            Amount::from(150000),
            None,
        );
        let record = t.to_record();
        assert_eq!(record.get("Tanggal"), "2025-06-10");
        assert_eq!(record.get("Kategori"), "transportation");
        assert_eq!(record.get("Deskripsi"), "-");
        assert_eq!(record.get("Pemasukan"), "");
        assert_eq!(record.get("Pengeluaran"), "150000");
    }

    #[test]
    fn test_to_record_income() {
        let t = Transaction::new(
            date("2025-01-31"),
            TransactionKind::Income,
            Category::Salary,
            Amount::from(2_000_000),
            Some("gaji"),
        );
        let record = t.to_record();
        assert_eq!(record.get("Pemasukan"), "2000000");
        assert_eq!(record.get("Pengeluaran"), "");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-12-01").unwrap(), date("2025-12-01"));
        assert_eq!(parse_date("2025-12-01T10:00:00Z").unwrap(), date("2025-12-01"));
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("").is_err());
        assert!(parse_date("2025-13-01").is_err());
    }

    #[test]
    fn test_column_headers() {
        assert_eq!(
            Column::headers(),
            vec!["Tanggal", "Kategori", "Deskripsi", "Pemasukan", "Pengeluaran"]
        );
        assert_eq!(Column::from_header("Pengeluaran").unwrap(), Column::Expense);
        assert!(Column::from_header("Date").is_err());
    }
}
