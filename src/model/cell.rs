//! A1-notation cell addresses.

use anyhow::{bail, Context};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single cell address such as `B7`. Rows and columns are 1-based, as in A1 notation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Cell {
    row: u32,
    col: u32,
}

impl Cell {
    /// A zero row or column is treated as 1.
    pub const fn new(row: u32, col: u32) -> Self {
        Self {
            row: if row == 0 { 1 } else { row },
            col: if col == 0 { 1 } else { col },
        }
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    /// The cell `rows` below and `cols` to the right of this one.
    pub fn offset(&self, rows: u32, cols: u32) -> Cell {
        Cell::new(self.row + rows, self.col + cols)
    }

    /// The range spanning from this cell to `end`, e.g. `B7:D18`.
    pub fn to(&self, end: Cell) -> String {
        format!("{self}:{end}")
    }
}

/// Converts a 1-based column number into letters: 1 -> A, 26 -> Z, 27 -> AA.
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl FromStr for Cell {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_uppercase();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .with_context(|| format!("Cell '{s}' has no row number"))?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
            bail!("Cell '{s}' must start with column letters");
        }
        let col = letters
            .chars()
            .fold(0u32, |acc, c| acc * 26 + (c as u32 - 'A' as u32 + 1));
        let row = digits
            .parse::<u32>()
            .with_context(|| format!("Invalid row number in cell '{s}'"))?;
        if row == 0 {
            bail!("Row numbers start at 1, got '{s}'");
        }
        Ok(Cell { row, col })
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cell::from_str(&s).map_err(serde::de::Error::custom)
    }
}
