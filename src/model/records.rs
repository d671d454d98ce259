use crate::error::Res;
use crate::model::Mapping;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One row of a sheet keyed by header name.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.0.insert(header.into(), value.into());
    }

    /// The value under `header`, or an empty string if the row has no such column.
    pub fn get(&self, header: &str) -> &str {
        self.0.get(header).map(String::as_str).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Record(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The rows of a sheet below its header row.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Records {
    mapping: Mapping,
    data: Vec<Record>,
}

impl Records {
    /// Parses downloaded sheet values: the first row is the header row and each following row
    /// becomes a `Record`. Short rows are padded with blanks and cells to the right of the last
    /// header are ignored.
    pub(crate) fn parse<S, R, I>(sheet_data: I) -> Res<Self>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
        I: IntoIterator<Item = R>,
    {
        let mut rows = sheet_data.into_iter();
        let mapping = match rows.next() {
            Some(header_row) => Mapping::new(header_row)?,
            None => bail!("An empty data set cannot be parsed into a Records object"),
        };

        let mut data = Vec::new();
        for (row_ix, row) in rows.enumerate() {
            let values: Vec<String> = row.into_iter().map(|s| s.into()).collect();
            if values.len() > mapping.len() {
                debug!(
                    "Row {} has {} cells but only {} headers, ignoring the extra cells",
                    row_ix + 2,
                    values.len(),
                    mapping.len()
                );
            }
            let mut record = Record::default();
            for (ix, header) in mapping.headers().iter().enumerate() {
                if header.trim().is_empty() {
                    continue;
                }
                let value = values.get(ix).cloned().unwrap_or_default();
                record.insert(header.trim(), value);
            }
            data.push(record);
        }
        Ok(Self { mapping, data })
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn data(&self) -> &[Record] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let records = Records::parse(vec![
            vec!["Tanggal", "Kategori", "Deskripsi", "Pemasukan", "Pengeluaran"],
            vec!["2025-06-10", "transportation", "-", "", "150000"],
            vec!["2025-06-11", "salary"],
        ])
        .unwrap();
        assert_eq!(records.len(), 2);
        let first = &records.data()[0];
        assert_eq!(first.get("Pengeluaran"), "150000");
        assert_eq!(first.get("Pemasukan"), "");
        let second = &records.data()[1];
        assert_eq!(second.get("Kategori"), "salary");
        assert_eq!(second.get("Pengeluaran"), "");
        assert_eq!(second.get("Nope"), "");
    }

    #[test]
    fn test_parse_ignores_extra_cells() {
        let records = Records::parse(vec![vec!["A"], vec!["1", "2", "3"]]).unwrap();
        assert_eq!(records.data()[0].get("A"), "1");
        assert_eq!(records.data()[0].iter().count(), 1);
    }

    #[test]
    fn test_parse_header_only() {
        let records = Records::parse(vec![vec!["A", "B"]]).unwrap();
        assert!(records.is_empty());
        assert_eq!(records.mapping().len(), 2);
    }

    #[test]
    fn test_parse_empty_is_error() {
        let empty: Vec<Vec<String>> = Vec::new();
        assert!(Records::parse(empty).is_err());
    }

    #[test]
    fn test_blank_record() {
        let records = Records::parse(vec![vec!["A", "B"], vec!["", " "]]).unwrap();
        assert!(records.data()[0].is_blank());
    }
}
