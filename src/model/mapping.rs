use serde::de::Error as SerdeError;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MappingError(String);

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for MappingError {}

/// The header row of a sheet, with a lookup from header name to column index. Blank headers are
/// kept for positioning but cannot be looked up.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<String>,
    header_map: HashMap<String, usize>,
}

impl Mapping {
    pub fn new<S, I>(headers: I) -> Result<Self, MappingError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<String> = headers.into_iter().map(|s| s.into()).collect();
        let mut header_map = HashMap::new();
        for (ix, header) in headers.iter().enumerate() {
            let key = header.trim();
            if key.is_empty() {
                continue;
            }
            if header_map.insert(key.to_string(), ix).is_some() {
                return Err(MappingError(format!(
                    "Encountered a duplicate header '{key}'"
                )));
            }
        }
        Ok(Self {
            headers,
            header_map,
        })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header_map.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn header_index(&self, header: &str) -> Option<usize> {
        self.header_map.get(header.trim()).copied()
    }

    /// Builds a row as wide as the header row, placing each value of `fields` at the column of
    /// the header with the same name. Fields without a matching header are dropped.
    pub fn place<'a, I>(&self, fields: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut row = vec![String::new(); self.len()];
        for (key, value) in fields {
            if let Some(ix) = self.header_index(key) {
                row[ix] = value.to_string();
            }
        }
        row
    }
}

impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.headers.len()))?;
        for header in &self.headers {
            seq.serialize_element(header)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items: Vec<String> = Vec::deserialize(deserializer)?;
        let mapping = Mapping::new(items).map_err(D::Error::custom)?;
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_lookup() {
        let mapping = Mapping::new(["Tanggal", "Kategori", "Pengeluaran"]).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.header_index("Kategori"), Some(1));
        assert_eq!(mapping.header_index("Pemasukan"), None);
    }

    #[test]
    fn test_mapping_duplicate() {
        let err = Mapping::new(["Tanggal", "Tanggal"]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_mapping_blank_headers_are_positional() {
        let mapping = Mapping::new(["", "Tanggal", ""]).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.header_index("Tanggal"), Some(1));
        assert_eq!(mapping.header_index(""), None);
    }

    #[test]
    fn test_place_by_name() {
        // The header order differs from the field order and includes an unknown column.
        let mapping = Mapping::new(["Pengeluaran", "Catatan", "Tanggal", "Kategori"]).unwrap();
        let row = mapping.place([
            ("Tanggal", "2025-06-10"),
            ("Kategori", "food_dining"),
            ("Pengeluaran", "5000"),
            ("Pemasukan", ""),
        ]);
        assert_eq!(row, vec!["5000", "", "2025-06-10", "food_dining"]);
    }

    #[test]
    fn test_serde() {
        let mapping = Mapping::new(["A", "B"]).unwrap();
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"["A","B"]"#);
        let back: Mapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }
}
