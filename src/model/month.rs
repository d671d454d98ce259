//! Month names. The stored data and reports are in Indonesian, but English names are accepted as
//! input too.

const ID_MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

const EN_MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// The Indonesian name of `month` (1-12), e.g. `Juni`. Out-of-range months yield an empty string.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => ID_MONTHS[(month - 1) as usize],
        _ => "",
    }
}

/// Parses a month name, Indonesian or English, case-insensitively, returning 1-12.
pub fn parse_month(s: &str) -> Option<u32> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }
    ID_MONTHS
        .iter()
        .position(|m| m.to_lowercase() == s)
        .or_else(|| EN_MONTHS.iter().position(|m| *m == s))
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), "Januari");
        assert_eq!(month_name(6), "Juni");
        assert_eq!(month_name(12), "Desember");
        assert_eq!(month_name(0), "");
        assert_eq!(month_name(13), "");
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("juni"), Some(6));
        assert_eq!(parse_month("  Agustus "), Some(8));
        assert_eq!(parse_month("AUGUST"), Some(8));
        assert_eq!(parse_month("mei"), Some(5));
        assert_eq!(parse_month("may"), Some(5));
        assert_eq!(parse_month(""), None);
        assert_eq!(parse_month("6"), None);
        assert_eq!(parse_month("smarch"), None);
    }
}
