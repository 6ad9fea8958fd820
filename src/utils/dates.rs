//! Date parsing for sheet cells and the target date
//!
//! Cells come in day-first regional format, occasionally month-first or ISO.

use chrono::NaiveDate;

/// Accepted formats, tried in order
const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%m/%d/%Y", "%Y-%m-%d"];

/// Parse a date cell under the accepted formats
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Parse a date, falling back to `fallback` (normally today) when nothing matches
///
/// Never fails.
pub fn parse_date_or(raw: &str, fallback: NaiveDate) -> NaiveDate {
    parse_date(raw).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_first_and_iso_agree() {
        assert_eq!(parse_date("31/12/2024"), Some(ymd(2024, 12, 31)));
        assert_eq!(parse_date("2024-12-31"), Some(ymd(2024, 12, 31)));
        assert_eq!(parse_date("31/12/2024"), parse_date("2024-12-31"));
    }

    #[test]
    fn test_unpadded_day_and_month() {
        assert_eq!(parse_date("1/6/2024"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_date(" 01/06/2024 "), Some(ymd(2024, 6, 1)));
    }

    #[test]
    fn test_day_first_wins_over_month_first() {
        // ambiguous cells are read day-first
        assert_eq!(parse_date("02/03/2024"), Some(ymd(2024, 3, 2)));
        // only month-first is valid here
        assert_eq!(parse_date("12/31/2024"), Some(ymd(2024, 12, 31)));
    }

    #[test]
    fn test_unparsable_falls_back() {
        let today = ymd(2026, 10, 19);
        assert_eq!(parse_date_or("", today), today);
        assert_eq!(parse_date_or("mañana", today), today);
        assert_eq!(parse_date_or("31/02/2024", today), today);
        assert_eq!(parse_date_or("2024-06-01", today), ymd(2024, 6, 1));
    }
}
