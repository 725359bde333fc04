//! Date formatting shared by file naming and sheet writeback.

use chrono::{DateTime, Utc};

/// Day stamp used in output object paths (`20230419`).
pub fn date_stamp(now: &DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

/// Timestamp written to the last-update column (`2023/04/19, 13:05:09`).
pub fn sheet_timestamp(now: &DateTime<Utc>) -> String {
    now.format("%Y/%m/%d, %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_stamp() {
        let now = Utc.with_ymd_and_hms(2023, 4, 19, 13, 5, 9).unwrap();
        assert_eq!(date_stamp(&now), "20230419");
    }

    #[test]
    fn test_sheet_timestamp() {
        let now = Utc.with_ymd_and_hms(2023, 4, 9, 3, 5, 9).unwrap();
        assert_eq!(sheet_timestamp(&now), "2023/04/09, 03:05:09");
    }
}
