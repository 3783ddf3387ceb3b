use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::{Error, Result};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// `[first day of month, first day of next month)` in UTC. `month` is 1-based.
pub fn month_window(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::BadRequest(format!("Invalid month: {}-{}", year, month)))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| Error::BadRequest(format!("Invalid month: {}-{}", year, month)))?;
    Ok((midnight(start), midnight(end)))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn december_window_rolls_into_next_year() {
        let (start, end) = month_window(2024, 12).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn out_of_range_month_is_rejected() {
        assert_eq!(month_window(2024, 0).unwrap_err().kind(), "bad_request");
        assert_eq!(month_window(2024, 13).unwrap_err().kind(), "bad_request");
    }
}
