use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

const REGULAR_OPEN_MINUTES: u32 = 9 * 60 + 30;
const REGULAR_CLOSE_MINUTES: u32 = 16 * 60;

/// Whether US equities are in regular trading hours (Mon-Fri, 09:30-16:00 Eastern).
///
/// Exchange holidays are not accounted for.
pub fn is_market_open(at: DateTime<Utc>) -> bool {
    let now = at.with_timezone(&chrono_tz::US::Eastern);

    // Skip weekends
    if now.weekday() == Weekday::Sat || now.weekday() == Weekday::Sun {
        return false;
    }

    let time_minutes = now.hour() * 60 + now.minute();
    (REGULAR_OPEN_MINUTES..REGULAR_CLOSE_MINUTES).contains(&time_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_open_during_regular_hours() {
        // Wednesday 10:00 EDT
        assert!(is_market_open(utc(2024, 6, 5, 14, 0)));
        // Wednesday 15:30 EST
        assert!(is_market_open(utc(2024, 1, 10, 20, 30)));
    }

    #[test]
    fn test_closed_outside_regular_hours() {
        // Wednesday 09:00 EDT, before the bell
        assert!(!is_market_open(utc(2024, 6, 5, 13, 0)));
        // Wednesday 16:00 EST, at the close
        assert!(!is_market_open(utc(2024, 1, 10, 21, 0)));
    }

    #[test]
    fn test_closed_on_weekend() {
        // Saturday 12:00 EDT
        assert!(!is_market_open(utc(2024, 6, 8, 16, 0)));
    }
}
