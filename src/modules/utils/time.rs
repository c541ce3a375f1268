use chrono::{DateTime, Utc};
use std::time::Duration;

/// Function to format a timestamp as a readable UTC date
pub fn format_datetime(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format an elapsed duration, millisecond precision below one minute
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1_000 {
        format!("{} ms", millis)
    } else if millis < 60_000 {
        format!("{:.2} s", elapsed.as_secs_f64())
    } else {
        format!("{} minutes", elapsed.as_secs() / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_formatting() {
        let timestamp = Utc.timestamp_opt(1609459200, 0).unwrap(); // 2021-01-01 00:00:00
        assert_eq!(format_datetime(&timestamp), "2021-01-01 00:00:00 UTC");
    }

    #[test]
    fn test_elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::from_millis(85)), "85 ms");
        assert_eq!(format_elapsed(Duration::from_millis(1_500)), "1.50 s");
        assert_eq!(format_elapsed(Duration::from_secs(180)), "3 minutes");
    }
}
