/// Golden and blue hour windows, fixed offsets from sunrise and sunset
use crate::domain::GoldenHourWindows;
use chrono::{DateTime, Duration, Utc};

const GOLDEN_HOUR_MINUTES: i64 = 60;
const BLUE_HOUR_MINUTES: i64 = 30;

pub fn golden_hour_windows(
    sunrise: Option<DateTime<Utc>>,
    sunset: Option<DateTime<Utc>>,
) -> GoldenHourWindows {
    let golden = Duration::minutes(GOLDEN_HOUR_MINUTES);
    let blue = Duration::minutes(BLUE_HOUR_MINUTES);
    GoldenHourWindows {
        golden_hour_morning_start: sunrise,
        golden_hour_morning_end: sunrise.map(|t| t + golden),
        golden_hour_evening_start: sunset.map(|t| t - golden),
        golden_hour_evening_end: sunset,
        blue_hour_start: sunset.map(|t| t + blue),
        blue_hour_end: sunrise.map(|t| t - blue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_offsets() {
        let sunrise = Utc.with_ymd_and_hms(2024, 6, 1, 4, 30, 0).unwrap();
        let sunset = Utc.with_ymd_and_hms(2024, 6, 1, 19, 45, 0).unwrap();
        let w = golden_hour_windows(Some(sunrise), Some(sunset));

        assert_eq!(w.golden_hour_morning_end, Some(Utc.with_ymd_and_hms(2024, 6, 1, 5, 30, 0).unwrap()));
        assert_eq!(w.golden_hour_evening_start, Some(Utc.with_ymd_and_hms(2024, 6, 1, 18, 45, 0).unwrap()));
        assert_eq!(w.blue_hour_start, Some(Utc.with_ymd_and_hms(2024, 6, 1, 20, 15, 0).unwrap()));
        assert_eq!(w.blue_hour_end, Some(Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap()));
    }

    #[test]
    fn test_missing_events_propagate() {
        let sunrise = Utc.with_ymd_and_hms(2024, 6, 1, 4, 30, 0).unwrap();
        let w = golden_hour_windows(Some(sunrise), None);
        assert!(w.golden_hour_morning_end.is_some());
        assert!(w.golden_hour_evening_start.is_none());
        assert!(w.blue_hour_start.is_none());
    }
}
