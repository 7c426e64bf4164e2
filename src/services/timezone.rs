/// Coordinate to timezone lookup: bounding-box table, then a longitude fallback
use crate::domain::{TimeZoneInfo, TimeZoneSource};
use crate::utils::add_minutes;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

struct ZoneBox {
    id: &'static str,
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
    utc_offset_hours: f64,
}

const fn zone(
    id: &'static str,
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
    utc_offset_hours: f64,
) -> ZoneBox {
    ZoneBox {
        id,
        lat_min,
        lat_max,
        lon_min,
        lon_max,
        utc_offset_hours,
    }
}

// First match wins, so smaller boxes precede the ones they overlap.
// Offsets are standard time.
const ZONES: &[ZoneBox] = &[
    zone("Pacific/Honolulu", 18.5, 22.5, -161.0, -154.0, -10.0),
    zone("America/Anchorage", 51.0, 71.5, -170.0, -130.0, -9.0),
    zone("America/Los_Angeles", 32.5, 49.0, -125.0, -114.0, -8.0),
    zone("America/Denver", 31.0, 49.0, -114.0, -104.0, -7.0),
    zone("America/Chicago", 25.8, 49.4, -104.0, -85.0, -6.0),
    zone("America/New_York", 24.5, 47.5, -85.0, -67.0, -5.0),
    zone("America/Sao_Paulo", -34.0, -5.0, -58.0, -34.8, -3.0),
    zone("Atlantic/Reykjavik", 63.2, 66.6, -24.6, -13.4, 0.0),
    zone("Europe/Dublin", 51.4, 55.4, -10.5, -6.0, 0.0),
    zone("Europe/London", 49.9, 60.9, -8.2, 1.8, 0.0),
    zone("Europe/Lisbon", 36.9, 42.15, -9.6, -7.4, 0.0),
    zone("Europe/Madrid", 36.0, 43.8, -9.3, 3.3, 1.0),
    zone("Europe/Paris", 42.3, 51.1, -5.2, 8.2, 1.0),
    zone("Europe/Berlin", 47.3, 55.1, 5.9, 15.0, 1.0),
    zone("Europe/Rome", 36.6, 47.1, 6.6, 18.5, 1.0),
    // Finland in two boxes so St Petersburg and Vyborg stay on Moscow time
    zone("Europe/Helsinki", 59.7, 61.0, 21.0, 27.8, 2.0),
    zone("Europe/Helsinki", 61.0, 70.1, 21.0, 30.5, 2.0),
    zone("Europe/Tallinn", 57.5, 59.7, 21.7, 27.8, 2.0),
    zone("Europe/Moscow", 57.9, 61.0, 27.8, 33.0, 3.0),
    zone("Europe/Oslo", 57.9, 71.2, 4.6, 31.1, 1.0),
    zone("Europe/Kyiv", 44.4, 50.5, 22.1, 36.5, 2.0),
    zone("Europe/Kyiv", 50.5, 51.5, 24.1, 36.5, 2.0),
    zone("Africa/Johannesburg", -35.0, -22.0, 16.4, 33.0, 2.0),
    zone("Europe/Moscow", 41.0, 70.0, 27.0, 60.0, 3.0),
    zone("Asia/Dubai", 22.6, 26.1, 51.5, 56.4, 4.0),
    zone("Asia/Kolkata", 6.5, 35.5, 68.0, 97.4, 5.5),
    zone("Asia/Tokyo", 24.0, 45.6, 122.9, 146.0, 9.0),
    zone("Asia/Shanghai", 18.0, 53.6, 73.5, 134.8, 8.0),
    zone("Australia/Perth", -35.2, -13.7, 112.9, 129.0, 8.0),
    zone("Australia/Sydney", -37.5, -28.0, 141.0, 154.0, 10.0),
    zone("Pacific/Auckland", -47.3, -34.4, 166.0, 178.6, 12.0),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeZoneResolver;

impl TimeZoneResolver {
    pub fn new() -> Self {
        Self
    }

    /// Zone id and standard UTC offset for a coordinate
    pub fn resolve(&self, latitude: f64, longitude: f64) -> TimeZoneInfo {
        ZONES
            .iter()
            .find(|z| {
                (z.lat_min..=z.lat_max).contains(&latitude)
                    && (z.lon_min..=z.lon_max).contains(&longitude)
            })
            .map(|z| TimeZoneInfo {
                id: z.id.to_string(),
                utc_offset_hours: z.utc_offset_hours,
                source: TimeZoneSource::Table,
            })
            .unwrap_or_else(|| Self::longitude_fallback(longitude))
    }

    /// UTC instant of a wall-clock time in `zone`, daylight saving included.
    /// Ids unknown to the tz database, and local times skipped by a DST jump,
    /// fall back to the standard offset.
    pub fn local_to_utc(&self, zone: &TimeZoneInfo, local: NaiveDateTime) -> DateTime<Utc> {
        let standard = || add_minutes(Utc.from_utc_datetime(&local), -zone.utc_offset_hours * 60.0);
        match zone.id.parse::<Tz>() {
            Ok(tz) => tz
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(standard),
            Err(_) => standard(),
        }
    }

    fn longitude_fallback(longitude: f64) -> TimeZoneInfo {
        let offset = (longitude / 15.0).round().clamp(-12.0, 14.0);
        // Etc/GMT ids carry the inverted sign: UTC-5 is Etc/GMT+5
        let id = if offset == 0.0 {
            "Etc/UTC".to_string()
        } else if offset > 0.0 {
            format!("Etc/GMT-{}", offset as i32)
        } else {
            format!("Etc/GMT+{}", (-offset) as i32)
        };
        TimeZoneInfo {
            id,
            utc_offset_hours: offset,
            source: TimeZoneSource::LongitudeFallback,
        }
    }
}
