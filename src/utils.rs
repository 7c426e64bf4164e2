/// Shared spherical astronomy and time helpers
use crate::errors::{ApiResult, AstroError};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Julian Day of the Unix epoch.
const JD_UNIX_EPOCH: f64 = 2_440_587.5;
const JD_J2000: f64 = 2_451_545.0;

/// TT - UT, seconds. Constant is adequate for photographic planning.
pub const DELTA_T_SECONDS: f64 = 69.2;

/// Julian Day (UT) of an instant
pub fn julian_day(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / 86_400_000.0 + JD_UNIX_EPOCH
}

/// Julian Ephemeris Day (TT) of an instant
pub fn julian_ephemeris_day(instant: DateTime<Utc>) -> f64 {
    julian_day(instant) + DELTA_T_SECONDS / 86_400.0
}

/// Julian centuries since J2000.0
pub fn julian_century(jd: f64) -> f64 {
    (jd - JD_J2000) / 36_525.0
}

/// Normalize an angle to [0, 360)
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negatives
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Mean obliquity of the ecliptic with the principal nutation term, degrees
pub fn obliquity(t: f64) -> f64 {
    let mean = 23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0;
    let omega = 125.04 - 1934.136 * t;
    mean + 0.00256 * omega.to_radians().cos()
}

/// Ecliptic (lon, lat) to equatorial (RA, Dec), all in degrees
pub fn ecliptic_to_equatorial(lon: f64, lat: f64, obliquity_deg: f64) -> (f64, f64) {
    let (lon_r, lat_r, eps) = (
        lon.to_radians(),
        lat.to_radians(),
        obliquity_deg.to_radians(),
    );
    let ra = (lon_r.sin() * eps.cos() - lat_r.tan() * eps.sin()).atan2(lon_r.cos());
    let dec = (lat_r.sin() * eps.cos() + lat_r.cos() * eps.sin() * lon_r.sin())
        .clamp(-1.0, 1.0)
        .asin();
    (normalize_degrees(ra.to_degrees()), dec.to_degrees())
}

/// Greenwich mean sidereal time in degrees (Meeus 12.4)
pub fn greenwich_sidereal_time(jd: f64) -> f64 {
    let t = julian_century(jd);
    normalize_degrees(
        280.460_618_37 + 360.985_647_366_29 * (jd - JD_J2000) + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Local sidereal time in degrees, longitude east positive
pub fn local_sidereal_time(jd: f64, longitude: f64) -> f64 {
    normalize_degrees(greenwich_sidereal_time(jd) + longitude)
}

/// Equatorial (RA, Dec) to horizontal (azimuth from north, altitude), degrees
pub fn equatorial_to_horizontal(ra: f64, dec: f64, latitude: f64, lst: f64) -> (f64, f64) {
    let ha = (lst - ra).to_radians();
    let dec_r = dec.to_radians();
    let lat_r = latitude.to_radians();

    let sin_alt = (lat_r.sin() * dec_r.sin() + lat_r.cos() * dec_r.cos() * ha.cos()).clamp(-1.0, 1.0);
    let altitude = sin_alt.asin().to_degrees();

    // Measured from south by the atan2 form, shifted to north-based bearing
    let az_south = ha.sin().atan2(ha.cos() * lat_r.sin() - dec_r.tan() * lat_r.cos());
    let azimuth = normalize_degrees(az_south.to_degrees() + 180.0);

    (azimuth, altitude)
}

/// Years the series and the fixed ΔT stay accurate to about a minute
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

pub fn validate_date(date: NaiveDate) -> ApiResult<NaiveDate> {
    if !SUPPORTED_YEARS.contains(&date.year()) {
        return Err(AstroError::InvalidInput(format!(
            "date {} outside supported years {}-{}",
            date,
            SUPPORTED_YEARS.start(),
            SUPPORTED_YEARS.end()
        )));
    }
    Ok(date)
}

pub fn validate_instant(instant: DateTime<Utc>) -> ApiResult<DateTime<Utc>> {
    validate_date(instant.date_naive())?;
    Ok(instant)
}

/// Midnight UTC at the start of a calendar date
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Offset an instant by fractional minutes, millisecond resolution
pub fn add_minutes(instant: DateTime<Utc>, minutes: f64) -> DateTime<Utc> {
    instant + Duration::milliseconds((minutes * 60_000.0).round() as i64)
}

/// Find the first instant in `[start, end]` where `f` crosses `threshold`
/// in the given direction.
///
/// The window is scanned every `step` and the bracketing interval refined by
/// bisection to sub-second precision. Returns `None` when no crossing exists
/// (body always above or always below the threshold).
pub fn find_crossing<F>(
    f: F,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    threshold: f64,
    rising: bool,
) -> Option<DateTime<Utc>>
where
    F: Fn(DateTime<Utc>) -> f64,
{
    let crosses = |a: f64, b: f64| {
        if rising {
            a < threshold && b >= threshold
        } else {
            a >= threshold && b < threshold
        }
    };

    let mut t0 = start;
    let mut v0 = f(t0);
    while t0 < end {
        let t1 = (t0 + step).min(end);
        let v1 = f(t1);
        if crosses(v0, v1) {
            return Some(bisect(&f, t0, t1, threshold, rising));
        }
        t0 = t1;
        v0 = v1;
    }
    None
}

fn bisect<F>(f: &F, mut lo: DateTime<Utc>, mut hi: DateTime<Utc>, threshold: f64, rising: bool) -> DateTime<Utc>
where
    F: Fn(DateTime<Utc>) -> f64,
{
    while hi - lo > Duration::milliseconds(500) {
        let mid = lo + (hi - lo) / 2;
        let above = f(mid) >= threshold;
        if above == rising {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo + (hi - lo) / 2
}

/// Instant of maximum `f` in `[start, end]`: coarse scan, then golden-section
/// refinement around the best sample.
pub fn find_maximum<F>(f: F, start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> DateTime<Utc>
where
    F: Fn(DateTime<Utc>) -> f64,
{
    let mut best = start;
    let mut best_value = f(start);
    let mut t = start;
    while t < end {
        t = (t + step).min(end);
        let v = f(t);
        if v > best_value {
            best = t;
            best_value = v;
        }
    }

    let mut lo = (best - step).max(start);
    let mut hi = (best + step).min(end);
    const INV_PHI: f64 = 0.618_033_988_749_895;
    while hi - lo > Duration::milliseconds(200) {
        let span_ms = (hi - lo).num_milliseconds() as f64;
        let m1 = hi - Duration::milliseconds((span_ms * INV_PHI) as i64);
        let m2 = lo + Duration::milliseconds((span_ms * INV_PHI) as i64);
        if f(m1) < f(m2) {
            lo = m1;
        } else {
            hi = m2;
        }
    }
    lo + (hi - lo) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_window() {
        let date = |y| NaiveDate::from_ymd_opt(y, 6, 1).unwrap();
        assert!(validate_date(date(1900)).is_ok());
        assert!(validate_date(date(2100)).is_ok());
        assert!(matches!(validate_date(date(1899)), Err(AstroError::InvalidInput(_))));
        assert!(validate_date(date(262_142)).is_err());
        assert!(validate_instant(Utc.with_ymd_and_hms(-500, 1, 1, 0, 0, 0).unwrap()).is_err());
        assert!(validate_instant(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()).is_ok());
    }

    #[test]
    fn test_julian_day_j2000() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_day(j2000) - 2_451_545.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert!(normalize_degrees(-1e-15) < 360.0);
    }

    #[test]
    fn test_gmst_meeus_example() {
        // Meeus example 12.a: 1987 April 10, 0h UT -> 13h10m46.3668s
        let jd = 2_446_895.5;
        let expected = (13.0 + 10.0 / 60.0 + 46.3668 / 3600.0) * 15.0;
        assert!((greenwich_sidereal_time(jd) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_zenith_object_has_altitude_90() {
        let (_, alt) = equatorial_to_horizontal(100.0, 45.0, 45.0, 100.0);
        assert!((alt - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_meridian_object_south_is_azimuth_180() {
        let (az, alt) = equatorial_to_horizontal(50.0, 0.0, 40.0, 50.0);
        assert!((az - 180.0).abs() < 1e-9);
        assert!((alt - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_east_hour_angle_gives_eastern_azimuth() {
        // Six hours before transit an equatorial object sits due east
        let (az, alt) = equatorial_to_horizontal(90.0, 0.0, 40.0, 0.0);
        assert!((az - 90.0).abs() < 1e-6);
        assert!(alt.abs() < 1e-6);
    }

    #[test]
    fn test_find_crossing_linear() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::hours(10);
        let f = |t: DateTime<Utc>| (t - start).num_seconds() as f64 / 3600.0;
        let hit = find_crossing(f, start, end, Duration::minutes(10), 3.25, true).unwrap();
        assert!((hit - (start + Duration::minutes(195))).num_seconds().abs() <= 1);
        assert!(find_crossing(f, start, end, Duration::minutes(10), 3.25, false).is_none());
        assert!(find_crossing(f, start, end, Duration::minutes(10), 42.0, true).is_none());
    }

    #[test]
    fn test_find_maximum_parabola() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let peak = start + Duration::minutes(437);
        let f = |t: DateTime<Utc>| {
            let x = (t - peak).num_milliseconds() as f64 / 60_000.0;
            -x * x
        };
        let found = find_maximum(f, start, start + Duration::hours(12), Duration::minutes(10));
        assert!((found - peak).num_seconds().abs() <= 1);
    }
}
