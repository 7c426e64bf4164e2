/// Solar position (NOAA series) and daily solar events
use crate::domain::{HorizontalPosition, Observer, SunCondition, SunTimes, TimeZoneInfo};
use crate::utils::{
    add_minutes, ecliptic_to_equatorial, equatorial_to_horizontal, find_crossing, find_maximum,
    julian_century, julian_day, local_sidereal_time, normalize_degrees, obliquity, start_of_day,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Upper limb on the horizon, refraction included.
pub const SUNRISE_ALTITUDE: f64 = -0.833;
pub const CIVIL_TWILIGHT_ALTITUDE: f64 = -6.0;
pub const NAUTICAL_TWILIGHT_ALTITUDE: f64 = -12.0;
pub const ASTRONOMICAL_TWILIGHT_ALTITUDE: f64 = -18.0;
/// Below this the light counts as golden rather than full day.
pub const LOW_SUN_ALTITUDE: f64 = 6.0;

const SCAN_STEP_MINUTES: i64 = 10;

/// Geocentric apparent Sun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunEquatorial {
    pub right_ascension_deg: f64,
    pub declination_deg: f64,
    pub distance_au: f64,
    pub apparent_longitude_deg: f64,
}

pub fn classify_elevation(elevation_deg: f64) -> SunCondition {
    if elevation_deg >= LOW_SUN_ALTITUDE {
        SunCondition::Day
    } else if elevation_deg >= SUNRISE_ALTITUDE {
        SunCondition::Sunset
    } else if elevation_deg >= CIVIL_TWILIGHT_ALTITUDE {
        SunCondition::CivilTwilight
    } else if elevation_deg >= NAUTICAL_TWILIGHT_ALTITUDE {
        SunCondition::NauticalTwilight
    } else if elevation_deg >= ASTRONOMICAL_TWILIGHT_ALTITUDE {
        SunCondition::AstronomicalTwilight
    } else {
        SunCondition::Night
    }
}

fn mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032))
}

fn mean_anomaly(t: f64) -> f64 {
    357.52911 + t * (35999.05029 - t * 0.0001537)
}

fn eccentricity(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + t * 0.0000001267)
}

fn equation_of_center(t: f64) -> f64 {
    let m = mean_anomaly(t).to_radians();
    m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289
}

/// Equation of time in minutes
fn equation_of_time(t: f64) -> f64 {
    let eps = obliquity(t).to_radians();
    let l0 = mean_longitude(t).to_radians();
    let e = eccentricity(t);
    let m = mean_anomaly(t).to_radians();
    let y = (eps / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * e * m.sin() + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * e * e * (2.0 * m).sin();
    4.0 * eq.to_degrees()
}

/// Apparent geocentric equatorial position of the Sun.
pub fn sun_equatorial(instant: DateTime<Utc>) -> SunEquatorial {
    let t = julian_century(julian_day(instant));
    let center = equation_of_center(t);
    let true_longitude = mean_longitude(t) + center;
    let omega = 125.04 - 1934.136 * t;
    let apparent = normalize_degrees(true_longitude - 0.00569 - 0.00478 * omega.to_radians().sin());

    let e = eccentricity(t);
    let anomaly = (mean_anomaly(t) + center).to_radians();
    let distance_au = 1.000001018 * (1.0 - e * e) / (1.0 + e * anomaly.cos());

    let (ra, dec) = ecliptic_to_equatorial(apparent, 0.0, obliquity(t));
    SunEquatorial {
        right_ascension_deg: ra,
        declination_deg: dec,
        distance_au,
        apparent_longitude_deg: apparent,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolarPositionCalculator;

impl SolarPositionCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn position(&self, instant: DateTime<Utc>, observer: &Observer) -> HorizontalPosition {
        let sun = sun_equatorial(instant);
        let lst = local_sidereal_time(julian_day(instant), observer.longitude);
        let (azimuth_deg, altitude_deg) =
            equatorial_to_horizontal(sun.right_ascension_deg, sun.declination_deg, observer.latitude, lst);
        HorizontalPosition {
            azimuth_deg,
            altitude_deg,
        }
    }

    pub fn altitude(&self, instant: DateTime<Utc>, observer: &Observer) -> f64 {
        self.position(instant, observer).altitude_deg
    }

    /// Upper culmination on the local solar day of `date`.
    pub fn solar_noon(&self, date: NaiveDate, observer: &Observer) -> DateTime<Utc> {
        let midnight = start_of_day(date);
        let guess = add_minutes(midnight, 720.0 - 4.0 * observer.longitude);
        let eot = equation_of_time(julian_century(julian_day(guess)));
        let estimate = add_minutes(midnight, 720.0 - 4.0 * observer.longitude - eot);

        find_maximum(
            |t| self.altitude(t, observer),
            estimate - Duration::minutes(20),
            estimate + Duration::minutes(20),
            Duration::minutes(2),
        )
    }

    /// Lower culmination preceding solar noon.
    pub fn nadir(&self, date: NaiveDate, observer: &Observer) -> DateTime<Utc> {
        self.solar_noon(date, observer) - Duration::hours(12)
    }

    /// Rising crossing of `threshold` in the half day before `noon`
    fn morning_crossing(&self, noon: DateTime<Utc>, observer: &Observer, threshold: f64) -> Option<DateTime<Utc>> {
        find_crossing(
            |t| self.altitude(t, observer),
            noon - Duration::hours(12),
            noon,
            Duration::minutes(SCAN_STEP_MINUTES),
            threshold,
            true,
        )
    }

    /// Setting crossing of `threshold` in the half day after `noon`
    fn evening_crossing(&self, noon: DateTime<Utc>, observer: &Observer, threshold: f64) -> Option<DateTime<Utc>> {
        find_crossing(
            |t| self.altitude(t, observer),
            noon,
            noon + Duration::hours(12),
            Duration::minutes(SCAN_STEP_MINUTES),
            threshold,
            false,
        )
    }

    fn sunrise_altitude(observer: &Observer) -> f64 {
        SUNRISE_ALTITUDE - observer.horizon_dip_deg()
    }

    /// Sunrise and sunset around an already computed solar noon
    pub fn rise_and_set(
        &self,
        noon: DateTime<Utc>,
        observer: &Observer,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let horizon = Self::sunrise_altitude(observer);
        (
            self.morning_crossing(noon, observer, horizon),
            self.evening_crossing(noon, observer, horizon),
        )
    }

    pub fn sunrise(&self, date: NaiveDate, observer: &Observer) -> Option<DateTime<Utc>> {
        let noon = self.solar_noon(date, observer);
        self.morning_crossing(noon, observer, Self::sunrise_altitude(observer))
    }

    pub fn sunset(&self, date: NaiveDate, observer: &Observer) -> Option<DateTime<Utc>> {
        let noon = self.solar_noon(date, observer);
        self.evening_crossing(noon, observer, Self::sunrise_altitude(observer))
    }

    pub fn civil_dawn(&self, date: NaiveDate, observer: &Observer) -> Option<DateTime<Utc>> {
        self.morning_crossing(self.solar_noon(date, observer), observer, CIVIL_TWILIGHT_ALTITUDE)
    }

    pub fn civil_dusk(&self, date: NaiveDate, observer: &Observer) -> Option<DateTime<Utc>> {
        self.evening_crossing(self.solar_noon(date, observer), observer, CIVIL_TWILIGHT_ALTITUDE)
    }

    pub fn nautical_dawn(&self, date: NaiveDate, observer: &Observer) -> Option<DateTime<Utc>> {
        self.morning_crossing(self.solar_noon(date, observer), observer, NAUTICAL_TWILIGHT_ALTITUDE)
    }

    pub fn nautical_dusk(&self, date: NaiveDate, observer: &Observer) -> Option<DateTime<Utc>> {
        self.evening_crossing(self.solar_noon(date, observer), observer, NAUTICAL_TWILIGHT_ALTITUDE)
    }

    pub fn astronomical_dawn(&self, date: NaiveDate, observer: &Observer) -> Option<DateTime<Utc>> {
        self.morning_crossing(self.solar_noon(date, observer), observer, ASTRONOMICAL_TWILIGHT_ALTITUDE)
    }

    pub fn astronomical_dusk(&self, date: NaiveDate, observer: &Observer) -> Option<DateTime<Utc>> {
        self.evening_crossing(self.solar_noon(date, observer), observer, ASTRONOMICAL_TWILIGHT_ALTITUDE)
    }

    pub fn sun_condition(&self, instant: DateTime<Utc>, observer: &Observer) -> SunCondition {
        classify_elevation(self.altitude(instant, observer))
    }

    /// All daily events for `date`, as served by the sun-times query.
    pub fn sun_times(&self, date: NaiveDate, observer: &Observer, timezone: TimeZoneInfo) -> SunTimes {
        let solar_noon = self.solar_noon(date, observer);
        let (sunrise, sunset) = self.rise_and_set(solar_noon, observer);
        let day_length_minutes = match (sunrise, sunset) {
            (Some(rise), Some(set)) => Some((set - rise).num_seconds() as f64 / 60.0),
            _ => None,
        };

        SunTimes {
            date,
            timezone,
            sunrise,
            sunset,
            solar_noon,
            nadir: solar_noon - Duration::hours(12),
            civil_dawn: self.morning_crossing(solar_noon, observer, CIVIL_TWILIGHT_ALTITUDE),
            civil_dusk: self.evening_crossing(solar_noon, observer, CIVIL_TWILIGHT_ALTITUDE),
            nautical_dawn: self.morning_crossing(solar_noon, observer, NAUTICAL_TWILIGHT_ALTITUDE),
            nautical_dusk: self.evening_crossing(solar_noon, observer, NAUTICAL_TWILIGHT_ALTITUDE),
            astronomical_dawn: self.morning_crossing(solar_noon, observer, ASTRONOMICAL_TWILIGHT_ALTITUDE),
            astronomical_dusk: self.evening_crossing(solar_noon, observer, ASTRONOMICAL_TWILIGHT_ALTITUDE),
            noon_altitude_deg: self.altitude(solar_noon, observer),
            day_length_minutes,
        }
    }
}
