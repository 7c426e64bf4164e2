/// Shadow geometry and sampled sun path for a day
use crate::domain::{
    Observer, ShadowCalculation, ShadowPoint, SunPathData, SunPathMetrics, SunPathPoint, TerrainType,
};
use crate::errors::{ApiResult, AstroError};
use crate::services::solar::{classify_elevation, SolarPositionCalculator, LOW_SUN_ALTITUDE};
use crate::utils::start_of_day;
use chrono::{DateTime, Duration, NaiveDate, Utc};

pub const MAX_INTERVAL_MINUTES: u32 = 180;

/// Shadow length and bearing for a sun at `elevation_deg`; `None` once the
/// sun is at or below the horizon.
pub fn shadow_geometry(
    object_height_m: f64,
    elevation_deg: f64,
    azimuth_deg: f64,
    terrain: TerrainType,
) -> (Option<f64>, Option<f64>) {
    if elevation_deg <= 0.0 {
        return (None, None);
    }
    let length = object_height_m / elevation_deg.to_radians().tan() * terrain.shadow_multiplier();
    let direction = (azimuth_deg + 180.0).rem_euclid(360.0);
    (Some(length), Some(direction))
}

pub struct ShadowCalculator {
    solar: SolarPositionCalculator,
}

impl ShadowCalculator {
    pub fn new(solar: SolarPositionCalculator) -> Self {
        Self { solar }
    }

    pub fn shadow(
        &self,
        instant: DateTime<Utc>,
        observer: &Observer,
        object_height_m: f64,
        terrain: TerrainType,
    ) -> ApiResult<ShadowCalculation> {
        if !(object_height_m.is_finite() && object_height_m > 0.0) {
            return Err(AstroError::InvalidInput(format!(
                "object height must be positive, got {}",
                object_height_m
            )));
        }

        let sun = self.solar.position(instant, observer);
        let (shadow_length_m, shadow_direction_deg) =
            shadow_geometry(object_height_m, sun.altitude_deg, sun.azimuth_deg, terrain);

        let midnight = start_of_day(instant.date_naive());
        let progression = (0..24)
            .map(|hour| {
                let time = midnight + Duration::hours(hour);
                let pos = self.solar.position(time, observer);
                let (length, direction) = shadow_geometry(object_height_m, pos.altitude_deg, pos.azimuth_deg, terrain);
                ShadowPoint {
                    time,
                    sun_elevation_deg: pos.altitude_deg,
                    sun_azimuth_deg: pos.azimuth_deg,
                    shadow_length_m: length,
                    shadow_direction_deg: direction,
                }
            })
            .collect();

        Ok(ShadowCalculation {
            instant,
            object_height_m,
            terrain,
            sun_elevation_deg: sun.altitude_deg,
            sun_azimuth_deg: sun.azimuth_deg,
            sun_condition: classify_elevation(sun.altitude_deg),
            shadow_length_m,
            shadow_direction_deg,
            progression,
        })
    }

    /// Sun positions every `interval_minutes` across the UTC day plus summary
    /// metrics.
    pub fn sun_path(&self, date: NaiveDate, observer: &Observer, interval_minutes: u32) -> ApiResult<SunPathData> {
        if !(1..=MAX_INTERVAL_MINUTES).contains(&interval_minutes) {
            return Err(AstroError::InvalidInput(format!(
                "interval must be 1-{} minutes, got {}",
                MAX_INTERVAL_MINUTES, interval_minutes
            )));
        }

        let midnight = start_of_day(date);
        let step = i64::from(interval_minutes);
        let points: Vec<SunPathPoint> = (0..)
            .map(|i| midnight + Duration::minutes(i * step))
            .take_while(|t| *t < midnight + Duration::days(1))
            .map(|time| {
                let pos = self.solar.position(time, observer);
                SunPathPoint {
                    time,
                    azimuth_deg: pos.azimuth_deg,
                    altitude_deg: pos.altitude_deg,
                }
            })
            .collect();

        let interval = f64::from(interval_minutes);
        let minutes_above_horizon = points.iter().filter(|p| p.altitude_deg > 0.0).count() as f64 * interval;
        let golden_hour_minutes = points
            .iter()
            .filter(|p| p.altitude_deg > 0.0 && p.altitude_deg <= LOW_SUN_ALTITUDE)
            .count() as f64
            * interval;

        let noon = self.solar.solar_noon(date, observer);
        let (sunrise, sunset) = self.solar.rise_and_set(noon, observer);
        let day_length_minutes = match (sunrise, sunset) {
            (Some(rise), Some(set)) => Some((set - rise).num_seconds() as f64 / 60.0),
            _ => None,
        };

        let metrics = SunPathMetrics {
            max_altitude_deg: self.solar.altitude(noon, observer),
            max_altitude_time: noon,
            sunrise_azimuth_deg: sunrise.map(|t| self.solar.position(t, observer).azimuth_deg),
            sunset_azimuth_deg: sunset.map(|t| self.solar.position(t, observer).azimuth_deg),
            day_length_minutes,
            minutes_above_horizon,
            golden_hour_minutes,
        };

        Ok(SunPathData {
            date,
            interval_minutes,
            points,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_shadow_at_45_degrees_equals_height() {
        let (length, direction) = shadow_geometry(2.0, 45.0, 135.0, TerrainType::Flat);
        assert!((length.unwrap() - 2.0).abs() < 1e-9);
        assert!((direction.unwrap() - 315.0).abs() < 1e-9);

        let (forest, _) = shadow_geometry(2.0, 45.0, 135.0, TerrainType::Forest);
        assert!((forest.unwrap() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_no_shadow_when_sun_is_down() {
        assert_eq!(shadow_geometry(2.0, 0.0, 90.0, TerrainType::Flat), (None, None));
        assert_eq!(shadow_geometry(2.0, -10.0, 90.0, TerrainType::Beach), (None, None));
    }

    #[test]
    fn test_shadow_direction_wraps() {
        let (_, direction) = shadow_geometry(1.0, 30.0, 270.0, TerrainType::Urban);
        assert!((direction.unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_shadow_progression_has_24_hourly_points() {
        let calc = ShadowCalculator::new(SolarPositionCalculator::new());
        let obs = Observer::at(48.8566, 2.3522).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        let result = calc.shadow(at, &obs, 10.0, TerrainType::Flat).unwrap();
        assert_eq!(result.progression.len(), 24);
        assert!(result.shadow_length_m.unwrap() < 10.0);
        assert!(result.progression[0].shadow_length_m.is_none());
        assert!(calc.shadow(at, &obs, 0.0, TerrainType::Flat).is_err());
    }

    #[test]
    fn test_sun_path_interval_validation() {
        let calc = ShadowCalculator::new(SolarPositionCalculator::new());
        let obs = Observer::at(40.0, -3.7).unwrap();
        let d = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        assert!(calc.sun_path(d, &obs, 0).is_err());
        assert!(calc.sun_path(d, &obs, 181).is_err());

        let path = calc.sun_path(d, &obs, 30).unwrap();
        assert_eq!(path.points.len(), 48);
        let max_sampled = path.points.iter().map(|p| p.altitude_deg).fold(f64::MIN, f64::max);
        assert!(path.metrics.max_altitude_deg + 1e-6 >= max_sampled);
        assert!(path.metrics.golden_hour_minutes <= path.metrics.minutes_above_horizon);
        let day = path.metrics.day_length_minutes.unwrap();
        assert!((path.metrics.minutes_above_horizon - day).abs() < 60.0);
        assert!(path.metrics.sunrise_azimuth_deg.unwrap() < 180.0);
        assert!(path.metrics.sunset_azimuth_deg.unwrap() > 180.0);
    }
}
