/// Domain models for the calculation core
use crate::errors::{ApiResult, AstroError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod equipment;
pub mod reports;

pub use equipment::*;
pub use reports::*;

const MEAN_EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Observer location on Earth (WGS84 decimal degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observer {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_meters: f64,
}

impl Observer {
    pub fn new(latitude: f64, longitude: f64, elevation_meters: f64) -> ApiResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AstroError::InvalidInput(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AstroError::InvalidInput(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }
        if !elevation_meters.is_finite() || elevation_meters < 0.0 {
            return Err(AstroError::InvalidInput(format!(
                "elevation {} must be >= 0",
                elevation_meters
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            elevation_meters,
        })
    }

    /// Sea-level observer, the common case for query handlers.
    pub fn at(latitude: f64, longitude: f64) -> ApiResult<Self> {
        Self::new(latitude, longitude, 0.0)
    }

    /// Depression of the sea horizon seen from `elevation_meters`, degrees.
    /// Rise and set thresholds are lowered by this much.
    pub fn horizon_dip_deg(&self) -> f64 {
        (MEAN_EARTH_RADIUS_M / (MEAN_EARTH_RADIUS_M + self.elevation_meters))
            .acos()
            .to_degrees()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizontalPosition {
    /// Compass bearing, 0 = North, clockwise, [0, 360)
    pub azimuth_deg: f64,
    /// Elevation above the horizon, [-90, 90]
    pub altitude_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquatorialPosition {
    pub right_ascension_hours: f64,
    pub declination_deg: f64,
    pub distance_au: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IlluminationInfo {
    pub magnitude: f64,
    pub phase_fraction: f64,
    pub phase_angle_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RiseSetTransit {
    pub rise: Option<DateTime<Utc>>,
    pub set: Option<DateTime<Utc>>,
    pub transit: Option<DateTime<Utc>>,
}

/// Which horizon crossing a rise/set search looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingDirection {
    Rising,
    Setting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Planet {
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl Planet {
    pub const ALL: [Planet; 8] = [
        Planet::Mercury,
        Planet::Venus,
        Planet::Earth,
        Planet::Mars,
        Planet::Jupiter,
        Planet::Saturn,
        Planet::Uranus,
        Planet::Neptune,
    ];

    /// Naked-eye planets worth ranking as evening events.
    pub const BRIGHT: [Planet; 4] = [Planet::Venus, Planet::Mars, Planet::Jupiter, Planet::Saturn];

    pub fn name(self) -> &'static str {
        match self {
            Planet::Mercury => "Mercury",
            Planet::Venus => "Venus",
            Planet::Earth => "Earth",
            Planet::Mars => "Mars",
            Planet::Jupiter => "Jupiter",
            Planet::Saturn => "Saturn",
            Planet::Uranus => "Uranus",
            Planet::Neptune => "Neptune",
        }
    }

    /// Mean apparent equatorial diameter at 1 AU, arcseconds.
    pub fn reference_angular_diameter_arcsec(self) -> f64 {
        match self {
            Planet::Mercury => 6.74,
            Planet::Venus => 16.92,
            Planet::Earth => 17.59,
            Planet::Mars => 9.36,
            Planet::Jupiter => 196.94,
            Planet::Saturn => 165.60,
            Planet::Uranus => 70.48,
            Planet::Neptune => 68.30,
        }
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sky state classified by solar elevation, brightest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SunCondition {
    Day,
    Sunset,
    CivilTwilight,
    NauticalTwilight,
    AstronomicalTwilight,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    ThirdQuarter,
    WaningCrescent,
}

impl MoonPhase {
    pub const ORDERED: [MoonPhase; 8] = [
        MoonPhase::NewMoon,
        MoonPhase::WaxingCrescent,
        MoonPhase::FirstQuarter,
        MoonPhase::WaxingGibbous,
        MoonPhase::FullMoon,
        MoonPhase::WaningGibbous,
        MoonPhase::ThirdQuarter,
        MoonPhase::WaningCrescent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::ThirdQuarter => "Third Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    Flat,
    Urban,
    Forest,
    Mountain,
    Beach,
}

impl TerrainType {
    pub fn shadow_multiplier(self) -> f64 {
        match self {
            TerrainType::Flat => 1.0,
            TerrainType::Urban => 0.8,
            TerrainType::Forest => 0.6,
            TerrainType::Mountain => 1.2,
            TerrainType::Beach => 1.1,
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_rejects_out_of_range() {
        assert!(Observer::at(91.0, 0.0).is_err());
        assert!(Observer::at(0.0, -180.5).is_err());
        assert!(Observer::new(0.0, 0.0, -1.0).is_err());
        assert!(Observer::at(f64::NAN, 0.0).is_err());
        assert!(Observer::at(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_horizon_dip_grows_with_elevation() {
        assert_eq!(Observer::at(45.0, 7.0).unwrap().horizon_dip_deg(), 0.0);
        let hill = Observer::new(45.0, 7.0, 1000.0).unwrap().horizon_dip_deg();
        assert!((hill - 1.015).abs() < 0.01, "dip {}", hill);
    }

    #[test]
    fn test_terrain_multipliers() {
        assert_eq!(TerrainType::Flat.shadow_multiplier(), 1.0);
        assert_eq!(TerrainType::Forest.shadow_multiplier(), 0.6);
        assert_eq!(TerrainType::Mountain.shadow_multiplier(), 1.2);
    }

    #[test]
    fn test_planet_parses_from_snake_case() {
        let planet: Planet = serde_json::from_value(serde_json::json!("jupiter")).unwrap();
        assert_eq!(planet, Planet::Jupiter);
    }
}
