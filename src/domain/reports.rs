/// Result shapes returned by the query operations
use super::{
    EquatorialPosition, HorizontalPosition, IlluminationInfo, MoonPhase, Planet, RiseSetTransit,
    SunCondition, TerrainType,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeZoneSource {
    Table,
    LongitudeFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeZoneInfo {
    pub id: String,
    pub utc_offset_hours: f64,
    pub source: TimeZoneSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunTimes {
    pub date: NaiveDate,
    pub timezone: TimeZoneInfo,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub solar_noon: DateTime<Utc>,
    pub nadir: DateTime<Utc>,
    pub civil_dawn: Option<DateTime<Utc>>,
    pub civil_dusk: Option<DateTime<Utc>>,
    pub nautical_dawn: Option<DateTime<Utc>>,
    pub nautical_dusk: Option<DateTime<Utc>>,
    pub astronomical_dawn: Option<DateTime<Utc>>,
    pub astronomical_dusk: Option<DateTime<Utc>>,
    pub noon_altitude_deg: f64,
    pub day_length_minutes: Option<f64>,
}

/// Golden/blue hour bounds derived from sunrise and sunset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GoldenHourWindows {
    pub golden_hour_morning_start: Option<DateTime<Utc>>,
    pub golden_hour_morning_end: Option<DateTime<Utc>>,
    pub golden_hour_evening_start: Option<DateTime<Utc>>,
    pub golden_hour_evening_end: Option<DateTime<Utc>>,
    pub blue_hour_start: Option<DateTime<Utc>>,
    pub blue_hour_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedSunTimes {
    #[serde(flatten)]
    pub times: SunTimes,
    #[serde(flatten)]
    pub windows: GoldenHourWindows,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Libration {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoonPhotography {
    pub optimal_shooting_phase: &'static str,
    pub visible_features: Vec<&'static str>,
    pub exposure_guidance: &'static str,
    pub brightness: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoonData {
    pub instant: DateTime<Utc>,
    pub phase: MoonPhase,
    pub phase_name: &'static str,
    pub phase_angle_deg: f64,
    pub illuminated_fraction: f64,
    pub illumination_percent: f64,
    pub position: HorizontalPosition,
    pub equatorial: EquatorialPosition,
    pub distance_km: f64,
    pub angular_diameter_arcmin: f64,
    pub is_supermoon: bool,
    pub magnitude: f64,
    pub rise_set: RiseSetTransit,
    pub libration: Libration,
    pub photography: MoonPhotography,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetPositionData {
    pub planet: Planet,
    pub instant: DateTime<Utc>,
    pub equatorial: EquatorialPosition,
    pub horizontal: HorizontalPosition,
    pub illumination: IlluminationInfo,
    pub angular_diameter_arcsec: f64,
    pub rise_set: RiseSetTransit,
    pub is_visible: bool,
    pub photography_note: String,
    pub equipment_note: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisiblePlanets {
    pub instant: DateTime<Utc>,
    pub planets: Vec<PlanetPositionData>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AstroEventKind {
    Moon,
    Planet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstroEvent {
    pub name: String,
    pub kind: AstroEventKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub peak_time: Option<DateTime<Utc>>,
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
    pub magnitude: f64,
    pub is_visible: bool,
    pub visibility_score: f64,
    pub description: String,
}

impl AstroEvent {
    /// Peak time when known, else the middle of the event window.
    pub fn optimal_time(&self) -> DateTime<Utc> {
        self.peak_time
            .unwrap_or_else(|| self.start_time + (self.end_time - self.start_time) / 2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRanking {
    pub date: NaiveDate,
    pub evening_instant: DateTime<Utc>,
    pub events: Vec<AstroEvent>,
    /// Bodies that could not be computed, as `PARTIAL_RESULT` messages.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShadowPoint {
    pub time: DateTime<Utc>,
    pub sun_elevation_deg: f64,
    pub sun_azimuth_deg: f64,
    pub shadow_length_m: Option<f64>,
    pub shadow_direction_deg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShadowCalculation {
    pub instant: DateTime<Utc>,
    pub object_height_m: f64,
    pub terrain: TerrainType,
    pub sun_elevation_deg: f64,
    pub sun_azimuth_deg: f64,
    pub sun_condition: SunCondition,
    pub shadow_length_m: Option<f64>,
    pub shadow_direction_deg: Option<f64>,
    pub progression: Vec<ShadowPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunPathPoint {
    pub time: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub altitude_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunPathMetrics {
    pub max_altitude_deg: f64,
    pub max_altitude_time: DateTime<Utc>,
    pub sunrise_azimuth_deg: Option<f64>,
    pub sunset_azimuth_deg: Option<f64>,
    pub day_length_minutes: Option<f64>,
    pub minutes_above_horizon: f64,
    pub golden_hour_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunPathData {
    pub date: NaiveDate,
    pub interval_minutes: u32,
    pub points: Vec<SunPathPoint>,
    pub metrics: SunPathMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtmosphericCorrection {
    pub apparent_altitude_deg: f64,
    pub true_altitude_deg: f64,
    pub refraction_arcmin: f64,
    pub airmass: Option<f64>,
    pub extinction_mag: f64,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(start_h: u32, end_h: u32, peak_h: Option<u32>) -> AstroEvent {
        let at = |h| Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap();
        AstroEvent {
            name: "Jupiter".into(),
            kind: AstroEventKind::Planet,
            start_time: at(start_h),
            end_time: at(end_h),
            peak_time: peak_h.map(at),
            altitude_deg: 40.0,
            azimuth_deg: 180.0,
            magnitude: -2.0,
            is_visible: true,
            visibility_score: 0.9,
            description: String::new(),
        }
    }

    #[test]
    fn test_optimal_time_prefers_peak() {
        let e = event(18, 22, Some(19));
        assert_eq!(e.optimal_time(), Utc.with_ymd_and_hms(2024, 3, 1, 19, 0, 0).unwrap());
    }

    #[test]
    fn test_optimal_time_falls_back_to_midpoint() {
        let e = event(18, 22, None);
        assert_eq!(e.optimal_time(), Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap());
    }
}
