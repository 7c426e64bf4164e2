/// Business logic services layer
pub mod atmosphere;
pub mod ephemeris;
pub mod equipment;
pub mod lunar;
pub mod notes;
pub mod planetary;
pub mod ranker;
pub mod shadow;
pub mod solar;
pub mod timezone;
pub mod twilight;

use crate::config::CacheTtls;
use crate::domain::{
    AstroTarget, EnhancedSunTimes, EquipmentInventory, EquipmentRecommendation, EventRanking, MoonData,
    Observer, Planet, PlanetPositionData, ShadowCalculation, SunPathData, SunTimes, TerrainType,
    VisiblePlanets,
};
use crate::errors::ApiResult;
use crate::repo::{CacheKey, CalculationCache, CalculationKind, EquipmentRepo};
use crate::utils::{validate_date, validate_instant};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use self::equipment::EquipmentMatchingEngine;
use self::lunar::LunarPositionCalculator;
use self::planetary::PlanetaryPositionCalculator;
use self::ranker::AstroEventRanker;
use self::shadow::ShadowCalculator;
use self::solar::SolarPositionCalculator;
use self::timezone::TimeZoneResolver;

/// Daily solar events, golden hours, sun path and shadows
pub struct SunService {
    solar: SolarPositionCalculator,
    shadow: ShadowCalculator,
    resolver: TimeZoneResolver,
    cache: Arc<CalculationCache>,
    ttls: CacheTtls,
}

impl SunService {
    pub fn new(cache: Arc<CalculationCache>, ttls: CacheTtls) -> Self {
        Self {
            solar: SolarPositionCalculator::new(),
            shadow: ShadowCalculator::new(SolarPositionCalculator::new()),
            resolver: TimeZoneResolver::new(),
            cache,
            ttls,
        }
    }

    /// Sunrise, sunset, noon, nadir and twilight bounds for a date
    pub fn sun_times(&self, date: NaiveDate, observer: &Observer) -> ApiResult<SunTimes> {
        validate_date(date)?;
        let key = CacheKey::for_date(CalculationKind::SunTimes, date, observer);
        let times = self.cache.get_or_insert_with(key, self.ttls.sun(), || {
            debug!("Computing sun times for {} at {:?}", date, observer);
            let tz = self.resolver.resolve(observer.latitude, observer.longitude);
            self.solar.sun_times(date, observer, tz)
        });
        Ok((*times).clone())
    }

    /// Sun times plus golden and blue hour windows
    pub fn enhanced_sun_times(&self, date: NaiveDate, observer: &Observer) -> ApiResult<EnhancedSunTimes> {
        let times = self.sun_times(date, observer)?;
        let key = CacheKey::for_date(CalculationKind::EnhancedSunTimes, date, observer);
        let enhanced = self.cache.get_or_insert_with(key, self.ttls.sun(), || EnhancedSunTimes {
            windows: twilight::golden_hour_windows(times.sunrise, times.sunset),
            times,
        });
        Ok((*enhanced).clone())
    }

    pub fn sun_path(&self, date: NaiveDate, observer: &Observer, interval_minutes: u32) -> ApiResult<SunPathData> {
        validate_date(date)?;
        let key = CacheKey::for_date(CalculationKind::SunPath { interval_minutes }, date, observer);
        let path = self.cache.get_or_try_insert_with(key, self.ttls.sun_path(), || {
            self.shadow.sun_path(date, observer, interval_minutes)
        })?;
        Ok((*path).clone())
    }

    pub fn shadow(
        &self,
        instant: DateTime<Utc>,
        observer: &Observer,
        object_height_m: f64,
        terrain: TerrainType,
    ) -> ApiResult<ShadowCalculation> {
        validate_instant(instant)?;
        self.shadow.shadow(instant, observer, object_height_m, terrain)
    }
}

/// Moon phase, position and photography data
pub struct MoonService {
    lunar: LunarPositionCalculator,
    cache: Arc<CalculationCache>,
    ttls: CacheTtls,
}

impl MoonService {
    pub fn new(cache: Arc<CalculationCache>, ttls: CacheTtls) -> Self {
        Self {
            lunar: LunarPositionCalculator::new(),
            cache,
            ttls,
        }
    }

    pub fn moon_data(&self, instant: DateTime<Utc>, observer: &Observer) -> ApiResult<MoonData> {
        validate_instant(instant)?;
        let key = CacheKey::new(CalculationKind::Moon, instant, observer);
        let data = self
            .cache
            .get_or_insert_with(key, self.ttls.moon(), || self.lunar.moon_data(instant, observer));
        Ok((*data).clone())
    }
}

/// Planet positions and visibility
pub struct PlanetService {
    planets: Arc<PlanetaryPositionCalculator>,
    cache: Arc<CalculationCache>,
    ttls: CacheTtls,
}

impl PlanetService {
    pub fn new(planets: Arc<PlanetaryPositionCalculator>, cache: Arc<CalculationCache>, ttls: CacheTtls) -> Self {
        Self { planets, cache, ttls }
    }

    pub fn planet_position(
        &self,
        planet: Planet,
        instant: DateTime<Utc>,
        observer: &Observer,
    ) -> ApiResult<PlanetPositionData> {
        validate_instant(instant)?;
        let key = CacheKey::new(CalculationKind::Planet(planet), instant, observer);
        let data = self.cache.get_or_try_insert_with(key, self.ttls.planet(), || {
            self.planets.position(planet, instant, observer)
        })?;
        Ok((*data).clone())
    }

    pub fn visible_planets(&self, instant: DateTime<Utc>, observer: &Observer) -> ApiResult<VisiblePlanets> {
        validate_instant(instant)?;
        Ok(self.planets.visible_planets(instant, observer))
    }
}

/// Evening event ranking
pub struct EventService {
    ranker: AstroEventRanker,
}

impl EventService {
    pub fn new(ranker: AstroEventRanker) -> Self {
        Self { ranker }
    }

    pub fn events_for_date(
        &self,
        date: NaiveDate,
        observer: &Observer,
        min_altitude_deg: f64,
        include_daytime: bool,
    ) -> ApiResult<EventRanking> {
        self.ranker.rank_events(date, observer, min_altitude_deg, include_daytime)
    }
}

/// Equipment recommendations against the user inventory
pub struct EquipmentService {
    engine: EquipmentMatchingEngine,
    repo: EquipmentRepo,
}

impl EquipmentService {
    pub fn new(repo: EquipmentRepo) -> Self {
        Self {
            engine: EquipmentMatchingEngine::new(),
            repo,
        }
    }

    pub async fn recommendation(&self, target: AstroTarget) -> ApiResult<EquipmentRecommendation> {
        let inventory = self.repo.snapshot().await;
        let matched = self.engine.match_equipment(
            target,
            &inventory.cameras,
            &inventory.lenses,
            &inventory.compatibility,
        );
        Ok(EquipmentRecommendation {
            target,
            target_name: target.name(),
            spec: target.optimal_equipment(),
            note: notes::target_note(target),
            recommended: matched.recommended,
            alternative: matched.alternative,
        })
    }

    pub async fn replace_inventory(&self, inventory: EquipmentInventory) -> ApiResult<()> {
        let (cameras, lenses) = (inventory.cameras.len(), inventory.lenses.len());
        self.repo.replace(inventory).await?;
        info!("Equipment inventory replaced: {} cameras, {} lenses", cameras, lenses);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CameraDescriptor, CompatibilityEdge, LensDescriptor};
    use crate::errors::AstroError;

    fn observer() -> Observer {
        Observer::at(45.07, 7.69).unwrap()
    }

    #[test]
    fn test_sun_times_are_cached() {
        let cache = Arc::new(CalculationCache::new());
        let service = SunService::new(cache.clone(), CacheTtls::default());
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();

        let first = service.sun_times(date, &observer()).unwrap();
        assert_eq!(cache.len(), 1);
        let second = service.sun_times(date, &observer()).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_enhanced_times_follow_sunrise_and_sunset() {
        let service = SunService::new(Arc::new(CalculationCache::new()), CacheTtls::default());
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let enhanced = service.enhanced_sun_times(date, &observer()).unwrap();
        let sunset = enhanced.times.sunset.unwrap();
        assert_eq!(enhanced.windows.golden_hour_evening_end, Some(sunset));
        assert_eq!(
            enhanced.windows.blue_hour_start,
            Some(sunset + chrono::Duration::minutes(30))
        );
    }

    #[test]
    fn test_polar_day_is_not_an_error() {
        let service = SunService::new(Arc::new(CalculationCache::new()), CacheTtls::default());
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let times = service.sun_times(date, &Observer::at(70.0, 20.0).unwrap()).unwrap();
        assert!(times.sunset.is_none());
        assert!(times.day_length_minutes.is_none());
    }

    #[test]
    fn test_dates_outside_supported_years_are_rejected() {
        let cache = Arc::new(CalculationCache::new());
        let sun = SunService::new(cache.clone(), CacheTtls::default());
        let far = NaiveDate::from_ymd_opt(3000, 6, 1).unwrap();
        assert!(matches!(sun.sun_times(far, &observer()), Err(AstroError::InvalidInput(_))));
        assert!(sun.sun_path(far, &observer(), 30).is_err());

        let moon = MoonService::new(cache.clone(), CacheTtls::default());
        let ancient = crate::utils::start_of_day(NaiveDate::from_ymd_opt(1500, 1, 1).unwrap());
        assert!(matches!(moon.moon_data(ancient, &observer()), Err(AstroError::InvalidInput(_))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_equipment_recommendation_uses_inventory() {
        let inventory = EquipmentInventory {
            cameras: vec![CameraDescriptor {
                id: 1,
                name: "FF".to_string(),
                sensor_width_mm: 36.0,
                sensor_height_mm: 24.0,
                is_user_created: true,
            }],
            lenses: vec![LensDescriptor::prime(2, 24.0, 1.4)],
            compatibility: vec![CompatibilityEdge { camera_id: 1, lens_id: 2 }],
        };
        let service = EquipmentService::new(EquipmentRepo::new(inventory).unwrap());
        let rec = service.recommendation(AstroTarget::MilkyWayCore).await.unwrap();
        assert_eq!(rec.recommended.len(), 1);
        assert!((rec.recommended[0].match_score - 95.0).abs() < 1e-9);

        service.replace_inventory(EquipmentInventory::default()).await.unwrap();
        let empty = service.recommendation(AstroTarget::MilkyWayCore).await.unwrap();
        assert!(empty.recommended.is_empty() && empty.alternative.is_empty());
    }
}
