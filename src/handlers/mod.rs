/// HTTP request handlers
use crate::config::AppConfig;
use crate::domain::{
    AstroTarget, AtmosphericCorrection, EnhancedSunTimes, EquipmentInventory, EquipmentRecommendation,
    EventRanking, Health, MoonData, Observer, Planet, PlanetPositionData, ShadowCalculation, SunPathData,
    SunTimes, TerrainType, TimeZoneInfo, VisiblePlanets,
};
use crate::errors::{ApiResult, AstroError};
use crate::repo::{CalculationCache, EquipmentRepo};
use crate::services::atmosphere::{AtmosphericCorrectionEstimator, Conditions};
use crate::services::planetary::PlanetaryPositionCalculator;
use crate::services::ranker::AstroEventRanker;
use crate::services::timezone::TimeZoneResolver;
use crate::services::{EquipmentService, EventService, MoonService, PlanetService, SunService};
use crate::utils::start_of_day;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sun_service: Arc<SunService>,
    pub moon_service: Arc<MoonService>,
    pub planet_service: Arc<PlanetService>,
    pub event_service: Arc<EventService>,
    pub equipment_service: Arc<EquipmentService>,
    pub cache: Arc<CalculationCache>,
    pub resolver: TimeZoneResolver,
    pub atmosphere: AtmosphericCorrectionEstimator,
}

impl AppState {
    /// Wire services around one shared cache
    pub fn new(config: &AppConfig, equipment: EquipmentRepo) -> Self {
        let cache = Arc::new(CalculationCache::new());
        let ttls = config.cache_ttls;
        let planets = Arc::new(PlanetaryPositionCalculator::default());
        let ranker = AstroEventRanker::new(planets.clone(), cache.clone(), ttls, config.evening);

        Self {
            sun_service: Arc::new(SunService::new(cache.clone(), ttls)),
            moon_service: Arc::new(MoonService::new(cache.clone(), ttls)),
            planet_service: Arc::new(PlanetService::new(planets, cache.clone(), ttls)),
            event_service: Arc::new(EventService::new(ranker)),
            equipment_service: Arc::new(EquipmentService::new(equipment)),
            cache,
            resolver: TimeZoneResolver::new(),
            atmosphere: AtmosphericCorrectionEstimator::new(),
        }
    }
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

type Reply<T> = ApiResult<Json<SuccessResponse<T>>>;

fn reply<T: Serialize>(data: T) -> Reply<T> {
    Ok(Json(SuccessResponse::new(data)))
}

fn query<T>(q: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    q.map(|Query(inner)| inner)
        .map_err(|e| AstroError::InvalidInput(e.body_text()))
}

fn path<T>(p: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    p.map(|Path(inner)| inner)
        .map_err(|e| AstroError::InvalidInput(e.body_text()))
}

/// Run a calculation on the blocking pool
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[derive(Debug, Deserialize)]
pub struct CoordQuery {
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct InstantQuery {
    pub at: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub date: Option<NaiveDate>,
    pub lat: f64,
    pub lon: f64,
    pub min_altitude: Option<f64>,
    pub include_daytime: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SunPathQuery {
    pub date: Option<NaiveDate>,
    pub lat: f64,
    pub lon: f64,
    pub interval_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ShadowQuery {
    pub at: Option<DateTime<Utc>>,
    pub lat: f64,
    pub lon: f64,
    pub height: f64,
    pub terrain: Option<TerrainType>,
}

#[derive(Debug, Deserialize)]
pub struct AtmosphereQuery {
    pub altitude: f64,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
}

const DEFAULT_MIN_ALTITUDE: f64 = 10.0;
const DEFAULT_PATH_INTERVAL_MINUTES: u32 = 30;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn observer(lat: f64, lon: f64, elevation: Option<f64>) -> ApiResult<Observer> {
    Observer::new(lat, lon, elevation.unwrap_or(0.0))
}

impl InstantQuery {
    /// Explicit instant, else midnight UTC of `date`, else now
    fn instant(&self) -> DateTime<Utc> {
        self.at
            .or_else(|| self.date.map(start_of_day))
            .unwrap_or_else(Utc::now)
    }
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

pub async fn get_timezone(
    State(state): State<AppState>,
    q: Result<Query<CoordQuery>, QueryRejection>,
) -> Reply<TimeZoneInfo> {
    let q = query(q)?;
    let obs = observer(q.lat, q.lon, q.elevation)?;
    reply(state.resolver.resolve(obs.latitude, obs.longitude))
}

pub async fn get_sun_times(
    State(state): State<AppState>,
    q: Result<Query<DateQuery>, QueryRejection>,
) -> Reply<SunTimes> {
    let q = query(q)?;
    let obs = observer(q.lat, q.lon, q.elevation)?;
    let date = q.date.unwrap_or_else(today);
    let service = state.sun_service.clone();
    reply(blocking(move || service.sun_times(date, &obs)).await?)
}

pub async fn get_enhanced_sun_times(
    State(state): State<AppState>,
    q: Result<Query<DateQuery>, QueryRejection>,
) -> Reply<EnhancedSunTimes> {
    let q = query(q)?;
    let obs = observer(q.lat, q.lon, q.elevation)?;
    let date = q.date.unwrap_or_else(today);
    let service = state.sun_service.clone();
    reply(blocking(move || service.enhanced_sun_times(date, &obs)).await?)
}

pub async fn get_sun_path(
    State(state): State<AppState>,
    q: Result<Query<SunPathQuery>, QueryRejection>,
) -> Reply<SunPathData> {
    let q = query(q)?;
    let obs = observer(q.lat, q.lon, None)?;
    let date = q.date.unwrap_or_else(today);
    let interval = q.interval_minutes.unwrap_or(DEFAULT_PATH_INTERVAL_MINUTES);
    let service = state.sun_service.clone();
    reply(blocking(move || service.sun_path(date, &obs, interval)).await?)
}

pub async fn get_shadow(
    State(state): State<AppState>,
    q: Result<Query<ShadowQuery>, QueryRejection>,
) -> Reply<ShadowCalculation> {
    let q = query(q)?;
    let obs = observer(q.lat, q.lon, None)?;
    let at = q.at.unwrap_or_else(Utc::now);
    let terrain = q.terrain.unwrap_or(TerrainType::Flat);
    let height = q.height;
    let service = state.sun_service.clone();
    reply(blocking(move || service.shadow(at, &obs, height, terrain)).await?)
}

pub async fn get_moon(
    State(state): State<AppState>,
    q: Result<Query<InstantQuery>, QueryRejection>,
) -> Reply<MoonData> {
    let q = query(q)?;
    let obs = observer(q.lat, q.lon, q.elevation)?;
    let at = q.instant();
    let service = state.moon_service.clone();
    reply(blocking(move || service.moon_data(at, &obs)).await?)
}

pub async fn get_visible_planets(
    State(state): State<AppState>,
    q: Result<Query<InstantQuery>, QueryRejection>,
) -> Reply<VisiblePlanets> {
    let q = query(q)?;
    let obs = observer(q.lat, q.lon, q.elevation)?;
    let at = q.instant();
    let service = state.planet_service.clone();
    reply(blocking(move || service.visible_planets(at, &obs)).await?)
}

pub async fn get_planet(
    State(state): State<AppState>,
    planet: Result<Path<Planet>, PathRejection>,
    q: Result<Query<InstantQuery>, QueryRejection>,
) -> Reply<PlanetPositionData> {
    let planet = path(planet)?;
    let q = query(q)?;
    let obs = observer(q.lat, q.lon, q.elevation)?;
    let at = q.instant();
    let service = state.planet_service.clone();
    reply(blocking(move || service.planet_position(planet, at, &obs)).await?)
}

pub async fn get_events(
    State(state): State<AppState>,
    q: Result<Query<EventsQuery>, QueryRejection>,
) -> Reply<EventRanking> {
    let q = query(q)?;
    let obs = observer(q.lat, q.lon, None)?;
    let date = q.date.unwrap_or_else(today);
    let min_altitude = q.min_altitude.unwrap_or(DEFAULT_MIN_ALTITUDE);
    let include_daytime = q.include_daytime.unwrap_or(false);
    let service = state.event_service.clone();
    reply(blocking(move || service.events_for_date(date, &obs, min_altitude, include_daytime)).await?)
}

pub async fn get_atmosphere(
    State(state): State<AppState>,
    q: Result<Query<AtmosphereQuery>, QueryRejection>,
) -> Reply<AtmosphericCorrection> {
    let q = query(q)?;
    let defaults = Conditions::default();
    let conditions = Conditions {
        temperature_c: q.temperature.unwrap_or(defaults.temperature_c),
        pressure_hpa: q.pressure.unwrap_or(defaults.pressure_hpa),
        humidity_percent: q.humidity.unwrap_or(defaults.humidity_percent),
    };
    reply(state.atmosphere.correct(q.altitude, conditions)?)
}

pub async fn get_equipment_recommendation(
    State(state): State<AppState>,
    target: Result<Path<AstroTarget>, PathRejection>,
) -> Reply<EquipmentRecommendation> {
    let target = path(target)?;
    reply(state.equipment_service.recommendation(target).await?)
}

pub async fn put_equipment_inventory(
    State(state): State<AppState>,
    body: Result<Json<EquipmentInventory>, JsonRejection>,
) -> Reply<serde_json::Value> {
    let Json(inventory) = body.map_err(|e| AstroError::InvalidInput(e.body_text()))?;
    let counts = serde_json::json!({
        "cameras": inventory.cameras.len(),
        "lenses": inventory.lenses.len(),
        "compatibility": inventory.compatibility.len(),
    });
    state.equipment_service.replace_inventory(inventory).await?;
    reply(counts)
}
