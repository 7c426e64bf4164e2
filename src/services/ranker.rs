/// Ranks the Moon and the bright planets for an evening of observing
use crate::config::{CacheTtls, EveningClock, EveningWindow};
use crate::domain::{AstroEvent, AstroEventKind, EventRanking, MoonData, Observer, Planet, PlanetPositionData};
use crate::errors::{ApiResult, AstroError};
use crate::repo::{CacheKey, CalculationCache, CalculationKind};
use crate::services::ephemeris::PLANET_RISE_ALTITUDE;
use crate::services::lunar::{LunarPositionCalculator, MOONRISE_ALTITUDE};
use crate::services::planetary::PlanetaryPositionCalculator;
use crate::services::timezone::TimeZoneResolver;
use crate::utils::{start_of_day, validate_date};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// Score in [0, 1] from altitude, brightness and visibility.
pub fn visibility_score(altitude_deg: f64, magnitude: f64, is_visible: bool) -> f64 {
    let mut score: f64 = if is_visible { 0.5 } else { 0.0 };

    score += if altitude_deg > 60.0 {
        0.3
    } else if altitude_deg > 30.0 {
        0.2
    } else if altitude_deg > 15.0 {
        0.1
    } else {
        0.0
    };

    score += if magnitude < 0.0 {
        0.2
    } else if magnitude < 3.0 {
        0.1
    } else {
        0.0
    };

    score.min(1.0)
}

/// Part of the night the body is up. A body already above the horizon at
/// `evening` runs until its next set; otherwise the window opens at the next
/// rise. Both ends are capped at `night_end`.
pub(crate) fn event_window(
    evening: DateTime<Utc>,
    night_end: DateTime<Utc>,
    up_at_evening: bool,
    rise: Option<DateTime<Utc>>,
    set: Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = if up_at_evening {
        evening
    } else {
        rise.filter(|r| *r < night_end).unwrap_or(evening)
    };
    let end = set.filter(|s| *s > start).map_or(night_end, |s| s.min(night_end));
    (start, end)
}

/// Best score first, then earliest optimal time
pub(crate) fn rank_order(a: &AstroEvent, b: &AstroEvent) -> Ordering {
    b.visibility_score
        .total_cmp(&a.visibility_score)
        .then(a.optimal_time().cmp(&b.optimal_time()))
}

pub struct AstroEventRanker {
    lunar: LunarPositionCalculator,
    planets: Arc<PlanetaryPositionCalculator>,
    resolver: TimeZoneResolver,
    cache: Arc<CalculationCache>,
    ttls: CacheTtls,
    evening: EveningWindow,
}

impl AstroEventRanker {
    pub fn new(
        planets: Arc<PlanetaryPositionCalculator>,
        cache: Arc<CalculationCache>,
        ttls: CacheTtls,
        evening: EveningWindow,
    ) -> Self {
        Self {
            lunar: LunarPositionCalculator::new(),
            planets,
            resolver: TimeZoneResolver::new(),
            cache,
            ttls,
            evening,
        }
    }

    /// Instant on `date` at which events are evaluated.
    pub fn evening_instant(&self, date: NaiveDate, observer: &Observer) -> DateTime<Utc> {
        let at_hour = start_of_day(date) + Duration::hours(i64::from(self.evening.hour));
        match self.evening.clock {
            EveningClock::Utc => at_hour,
            EveningClock::Local => {
                let zone = self.resolver.resolve(observer.latitude, observer.longitude);
                self.resolver.local_to_utc(&zone, at_hour.naive_utc())
            }
        }
    }

    fn moon_event(&self, evening: DateTime<Utc>, night_end: DateTime<Utc>, observer: &Observer) -> AstroEvent {
        let key = CacheKey::new(CalculationKind::Moon, evening, observer);
        let moon: Arc<MoonData> = self
            .cache
            .get_or_insert_with(key, self.ttls.moon(), || self.lunar.moon_data(evening, observer));

        let up = moon.position.altitude_deg > MOONRISE_ALTITUDE - observer.horizon_dip_deg();
        let (start_time, end_time) = event_window(evening, night_end, up, moon.rise_set.rise, moon.rise_set.set);
        let is_visible = moon.position.altitude_deg > 0.0;
        AstroEvent {
            name: format!("Moon ({})", moon.phase_name),
            kind: AstroEventKind::Moon,
            start_time,
            end_time,
            peak_time: moon.rise_set.transit.filter(|t| *t >= start_time && *t <= end_time),
            altitude_deg: moon.position.altitude_deg,
            azimuth_deg: moon.position.azimuth_deg,
            magnitude: moon.magnitude,
            is_visible,
            visibility_score: visibility_score(moon.position.altitude_deg, moon.magnitude, is_visible),
            description: format!(
                "{:.0}% illuminated, {:.0} km away. {}",
                moon.illumination_percent, moon.distance_km, moon.photography.optimal_shooting_phase
            ),
        }
    }

    fn planet_event(
        &self,
        planet: Planet,
        evening: DateTime<Utc>,
        night_end: DateTime<Utc>,
        observer: &Observer,
    ) -> ApiResult<AstroEvent> {
        let key = CacheKey::new(CalculationKind::Planet(planet), evening, observer);
        let data: Arc<PlanetPositionData> = self.cache.get_or_try_insert_with(key, self.ttls.planet(), || {
            self.planets.position(planet, evening, observer)
        })?;

        let altitude = data.horizontal.altitude_deg;
        let up = altitude > PLANET_RISE_ALTITUDE - observer.horizon_dip_deg();
        let (start_time, end_time) = event_window(evening, night_end, up, data.rise_set.rise, data.rise_set.set);
        let magnitude = data.illumination.magnitude;
        Ok(AstroEvent {
            name: planet.name().to_string(),
            kind: AstroEventKind::Planet,
            start_time,
            end_time,
            peak_time: data.rise_set.transit.filter(|t| *t >= start_time && *t <= end_time),
            altitude_deg: altitude,
            azimuth_deg: data.horizontal.azimuth_deg,
            magnitude,
            is_visible: data.is_visible,
            visibility_score: visibility_score(altitude, magnitude, data.is_visible),
            description: format!("Magnitude {:.1}. {}", magnitude, data.photography_note),
        })
    }

    /// Moon and bright planets above `min_altitude_deg` at the evening
    /// instant, best first. Bodies that fail are logged and listed in
    /// `skipped`.
    pub fn rank_events(
        &self,
        date: NaiveDate,
        observer: &Observer,
        min_altitude_deg: f64,
        include_daytime: bool,
    ) -> ApiResult<EventRanking> {
        if !(-90.0..=90.0).contains(&min_altitude_deg) {
            return Err(AstroError::InvalidInput(format!(
                "minimum altitude {} outside [-90, 90]",
                min_altitude_deg
            )));
        }
        validate_date(date)?;

        let evening = self.evening_instant(date, observer);
        let night_end = evening + Duration::hours(self.evening.night_hours);
        let mut candidates = vec![self.moon_event(evening, night_end, observer)];
        let mut skipped = Vec::new();

        for planet in Planet::BRIGHT {
            match self.planet_event(planet, evening, night_end, observer) {
                Ok(event) => candidates.push(event),
                Err(e) => {
                    warn!("Event ranking skipped {}: {}", planet, e);
                    skipped.push(AstroError::partial(planet.name(), &e).to_string());
                }
            }
        }

        let mut events: Vec<AstroEvent> = candidates
            .into_iter()
            .filter(|e| e.altitude_deg > min_altitude_deg || include_daytime)
            .collect();
        events.sort_by(rank_order);

        debug!("Ranked {} events for {} ({} skipped)", events.len(), date, skipped.len());
        Ok(EventRanking {
            date,
            evening_instant: evening,
            events,
            skipped,
        })
    }
}
