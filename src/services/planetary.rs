/// Planet positions, brightness and visibility for an observer
use crate::domain::{
    CrossingDirection, Observer, Planet, PlanetPositionData, RiseSetTransit, VisiblePlanets,
};
use crate::errors::{ApiResult, AstroError};
use crate::services::ephemeris::{to_horizontal, EphemerisProvider, Vsop87Ephemeris};
use crate::services::notes;
use crate::utils::find_maximum;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::warn;

pub struct PlanetaryPositionCalculator {
    provider: Arc<dyn EphemerisProvider>,
}

impl Default for PlanetaryPositionCalculator {
    fn default() -> Self {
        Self::new(Arc::new(Vsop87Ephemeris::new()))
    }
}

impl PlanetaryPositionCalculator {
    pub fn new(provider: Arc<dyn EphemerisProvider>) -> Self {
        Self { provider }
    }

    /// Apparent equatorial diameter in arcseconds at `distance_au`.
    pub fn angular_diameter(&self, planet: Planet, distance_au: f64) -> f64 {
        planet.reference_angular_diameter_arcsec() / distance_au
    }

    /// Rise and set from the provider; transit is the altitude maximum of the
    /// following 24 hours when it falls inside the window.
    pub fn rise_set_transit(
        &self,
        planet: Planet,
        instant: DateTime<Utc>,
        observer: &Observer,
    ) -> ApiResult<RiseSetTransit> {
        let rise = self
            .provider
            .rise_set(planet, observer, CrossingDirection::Rising, instant)?;
        let set = self
            .provider
            .rise_set(planet, observer, CrossingDirection::Setting, instant)?;

        let until = instant + Duration::hours(24);
        let altitude = |t: DateTime<Utc>| {
            self.provider
                .equatorial_position(planet, t, observer)
                .map(|eq| to_horizontal(&eq, t, observer).altitude_deg)
                .unwrap_or(f64::NEG_INFINITY)
        };
        let peak = find_maximum(altitude, instant, until, Duration::minutes(30));
        let interior = peak - instant > Duration::minutes(1) && until - peak > Duration::minutes(1);

        Ok(RiseSetTransit {
            rise,
            set,
            transit: interior.then_some(peak),
        })
    }

    pub fn position(
        &self,
        planet: Planet,
        instant: DateTime<Utc>,
        observer: &Observer,
    ) -> ApiResult<PlanetPositionData> {
        let equatorial = self.provider.equatorial_position(planet, instant, observer)?;
        let illumination = self.provider.illumination(planet, instant)?;
        let horizontal = to_horizontal(&equatorial, instant, observer);
        let angular_diameter_arcsec = self.angular_diameter(planet, equatorial.distance_au);

        if !angular_diameter_arcsec.is_finite() {
            return Err(AstroError::CalculationUnavailable(format!(
                "{} distance {} AU",
                planet, equatorial.distance_au
            )));
        }

        Ok(PlanetPositionData {
            planet,
            instant,
            equatorial,
            horizontal,
            illumination,
            angular_diameter_arcsec,
            rise_set: self.rise_set_transit(planet, instant, observer)?,
            is_visible: horizontal.altitude_deg > 0.0,
            photography_note: notes::planet_photography_note(
                planet,
                angular_diameter_arcsec,
                illumination.phase_fraction,
            ),
            equipment_note: notes::planet_equipment_note(angular_diameter_arcsec),
        })
    }

    /// Planets above the horizon, brightest first. A planet whose position
    /// cannot be computed is logged and listed in `skipped`.
    pub fn visible_planets(&self, instant: DateTime<Utc>, observer: &Observer) -> VisiblePlanets {
        let mut planets = Vec::new();
        let mut skipped = Vec::new();

        for planet in Planet::ALL.into_iter().filter(|p| *p != Planet::Earth) {
            match self.position(planet, instant, observer) {
                Ok(data) if data.is_visible => planets.push(data),
                Ok(_) => {}
                Err(e) => {
                    warn!("Skipping {}: {}", planet, e);
                    skipped.push(AstroError::partial(planet.name(), &e).to_string());
                }
            }
        }

        planets.sort_by(|a, b| a.illumination.magnitude.total_cmp(&b.illumination.magnitude));

        VisiblePlanets {
            instant,
            planets,
            skipped,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{EquatorialPosition, IlluminationInfo};
    use chrono::TimeZone;

    /// Delegates to VSOP87 but fails for one planet.
    pub(crate) struct FailingFor(pub Planet);

    impl EphemerisProvider for FailingFor {
        fn equatorial_position(
            &self,
            body: Planet,
            instant: DateTime<Utc>,
            observer: &Observer,
        ) -> ApiResult<EquatorialPosition> {
            if body == self.0 {
                return Err(AstroError::CalculationUnavailable(format!("{} series diverged", body)));
            }
            Vsop87Ephemeris.equatorial_position(body, instant, observer)
        }

        fn illumination(&self, body: Planet, instant: DateTime<Utc>) -> ApiResult<IlluminationInfo> {
            if body == self.0 {
                return Err(AstroError::CalculationUnavailable(format!("{} series diverged", body)));
            }
            Vsop87Ephemeris.illumination(body, instant)
        }
    }

    #[test]
    fn test_angular_diameter_scales_inversely() {
        let calc = PlanetaryPositionCalculator::default();
        let near = calc.angular_diameter(Planet::Jupiter, 4.0);
        let far = calc.angular_diameter(Planet::Jupiter, 6.0);
        assert!((near - 49.235).abs() < 0.01);
        assert!(near > far);
    }

    #[test]
    fn test_position_fields() {
        let calc = PlanetaryPositionCalculator::default();
        let obs = Observer::at(34.05, -118.24).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 12, 7, 6, 0, 0).unwrap();
        let data = calc.position(Planet::Jupiter, at, &obs).unwrap();
        assert!(data.angular_diameter_arcsec > 45.0);
        assert_eq!(data.is_visible, data.horizontal.altitude_deg > 0.0);
        assert!(!data.photography_note.is_empty());
    }

    #[test]
    fn test_visible_planets_sorted_brightest_first() {
        let calc = PlanetaryPositionCalculator::default();
        let obs = Observer::at(40.7128, -74.0060).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        let result = calc.visible_planets(at, &obs);
        assert!(result.skipped.is_empty());
        assert!(result.planets.iter().all(|p| p.horizontal.altitude_deg > 0.0));
        assert!(result
            .planets
            .windows(2)
            .all(|w| w[0].illumination.magnitude <= w[1].illumination.magnitude));
        assert!(result.planets.iter().any(|p| p.planet == Planet::Venus));
    }

    #[test]
    fn test_failing_planet_is_skipped_not_fatal() {
        let calc = PlanetaryPositionCalculator::new(Arc::new(FailingFor(Planet::Saturn)));
        let obs = Observer::at(40.7128, -74.0060).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        let result = calc.visible_planets(at, &obs);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].contains("Saturn"));
        assert!(result.planets.iter().all(|p| p.planet != Planet::Saturn));
    }

    #[test]
    fn test_earth_position_is_an_error() {
        let calc = PlanetaryPositionCalculator::default();
        let obs = Observer::at(0.0, 0.0).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        assert!(matches!(
            calc.position(Planet::Earth, at, &obs),
            Err(AstroError::CalculationUnavailable(_))
        ));
    }
}
