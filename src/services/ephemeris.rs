/// Planetary ephemeris capability and its VSOP87 implementation
use crate::domain::{
    CrossingDirection, EquatorialPosition, HorizontalPosition, IlluminationInfo, Observer, Planet,
};
use crate::errors::{ApiResult, AstroError};
use crate::utils::{
    ecliptic_to_equatorial, equatorial_to_horizontal, find_crossing, julian_century, julian_day,
    julian_ephemeris_day, local_sidereal_time, obliquity,
};
use chrono::{DateTime, Duration, Utc};
use vsop87::vsop87d;

/// Planet centre on the horizon, refraction included.
pub const PLANET_RISE_ALTITUDE: f64 = -0.5667;
/// Light travel time for 1 AU, days.
const LIGHT_TIME_DAYS_PER_AU: f64 = 0.005_775_518_3;

/// Source of planetary positions.
pub trait EphemerisProvider: Send + Sync {
    /// Geocentric apparent RA/Dec and distance.
    fn equatorial_position(
        &self,
        body: Planet,
        instant: DateTime<Utc>,
        observer: &Observer,
    ) -> ApiResult<EquatorialPosition>;

    fn illumination(&self, body: Planet, instant: DateTime<Utc>) -> ApiResult<IlluminationInfo>;

    /// Next crossing of the rise altitude within 24 hours of `from`.
    fn rise_set(
        &self,
        body: Planet,
        observer: &Observer,
        direction: CrossingDirection,
        from: DateTime<Utc>,
    ) -> ApiResult<Option<DateTime<Utc>>> {
        // Surface a provider failure instead of scanning a NaN curve
        self.equatorial_position(body, from, observer)?;

        let altitude = |t: DateTime<Utc>| {
            self.equatorial_position(body, t, observer)
                .map(|eq| to_horizontal(&eq, t, observer).altitude_deg)
                .unwrap_or(f64::NAN)
        };
        Ok(find_crossing(
            altitude,
            from,
            from + Duration::hours(24),
            Duration::minutes(20),
            PLANET_RISE_ALTITUDE - observer.horizon_dip_deg(),
            direction == CrossingDirection::Rising,
        ))
    }
}

pub fn to_horizontal(eq: &EquatorialPosition, instant: DateTime<Utc>, observer: &Observer) -> HorizontalPosition {
    let lst = local_sidereal_time(julian_day(instant), observer.longitude);
    let (azimuth_deg, altitude_deg) = equatorial_to_horizontal(
        eq.right_ascension_hours * 15.0,
        eq.declination_deg,
        observer.latitude,
        lst,
    );
    HorizontalPosition {
        azimuth_deg,
        altitude_deg,
    }
}

#[derive(Debug, Clone, Copy)]
struct Rectangular {
    x: f64,
    y: f64,
    z: f64,
}

impl Rectangular {
    fn from_spherical(longitude: f64, latitude: f64, radius: f64) -> Self {
        Self {
            x: radius * latitude.cos() * longitude.cos(),
            y: radius * latitude.cos() * longitude.sin(),
            z: radius * latitude.sin(),
        }
    }

    fn minus(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Heliocentric and geocentric geometry of one planet at one instant.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    /// Geocentric ecliptic longitude, latitude (degrees) and distance (AU).
    longitude_deg: f64,
    latitude_deg: f64,
    distance_au: f64,
    /// Sun-planet distance, AU.
    heliocentric_au: f64,
    /// Sun-Earth distance, AU.
    earth_sun_au: f64,
}

/// Analytic VSOP87D series, heliocentric ecliptic of date.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vsop87Ephemeris;

impl Vsop87Ephemeris {
    pub fn new() -> Self {
        Self
    }

    fn heliocentric(body: Planet, jde: f64) -> ApiResult<Rectangular> {
        let coords = match body {
            Planet::Mercury => vsop87d::mercury(jde),
            Planet::Venus => vsop87d::venus(jde),
            Planet::Mars => vsop87d::mars(jde),
            Planet::Jupiter => vsop87d::jupiter(jde),
            Planet::Saturn => vsop87d::saturn(jde),
            Planet::Uranus => vsop87d::uranus(jde),
            Planet::Neptune => vsop87d::neptune(jde),
            Planet::Earth => {
                return Err(AstroError::CalculationUnavailable(
                    "Earth has no geocentric position".to_string(),
                ))
            }
        };
        Ok(Rectangular::from_spherical(
            coords.longitude(),
            coords.latitude(),
            coords.distance(),
        ))
    }

    fn geometry(&self, body: Planet, instant: DateTime<Utc>) -> ApiResult<Geometry> {
        let jde = julian_ephemeris_day(instant);
        let earth = vsop87d::earth(jde);
        let earth_rect = Rectangular::from_spherical(earth.longitude(), earth.latitude(), earth.distance());

        // One light-time iteration is enough at arcsecond level
        let first = Self::heliocentric(body, jde)?;
        let tau = first.minus(earth_rect).norm() * LIGHT_TIME_DAYS_PER_AU;
        let planet = Self::heliocentric(body, jde - tau)?;
        let geo = planet.minus(earth_rect);

        let distance_au = geo.norm();
        let geometry = Geometry {
            longitude_deg: geo.y.atan2(geo.x).to_degrees().rem_euclid(360.0),
            latitude_deg: (geo.z / distance_au).asin().to_degrees(),
            distance_au,
            heliocentric_au: planet.norm(),
            earth_sun_au: earth.distance(),
        };

        let finite = [
            geometry.longitude_deg,
            geometry.latitude_deg,
            geometry.distance_au,
            geometry.heliocentric_au,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite || distance_au <= 0.0 {
            return Err(AstroError::CalculationUnavailable(format!(
                "ephemeris for {} is not defined at {}",
                body, instant
            )));
        }
        Ok(geometry)
    }
}

/// Sun-planet-Earth angle in degrees.
fn phase_angle(r: f64, delta: f64, earth_sun: f64) -> f64 {
    let cos_i = (r * r + delta * delta - earth_sun * earth_sun) / (2.0 * r * delta);
    cos_i.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Apparent visual magnitude from distances and phase angle.
pub fn planet_magnitude(body: Planet, r: f64, delta: f64, i: f64) -> f64 {
    let distance_term = 5.0 * (r * delta).log10();
    let base = match body {
        Planet::Mercury => -0.42 + 0.0380 * i - 0.000273 * i * i + 0.000002 * i.powi(3),
        Planet::Venus => -4.40 + 0.0009 * i + 0.000239 * i * i - 0.00000065 * i.powi(3),
        Planet::Earth => -3.86,
        Planet::Mars => -1.52 + 0.016 * i,
        Planet::Jupiter => -9.40 + 0.005 * i,
        Planet::Saturn => -8.88,
        Planet::Uranus => -7.19,
        Planet::Neptune => -6.87,
    };
    base + distance_term
}

impl EphemerisProvider for Vsop87Ephemeris {
    fn equatorial_position(
        &self,
        body: Planet,
        instant: DateTime<Utc>,
        _observer: &Observer,
    ) -> ApiResult<EquatorialPosition> {
        let geo = self.geometry(body, instant)?;
        let t = julian_century(julian_day(instant));
        let (ra, dec) = ecliptic_to_equatorial(geo.longitude_deg, geo.latitude_deg, obliquity(t));
        Ok(EquatorialPosition {
            right_ascension_hours: ra / 15.0,
            declination_deg: dec,
            distance_au: geo.distance_au,
        })
    }

    fn illumination(&self, body: Planet, instant: DateTime<Utc>) -> ApiResult<IlluminationInfo> {
        let geo = self.geometry(body, instant)?;
        let i = phase_angle(geo.heliocentric_au, geo.distance_au, geo.earth_sun_au);
        Ok(IlluminationInfo {
            magnitude: planet_magnitude(body, geo.heliocentric_au, geo.distance_au, i),
            phase_fraction: (1.0 + i.to_radians().cos()) / 2.0,
            phase_angle_deg: i,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn greenwich() -> Observer {
        Observer::at(51.48, 0.0).unwrap()
    }

    #[test]
    fn test_earth_is_unavailable() {
        let eph = Vsop87Ephemeris::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = eph.equatorial_position(Planet::Earth, at, &greenwich()).unwrap_err();
        assert!(matches!(err, AstroError::CalculationUnavailable(_)));
        assert!(eph.illumination(Planet::Earth, at).is_err());
    }

    #[test]
    fn test_venus_position_meeus_33a() {
        // Meeus example 33.a: 1992 Dec 20, 0h TD; RA 21h04m41s, Dec -18°53'17"
        let at = Utc.with_ymd_and_hms(1992, 12, 19, 23, 59, 0).unwrap();
        let eq = Vsop87Ephemeris::new()
            .equatorial_position(Planet::Venus, at, &greenwich())
            .unwrap();
        assert!((eq.right_ascension_hours - 21.078).abs() < 0.01, "ra {}", eq.right_ascension_hours);
        assert!((eq.declination_deg + 18.888).abs() < 0.05, "dec {}", eq.declination_deg);
        assert!((eq.distance_au - 0.911).abs() < 0.01);
    }

    #[test]
    fn test_jupiter_opposition_brightness() {
        // Opposition 2023-11-03
        let at = Utc.with_ymd_and_hms(2023, 11, 3, 5, 0, 0).unwrap();
        let info = Vsop87Ephemeris::new().illumination(Planet::Jupiter, at).unwrap();
        assert!((info.magnitude + 2.9).abs() < 0.3, "mag {}", info.magnitude);
        assert!(info.phase_fraction > 0.99);
        assert!(info.phase_angle_deg < 2.0);
    }

    #[test]
    fn test_inner_planet_phase_in_range() {
        let eph = Vsop87Ephemeris::new();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for week in 0..52 {
            let info = eph.illumination(Planet::Venus, start + Duration::weeks(week)).unwrap();
            assert!((0.0..=1.0).contains(&info.phase_fraction));
            assert!(info.magnitude < -3.5 && info.magnitude > -5.0, "mag {}", info.magnitude);
        }
    }

    #[test]
    fn test_rise_set_crosses_threshold() {
        let eph = Vsop87Ephemeris::new();
        let obs = Observer::at(40.0, -105.0).unwrap();
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let rise = eph
            .rise_set(Planet::Jupiter, &obs, CrossingDirection::Rising, from)
            .unwrap()
            .expect("Jupiter rises daily at mid latitude");
        let eq = eph.equatorial_position(Planet::Jupiter, rise, &obs).unwrap();
        let alt = to_horizontal(&eq, rise, &obs).altitude_deg;
        assert!((alt - PLANET_RISE_ALTITUDE).abs() < 0.05, "alt {}", alt);
    }
}
