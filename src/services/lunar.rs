/// Lunar position (Meeus ch. 47 leading terms), phase and libration
use crate::domain::{
    EquatorialPosition, HorizontalPosition, Libration, MoonData, MoonPhase, Observer, RiseSetTransit,
};
use crate::services::notes;
use crate::services::solar::sun_equatorial;
use crate::utils::{
    ecliptic_to_equatorial, equatorial_to_horizontal, find_crossing, find_maximum, julian_century,
    julian_day, julian_ephemeris_day, local_sidereal_time, normalize_degrees, obliquity,
};
use chrono::{DateTime, Duration, Utc};

pub const AU_KM: f64 = 149_597_870.7;
const EARTH_RADIUS_KM: f64 = 6378.14;
pub const MEAN_DISTANCE_KM: f64 = 384_400.0;
pub const MEAN_ANGULAR_DIAMETER_ARCMIN: f64 = 31.08;
pub const PERIGEE_DISTANCE_KM: f64 = 356_500.0;
/// Upper limb on the horizon, refraction included; altitude is topocentric.
pub const MOONRISE_ALTITUDE: f64 = -0.833;
/// Inclination of the mean lunar equator to the ecliptic.
const LUNAR_EQUATOR_INCLINATION: f64 = 1.54242;

// (D, M, M', F, Σl in 1e-6 deg, Σr in 1e-3 km)
const TERMS_LR: [(f64, f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 1.0, 0.0, 6288774.0, -20905355.0),
    (2.0, 0.0, -1.0, 0.0, 1274027.0, -3699111.0),
    (2.0, 0.0, 0.0, 0.0, 658314.0, -2955968.0),
    (0.0, 0.0, 2.0, 0.0, 213618.0, -569925.0),
    (0.0, 1.0, 0.0, 0.0, -185116.0, 48888.0),
    (0.0, 0.0, 0.0, 2.0, -114332.0, -3149.0),
    (2.0, 0.0, -2.0, 0.0, 58793.0, 246158.0),
    (2.0, -1.0, -1.0, 0.0, 57066.0, -152138.0),
    (2.0, 0.0, 1.0, 0.0, 53322.0, -170733.0),
    (2.0, -1.0, 0.0, 0.0, 45758.0, -204586.0),
    (0.0, 1.0, -1.0, 0.0, -40923.0, -129620.0),
    (1.0, 0.0, 0.0, 0.0, -34720.0, 108743.0),
    (0.0, 1.0, 1.0, 0.0, -30383.0, 104755.0),
    (2.0, 0.0, 0.0, -2.0, 15327.0, 10321.0),
    (0.0, 0.0, 1.0, 2.0, -12528.0, 0.0),
    (0.0, 0.0, 1.0, -2.0, 10980.0, 79661.0),
    (4.0, 0.0, -1.0, 0.0, 10675.0, -34782.0),
    (0.0, 0.0, 3.0, 0.0, 10034.0, -23210.0),
    (4.0, 0.0, -2.0, 0.0, 8548.0, -21636.0),
    (2.0, 1.0, -1.0, 0.0, -7888.0, 24208.0),
];

// (D, M, M', F, Σb in 1e-6 deg)
const TERMS_B: [(f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 0.0, 1.0, 5128122.0),
    (0.0, 0.0, 1.0, 1.0, 280602.0),
    (0.0, 0.0, 1.0, -1.0, 277693.0),
    (2.0, 0.0, 0.0, -1.0, 173237.0),
    (2.0, 0.0, -1.0, 1.0, 55413.0),
    (2.0, 0.0, -1.0, -1.0, 46271.0),
    (2.0, 0.0, 0.0, 1.0, 32573.0),
    (0.0, 0.0, 2.0, 1.0, 17198.0),
    (2.0, 0.0, 1.0, -1.0, 9266.0),
    (0.0, 0.0, 2.0, -1.0, 8822.0),
    (2.0, -1.0, 0.0, -1.0, 8216.0),
    (2.0, 0.0, -2.0, -1.0, 4324.0),
    (2.0, 0.0, 1.0, 1.0, 4200.0),
    (2.0, 1.0, 0.0, -1.0, -3359.0),
    (2.0, -1.0, -1.0, 1.0, 2463.0),
    (2.0, -1.0, 0.0, 1.0, 2211.0),
    (2.0, -1.0, -1.0, -1.0, 2065.0),
    (0.0, 1.0, -1.0, -1.0, -1870.0),
    (4.0, 0.0, -1.0, -1.0, 1828.0),
    (0.0, 1.0, 0.0, 1.0, -1794.0),
];

/// Geocentric ecliptic coordinates of the Moon, mean equinox of date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunarEcliptic {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub distance_km: f64,
    /// Argument of latitude F, needed for libration.
    pub argument_of_latitude_deg: f64,
}

pub fn moon_ecliptic(t: f64) -> LunarEcliptic {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let lp = normalize_degrees(218.3164477 + 481267.88123421 * t - 0.0015786 * t2 + t3 / 538841.0 - t4 / 65194000.0);
    let d = normalize_degrees(297.8501921 + 445267.1114034 * t - 0.0018819 * t2 + t3 / 545868.0 - t4 / 113065000.0);
    let m = normalize_degrees(357.5291092 + 35999.0502909 * t - 0.0001536 * t2 + t3 / 24490000.0);
    let mp = normalize_degrees(134.9633964 + 477198.8675055 * t + 0.0087414 * t2 + t3 / 69699.0 - t4 / 14712000.0);
    let f = normalize_degrees(93.2720950 + 483202.0175233 * t - 0.0036539 * t2 - t3 / 3526000.0 + t4 / 863310000.0);

    // Terms involving the Sun's anomaly shrink with Earth's eccentricity
    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;
    let e_factor = |m_coeff: f64| match m_coeff.abs() as i32 {
        1 => e,
        2 => e * e,
        _ => 1.0,
    };

    let (mut sum_l, mut sum_r) = (0.0, 0.0);
    for &(cd, cm, cmp, cf, cl, cr) in &TERMS_LR {
        let arg = (cd * d + cm * m + cmp * mp + cf * f).to_radians();
        sum_l += cl * e_factor(cm) * arg.sin();
        sum_r += cr * e_factor(cm) * arg.cos();
    }

    let mut sum_b = 0.0;
    for &(cd, cm, cmp, cf, cb) in &TERMS_B {
        let arg = (cd * d + cm * m + cmp * mp + cf * f).to_radians();
        sum_b += cb * e_factor(cm) * arg.sin();
    }

    let a1 = normalize_degrees(119.75 + 131.849 * t);
    let a2 = normalize_degrees(53.09 + 479264.290 * t);
    let a3 = normalize_degrees(313.45 + 481266.484 * t);

    sum_l += 3958.0 * a1.to_radians().sin() + 1962.0 * (lp - f).to_radians().sin() + 318.0 * a2.to_radians().sin();
    sum_b += -2235.0 * lp.to_radians().sin()
        + 382.0 * a3.to_radians().sin()
        + 175.0 * (a1 - f).to_radians().sin()
        + 175.0 * (a1 + f).to_radians().sin()
        + 127.0 * (lp - mp).to_radians().sin()
        - 115.0 * (lp + mp).to_radians().sin();

    LunarEcliptic {
        longitude_deg: normalize_degrees(lp + sum_l / 1_000_000.0),
        latitude_deg: sum_b / 1_000_000.0,
        distance_km: 385000.56 + sum_r / 1000.0,
        argument_of_latitude_deg: f,
    }
}

/// Phase name for a Sun-Moon elongation in [0, 360): 45 degree bins centred
/// on each named phase.
pub fn phase_for_angle(phase_angle_deg: f64) -> MoonPhase {
    let index = ((normalize_degrees(phase_angle_deg) + 22.5) / 45.0).floor() as usize % 8;
    MoonPhase::ORDERED[index]
}

pub fn angular_diameter_arcmin(distance_km: f64) -> f64 {
    MEAN_ANGULAR_DIAMETER_ARCMIN * (MEAN_DISTANCE_KM / distance_km)
}

pub fn is_supermoon(distance_km: f64) -> bool {
    distance_km <= PERIGEE_DISTANCE_KM * 1.05
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LunarPositionCalculator;

impl LunarPositionCalculator {
    pub fn new() -> Self {
        Self
    }

    fn ecliptic(&self, instant: DateTime<Utc>) -> LunarEcliptic {
        moon_ecliptic(julian_century(julian_ephemeris_day(instant)))
    }

    pub fn equatorial(&self, instant: DateTime<Utc>) -> EquatorialPosition {
        let ecl = self.ecliptic(instant);
        let t = julian_century(julian_day(instant));
        let (ra, dec) = ecliptic_to_equatorial(ecl.longitude_deg, ecl.latitude_deg, obliquity(t));
        EquatorialPosition {
            right_ascension_hours: ra / 15.0,
            declination_deg: dec,
            distance_au: ecl.distance_km / AU_KM,
        }
    }

    /// Topocentric horizontal position (parallax applied, no refraction).
    pub fn position(&self, instant: DateTime<Utc>, observer: &Observer) -> HorizontalPosition {
        let eq = self.equatorial(instant);
        let lst = local_sidereal_time(julian_day(instant), observer.longitude);
        let (azimuth_deg, geo_altitude) = equatorial_to_horizontal(
            eq.right_ascension_hours * 15.0,
            eq.declination_deg,
            observer.latitude,
            lst,
        );
        let parallax = (EARTH_RADIUS_KM / (eq.distance_au * AU_KM)).asin();
        let altitude_deg = geo_altitude - (parallax * geo_altitude.to_radians().cos()).to_degrees();
        HorizontalPosition {
            azimuth_deg,
            altitude_deg,
        }
    }

    pub fn distance_km(&self, instant: DateTime<Utc>) -> f64 {
        self.ecliptic(instant).distance_km
    }

    /// Moon minus Sun ecliptic longitude: 0 new, 90 first quarter, 180 full.
    pub fn phase_angle(&self, instant: DateTime<Utc>) -> f64 {
        normalize_degrees(self.ecliptic(instant).longitude_deg - sun_equatorial(instant).apparent_longitude_deg)
    }

    /// True Sun-Moon elongation, degrees in [0, 180].
    fn elongation(&self, instant: DateTime<Utc>) -> f64 {
        let ecl = self.ecliptic(instant);
        let sun_lon = sun_equatorial(instant).apparent_longitude_deg;
        let cos_psi = ecl.latitude_deg.to_radians().cos() * (ecl.longitude_deg - sun_lon).to_radians().cos();
        cos_psi.clamp(-1.0, 1.0).acos().to_degrees()
    }

    pub fn illuminated_fraction(&self, instant: DateTime<Utc>) -> f64 {
        ((1.0 - self.elongation(instant).to_radians().cos()) / 2.0).clamp(0.0, 1.0)
    }

    pub fn phase_name(&self, instant: DateTime<Utc>) -> MoonPhase {
        phase_for_angle(self.phase_angle(instant))
    }

    /// Apparent visual magnitude from the Sun-Moon-Earth angle.
    pub fn magnitude(&self, instant: DateTime<Utc>) -> f64 {
        let i = 180.0 - self.elongation(instant);
        -12.73 + 0.026 * i.abs() + 4e-9 * i.powi(4)
    }

    /// Optical libration (Meeus ch. 53, first order).
    pub fn libration(&self, instant: DateTime<Utc>) -> Libration {
        let t = julian_century(julian_ephemeris_day(instant));
        let ecl = self.ecliptic(instant);
        let node = 125.0445479 - 1934.1362891 * t + 0.0020754 * t * t;
        let w = (ecl.longitude_deg - node).to_radians();
        let beta = ecl.latitude_deg.to_radians();
        let inc = LUNAR_EQUATOR_INCLINATION.to_radians();

        let a = (w.sin() * beta.cos() * inc.cos() - beta.sin() * inc.sin()).atan2(w.cos() * beta.cos());
        let longitude = normalize_degrees(a.to_degrees() - ecl.argument_of_latitude_deg);
        let latitude = (-w.sin() * beta.cos() * inc.sin() - beta.sin() * inc.cos()).asin();

        Libration {
            longitude_deg: if longitude > 180.0 { longitude - 360.0 } else { longitude },
            latitude_deg: latitude.to_degrees(),
        }
    }

    /// Rise, set and upper transit within 24 hours of `from`.
    pub fn rise_set_transit(&self, from: DateTime<Utc>, observer: &Observer) -> RiseSetTransit {
        let until = from + Duration::hours(24);
        let altitude = |t| self.position(t, observer).altitude_deg;
        let step = Duration::minutes(10);
        let horizon = MOONRISE_ALTITUDE - observer.horizon_dip_deg();

        let peak = find_maximum(altitude, from, until, Duration::minutes(20));
        // A maximum pinned to the window edge is not a culmination
        let interior = peak - from > Duration::minutes(1) && until - peak > Duration::minutes(1);

        RiseSetTransit {
            rise: find_crossing(altitude, from, until, step, horizon, true),
            set: find_crossing(altitude, from, until, step, horizon, false),
            transit: interior.then_some(peak),
        }
    }

    pub fn moon_data(&self, instant: DateTime<Utc>, observer: &Observer) -> MoonData {
        let phase_angle = self.phase_angle(instant);
        let phase = phase_for_angle(phase_angle);
        let fraction = self.illuminated_fraction(instant);
        let distance_km = self.distance_km(instant);

        MoonData {
            instant,
            phase,
            phase_name: phase.name(),
            phase_angle_deg: phase_angle,
            illuminated_fraction: fraction,
            illumination_percent: (fraction * 1000.0).round() / 10.0,
            position: self.position(instant, observer),
            equatorial: self.equatorial(instant),
            distance_km,
            angular_diameter_arcmin: angular_diameter_arcmin(distance_km),
            is_supermoon: is_supermoon(distance_km),
            magnitude: self.magnitude(instant),
            rise_set: self.rise_set_transit(instant, observer),
            libration: self.libration(instant),
            photography: notes::moon_photography(fraction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_meeus_example_47a() {
        // 1992 April 12, 0h TD
        let t = julian_century(2_448_724.5);
        let ecl = moon_ecliptic(t);
        assert!((ecl.longitude_deg - 133.17).abs() < 0.5, "lon {}", ecl.longitude_deg);
        assert!((ecl.latitude_deg + 3.23).abs() < 0.5, "lat {}", ecl.latitude_deg);
        assert!((ecl.distance_km - 368_409.7).abs() < 2000.0, "dist {}", ecl.distance_km);
    }

    #[test]
    fn test_phase_bins_hit_named_phases() {
        let expected = [
            (0.0, MoonPhase::NewMoon),
            (45.0, MoonPhase::WaxingCrescent),
            (90.0, MoonPhase::FirstQuarter),
            (135.0, MoonPhase::WaxingGibbous),
            (180.0, MoonPhase::FullMoon),
            (225.0, MoonPhase::WaningGibbous),
            (270.0, MoonPhase::ThirdQuarter),
            (315.0, MoonPhase::WaningCrescent),
        ];
        for (angle, phase) in expected {
            assert_eq!(phase_for_angle(angle), phase, "angle {}", angle);
        }
        assert_eq!(phase_for_angle(350.0), MoonPhase::NewMoon);
        assert_eq!(phase_for_angle(22.4), MoonPhase::NewMoon);
        assert_eq!(phase_for_angle(22.6), MoonPhase::WaxingCrescent);
    }

    #[test]
    fn test_full_moon_january_2025() {
        let calc = LunarPositionCalculator::new();
        let at = Utc.with_ymd_and_hms(2025, 1, 13, 22, 27, 0).unwrap();
        assert_eq!(calc.phase_name(at), MoonPhase::FullMoon);
        assert!(calc.illuminated_fraction(at) > 0.98);
        assert!(calc.magnitude(at) < -12.0);
    }

    #[test]
    fn test_new_moon_eclipse_2024() {
        let calc = LunarPositionCalculator::new();
        let at = Utc.with_ymd_and_hms(2024, 4, 8, 18, 21, 0).unwrap();
        assert_eq!(calc.phase_name(at), MoonPhase::NewMoon);
        assert!(calc.illuminated_fraction(at) < 0.02);
    }

    #[test]
    fn test_first_quarter_april_2024() {
        let calc = LunarPositionCalculator::new();
        let at = Utc.with_ymd_and_hms(2024, 4, 15, 19, 13, 0).unwrap();
        assert_eq!(calc.phase_name(at), MoonPhase::FirstQuarter);
        let fraction = calc.illuminated_fraction(at);
        assert!((fraction - 0.5).abs() < 0.05, "fraction {}", fraction);
    }

    #[test]
    fn test_supermoon_september_2024() {
        // Perigee full moon of 2024-09-18
        let calc = LunarPositionCalculator::new();
        let at = Utc.with_ymd_and_hms(2024, 9, 18, 2, 34, 0).unwrap();
        let distance = calc.distance_km(at);
        assert!(distance < 360_000.0, "distance {}", distance);
        assert!(is_supermoon(distance));
        assert!(angular_diameter_arcmin(distance) > MEAN_ANGULAR_DIAMETER_ARCMIN);
        assert!(!is_supermoon(404_000.0));
    }

    #[test]
    fn test_rise_is_on_threshold() {
        let calc = LunarPositionCalculator::new();
        let obs = Observer::at(40.7128, -74.0060).unwrap();
        let from = Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap();
        let rst = calc.rise_set_transit(from, &obs);
        assert!(rst.rise.is_some() || rst.set.is_some());
        if let Some(rise) = rst.rise {
            let alt = calc.position(rise, &obs).altitude_deg;
            assert!((alt - MOONRISE_ALTITUDE).abs() < 0.05, "alt at rise {}", alt);
        }
        if let Some(transit) = rst.transit {
            let alt = calc.position(transit, &obs).altitude_deg;
            let before = calc.position(transit - Duration::minutes(30), &obs).altitude_deg;
            assert!(alt > before);
        }
    }

    #[test]
    fn test_libration_is_bounded() {
        let calc = LunarPositionCalculator::new();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for day in 0..30 {
            let lib = calc.libration(start + Duration::days(day));
            assert!(lib.longitude_deg.abs() < 8.5, "longitude {}", lib.longitude_deg);
            assert!(lib.latitude_deg.abs() < 7.0, "latitude {}", lib.latitude_deg);
        }
    }

    #[test]
    fn test_moon_data_is_consistent() {
        let calc = LunarPositionCalculator::new();
        let obs = Observer::at(51.5, -0.12).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 8, 19, 18, 26, 0).unwrap();
        let data = calc.moon_data(at, &obs);
        assert_eq!(data.phase_name, data.phase.name());
        assert!((0.0..=100.0).contains(&data.illumination_percent));
        assert!((0.0..360.0).contains(&data.position.azimuth_deg));
        assert!(data.distance_km > 350_000.0 && data.distance_km < 410_000.0);
    }
}
