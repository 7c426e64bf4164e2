/// Refraction and extinction estimates for low-altitude targets
use crate::domain::AtmosphericCorrection;
use crate::errors::{ApiResult, AstroError};

/// Visual extinction coefficient at sea level, magnitudes per airmass.
const EXTINCTION_COEFFICIENT: f64 = 0.2;
/// Returned for targets at or below the horizon.
const NOT_OBSERVABLE_EXTINCTION: f64 = 10.0;

/// Ambient conditions at the observing site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub temperature_c: f64,
    pub pressure_hpa: f64,
    pub humidity_percent: f64,
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            temperature_c: 10.0,
            pressure_hpa: 1010.0,
            humidity_percent: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AtmosphericCorrectionEstimator;

impl AtmosphericCorrectionEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Bennett refraction in arcminutes at standard conditions.
    pub fn refraction(&self, altitude_deg: f64) -> f64 {
        if altitude_deg <= 0.0 {
            return 0.0;
        }
        1.02 / (altitude_deg + 10.3 / (altitude_deg + 5.11)).to_radians().tan()
    }

    /// 1 / sin(altitude); `None` at or below the horizon.
    pub fn airmass(&self, altitude_deg: f64) -> Option<f64> {
        (altitude_deg > 0.0).then(|| 1.0 / altitude_deg.to_radians().sin())
    }

    /// Dimming in magnitudes.
    pub fn extinction(&self, altitude_deg: f64) -> f64 {
        self.airmass(altitude_deg)
            .map(|airmass| EXTINCTION_COEFFICIENT * airmass)
            .unwrap_or(NOT_OBSERVABLE_EXTINCTION)
    }

    pub fn true_altitude(&self, apparent_altitude_deg: f64) -> f64 {
        apparent_altitude_deg - self.refraction(apparent_altitude_deg) / 60.0
    }

    pub fn correct(
        &self,
        apparent_altitude_deg: f64,
        conditions: Conditions,
    ) -> ApiResult<AtmosphericCorrection> {
        if !apparent_altitude_deg.is_finite() || !(-90.0..=90.0).contains(&apparent_altitude_deg) {
            return Err(AstroError::InvalidInput(format!(
                "altitude {} outside [-90, 90]",
                apparent_altitude_deg
            )));
        }
        if conditions.pressure_hpa <= 0.0 || conditions.temperature_c <= -273.0 {
            return Err(AstroError::InvalidInput(
                "pressure must be positive and temperature above absolute zero".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&conditions.humidity_percent) {
            return Err(AstroError::InvalidInput(format!(
                "humidity {} outside [0, 100]",
                conditions.humidity_percent
            )));
        }

        let scale = (conditions.pressure_hpa / 1010.0) * (283.0 / (273.0 + conditions.temperature_c));
        let refraction_arcmin = self.refraction(apparent_altitude_deg) * scale;

        Ok(AtmosphericCorrection {
            apparent_altitude_deg,
            true_altitude_deg: apparent_altitude_deg - refraction_arcmin / 60.0,
            refraction_arcmin,
            airmass: self.airmass(apparent_altitude_deg),
            extinction_mag: self.extinction(apparent_altitude_deg),
            note: correction_note(apparent_altitude_deg, conditions.humidity_percent),
        })
    }
}

fn correction_note(altitude_deg: f64, humidity_percent: f64) -> String {
    let band = if altitude_deg <= 0.0 {
        "Below the horizon: not observable"
    } else if altitude_deg < 10.0 {
        "Very low: strong refraction and heavy extinction, expect color shift and softness"
    } else if altitude_deg < 30.0 {
        "Low: noticeable extinction, wait for the target to climb if possible"
    } else {
        "Good altitude: atmospheric effects are minor"
    };
    if humidity_percent >= 80.0 && altitude_deg > 0.0 {
        format!("{}. High humidity adds haze and dew risk", band)
    } else {
        band.to_string()
    }
}
