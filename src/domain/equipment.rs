/// Camera, lens and target descriptors used by the equipment matcher
use serde::{Deserialize, Serialize};
use std::fmt;

/// Full-frame sensor area, 36 × 24 mm.
pub const FULL_FRAME_AREA_MM2: f64 = 36.0 * 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AstroTarget {
    MilkyWayCore,
    Moon,
    Planets,
    DeepSkyObjects,
    StarTrails,
    MeteorShower,
    Constellations,
    NorthernLights,
}

impl AstroTarget {
    pub const ALL: [AstroTarget; 8] = [
        AstroTarget::MilkyWayCore,
        AstroTarget::Moon,
        AstroTarget::Planets,
        AstroTarget::DeepSkyObjects,
        AstroTarget::StarTrails,
        AstroTarget::MeteorShower,
        AstroTarget::Constellations,
        AstroTarget::NorthernLights,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AstroTarget::MilkyWayCore => "Milky Way Core",
            AstroTarget::Moon => "Moon",
            AstroTarget::Planets => "Planets",
            AstroTarget::DeepSkyObjects => "Deep Sky Objects",
            AstroTarget::StarTrails => "Star Trails",
            AstroTarget::MeteorShower => "Meteor Shower",
            AstroTarget::Constellations => "Constellations",
            AstroTarget::NorthernLights => "Northern Lights",
        }
    }

    pub fn optimal_equipment(self) -> OptimalEquipmentSpec {
        let spec = |min, max, optimal, aperture, min_iso, max_iso, tracking| OptimalEquipmentSpec {
            min_focal_length: min,
            max_focal_length: max,
            optimal_focal_length: optimal,
            max_aperture: aperture,
            min_iso,
            max_iso,
            tracking,
            tripod: true,
        };
        match self {
            AstroTarget::MilkyWayCore => spec(14.0, 35.0, 24.0, 2.8, 1600, 6400, false),
            AstroTarget::Moon => spec(200.0, 800.0, 400.0, 8.0, 100, 800, false),
            AstroTarget::Planets => spec(300.0, 2000.0, 600.0, 6.3, 100, 1600, true),
            AstroTarget::DeepSkyObjects => spec(135.0, 600.0, 300.0, 5.6, 800, 3200, true),
            AstroTarget::StarTrails => spec(14.0, 50.0, 24.0, 4.0, 200, 1600, false),
            AstroTarget::MeteorShower => spec(14.0, 24.0, 16.0, 2.8, 1600, 6400, false),
            AstroTarget::Constellations => spec(24.0, 85.0, 50.0, 2.8, 800, 3200, false),
            AstroTarget::NorthernLights => spec(14.0, 24.0, 18.0, 2.8, 800, 3200, false),
        }
    }
}

impl fmt::Display for AstroTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optical requirements for photographing a target.
///
/// `max_aperture` is the slowest acceptable f-number: a lens qualifies when
/// its own maximum aperture f-number is at or below it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimalEquipmentSpec {
    pub min_focal_length: f64,
    pub max_focal_length: f64,
    pub optimal_focal_length: f64,
    pub max_aperture: f64,
    pub min_iso: u32,
    pub max_iso: u32,
    pub tracking: bool,
    pub tripod: bool,
}

impl OptimalEquipmentSpec {
    pub fn focal_range_mm(&self) -> f64 {
        self.max_focal_length - self.min_focal_length
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensDescriptor {
    pub id: i64,
    pub min_mm: f64,
    /// `None` for prime lenses
    #[serde(default)]
    pub max_mm: Option<f64>,
    pub max_f_stop: f64,
    pub is_prime: bool,
    #[serde(default)]
    pub is_user_created: bool,
}

impl LensDescriptor {
    pub fn prime(id: i64, focal_mm: f64, max_f_stop: f64) -> Self {
        Self {
            id,
            min_mm: focal_mm,
            max_mm: None,
            max_f_stop,
            is_prime: true,
            is_user_created: false,
        }
    }

    pub fn zoom(id: i64, min_mm: f64, max_mm: f64, max_f_stop: f64) -> Self {
        Self {
            id,
            min_mm,
            max_mm: Some(max_mm),
            max_f_stop,
            is_prime: false,
            is_user_created: false,
        }
    }

    /// Longest focal length; equals `min_mm` for primes.
    pub fn long_end_mm(&self) -> f64 {
        self.max_mm.unwrap_or(self.min_mm)
    }

    pub fn label(&self) -> String {
        match self.max_mm {
            Some(max) if !self.is_prime => format!("{}-{}mm f/{}", self.min_mm, max, self.max_f_stop),
            _ => format!("{}mm f/{}", self.min_mm, self.max_f_stop),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDescriptor {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub sensor_width_mm: f64,
    pub sensor_height_mm: f64,
    #[serde(default)]
    pub is_user_created: bool,
}

impl CameraDescriptor {
    pub fn sensor_area_mm2(&self) -> f64 {
        self.sensor_width_mm * self.sensor_height_mm
    }
}

/// A lens mounts on a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompatibilityEdge {
    pub camera_id: i64,
    pub lens_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraLensCombination {
    pub camera: CameraDescriptor,
    pub lens: LensDescriptor,
    pub match_score: f64,
    pub is_optimal: bool,
    pub strengths: Vec<String>,
    pub limitations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EquipmentMatch {
    pub recommended: Vec<CameraLensCombination>,
    pub alternative: Vec<CameraLensCombination>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EquipmentRecommendation {
    pub target: AstroTarget,
    pub target_name: &'static str,
    pub spec: OptimalEquipmentSpec,
    pub note: &'static str,
    pub recommended: Vec<CameraLensCombination>,
    pub alternative: Vec<CameraLensCombination>,
}

/// User inventory as loaded from the equipment file or the inventory endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentInventory {
    #[serde(default)]
    pub cameras: Vec<CameraDescriptor>,
    #[serde(default)]
    pub lenses: Vec<LensDescriptor>,
    #[serde(default)]
    pub compatibility: Vec<CompatibilityEdge>,
}
