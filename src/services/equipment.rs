/// Scores camera and lens pairs against a target's optimal equipment
use crate::domain::{
    AstroTarget, CameraDescriptor, CameraLensCombination, CompatibilityEdge, EquipmentMatch,
    LensDescriptor, OptimalEquipmentSpec, FULL_FRAME_AREA_MM2,
};
use std::collections::HashSet;

const FOCAL_WEIGHT: f64 = 0.4;
const APERTURE_WEIGHT: f64 = 0.3;
const SENSOR_WEIGHT: f64 = 0.2;
const USER_CREATED_WEIGHT: f64 = 0.05;

pub const RECOMMENDED_SCORE: f64 = 70.0;
pub const ALTERNATIVE_SCORE: f64 = 40.0;
pub const OPTIMAL_SCORE: f64 = 85.0;

/// Prime: closeness to the optimal focal length over half the target range.
/// Zoom: share of the target range the lens covers.
pub fn focal_score(lens: &LensDescriptor, spec: &OptimalEquipmentSpec) -> f64 {
    let range = spec.focal_range_mm();
    if lens.is_prime {
        let half_range = range / 2.0;
        if half_range <= 0.0 {
            return if lens.min_mm == spec.optimal_focal_length { 1.0 } else { 0.0 };
        }
        (1.0 - (lens.min_mm - spec.optimal_focal_length).abs() / half_range).max(0.0)
    } else {
        let overlap = lens.long_end_mm().min(spec.max_focal_length) - lens.min_mm.max(spec.min_focal_length);
        if range <= 0.0 {
            return if overlap >= 0.0 { 1.0 } else { 0.0 };
        }
        (overlap / range).clamp(0.0, 1.0)
    }
}

pub fn aperture_score(lens: &LensDescriptor, spec: &OptimalEquipmentSpec) -> f64 {
    if lens.max_f_stop <= spec.max_aperture {
        1.0
    } else {
        let deficit = lens.max_f_stop - spec.max_aperture;
        (1.0 - deficit / 2.0).max(0.0)
    }
}

pub fn sensor_score(camera: &CameraDescriptor) -> f64 {
    (camera.sensor_area_mm2() / FULL_FRAME_AREA_MM2).clamp(0.0, 1.0)
}

pub fn match_score(camera: &CameraDescriptor, lens: &LensDescriptor, spec: &OptimalEquipmentSpec) -> f64 {
    let user_bonus = if camera.is_user_created { 1.0 } else { 0.0 };
    let raw = FOCAL_WEIGHT * focal_score(lens, spec)
        + APERTURE_WEIGHT * aperture_score(lens, spec)
        + SENSOR_WEIGHT * sensor_score(camera)
        + USER_CREATED_WEIGHT * user_bonus;
    (100.0 * raw).clamp(0.0, 100.0)
}

/// Whether a lens can be used for the target at all.
pub fn lens_fits(lens: &LensDescriptor, spec: &OptimalEquipmentSpec) -> bool {
    let focal_ok = if lens.is_prime {
        (spec.min_focal_length..=spec.max_focal_length).contains(&lens.min_mm)
    } else {
        lens.min_mm <= spec.max_focal_length && lens.long_end_mm() >= spec.min_focal_length
    };
    focal_ok && lens.max_f_stop <= spec.max_aperture
}

fn describe(
    camera: &CameraDescriptor,
    lens: &LensDescriptor,
    spec: &OptimalEquipmentSpec,
) -> (Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    let mut limitations = Vec::new();

    if aperture_score(lens, spec) >= 1.0 {
        strengths.push(format!(
            "f/{} meets the f/{} aperture target",
            lens.max_f_stop, spec.max_aperture
        ));
    } else {
        limitations.push(format!(
            "f/{} is slower than the f/{} target",
            lens.max_f_stop, spec.max_aperture
        ));
    }

    let focal = focal_score(lens, spec);
    if lens.is_prime && focal >= 0.8 {
        strengths.push(format!(
            "{}mm is close to the optimal {}mm",
            lens.min_mm, spec.optimal_focal_length
        ));
    } else if !lens.is_prime && focal >= 0.8 {
        strengths.push(format!(
            "{} covers most of the {}-{}mm range",
            lens.label(),
            spec.min_focal_length,
            spec.max_focal_length
        ));
    } else if lens.is_prime {
        limitations.push(format!(
            "{}mm is far from the optimal {}mm",
            lens.min_mm, spec.optimal_focal_length
        ));
    } else {
        limitations.push(format!(
            "{} covers only part of the {}-{}mm range",
            lens.label(),
            spec.min_focal_length,
            spec.max_focal_length
        ));
    }

    let sensor = sensor_score(camera);
    if sensor >= 1.0 {
        strengths.push("Full-frame sensor gathers the most light".to_string());
    } else if sensor >= 0.4 {
        limitations.push(format!(
            "Crop sensor ({:.0}% of full frame) adds noise at high ISO",
            sensor * 100.0
        ));
    } else {
        limitations.push(format!("Small sensor ({:.0}% of full frame)", sensor * 100.0));
    }

    (strengths, limitations)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EquipmentMatchingEngine;

impl EquipmentMatchingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score every compatible (camera, lens) pair and split the results into
    /// recommended and alternative tiers, best first.
    pub fn match_equipment(
        &self,
        target: AstroTarget,
        cameras: &[CameraDescriptor],
        lenses: &[LensDescriptor],
        compatibility: &[CompatibilityEdge],
    ) -> EquipmentMatch {
        let spec = target.optimal_equipment();
        let edges: HashSet<CompatibilityEdge> = compatibility.iter().copied().collect();
        let mut result = EquipmentMatch::default();

        for lens in lenses.iter().filter(|l| lens_fits(l, &spec)) {
            for camera in cameras {
                if !edges.contains(&CompatibilityEdge {
                    camera_id: camera.id,
                    lens_id: lens.id,
                }) {
                    continue;
                }

                let match_score = match_score(camera, lens, &spec);
                if match_score < ALTERNATIVE_SCORE {
                    continue;
                }
                let (strengths, limitations) = describe(camera, lens, &spec);
                let combo = CameraLensCombination {
                    camera: camera.clone(),
                    lens: lens.clone(),
                    match_score,
                    is_optimal: match_score >= OPTIMAL_SCORE,
                    strengths,
                    limitations,
                };
                if match_score >= RECOMMENDED_SCORE {
                    result.recommended.push(combo);
                } else {
                    result.alternative.push(combo);
                }
            }
        }

        let by_score = |a: &CameraLensCombination, b: &CameraLensCombination| {
            b.match_score
                .total_cmp(&a.match_score)
                .then(a.camera.id.cmp(&b.camera.id))
                .then(a.lens.id.cmp(&b.lens.id))
        };
        result.recommended.sort_by(by_score);
        result.alternative.sort_by(by_score);
        result
    }
}
