/// Photography guidance, one table per target type
use crate::domain::{AstroTarget, MoonPhotography, Planet};

struct MoonBand {
    max_fraction: f64,
    optimal_shooting_phase: &'static str,
    visible_features: &'static [&'static str],
    exposure_guidance: &'static str,
    brightness: &'static str,
}

const MOON_BANDS: &[MoonBand] = &[
    MoonBand {
        max_fraction: 0.10,
        optimal_shooting_phase: "Dark sky: ideal for Milky Way and deep-sky work; thin crescent near the horizon at twilight",
        visible_features: &["Earthshine on the unlit disk", "Thin sunlit limb"],
        exposure_guidance: "ISO 800-1600, f/5.6, 1-2s for earthshine; bracket for the limb",
        brightness: "Dark",
    },
    MoonBand {
        max_fraction: 0.40,
        optimal_shooting_phase: "Crescent: long terminator shadows, good with foreground at dusk or dawn",
        visible_features: &["Mare Crisium", "Terminator craters", "Earthshine"],
        exposure_guidance: "ISO 400, f/5.6, 1/60s",
        brightness: "Dim",
    },
    MoonBand {
        max_fraction: 0.60,
        optimal_shooting_phase: "Quarter: best relief along the terminator",
        visible_features: &["Terminator craters", "Montes Apenninus", "Mare Serenitatis", "Copernicus"],
        exposure_guidance: "ISO 200, f/8, 1/125s",
        brightness: "Moderate",
    },
    MoonBand {
        max_fraction: 0.90,
        optimal_shooting_phase: "Gibbous: bright disk with surviving relief near the terminator",
        visible_features: &["Mare Imbrium", "Copernicus", "Tycho ray system"],
        exposure_guidance: "ISO 100, f/8, 1/250s",
        brightness: "Bright",
    },
    MoonBand {
        max_fraction: f64::INFINITY,
        optimal_shooting_phase: "Full: flat lighting, shoot at moonrise for landscape compositions",
        visible_features: &["Tycho ray system", "Maria outlines", "Aristarchus"],
        exposure_guidance: "ISO 100, f/11, 1/250s",
        brightness: "Very bright",
    },
];

pub fn moon_photography(illuminated_fraction: f64) -> MoonPhotography {
    let band = MOON_BANDS
        .iter()
        .find(|b| illuminated_fraction < b.max_fraction)
        .unwrap_or(&MOON_BANDS[MOON_BANDS.len() - 1]);
    MoonPhotography {
        optimal_shooting_phase: band.optimal_shooting_phase,
        visible_features: band.visible_features.to_vec(),
        exposure_guidance: band.exposure_guidance,
        brightness: band.brightness,
    }
}

/// Detail a planet shows at its current apparent size and phase.
pub fn planet_photography_note(planet: Planet, angular_diameter_arcsec: f64, phase_fraction: f64) -> String {
    let detail = match planet {
        Planet::Mercury => "Shoot in bright twilight close to the horizon; expect a point of light",
        Planet::Venus if phase_fraction < 0.5 => "Crescent phase resolvable with a long telephoto",
        Planet::Venus => "Gibbous disk; very bright, keep exposures short",
        Planet::Earth => "Not observable from Earth",
        Planet::Mars if angular_diameter_arcsec >= 15.0 => "Near opposition: polar cap and dark markings within reach",
        Planet::Mars => "Small disk: shows color but little surface detail",
        Planet::Jupiter => "Galilean moons visible from 200mm; cloud belts need 1000mm or more",
        Planet::Saturn => "Rings resolvable from about 400mm; Titan visible nearby",
        Planet::Uranus | Planet::Neptune => "Star-like; use a star chart and a tracked long exposure",
    };
    let size = if angular_diameter_arcsec < 10.0 {
        "tiny disk"
    } else if angular_diameter_arcsec < 30.0 {
        "small disk"
    } else {
        "large disk"
    };
    format!("{} ({:.1}\", {})", detail, angular_diameter_arcsec, size)
}

/// Focal length guidance by apparent size.
pub fn planet_equipment_note(angular_diameter_arcsec: f64) -> &'static str {
    if angular_diameter_arcsec < 10.0 {
        "Telescope at 2000mm or more for any disk detail"
    } else if angular_diameter_arcsec < 30.0 {
        "Long telephoto 600mm+ or a small telescope"
    } else {
        "300mm+ shows the disk; 1000mm+ for surface detail"
    }
}

pub fn target_note(target: AstroTarget) -> &'static str {
    match target {
        AstroTarget::MilkyWayCore => "Fast wide-angle lens, sturdy tripod, 15-25s exposures under dark skies",
        AstroTarget::Moon => "Telephoto on a tripod, low ISO, fast shutter; the Moon is sunlit",
        AstroTarget::Planets => "Longest focal length available, tracking mount, video stacking",
        AstroTarget::DeepSkyObjects => "Telephoto on a tracking mount, many stacked sub-exposures",
        AstroTarget::StarTrails => "Wide lens, intervalometer, stacked 30s frames over an hour or more",
        AstroTarget::MeteorShower => "Widest fast lens aimed 45 degrees from the radiant, continuous shooting",
        AstroTarget::Constellations => "Normal lens, short exposures, optional diffusion filter",
        AstroTarget::NorthernLights => "Fast ultra-wide lens, 2-10s exposures to keep structure",
    }
}
