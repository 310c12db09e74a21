//! Crop recommendation models
//!
//! `RegionalProfile` rows come from the reference dataset CSV;
//! `CropProfile` is the compiled-in enrichment table keyed by crop slug.

use serde::{Deserialize, Serialize};

/// Regional climate profile, one row of the reference dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionalProfile {
    pub region: String,
    pub state: String,
    pub timezone: String,
    pub climate_zone: String,
    pub primary_season: String,
    pub monsoon_intensity: String,
    pub soil_type: String,
    pub irrigation: String,
    pub wind_risk: String,
    pub drought_risk: String,
    pub flood_risk: String,
    pub avg_temperature_c: f64,
    pub avg_humidity_percent: f64,
    pub annual_rainfall_mm: f64,
}

impl RegionalProfile {
    /// True when any of the location-bearing fields contains `needle`
    /// (case-insensitive).
    pub fn matches_location(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.state, &self.region, &self.timezone]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Static reference record describing a crop's suitability and agronomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropProfile {
    pub name: String,
    pub slug: String,
    pub vernacular_name: String,
    pub season: String,
    pub climate_zone: String,
    pub soil_type: String,
    pub risks: String,
    pub expected_yield: String,
    pub management: String,
}

/// One ranked crop suggestion; derived per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub crop: String,
    /// Suitability on a 0-100 scale, from the classifier probability.
    pub suitability: f64,
    pub vernacular_name: String,
    pub season: String,
    pub expected_yield: String,
    pub management: String,
}

/// Compiled-in crop enrichment table.
///
/// Classifier classes without an entry here fall back to a generated
/// summary at request time.
pub fn builtin_crop_profiles() -> Vec<CropProfile> {
    let profile = |name: &str,
                   slug: &str,
                   vernacular: &str,
                   season: &str,
                   climate_zone: &str,
                   soil_type: &str,
                   risks: &str,
                   expected_yield: &str,
                   management: &str| CropProfile {
        name: name.to_string(),
        slug: slug.to_string(),
        vernacular_name: vernacular.to_string(),
        season: season.to_string(),
        climate_zone: climate_zone.to_string(),
        soil_type: soil_type.to_string(),
        risks: risks.to_string(),
        expected_yield: expected_yield.to_string(),
        management: management.to_string(),
    };

    vec![
        profile(
            "Rice",
            "rice",
            "Dhan",
            "Kharif",
            "humid subtropical",
            "clayey alluvial",
            "flooding, blast disease, stem borer",
            "3.5-5.0 t/ha",
            "Transplant 25-30 day seedlings; keep 5 cm standing water through tillering; split nitrogen into three doses.",
        ),
        profile(
            "Wheat",
            "wheat",
            "Gehun",
            "Rabi",
            "semi-arid temperate",
            "loam to clay loam",
            "terminal heat stress, yellow rust",
            "3.0-4.5 t/ha",
            "Sow by mid-November; first irrigation at crown root initiation; monitor for rust after cloudy spells.",
        ),
        profile(
            "Maize",
            "maize",
            "Makka",
            "Kharif",
            "subtropical",
            "well-drained sandy loam",
            "fall armyworm, waterlogging",
            "2.5-4.0 t/ha",
            "Ridge planting improves drainage; apply potash at knee-high stage; scout whorls weekly for armyworm.",
        ),
        profile(
            "Cotton",
            "cotton",
            "Kapas",
            "Kharif",
            "semi-arid",
            "deep black regur",
            "bollworm, drought spells",
            "1.5-2.5 t/ha seed cotton",
            "Maintain 60-90 cm row spacing; install pheromone traps early; avoid late nitrogen to limit vegetative flush.",
        ),
        profile(
            "Sugarcane",
            "sugarcane",
            "Ganna",
            "Annual",
            "tropical humid",
            "deep loam, high organic matter",
            "red rot, lodging, water demand",
            "70-90 t/ha",
            "Plant three-bud setts; earth up at four months; trash mulch conserves moisture between irrigations.",
        ),
        profile(
            "Pearl Millet",
            "pearl-millet",
            "Bajra",
            "Kharif",
            "arid",
            "sandy, low fertility tolerant",
            "downy mildew, bird damage",
            "1.0-1.8 t/ha",
            "Thin to single plants at 15 days; responds well to light nitrogen; tolerates moisture stress after establishment.",
        ),
        profile(
            "Chickpea",
            "chickpea",
            "Chana",
            "Rabi",
            "semi-arid",
            "sandy loam to clay",
            "pod borer, wilt on wet soils",
            "1.2-2.0 t/ha",
            "Sow on conserved moisture; one protective irrigation at pod fill; avoid excess nitrogen, rely on nodulation.",
        ),
        profile(
            "Mustard",
            "mustard",
            "Sarson",
            "Rabi",
            "cool semi-arid",
            "light to medium loam",
            "aphids, frost at flowering",
            "1.0-1.6 t/ha",
            "Sow early October; spray for aphids when colonies reach 10 percent of plants; harvest at 75 percent pod browning.",
        ),
        profile(
            "Groundnut",
            "groundnut",
            "Moongphali",
            "Kharif",
            "tropical semi-arid",
            "well-drained sandy loam",
            "leaf spot, white grub, aflatoxin",
            "1.5-2.5 t/ha pods",
            "Gypsum at pegging improves pod fill; lift when 70 percent of pods show dark veins; dry below 9 percent moisture.",
        ),
        profile(
            "Tea",
            "tea",
            "Chai",
            "Perennial",
            "humid highland",
            "acidic, well-drained",
            "blister blight, hail damage",
            "1.8-2.5 t/ha made tea",
            "Pluck two leaves and a bud on a 7-10 day round; prune every 4-5 years; maintain shade trees in young sections.",
        ),
    ]
}
