//! Crop recommendation service
//!
//! Combines a live weather snapshot with a regional climate profile and a
//! pre-trained classifier to rank crop suggestions for a location. The
//! model, metrics report and dataset load once at startup; when any of
//! them is missing the endpoints answer with an explicit unavailable error
//! instead of crashing.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use shared::{
    builtin_crop_profiles, CropProfile, Recommendation, RegionalProfile, WeatherSnapshot,
};

use crate::config::RecommenderConfig;
use crate::error::{AppError, AppResult};
use crate::external::WeatherClient;
use crate::ml::forest::FeatureSchema;
use crate::ml::{CropModel, ModelMetrics};

/// Seed for the deterministic fallback sample when no region matches.
const FALLBACK_SAMPLE_SEED: u64 = 42;

/// How many crops a recommendation returns.
const TOP_CROPS: usize = 3;

/// Everything the recommender needs at request time, loaded once.
pub struct CropContext {
    pub model: CropModel,
    pub metrics: ModelMetrics,
    pub profiles: Vec<RegionalProfile>,
}

impl CropContext {
    pub fn load(config: &RecommenderConfig) -> anyhow::Result<Self> {
        let model = CropModel::load(Path::new(&config.model_path))?;
        let metrics = ModelMetrics::load(Path::new(&config.metrics_path))?;
        let profiles = load_regional_profiles(Path::new(&config.dataset_path))?;
        anyhow::ensure!(!profiles.is_empty(), "regional profile dataset is empty");
        Ok(Self {
            model,
            metrics,
            profiles,
        })
    }
}

/// Response for a recommendation request.
#[derive(Debug, Clone, Serialize)]
pub struct CropRecommendationResponse {
    pub location: String,
    pub weather: WeatherSnapshot,
    pub region: RegionSummary,
    pub recommendations: Vec<Recommendation>,
}

/// The regional profile a recommendation was based on.
#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub state: String,
    pub climate_zone: String,
    /// False when the location matched nothing and the fixed fallback
    /// sample was used.
    pub matched: bool,
}

/// Crop recommendation pipeline.
#[derive(Clone)]
pub struct CropService {
    weather: WeatherClient,
    context: Option<Arc<CropContext>>,
    crops: Arc<Vec<CropProfile>>,
}

impl CropService {
    pub fn new(weather: WeatherClient, context: Option<CropContext>) -> Self {
        Self {
            weather,
            context: context.map(Arc::new),
            crops: Arc::new(builtin_crop_profiles()),
        }
    }

    /// Load artifacts, degrading to an unavailable recommender on failure.
    pub fn load(config: &RecommenderConfig, weather: WeatherClient) -> Self {
        let context = match CropContext::load(config) {
            Ok(context) => {
                tracing::info!(
                    classes = context.model.classes.len(),
                    regions = context.profiles.len(),
                    accuracy = context.metrics.accuracy,
                    "Crop recommender loaded"
                );
                Some(context)
            }
            Err(e) => {
                tracing::warn!("Crop recommender unavailable: {e:#}");
                None
            }
        };
        Self::new(weather, context)
    }

    pub fn is_available(&self) -> bool {
        self.context.is_some()
    }

    /// Rank crops for a location.
    pub async fn recommend(&self, location: &str) -> AppResult<CropRecommendationResponse> {
        let context = self.context.as_ref().ok_or_else(|| {
            AppError::RecommenderUnavailable(
                "model or dataset failed to load at startup".to_string(),
            )
        })?;

        let weather = self.weather.current_by_location(location).await?;
        let (profile, matched) = select_profile(&context.profiles, location).ok_or_else(|| {
            AppError::RecommenderUnavailable("regional profile dataset is empty".to_string())
        })?;

        let features = encode_features(&context.model.features, profile, &weather)?;
        let ranked = context.model.ranked_classes(&features)?;

        let recommendations = ranked
            .iter()
            .take(TOP_CROPS)
            .map(|(class, probability)| enrich(&self.crops, class, *probability, profile))
            .collect();

        Ok(CropRecommendationResponse {
            location: location.to_string(),
            weather,
            region: RegionSummary {
                region: profile.region.clone(),
                state: profile.state.clone(),
                climate_zone: profile.climate_zone.clone(),
                matched,
            },
            recommendations,
        })
    }

    /// Static crop profile by slug; available even without the model.
    pub fn crop_details(&self, slug: &str) -> AppResult<CropProfile> {
        self.crops
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Crop '{slug}'")))
    }

}

/// Load the regional climate dataset from CSV.
pub fn load_regional_profiles(path: &Path) -> anyhow::Result<Vec<RegionalProfile>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening regional dataset {}", path.display()))?;
    let mut profiles = Vec::new();
    for row in reader.deserialize::<RegionalProfile>() {
        profiles.push(row.with_context(|| format!("parsing {}", path.display()))?);
    }
    Ok(profiles)
}

/// Pick the best-matching profile, or a fixed pseudo-random sample when
/// nothing matches. The fixed seed makes the fallback deterministic.
pub fn select_profile<'a>(
    profiles: &'a [RegionalProfile],
    location: &str,
) -> Option<(&'a RegionalProfile, bool)> {
    if let Some(profile) = profiles.iter().find(|p| p.matches_location(location)) {
        return Some((profile, true));
    }

    let mut rng = StdRng::seed_from_u64(FALLBACK_SAMPLE_SEED);
    profiles.choose(&mut rng).map(|p| (p, false))
}

/// Encode the classifier features for one profile under current weather.
///
/// Categorical fields pass through one-hot; numeric expectations are pulled
/// toward the live observation but never leave the stated window around the
/// profile value (±2 °C temperature, ±10 % humidity, ±20 % rainfall).
pub fn encode_features(
    schema: &FeatureSchema,
    profile: &RegionalProfile,
    weather: &WeatherSnapshot,
) -> AppResult<Vec<f64>> {
    schema.encode(
        |name| categorical_value(profile, name),
        |name| perturbed_numeric(profile, weather, name),
    )
}

fn categorical_value(profile: &RegionalProfile, name: &str) -> Option<String> {
    let value = match name {
        "region" => &profile.region,
        "state" => &profile.state,
        "climate_zone" => &profile.climate_zone,
        "primary_season" => &profile.primary_season,
        "monsoon_intensity" => &profile.monsoon_intensity,
        "soil_type" => &profile.soil_type,
        "irrigation" => &profile.irrigation,
        "wind_risk" => &profile.wind_risk,
        "drought_risk" => &profile.drought_risk,
        "flood_risk" => &profile.flood_risk,
        _ => return None,
    };
    Some(value.clone())
}

fn perturbed_numeric(
    profile: &RegionalProfile,
    weather: &WeatherSnapshot,
    name: &str,
) -> Option<f64> {
    match name {
        "avg_temperature_c" => Some(weather.temperature_celsius.clamp(
            profile.avg_temperature_c - 2.0,
            profile.avg_temperature_c + 2.0,
        )),
        "avg_humidity_percent" => Some(weather.humidity_percent.clamp(
            profile.avg_humidity_percent * 0.9,
            profile.avg_humidity_percent * 1.1,
        )),
        "annual_rainfall_mm" => {
            // Current precipitation nudges the annual expectation upward.
            let observed = profile.annual_rainfall_mm * (1.0 + weather.rainfall_mm / 100.0);
            Some(observed.clamp(
                profile.annual_rainfall_mm * 0.8,
                profile.annual_rainfall_mm * 1.2,
            ))
        }
        _ => None,
    }
}

/// Attach agronomic detail to a ranked class, or generate a summary when
/// the class has no profile entry.
pub fn enrich(
    crops: &[CropProfile],
    class: &str,
    probability: f64,
    region: &RegionalProfile,
) -> Recommendation {
    let suitability = (probability * 1000.0).round() / 10.0;

    match crops
        .iter()
        .find(|c| c.slug == class || c.name.eq_ignore_ascii_case(class))
    {
        Some(profile) => Recommendation {
            crop: profile.name.clone(),
            suitability,
            vernacular_name: profile.vernacular_name.clone(),
            season: profile.season.clone(),
            expected_yield: profile.expected_yield.clone(),
            management: profile.management.clone(),
        },
        None => Recommendation {
            crop: class.to_string(),
            suitability,
            vernacular_name: class.to_string(),
            season: region.primary_season.clone(),
            expected_yield: "not cataloged".to_string(),
            management: format!(
                "{class} generally suits the {} season in the {} zone; consult the local \
                 extension service for detailed guidance.",
                region.primary_season, region.climate_zone
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(region: &str, state: &str) -> RegionalProfile {
        RegionalProfile {
            region: region.to_string(),
            state: state.to_string(),
            timezone: "Asia/Kolkata".to_string(),
            climate_zone: "semi-arid".to_string(),
            primary_season: "Rabi".to_string(),
            monsoon_intensity: "moderate".to_string(),
            soil_type: "alluvial".to_string(),
            irrigation: "canal".to_string(),
            wind_risk: "low".to_string(),
            drought_risk: "moderate".to_string(),
            flood_risk: "low".to_string(),
            avg_temperature_c: 21.0,
            avg_humidity_percent: 60.0,
            annual_rainfall_mm: 700.0,
        }
    }

    fn snapshot(temp: f64, humidity: f64, rainfall: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            timestamp: Utc::now(),
            location: "Test".to_string(),
            temperature_celsius: temp,
            humidity_percent: humidity,
            rainfall_mm: rainfall,
            conditions: "clear sky".to_string(),
        }
    }

    mod profile_selection {
        use super::*;

        #[test]
        fn matches_on_state_region_and_timezone() {
            let profiles = vec![profile("north", "Punjab"), profile("south", "Karnataka")];

            let (by_state, matched) = select_profile(&profiles, "punjab").unwrap();
            assert!(matched);
            assert_eq!(by_state.state, "Punjab");

            let (by_region, _) = select_profile(&profiles, "South").unwrap();
            assert_eq!(by_region.region, "south");

            let (by_timezone, matched) = select_profile(&profiles, "Kolkata").unwrap();
            assert!(matched);
            assert_eq!(by_timezone.state, "Punjab");
        }

        #[test]
        fn fallback_sample_is_deterministic() {
            let profiles: Vec<RegionalProfile> = (0..20)
                .map(|i| profile("zone", &format!("State{i}")))
                .collect();

            let (first, matched) = select_profile(&profiles, "Atlantis").unwrap();
            assert!(!matched);
            let (second, _) = select_profile(&profiles, "Atlantis").unwrap();
            let (third, _) = select_profile(&profiles, "El Dorado").unwrap();
            assert_eq!(first, second);
            assert_eq!(first, third);
        }

        #[test]
        fn empty_dataset_yields_no_profile() {
            assert!(select_profile(&[], "anywhere").is_none());
        }
    }

    mod perturbation {
        use super::*;

        #[test]
        fn temperature_follows_weather_within_two_degrees() {
            let p = profile("north", "Punjab");
            // Observation inside the window passes through.
            assert_eq!(
                perturbed_numeric(&p, &snapshot(22.0, 60.0, 0.0), "avg_temperature_c"),
                Some(22.0)
            );
            // A heat wave is capped at the window edge.
            assert_eq!(
                perturbed_numeric(&p, &snapshot(35.0, 60.0, 0.0), "avg_temperature_c"),
                Some(23.0)
            );
            assert_eq!(
                perturbed_numeric(&p, &snapshot(5.0, 60.0, 0.0), "avg_temperature_c"),
                Some(19.0)
            );
        }

        #[test]
        fn humidity_stays_within_ten_percent_of_expectation() {
            let p = profile("north", "Punjab");
            assert_eq!(
                perturbed_numeric(&p, &snapshot(21.0, 95.0, 0.0), "avg_humidity_percent"),
                Some(66.0)
            );
            assert_eq!(
                perturbed_numeric(&p, &snapshot(21.0, 20.0, 0.0), "avg_humidity_percent"),
                Some(54.0)
            );
        }

        #[test]
        fn rainfall_stays_within_twenty_percent_of_expectation() {
            let p = profile("north", "Punjab");
            // Dry snapshot keeps the annual expectation.
            assert_eq!(
                perturbed_numeric(&p, &snapshot(21.0, 60.0, 0.0), "annual_rainfall_mm"),
                Some(700.0)
            );
            // A downpour saturates at +20 percent.
            assert_eq!(
                perturbed_numeric(&p, &snapshot(21.0, 60.0, 80.0), "annual_rainfall_mm"),
                Some(840.0)
            );
        }

        #[test]
        fn unknown_feature_names_encode_nothing() {
            let p = profile("north", "Punjab");
            assert_eq!(perturbed_numeric(&p, &snapshot(21.0, 60.0, 0.0), "wind_speed"), None);
            assert_eq!(categorical_value(&p, "altitude_band"), None);
        }
    }

    mod shipped_artifacts {
        use super::*;

        #[test]
        fn artifacts_load_and_score_every_dataset_row() {
            let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
            let model = CropModel::load(&root.join("models/crop_recommender.json")).unwrap();
            let metrics =
                ModelMetrics::load(&root.join("models/crop_recommender_metrics.json")).unwrap();
            let profiles =
                load_regional_profiles(&root.join("data/regional_profiles.csv")).unwrap();

            assert!(metrics.accuracy > 0.0);
            assert!(!profiles.is_empty());

            let weather = snapshot(24.0, 60.0, 0.0);
            for profile in &profiles {
                let features = encode_features(&model.features, profile, &weather).unwrap();
                let ranked = model.ranked_classes(&features).unwrap();
                assert_eq!(ranked.len(), model.classes.len());
                let total: f64 = ranked.iter().map(|(_, p)| p).sum();
                assert!((total - 1.0).abs() < 1e-9, "row {}", profile.state);
            }
        }

        #[test]
        fn humid_highland_regions_rank_tea_highly() {
            let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
            let model = CropModel::load(&root.join("models/crop_recommender.json")).unwrap();
            let profiles =
                load_regional_profiles(&root.join("data/regional_profiles.csv")).unwrap();

            let assam = profiles
                .iter()
                .find(|p| p.state == "Assam")
                .expect("Assam row in dataset");
            let weather = snapshot(23.0, 85.0, 4.0);
            let features = encode_features(&model.features, assam, &weather).unwrap();
            let ranked = model.ranked_classes(&features).unwrap();

            let top3: Vec<&str> = ranked.iter().take(3).map(|(c, _)| c.as_str()).collect();
            assert!(top3.contains(&"tea"), "expected tea in {top3:?}");
        }
    }

    mod enrichment {
        use super::*;
        use shared::builtin_crop_profiles;

        #[test]
        fn known_class_gets_full_profile_detail() {
            let crops = builtin_crop_profiles();
            let region = profile("north", "Punjab");
            let rec = enrich(&crops, "wheat", 0.42, &region);

            assert_eq!(rec.crop, "Wheat");
            assert_eq!(rec.vernacular_name, "Gehun");
            assert_eq!(rec.suitability, 42.0);
            assert!(!rec.management.is_empty());
        }

        #[test]
        fn unknown_class_falls_back_to_generated_summary() {
            let crops = builtin_crop_profiles();
            let region = profile("north", "Punjab");
            let rec = enrich(&crops, "quinoa", 0.1, &region);

            assert_eq!(rec.crop, "quinoa");
            assert_eq!(rec.expected_yield, "not cataloged");
            assert!(rec.management.contains("quinoa"));
            assert!(rec.management.contains("Rabi"));
        }
    }
}
