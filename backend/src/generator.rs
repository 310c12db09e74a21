//! Synthetic sensor reading generator
//!
//! Produces realistic readings on a fixed interval via a bounded random
//! walk from the previous reading, with an occasional spike, and publishes
//! them on the reading transport. The walk is the only mutable state shared
//! across ticks; readings leave here by value.

use chrono::Utc;
use rand::Rng;
use shared::{SensorReading, SoilParameter};
use tokio::task::JoinHandle;

use crate::config::GeneratorConfig;
use crate::transport::{ReadingBus, ReadingMessage};

/// Default reading the walk starts from when no history exists.
pub const BASE_READING: SensorReading = SensorReading {
    nitrogen: 22.0,
    phosphorus: 18.0,
    potassium: 150.0,
    co2: 500.0,
    temperature: 22.0,
    moisture: 55.0,
    ph: 7.2,
};

/// Chance of replacing the walk step with a spike on any parameter.
const SPIKE_PROBABILITY: f64 = 0.05;

/// Per-tick walk bounds, simulating natural fluctuation.
fn variation(param: SoilParameter) -> f64 {
    match param {
        SoilParameter::Nitrogen => 2.0,
        SoilParameter::Phosphorus => 1.0,
        SoilParameter::Potassium => 10.0,
        SoilParameter::Co2 => 50.0,
        SoilParameter::Temperature => 2.0,
        SoilParameter::Moisture => 5.0,
        SoilParameter::Ph => 0.3,
    }
}

/// Hard clamp applied after each step so the walk cannot drift into
/// physically impossible territory.
fn clamp_bounds(param: SoilParameter) -> (f64, f64) {
    match param {
        SoilParameter::Nitrogen | SoilParameter::Phosphorus => (0.0, 500.0),
        SoilParameter::Potassium => (0.0, 1000.0),
        SoilParameter::Co2 => (300.0, 1000.0),
        SoilParameter::Temperature => (5.0, 35.0),
        SoilParameter::Moisture => (20.0, 80.0),
        SoilParameter::Ph => (4.0, 9.0),
    }
}

/// Bounded random walk over sensor parameters.
#[derive(Debug, Clone)]
pub struct SensorGenerator {
    last: SensorReading,
}

impl SensorGenerator {
    pub fn new(base: SensorReading) -> Self {
        Self { last: base }
    }

    pub fn last_reading(&self) -> &SensorReading {
        &self.last
    }

    /// Advance the walk one step and return the new reading.
    pub fn next_reading(&mut self, rng: &mut impl Rng) -> SensorReading {
        let mut next = self.last;

        for param in SoilParameter::ALL {
            let current = next.value(param);
            let step = variation(param);
            let mut value = current + rng.gen_range(-step..=step);

            if rng.gen_bool(SPIKE_PROBABILITY) {
                value = current + rng.gen_range(-30.0..=30.0);
            }

            let (min, max) = clamp_bounds(param);
            set_value(&mut next, param, value.clamp(min, max));
        }

        self.last = next.rounded();
        self.last
    }
}

fn set_value(reading: &mut SensorReading, param: SoilParameter, value: f64) {
    match param {
        SoilParameter::Nitrogen => reading.nitrogen = value,
        SoilParameter::Phosphorus => reading.phosphorus = value,
        SoilParameter::Potassium => reading.potassium = value,
        SoilParameter::Co2 => reading.co2 = value,
        SoilParameter::Temperature => reading.temperature = value,
        SoilParameter::Moisture => reading.moisture = value,
        SoilParameter::Ph => reading.ph = value,
    }
}

/// Run the generator loop until the transport closes.
///
/// `seed_reading` carries the most recent persisted reading so a restart
/// continues the walk instead of jumping back to the base profile.
pub fn spawn(
    config: GeneratorConfig,
    seed_reading: Option<SensorReading>,
    bus: ReadingBus,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut generator = SensorGenerator::new(seed_reading.unwrap_or(BASE_READING));
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            config.interval_secs.max(1),
        ));

        tracing::info!(
            interval_secs = config.interval_secs,
            publisher_id = %config.publisher_id,
            "Sensor data generator started"
        );

        loop {
            interval.tick().await;
            let reading = generator.next_reading(&mut rand::thread_rng());
            let message = ReadingMessage {
                timestamp: Utc::now(),
                publisher_id: config.publisher_id.clone(),
                sensor_readings: reading,
            };
            if !bus.publish(message).await {
                break;
            }
        }
    })
}
