//! Stateful climate simulator for local development, standing in for an
//! ESP32 with a DHT22 and a PIR sensor.
//!
//! Models believable sensor behaviour:
//! - Temporal coherence via random walk with mean reversion
//! - Diurnal (day/night) temperature cycle
//! - Humidity anti-correlated with temperature
//! - Per-reading electronic noise
//! - Occasional spikes (sensor flakiness)
//! - Random motion events

use std::fmt;

// ---------------------------------------------------------------------------
// Gaussian approximation (no extra dependency)
// ---------------------------------------------------------------------------

/// Approximate a sample from N(0,1) using the Irwin-Hall method:
/// sum of 12 uniform [0,1) values minus 6.
fn approx_std_normal() -> f64 {
    let mut sum: f64 = 0.0;
    for _ in 0..12 {
        sum += fastrand::f64();
    }
    sum - 6.0
}

/// Sample from N(mean, sigma).
fn gaussian(mean: f64, sigma: f64) -> f64 {
    mean + sigma * approx_std_normal()
}

// ---------------------------------------------------------------------------
// Scenario presets
// ---------------------------------------------------------------------------

/// Pre-configured simulation profiles selectable via `SIM_SCENARIO` env var.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Room climate around 22 °C / 45 %. Low noise, rare motion.
    Mild,
    /// Hot and dry, slow upward drift. Exercises the high end of the
    /// dashboard charts.
    Heatwave,
    /// Warm and very humid, humidity pinned near the top of its range.
    Muggy,
    /// High noise sigma, ~10% spike rate, frequent motion. Tests that the
    /// hub stores whatever the sensor produces without flinching.
    Flaky,
}

impl Scenario {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "heatwave" => Self::Heatwave,
            "muggy" => Self::Muggy,
            "flaky" => Self::Flaky,
            _ => Self::Mild, // default
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mild => write!(f, "mild"),
            Self::Heatwave => write!(f, "heatwave"),
            Self::Muggy => write!(f, "muggy"),
            Self::Flaky => write!(f, "flaky"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample type
// ---------------------------------------------------------------------------

/// One simulated sensor sweep, rounded to the precision a DHT22 reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub temperature: f64,
    pub humidity: f64,
    pub motion: bool,
}

// ---------------------------------------------------------------------------
// Main simulator
// ---------------------------------------------------------------------------

/// Stateful simulator producing temperature/humidity/motion samples.
pub struct ClimateSim {
    /// Current "true" air temperature in °C. Evolves each tick.
    temperature: f64,

    // Random walk parameters
    center_temp: f64,
    walk_sigma: f64,
    mean_reversion: f64,

    // Humidity model: base level minus a slope per degree above center.
    center_humidity: f64,
    humidity_slope: f64,

    // Per-reading noise and spikes
    noise_sigma: f64,
    spike_prob: f32,
    spike_sigma: f64,

    // Diurnal cycle
    diurnal_amplitude: f64,
    diurnal_period_s: f64,

    // Motion events
    motion_prob: f32,
}

impl ClimateSim {
    /// Create a simulator for the given scenario. `diurnal_period_s`
    /// controls the day/night cycle length; use 600 (10 min) for fast dev
    /// iteration or 86400 for real-time.
    pub fn new(scenario: Scenario, diurnal_period_s: f64) -> Self {
        let (center_temp, center_hum, walk_sigma, noise_sigma, spike_prob, motion_prob) =
            match scenario {
                Scenario::Mild => (22.0, 45.0, 0.15, 0.1, 0.005_f32, 0.05_f32),
                Scenario::Heatwave => (36.0, 20.0, 0.25, 0.15, 0.01, 0.03),
                Scenario::Muggy => (28.0, 85.0, 0.2, 0.15, 0.01, 0.08),
                Scenario::Flaky => (22.0, 50.0, 0.6, 1.0, 0.10, 0.20),
            };

        Self {
            temperature: gaussian(center_temp, 1.0),
            center_temp,
            walk_sigma,
            mean_reversion: 0.03,
            center_humidity: center_hum,
            humidity_slope: 2.5,
            noise_sigma,
            spike_prob,
            spike_sigma: 8.0,
            diurnal_amplitude: 3.0,
            diurnal_period_s,
            motion_prob,
        }
    }

    /// Produce the next sensor sweep. The internal temperature evolves with
    /// each call, so call frequency matters.
    pub fn sample(&mut self) -> ClimateSample {
        // -- Evolve the base temperature ----------------------------------

        let pull = self.mean_reversion * (self.center_temp - self.temperature);
        let walk = gaussian(0.0, self.walk_sigma);
        self.temperature =
            (self.temperature + pull + walk).clamp(self.center_temp - 15.0, self.center_temp + 15.0);

        // -- Build the instantaneous readings -----------------------------

        // Diurnal offset: sinusoidal, peaks at "afternoon" (period/2).
        let now_s = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        let phase = 2.0 * std::f64::consts::PI * now_s / self.diurnal_period_s;
        let diurnal = self.diurnal_amplitude * phase.sin();

        let spike = if fastrand::f32() < self.spike_prob {
            gaussian(0.0, self.spike_sigma)
        } else {
            0.0
        };

        let temperature = self.temperature + diurnal + gaussian(0.0, self.noise_sigma) + spike;

        // Warmer air reads drier; the slope keeps the two channels visibly
        // anti-correlated on the dashboard.
        let humidity = self.center_humidity
            - self.humidity_slope * (temperature - self.center_temp)
            + gaussian(0.0, self.noise_sigma * 4.0);

        let motion = fastrand::f32() < self.motion_prob;

        ClimateSample {
            temperature: round1(temperature.clamp(-20.0, 60.0)),
            humidity: round1(humidity.clamp(0.0, 100.0)),
            motion,
        }
    }
}

/// Round to one decimal place, the resolution of the emulated sensor.
fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_samples(sim: &mut ClimateSim, n: usize) -> Vec<ClimateSample> {
        (0..n).map(|_| sim.sample()).collect()
    }

    #[test]
    fn readings_stay_within_physical_ranges() {
        for scenario in [
            Scenario::Mild,
            Scenario::Heatwave,
            Scenario::Muggy,
            Scenario::Flaky,
        ] {
            let mut sim = ClimateSim::new(scenario, 600.0);
            for s in collect_samples(&mut sim, 500) {
                assert!((-20.0..=60.0).contains(&s.temperature), "temp: {s:?}");
                assert!((0.0..=100.0).contains(&s.humidity), "humidity: {s:?}");
            }
        }
    }

    #[test]
    fn readings_have_one_decimal() {
        let mut sim = ClimateSim::new(Scenario::Mild, 600.0);
        for s in collect_samples(&mut sim, 50) {
            assert_eq!(s.temperature, round1(s.temperature));
            assert_eq!(s.humidity, round1(s.humidity));
        }
    }

    #[test]
    fn temporal_coherence() {
        // Consecutive mild readings should stay close; allow headroom for
        // the rare spike.
        let mut sim = ClimateSim::new(Scenario::Mild, 600.0);
        let samples = collect_samples(&mut sim, 100);
        let max_jump = samples
            .windows(2)
            .map(|w| (w[1].temperature - w[0].temperature).abs())
            .fold(0.0_f64, f64::max);
        assert!(max_jump < 30.0, "max consecutive jump too large: {max_jump}");
    }

    #[test]
    fn heatwave_is_hotter_than_mild() {
        fn mean_temp(scenario: Scenario) -> f64 {
            let mut sim = ClimateSim::new(scenario, 600.0);
            collect_samples(&mut sim, 200)
                .iter()
                .map(|s| s.temperature)
                .sum::<f64>()
                / 200.0
        }

        assert!(mean_temp(Scenario::Heatwave) > mean_temp(Scenario::Mild) + 5.0);
    }

    #[test]
    fn muggy_is_more_humid_than_heatwave() {
        fn mean_humidity(scenario: Scenario) -> f64 {
            let mut sim = ClimateSim::new(scenario, 600.0);
            collect_samples(&mut sim, 200)
                .iter()
                .map(|s| s.humidity)
                .sum::<f64>()
                / 200.0
        }

        assert!(mean_humidity(Scenario::Muggy) > mean_humidity(Scenario::Heatwave) + 20.0);
    }

    #[test]
    fn flaky_scenario_has_more_variation() {
        fn temp_variance(scenario: Scenario) -> f64 {
            let mut sim = ClimateSim::new(scenario, 600.0);
            let samples = collect_samples(&mut sim, 300);
            let mean = samples.iter().map(|s| s.temperature).sum::<f64>() / 300.0;
            samples
                .iter()
                .map(|s| (s.temperature - mean).powi(2))
                .sum::<f64>()
                / 300.0
        }

        assert!(temp_variance(Scenario::Flaky) > temp_variance(Scenario::Mild));
    }

    #[test]
    fn flaky_scenario_produces_both_motion_values() {
        let mut sim = ClimateSim::new(Scenario::Flaky, 600.0);
        let samples = collect_samples(&mut sim, 1000);
        assert!(samples.iter().any(|s| s.motion));
        assert!(samples.iter().any(|s| !s.motion));
    }

    #[test]
    fn scenario_from_str_lossy() {
        assert_eq!(Scenario::from_str_lossy("mild"), Scenario::Mild);
        assert_eq!(Scenario::from_str_lossy("HEATWAVE"), Scenario::Heatwave);
        assert_eq!(Scenario::from_str_lossy("Muggy"), Scenario::Muggy);
        assert_eq!(Scenario::from_str_lossy("flaky"), Scenario::Flaky);
        assert_eq!(Scenario::from_str_lossy("unknown"), Scenario::Mild);
        assert_eq!(Scenario::from_str_lossy(""), Scenario::Mild);
    }

    #[test]
    fn scenario_display() {
        assert_eq!(Scenario::Mild.to_string(), "mild");
        assert_eq!(Scenario::Heatwave.to_string(), "heatwave");
        assert_eq!(Scenario::Muggy.to_string(), "muggy");
        assert_eq!(Scenario::Flaky.to_string(), "flaky");
    }

    #[test]
    fn approx_std_normal_has_zero_mean() {
        let n = 5000;
        let sum: f64 = (0..n).map(|_| approx_std_normal()).sum();
        let mean = sum / n as f64;
        assert!(
            mean.abs() < 0.15,
            "approx_std_normal mean should be near zero: {mean}"
        );
    }
}
