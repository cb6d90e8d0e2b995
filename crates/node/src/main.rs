mod sim;

use std::{env, time::Duration};

use anyhow::Result;
use serde::Serialize;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use sim::{ClimateSim, Scenario};

/// Upload body for POST /data. Fields the node does not measure are
/// omitted entirely, the way firmware with a missing sensor behaves.
#[derive(Debug, Serialize)]
struct Upload {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    motion: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Env config ──────────────────────────────────────────────────
    let hub = env::var("HUB_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
    let sample_every_s: u64 = env::var("SAMPLE_EVERY_S")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(300);
    let scenario = Scenario::from_str_lossy(&env::var("SIM_SCENARIO").unwrap_or_default());
    let send_motion = env::var("SEND_MOTION")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let diurnal_period_s: f64 = env::var("DIURNAL_PERIOD_S")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(600.0);

    let client = reqwest::Client::new();
    let mut sim = ClimateSim::new(scenario, diurnal_period_s);

    tracing::info!(%hub, %scenario, sample_every_s, send_motion, "node started");

    loop {
        let sample = sim.sample();
        let upload = Upload {
            temperature: Some(sample.temperature),
            humidity: Some(sample.humidity),
            motion: send_motion.then_some(sample.motion),
        };

        match client.post(format!("{hub}/data")).json(&upload).send().await {
            Ok(res) if res.status().is_success() => {
                tracing::info!(
                    temperature = sample.temperature,
                    humidity = sample.humidity,
                    "reading uploaded"
                );
            }
            Ok(res) => tracing::warn!(status = %res.status(), "hub rejected reading"),
            Err(e) => tracing::warn!(error = %e, "upload failed, will try again next tick"),
        }

        // Real firmware polls its control flag on the same cadence.
        match client.get(format!("{hub}/led_status")).send().await {
            Ok(res) => {
                if let Ok(body) = res.json::<serde_json::Value>().await {
                    let led = body.get("status").and_then(|v| v.as_bool()).unwrap_or(false);
                    tracing::debug!(led, "led flag polled");
                }
            }
            Err(e) => tracing::debug!(error = %e, "led poll failed"),
        }

        sleep(Duration::from_secs(sample_every_s)).await;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
