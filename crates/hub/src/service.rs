//! Orchestration layer between the HTTP surface and the two stores. Owns
//! the clock and one writer lock per store; every operation is a single
//! synchronous attempt with no retries.

use tokio::sync::Mutex;

use serde::Deserialize;

use crate::clock::Clock;
use crate::device::{DeviceState, StateStore};
use crate::store::{Reading, ReadingStore, StoreError};

/// Inbound sensor payload. Every field is optional: firmware revisions
/// differ in which sensors they carry, and a missing sensor must not fail
/// the upload.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct IngestPayload {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub motion: Option<bool>,
}

pub struct Service {
    clock: Clock,
    readings: Mutex<Box<dyn ReadingStore>>,
    device: Mutex<Box<dyn StateStore>>,
}

impl Service {
    pub fn new(clock: Clock, readings: Box<dyn ReadingStore>, device: Box<dyn StateStore>) -> Self {
        Self {
            clock,
            readings: Mutex::new(readings),
            device: Mutex::new(device),
        }
    }

    /// Stamp an inbound payload with the local wall clock and append it to
    /// the log. Succeeds unless the store itself fails.
    pub async fn ingest(&self, payload: IngestPayload) -> Result<Reading, StoreError> {
        let ts = self.clock.now();
        let reading = Reading {
            date: ts.date,
            time: ts.time,
            temperature: payload.temperature,
            humidity: payload.humidity,
            motion: payload.motion,
        };
        self.readings.lock().await.append(&reading)?;
        tracing::info!(
            date = %reading.date,
            time = %reading.time,
            temperature = ?reading.temperature,
            humidity = ?reading.humidity,
            "reading saved"
        );
        Ok(reading)
    }

    /// Full history dump, oldest first. Consumers wanting "latest N" slice
    /// and reverse on their side.
    pub async fn history(&self) -> Result<Vec<Reading>, StoreError> {
        self.readings.lock().await.list_all()
    }

    /// Destructive: drops every reading, keeping only the log header.
    pub async fn clear_history(&self) -> Result<(), StoreError> {
        self.readings.lock().await.reset()?;
        tracing::info!("readings log cleared");
        Ok(())
    }

    pub async fn device_state(&self) -> Result<DeviceState, StoreError> {
        self.device.lock().await.get()
    }

    pub async fn set_led(&self, on: bool) -> Result<DeviceState, StoreError> {
        let mut device = self.device.lock().await;
        let mut state = device.get()?;
        state.led_on = on;
        device.set(state)
    }

    pub async fn toggle_led(&self) -> Result<DeviceState, StoreError> {
        let mut device = self.device.lock().await;
        let mut state = device.get()?;
        state.led_on = !state.led_on;
        device.set(state)
    }

    pub async fn set_motion_monitoring(&self, on: bool) -> Result<DeviceState, StoreError> {
        let mut device = self.device.lock().await;
        let mut state = device.get()?;
        state.motion_monitoring = on;
        device.set(state)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
