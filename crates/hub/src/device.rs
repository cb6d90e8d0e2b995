//! Durable device-control flags: one small JSON record on disk.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Control flags the firmware polls and the dashboard toggles. Singleton,
/// last-write-wins, survives process restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    #[serde(default)]
    pub led_on: bool,
    #[serde(default)]
    pub motion_monitoring: bool,
}

/// Storage interface for the device state record. Reads always return the
/// last successfully persisted write; a never-written store reads as the
/// all-false default.
pub trait StateStore: Send {
    fn get(&self) -> Result<DeviceState, StoreError>;
    fn set(&mut self, state: DeviceState) -> Result<DeviceState, StoreError>;
}

/// File-backed state record. Writes go to a sibling temp file and are
/// renamed into place, so an interrupted write cannot leave the record
/// half-written.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

impl StateStore for FileStateStore {
    fn get(&self) -> Result<DeviceState, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(DeviceState::default());
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(state) => Ok(state),
            Err(e) => {
                // Corrupt record: treat as uninitialized rather than
                // failing the request. The next set() rewrites it whole.
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable state file, falling back to defaults"
                );
                Ok(DeviceState::default())
            }
        }
    }

    fn set(&mut self, state: DeviceState) -> Result<DeviceState, StoreError> {
        let tmp = self.tmp_path();
        let body = serde_json::to_vec(&state).map_err(io::Error::from)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(state)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state_path(dir: &TempDir) -> PathBuf {
        dir.path().join("device_state.json")
    }

    #[test]
    fn missing_file_reads_as_default() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(state_path(&dir));
        assert_eq!(store.get().unwrap(), DeviceState::default());
    }

    #[test]
    fn set_then_get_returns_written_state() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStateStore::new(state_path(&dir));
        let written = store
            .set(DeviceState {
                led_on: true,
                motion_monitoring: false,
            })
            .unwrap();

        assert!(written.led_on);
        assert_eq!(store.get().unwrap(), written);
    }

    #[test]
    fn state_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = FileStateStore::new(state_path(&dir));
            store
                .set(DeviceState {
                    led_on: true,
                    motion_monitoring: true,
                })
                .unwrap();
        }

        // A fresh store on the same path stands in for a process restart.
        let store = FileStateStore::new(state_path(&dir));
        let state = store.get().unwrap();
        assert!(state.led_on);
        assert!(state.motion_monitoring);
    }

    #[test]
    fn corrupt_file_reads_as_default() {
        let dir = TempDir::new().unwrap();
        fs::write(state_path(&dir), "{not json").unwrap();

        let store = FileStateStore::new(state_path(&dir));
        assert_eq!(store.get().unwrap(), DeviceState::default());
    }

    #[test]
    fn set_recovers_corrupt_file() {
        let dir = TempDir::new().unwrap();
        fs::write(state_path(&dir), "garbage").unwrap();

        let mut store = FileStateStore::new(state_path(&dir));
        store
            .set(DeviceState {
                led_on: true,
                motion_monitoring: false,
            })
            .unwrap();

        assert!(store.get().unwrap().led_on);
    }

    #[test]
    fn set_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStateStore::new(state_path(&dir));
        store.set(DeviceState::default()).unwrap();

        assert!(state_path(&dir).exists());
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn missing_fields_default_to_false() {
        let dir = TempDir::new().unwrap();
        // An older record written before the motion flag existed.
        fs::write(state_path(&dir), r#"{"led_on":true}"#).unwrap();

        let store = FileStateStore::new(state_path(&dir));
        let state = store.get().unwrap();
        assert!(state.led_on);
        assert!(!state.motion_monitoring);
    }

    #[test]
    fn last_write_wins() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStateStore::new(state_path(&dir));
        store
            .set(DeviceState {
                led_on: true,
                motion_monitoring: false,
            })
            .unwrap();
        store
            .set(DeviceState {
                led_on: false,
                motion_monitoring: true,
            })
            .unwrap();

        let state = store.get().unwrap();
        assert!(!state.led_on);
        assert!(state.motion_monitoring);
    }
}
