//! Append-only readings log backed by a delimited text file.
//!
//! The file starts with a fixed column header written when the store is
//! first created. After that the only mutations are whole-row appends and
//! an explicit reset back to the bare header; a full read replays every row
//! in write order.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns present in every log. `Motion` is an optional fifth column
/// chosen at store creation; an existing file's header wins over the
/// configured capability so the schema never changes underneath old rows.
const BASE_COLUMNS: [&str; 4] = ["Date", "Time", "Temperature", "Humidity"];
const MOTION_COLUMN: &str = "Motion";
const DELIMITER: char = ',';

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] io::Error),
}

/// One timestamped sensor sample. Sensor fields are optional: firmware may
/// omit any of them and the row is stored with the value absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub date: String,
    pub time: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub motion: Option<bool>,
}

/// Storage interface for the readings log. The service layer only sees
/// this trait, so the on-disk format can be swapped without touching it.
pub trait ReadingStore: Send {
    fn append(&mut self, reading: &Reading) -> Result<(), StoreError>;
    fn list_all(&self) -> Result<Vec<Reading>, StoreError>;
    fn reset(&mut self) -> Result<(), StoreError>;
}

/// File-backed log: comma-delimited rows under a fixed header. Cell values
/// are numbers, booleans, or empty, so the delimiter cannot appear inside
/// a value.
pub struct CsvLog {
    path: PathBuf,
    motion: bool,
}

impl CsvLog {
    /// Open the log at `path`, creating it header-only if absent. `motion`
    /// selects the optional fifth column for a new file; a file that
    /// already has a header keeps it.
    pub fn open(path: impl Into<PathBuf>, motion: bool) -> Result<Self, StoreError> {
        let path = path.into();
        match read_header(&path)? {
            Some(columns) => Ok(Self {
                path,
                motion: columns.iter().any(|c| c == MOTION_COLUMN),
            }),
            None => {
                let log = Self { path, motion };
                fs::write(&log.path, log.header_line())?;
                Ok(log)
            }
        }
    }

    fn header_line(&self) -> String {
        let mut line = BASE_COLUMNS.join(",");
        if self.motion {
            line.push(DELIMITER);
            line.push_str(MOTION_COLUMN);
        }
        line.push('\n');
        line
    }

    fn encode_row(&self, r: &Reading) -> String {
        let mut cells = vec![
            r.date.clone(),
            r.time.clone(),
            r.temperature.map(|v| v.to_string()).unwrap_or_default(),
            r.humidity.map(|v| v.to_string()).unwrap_or_default(),
        ];
        if self.motion {
            cells.push(match r.motion {
                Some(true) => "true".to_string(),
                Some(false) => "false".to_string(),
                None => String::new(),
            });
        }
        let mut line = cells.join(",");
        line.push('\n');
        line
    }
}

impl ReadingStore for CsvLog {
    fn append(&mut self, reading: &Reading) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        // The file may have been removed out from under us since open();
        // a fresh file gets its header back before the first row.
        if file.metadata()?.len() == 0 {
            file.write_all(self.header_line().as_bytes())?;
        }
        file.write_all(self.encode_row(reading).as_bytes())?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Reading>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut lines = contents.lines();
        let Some(header) = lines.next() else {
            return Ok(Vec::new());
        };
        let motion_idx = header.split(DELIMITER).position(|c| c == MOTION_COLUMN);
        Ok(lines
            .filter(|l| !l.is_empty())
            .map(|l| parse_row(l, motion_idx))
            .collect())
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        fs::write(&self.path, self.header_line())?;
        Ok(())
    }
}

/// First line of the file, split into column names. `None` for a missing
/// or empty file (either way the header still has to be written).
fn read_header(path: &Path) -> Result<Option<Vec<String>>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(contents
        .lines()
        .next()
        .map(|h| h.split(DELIMITER).map(str::to_string).collect()))
}

/// Decode one row against the fixed column order. Rows with too few cells
/// or unparseable values degrade to partial records — keys stay present,
/// values come back absent — so one bad row never poisons a full read.
fn parse_row(line: &str, motion_idx: Option<usize>) -> Reading {
    let cells: Vec<&str> = line.split(DELIMITER).collect();
    let cell = |i: usize| cells.get(i).copied().unwrap_or("");
    Reading {
        date: cell(0).to_string(),
        time: cell(1).to_string(),
        temperature: cell(2).parse().ok(),
        humidity: cell(3).parse().ok(),
        motion: motion_idx.and_then(|i| parse_flag(cell(i))),
    }
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
