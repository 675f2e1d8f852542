//! CSV ingestion of the connection list.
//!
//! The expected layout is one header row followed by eleven positional
//! columns per connection:
//!
//! ```text
//! id,company,line,departure_time,arrival_time,start_stop,end_stop,start_stop_lat,start_stop_lon,end_stop_lat,end_stop_lon
//! 4,MPK Autobusy,A,20:57:00,20:59:00,Baltycka,Broniewskiego,51.1366,17.0306,51.1358,17.0374
//! ```
//!
//! Header names are ignored; only the column order matters.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::{Connection, Coordinates, TransitTime};

/// Errors from loading a connection file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The CSV structure itself is broken
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row parsed as CSV but its fields are not a valid connection
    #[error("invalid connection on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },
}

/// One CSV row, deserialized by position.
#[derive(Debug, Deserialize)]
struct ConnectionRecord {
    id: u32,
    company: String,
    line: String,
    departure_time: String,
    arrival_time: String,
    start_stop: String,
    end_stop: String,
    start_stop_lat: f64,
    start_stop_lon: f64,
    end_stop_lat: f64,
    end_stop_lon: f64,
}

/// Shares one allocation per distinct name across all connections.
#[derive(Default)]
struct Interner {
    names: HashSet<Arc<str>>,
}

impl Interner {
    fn intern(&mut self, name: &str) -> Arc<str> {
        if let Some(existing) = self.names.get(name) {
            return existing.clone();
        }
        let name: Arc<str> = Arc::from(name);
        self.names.insert(name.clone());
        name
    }
}

/// Load connections from a CSV file, anchoring times to `service_date`.
pub fn load_connections_from_path(
    path: impl AsRef<Path>,
    service_date: NaiveDate,
) -> Result<Vec<Connection>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let connections = load_connections(file, service_date)?;
    info!(
        path = %path.display(),
        connections = connections.len(),
        "Loaded timetable"
    );
    Ok(connections)
}

/// Load connections from any CSV reader.
pub fn load_connections<R: Read>(
    reader: R,
    service_date: NaiveDate,
) -> Result<Vec<Connection>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut interner = Interner::default();
    let mut connections = Vec::new();

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let invalid = |reason: String| LoadError::InvalidRecord { line, reason };

        let raw: ConnectionRecord = record
            .deserialize(None)
            .map_err(|e| invalid(e.to_string()))?;

        let departure = TransitTime::parse_hms(&raw.departure_time, service_date)
            .map_err(|e| invalid(format!("departure: {e}")))?;
        let arrival = TransitTime::parse_hms(&raw.arrival_time, service_date)
            .map_err(|e| invalid(format!("arrival: {e}")))?;

        let connection = Connection {
            id: raw.id,
            company: interner.intern(&raw.company),
            line: interner.intern(&raw.line),
            departure,
            arrival,
            origin: interner.intern(&raw.start_stop),
            destination: interner.intern(&raw.end_stop),
            origin_coords: Coordinates::new(raw.start_stop_lat, raw.start_stop_lon),
            destination_coords: Coordinates::new(raw.end_stop_lat, raw.end_stop_lon),
        };

        if !connection.is_usable() {
            warn!(
                id = connection.id,
                row = line,
                departure = %connection.departure,
                arrival = %connection.arrival,
                "Connection departs after it arrives; searches will skip it"
            );
        }

        connections.push(connection);
    }

    Ok(connections)
}
