//! CSV import of ephemeris traces and initial body catalogs.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use serde::Deserialize;
use solar_core::units::{convert3, km_to_m, kms_to_ms};
use solar_dynamics::Body;
use solar_ephemeris::datetime::parse_timestamp;
use solar_ephemeris::{EphemerisError, EphemerisSample, EphemerisTrace};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path}:{line}: {message}")]
    Malformed {
        path: PathBuf,
        line: u64,
        message: String,
    },
    #[error("ephemeris error: {0}")]
    Ephemeris(#[from] EphemerisError),
}

/// Read a `Date-time,px,py,pz,vx,vy,vz` trace (SI units) for `body`.
pub fn read_trace(path: &Path, body: &str) -> Result<EphemerisTrace, ImportError> {
    let csv_err = |source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        samples.push(parse_trace_row(path, &record)?);
    }
    debug!("read {} samples for `{body}` from {}", samples.len(), path.display());
    Ok(EphemerisTrace::new(body, samples)?)
}

fn parse_trace_row(path: &Path, record: &StringRecord) -> Result<EphemerisSample, ImportError> {
    let line = record.position().map_or(0, |p| p.line());
    let malformed = |message: String| ImportError::Malformed {
        path: path.to_path_buf(),
        line,
        message,
    };
    if record.len() < 7 {
        return Err(malformed(format!("expected 7 columns, found {}", record.len())));
    }

    let timestamp = parse_timestamp(&record[0]).map_err(|e| malformed(e.to_string()))?;
    let mut values = [0.0; 6];
    for (slot, field) in values.iter_mut().zip(record.iter().skip(1)) {
        *slot = field
            .parse::<f64>()
            .map_err(|e| malformed(format!("`{field}`: {e}")))?;
    }
    Ok(EphemerisSample::new(
        timestamp,
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
    ))
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    position_x: f64,
    position_y: f64,
    position_z: f64,
    velocity_x: f64,
    velocity_y: f64,
    velocity_z: f64,
    mass: f64,
}

/// Read a body catalog (km, km/s, kg) into SI bodies, keeping only `ids` when non-empty.
///
/// Extra columns such as `radius` and `color_name` are ignored. Row order is preserved.
pub fn read_body_catalog(path: &Path, ids: &[String]) -> Result<Vec<Body>, ImportError> {
    let csv_err = |source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut bodies = Vec::new();
    for row in reader.deserialize::<CatalogRow>() {
        let row = row.map_err(csv_err)?;
        if !ids.is_empty() && !ids.iter().any(|id| id == &row.id) {
            continue;
        }
        bodies.push(Body::new(
            row.id,
            convert3(&[row.position_x, row.position_y, row.position_z], km_to_m),
            convert3(&[row.velocity_x, row.velocity_y, row.velocity_z], kms_to_ms),
            row.mass,
        ));
    }
    debug!("read {} bodies from {}", bodies.len(), path.display());
    Ok(bodies)
}

/// Directory of `{BODY}_TRACE.csv` files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceDirectory {
    dir: PathBuf,
}

impl TraceDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn trace_path(&self, body: &str) -> PathBuf {
        self.dir.join(format!("{}_TRACE.csv", body.to_ascii_uppercase()))
    }

    pub fn load(&self, body: &str) -> Result<EphemerisTrace, ImportError> {
        read_trace(&self.trace_path(body), body)
    }

    /// Load `target` expressed relative to `central`.
    pub fn load_relative(&self, target: &str, central: &str) -> Result<EphemerisTrace, ImportError> {
        let target_trace = self.load(target)?;
        let central_trace = self.load(central)?;
        Ok(target_trace.relative_to(&central_trace)?)
    }
}
