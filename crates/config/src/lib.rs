//! Configuration models and loaders for the solar transfer simulator.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default simulation start: 2025-01-01T00:00:00Z.
pub const DEFAULT_START_UNIX: f64 = 1_735_689_600.0;

/// Default trial step: a year split into 160 × 144 steps (s).
pub const DEFAULT_INITIAL_STEP_S: f64 = 3.154e7 / (160.0 * 144.0);

/// Top-level simulation manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub integrator: IntegratorConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Initial bodies in km, km/s and kg.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bodies: Vec<BodyConfig>,
    /// Body catalog CSV, used in addition to `bodies`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission: Option<MissionConfig>,
    /// Extra orbital periods merged into the built-in table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub periods: Vec<PeriodConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_start_unix")]
    pub start_unix: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start_unix: DEFAULT_START_UNIX,
        }
    }
}

/// Embedded method driving the primary system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorMethod {
    #[default]
    DormandPrince,
    Fehlberg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    #[serde(default)]
    pub method: IntegratorMethod,
    #[serde(default = "default_initial_step")]
    pub initial_step_s: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_min_separation")]
    pub min_separation_m: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            method: IntegratorMethod::default(),
            initial_step_s: DEFAULT_INITIAL_STEP_S,
            tolerance: default_tolerance(),
            max_retries: default_max_retries(),
            min_separation_m: default_min_separation(),
        }
    }
}

/// One body of the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub id: String,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub mass_kg: f64,
}

/// Body catalog CSV and an optional id filter (empty keeps every row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionConfig {
    pub origin: String,
    pub target: String,
    #[serde(default = "default_central")]
    pub central: String,
    /// `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, or the trace label form.
    #[serde(default = "default_launch_date")]
    pub launch_date: String,
    #[serde(default = "default_duration_days")]
    pub duration_days: f64,
    #[serde(default = "default_probe_id")]
    pub probe_id: String,
    #[serde(default = "default_proxy_id")]
    pub proxy_id: String,
    #[serde(default = "default_probe_mass")]
    pub probe_mass_kg: f64,
    /// Arm at start-up instead of waiting for an external signal.
    #[serde(default)]
    pub armed: bool,
    /// Apply the rendezvous burn automatically at arrival.
    #[serde(default)]
    pub auto_brake: bool,
    /// Time spent coasting after the rendezvous burn before completing.
    #[serde(default)]
    pub coast_days: f64,
    /// Target trace CSV.
    pub trace: PathBuf,
    /// Trace subtracted from the target trace to make it relative to the central body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_trace: Option<PathBuf>,
    #[serde(default)]
    pub lambert: LambertConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambertConfig {
    #[serde(default = "default_prograde")]
    pub prograde: bool,
    #[serde(default = "default_lambert_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_lambert_tolerance")]
    pub tolerance: f64,
}

impl Default for LambertConfig {
    fn default() -> Self {
        Self {
            prograde: default_prograde(),
            max_iterations: default_lambert_iterations(),
            tolerance: default_lambert_tolerance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodConfig {
    pub body: String,
    pub days: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving `{ID}.csv` record files. Records are dropped when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_dir: Option<PathBuf>,
    /// JSON file receiving accepted step sizes and error estimates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<PathBuf>,
}

fn default_start_unix() -> f64 {
    DEFAULT_START_UNIX
}
fn default_initial_step() -> f64 {
    DEFAULT_INITIAL_STEP_S
}
fn default_tolerance() -> f64 {
    1e-4
}
fn default_max_retries() -> u32 {
    32
}
fn default_min_separation() -> f64 {
    1.0
}
fn default_central() -> String {
    "SUN".to_string()
}
fn default_launch_date() -> String {
    "2024-12-20".to_string()
}
fn default_duration_days() -> f64 {
    185.0
}
fn default_probe_id() -> String {
    "SATELLITE".to_string()
}
fn default_proxy_id() -> String {
    "SATELLITE_SUN".to_string()
}
fn default_probe_mass() -> f64 {
    3_000.0
}
fn default_prograde() -> bool {
    true
}
fn default_lambert_iterations() -> u32 {
    500
}
fn default_lambert_tolerance() -> f64 {
    1e-8
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl SimulationConfig {
    /// Check value ranges and cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let integrator = &self.integrator;

        if !self.clock.start_unix.is_finite() {
            return invalid("clock.start_unix must be finite".into());
        }
        if !(integrator.initial_step_s.is_finite() && integrator.initial_step_s > 0.0) {
            return invalid(format!(
                "integrator.initial_step_s must be positive, got {}",
                integrator.initial_step_s
            ));
        }
        if !(integrator.tolerance.is_finite() && integrator.tolerance > 0.0) {
            return invalid(format!(
                "integrator.tolerance must be positive, got {}",
                integrator.tolerance
            ));
        }
        if integrator.max_retries == 0 {
            return invalid("integrator.max_retries must be at least 1".into());
        }
        if !(integrator.min_separation_m.is_finite() && integrator.min_separation_m >= 0.0) {
            return invalid("integrator.min_separation_m must be non-negative".into());
        }
        if self.bodies.is_empty() && self.catalog.is_none() {
            return invalid("no bodies: provide [[bodies]] or a catalog".into());
        }

        let mut seen = HashSet::new();
        for body in &self.bodies {
            if !seen.insert(body.id.as_str()) {
                return invalid(format!("duplicate body id `{}`", body.id));
            }
            if !(body.mass_kg.is_finite() && body.mass_kg > 0.0) {
                return invalid(format!("body `{}` must have a positive mass", body.id));
            }
        }

        for period in &self.periods {
            if !(period.days.is_finite() && period.days > 0.0) {
                return invalid(format!("period of `{}` must be positive", period.body));
            }
        }

        if let Some(mission) = &self.mission {
            if !(mission.duration_days.is_finite() && mission.duration_days > 0.0) {
                return invalid(format!(
                    "mission.duration_days must be positive, got {}",
                    mission.duration_days
                ));
            }
            if !(mission.probe_mass_kg.is_finite() && mission.probe_mass_kg > 0.0) {
                return invalid("mission.probe_mass_kg must be positive".into());
            }
            if !(mission.coast_days.is_finite() && mission.coast_days >= 0.0) {
                return invalid("mission.coast_days must be non-negative".into());
            }
            if mission.probe_id == mission.proxy_id {
                return invalid("mission.probe_id and mission.proxy_id must differ".into());
            }
            if mission.lambert.max_iterations == 0 || !(mission.lambert.tolerance > 0.0) {
                return invalid("mission.lambert needs a positive iteration budget and tolerance".into());
            }
        }

        Ok(())
    }

    /// Make relative input paths relative to `base` (the directory holding the manifest).
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        if let Some(catalog) = &mut self.catalog {
            resolve(&mut catalog.path);
        }
        if let Some(mission) = &mut self.mission {
            resolve(&mut mission.trace);
            if let Some(central) = &mut mission.central_trace {
                resolve(central);
            }
        }
    }
}

/// Load a simulation manifest from a TOML (`.toml`) or YAML file.
///
/// Input paths inside the manifest are resolved against its directory. Output paths are left
/// as written, relative to the working directory.
pub fn load_simulation<P: AsRef<Path>>(path: P) -> Result<SimulationConfig, ConfigError> {
    let path = path.as_ref();
    let mut config: SimulationConfig = load_record(path)?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    config.validate()?;
    info!(
        "loaded simulation config {} ({} inline bodies, mission: {})",
        path.display(),
        config.bodies.len(),
        config
            .mission
            .as_ref()
            .map_or("none".to_string(), |m| format!("{} -> {}", m.origin, m.target))
    );
    Ok(config)
}

fn load_record<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}
