//! Configuration → runtime wiring.

use log::info;
use solar_config::{IntegratorMethod, SimulationConfig};
use solar_core::units::{convert3, km_to_m, kms_to_ms};
use solar_dynamics::tableau::{DORMAND_PRINCE_54, FEHLBERG_45};
use solar_dynamics::{Body, BodySystem, EmbeddedRk, GravityField, IntegratorSettings};
use solar_ephemeris::OrbitalPeriods;
use solar_importer::{read_body_catalog, read_trace};
use solar_transfer::{BateLambert, MissionPlanner, MissionSettings};

use super::{SimClock, Simulation, SimulationError};

/// Inline `[[bodies]]` (converted to SI) followed by any catalog rows.
pub fn bodies_from_config(config: &SimulationConfig) -> Result<Vec<Body>, SimulationError> {
    let mut bodies: Vec<Body> = config
        .bodies
        .iter()
        .map(|b| {
            Body::new(
                b.id.clone(),
                convert3(&b.position_km, km_to_m),
                convert3(&b.velocity_km_s, kms_to_ms),
                b.mass_kg,
            )
        })
        .collect();
    if let Some(catalog) = &config.catalog {
        bodies.extend(read_body_catalog(&catalog.path, &catalog.ids)?);
    }
    Ok(bodies)
}

fn integrator_from_config(config: &SimulationConfig) -> EmbeddedRk {
    let tableau = match config.integrator.method {
        IntegratorMethod::DormandPrince => &DORMAND_PRINCE_54,
        IntegratorMethod::Fehlberg => &FEHLBERG_45,
    };
    EmbeddedRk::new(
        tableau,
        GravityField::with_min_separation(config.integrator.min_separation_m),
        IntegratorSettings {
            tolerance: config.integrator.tolerance,
            max_retries: config.integrator.max_retries,
            ..IntegratorSettings::default()
        },
    )
}

fn mission_from_config(config: &SimulationConfig) -> Result<Option<MissionPlanner>, SimulationError> {
    let Some(mission) = &config.mission else {
        return Ok(None);
    };

    let mut periods = OrbitalPeriods::default();
    for period in &config.periods {
        periods.insert(&period.body, period.days);
    }

    let mut trace = read_trace(&mission.trace, &mission.target)?;
    if let Some(central_path) = &mission.central_trace {
        let central = read_trace(central_path, &mission.central)?;
        trace = trace
            .relative_to(&central)
            .map_err(|e| SimulationError::Import(e.into()))?;
    }

    let settings = MissionSettings::try_from(mission)?;
    let mut planner = MissionPlanner::new(
        settings,
        trace,
        periods.period_seconds(&mission.target),
        Box::new(BateLambert),
    );
    if mission.armed {
        planner.arm();
    }
    Ok(Some(planner))
}

impl Simulation {
    /// Build bodies, integrator, clock, and mission from a validated configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimulationError> {
        let system = BodySystem::from_bodies(bodies_from_config(config)?)?;
        let integrator = integrator_from_config(config);
        let mut simulation = Simulation::new(
            system,
            integrator,
            SimClock::new(config.clock.start_unix),
            config.integrator.initial_step_s,
        );
        if let Some(planner) = mission_from_config(config)? {
            simulation = simulation.with_mission(planner);
        }
        info!(
            "simulation ready: {} bodies, {} integrator, start {}",
            simulation.system().len(),
            integrator.tableau.name,
            simulation.clock().date_label()
        );
        Ok(simulation)
    }
}
