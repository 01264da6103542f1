mod common;

use std::path::PathBuf;

use solar_transfer_sim::config::{BodyConfig, IntegratorConfig, MissionConfig, SimulationConfig};
use solar_transfer_sim::dynamics::tableau::DORMAND_PRINCE_54;
use solar_transfer_sim::dynamics::{EmbeddedRk, GravityField, IntegrationError, IntegratorSettings};
use solar_transfer_sim::export::MemorySink;
use solar_transfer_sim::physics::constants::AU_M;
use solar_transfer_sim::simulation::{SimClock, Simulation, SimulationError};
use solar_transfer_sim::transfer::MissionState;
use tempfile::tempdir;

use common::{
    M_EARTH, M_MARS, M_SUN, MARS_PHASE_DEG, MARS_RADIUS_AU, START_UNIX, circular, mars_samples,
    sun_earth_mars, write_trace_csv,
};

fn body_config(id: &str, state: ([f64; 3], [f64; 3]), mass_kg: f64) -> BodyConfig {
    let (p, v) = state;
    BodyConfig {
        id: id.into(),
        position_km: p.map(|x| x / 1_000.0),
        velocity_km_s: v.map(|x| x / 1_000.0),
        mass_kg,
    }
}

fn mission_config(trace: PathBuf) -> MissionConfig {
    MissionConfig {
        origin: "EARTH".into(),
        target: "MARS".into(),
        central: "SUN".into(),
        launch_date: "2025-01-01".into(),
        duration_days: 185.0,
        probe_id: "SATELLITE".into(),
        proxy_id: "SATELLITE_SUN".into(),
        probe_mass_kg: 3_000.0,
        armed: true,
        auto_brake: false,
        coast_days: 0.0,
        trace,
        central_trace: None,
        lambert: Default::default(),
    }
}

#[test]
fn tick_records_bodies_then_advances_the_clock() {
    let mut simulation = Simulation::new(
        sun_earth_mars(),
        EmbeddedRk::default(),
        SimClock::new(START_UNIX),
        1_000.0,
    );
    let mut sink = MemorySink::new();

    let report = simulation.tick(&mut sink).expect("tick");
    assert_eq!(report.dt, 1_000.0);
    assert_eq!(report.attempts, 1);
    assert_eq!(report.simulated_seconds, 1_000.0);
    assert_eq!(report.mission_state, None);
    assert!(!report.launched);
    assert_eq!(simulation.clock().now_unix(), START_UNIX + 1_000.0);
    assert!(simulation.next_dt() > 1_000.0);

    for id in ["SUN", "EARTH", "MARS"] {
        let rows = sink.records(id);
        assert_eq!(rows.len(), 1, "{id}");
        assert_eq!(rows[0].date, "Wednesday January 01 2025 00:00:00");
    }
    // Records hold the state before the step.
    let (earth_p, _) = circular(AU_M, 0.0);
    assert_eq!(sink.records("EARTH")[0].position, earth_p);
    assert_ne!(simulation.system().positions()[1], earth_p);

    simulation.tick(&mut sink).expect("tick");
    assert_eq!(sink.records("EARTH")[1].date, "Wednesday January 01 2025 00:16:40");
    assert_eq!(simulation.ticks(), 2);
    assert_eq!(simulation.diagnostics().accepted(), 2);
}

#[test]
fn non_converging_tick_is_skipped_and_flagged() {
    let integrator = EmbeddedRk::new(
        &DORMAND_PRINCE_54,
        GravityField::default(),
        IntegratorSettings {
            tolerance: 1e-30,
            max_retries: 2,
            ..IntegratorSettings::default()
        },
    );
    let system = sun_earth_mars();
    let mut simulation = Simulation::new(system.clone(), integrator, SimClock::new(START_UNIX), 3_600.0);

    let err = simulation.tick(&mut MemorySink::new()).unwrap_err();
    let proposed = match err {
        SimulationError::Integration(IntegrationError::NumericNonConvergence {
            attempts, dt, ..
        }) => {
            assert_eq!(attempts, 2);
            dt
        }
        other => panic!("unexpected error {other:?}"),
    };
    assert_eq!(simulation.system(), &system);
    assert_eq!(simulation.clock().simulated_seconds, 0.0);
    assert_eq!(simulation.ticks(), 0);
    assert_eq!(simulation.next_dt(), proposed);
    assert!(proposed < 3_600.0);
}

#[test]
fn abandoned_tick_records_nothing_and_defers_launch() {
    let dir = tempdir().expect("tempdir");
    let trace_path = dir.path().join("MARS_TRACE.csv");
    write_trace_csv(&trace_path, &mars_samples(-10, 400));

    let config = SimulationConfig {
        integrator: IntegratorConfig {
            tolerance: 1e-30,
            max_retries: 2,
            ..IntegratorConfig::default()
        },
        bodies: vec![
            body_config("SUN", ([0.0; 3], [0.0; 3]), M_SUN),
            body_config("EARTH", circular(AU_M, 0.0), M_EARTH),
            body_config(
                "MARS",
                circular(MARS_RADIUS_AU * AU_M, MARS_PHASE_DEG),
                M_MARS,
            ),
        ],
        mission: Some(mission_config(trace_path)),
        ..SimulationConfig::default()
    };

    let mut simulation = Simulation::from_config(&config).expect("simulation");
    let mut sink = MemorySink::new();
    for _ in 0..2 {
        assert!(matches!(
            simulation.tick(&mut sink),
            Err(SimulationError::Integration(
                IntegrationError::NumericNonConvergence { .. }
            ))
        ));
    }

    assert_eq!(simulation.ticks(), 0);
    for id in ["SUN", "EARTH", "MARS", "SATELLITE"] {
        assert!(sink.records(id).is_empty(), "{id}");
    }
    let mission = simulation.mission().expect("mission");
    assert!(mission.is_armed());
    assert_eq!(mission.state(), MissionState::Pending);
    assert!(mission.probe().is_none());
}

#[test]
fn configured_mission_launches_on_the_first_tick() {
    let dir = tempdir().expect("tempdir");
    let trace_path = dir.path().join("MARS_TRACE.csv");
    write_trace_csv(&trace_path, &mars_samples(-10, 400));

    let config = SimulationConfig {
        bodies: vec![
            body_config("SUN", ([0.0; 3], [0.0; 3]), M_SUN),
            body_config("EARTH", circular(AU_M, 0.0), M_EARTH),
            body_config(
                "MARS",
                circular(MARS_RADIUS_AU * AU_M, MARS_PHASE_DEG),
                M_MARS,
            ),
        ],
        mission: Some(mission_config(trace_path)),
        ..SimulationConfig::default()
    };
    config.validate().expect("valid config");

    let mut simulation = Simulation::from_config(&config).expect("simulation");
    assert_eq!(simulation.system().len(), 3);
    assert_eq!(simulation.clock().start_unix, START_UNIX);
    let mission = simulation.mission().expect("mission");
    assert!(mission.is_armed());
    assert_eq!(mission.state(), MissionState::Pending);

    let mut sink = MemorySink::new();
    let report = simulation.tick(&mut sink).expect("tick");
    assert!(report.launched);
    assert_eq!(report.mission_fault, None);
    assert_eq!(report.mission_state, Some(MissionState::Launched));
    assert_eq!(sink.records("SATELLITE").len(), 1);

    let probe = simulation.mission().and_then(|m| m.probe()).expect("probe");
    assert_eq!(probe.mission_time(), report.dt);

    for _ in 0..5 {
        let report = simulation.tick(&mut sink).expect("tick");
        assert!(!report.launched);
    }
    assert_eq!(sink.records("SATELLITE").len(), 6);
    assert_eq!(sink.records("EARTH").len(), 6);
}

#[test]
fn mission_faults_do_not_stop_the_primary_system() {
    let dir = tempdir().expect("tempdir");
    let trace_path = dir.path().join("MARS_TRACE.csv");
    write_trace_csv(&trace_path, &mars_samples(-10, 400));

    let mut mission = mission_config(trace_path);
    mission.origin = "VENUS".into();
    let config = SimulationConfig {
        bodies: vec![
            body_config("SUN", ([0.0; 3], [0.0; 3]), M_SUN),
            body_config(
                "MARS",
                circular(MARS_RADIUS_AU * AU_M, MARS_PHASE_DEG),
                M_MARS,
            ),
        ],
        mission: Some(mission),
        ..SimulationConfig::default()
    };

    let mut simulation = Simulation::from_config(&config).expect("simulation");
    let report = simulation.tick(&mut MemorySink::new()).expect("tick");
    assert!(!report.launched);
    let fault = report.mission_fault.expect("fault");
    assert!(fault.contains("VENUS"), "{fault}");
    assert_eq!(report.mission_state, Some(MissionState::Idle));
    assert_eq!(simulation.ticks(), 1);
}

#[test]
fn clock_labels_and_spans() {
    let mut clock = SimClock::new(START_UNIX);
    clock.advance(86_400.0 * 365.25);
    assert!((clock.simulated_days() - 365.25).abs() < 1e-9);
    assert!((clock.simulated_years() - 1.0).abs() < 1e-3);
    assert_eq!(clock.date_label(), "Thursday January 01 2026 06:00:00");
}
