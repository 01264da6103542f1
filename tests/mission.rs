mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use approx::assert_relative_eq;
use solar_transfer_sim::dynamics::tableau::DORMAND_PRINCE_54;
use solar_transfer_sim::dynamics::{
    BodySystem, DynamicsError, EmbeddedRk, GravityField, IntegrationError, IntegratorSettings,
};
use solar_transfer_sim::export::{MemorySink, RecordSink};
use solar_transfer_sim::impulsive::{
    BateLambert, LambertRequest, LambertSolution, LambertSolver, LambertSolverError,
};
use solar_transfer_sim::physics::constants::SECONDS_PER_DAY;
use solar_transfer_sim::transfer::{
    LambertOptions, MissionError, MissionPlanner, MissionSettings, MissionState,
};

use common::{START_UNIX, mars_trace, norm, sub, sun_earth_mars};

const MARS_PERIOD_S: f64 = 686.980 * SECONDS_PER_DAY;

fn settings(duration_days: f64) -> MissionSettings {
    MissionSettings {
        origin: "EARTH".into(),
        target: "MARS".into(),
        central: "SUN".into(),
        probe_id: "PROBE".into(),
        proxy_id: "PROXY".into(),
        launch_epoch: START_UNIX,
        duration_days,
        probe_mass_kg: 3_000.0,
        auto_brake: false,
        coast_seconds: 0.0,
        lambert: LambertOptions::default(),
    }
}

/// Records every request and answers with a fixed, gentle departure velocity.
#[derive(Default)]
struct RecordingSolver {
    requests: Rc<RefCell<Vec<LambertRequest>>>,
    fail: Rc<Cell<bool>>,
}

impl LambertSolver for RecordingSolver {
    fn solve(&self, request: &LambertRequest) -> Result<LambertSolution, LambertSolverError> {
        self.requests.borrow_mut().push(*request);
        if self.fail.get() {
            return Err(LambertSolverError::Failure("no convergence".into()));
        }
        Ok(LambertSolution {
            departure_velocity: [0.0, 30_000.0, 0.0],
            arrival_velocity: [-20_000.0, 0.0, 0.0],
        })
    }
}

fn fly(
    planner: &mut MissionPlanner,
    days: usize,
    integrator: &EmbeddedRk,
    sink: &mut dyn RecordSink,
) -> MissionState {
    let mut state = planner.state();
    for _ in 0..days {
        state = planner
            .propagate(SECONDS_PER_DAY, integrator, "label", sink)
            .expect("propagate");
    }
    state
}

#[test]
fn earth_to_mars_transfer_reaches_the_target() {
    let system = sun_earth_mars();
    let mut planner = MissionPlanner::new(
        settings(185.0),
        mars_trace(-10, 400),
        Some(MARS_PERIOD_S),
        Box::new(BateLambert),
    );
    let integrator = EmbeddedRk::default();
    let mut sink = MemorySink::new();

    assert_eq!(planner.state(), MissionState::Idle);
    planner.arm();
    assert_eq!(planner.state(), MissionState::Pending);

    let report = planner
        .poll_launch(START_UNIX, &system, &mut sink)
        .expect("launch")
        .expect("launched");
    assert!(!report.relaunch);
    assert!(!planner.is_armed());
    assert_eq!(planner.state(), MissionState::Launched);

    let solution = report.solution;
    assert_eq!(solution.corrected_duration_s, 185.0 * SECONDS_PER_DAY);
    assert_eq!(solution.interpolation.wraps, 0);

    let probe = planner.probe().expect("probe");
    let sun = system.get("SUN").expect("sun");
    let earth = system.get("EARTH").expect("earth");
    let view = probe.probe().expect("probe body");
    assert_eq!(view.position, earth.position);
    assert_eq!(
        view.velocity,
        [
            sun.velocity[0] + solution.departure_velocity[0],
            sun.velocity[1] + solution.departure_velocity[1],
            sun.velocity[2] + solution.departure_velocity[2],
        ]
    );
    let proxy = probe.proxy().expect("proxy");
    assert_eq!(proxy.id, "PROXY");
    assert_eq!(proxy.mass, sun.mass);

    // Departure requires a few km/s on top of Earth's orbital velocity.
    let excess = norm(&sub(&solution.departure_velocity, &earth.velocity));
    assert!(excess > 1_000.0 && excess < 10_000.0, "v_inf {excess}");

    assert_eq!(fly(&mut planner, 185, &integrator, &mut sink), MissionState::Launched);
    let probe = planner.probe().expect("probe");
    assert_relative_eq!(probe.mission_time(), 185.0 * SECONDS_PER_DAY);
    let arrived = probe.probe().expect("probe body").position;
    let proxy = probe.proxy().expect("proxy").position;
    let relative = sub(&arrived, &proxy);
    let miss = norm(&sub(&relative, &solution.target_position));
    assert!(miss < 1.0e8, "missed the target by {miss} m");

    assert_eq!(fly(&mut planner, 1, &integrator, &mut sink), MissionState::Complete);
    assert_eq!(sink.records("PROBE").len(), 185);

    // Completed missions ignore further propagation.
    assert_eq!(fly(&mut planner, 3, &integrator, &mut sink), MissionState::Complete);
    assert_eq!(sink.records("PROBE").len(), 185);
}

#[test]
fn arrival_epoch_is_wrapped_by_the_target_period() {
    let system = sun_earth_mars();
    let solver = RecordingSolver::default();
    let requests = Rc::clone(&solver.requests);
    let mut planner = MissionPlanner::new(
        settings(700.0),
        mars_trace(-10, 200),
        Some(MARS_PERIOD_S),
        Box::new(solver),
    );
    planner.arm();
    let report = planner
        .poll_launch(START_UNIX, &system, &mut MemorySink::new())
        .expect("launch")
        .expect("launched");

    let expected = (700.0 - 686.980) * SECONDS_PER_DAY;
    assert_relative_eq!(report.solution.corrected_duration_s, expected, max_relative = 1e-9);
    assert_eq!(report.solution.interpolation.wraps, -1);

    let requests = requests.borrow();
    assert_eq!(requests.len(), 1);
    let request = requests[0];
    assert_relative_eq!(request.time_of_flight_s, expected, max_relative = 1e-9);
    assert_eq!(request.r2_m, report.solution.target_position);
    assert!(request.prograde);
    assert_eq!(request.max_iterations, 500);
    assert_eq!(request.tolerance, 1e-8);
    let earth = system.get("EARTH").expect("earth");
    assert_eq!(request.r1_m, earth.position);
}

#[test]
fn solver_failure_returns_to_idle() {
    let system = sun_earth_mars();
    let solver = RecordingSolver::default();
    solver.fail.set(true);
    let mut planner = MissionPlanner::new(
        settings(185.0),
        mars_trace(-10, 400),
        Some(MARS_PERIOD_S),
        Box::new(solver),
    );
    planner.arm();

    let err = planner
        .poll_launch(START_UNIX, &system, &mut MemorySink::new())
        .unwrap_err();
    assert!(matches!(err, MissionError::TransferSolverFailure(_)));
    assert_eq!(planner.state(), MissionState::Idle);
    assert!(!planner.is_armed());
    assert!(planner.probe().is_none());
    assert!(planner.transfer().is_none());

    // Nothing happens until the mission is armed again.
    assert!(
        planner
            .poll_launch(START_UNIX + 10.0, &system, &mut MemorySink::new())
            .expect("idle poll")
            .is_none()
    );
}

#[test]
fn relaunch_replaces_the_probe_and_failed_relaunch_keeps_it() {
    let system = sun_earth_mars();
    let solver = RecordingSolver::default();
    let fail = Rc::clone(&solver.fail);
    let mut planner = MissionPlanner::new(
        settings(185.0),
        mars_trace(-10, 400),
        Some(MARS_PERIOD_S),
        Box::new(solver),
    );
    let integrator = EmbeddedRk::default();
    let mut sink = MemorySink::new();

    planner.arm();
    planner
        .poll_launch(START_UNIX, &system, &mut sink)
        .expect("launch")
        .expect("launched");
    fly(&mut planner, 4, &integrator, &mut sink);
    assert_eq!(sink.records("PROBE").len(), 4);

    planner.arm();
    assert_eq!(planner.state(), MissionState::Launched);
    let report = planner
        .poll_launch(START_UNIX + 5.0 * SECONDS_PER_DAY, &system, &mut sink)
        .expect("relaunch")
        .expect("relaunched");
    assert!(report.relaunch);
    assert_eq!(sink.reset_count("PROBE"), 1);
    assert!(sink.records("PROBE").is_empty());
    assert_eq!(planner.probe().expect("probe").mission_time(), 0.0);

    fly(&mut planner, 2, &integrator, &mut sink);
    let flown = planner.probe().expect("probe").clone();

    fail.set(true);
    planner.arm();
    let err = planner
        .poll_launch(START_UNIX + 8.0 * SECONDS_PER_DAY, &system, &mut sink)
        .unwrap_err();
    assert!(matches!(err, MissionError::TransferSolverFailure(_)));
    assert_eq!(planner.state(), MissionState::Launched);
    assert_eq!(planner.probe(), Some(&flown));
    assert_eq!(sink.reset_count("PROBE"), 1);
    assert_eq!(sink.records("PROBE").len(), 2);
}

#[test]
fn launch_waits_for_the_epoch() {
    let system = sun_earth_mars();
    let mut planner = MissionPlanner::new(
        settings(185.0),
        mars_trace(-10, 400),
        Some(MARS_PERIOD_S),
        Box::new(RecordingSolver::default()),
    );
    let mut sink = MemorySink::new();

    // Not armed: the epoch alone is not enough.
    assert!(planner.poll_launch(START_UNIX, &system, &mut sink).expect("poll").is_none());

    planner.arm();
    assert!(
        planner
            .poll_launch(START_UNIX - 1.0, &system, &mut sink)
            .expect("poll")
            .is_none()
    );
    assert_eq!(planner.state(), MissionState::Pending);
    assert!(planner.is_armed());

    planner.disarm();
    assert_eq!(planner.state(), MissionState::Idle);
}

#[test]
fn unknown_bodies_abort_the_launch() {
    let system = sun_earth_mars();
    let mut config = settings(185.0);
    config.target = "PLUTO".into();
    let mut planner = MissionPlanner::new(
        config,
        mars_trace(-10, 400),
        Some(MARS_PERIOD_S),
        Box::new(RecordingSolver::default()),
    );
    planner.arm();
    let err = planner
        .poll_launch(START_UNIX, &system, &mut MemorySink::new())
        .unwrap_err();
    assert!(matches!(err, MissionError::UnknownBody(ref id) if id == "PLUTO"));
    assert_eq!(planner.state(), MissionState::Idle);
}

#[test]
fn non_positive_corrected_duration_is_rejected() {
    let system = sun_earth_mars();
    let solver = RecordingSolver::default();
    let requests = Rc::clone(&solver.requests);
    let mut planner = MissionPlanner::new(
        settings(185.0),
        mars_trace(-300, -50),
        Some(200.0 * SECONDS_PER_DAY),
        Box::new(solver),
    );
    planner.arm();
    let err = planner
        .poll_launch(START_UNIX, &system, &mut MemorySink::new())
        .unwrap_err();
    match err {
        MissionError::InvalidDuration {
            requested_days,
            corrected_seconds,
        } => {
            assert_eq!(requested_days, 185.0);
            assert_relative_eq!(corrected_seconds, -215.0 * SECONDS_PER_DAY);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(requests.borrow().is_empty(), "solver must not be called");
}

#[test]
fn auto_brake_matches_the_target_then_coasts() {
    let system = sun_earth_mars();
    let mut config = settings(3.0);
    config.auto_brake = true;
    config.coast_seconds = 2.0 * SECONDS_PER_DAY;
    let mut planner = MissionPlanner::new(
        config,
        mars_trace(-10, 400),
        Some(MARS_PERIOD_S),
        Box::new(RecordingSolver::default()),
    );
    let integrator = EmbeddedRk::default();
    let mut sink = MemorySink::new();

    // Braking before launch is a no-op.
    assert_eq!(planner.apply_braking_impulse().expect("brake"), None);

    planner.arm();
    planner
        .poll_launch(START_UNIX, &system, &mut sink)
        .expect("launch")
        .expect("launched");
    assert_eq!(fly(&mut planner, 3, &integrator, &mut sink), MissionState::Launched);
    assert_eq!(fly(&mut planner, 1, &integrator, &mut sink), MissionState::Braked);

    let transfer = *planner.transfer().expect("transfer");
    let probe = planner.probe().expect("probe");
    assert!(probe.is_braked());
    let proxy_v = probe.proxy().expect("proxy").velocity;
    let probe_v = probe.probe().expect("probe body").velocity;
    let relative = sub(&probe_v, &proxy_v);
    for k in 0..3 {
        assert_relative_eq!(relative[k], transfer.target_velocity[k], epsilon = 1e-9);
    }

    // One shot.
    assert_eq!(planner.apply_braking_impulse().expect("brake"), None);

    assert_eq!(fly(&mut planner, 2, &integrator, &mut sink), MissionState::Braked);
    assert_eq!(fly(&mut planner, 1, &integrator, &mut sink), MissionState::Complete);
    assert_eq!(sink.records("PROBE").len(), 5);
}

#[test]
fn hohmann_reference_uses_current_radii() {
    let system: BodySystem = sun_earth_mars();
    let planner = MissionPlanner::new(
        settings(185.0),
        mars_trace(-10, 400),
        Some(MARS_PERIOD_S),
        Box::new(BateLambert),
    );
    let reference = planner
        .hohmann_reference(&system)
        .expect("bodies")
        .expect("estimate");
    let days = reference.tof_seconds / SECONDS_PER_DAY;
    assert!((days - 259.0).abs() < 3.0, "hohmann tof {days} d");
    assert!(reference.dv_total_m_s > 5_000.0 && reference.dv_total_m_s < 6_500.0);
}

#[test]
fn failed_probe_step_writes_no_record() {
    let system = sun_earth_mars();
    let mut planner = MissionPlanner::new(
        settings(185.0),
        mars_trace(-10, 400),
        Some(MARS_PERIOD_S),
        Box::new(RecordingSolver::default()),
    );
    let mut sink = MemorySink::new();
    planner.arm();
    planner
        .poll_launch(START_UNIX, &system, &mut sink)
        .expect("launch")
        .expect("launched");

    // Probe and proxy sit 1 AU apart, well inside this separation floor.
    let cramped = EmbeddedRk::new(
        &DORMAND_PRINCE_54,
        GravityField::with_min_separation(1.0e13),
        IntegratorSettings::default(),
    );
    for _ in 0..2 {
        let err = planner
            .propagate(SECONDS_PER_DAY, &cramped, "label", &mut sink)
            .unwrap_err();
        assert!(matches!(
            err,
            MissionError::Integration(IntegrationError::Dynamics(
                DynamicsError::DegenerateGeometry { .. }
            ))
        ));
    }
    assert!(sink.records("PROBE").is_empty());
    assert_eq!(planner.probe().expect("probe").mission_time(), 0.0);
    assert_eq!(planner.state(), MissionState::Launched);

    let integrator = EmbeddedRk::default();
    assert_eq!(fly(&mut planner, 2, &integrator, &mut sink), MissionState::Launched);
    assert_eq!(sink.records("PROBE").len(), 2);
}
