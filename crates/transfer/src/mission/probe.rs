use solar_core::vector::{self, Vector3};
use solar_dynamics::{Body, BodySystem, BodyView, DynamicsError, EmbeddedRk, IntegrationError};

const PROXY_INDEX: usize = 0;
const PROBE_INDEX: usize = 1;

/// Reduced two-body system flown after launch: a copy of the central body and the probe.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    system: BodySystem,
    mission_time: f64,
    braked: bool,
}

impl Probe {
    /// Place the probe at `position` with velocity `central.velocity + departure_velocity`, next
    /// to a proxy duplicating the central body's state and mass.
    pub fn launch(
        proxy_id: &str,
        probe_id: &str,
        central: &BodyView<'_>,
        position: Vector3,
        departure_velocity: Vector3,
        probe_mass_kg: f64,
    ) -> Result<Self, DynamicsError> {
        let proxy = Body::new(proxy_id, central.position, central.velocity, central.mass);
        let probe = Body::new(
            probe_id,
            position,
            vector::add(&central.velocity, &departure_velocity),
            probe_mass_kg,
        );
        Ok(Self {
            system: BodySystem::from_bodies([proxy, probe])?,
            mission_time: 0.0,
            braked: false,
        })
    }

    pub fn system(&self) -> &BodySystem {
        &self.system
    }

    pub fn probe(&self) -> Option<BodyView<'_>> {
        self.system.body(PROBE_INDEX)
    }

    pub fn proxy(&self) -> Option<BodyView<'_>> {
        self.system.body(PROXY_INDEX)
    }

    /// Seconds flown since launch.
    pub fn mission_time(&self) -> f64 {
        self.mission_time
    }

    pub fn is_braked(&self) -> bool {
        self.braked
    }

    /// Fixed-step advance by `dt`, accumulating mission time.
    pub fn advance(&mut self, integrator: &EmbeddedRk, dt: f64) -> Result<f64, IntegrationError> {
        let dt = integrator.step_fixed(&mut self.system, dt)?;
        self.mission_time += dt;
        Ok(dt)
    }

    /// Match the probe's velocity to `relative_velocity` about the proxy. One shot: returns the
    /// applied Δv the first time and `None` afterwards.
    pub fn rendezvous(
        &mut self,
        relative_velocity: Vector3,
    ) -> Result<Option<Vector3>, DynamicsError> {
        if self.braked {
            return Ok(None);
        }
        let (Some(proxy), Some(probe)) = (self.proxy(), self.probe()) else {
            return Ok(None);
        };
        let target = vector::add(&proxy.velocity, &relative_velocity);
        let delta_v = vector::sub(&target, &probe.velocity);
        self.system.set_velocity(PROBE_INDEX, target)?;
        self.braked = true;
        Ok(Some(delta_v))
    }
}
