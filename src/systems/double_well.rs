//! Langevin particles in a double-well potential.
//!
//! Each particle feels
//!
//!   V(r) = a·x⁴ - b·x² + ½k(y² + z²)
//!
//! with minima at x = ±√(b/2a) separated by a barrier of b²/4a. Used as the
//! host engine for the `hmc_metad` binary: the mean x coordinate is the
//! natural collective variable for barrier crossing.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{MetadError, Result};
use crate::metad::HostEngine;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DoubleWellParams {
    pub n_particles: usize,
    /// Quartic coefficient
    pub a: f64,
    /// Quadratic coefficient
    pub b: f64,
    /// Transverse spring constant
    pub k_perp: f64,
    pub mass: f64,
    pub dt: f64,
    /// Langevin friction
    pub friction: f64,
    /// Thermostat temperature kT
    pub kt: f64,
    pub seed: u64,
    /// Starting x coordinate of every particle
    pub init_x: f64,
}

impl Default for DoubleWellParams {
    fn default() -> Self {
        Self {
            n_particles: 1,
            a: 1.0,
            b: 2.0,
            k_perp: 1.0,
            mass: 1.0,
            dt: 0.005,
            friction: 1.0,
            kt: 1.0,
            seed: 7,
            init_x: -1.0,
        }
    }
}

/// Full microstate: everything needed to roll the integrator back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParticleState {
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
}

pub struct DoubleWellLangevin {
    params: DoubleWellParams,
    state: ParticleState,
    forces: Vec<Vector3<f64>>,
    rng: StdRng,
}

impl DoubleWellLangevin {
    pub fn new(params: DoubleWellParams) -> Result<Self> {
        if params.n_particles == 0 {
            return Err(MetadError::config("double well needs at least one particle"));
        }
        if !(params.a > 0.0) || !(params.b > 0.0) {
            return Err(MetadError::config("double well coefficients a and b must be positive"));
        }
        if !(params.mass > 0.0) || !(params.dt > 0.0) || !(params.kt > 0.0) || !(params.friction >= 0.0) {
            return Err(MetadError::config(
                "mass, dt and kT must be positive and friction non-negative",
            ));
        }

        let positions = vec![Vector3::new(params.init_x, 0.0, 0.0); params.n_particles];
        let velocities = vec![Vector3::zeros(); params.n_particles];
        let mut host = Self {
            rng: StdRng::seed_from_u64(params.seed),
            forces: Vec::new(),
            state: ParticleState { positions, velocities },
            params,
        };
        host.forces = host.compute_forces();
        host.thermalize_momenta(host.params.kt);
        Ok(host)
    }

    fn particle_energy(&self, r: &Vector3<f64>) -> f64 {
        let p = &self.params;
        let x2 = r.x * r.x;
        p.a * x2 * x2 - p.b * x2 + 0.5 * p.k_perp * (r.y * r.y + r.z * r.z)
    }

    fn particle_force(&self, r: &Vector3<f64>) -> Vector3<f64> {
        let p = &self.params;
        Vector3::new(
            -4.0 * p.a * r.x.powi(3) + 2.0 * p.b * r.x,
            -p.k_perp * r.y,
            -p.k_perp * r.z,
        )
    }

    fn compute_forces(&self) -> Vec<Vector3<f64>> {
        self.state.positions.iter().map(|r| self.particle_force(r)).collect()
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.state
            .velocities
            .iter()
            .map(|v| 0.5 * self.params.mass * v.norm_squared())
            .sum()
    }

    pub fn temperature(&self) -> f64 {
        2.0 * self.kinetic_energy() / (3.0 * self.params.n_particles as f64)
    }

    pub fn state(&self) -> &ParticleState {
        &self.state
    }

    pub fn params(&self) -> &DoubleWellParams {
        &self.params
    }

    /// x of the two minima.
    pub fn minima(&self) -> (f64, f64) {
        let x = (self.params.b / (2.0 * self.params.a)).sqrt();
        (-x, x)
    }

    pub fn barrier_height(&self) -> f64 {
        self.params.b * self.params.b / (4.0 * self.params.a)
    }
}

impl HostEngine for DoubleWellLangevin {
    type Snapshot = ParticleState;

    fn snapshot(&self) -> ParticleState {
        self.state.clone()
    }

    fn restore(&mut self, snapshot: &ParticleState) {
        self.state = snapshot.clone();
        self.forces = self.compute_forces();
    }

    fn potential_energy(&self) -> f64 {
        self.state.positions.iter().map(|r| self.particle_energy(r)).sum()
    }

    fn thermalize_momenta(&mut self, kt: f64) {
        let sigma = (kt / self.params.mass).sqrt();
        for v in self.state.velocities.iter_mut() {
            *v = Vector3::new(
                self.rng.sample::<f64, _>(StandardNormal),
                self.rng.sample::<f64, _>(StandardNormal),
                self.rng.sample::<f64, _>(StandardNormal),
            ) * sigma;
        }
    }

    fn step(&mut self) {
        let p = &self.params;
        let dt = p.dt;
        let inv_m = 1.0 / p.mass;
        let noise_scale = (2.0 * p.friction * p.kt * inv_m).sqrt() * dt.sqrt();

        for i in 0..self.state.positions.len() {
            let deterministic = self.forces[i] * inv_m - self.state.velocities[i] * p.friction;
            let random_vec = Vector3::new(
                self.rng.sample::<f64, _>(StandardNormal),
                self.rng.sample::<f64, _>(StandardNormal),
                self.rng.sample::<f64, _>(StandardNormal),
            );
            self.state.velocities[i] += deterministic * dt + random_vec * noise_scale;
            let v = self.state.velocities[i];
            self.state.positions[i] += v * dt;
        }
        self.forces = self.compute_forces();
    }
}

/// Mean x coordinate: the biased collective variable.
pub fn mean_x(state: &ParticleState) -> f64 {
    state.positions.iter().map(|r| r.x).sum::<f64>() / state.positions.len() as f64
}

/// Mean distance from the origin, monitored alongside the biased CV.
pub fn mean_radius(state: &ParticleState) -> f64 {
    state.positions.iter().map(|r| r.norm()).sum::<f64>() / state.positions.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_force_matches_numerical_gradient() {
        let host = DoubleWellLangevin::new(DoubleWellParams { k_perp: 2.5, ..Default::default() }).unwrap();
        let h = 1e-6;
        let r = Vector3::new(0.7, -0.3, 0.4);
        let force = host.particle_force(&r);
        for axis in 0..3 {
            let mut fwd = r;
            let mut bwd = r;
            fwd[axis] += h;
            bwd[axis] -= h;
            let grad = (host.particle_energy(&fwd) - host.particle_energy(&bwd)) / (2.0 * h);
            assert_relative_eq!(force[axis], -grad, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_minima_and_barrier() {
        let host = DoubleWellLangevin::new(DoubleWellParams::default()).unwrap();
        let (left, right) = host.minima();
        assert_relative_eq!(left, -1.0);
        assert_relative_eq!(right, 1.0);
        assert_relative_eq!(host.barrier_height(), 1.0);
        // starts in the left well
        assert_relative_eq!(host.potential_energy(), -1.0);
    }

    #[test]
    fn test_restore_rolls_back_dynamics() {
        let mut host = DoubleWellLangevin::new(DoubleWellParams { n_particles: 4, ..Default::default() }).unwrap();
        let saved = host.snapshot();
        let energy = host.potential_energy();
        for _ in 0..10 {
            host.step();
        }
        assert_ne!(host.snapshot(), saved);
        host.restore(&saved);
        assert_eq!(host.snapshot(), saved);
        assert_relative_eq!(host.potential_energy(), energy);
    }

    #[test]
    fn test_thermalized_temperature() {
        let mut host = DoubleWellLangevin::new(DoubleWellParams { n_particles: 5000, ..Default::default() }).unwrap();
        host.thermalize_momenta(2.0);
        assert_relative_eq!(host.temperature(), 2.0, epsilon = 0.1);
    }

    #[test]
    fn test_collective_variables() {
        let state = ParticleState {
            positions: vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(-3.0, 4.0, 0.0)],
            velocities: vec![Vector3::zeros(); 2],
        };
        assert_relative_eq!(mean_x(&state), -1.0);
        assert_relative_eq!(mean_radius(&state), 3.0);
    }

    #[test]
    fn test_invalid_params() {
        assert!(DoubleWellLangevin::new(DoubleWellParams { n_particles: 0, ..Default::default() }).is_err());
        assert!(DoubleWellLangevin::new(DoubleWellParams { dt: 0.0, ..Default::default() }).is_err());
    }
}
