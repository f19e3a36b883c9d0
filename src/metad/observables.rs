//! Named scalar observables exposed to loggers.

use super::sampler::HmcMetad;
use super::traits::HostEngine;

pub type Observable<H> = fn(&HmcMetad<H>) -> f64;

/// Ordered map from column name to a read-only accessor on the sampler.
pub struct ObservableRegistry<H: HostEngine> {
    entries: Vec<(&'static str, Observable<H>)>,
}

impl<H: HostEngine> ObservableRegistry<H> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Standard column set: the reweighting factor in biased mode, the
    /// potential energy otherwise.
    pub fn for_mode(bias_mode: bool) -> Self {
        let mut registry = Self::new()
            .with("t", |s| s.timestep() as f64)
            .with("acceptance_ratio", HmcMetad::acceptance_ratio)
            .with("collective_variable", HmcMetad::collective_variable);
        if bias_mode {
            registry = registry
                .with("extra_collective_variable", HmcMetad::extra_collective_variable)
                .with("bias_potential", HmcMetad::bias_potential)
                .with("ebetac", |s| s.ebetac().unwrap_or(f64::NAN));
        } else {
            registry = registry.with("current_potential_energy", HmcMetad::current_potential_energy);
        }
        registry
    }

    pub fn with(mut self, name: &'static str, observable: Observable<H>) -> Self {
        self.entries.push((name, observable));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    pub fn get(&self, name: &str) -> Option<Observable<H>> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }

    /// Read every observable, in registration order.
    pub fn sample(&self, sampler: &HmcMetad<H>) -> Vec<f64> {
        self.entries.iter().map(|(_, f)| f(sampler)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: HostEngine> Default for ObservableRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
