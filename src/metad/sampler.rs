//! Hybrid Monte Carlo / well-tempered metadynamics sampler.
//!
//! Ordinary dynamics runs between trial ticks; every `mc_stride` steps the
//! propagated state is treated as a Monte Carlo trial and accepted with the
//! Metropolis probability of the bias difference. Every `metad_stride` steps
//! a Gaussian hill is added at the currently accepted CV.

use std::path::Path;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{MetadError, Result};
use crate::io::{read_history, write_checkpoint, write_history, LogWriter, WriteMode};
use super::bias::BiasPotential;
use super::deposition::WellTempered;
use super::grid::Grid;
use super::history::HistoryStore;
use super::observables::ObservableRegistry;
use super::reweight;
use super::traits::{CollectiveVariable, HostEngine};

fn default_seed() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

/// Parameters fixed for the lifetime of a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadParams {
    /// Thermal energy kT
    pub kt: f64,
    /// Period (in timesteps) of Monte Carlo trials
    pub mc_stride: u64,
    /// Period of hill deposition, an integer multiple of `mc_stride`
    pub metad_stride: u64,
    /// Height of the first hill
    pub init_height: f64,
    /// Hill width
    pub sigma: f64,
    /// Bias factor, larger than 1
    pub gamma: f64,
    /// Reweighting grid lower bound
    pub cv_min: f64,
    /// Reweighting grid upper bound
    pub cv_max: f64,
    /// Number of reweighting grid edges
    pub bins: usize,
    #[serde(default)]
    pub restart: bool,
    #[serde(default)]
    pub restart_fn: Option<String>,
    /// Timestep the run resumes from; defaults to the last deposited hill
    #[serde(default)]
    pub initial_timestep: Option<u64>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_true")]
    pub bias_mode: bool,
    #[serde(default)]
    pub verbose: bool,
}

impl MetadParams {
    /// Check every construction constraint. Nothing runs on failure.
    pub fn validate(&self) -> Result<()> {
        if !(self.kt > 0.0) || !self.kt.is_finite() {
            return Err(MetadError::config(format!("kT must be positive and finite, got {}", self.kt)));
        }
        if !(self.sigma > 0.0) || !self.sigma.is_finite() {
            return Err(MetadError::config(format!("sigma must be positive and finite, got {}", self.sigma)));
        }
        if self.mc_stride == 0 || self.metad_stride == 0 {
            return Err(MetadError::config("strides must be positive"));
        }
        if self.metad_stride % self.mc_stride != 0 {
            return Err(MetadError::config(format!(
                "metad_stride {} is not an integer multiple of mc_stride {}",
                self.metad_stride, self.mc_stride
            )));
        }
        if !(self.init_height >= 0.0) || !self.init_height.is_finite() {
            return Err(MetadError::config(format!(
                "initial height must be non-negative and finite, got {}",
                self.init_height
            )));
        }
        if self.bias_mode && !(self.gamma > 1.0) {
            return Err(MetadError::config(format!("gamma must be larger than 1, got {}", self.gamma)));
        }
        if self.restart && self.restart_fn.is_none() {
            return Err(MetadError::config("restart requested without restart_fn"));
        }
        Grid::new(self.cv_min, self.cv_max, self.bins)?;
        Ok(())
    }

    /// Truncate a fresh log, append to an existing one when restarting.
    pub fn writer_mode(&self) -> WriteMode {
        if self.restart {
            WriteMode::Append
        } else {
            WriteMode::Truncate
        }
    }
}

/// The currently accepted configuration.
#[derive(Clone, Debug)]
pub struct SamplerState<S> {
    pub snapshot: S,
    pub cv: f64,
    pub extra_cv: f64,
    pub bias_potential: f64,
    pub potential_energy: f64,
}

/// Accepted/rejected trial counts since construction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub accepted: u64,
    pub rejected: u64,
}

impl Counters {
    pub fn total(&self) -> u64 {
        self.accepted + self.rejected
    }

    /// accepted / total, 0.0 before the first trial.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.accepted as f64 / self.total() as f64
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrialOutcome {
    Accepted,
    Rejected,
}

/// min(1, exp(-Δ/kT)) computed without overflow. A NaN Δ is never accepted.
#[inline]
pub fn metropolis_probability(delta_bias: f64, kt: f64) -> f64 {
    let exponent = -delta_bias / kt;
    if exponent.is_nan() {
        return 0.0;
    }
    exponent.min(0.0).exp()
}

/// True on timesteps one step past a multiple of `cadence` (every step for cadence 1).
#[inline]
pub fn on_cadence(timestep: u64, cadence: u64) -> bool {
    timestep % cadence == 1 % cadence
}

pub struct HmcMetad<H: HostEngine> {
    host: H,
    colvar: Box<dyn CollectiveVariable<H::Snapshot>>,
    extra_colvar: Box<dyn CollectiveVariable<H::Snapshot>>,
    params: MetadParams,
    bias: BiasPotential,
    /// None in unbiased mode
    policy: Option<WellTempered>,
    grid: Grid,
    history: HistoryStore,
    rng: StdRng,
    state: SamplerState<H::Snapshot>,
    counters: Counters,
    timestep: u64,
}

impl<H: HostEngine> HmcMetad<H> {
    /// Build the sampler, reading the hill history from `restart_fn` when restarting.
    pub fn new<C, E>(host: H, colvar: C, extra_colvar: E, params: MetadParams) -> Result<Self>
    where
        C: CollectiveVariable<H::Snapshot> + 'static,
        E: CollectiveVariable<H::Snapshot> + 'static,
    {
        params.validate()?;
        let history = match (params.restart, params.restart_fn.as_deref()) {
            (true, Some(path)) => {
                let history = read_history(path)?;
                log::info!("restarting from {} with {} hills", path, history.len());
                if params.verbose {
                    let (cvs, heights) = history.tail(5);
                    log::debug!("last cv values in history: {:?}", cvs);
                    log::debug!("last heights in history: {:?}", heights);
                }
                history
            }
            _ => HistoryStore::new(),
        };
        Self::with_history(host, colvar, extra_colvar, params, history)
    }

    /// Build the sampler around an already loaded hill history.
    pub fn with_history<C, E>(
        host: H,
        colvar: C,
        extra_colvar: E,
        mut params: MetadParams,
        history: HistoryStore,
    ) -> Result<Self>
    where
        C: CollectiveVariable<H::Snapshot> + 'static,
        E: CollectiveVariable<H::Snapshot> + 'static,
    {
        params.validate()?;

        let policy = if params.bias_mode {
            Some(WellTempered::new(params.init_height, params.kt, params.gamma)?)
        } else {
            if params.init_height != 0.0 {
                log::warn!("unbiased mode, ignoring non-zero initial height {}", params.init_height);
            }
            params.init_height = 0.0;
            None
        };

        let last_hill = history.last_timestep().unwrap_or(0);
        let timestep = params.initial_timestep.unwrap_or(last_hill);
        if timestep < last_hill {
            return Err(MetadError::config(format!(
                "initial timestep {} precedes the last deposited hill at {}",
                timestep, last_hill
            )));
        }

        let grid = Grid::new(params.cv_min, params.cv_max, params.bins)?;
        let bias = BiasPotential::new(params.sigma);

        let snapshot = host.snapshot();
        let cv = colvar.evaluate(&snapshot);
        let extra_cv = extra_colvar.evaluate(&snapshot);
        let bias_potential = bias.evaluate(&history, cv);
        let potential_energy = host.potential_energy();

        Ok(Self {
            rng: StdRng::seed_from_u64(params.seed),
            host,
            colvar: Box::new(colvar),
            extra_colvar: Box::new(extra_colvar),
            bias,
            policy,
            grid,
            history,
            state: SamplerState {
                snapshot,
                cv,
                extra_cv,
                bias_potential,
                potential_energy,
            },
            counters: Counters::default(),
            timestep,
            params,
        })
    }

    /// Handle one timestep. Trial first, then deposition.
    ///
    /// All `current_*` values are final when this returns; anything that reads
    /// them for the same timestep must run afterwards.
    pub fn tick(&mut self, timestep: u64) -> Result<()> {
        self.timestep = timestep;
        if on_cadence(timestep, self.params.mc_stride) {
            self.trial_step()?;
        }
        if self.params.bias_mode && on_cadence(timestep, self.params.metad_stride) {
            self.deposit_hill(timestep)?;
        }
        Ok(())
    }

    /// Treat the host's live state as a trial and accept or roll back.
    pub fn trial_step(&mut self) -> Result<TrialOutcome> {
        let trial_snapshot = self.host.snapshot();
        let trial_potential_energy = self.host.potential_energy();
        let trial_cv = self.colvar.evaluate(&trial_snapshot);

        if !self.params.bias_mode {
            return Err(MetadError::NotImplemented("unbiased mode trial".to_string()));
        }

        self.state.bias_potential = self.bias.evaluate(&self.history, self.state.cv);
        let trial_bias = self.bias.evaluate(&self.history, trial_cv);
        let probability = metropolis_probability(trial_bias - self.state.bias_potential, self.params.kt);
        let u: f64 = self.rng.gen();

        let outcome = if u < probability {
            self.state.extra_cv = self.extra_colvar.evaluate(&trial_snapshot);
            self.state.snapshot = trial_snapshot;
            self.state.cv = trial_cv;
            self.state.potential_energy = trial_potential_energy;
            self.state.bias_potential = trial_bias;
            self.counters.accepted += 1;
            TrialOutcome::Accepted
        } else {
            self.host.restore(&self.state.snapshot);
            self.counters.rejected += 1;
            TrialOutcome::Rejected
        };

        // the trial dynamics perturbed momenta either way
        self.host.thermalize_momenta(self.params.kt);
        Ok(outcome)
    }

    fn deposit_hill(&mut self, timestep: u64) -> Result<f64> {
        let policy = self
            .policy
            .ok_or_else(|| MetadError::NotImplemented("deposition in unbiased mode".to_string()))?;
        policy.deposit(&mut self.history, timestep, self.state.cv, self.state.bias_potential)
    }

    /// Advance the host `n_steps` timesteps, ticking and logging after each.
    pub fn run(&mut self, n_steps: u64, mut log: Option<&mut LogWriter>) -> Result<()> {
        let registry = ObservableRegistry::for_mode(self.params.bias_mode);
        for _ in 0..n_steps {
            self.host.step();
            let timestep = self.timestep + 1;
            self.tick(timestep)?;
            if let Some(writer) = log.as_deref_mut() {
                if writer.is_due(timestep) {
                    writer.write_row(&registry.sample(self))?;
                }
            }
        }
        if let Some(writer) = log {
            writer.flush()?;
        }
        Ok(())
    }

    /// Open a log writer with the column set for this sampler's mode.
    pub fn log_writer<P: AsRef<Path>>(&self, path: P, stride: u64) -> Result<LogWriter> {
        if stride == 0 || stride % self.params.mc_stride != 0 {
            return Err(MetadError::config(format!(
                "log stride {} is not a positive multiple of mc_stride {}",
                stride, self.params.mc_stride
            )));
        }
        let registry = ObservableRegistry::<H>::for_mode(self.params.bias_mode);
        LogWriter::open(path, self.params.writer_mode(), &registry.names(), stride)
    }

    pub fn save_history<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_history(path, &self.history)
    }

    /// Put the last accepted configuration back into the host and write it
    /// out together with the current timestep.
    pub fn save_configuration<P: AsRef<Path>>(&mut self, path: P) -> Result<()>
    where
        H::Snapshot: Serialize,
    {
        self.host.restore(&self.state.snapshot);
        write_checkpoint(path, self.timestep, &self.state.snapshot)?;

        if self.params.verbose {
            let (cvs, heights) = self.history.tail(5);
            log::debug!("saving accepted configuration at step {}", self.timestep);
            log::debug!("accepted potential energy: {}", self.state.potential_energy);
            log::debug!("host potential energy: {}", self.host.potential_energy());
            log::debug!("current bias potential: {}", self.state.bias_potential);
            log::debug!("current cv: {}", self.state.cv);
            log::debug!("last cv values in history: {:?}", cvs);
            log::debug!("last heights in history: {:?}", heights);
            log::debug!("hills in history: {}", self.history.len());
        }
        Ok(())
    }

    /// Bias potential at an arbitrary CV value.
    pub fn bias_at(&self, cv: f64) -> f64 {
        self.bias.evaluate(&self.history, cv)
    }

    /// Re-weighting factor exp(β c(t)) over the full history. Biased mode only.
    pub fn ebetac(&self) -> Result<f64> {
        if !self.params.bias_mode {
            return Err(MetadError::NotImplemented("reweighting factor in unbiased mode".to_string()));
        }
        Ok(reweight::ebetac(&self.bias, &self.history, &self.grid, self.params.kt, self.params.gamma))
    }

    pub fn acceptance_ratio(&self) -> f64 {
        self.counters.acceptance_ratio()
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn collective_variable(&self) -> f64 {
        self.state.cv
    }

    pub fn extra_collective_variable(&self) -> f64 {
        self.state.extra_cv
    }

    pub fn bias_potential(&self) -> f64 {
        self.state.bias_potential
    }

    pub fn current_potential_energy(&self) -> f64 {
        self.state.potential_energy
    }

    pub fn state(&self) -> &SamplerState<H::Snapshot> {
        &self.state
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn params(&self) -> &MetadParams {
        &self.params
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
