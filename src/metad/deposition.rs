//! Well-tempered hill height rule.
//!
//! h = h₀ · exp(-V(s) / ΔT),  ΔT = kT · (γ - 1)
//!
//! Heights shrink as bias accumulates under the current CV, so the total bias
//! converges to -(1 - 1/γ) F(s) instead of growing without bound.

use crate::error::{MetadError, Result};
use super::history::HistoryStore;

#[derive(Copy, Clone, Debug)]
pub struct WellTempered {
    init_height: f64,
    gamma: f64,
    /// ΔT = kT (γ - 1)
    delta_t: f64,
}

impl WellTempered {
    pub fn new(init_height: f64, kt: f64, gamma: f64) -> Result<Self> {
        if !(gamma > 1.0) {
            return Err(MetadError::config(format!(
                "bias factor must be larger than 1, got {}",
                gamma
            )));
        }
        if !(kt > 0.0) {
            return Err(MetadError::config(format!("kT must be positive, got {}", kt)));
        }
        if !(init_height >= 0.0) {
            return Err(MetadError::config(format!(
                "initial height must be non-negative, got {}",
                init_height
            )));
        }
        Ok(Self {
            init_height,
            gamma,
            delta_t: kt * (gamma - 1.0),
        })
    }

    pub fn init_height(&self) -> f64 {
        self.init_height
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// Height of a hill deposited where the bias is currently `bias_now`.
    #[inline]
    pub fn height(&self, bias_now: f64) -> f64 {
        self.init_height * (-bias_now / self.delta_t).exp()
    }

    /// Append a hill at `cv` whose local bias is `bias_now`; returns its height.
    pub fn deposit(&self, history: &mut HistoryStore, timestep: u64, cv: f64, bias_now: f64) -> Result<f64> {
        let height = self.height(bias_now);
        history.append(timestep, cv, height)?;
        log::debug!(
            "deposited hill #{} at step {}: cv = {:.6}, height = {:.6e}",
            history.len(),
            timestep,
            cv,
            height
        );
        Ok(height)
    }
}
