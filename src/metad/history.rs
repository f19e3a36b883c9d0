//! Append-only ledger of deposited Gaussian hills.
//!
//! The three columns are kept as parallel vectors so the bias sums can stream
//! over contiguous `f64` slices. Entries are never edited or removed, which is
//! what makes a bias field rebuilt from disk identical to the live one.

use crate::error::{MetadError, Result};

/// One deposited Gaussian contribution.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hill {
    pub timestep: u64,
    pub cv_value: f64,
    pub height: f64,
}

/// Ordered hill history, strictly increasing in timestep.
#[derive(Clone, Debug, Default)]
pub struct HistoryStore {
    timesteps: Vec<u64>,
    cv_values: Vec<f64>,
    heights: Vec<f64>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from the three persisted columns.
    pub fn from_columns(timesteps: Vec<u64>, cv_values: Vec<f64>, heights: Vec<f64>) -> Result<Self> {
        let mut store = Self::new();
        store.load(timesteps, cv_values, heights)?;
        Ok(store)
    }

    /// Append a hill. `timestep` must be strictly greater than the last one.
    pub fn append(&mut self, timestep: u64, cv_value: f64, height: f64) -> Result<()> {
        if let Some(&last) = self.timesteps.last() {
            if timestep <= last {
                return Err(MetadError::invariant(format!(
                    "hill timestep {} is not after last deposit at {}",
                    timestep, last
                )));
            }
        }
        if !cv_value.is_finite() {
            return Err(MetadError::invariant(format!("hill at timestep {} has non-finite cv {}", timestep, cv_value)));
        }
        if !height.is_finite() || height < 0.0 {
            return Err(MetadError::invariant(format!(
                "hill at timestep {} has invalid height {}",
                timestep, height
            )));
        }
        self.timesteps.push(timestep);
        self.cv_values.push(cv_value);
        self.heights.push(height);
        Ok(())
    }

    /// Replace the whole history, as done on restart.
    ///
    /// The store is left untouched if the columns are rejected.
    pub fn load(&mut self, timesteps: Vec<u64>, cv_values: Vec<f64>, heights: Vec<f64>) -> Result<()> {
        if timesteps.len() != cv_values.len() || timesteps.len() != heights.len() {
            return Err(MetadError::malformed(format!(
                "column lengths differ: {} timesteps, {} cv values, {} heights",
                timesteps.len(),
                cv_values.len(),
                heights.len()
            )));
        }
        if let Some(i) = timesteps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(MetadError::malformed(format!(
                "timesteps not strictly increasing at row {} ({} then {})",
                i + 1,
                timesteps[i],
                timesteps[i + 1]
            )));
        }
        if let Some(i) = cv_values.iter().position(|cv| !cv.is_finite()) {
            return Err(MetadError::malformed(format!("non-finite cv value at row {}", i)));
        }
        if let Some(i) = heights.iter().position(|h| !h.is_finite() || *h < 0.0) {
            return Err(MetadError::malformed(format!(
                "invalid height {} at row {}",
                heights[i], i
            )));
        }

        self.timesteps = timesteps;
        self.cv_values = cv_values;
        self.heights = heights;
        Ok(())
    }

    /// The ordered columns `(timesteps, cv_values, heights)` for persistence.
    pub fn serialize(&self) -> (&[u64], &[f64], &[f64]) {
        (&self.timesteps, &self.cv_values, &self.heights)
    }

    pub fn len(&self) -> usize {
        self.timesteps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timesteps.is_empty()
    }

    pub fn timesteps(&self) -> &[u64] {
        &self.timesteps
    }

    pub fn cv_values(&self) -> &[f64] {
        &self.cv_values
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn last_timestep(&self) -> Option<u64> {
        self.timesteps.last().copied()
    }

    pub fn hill(&self, i: usize) -> Option<Hill> {
        Some(Hill {
            timestep: *self.timesteps.get(i)?,
            cv_value: self.cv_values[i],
            height: self.heights[i],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Hill> + '_ {
        (0..self.len()).map(move |i| Hill {
            timestep: self.timesteps[i],
            cv_value: self.cv_values[i],
            height: self.heights[i],
        })
    }

    /// The most recent `n` cv values and heights, for diagnostics.
    pub fn tail(&self, n: usize) -> (&[f64], &[f64]) {
        let start = self.len().saturating_sub(n);
        (&self.cv_values[start..], &self.heights[start..])
    }
}
