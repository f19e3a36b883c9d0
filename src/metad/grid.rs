//! Fixed discretisation of the CV range used for reweighting.

use crate::error::{MetadError, Result};

/// Midpoints of the `bins - 1` cells between `bins` evenly spaced edges on [cv_min, cv_max].
#[derive(Clone, Debug)]
pub struct Grid {
    midpoints: Vec<f64>,
}

impl Grid {
    pub fn new(cv_min: f64, cv_max: f64, bins: usize) -> Result<Self> {
        if !cv_min.is_finite() || !cv_max.is_finite() {
            return Err(MetadError::config("grid bounds must be finite"));
        }
        if cv_max <= cv_min {
            return Err(MetadError::config(format!(
                "grid upper bound {} must exceed lower bound {}",
                cv_max, cv_min
            )));
        }
        if bins < 2 {
            return Err(MetadError::config(format!("grid needs at least 2 edges, got {}", bins)));
        }

        let step = (cv_max - cv_min) / (bins - 1) as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| cv_min + step * i as f64).collect();
        // pin the last edge so rounding never moves it
        edges[bins - 1] = cv_max;
        let midpoints = edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();

        Ok(Self { midpoints })
    }

    pub fn midpoints(&self) -> &[f64] {
        &self.midpoints
    }
}
