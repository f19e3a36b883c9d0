//! Gaussian sum bias potential.
//!
//! V(s) = Σᵢ hᵢ · exp(-(s - sᵢ)² / 2σ²)
//!
//! Every query re-sums the full history. Gaussians have global support, so
//! any hill can shift the value at any later query point.

use rayon::prelude::*;
use super::history::HistoryStore;

/// History length at which the sum switches to a rayon reduction.
pub const PARALLEL_THRESHOLD: usize = 4096;

/// Evaluates the bias from a hill history with a fixed hill width.
#[derive(Copy, Clone, Debug)]
pub struct BiasPotential {
    sigma: f64,
    /// 1 / (2σ²)
    inv_two_sigma2: f64,
}

impl BiasPotential {
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            inv_two_sigma2: 0.5 / (sigma * sigma),
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Contribution of a single hill at `cv`. Depends only on |cv - center|.
    #[inline]
    pub fn kernel(&self, cv: f64, center: f64, height: f64) -> f64 {
        let ds = cv - center;
        height * (-ds * ds * self.inv_two_sigma2).exp()
    }

    /// Bias potential at `cv`. Exactly 0.0 for an empty history.
    pub fn evaluate(&self, history: &HistoryStore, cv: f64) -> f64 {
        let centers = history.cv_values();
        let heights = history.heights();

        if centers.len() >= PARALLEL_THRESHOLD {
            centers
                .par_iter()
                .zip(heights.par_iter())
                .map(|(&c, &h)| self.kernel(cv, c, h))
                .sum()
        } else {
            centers
                .iter()
                .zip(heights.iter())
                .map(|(&c, &h)| self.kernel(cv, c, h))
                .sum()
        }
    }
}
