//! Time-dependent reweighting factor of well-tempered metadynamics.
//!
//! With c_m = V(m) / kT on every grid midpoint m:
//!
//!   exp(β c(t)) = Σₘ exp(γ/(γ-1) · c_m) / Σₘ exp(1/(γ-1) · c_m)
//!
//! The maximum of c_m is subtracted before exponentiating and multiplied back
//! afterwards; the raw exponentials overflow once the bias is a few hundred kT.
//! Recomputed in full on every call.

use rayon::prelude::*;
use super::bias::{BiasPotential, PARALLEL_THRESHOLD};
use super::grid::Grid;
use super::history::HistoryStore;

/// Bias on every grid midpoint in units of kT.
pub fn reduced_bias_on_grid(bias: &BiasPotential, history: &HistoryStore, grid: &Grid, kt: f64) -> Vec<f64> {
    let mids = grid.midpoints();
    // parallelise over midpoints when the history is large; each inner sum stays sequential
    if history.len() >= PARALLEL_THRESHOLD {
        mids.par_iter().map(|&m| sequential_sum(bias, history, m) / kt).collect()
    } else {
        mids.iter().map(|&m| sequential_sum(bias, history, m) / kt).collect()
    }
}

fn sequential_sum(bias: &BiasPotential, history: &HistoryStore, cv: f64) -> f64 {
    history
        .cv_values()
        .iter()
        .zip(history.heights())
        .map(|(&c, &h)| bias.kernel(cv, c, h))
        .sum()
}

/// exp(β c(t)) from the full hill history.
pub fn ebetac(bias: &BiasPotential, history: &HistoryStore, grid: &Grid, kt: f64, gamma: f64) -> f64 {
    let c = reduced_bias_on_grid(bias, history, grid, kt);
    stabilized_ratio(&c, gamma)
}

/// Reweighting ratio from reduced grid biases with max-subtraction.
pub fn stabilized_ratio(c: &[f64], gamma: f64) -> f64 {
    let c_max = c.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let a = gamma / (gamma - 1.0);
    let b = 1.0 / (gamma - 1.0);

    let (num, denom) = c.iter().fold((0.0, 0.0), |(num, denom), &cm| {
        let shifted = cm - c_max;
        (num + (a * shifted).exp(), denom + (b * shifted).exp())
    });

    (num / denom) * c_max.exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Direct formula without the overflow shift.
    fn naive_ratio(c: &[f64], gamma: f64) -> f64 {
        let num: f64 = c.iter().map(|&cm| (gamma / (gamma - 1.0) * cm).exp()).sum();
        let denom: f64 = c.iter().map(|&cm| (cm / (gamma - 1.0)).exp()).sum();
        num / denom
    }

    fn test_history() -> HistoryStore {
        HistoryStore::from_columns(
            vec![1, 3, 5, 7, 9],
            vec![0.0, 0.1, -0.3, 0.5, 0.05],
            vec![1.0, 0.8, 0.9, 0.6, 0.5],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_history_gives_unity() {
        let grid = Grid::new(-1.0, 1.0, 5).unwrap();
        let bias = BiasPotential::new(0.1);
        let history = HistoryStore::new();
        let r = ebetac(&bias, &history, &grid, 1.0, 5.0);
        assert!(r.is_finite());
        assert_relative_eq!(r, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_shift_does_not_change_result() {
        let grid = Grid::new(-1.0, 1.0, 21).unwrap();
        let bias = BiasPotential::new(0.2);
        let history = test_history();

        for &gamma in &[1.5, 5.0, 20.0] {
            let c = reduced_bias_on_grid(&bias, &history, &grid, 0.8);
            let stable = ebetac(&bias, &history, &grid, 0.8, gamma);
            assert_relative_eq!(stable, naive_ratio(&c, gamma), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_large_bias_does_not_overflow() {
        let c = vec![600.0, 650.0, 700.0];
        let gamma = 1.1;
        // naive exponent would be 11 * 700 = 7700
        assert!(naive_ratio(&c, gamma).is_nan() || naive_ratio(&c, gamma).is_infinite());
        let shifted: Vec<f64> = c.iter().map(|x| x - 700.0).collect();
        let r = stabilized_ratio(&c, gamma);
        assert!(r.is_finite());
        assert_relative_eq!(r, naive_ratio(&shifted, gamma) * 700.0f64.exp(), max_relative = 1e-12);
    }

    /// ln Σ exp(x_i), accumulated pairwise without ever leaving log space.
    fn log_sum_exp(xs: impl Iterator<Item = f64>) -> f64 {
        xs.fold(f64::NEG_INFINITY, |acc, x| {
            if acc == f64::NEG_INFINITY {
                return x;
            }
            acc.max(x) + (-(acc - x).abs()).exp().ln_1p()
        })
    }

    #[test]
    fn test_large_bias_matches_log_space_reference() {
        let c = vec![512.25, 540.0, 575.5, 610.0, 633.75, 650.0];
        let gamma = 3.0;
        // 1.5 * 650 = 975 overflows the direct sum
        assert!(naive_ratio(&c, gamma).is_infinite());

        let ln_num = log_sum_exp(c.iter().map(|&cm| gamma / (gamma - 1.0) * cm));
        let ln_denom = log_sum_exp(c.iter().map(|&cm| cm / (gamma - 1.0)));
        let r = stabilized_ratio(&c, gamma);
        assert!(r.is_finite());
        assert_relative_eq!(r.ln(), ln_num - ln_denom, max_relative = 1e-12);
    }

    #[test]
    fn test_uniform_bias_factor() {
        // flat c gives exactly exp(c)
        let c = vec![2.0; 8];
        assert_relative_eq!(stabilized_ratio(&c, 4.0), 2.0f64.exp(), max_relative = 1e-12);
    }
}
