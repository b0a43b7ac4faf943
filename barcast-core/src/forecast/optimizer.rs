//! Nelder–Mead simplex minimizer with pinned settings.
//!
//! Used for the exact-likelihood stage of the ARIMA fit. Every parameter that
//! affects the result is explicit in `NelderMeadConfig`, so a given objective
//! and start point always produce the same minimum.

use serde::{Deserialize, Serialize};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NelderMeadConfig {
    /// Offset added to each coordinate of the start point to build the initial simplex.
    pub initial_step: f64,
    pub max_iterations: usize,
    /// Spread bound: `f_worst - f_best <= f_tolerance * (1 + |f_best|)`.
    pub f_tolerance: f64,
    /// Diameter bound: every vertex lies within this distance (per coordinate) of the best.
    pub x_tolerance: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            initial_step: 0.05,
            max_iterations: 5000,
            f_tolerance: 1e-10,
            x_tolerance: 1e-10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimize `f` starting from `start`.
///
/// `f` may return `f64::INFINITY` for infeasible points; such vertices are
/// always ranked worst and replaced.
pub fn minimize<F>(f: F, start: &[f64], config: &NelderMeadConfig) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let dim = start.len();
    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dim + 1);
    simplex.push((start.to_vec(), eval(start)));
    for i in 0..dim {
        let mut vertex = start.to_vec();
        vertex[i] += config.initial_step;
        let value = eval(&vertex);
        simplex.push((vertex, value));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

        if has_converged(&simplex, config) {
            converged = true;
            break;
        }
        iterations += 1;

        let best = simplex[0].1;
        let second_worst = simplex[dim - 1].1;
        let worst = simplex[dim].1;

        let centroid: Vec<f64> = (0..dim)
            .map(|j| simplex[..dim].iter().map(|(x, _)| x[j]).sum::<f64>() / dim as f64)
            .collect();
        let toward = |coef: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&simplex[dim].0)
                .map(|(c, w)| c + coef * (c - w))
                .collect()
        };

        let reflected = toward(REFLECTION);
        let f_reflected = eval(&reflected);

        if f_reflected < best {
            let expanded = toward(EXPANSION);
            let f_expanded = eval(&expanded);
            simplex[dim] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
            continue;
        }

        if f_reflected < second_worst {
            simplex[dim] = (reflected, f_reflected);
            continue;
        }

        // Contract outside if the reflection beat the worst vertex, inside otherwise.
        let (contracted, f_contracted) = if f_reflected < worst {
            let x = toward(REFLECTION * CONTRACTION);
            let v = eval(&x);
            (x, v)
        } else {
            let x = toward(-CONTRACTION);
            let v = eval(&x);
            (x, v)
        };

        if f_contracted < worst.min(f_reflected) {
            simplex[dim] = (contracted, f_contracted);
            continue;
        }

        let best_point = simplex[0].0.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk: Vec<f64> = best_point
                .iter()
                .zip(&vertex.0)
                .map(|(b, x)| b + SHRINK * (x - b))
                .collect();
            let value = eval(&shrunk);
            *vertex = (shrunk, value);
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    if !converged {
        converged = has_converged(&simplex, config);
    }
    let (point, value) = simplex.swap_remove(0);

    Minimum {
        point,
        value,
        iterations,
        converged,
    }
}

/// Converged only when both the spread and the diameter bounds hold.
///
/// Simplex must be sorted ascending by value.
fn has_converged(simplex: &[(Vec<f64>, f64)], config: &NelderMeadConfig) -> bool {
    let best = simplex[0].1;
    let worst = simplex[simplex.len() - 1].1;
    if !best.is_finite() || !worst.is_finite() {
        return false;
    }
    if worst - best > config.f_tolerance * (1.0 + best.abs()) {
        return false;
    }
    let diameter = simplex[1..]
        .iter()
        .flat_map(|(x, _)| x.iter().zip(&simplex[0].0).map(|(a, b)| (a - b).abs()))
        .fold(0.0_f64, f64::max);
    diameter <= config.x_tolerance
}
