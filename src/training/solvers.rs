//! Optimisation routines behind [`LogisticRegression`](super::LogisticRegression)
//!
//! Parameters are kept in one flat buffer laid out as a row-major
//! `(n_features + 1) x n_classes` block whose last row holds the intercepts.
//! The objective is `mean log-loss + l1 * |W|_1 + l2 / 2 * |W|^2`; intercepts
//! are never penalised except by the one-vs-rest solver.

use crate::error::{Result, StarTypeError};
use ndarray::ArrayView2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Stopping rules shared by all solvers
#[derive(Debug, Clone)]
pub(crate) struct SolverOptions {
    pub max_iter: usize,
    pub tol: f64,
    pub random_state: u64,
}

/// Optimised parameters and convergence information
#[derive(Debug, Clone)]
pub(crate) struct Solution {
    pub theta: Vec<f64>,
    pub n_iter: usize,
    pub converged: bool,
}

/// Multinomial (softmax) logistic objective
pub(crate) struct Multinomial<'a> {
    x: ArrayView2<'a, f64>,
    y: &'a [usize],
    n_classes: usize,
    l1: f64,
    l2: f64,
}

impl<'a> Multinomial<'a> {
    pub fn new(x: ArrayView2<'a, f64>, y: &'a [usize], n_classes: usize, l1: f64, l2: f64) -> Self {
        Self { x, y, n_classes, l1, l2 }
    }

    pub fn n_params(&self) -> usize {
        (self.x.ncols() + 1) * self.n_classes
    }

    fn n_weights(&self) -> usize {
        self.x.ncols() * self.n_classes
    }

    /// Linear scores of sample `i`
    fn scores(&self, theta: &[f64], i: usize, out: &mut [f64]) {
        let k = self.n_classes;
        let d = self.x.ncols();
        out.copy_from_slice(&theta[d * k..]);
        for (j, &xij) in self.x.row(i).iter().enumerate() {
            let w = &theta[j * k..(j + 1) * k];
            for c in 0..k {
                out[c] += xij * w[c];
            }
        }
    }

    /// Turn scores into probabilities in place, returning log-sum-exp
    fn softmax(z: &mut [f64]) -> f64 {
        let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for v in z.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        for v in z.iter_mut() {
            *v /= sum;
        }
        max + sum.ln()
    }

    /// Gradient of the sample loss with respect to the scores: `p - onehot(y)`
    fn residual(&self, theta: &[f64], i: usize, out: &mut [f64]) {
        self.scores(theta, i, out);
        Self::softmax(out);
        out[self.y[i]] -= 1.0;
    }

    /// Smooth part of the objective and its gradient
    pub fn loss_grad(&self, theta: &[f64], grad: &mut [f64]) -> f64 {
        let k = self.n_classes;
        let d = self.x.ncols();
        let n = self.x.nrows();
        grad.iter_mut().for_each(|g| *g = 0.0);

        let mut z = vec![0.0; k];
        let mut loss = 0.0;
        for i in 0..n {
            self.scores(theta, i, &mut z);
            let target = z[self.y[i]];
            let lse = Self::softmax(&mut z);
            loss += lse - target;
            z[self.y[i]] -= 1.0;
            for (j, &xij) in self.x.row(i).iter().enumerate() {
                let g = &mut grad[j * k..(j + 1) * k];
                for c in 0..k {
                    g[c] += xij * z[c];
                }
            }
            for c in 0..k {
                grad[d * k + c] += z[c];
            }
        }

        let inv_n = 1.0 / n as f64;
        grad.iter_mut().for_each(|g| *g *= inv_n);
        let mut penalty = 0.0;
        for (g, &w) in grad[..d * k].iter_mut().zip(&theta[..d * k]) {
            *g += self.l2 * w;
            penalty += w * w;
        }
        loss * inv_n + 0.5 * self.l2 * penalty
    }

    /// Row-major `n x k` class probabilities
    fn probabilities(&self, theta: &[f64]) -> Vec<f64> {
        let k = self.n_classes;
        let mut probs = vec![0.0; self.x.nrows() * k];
        for (i, p) in probs.chunks_mut(k).enumerate() {
            self.scores(theta, i, p);
            Self::softmax(p);
        }
        probs
    }

    /// Hessian-vector product of the smooth objective at the point whose
    /// probabilities are `probs`
    fn hess_vec(&self, probs: &[f64], v: &[f64], out: &mut [f64]) {
        let k = self.n_classes;
        let d = self.x.ncols();
        let n = self.x.nrows();
        out.iter_mut().for_each(|o| *o = 0.0);

        let mut r = vec![0.0; k];
        for i in 0..n {
            self.scores(v, i, &mut r);
            let p = &probs[i * k..(i + 1) * k];
            let dot: f64 = p.iter().zip(&r).map(|(a, b)| a * b).sum();
            for c in 0..k {
                r[c] = p[c] * (r[c] - dot);
            }
            for (j, &xij) in self.x.row(i).iter().enumerate() {
                let o = &mut out[j * k..(j + 1) * k];
                for c in 0..k {
                    o[c] += xij * r[c];
                }
            }
            for c in 0..k {
                out[d * k + c] += r[c];
            }
        }

        let inv_n = 1.0 / n as f64;
        out.iter_mut().for_each(|o| *o *= inv_n);
        for (o, &vi) in out[..d * k].iter_mut().zip(&v[..d * k]) {
            *o += self.l2 * vi;
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn max_abs(a: &[f64]) -> f64 {
    a.iter().fold(0.0, |m, v| m.max(v.abs()))
}

fn soft_threshold(val: f64, threshold: f64) -> f64 {
    if val > threshold {
        val - threshold
    } else if val < -threshold {
        val + threshold
    } else {
        0.0
    }
}

fn non_finite(solver: &str) -> StarTypeError {
    StarTypeError::ComputationError(format!("{} produced non-finite coefficients", solver))
}

/// Backtracking Armijo line search along `direction`.
/// Returns the accepted point, its loss and gradient.
fn line_search(
    objective: &Multinomial,
    theta: &[f64],
    loss: f64,
    slope: f64,
    direction: &[f64],
) -> Option<(Vec<f64>, f64, Vec<f64>)> {
    let mut step = 1.0;
    let mut grad = vec![0.0; theta.len()];
    for _ in 0..60 {
        let candidate: Vec<f64> = theta.iter().zip(direction).map(|(t, d)| t + step * d).collect();
        let new_loss = objective.loss_grad(&candidate, &mut grad);
        if new_loss.is_finite() && new_loss <= loss + 1e-4 * step * slope {
            return Some((candidate, new_loss, grad));
        }
        step *= 0.5;
    }
    None
}

/// Limited-memory BFGS on the smooth objective
pub(crate) fn lbfgs(objective: &Multinomial, options: &SolverOptions) -> Result<Solution> {
    const MEMORY: usize = 10;

    let n_params = objective.n_params();
    let mut theta = vec![0.0; n_params];
    let mut grad = vec![0.0; n_params];
    let mut loss = objective.loss_grad(&theta, &mut grad);
    let mut history: VecDeque<(Vec<f64>, Vec<f64>, f64)> = VecDeque::with_capacity(MEMORY);

    for iter in 0..options.max_iter {
        if max_abs(&grad) <= options.tol {
            return Ok(Solution { theta, n_iter: iter, converged: true });
        }

        // two-loop recursion
        let mut q = grad.clone();
        let mut alphas = Vec::with_capacity(history.len());
        for (s, y, rho) in history.iter().rev() {
            let a = rho * dot(s, &q);
            q.iter_mut().zip(y).for_each(|(qi, yi)| *qi -= a * yi);
            alphas.push(a);
        }
        let gamma = match history.back() {
            Some((s, y, _)) => dot(s, y) / dot(y, y),
            None => 1.0 / dot(&grad, &grad).sqrt().max(1.0),
        };
        q.iter_mut().for_each(|qi| *qi *= gamma);
        for ((s, y, rho), a) in history.iter().zip(alphas.iter().rev()) {
            let b = rho * dot(y, &q);
            q.iter_mut().zip(s).for_each(|(qi, si)| *qi += si * (a - b));
        }

        let mut direction: Vec<f64> = q.iter().map(|v| -v).collect();
        let mut slope = dot(&grad, &direction);
        if !(slope < 0.0) {
            history.clear();
            let norm = dot(&grad, &grad).sqrt().max(1.0);
            direction = grad.iter().map(|g| -g / norm).collect();
            slope = dot(&grad, &direction);
        }

        let Some((new_theta, new_loss, new_grad)) = line_search(objective, &theta, loss, slope, &direction) else {
            // no decrease possible along a descent direction: stationary up to precision
            return Ok(Solution { theta, n_iter: iter, converged: true });
        };

        let s: Vec<f64> = new_theta.iter().zip(&theta).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = new_grad.iter().zip(&grad).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);
        if sy > 1e-12 {
            if history.len() == MEMORY {
                history.pop_front();
            }
            history.push_back((s, y, 1.0 / sy));
        }

        theta = new_theta;
        grad = new_grad;
        loss = new_loss;
    }

    if !loss.is_finite() || theta.iter().any(|v| !v.is_finite()) {
        return Err(non_finite("lbfgs"));
    }
    let converged = max_abs(&grad) <= options.tol;
    Ok(Solution { theta, n_iter: options.max_iter, converged })
}

/// Truncated Newton: conjugate gradient on Hessian-vector products
pub(crate) fn newton_cg(objective: &Multinomial, options: &SolverOptions) -> Result<Solution> {
    let n_params = objective.n_params();
    let mut theta = vec![0.0; n_params];
    let mut grad = vec![0.0; n_params];
    let mut loss = objective.loss_grad(&theta, &mut grad);
    let mut hd = vec![0.0; n_params];

    for iter in 0..options.max_iter {
        if max_abs(&grad) <= options.tol {
            return Ok(Solution { theta, n_iter: iter, converged: true });
        }

        let probs = objective.probabilities(&theta);
        let grad_norm = dot(&grad, &grad).sqrt();
        let cg_tol = grad_norm.sqrt().min(0.5) * grad_norm;

        let mut step = vec![0.0; n_params];
        let mut residual: Vec<f64> = grad.iter().map(|g| -g).collect();
        let mut search = residual.clone();
        let mut rs = dot(&residual, &residual);
        for cg_iter in 0..(2 * n_params).max(20) {
            if rs.sqrt() <= cg_tol {
                break;
            }
            objective.hess_vec(&probs, &search, &mut hd);
            let curvature = dot(&search, &hd);
            if curvature <= 1e-12 * dot(&search, &search) {
                if cg_iter == 0 {
                    step = residual.clone();
                }
                break;
            }
            let alpha = rs / curvature;
            step.iter_mut().zip(&search).for_each(|(p, d)| *p += alpha * d);
            residual.iter_mut().zip(&hd).for_each(|(r, h)| *r -= alpha * h);
            let rs_new = dot(&residual, &residual);
            let beta = rs_new / rs;
            search.iter_mut().zip(&residual).for_each(|(d, r)| *d = r + beta * *d);
            rs = rs_new;
        }

        let slope = dot(&grad, &step);
        if !(slope < 0.0) {
            return Ok(Solution { theta, n_iter: iter, converged: true });
        }
        let Some((new_theta, new_loss, new_grad)) = line_search(objective, &theta, loss, slope, &step) else {
            return Ok(Solution { theta, n_iter: iter, converged: true });
        };
        theta = new_theta;
        grad = new_grad;
        loss = new_loss;
    }

    if !loss.is_finite() || theta.iter().any(|v| !v.is_finite()) {
        return Err(non_finite("newton-cg"));
    }
    let converged = max_abs(&grad) <= options.tol;
    Ok(Solution { theta, n_iter: options.max_iter, converged })
}

/// Stochastic average gradient. With `saga` set the update uses the
/// unbiased SAGA estimator followed by an L1 proximal step.
pub(crate) fn stochastic_average(objective: &Multinomial, options: &SolverOptions, saga: bool) -> Result<Solution> {
    let solver = if saga { "saga" } else { "sag" };
    let x = objective.x;
    let n = x.nrows();
    let d = x.ncols();
    let k = objective.n_classes;
    let n_weights = objective.n_weights();

    let max_sq = x
        .rows()
        .into_iter()
        .map(|row| row.dot(&row))
        .fold(0.0, f64::max);
    // per-sample softmax loss curvature is bounded by 0.5 * |x|^2 (+1 for the intercept)
    let lipschitz = 0.5 * (max_sq + 1.0) + objective.l2;
    let step = if saga { 1.0 / (3.0 * lipschitz) } else { 1.0 / lipschitz };

    let mut theta = vec![0.0; objective.n_params()];
    let mut memory = vec![0.0; n * k];
    let mut sum_grad = vec![0.0; objective.n_params()];
    let mut seen = vec![false; n];
    let mut n_seen = 0usize;
    let mut r = vec![0.0; k];
    let mut delta = vec![0.0; k];
    let mut rng = ChaCha8Rng::seed_from_u64(options.random_state);

    for epoch in 0..options.max_iter {
        let previous = theta.clone();

        for _ in 0..n {
            let i = rng.gen_range(0..n);
            objective.residual(&theta, i, &mut r);
            let stored = &mut memory[i * k..(i + 1) * k];
            for c in 0..k {
                delta[c] = r[c] - stored[c];
            }
            stored.copy_from_slice(&r);
            let row = x.row(i);

            if saga {
                let inv_n = 1.0 / n as f64;
                for (j, &xij) in row.iter().enumerate() {
                    for c in 0..k {
                        let idx = j * k + c;
                        let g = xij * delta[c] + sum_grad[idx] * inv_n + objective.l2 * theta[idx];
                        theta[idx] = soft_threshold(theta[idx] - step * g, step * objective.l1);
                        sum_grad[idx] += xij * delta[c];
                    }
                }
                for c in 0..k {
                    let idx = d * k + c;
                    let g = delta[c] + sum_grad[idx] * inv_n;
                    theta[idx] -= step * g;
                    sum_grad[idx] += delta[c];
                }
            } else {
                if !seen[i] {
                    seen[i] = true;
                    n_seen += 1;
                }
                for (j, &xij) in row.iter().enumerate() {
                    for c in 0..k {
                        sum_grad[j * k + c] += xij * delta[c];
                    }
                }
                for c in 0..k {
                    sum_grad[d * k + c] += delta[c];
                }
                let inv_seen = 1.0 / n_seen as f64;
                for (idx, t) in theta.iter_mut().enumerate() {
                    let mut g = sum_grad[idx] * inv_seen;
                    if idx < n_weights {
                        g += objective.l2 * *t;
                    }
                    *t -= step * g;
                }
            }
        }

        if theta.iter().any(|v| !v.is_finite()) {
            return Err(non_finite(solver));
        }
        let change = theta.iter().zip(&previous).fold(0.0f64, |m, (a, b)| m.max((a - b).abs()));
        let scale = max_abs(&theta);
        if scale > 0.0 && change / scale <= options.tol {
            return Ok(Solution { theta, n_iter: epoch + 1, converged: true });
        }
    }

    Ok(Solution { theta, n_iter: options.max_iter, converged: false })
}

/// One-vs-rest binary problems solved with accelerated proximal gradient.
/// The intercept is treated as an extra constant feature and penalised
/// together with the weights.
pub(crate) fn one_vs_rest(objective: &Multinomial, options: &SolverOptions) -> Result<Solution> {
    let x = objective.x;
    let n = x.nrows();
    let d = x.ncols();
    let k = objective.n_classes;
    let mut theta = vec![0.0; objective.n_params()];

    // binary problems only need one classifier; column 0 stays at zero
    let positives: Vec<usize> = if k == 2 { vec![1] } else { (0..k).collect() };

    let mean_sq = x.rows().into_iter().map(|row| row.dot(&row) + 1.0).sum::<f64>() / n as f64;
    let lipschitz = 0.25 * mean_sq + objective.l2;
    let step = 1.0 / lipschitz;

    let mut n_iter = 0;
    let mut converged = true;
    for &positive in &positives {
        let target: Vec<f64> = objective
            .y
            .iter()
            .map(|&c| if c == positive { 1.0 } else { -1.0 })
            .collect();

        let mut w = vec![0.0; d + 1];
        let mut momentum = w.clone();
        let mut t = 1.0f64;
        let mut grad = vec![0.0; d + 1];
        let mut class_converged = false;

        for iter in 0..options.max_iter {
            // gradient of the mean logistic loss at the extrapolated point
            grad.iter_mut().for_each(|g| *g = 0.0);
            for (i, row) in x.rows().into_iter().enumerate() {
                let margin = target[i] * (row.dot(&ndarray::ArrayView1::from(&momentum[..d])) + momentum[d]);
                let coef = -target[i] / (1.0 + margin.exp());
                for (j, &xij) in row.iter().enumerate() {
                    grad[j] += coef * xij;
                }
                grad[d] += coef;
            }

            let mut next = vec![0.0; d + 1];
            for j in 0..=d {
                let g = grad[j] / n as f64 + objective.l2 * momentum[j];
                next[j] = soft_threshold(momentum[j] - step * g, step * objective.l1);
            }

            let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            let change = next.iter().zip(&w).fold(0.0f64, |m, (a, b)| m.max((a - b).abs()));
            for j in 0..=d {
                momentum[j] = next[j] + ((t - 1.0) / t_next) * (next[j] - w[j]);
            }
            w = next;
            t = t_next;
            n_iter = n_iter.max(iter + 1);

            if w.iter().any(|v| !v.is_finite()) {
                return Err(non_finite("liblinear"));
            }
            if change <= options.tol * max_abs(&w).max(1.0) {
                class_converged = true;
                break;
            }
        }
        converged &= class_converged;

        for j in 0..=d {
            theta[j * k + positive] = w[j];
        }
    }

    Ok(Solution { theta, n_iter, converged })
}
