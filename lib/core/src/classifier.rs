//! Multinomial logistic regression
//!
//! Softmax regression with an L2 penalty on the weights (not the intercept),
//! fitted by full-batch gradient descent with a backtracking line search.
//! Inputs are standardized with the training mean and standard deviation,
//! which are kept and reapplied at prediction time.
//!
//! The objective matches the usual `C`-parameterized form divided by `C * n`:
//!
//! ```text
//! L(W, b) = -1/n * sum_i log p(y_i | x_i) + 1/(2 C n) * ||W||^2
//! ```

use crate::{Error, Result};
use ndarray::{Array1, Array2, Axis};
use tracing::{trace, warn};

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Iteration cap
    pub max_iter: usize,
    /// Converged once every gradient component is below this
    pub tolerance: f64,
    /// Inverse regularization strength
    pub c: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-4,
            c: 1.0,
        }
    }
}

/// A fitted classifier
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    classes: Vec<String>,
    mean: Array1<f64>,
    scale: Array1<f64>,
    /// features x classes
    weights: Array2<f64>,
    intercept: Array1<f64>,
    n_iter: usize,
    converged: bool,
}

impl LogisticRegression {
    /// Fit on `x` against class indices `targets` into `classes`
    ///
    /// Running out of iterations is not an error: the best-effort
    /// coefficients are kept and a warning is logged.
    pub fn fit(
        x: &Array2<f64>,
        targets: &[usize],
        classes: Vec<String>,
        config: &SolverConfig,
    ) -> Result<Self> {
        let (n, d) = x.dim();
        let k = classes.len();
        if n == 0 || k < 2 {
            return Err(Error::InsufficientData(format!(
                "cannot fit a classifier on {} rows and {} classes",
                n, k
            )));
        }
        if targets.len() != n {
            return Err(Error::SchemaMismatch(format!(
                "{} feature rows but {} targets",
                n,
                targets.len()
            )));
        }
        check_finite(x)?;

        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(d));
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });
        let z = (x - &mean) / &scale;

        let y = Array2::from_shape_fn((n, k), |(i, j)| if targets[i] == j { 1.0 } else { 0.0 });
        let lambda = 1.0 / (config.c * n as f64);

        let mut weights = Array2::<f64>::zeros((d, k));
        let mut intercept = Array1::<f64>::zeros(k);
        let mut step = 1.0;
        let mut converged = false;
        let mut n_iter = 0;

        while n_iter < config.max_iter {
            let (loss, grad_w, grad_b) = objective(&z, &y, &weights, &intercept, lambda);

            let diverged = !loss.is_finite() || grad_w.iter().chain(grad_b.iter()).any(|g| !g.is_finite());
            if diverged {
                return Err(Error::SchemaMismatch(format!(
                    "solver diverged after {} iterations: non-finite loss or gradient",
                    n_iter
                )));
            }

            let grad_max = grad_w
                .iter()
                .chain(grad_b.iter())
                .fold(0.0f64, |m, g| m.max(g.abs()));
            if grad_max < config.tolerance {
                converged = true;
                break;
            }

            let grad_sq: f64 = grad_w.iter().chain(grad_b.iter()).map(|g| g * g).sum();
            loop {
                let candidate_w = &weights - &(&grad_w * step);
                let candidate_b = &intercept - &(&grad_b * step);
                let candidate_loss = loss_only(&z, &y, &candidate_w, &candidate_b, lambda);
                if candidate_loss <= loss - 0.5 * step * grad_sq || step < 1e-12 {
                    weights = candidate_w;
                    intercept = candidate_b;
                    break;
                }
                step *= 0.5;
            }

            n_iter += 1;
            trace!(iteration = n_iter, loss, step, "logistic regression step");
            step = (step * 2.0).min(1e3);
        }

        if !converged {
            warn!(
                max_iter = config.max_iter,
                "logistic regression did not converge; keeping best-effort coefficients"
            );
        }

        Ok(Self {
            classes,
            mean,
            scale,
            weights,
            intercept,
            n_iter,
            converged,
        })
    }

    /// Class labels, in the order of probability columns
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_features(&self) -> usize {
        self.mean.len()
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Per-class probabilities, one row per input row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.num_features() {
            return Err(Error::SchemaMismatch(format!(
                "classifier expects {} features, got {}",
                self.num_features(),
                x.ncols()
            )));
        }
        check_finite(x)?;
        let z = (x - &self.mean) / &self.scale;
        let mut probs = z.dot(&self.weights) + &self.intercept;
        softmax_rows(&mut probs);
        Ok(probs)
    }

    /// Most probable class index per row; ties go to the earlier class
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let probs = self.predict_proba(x)?;
        Ok(probs.rows().into_iter().map(|row| argmax(row.iter().copied())).collect())
    }
}

/// Index of the largest value, first one on ties
pub fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

fn check_finite(x: &Array2<f64>) -> Result<()> {
    match x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), v)) => Err(Error::SchemaMismatch(format!(
            "non-finite value {} at row {}, column {}",
            v, row, col
        ))),
        None => Ok(()),
    }
}

fn softmax_rows(logits: &mut Array2<f64>) {
    for mut row in logits.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
}

fn probabilities(z: &Array2<f64>, weights: &Array2<f64>, intercept: &Array1<f64>) -> Array2<f64> {
    let mut probs = z.dot(weights) + intercept;
    softmax_rows(&mut probs);
    probs
}

fn penalized_loss(probs: &Array2<f64>, y: &Array2<f64>, weights: &Array2<f64>, lambda: f64) -> f64 {
    let n = probs.nrows() as f64;
    let log_likelihood: f64 = probs
        .iter()
        .zip(y.iter())
        .filter(|(_, t)| **t > 0.0)
        .map(|(&p, _)| p.max(1e-300).ln())
        .sum();
    let penalty: f64 = weights.iter().map(|w| w * w).sum();
    -log_likelihood / n + 0.5 * lambda * penalty
}

fn loss_only(
    z: &Array2<f64>,
    y: &Array2<f64>,
    weights: &Array2<f64>,
    intercept: &Array1<f64>,
    lambda: f64,
) -> f64 {
    penalized_loss(&probabilities(z, weights, intercept), y, weights, lambda)
}

fn objective(
    z: &Array2<f64>,
    y: &Array2<f64>,
    weights: &Array2<f64>,
    intercept: &Array1<f64>,
    lambda: f64,
) -> (f64, Array2<f64>, Array1<f64>) {
    let n = z.nrows() as f64;
    let probs = probabilities(z, weights, intercept);
    let loss = penalized_loss(&probs, y, weights, lambda);

    let diff = probs - y;
    let grad_w = z.t().dot(&diff) / n + weights * lambda;
    let grad_b = diff.sum_axis(Axis(0)) / n;
    (loss, grad_w, grad_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_separable_binary() {
        let x = array![[0.0], [1.0], [2.0], [8.0], [9.0], [10.0]];
        let y = vec![0, 0, 0, 1, 1, 1];
        let model = LogisticRegression::fit(&x, &y, classes(&["low", "high"]), &SolverConfig::default()).unwrap();

        assert_eq!(model.predict(&x).unwrap(), y);
        let probs = model.predict_proba(&array![[-5.0], [15.0]]).unwrap();
        assert!(probs[[0, 0]] > 0.9);
        assert!(probs[[1, 1]] > 0.9);
    }

    #[test]
    fn test_three_classes() {
        let x = array![
            [0.0, 0.0], [0.2, 0.1], [0.1, 0.3],
            [5.0, 0.0], [5.2, 0.3], [4.9, 0.1],
            [0.0, 5.0], [0.3, 5.1], [0.1, 4.8],
        ];
        let y = vec![0, 0, 0, 1, 1, 1, 2, 2, 2];
        let model = LogisticRegression::fit(&x, &y, classes(&["a", "b", "c"]), &SolverConfig::default()).unwrap();

        assert_eq!(model.classes().len(), 3);
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let x = array![[1.0, 200.0], [2.0, -50.0], [3.0, 1e6], [4.0, 0.0]];
        let y = vec![0, 1, 2, 0];
        let model = LogisticRegression::fit(&x, &y, classes(&["a", "b", "c"]), &SolverConfig::default()).unwrap();

        let probs = model.predict_proba(&x).unwrap();
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn test_constant_feature_handled() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = vec![0, 1, 0, 1];
        let model = LogisticRegression::fit(&x, &y, classes(&["no", "yes"]), &SolverConfig::default()).unwrap();
        let probs = model.predict_proba(&x).unwrap();
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_iteration_cap_is_not_fatal() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = vec![0, 1, 0, 1];
        let config = SolverConfig { max_iter: 1, ..SolverConfig::default() };
        let model = LogisticRegression::fit(&x, &y, classes(&["a", "b"]), &config).unwrap();
        assert!(!model.converged());
        assert_eq!(model.n_iter(), 1);
    }

    #[test]
    fn test_feature_count_checked() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let model = LogisticRegression::fit(&x, &[0, 0, 1, 1], classes(&["a", "b"]), &SolverConfig::default()).unwrap();
        assert!(matches!(
            model.predict_proba(&array![[1.0, 2.0]]),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let x = array![[0.0], [f64::NAN], [2.0], [3.0]];
        let result = LogisticRegression::fit(&x, &[0, 0, 1, 1], classes(&["a", "b"]), &SolverConfig::default());
        assert!(matches!(result, Err(Error::SchemaMismatch(_))));

        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let model = LogisticRegression::fit(&x, &[0, 0, 1, 1], classes(&["a", "b"]), &SolverConfig::default()).unwrap();
        assert!(matches!(
            model.predict_proba(&array![[f64::INFINITY]]),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[0.0], [1.0]];
        assert!(LogisticRegression::fit(&x, &[0, 0], classes(&["a"]), &SolverConfig::default()).is_err());
    }

    #[test]
    fn test_argmax_ties_first() {
        assert_eq!(argmax([0.25, 0.5, 0.25].into_iter()), 1);
        assert_eq!(argmax([0.5, 0.5].into_iter()), 0);
    }
}
