//! L2-regularised linear SVM trained by dual coordinate descent
//! (Hsieh et al., ICML 2008). The bias is learned as the weight of a
//! constant feature and is regularised with the rest.

use anyhow::{Result, bail};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    Hinge,
    SquaredHinge,
}

impl Loss {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hinge => "hinge",
            Self::SquaredHinge => "squared_hinge",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvmParams {
    pub c: f64,
    pub loss: Loss,
    pub max_iter: usize,
    pub tol: f64,
    pub seed: u64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            loss: Loss::SquaredHinge,
            max_iter: 1000,
            tol: 1e-4,
            seed: 0,
        }
    }
}

impl SvmParams {
    pub fn with_c(&self, c: f64) -> Self {
        Self { c, ..self.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitReport {
    /// Largest epoch count over the one-vs-rest machines.
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct LinearSvc {
    params: SvmParams,
    n_classes: usize,
    coef: Array2<f64>,
    intercept: Array1<f64>,
}

impl LinearSvc {
    pub fn new(params: SvmParams) -> Self {
        Self {
            params,
            n_classes: 0,
            coef: Array2::zeros((0, 0)),
            intercept: Array1::zeros(0),
        }
    }

    /// One weight row per machine: a single row for two classes (positive =
    /// class 1), otherwise one row per class.
    pub fn coef(&self) -> &Array2<f64> {
        &self.coef
    }

    pub fn intercept(&self) -> &Array1<f64> {
        &self.intercept
    }

    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize], n_classes: usize) -> Result<FitReport> {
        if x.nrows() != y.len() {
            bail!("feature rows ({}) and labels ({}) differ", x.nrows(), y.len());
        }
        if x.nrows() == 0 {
            bail!("cannot fit on zero samples");
        }
        if n_classes < 2 {
            bail!("classification needs at least 2 classes, got {}", n_classes);
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            bail!("label index {} out of range for {} classes", bad, n_classes);
        }
        if !(self.params.c > 0.0) {
            bail!("C must be positive, got {}", self.params.c);
        }

        let n_machines = if n_classes == 2 { 1 } else { n_classes };
        let mut coef = Array2::<f64>::zeros((n_machines, x.ncols()));
        let mut intercept = Array1::<f64>::zeros(n_machines);
        let mut report = FitReport {
            iterations: 0,
            converged: true,
        };

        for k in 0..n_machines {
            let positive = if n_machines == 1 { 1 } else { k };
            let signs: Vec<f64> = y
                .iter()
                .map(|&c| if c == positive { 1.0 } else { -1.0 })
                .collect();
            let seed = self.params.seed.wrapping_add(k as u64);
            let (w, b, iterations, converged) = solve_dual(x, &signs, &self.params, seed);
            coef.row_mut(k).assign(&w);
            intercept[k] = b;
            report.iterations = report.iterations.max(iterations);
            report.converged &= converged;
        }

        self.n_classes = n_classes;
        self.coef = coef;
        self.intercept = intercept;
        Ok(report)
    }

    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if self.n_classes == 0 {
            bail!("classifier is not fitted");
        }
        if x.ncols() != self.coef.ncols() {
            bail!(
                "classifier fitted on {} features, got {}",
                self.coef.ncols(),
                x.ncols()
            );
        }
        let mut scores = x.dot(&self.coef.t());
        for mut row in scores.rows_mut() {
            row += &self.intercept;
        }
        Ok(scores)
    }

    /// Ties resolve to the lowest class index.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        let scores = self.decision_function(x)?;
        if self.n_classes == 2 {
            return Ok(scores.column(0).iter().map(|&s| usize::from(s > 0.0)).collect());
        }
        Ok(scores.rows().into_iter().map(argmax).collect())
    }
}

fn argmax(row: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

fn solve_dual(
    x: ArrayView2<'_, f64>,
    signs: &[f64],
    params: &SvmParams,
    seed: u64,
) -> (Array1<f64>, f64, usize, bool) {
    let n = x.nrows();
    let (upper, diag) = match params.loss {
        Loss::Hinge => (params.c, 0.0),
        Loss::SquaredHinge => (f64::INFINITY, 0.5 / params.c),
    };
    let q_diag: Vec<f64> = x
        .rows()
        .into_iter()
        .map(|row| row.dot(&row) + 1.0 + diag)
        .collect();

    let mut alpha = vec![0.0f64; n];
    let mut w = Array1::<f64>::zeros(x.ncols());
    let mut b = 0.0f64;
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    for iter in 0..params.max_iter {
        order.shuffle(&mut rng);
        let mut pg_max = f64::NEG_INFINITY;
        let mut pg_min = f64::INFINITY;
        for &i in &order {
            let row = x.row(i);
            let yi = signs[i];
            let g = yi * (row.dot(&w) + b) - 1.0 + diag * alpha[i];
            let pg = if alpha[i] == 0.0 {
                g.min(0.0)
            } else if alpha[i] == upper {
                g.max(0.0)
            } else {
                g
            };
            pg_max = pg_max.max(pg);
            pg_min = pg_min.min(pg);
            if pg.abs() > 1e-12 {
                let old = alpha[i];
                alpha[i] = (old - g / q_diag[i]).max(0.0).min(upper);
                let d = (alpha[i] - old) * yi;
                w.scaled_add(d, &row);
                b += d;
            }
        }
        if pg_max - pg_min <= params.tol {
            return (w, b, iter + 1, true);
        }
    }
    (w, b, params.max_iter, false)
}
