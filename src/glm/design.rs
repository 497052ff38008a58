use anyhow::{Result, bail};
use ndarray::Array2;

use crate::glm::hrf;

/// High-resolution samples per TR when building regressors.
pub const OVERSAMPLING: usize = 16;

/// L2 norm below which a sampled condition regressor counts as absent.
const VANISHING_NORM: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub onset: f64,
    pub duration: f64,
    pub category: usize,
}

#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub matrix: Array2<f64>,
    pub columns: Vec<String>,
    /// (category index, column) for every condition regressor.
    pub conditions: Vec<(usize, usize)>,
    /// Categories with events whose regressor vanishes at every frame time.
    pub unestimable: Vec<usize>,
}

impl DesignMatrix {
    pub fn n_frames(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_regressors(&self) -> usize {
        self.matrix.ncols()
    }
}

/// One event per maximal block of identical non-baseline labels in a run's
/// full (unfiltered) label sequence.
pub fn events_from_labels(
    labels: &[String],
    baseline: &str,
    categories: &[String],
    tr: f64,
) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    let mut i = 0;
    while i < labels.len() {
        let label = &labels[i];
        let mut j = i + 1;
        while j < labels.len() && labels[j] == *label {
            j += 1;
        }
        if label != baseline {
            let category = match categories.iter().position(|c| c == label) {
                Some(c) => c,
                None => bail!("label '{}' is not a known category", label),
            };
            events.push(Event {
                onset: i as f64 * tr,
                duration: (j - i) as f64 * tr,
                category,
            });
        }
        i = j;
    }
    Ok(events)
}

/// Condition regressors (HRF-convolved boxcars, only for categories with
/// events), cosine drifts below `high_pass` Hz, then an intercept. A
/// regressor that is zero at every frame time gets no column and is listed
/// in `unestimable`.
pub fn build_design(
    n_frames: usize,
    tr: f64,
    events: &[Event],
    categories: &[String],
    high_pass: f64,
) -> Result<DesignMatrix> {
    if n_frames < 2 {
        bail!("design needs at least 2 frames, got {}", n_frames);
    }
    if !(tr > 0.0) {
        bail!("repetition time must be positive, got {}", tr);
    }

    let mut present: Vec<usize> = events.iter().map(|e| e.category).collect();
    present.sort_unstable();
    present.dedup();

    let dt = tr / OVERSAMPLING as f64;
    let n_hi = n_frames * OVERSAMPLING;
    let kernel = hrf::kernel(dt);

    let mut regressors = Vec::with_capacity(present.len());
    let mut unestimable = Vec::new();
    for &category in &present {
        let mut boxcar = vec![0.0f64; n_hi];
        for event in events.iter().filter(|e| e.category == category) {
            for (k, v) in boxcar.iter_mut().enumerate() {
                let t = k as f64 * dt;
                if t >= event.onset && t < event.onset + event.duration {
                    *v = 1.0;
                }
            }
        }
        let response = hrf::convolve(&boxcar, &kernel);
        let sampled: Vec<f64> = (0..n_frames)
            .map(|frame| response[frame * OVERSAMPLING])
            .collect();
        let norm = sampled.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > VANISHING_NORM {
            regressors.push((category, sampled));
        } else {
            unestimable.push(category);
        }
    }

    let n_drift = cosine_order(n_frames, tr, high_pass);
    let n_conditions = regressors.len();
    let n_cols = n_conditions + n_drift + 1;
    let mut matrix = Array2::<f64>::zeros((n_frames, n_cols));
    let mut columns = Vec::with_capacity(n_cols);
    let mut conditions = Vec::with_capacity(n_conditions);

    for (col, (category, sampled)) in regressors.into_iter().enumerate() {
        for (frame, v) in sampled.into_iter().enumerate() {
            matrix[[frame, col]] = v;
        }
        let name = categories
            .get(category)
            .cloned()
            .unwrap_or_else(|| format!("category_{}", category));
        columns.push(name);
        conditions.push((category, col));
    }

    let norm = (2.0 / n_frames as f64).sqrt();
    for k in 1..=n_drift {
        let col = n_conditions + k - 1;
        for frame in 0..n_frames {
            let phase = std::f64::consts::PI / n_frames as f64 * (frame as f64 + 0.5) * k as f64;
            matrix[[frame, col]] = norm * phase.cos();
        }
        columns.push(format!("drift_{}", k));
    }

    matrix.column_mut(n_cols - 1).fill(1.0);
    columns.push("constant".to_string());

    Ok(DesignMatrix {
        matrix,
        columns,
        conditions,
        unestimable,
    })
}

/// Number of discrete cosine regressors with frequency below `high_pass`.
pub fn cosine_order(n_frames: usize, tr: f64, high_pass: f64) -> usize {
    if !(high_pass > 0.0) || n_frames < 2 {
        return 0;
    }
    let order = (2.0 * n_frames as f64 * high_pass * tr).floor() as usize;
    order.min(n_frames - 1)
}
