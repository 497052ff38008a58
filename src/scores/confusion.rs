use anyhow::{Result, bail};
use ndarray::Array2;

/// Square count table: row = true category, column = predicted category.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    pub categories: Vec<String>,
    pub counts: Array2<u64>,
}

impl ConfusionMatrix {
    pub fn new(categories: Vec<String>) -> Self {
        let n = categories.len();
        Self {
            categories,
            counts: Array2::zeros((n, n)),
        }
    }

    pub fn from_predictions(categories: Vec<String>, truth: &[usize], predicted: &[usize]) -> Result<Self> {
        let mut cm = Self::new(categories);
        cm.add(truth, predicted)?;
        Ok(cm)
    }

    pub fn add(&mut self, truth: &[usize], predicted: &[usize]) -> Result<()> {
        if truth.len() != predicted.len() {
            bail!(
                "true ({}) and predicted ({}) label sequences differ in length",
                truth.len(),
                predicted.len()
            );
        }
        let n = self.categories.len();
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            if t >= n || p >= n {
                bail!("label index out of range for {} categories", n);
            }
            self.counts[[t, p]] += 1;
        }
        Ok(())
    }

    pub fn row_sum(&self, category: usize) -> u64 {
        self.counts.row(category).sum()
    }

    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.counts.diag().sum() as f64 / total as f64
    }
}
