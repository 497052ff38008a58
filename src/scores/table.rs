/// Accuracy per (category, fold). Cells are `None` when the fold's test
/// set holds no sample of that category.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    pub categories: Vec<String>,
    pub held_out: Vec<u32>,
    pub fold_accuracy: Vec<f64>,
    cells: Vec<Vec<Option<f64>>>,
}

impl ScoreTable {
    pub fn new(categories: Vec<String>) -> Self {
        let cells = vec![Vec::new(); categories.len()];
        Self {
            categories,
            held_out: Vec::new(),
            fold_accuracy: Vec::new(),
            cells,
        }
    }

    pub fn push_fold(&mut self, held_out: u32, accuracy: f64, per_category: &[Option<f64>]) {
        self.held_out.push(held_out);
        self.fold_accuracy.push(accuracy);
        for (c, column) in self.cells.iter_mut().enumerate() {
            column.push(per_category.get(c).copied().flatten());
        }
    }

    pub fn n_folds(&self) -> usize {
        self.held_out.len()
    }

    pub fn get(&self, category: usize, fold: usize) -> Option<f64> {
        self.cells.get(category)?.get(fold).copied().flatten()
    }

    /// Mean over the folds where the category was tested.
    pub fn category_mean(&self, category: usize) -> Option<f64> {
        let values: Vec<f64> = self.cells.get(category)?.iter().flatten().copied().collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    pub fn mean_accuracy(&self) -> f64 {
        if self.fold_accuracy.is_empty() {
            return 0.0;
        }
        self.fold_accuracy.iter().sum::<f64>() / self.fold_accuracy.len() as f64
    }

    /// Expected accuracy of uniform guessing over balanced classes.
    pub fn chance(&self) -> f64 {
        if self.categories.is_empty() {
            0.0
        } else {
            1.0 / self.categories.len() as f64
        }
    }
}

/// Fraction of correct predictions per category; `None` for absent categories.
pub fn per_category_accuracy(truth: &[usize], predicted: &[usize], n_categories: usize) -> Vec<Option<f64>> {
    let mut total = vec![0usize; n_categories];
    let mut correct = vec![0usize; n_categories];
    for (&t, &p) in truth.iter().zip(predicted.iter()) {
        if t >= n_categories {
            continue;
        }
        total[t] += 1;
        if t == p {
            correct[t] += 1;
        }
    }
    total
        .iter()
        .zip(correct.iter())
        .map(|(&n, &k)| if n == 0 { None } else { Some(k as f64 / n as f64) })
        .collect()
}

pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}
