//! Leave-one-run-out splitting.

use std::collections::BTreeSet;

use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub index: usize,
    pub held_out: u32,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Yields one fold per distinct run, ascending by run id. Index sets are
/// computed on demand.
#[derive(Debug, Clone)]
pub struct LeaveOneRunOut<'a> {
    runs: &'a [u32],
    groups: Vec<u32>,
    next: usize,
}

impl<'a> LeaveOneRunOut<'a> {
    pub fn new(runs: &'a [u32]) -> Result<Self> {
        if runs.is_empty() {
            bail!("cannot split an empty run vector");
        }
        let groups: Vec<u32> = runs
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if groups.len() < 2 {
            bail!(
                "leave-one-run-out needs at least 2 distinct runs, found {}",
                groups.len()
            );
        }
        Ok(Self {
            runs,
            groups,
            next: 0,
        })
    }

    pub fn n_folds(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[u32] {
        &self.groups
    }
}

impl Iterator for LeaveOneRunOut<'_> {
    type Item = Fold;

    fn next(&mut self) -> Option<Fold> {
        let held_out = *self.groups.get(self.next)?;
        let index = self.next;
        self.next += 1;
        let mut train = Vec::with_capacity(self.runs.len());
        let mut test = Vec::new();
        for (i, &run) in self.runs.iter().enumerate() {
            if run == held_out {
                test.push(i);
            } else {
                train.push(i);
            }
        }
        Some(Fold {
            index,
            held_out,
            train,
            test,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.groups.len() - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for LeaveOneRunOut<'_> {}
