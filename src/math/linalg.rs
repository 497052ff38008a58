use anyhow::{Result, bail};
use faer::linalg::solvers::{Llt, Solve};
use faer::{Mat, Side};
use ndarray::{Array1, Array2, ArrayView2};

/// Relative pivot threshold below which a Gram matrix is treated as singular.
const PIVOT_EPS: f64 = 1e-10;

fn array_to_faer(array: ArrayView2<'_, f64>) -> Mat<f64> {
    let (rows, cols) = array.dim();
    Mat::from_fn(rows, cols, |i, j| array[[i, j]])
}

fn mat_to_array(mat: &Mat<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

/// LLᵀ factor of a symmetric positive definite matrix.
pub struct Cholesky {
    llt: Llt<f64>,
    n: usize,
}

impl Cholesky {
    /// Fails when the matrix is not square, not positive definite, or has a
    /// pivot that is negligible relative to its largest diagonal entry.
    pub fn factor(a: ArrayView2<'_, f64>) -> Result<Self> {
        let n = a.nrows();
        if a.ncols() != n {
            bail!("cholesky requires a square matrix, got {}x{}", n, a.ncols());
        }
        let scale = (0..n).map(|i| a[[i, i]].abs()).fold(0.0f64, f64::max).max(1.0);
        let mat = array_to_faer(a);
        let llt = match mat.as_ref().llt(Side::Lower) {
            Ok(llt) => llt,
            Err(err) => bail!("matrix is singular or not positive definite ({:?})", err),
        };
        let l = llt.L();
        for j in 0..n {
            let d = l[(j, j)];
            if !(d * d > PIVOT_EPS * scale) {
                bail!("matrix is singular or not positive definite (column {})", j);
            }
        }
        Ok(Self { llt, n })
    }

    /// Solves `A X = B` for every column of `B`.
    pub fn solve(&self, b: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if b.nrows() != self.n {
            bail!("right-hand side has {} rows, expected {}", b.nrows(), self.n);
        }
        let rhs = array_to_faer(b);
        let x = self.llt.solve(rhs.as_ref());
        Ok(mat_to_array(&x))
    }

    /// Diagonal of `A⁻¹`.
    pub fn inverse_diag(&self) -> Array1<f64> {
        let identity = Mat::<f64>::identity(self.n, self.n);
        let inv = self.llt.solve(identity.as_ref());
        Array1::from_shape_fn(self.n, |i| inv[(i, i)])
    }
}
