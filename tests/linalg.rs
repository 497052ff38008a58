use kira_mvpa::math::linalg::Cholesky;
use ndarray::array;

#[test]
fn cholesky_solves_and_inverts_spd_system() {
    let a = array![[4.0, 2.0], [2.0, 3.0]];
    let b = array![[2.0, 0.0], [1.0, 1.0]];
    let chol = Cholesky::factor(a.view()).unwrap();
    let x = chol.solve(b.view()).unwrap();
    let back = a.dot(&x);
    for (got, want) in back.iter().zip(b.iter()) {
        assert!((got - want).abs() < 1e-12);
    }
    let diag = chol.inverse_diag();
    assert!((diag[0] - 3.0 / 8.0).abs() < 1e-12);
    assert!((diag[1] - 4.0 / 8.0).abs() < 1e-12);
}

#[test]
fn cholesky_rejects_singular_and_non_square() {
    let singular = array![[1.0, 1.0], [1.0, 1.0]];
    let err = Cholesky::factor(singular.view()).err().unwrap();
    assert!(err.to_string().contains("singular"));

    let rect = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    assert!(Cholesky::factor(rect.view()).is_err());
}

#[test]
fn cholesky_checks_rhs_rows() {
    let a = array![[2.0, 0.0], [0.0, 2.0]];
    let chol = Cholesky::factor(a.view()).unwrap();
    let b = array![[1.0], [1.0], [1.0]];
    assert!(chol.solve(b.view()).is_err());
}
