use kira_mvpa::volume::{Grid3, Mask, Series4, mask_frames, mask_series, unmask};

fn ramp_series(grid: Grid3, n_t: usize) -> Series4 {
    let n = grid.n_voxels();
    let data: Vec<f32> = (0..n * n_t)
        .map(|i| {
            let t = i / n;
            let v = i % n;
            (v as f32) * 10.0 + (t as f32) * ((v % 4) as f32 + 1.0)
        })
        .collect();
    Series4::new(grid, n_t, data).unwrap()
}

fn half_mask(grid: Grid3) -> Mask {
    let values: Vec<f32> = (0..grid.n_voxels())
        .map(|v| if v % 2 == 0 { 1.0 } else { 0.0 })
        .collect();
    Mask::from_values("half", grid, &values).unwrap()
}

#[test]
fn column_count_matches_mask_and_ignores_timepoints() {
    let grid = Grid3::new(3, 2, 2);
    let mask = half_mask(grid);
    assert_eq!(mask.len(), 6);
    for n_t in [1, 5, 17] {
        let series = ramp_series(grid, n_t);
        let features = mask_series(&series, &mask, false).unwrap();
        assert_eq!(features.ncols(), mask.len());
        assert_eq!(features.nrows(), n_t);
    }
}

#[test]
fn selected_frames_follow_request_order() {
    let grid = Grid3::new(2, 2, 1);
    let series = ramp_series(grid, 6);
    let mask = Mask::from_values("all", grid, &[1.0, 1.0, 1.0, 1.0]).unwrap();
    let x = mask_frames(&series, &[4, 1], &mask, false).unwrap();
    assert_eq!(x.nrows(), 2);
    assert_eq!(x[[0, 1]], series.frame(4)[1] as f64);
    assert_eq!(x[[1, 3]], series.frame(1)[3] as f64);
    assert!(mask_frames(&series, &[6], &mask, false).is_err());
}

#[test]
fn standardized_columns_have_zero_mean_unit_std() {
    let grid = Grid3::new(2, 2, 2);
    let series = ramp_series(grid, 9);
    let mask = half_mask(grid);
    let x = mask_series(&series, &mask, true).unwrap();
    for column in x.columns() {
        let n = column.len() as f64;
        let mean = column.sum() / n;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9);
        assert!((var.sqrt() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn empty_mask_and_grid_mismatch_are_errors() {
    let grid = Grid3::new(2, 1, 1);
    assert!(Mask::from_values("none", grid, &[0.0, f32::NAN]).is_err());
    assert!(Mask::from_values("short", grid, &[1.0]).is_err());

    let series = ramp_series(Grid3::new(2, 2, 1), 2);
    let mask = Mask::from_values("m", grid, &[1.0, 0.0]).unwrap();
    assert!(mask_series(&series, &mask, false).is_err());
}

#[test]
fn unmask_places_values_and_zeroes_outside() {
    let grid = Grid3::new(2, 2, 1);
    let mask = Mask::from_values("m", grid, &[0.0, 1.0, 0.0, 2.0]).unwrap();
    let full = unmask(&[0.5, -1.5], &mask).unwrap();
    assert_eq!(full, vec![0.0, 0.5, 0.0, -1.5]);
    assert!(unmask(&[1.0], &mask).is_err());
}

#[test]
fn series_rejects_wrong_length() {
    assert!(Series4::new(Grid3::new(2, 2, 2), 3, vec![0.0; 23]).is_err());
}
