use super::*;

fn single_point(rows: usize, cols: usize, r0: usize, c0: usize) -> Field2 {
    Field2::from_fn(rows, cols, |r, c| if (r, c) == (r0, c0) { 1.0 } else { 0.0 })
}

#[test]
fn euclidean_matches_brute_force() {
    let mask = Field2::from_fn(9, 13, |r, c| {
        if (r, c) == (1, 2) || (r, c) == (7, 10) || (r, c) == (4, 12) { 1.0 } else { 0.0 }
    });
    let seeds = [(1.0f32, 2.0f32), (7.0, 10.0), (4.0, 12.0)];
    let d = euclidean_distance(&mask);
    for r in 0..9 {
        for c in 0..13 {
            let want = seeds
                .iter()
                .map(|&(sr, sc)| (r as f32 - sr).hypot(c as f32 - sc))
                .fold(f32::INFINITY, f32::min);
            assert!((d.get(r, c) - want).abs() < 1e-4, "({r},{c}) {} vs {want}", d.get(r, c));
        }
    }
}

#[test]
fn manhattan_counts_grid_steps() {
    let d = manhattan_distance(&single_point(5, 5, 2, 2));
    assert_eq!(d.get(2, 2), 0.0);
    assert_eq!(d.get(0, 0), 4.0);
    assert_eq!(d.get(4, 2), 2.0);
    assert_eq!(d.get(0, 4), 4.0);
}

#[test]
fn manhattan_never_undershoots_euclidean() {
    let mask = single_point(7, 11, 3, 4);
    let e = euclidean_distance(&mask);
    let m = manhattan_distance(&mask);
    for (a, b) in e.as_slice().iter().zip(m.as_slice()) {
        assert!(b + 1e-4 >= *a);
    }
}

#[test]
fn empty_mask_gives_diagonal() {
    let mask = Field2::new(3, 4, 0.0);
    assert!(euclidean_distance(&mask).as_slice().iter().all(|&d| (d - 5.0).abs() < 1e-6));
    assert!(manhattan_distance(&mask).as_slice().iter().all(|&d| (d - 5.0).abs() < 1e-6));
}

#[test]
fn single_row_and_column_work() {
    let row = Field2::from_vec(1, 5, vec![0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
    assert_eq!(euclidean_distance(&row).as_slice(), &[2.0, 1.0, 0.0, 1.0, 2.0]);
    let col = Field2::from_vec(4, 1, vec![1.0, 0.0, 0.0, 0.0]).unwrap();
    assert_eq!(euclidean_distance(&col).as_slice(), &[0.0, 1.0, 2.0, 3.0]);
}
