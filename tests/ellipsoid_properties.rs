//! Ellipsoid geometry invariants: enclosure, uniform sampling, union
//! overlap correction, and volume scaling.

use nested_sampling::ellipsoid::Ellipsoid;
use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn every_source_point_is_enclosed_after_enlargement() {
    let points = array![
        [0.1, 0.2],
        [0.3, -0.4],
        [-0.2, 0.1],
        [0.5, 0.5],
        [-0.3, -0.3],
        [0.05, -0.1],
        [0.2, 0.4],
    ];
    let mut e = Ellipsoid::from_points(points.view());
    e.enlarge_to_cover(1.0, points.view());
    for row in points.rows() {
        let x = row.to_owned();
        assert!(e.contains_value(&x) <= 1.0 + 1e-9);
    }
}

#[test]
fn samples_drawn_uniformly_stay_inside_ellipsoid() {
    let points = array![[0.0, 0.0], [4.0, 0.0], [0.0, 4.0], [4.0, 4.0], [2.0, 2.0]];
    let mut e = Ellipsoid::from_points(points.view());
    e.enlarge_to_cover(1.0, points.view());
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..1000 {
        let x = e.sample_uniform(&mut rng);
        assert!(e.contains_value(&x) <= 1.0 + 1e-9);
    }
}

/// Unbiased-union-sampling check: with two
/// overlapping ellipsoids and the 1/q overlap correction, the empirical
/// density inside the overlap region should roughly match the density
/// outside it over many draws.
#[test]
fn overlap_correction_keeps_union_sampling_roughly_uniform() {
    let cluster_a = array![[-0.5, 0.0], [-1.0, 0.5], [-1.0, -0.5], [0.0, 0.0]];
    let cluster_b = array![[0.5, 0.0], [1.0, 0.5], [1.0, -0.5], [0.0, 0.0]];

    let mut ea = Ellipsoid::from_points(cluster_a.view());
    ea.enlarge_to_cover(1.0, cluster_a.view());
    let mut eb = Ellipsoid::from_points(cluster_b.view());
    eb.enlarge_to_cover(1.0, cluster_b.view());

    let mut rng = StdRng::seed_from_u64(7);
    let n_draws = 20_000;
    let mut overlap_hits = 0usize;
    let mut outside_hits = 0usize;
    let mut overlap_attempts = 0usize;
    let mut outside_attempts = 0usize;

    for i in 0..n_draws {
        let (e, other) = if i % 2 == 0 { (&ea, &eb) } else { (&eb, &ea) };
        let x: Array1<f64> = e.sample_uniform(&mut rng);
        let q = if other.contains(&x) { 2 } else { 1 };
        let accept = rng_bernoulli(&mut rng, 1.0 / q as f64);
        if q == 2 {
            overlap_attempts += 1;
            if accept {
                overlap_hits += 1;
            }
        } else {
            outside_attempts += 1;
            if accept {
                outside_hits += 1;
            }
        }
    }

    let overlap_rate = overlap_hits as f64 / overlap_attempts.max(1) as f64;
    let outside_rate = outside_hits as f64 / outside_attempts.max(1) as f64;
    // The overlap-correction acceptance rate should sit near 1/2 (since q=2
    // there), while the outside rate should sit near 1 (q=1); this is a
    // coarse smoke test that the correction is actually being applied.
    assert!(overlap_rate < outside_rate);
    assert!((overlap_rate - 0.5).abs() < 0.1, "overlap_rate = {overlap_rate}");
    assert!((outside_rate - 1.0).abs() < 1e-9, "outside_rate = {outside_rate}");
}

fn rng_bernoulli(rng: &mut StdRng, p: f64) -> bool {
    use rand::Rng;
    rng.gen::<f64>() <= p
}

#[test]
fn volume_scales_with_enlargement_factor() {
    let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
    let mut e = Ellipsoid::from_points(points.view());
    e.enlarge(1.0);
    let v1 = e.volume();
    e.enlarge(4.0);
    let v2 = e.volume();
    // Volume scales as f^(D/2); D=2 here, so quadrupling f quadruples V.
    assert!((v2 / v1 - 4.0).abs() < 1e-6);
}
