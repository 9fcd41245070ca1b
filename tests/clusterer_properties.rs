//! Clusterer invariants and boundary cases (no empty clusters, K_max=1,
//! assignment surjectivity, boundary case K_max=1).

use nested_sampling::clusterer::Clusterer;
use nested_sampling::metric::Euclidean;
use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn assignment_never_has_empty_clusters_across_many_seeds() {
    let points = array![
        [0.0, 0.0],
        [0.1, 0.05],
        [-0.05, 0.1],
        [5.0, 5.0],
        [5.1, 4.9],
        [4.9, 5.1],
        [-5.0, 5.0],
        [-5.1, 4.95],
    ];
    for seed in 0..20u64 {
        let clusterer = Clusterer::new(Euclidean, 1, 5, 4, 1e-6);
        let mut rng = StdRng::seed_from_u64(seed);
        let result = clusterer.cluster(points.view(), &mut rng);
        let mut counts = vec![0usize; result.k];
        for &a in &result.assignments {
            assert!(a < result.k, "assignment {a} out of range for k={}", result.k);
            counts[a] += 1;
        }
        assert!(
            counts.iter().all(|&c| c > 0),
            "seed {seed} produced an empty cluster: {counts:?}"
        );
    }
}

#[test]
fn k_max_one_always_yields_a_single_cluster() {
    let points = array![[0.0, 0.0], [100.0, 100.0], [-50.0, 30.0], [7.0, -7.0]];
    let clusterer = Clusterer::new(Euclidean, 1, 1, 3, 1e-6);
    let mut rng = StdRng::seed_from_u64(123);
    let result = clusterer.cluster(points.view(), &mut rng);
    assert_eq!(result.k, 1);
    assert!(result.assignments.iter().all(|&a| a == 0));
}

#[test]
fn single_point_input_degenerates_to_one_cluster() {
    let points = array![[1.0, 2.0]];
    let clusterer = Clusterer::new(Euclidean, 1, 4, 3, 1e-6);
    let mut rng = StdRng::seed_from_u64(0);
    let result = clusterer.cluster(points.view(), &mut rng);
    assert_eq!(result.k, 1);
    assert_eq!(result.assignments, vec![0]);
}

#[test]
fn clustering_is_deterministic_given_a_fixed_seed() {
    let points = array![
        [0.0, 0.0],
        [0.2, 0.1],
        [9.0, 9.0],
        [9.2, 8.9],
        [-9.0, 9.0],
        [-9.2, 8.8],
    ];
    let clusterer = Clusterer::new(Euclidean, 1, 4, 5, 1e-6);
    let mut rng_a = StdRng::seed_from_u64(55);
    let a = clusterer.cluster(points.view(), &mut rng_a);
    let mut rng_b = StdRng::seed_from_u64(55);
    let b = clusterer.cluster(points.view(), &mut rng_b);
    assert_eq!(a.assignments, b.assignments);
    assert_eq!(a.k, b.k);
}
