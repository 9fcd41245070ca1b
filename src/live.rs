//! Live-point / posterior-sample data model.

use ndarray::Array1;
use ordered_float::OrderedFloat;
use std::collections::VecDeque;

/// A single live point: `theta_phys = Prior.fromUnit(theta_unit)`,
/// `logL = Likelihood(theta_phys)`.
#[derive(Debug, Clone)]
pub struct LivePoint {
    pub theta_unit: Array1<f64>,
    pub theta_phys: Array1<f64>,
    pub log_l: f64,
}

impl LivePoint {
    pub fn new(theta_unit: Array1<f64>, theta_phys: Array1<f64>, log_l: f64) -> Self {
        LivePoint {
            theta_unit,
            theta_phys,
            log_l,
        }
    }
}

/// One retired point in the posterior sample: its physical parameters,
/// likelihood, and log prior-mass weight.
#[derive(Debug, Clone)]
pub struct PosteriorPoint {
    pub theta_phys: Array1<f64>,
    pub log_l: f64,
    pub log_w: f64,
}

/// The live set, kept sorted ascending by `logL` in a `VecDeque`: the
/// front is always the current worst point.
#[derive(Debug)]
pub struct LiveSet {
    points: VecDeque<LivePoint>,
}

impl LiveSet {
    pub fn from_unsorted(mut points: Vec<LivePoint>) -> Self {
        points.sort_unstable_by_key(|p| OrderedFloat(p.log_l));
        LiveSet {
            points: points.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn worst(&self) -> &LivePoint {
        &self.points[0]
    }

    pub fn worst_log_l(&self) -> f64 {
        self.points[0].log_l
    }

    pub fn iter(&self) -> impl Iterator<Item = &LivePoint> {
        self.points.iter()
    }

    pub fn best_log_l(&self) -> f64 {
        self.points
            .back()
            .map(|p| p.log_l)
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Pops the worst point out of the live set (used when shrinking the
    /// population).
    pub fn pop_worst(&mut self) -> LivePoint {
        self.points.pop_front().expect("live set must be non-empty")
    }

    /// Removes the worst point and inserts `replacement`, maintaining
    /// sorted order. Returns the removed worst point.
    pub fn replace_worst(&mut self, replacement: LivePoint) -> LivePoint {
        let worst = self.points.pop_front().expect("live set must be non-empty");
        self.insert(replacement);
        worst
    }

    pub fn insert(&mut self, point: LivePoint) {
        let key = OrderedFloat(point.log_l);
        let pos = self
            .points
            .binary_search_by_key(&key, |p| OrderedFloat(p.log_l))
            .unwrap_or_else(|e| e);
        self.points.insert(pos, point);
    }

    /// A row-major matrix view of `theta_unit` across the live set, for
    /// feeding into the clusterer / ellipsoid construction.
    pub fn unit_matrix(&self) -> ndarray::Array2<f64> {
        let n = self.points.len();
        let d = if n > 0 { self.points[0].theta_unit.len() } else { 0 };
        let mut m = ndarray::Array2::<f64>::zeros((n, d));
        for (i, p) in self.points.iter().enumerate() {
            m.row_mut(i).assign(&p.theta_unit);
        }
        m
    }
}

/// Append-only sequence of retired points.
#[derive(Debug, Default)]
pub struct PosteriorSample {
    points: Vec<PosteriorPoint>,
}

impl PosteriorSample {
    pub fn new() -> Self {
        PosteriorSample { points: Vec::new() }
    }

    pub fn push(&mut self, point: PosteriorPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PosteriorPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[PosteriorPoint] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(log_l: f64) -> LivePoint {
        LivePoint::new(Array1::from(vec![log_l]), Array1::from(vec![log_l]), log_l)
    }

    #[test]
    fn from_unsorted_sorts_ascending() {
        let set = LiveSet::from_unsorted(vec![point(3.0), point(1.0), point(2.0)]);
        assert_eq!(set.worst_log_l(), 1.0);
        assert_eq!(set.best_log_l(), 3.0);
    }

    #[test]
    fn replace_worst_keeps_sorted_order() {
        let mut set = LiveSet::from_unsorted(vec![point(1.0), point(2.0), point(3.0)]);
        let removed = set.replace_worst(point(2.5));
        assert_eq!(removed.log_l, 1.0);
        assert_eq!(set.worst_log_l(), 2.0);
        assert_eq!(set.best_log_l(), 3.0);
    }

    #[test]
    fn pop_worst_shrinks_the_set() {
        let mut set = LiveSet::from_unsorted(vec![point(1.0), point(2.0)]);
        let w = set.pop_worst();
        assert_eq!(w.log_l, 1.0);
        assert_eq!(set.len(), 1);
    }
}
