//! Marginal statistics and output-file writing from a weighted posterior
//! sample. The extraction contract is conceptually "out-of-core", but
//! the crate ships a working instance of both pieces so it is
//! a complete, runnable program.

use std::io::{self, Write};
use std::path::Path;

use ordered_float::OrderedFloat;

use crate::live::PosteriorSample;

/// Per-dimension summary: mean, median, mode, and a shortest credible
/// interval expressed as offsets from the mode
/// `*_ParameterSummary.txt`).
#[derive(Debug, Clone, Copy)]
pub struct ParameterSummary {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub lower_offset: f64,
    pub upper_offset: f64,
}

/// Linear-space weights (`exp(logW - logZ)`) alongside a duplicate mask,
/// replacing the source's `-DBL_MAX` sentinel for marking merged ties
/// with an explicit boolean instead.
struct WeightedColumn {
    values: Vec<f64>,
    weights: Vec<f64>,
    is_duplicate: Vec<bool>,
}

/// Computes mean/median/mode/shortest-credible-interval for each parameter
/// dimension of a posterior sample, given the final accumulated evidence.
pub struct ResultsExtractor {
    pub credible_level: f64,
}

impl ResultsExtractor {
    pub fn new(credible_level: f64) -> Self {
        ResultsExtractor { credible_level }
    }

    /// Normalized linear weights `exp(logW_i - logZ)` for every posterior
    /// point, in iteration order (these sum to 1).
    pub fn normalized_weights(&self, sample: &PosteriorSample, log_z: f64) -> Vec<f64> {
        sample
            .iter()
            .map(|p| (p.log_w - log_z).exp())
            .collect()
    }

    /// Summarizes dimension `k` of the posterior sample.
    pub fn summarize_dimension(
        &self,
        sample: &PosteriorSample,
        weights: &[f64],
        k: usize,
    ) -> ParameterSummary {
        let column = self.weighted_column(sample, weights, k);
        let mean = self.weighted_mean(&column);
        let median = self.weighted_median(&column);
        let mode = self.weighted_mode(&column);
        let (lower_offset, upper_offset) =
            self.shortest_credible_interval(&column, mode, self.credible_level);
        ParameterSummary {
            mean,
            median,
            mode,
            lower_offset,
            upper_offset,
        }
    }

    /// Builds the per-dimension column, merging exact ties in `theta[k]`
    /// before marginalization (ties in theta values are merged
    /// before marginalization") via an explicit mask rather than a
    /// sentinel value.
    fn weighted_column(&self, sample: &PosteriorSample, weights: &[f64], k: usize) -> WeightedColumn {
        let mut values = Vec::with_capacity(sample.len());
        let mut merged_weights = Vec::with_capacity(sample.len());
        let mut is_duplicate = vec![false; sample.len()];

        let raw: Vec<f64> = sample.iter().map(|p| p.theta_phys[k]).collect();
        let mut order: Vec<usize> = (0..raw.len()).collect();
        order.sort_by_key(|&i| OrderedFloat(raw[i]));

        let mut seen_value: Option<f64> = None;
        let mut bucket_weight = 0.0;
        for &i in &order {
            match seen_value {
                Some(v) if (raw[i] - v).abs() < 1e-12 => {
                    bucket_weight += weights[i];
                    is_duplicate[i] = true;
                }
                _ => {
                    if seen_value.is_some() {
                        values.push(seen_value.unwrap());
                        merged_weights.push(bucket_weight);
                    }
                    seen_value = Some(raw[i]);
                    bucket_weight = weights[i];
                }
            }
        }
        if let Some(v) = seen_value {
            values.push(v);
            merged_weights.push(bucket_weight);
        }

        WeightedColumn {
            values,
            weights: merged_weights,
            is_duplicate,
        }
    }

    fn weighted_mean(&self, column: &WeightedColumn) -> f64 {
        column
            .values
            .iter()
            .zip(column.weights.iter())
            .map(|(&v, &w)| v * w)
            .sum()
    }

    /// Weighted median: the value at which cumulative mass first reaches
    /// one half. `column.values` is already sorted ascending.
    fn weighted_median(&self, column: &WeightedColumn) -> f64 {
        let mut cumulative = 0.0;
        for (&v, &w) in column.values.iter().zip(column.weights.iter()) {
            cumulative += w;
            if cumulative >= 0.5 {
                return v;
            }
        }
        column.values.last().copied().unwrap_or(0.0)
    }

    /// Mode: the value with the single largest weight ("max of
    /// 1-D histogram"; with merged ties the bucket weight already plays
    /// the role of a histogram bin).
    fn weighted_mode(&self, column: &WeightedColumn) -> f64 {
        column
            .values
            .iter()
            .zip(column.weights.iter())
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(&v, _)| v)
            .unwrap_or(0.0)
    }

    /// Smallest contiguous mass >= `level` around `mode`, returned as
    /// `(mode - lower_bound, upper_bound - mode)`.
    fn shortest_credible_interval(&self, column: &WeightedColumn, mode: f64, level: f64) -> (f64, f64) {
        if column.values.is_empty() {
            return (0.0, 0.0);
        }
        let mode_idx = column
            .values
            .iter()
            .position(|&v| v == mode)
            .unwrap_or(0);

        let n = column.values.len();
        let mut lo = mode_idx;
        let mut hi = mode_idx;
        let mut mass = column.weights[mode_idx];
        while mass < level && (lo > 0 || hi < n - 1) {
            let expand_left = lo > 0
                && (hi == n - 1 || column.weights[lo - 1] >= column.weights[(hi + 1).min(n - 1)]);
            if expand_left {
                lo -= 1;
                mass += column.weights[lo];
            } else {
                hi += 1;
                mass += column.weights[hi];
            }
        }
        (mode - column.values[lo], column.values[hi] - mode)
    }
}

/// Writes the five documented output files, all numbers in
/// scientific notation with 9 significant digits, using direct
/// `fs::write`-based I/O.
pub fn write_outputs(
    prefix: &str,
    sample: &PosteriorSample,
    weights: &[f64],
    log_z: f64,
    log_z_err: f64,
    h: f64,
    summaries: &[ParameterSummary],
    credible_level: f64,
) -> io::Result<()> {
    let dir = Path::new(prefix).parent();
    if let Some(dir) = dir {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let d = summaries.len();
    for k in 0..d {
        let mut out = String::new();
        for point in sample.iter() {
            out.push_str(&format_sci(point.theta_phys[k]));
            out.push('\n');
        }
        std::fs::write(format!("{prefix}_Parameter{k}.txt"), out)?;
    }

    let mut likelihoods = String::new();
    for point in sample.iter() {
        likelihoods.push_str(&format_sci(point.log_l));
        likelihoods.push('\n');
    }
    std::fs::write(format!("{prefix}_LikelihoodDistribution.txt"), likelihoods)?;

    let evidence = format!(
        "# logZ logZ_err H\n{} {} {}\n",
        format_sci(log_z),
        format_sci(log_z_err),
        format_sci(h)
    );
    std::fs::write(format!("{prefix}_EvidenceInformation.txt"), evidence)?;

    let mut posterior = String::new();
    for &w in weights {
        posterior.push_str(&format_sci(w));
        posterior.push('\n');
    }
    std::fs::write(format!("{prefix}_PosteriorDistribution.txt"), posterior)?;

    let mut summary = format!(
        "# mean median mode lower_ci_offset upper_ci_offset (credible level {:.1}%)\n",
        credible_level * 100.0
    );
    for s in summaries {
        summary.push_str(&format!(
            "{} {} {} {} {}\n",
            format_sci(s.mean),
            format_sci(s.median),
            format_sci(s.mode),
            format_sci(s.lower_offset),
            format_sci(s.upper_offset)
        ));
    }
    std::fs::write(format!("{prefix}_ParameterSummary.txt"), summary)?;

    Ok(())
}

fn format_sci(value: f64) -> String {
    format!("{value:.8e}")
}

/// Convenience wrapper bundling extraction and writing, used by the CLI
/// binary.
pub fn extract_and_write<W: Write>(
    mut log: W,
    prefix: &str,
    sample: &PosteriorSample,
    log_z: f64,
    log_z_err: f64,
    h: f64,
    d: usize,
    credible_level: f64,
) -> io::Result<Vec<ParameterSummary>> {
    let extractor = ResultsExtractor::new(credible_level);
    let weights = extractor.normalized_weights(sample, log_z);
    let summaries: Vec<ParameterSummary> = (0..d)
        .map(|k| extractor.summarize_dimension(sample, &weights, k))
        .collect();
    write_outputs(
        prefix,
        sample,
        &weights,
        log_z,
        log_z_err,
        h,
        &summaries,
        credible_level,
    )?;
    writeln!(log, "wrote results to {prefix}_*.txt")?;
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_with(values: &[(f64, f64, f64)]) -> PosteriorSample {
        let mut sample = PosteriorSample::new();
        for &(theta, log_l, log_w) in values {
            sample.push(crate::live::PosteriorPoint {
                theta_phys: array![theta],
                log_l,
                log_w,
            });
        }
        sample
    }

    #[test]
    fn weights_sum_to_one_in_linear_space() {
        let sample = sample_with(&[(0.0, 0.0, -1.0), (1.0, 0.0, -1.0), (2.0, 0.0, -1.0)]);
        let log_z = crate::evidence::logsumexp(
            crate::evidence::logsumexp(-1.0, -1.0),
            -1.0,
        );
        let extractor = ResultsExtractor::new(0.68);
        let weights = extractor.normalized_weights(&sample, log_z);
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mean_of_symmetric_sample_is_center() {
        let sample = sample_with(&[(-1.0, 0.0, 0.0), (0.0, 0.0, 0.0), (1.0, 0.0, 0.0)]);
        let weights = vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0];
        let extractor = ResultsExtractor::new(0.68);
        let summary = extractor.summarize_dimension(&sample, &weights, 0);
        assert!(summary.mean.abs() < 1e-12);
        assert!(summary.median.abs() < 1e-12);
    }

    #[test]
    fn duplicate_theta_values_are_merged_not_sentineled() {
        let sample = sample_with(&[(5.0, 0.0, 0.0), (5.0, 0.0, 0.0), (9.0, 0.0, 0.0)]);
        let weights = vec![0.4, 0.4, 0.2];
        let extractor = ResultsExtractor::new(0.68);
        let column = extractor.weighted_column(&sample, &weights, 0);
        assert_eq!(column.values.len(), 2);
        assert!((column.weights[0] - 0.8).abs() < 1e-12);
        assert!(column.is_duplicate[1]);
    }

    #[test]
    fn mode_is_highest_weight_value() {
        let sample = sample_with(&[(1.0, 0.0, 0.0), (2.0, 0.0, 0.0), (3.0, 0.0, 0.0)]);
        let weights = vec![0.1, 0.8, 0.1];
        let extractor = ResultsExtractor::new(0.68);
        let summary = extractor.summarize_dimension(&sample, &weights, 0);
        assert!((summary.mode - 2.0).abs() < 1e-12);
    }
}
