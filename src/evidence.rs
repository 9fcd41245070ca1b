//! Log-space evidence accumulator.

/// `logsumexp(a, b) = max(a,b) + log1p(exp(-|a-b|))`, the only stable way
/// to add two values that are stored as logarithms.
pub fn logsumexp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY && b == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let m = a.max(b);
    m + (-(a - b).abs()).exp().ln_1p()
}

/// Tracks `logZ`, the information `H`, and the current log prior mass
/// `log X_i` across iterations. All evidence arithmetic happens in log
/// space; underflow saturates to `-inf` rather than panicking or
/// propagating `NaN`.
#[derive(Debug, Clone)]
pub struct EvidenceAccumulator {
    pub log_z: f64,
    pub h: f64,
    pub log_x: f64,
}

impl EvidenceAccumulator {
    pub fn new() -> Self {
        EvidenceAccumulator {
            log_z: f64::NEG_INFINITY,
            h: 0.0,
            log_x: 0.0,
        }
    }

    /// Decrements `log_x` by `1/n_live` (constant-N_live uses
    /// `log X_i = -i/N_live`; a shrinking N_live uses `log X_i = log
    /// X_{i-1} - 1/N_live,i` — both are the same per-step decrement,
    /// applied here) and returns `log(delta_x) = log(X_{i-1} - X_i)` for
    /// the retired shell.
    pub fn shrink(&mut self, n_live: usize) -> f64 {
        let prev_log_x = self.log_x;
        self.log_x -= 1.0 / n_live as f64;
        // log(X_{i-1} - X_i) = log(X_{i-1}) + log(1 - X_i/X_{i-1})
        let ratio = (self.log_x - prev_log_x).exp();
        prev_log_x + (1.0 - ratio).ln()
    }

    /// Folds in one retired point's contribution `log_w = log(delta_x) +
    /// logL_worst`, updating `logZ` and the information `H` via the
    /// standard nested-sampling identity.
    pub fn accumulate(&mut self, log_w: f64, log_l_worst: f64) {
        // NaN/underflow guard: clamp to -inf (zero contribution) rather
        // than propagate NaN.
        let log_w = if log_w.is_nan() { f64::NEG_INFINITY } else { log_w };
        let log_z_new = logsumexp(self.log_z, log_w);
        if log_z_new == f64::NEG_INFINITY {
            self.log_z = log_z_new;
            return;
        }
        let term_w = if log_w == f64::NEG_INFINITY {
            0.0
        } else {
            (log_w - log_z_new).exp()
        };
        let term_z = if self.log_z == f64::NEG_INFINITY {
            0.0
        } else {
            (self.log_z - log_z_new).exp()
        };
        let w_contribution = if term_w == 0.0 { 0.0 } else { term_w * log_l_worst };
        let z_contribution = if term_z == 0.0 { 0.0 } else { term_z * (self.h + self.log_z) };
        let h_new = w_contribution + z_contribution - log_z_new;
        self.h = h_new.max(0.0);
        self.log_z = log_z_new;
    }

    /// `sqrt(H / n_live_initial)`, the evidence error estimate in log units.
    pub fn log_z_err(&self, n_live_initial: usize) -> f64 {
        (self.h / n_live_initial as f64).max(0.0).sqrt()
    }
}

impl Default for EvidenceAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn logsumexp_matches_naive_computation() {
        let a = -2.0;
        let b = -3.0;
        let naive = (a.exp() + b.exp()).ln();
        assert_abs_diff_eq!(logsumexp(a, b), naive, epsilon = 1e-12);
    }

    #[test]
    fn logsumexp_handles_both_neg_infinity() {
        assert_eq!(logsumexp(f64::NEG_INFINITY, f64::NEG_INFINITY), f64::NEG_INFINITY);
    }

    #[test]
    fn evidence_is_monotone_non_decreasing() {
        let mut acc = EvidenceAccumulator::new();
        let mut prev = acc.log_z;
        for log_l in [-5.0, -4.0, -3.0, -2.0, -1.0] {
            let log_w = acc.shrink(100);
            acc.accumulate(log_w + log_l, log_l);
            assert!(acc.log_z >= prev);
            assert!(acc.h >= 0.0);
            prev = acc.log_z;
        }
    }
}
