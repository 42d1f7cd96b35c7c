//! Structured losses between a ground-truth labeling and a hypothesis.

use namerec_core::Label;

/// A loss between two aligned label sequences.
///
/// Called from worker threads during parallel training.
pub trait Loss: Sync {
    fn loss(&self, truth: &[Label], hypothesis: &[Label]) -> f64;
}

impl<F> Loss for F
where
    F: Fn(&[Label], &[Label]) -> f64 + Sync,
{
    fn loss(&self, truth: &[Label], hypothesis: &[Label]) -> f64 {
        self(truth, hypothesis)
    }
}

/// Number of positions whose labels differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingLoss;

impl Loss for HammingLoss {
    fn loss(&self, truth: &[Label], hypothesis: &[Label]) -> f64 {
        (truth.len() - correct(truth, hypothesis)) as f64
    }
}

/// Always zero; turns loss-augmented inference into plain inference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroLoss;

impl Loss for ZeroLoss {
    fn loss(&self, _truth: &[Label], _hypothesis: &[Label]) -> f64 {
        0.0
    }
}

/// Number of positions whose labels agree.
pub fn correct(truth: &[Label], hypothesis: &[Label]) -> usize {
    truth
        .iter()
        .zip(hypothesis)
        .filter(|(expected, got)| expected == got)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use namerec_core::ScopeId;

    fn labels(names: &[&str]) -> Vec<Label> {
        names.iter().map(|n| Label::new(ScopeId(0), *n)).collect()
    }

    #[test]
    fn hamming_counts_mismatches() {
        let truth = labels(&["a", "b", "c"]);
        assert_eq!(HammingLoss.loss(&truth, &truth), 0.0);
        assert_eq!(HammingLoss.loss(&truth, &labels(&["a", "x", "y"])), 2.0);
    }

    #[test]
    fn scope_counts_toward_equality() {
        let truth = labels(&["a"]);
        let moved = vec![Label::new(ScopeId(1), "a")];
        assert_eq!(HammingLoss.loss(&truth, &moved), 1.0);
    }

    #[test]
    fn zero_loss_is_zero() {
        assert_eq!(ZeroLoss.loss(&labels(&["a"]), &labels(&["b"])), 0.0);
    }

    #[test]
    fn closures_are_losses() {
        let doubled =
            |truth: &[Label], hypothesis: &[Label]| 2.0 * HammingLoss.loss(truth, hypothesis);
        assert_eq!(doubled.loss(&labels(&["a"]), &labels(&["b"])), 2.0);
    }
}
