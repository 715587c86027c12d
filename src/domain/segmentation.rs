// ============================================================
// Layer 3 — Segmentation Scores
// ============================================================
// Accumulates a 2×2 confusion matrix for the road class across
// any number of predicted masks, then derives:
//   - pixel accuracy = (tp + tn) / all pixels
//   - road IoU       = tp / (tp + fp + fn)

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_pos:  u64,
    pub false_pos: u64,
    pub false_neg: u64,
    pub true_neg:  u64,
}

impl ConfusionCounts {
    /// Count one mask against its ground truth. Both slices hold one
    /// boolean per pixel (`true` = road) and must be the same length.
    pub fn from_masks(predicted: &[bool], truth: &[bool]) -> Self {
        debug_assert_eq!(predicted.len(), truth.len());
        let mut c = Self::default();
        for (&p, &t) in predicted.iter().zip(truth) {
            match (p, t) {
                (true,  true)  => c.true_pos  += 1,
                (true,  false) => c.false_pos += 1,
                (false, true)  => c.false_neg += 1,
                (false, false) => c.true_neg  += 1,
            }
        }
        c
    }

    pub fn merge(&mut self, other: &ConfusionCounts) {
        self.true_pos  += other.true_pos;
        self.false_pos += other.false_pos;
        self.false_neg += other.false_neg;
        self.true_neg  += other.true_neg;
    }

    pub fn total(&self) -> u64 {
        self.true_pos + self.false_pos + self.false_neg + self.true_neg
    }

    /// Fraction of pixels classified correctly; 0.0 when nothing was counted.
    pub fn pixel_accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_pos + self.true_neg) as f64 / total as f64
    }

    /// Intersection over union of the road class; 0.0 when neither the
    /// prediction nor the ground truth contain road.
    pub fn road_iou(&self) -> f64 {
        let union = self.true_pos + self.false_pos + self.false_neg;
        if union == 0 {
            return 0.0;
        }
        self.true_pos as f64 / union as f64
    }
}
