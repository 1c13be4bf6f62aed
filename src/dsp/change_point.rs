/// Change-point detection backend over a feature-vector sequence
pub trait ChangePointDetector: Send + Sync {
    /// Frame indices of structural changes, sorted ascending
    fn detect(&self, features: &[Vec<f32>], min_separation: usize) -> Vec<usize>;
}

/// Change points by recursive binary segmentation under the Bayesian
/// Information Criterion
///
/// Each segment is modelled as a Gaussian with diagonal covariance. A segment
/// is split at the frame maximizing ΔBIC if that maximum is positive, then
/// both halves are searched again. Splits closer than `min_separation`
/// frames to a segment edge are never considered.
#[derive(Debug, Clone)]
pub struct BicChangePointDetector {
    /// Weight of the model-complexity penalty; larger means fewer boundaries
    pub penalty_weight: f64,
}

impl Default for BicChangePointDetector {
    fn default() -> Self {
        Self { penalty_weight: 1.5 }
    }
}

/// Running sums of x and x² per dimension, for O(d) segment statistics
struct PrefixSums {
    dims: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl PrefixSums {
    fn new(features: &[Vec<f32>], dims: usize) -> Self {
        let mut sum = vec![0.0; (features.len() + 1) * dims];
        let mut sum_sq = vec![0.0; (features.len() + 1) * dims];

        for (i, frame) in features.iter().enumerate() {
            for d in 0..dims {
                let x = frame.get(d).copied().unwrap_or(0.0) as f64;
                sum[(i + 1) * dims + d] = sum[i * dims + d] + x;
                sum_sq[(i + 1) * dims + d] = sum_sq[i * dims + d] + x * x;
            }
        }

        Self { dims, sum, sum_sq }
    }

    /// log-determinant of the diagonal covariance of frames `[start, end)`
    fn log_det(&self, start: usize, end: usize) -> f64 {
        let n = (end - start) as f64;
        (0..self.dims)
            .map(|d| {
                let s = self.sum[end * self.dims + d] - self.sum[start * self.dims + d];
                let sq = self.sum_sq[end * self.dims + d] - self.sum_sq[start * self.dims + d];
                let mean = s / n;
                let variance = (sq / n - mean * mean).max(0.0);
                (variance + 1e-9).ln()
            })
            .sum()
    }
}

impl BicChangePointDetector {
    pub fn new(penalty_weight: f64) -> Self {
        Self { penalty_weight }
    }

    fn delta_bic(&self, sums: &PrefixSums, start: usize, split: usize, end: usize) -> f64 {
        let n = (end - start) as f64;
        let n1 = (split - start) as f64;
        let n2 = (end - split) as f64;

        let gain = 0.5 * (n * sums.log_det(start, end)
            - n1 * sums.log_det(start, split)
            - n2 * sums.log_det(split, end));

        // Mean and variance per dimension
        let parameters = 2.0 * sums.dims as f64;
        gain - self.penalty_weight * 0.5 * parameters * n.ln()
    }

    fn split(
        &self,
        sums: &PrefixSums,
        start: usize,
        end: usize,
        min_separation: usize,
        boundaries: &mut Vec<usize>,
    ) {
        if end - start < 2 * min_separation {
            return;
        }

        let mut best: Option<(usize, f64)> = None;
        for candidate in (start + min_separation)..=(end - min_separation) {
            let score = self.delta_bic(sums, start, candidate, end);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }

        if let Some((split, score)) = best {
            if score > 0.0 {
                boundaries.push(split);
                self.split(sums, start, split, min_separation, boundaries);
                self.split(sums, split, end, min_separation, boundaries);
            }
        }
    }
}

impl ChangePointDetector for BicChangePointDetector {
    fn detect(&self, features: &[Vec<f32>], min_separation: usize) -> Vec<usize> {
        let dims = features.first().map_or(0, Vec::len);
        if dims == 0 {
            return Vec::new();
        }

        let sums = PrefixSums::new(features, dims);
        let mut boundaries = Vec::new();
        self.split(&sums, 0, features.len(), min_separation.max(1), &mut boundaries);
        boundaries.sort_unstable();

        tracing::debug!(
            "BIC segmentation of {} frames found {} change points",
            features.len(),
            boundaries.len()
        );
        boundaries
    }
}
