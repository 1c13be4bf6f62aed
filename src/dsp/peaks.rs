use crate::dsp::onset::DetectionSeries;

/// Converts a detection function into candidate onset times
pub trait PeakPicker: Send + Sync {
    /// Candidate times in seconds, sorted ascending
    fn pick(&self, series: &DetectionSeries) -> Vec<f64>;
}

/// Local-maximum peak picker with an adaptive threshold
///
/// The series is normalized to its maximum first. A frame is a peak when it
/// is the largest value in a `±radius` neighbourhood, rises above the
/// previous frame, clears `threshold`, and stands out from the local mean
/// by an amount controlled by `sensitivity`.
#[derive(Debug, Clone)]
pub struct AdaptivePeakPicker {
    pub threshold: f32,
    pub sensitivity: f32,
    pub radius: usize,
}

impl Default for AdaptivePeakPicker {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            sensitivity: 0.7,
            radius: 3,
        }
    }
}

impl AdaptivePeakPicker {
    pub fn new(threshold: f32, sensitivity: f32) -> Self {
        Self {
            threshold,
            sensitivity,
            ..Default::default()
        }
    }
}

impl PeakPicker for AdaptivePeakPicker {
    fn pick(&self, series: &DetectionSeries) -> Vec<f64> {
        let max_value = series.values.iter().copied().fold(0.0f32, f32::max);
        if series.is_empty() || max_value <= 0.0 || !max_value.is_finite() {
            return Vec::new();
        }

        let normalized: Vec<f32> = series.values.iter().map(|&v| v / max_value).collect();
        let mut peaks = Vec::new();

        for (i, &value) in normalized.iter().enumerate() {
            if value <= self.threshold {
                continue;
            }
            if i > 0 && value <= normalized[i - 1] {
                continue;
            }

            let window_start = i.saturating_sub(self.radius);
            let window_end = (i + self.radius + 1).min(normalized.len());
            let window = &normalized[window_start..window_end];

            let local_max = window.iter().copied().fold(0.0f32, f32::max);
            let local_mean = window.iter().sum::<f32>() / window.len() as f32;
            let adaptive = local_mean + self.sensitivity * (local_max - local_mean) * 0.5;

            if value == local_max && value >= adaptive && value > local_mean * 1.5 {
                peaks.push(series.frame_time(i));
            }
        }

        tracing::debug!(
            "Picked {} peaks from {} frames",
            peaks.len(),
            series.values.len()
        );
        peaks
    }
}
