//! Progress reported by ffmpeg's `-progress` stream.

use serde::Serialize;

/// Running totals from one ffmpeg invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FfmpegProgress {
    /// Output position in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed relative to realtime
    pub speed: f64,
    /// Set on the final `progress=end` block
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Percent of `total_ms` written so far, capped at 100.
    pub fn percentage(&self, total_ms: i64) -> f64 {
        if total_ms <= 0 {
            return 0.0;
        }
        (self.out_time_ms as f64 * 100.0 / total_ms as f64).min(100.0)
    }

    /// Seconds of wall time left at the current speed.
    pub fn eta_seconds(&self, total_ms: i64) -> Option<f64> {
        if self.speed <= 0.0 || self.out_time_ms <= 0 {
            return None;
        }
        let remaining_ms = (total_ms - self.out_time_ms).max(0);
        Some(remaining_ms as f64 / 1000.0 / self.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_is_capped() {
        let progress = FfmpegProgress {
            out_time_ms: 3000,
            ..Default::default()
        };

        assert!((progress.percentage(12000) - 25.0).abs() < 0.01);
        assert_eq!(progress.percentage(1500), 100.0);
        assert_eq!(progress.percentage(0), 0.0);
    }

    #[test]
    fn test_eta_needs_speed_and_position() {
        let progress = FfmpegProgress {
            out_time_ms: 2000,
            speed: 4.0,
            ..Default::default()
        };

        // 8 seconds of output left at 4x
        assert!((progress.eta_seconds(10000).unwrap() - 2.0).abs() < 0.01);
        assert_eq!(progress.eta_seconds(1000), Some(0.0));
        assert!(FfmpegProgress::default().eta_seconds(10000).is_none());
    }
}
