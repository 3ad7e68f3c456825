//! Frame timing statistics.

use std::fmt;
use std::time::Duration;

/// Mean, spread and median of one series of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    pub deviation: f64,
    pub median: f64,
}

impl Moments {
    /// `None` for an empty series.
    pub fn of(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n;

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            0.5 * (sorted[mid - 1] + sorted[mid])
        } else {
            sorted[mid]
        };

        Some(Self {
            mean,
            variance,
            deviation: variance.sqrt(),
            median,
        })
    }
}

/// Summary over every recorded frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSummary {
    pub frames: usize,
    /// Frame times in seconds
    pub frame_time: Moments,
    /// Frames per second, one sample per frame
    pub fps: Moments,
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames, frame time {:.2} ms (median {:.2}, dev {:.2}), {:.1} fps (median {:.1}, dev {:.1})",
            self.frames,
            self.frame_time.mean * 1e3,
            self.frame_time.median * 1e3,
            self.frame_time.deviation * 1e3,
            self.fps.mean,
            self.fps.median,
            self.fps.deviation
        )
    }
}

/// Collects per-frame render durations.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frame_times: Vec<Duration>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, frame_time: Duration) {
        self.frame_times.push(frame_time);
    }

    pub fn len(&self) -> usize {
        self.frame_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_times.is_empty()
    }

    pub fn clear(&mut self) {
        self.frame_times.clear();
    }

    /// Statistics over the recorded frames, `None` until one is recorded.
    ///
    /// Zero-length frames are left out of the fps series.
    pub fn summary(&self) -> Option<StatsSummary> {
        let seconds: Vec<f64> = self.frame_times.iter().map(Duration::as_secs_f64).collect();
        let fps: Vec<f64> = seconds.iter().filter(|&&s| s > 0.0).map(|s| 1.0 / s).collect();

        Some(StatsSummary {
            frames: seconds.len(),
            frame_time: Moments::of(&seconds)?,
            fps: Moments::of(&fps).unwrap_or_default(),
        })
    }
}
