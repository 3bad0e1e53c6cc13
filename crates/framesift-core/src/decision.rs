//! Key-Frame Decision Engine.
//!
//! Every signal contributes a deficit: how far the observed similarity falls
//! short of its threshold, plus how far the elapsed time since the last key
//! frame exceeds the time threshold. A frame is a key frame when the summed
//! deficit exceeds `score_cutoff`, so several moderate changes can trigger
//! together even when no single signal would.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FramesiftError, Result};
use crate::similarity::MetricBundle;

/// Thresholds and timing for the decision engine.
///
/// Values are taken as given: nothing here is range-checked, and a
/// configuration that never (or always) fires is a tuning concern for the
/// caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub ssim_threshold: f64,
    pub ssim_threshold_top: f64,
    pub ssim_threshold_bottom: f64,
    pub histogram_similarity_threshold: f64,
    /// Seconds since the last key frame before elapsed time starts adding to the score.
    pub time_threshold: f64,
    pub fps: f64,
    /// Composite score a frame must exceed to become a key frame.
    pub score_cutoff: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            ssim_threshold: 0.95,
            ssim_threshold_top: 0.95,
            ssim_threshold_bottom: 0.95,
            histogram_similarity_threshold: 0.7,
            time_threshold: 1.26,
            fps: 30.0,
            score_cutoff: 1.0,
        }
    }
}

impl DecisionConfig {
    /// Composite deficit score for `metrics` after `elapsed` seconds.
    pub fn score(&self, metrics: &MetricBundle, elapsed: f64) -> f64 {
        (self.ssim_threshold - metrics.ssim_overall)
            + (self.ssim_threshold_top - metrics.ssim_top)
            + (self.ssim_threshold_bottom - metrics.ssim_bottom)
            + (self.histogram_similarity_threshold - metrics.histogram_similarity)
            + (elapsed - self.time_threshold)
    }
}

/// Stateful key-frame selector. Feed it metrics in strictly increasing
/// frame order, one frame at a time.
#[derive(Clone, Debug)]
pub struct KeyFrameDetector {
    config: DecisionConfig,
    time_since_last_key_frame: f64,
    last_index: Option<usize>,
}

impl KeyFrameDetector {
    pub fn new(config: DecisionConfig) -> Self {
        Self {
            config,
            time_since_last_key_frame: 0.0,
            last_index: None,
        }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Seconds accumulated since the last emitted key frame (or the start).
    pub fn time_since_last_key_frame(&self) -> f64 {
        self.time_since_last_key_frame
    }

    /// Score the next step would compute for `metrics`, without advancing.
    pub fn peek_score(&self, metrics: &MetricBundle) -> f64 {
        self.config
            .score(metrics, self.time_since_last_key_frame + 1.0 / self.config.fps)
    }

    /// Advance one frame. Returns `Some(index)` when `index` is a key frame.
    ///
    /// An index that does not increase is rejected and the state is left as it was.
    pub fn step(&mut self, index: usize, metrics: &MetricBundle) -> Result<Option<usize>> {
        if let Some(last) = self.last_index {
            if index <= last {
                return Err(FramesiftError::OutOfOrder { index, last });
            }
        }
        self.last_index = Some(index);

        self.time_since_last_key_frame += 1.0 / self.config.fps;
        let score = self.config.score(metrics, self.time_since_last_key_frame);
        debug!(
            frame = index,
            score,
            elapsed = self.time_since_last_key_frame,
            "Scored frame"
        );

        if score > self.config.score_cutoff {
            info!(frame = index, score, "Key frame");
            self.time_since_last_key_frame = 0.0;
            Ok(Some(index))
        } else {
            Ok(None)
        }
    }
}

/// Run a fresh detector over `(index, metrics)` rows and collect the key frames.
pub fn identify_key_frames<'a, I>(config: &DecisionConfig, metrics: I) -> Result<Vec<usize>>
where
    I: IntoIterator<Item = (usize, &'a MetricBundle)>,
{
    let mut detector = KeyFrameDetector::new(config.clone());
    let mut key_frames = Vec::new();
    for (index, bundle) in metrics {
        if let Some(k) = detector.step(index, bundle)? {
            key_frames.push(k);
        }
    }
    Ok(key_frames)
}
