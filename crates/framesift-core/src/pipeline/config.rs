use serde::{Deserialize, Serialize};

use crate::compute::DevicePreference;
use crate::consts::DEFAULT_BATCH_SIZE;
use crate::decision::DecisionConfig;

/// Everything a detection run needs besides its source and sinks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub decision: DecisionConfig,
    /// Frames decoded and scored together. Values below 2 are treated as 2.
    pub batch_size: usize,
    pub device: DevicePreference,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            decision: DecisionConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            device: DevicePreference::default(),
        }
    }
}
