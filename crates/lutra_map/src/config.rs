//! Mapper configuration.

use serde::{Deserialize, Serialize};

/// Weights for the stage-1 structural score of a dual-output candidate.
///
/// Lower scores are better. `input_sharing` is negative so that candidates
/// sharing more raw best-cut inputs score better.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// Weight on the merged input count.
    pub input_count: f64,
    /// Penalty added when the merged cut deepens both outputs.
    pub depth_penalty: f64,
    /// Weight on the estimated area flow of the merged cut.
    pub area_flow: f64,
    /// Reward (negative weight) per shared best-cut input.
    pub input_sharing: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            input_count: 1.0,
            depth_penalty: 10.0,
            area_flow: 5.0,
            input_sharing: -2.0,
        }
    }
}

/// Configuration of a mapping run.
///
/// All fields have defaults; deserializing an empty document yields the
/// default configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Maximum cut size K (LUT input count), 1..=6.
    pub max_cut_size: u32,
    /// Priority cuts kept per signal P, 1..=64.
    pub max_cuts_per_signal: usize,
    /// Upper bound on area-flow iterations before the exact-area pass.
    pub area_flow_max_iterations: u32,
    /// Whether the dual-output search runs at all.
    pub enable_dual_output: bool,
    /// Stage-2 verification budget per node.
    pub max_dual_candidates: usize,
    /// Heuristic stage-1 filter: reject dual-output candidates whose raw
    /// best cuts share no input. Legality is decided by the truth-table
    /// constraint alone; this only prunes the candidate list.
    pub require_shared_input: bool,
    /// Stage-1 structural score weights.
    pub weights: HeuristicWeights,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            max_cut_size: 6,
            max_cuts_per_signal: 20,
            area_flow_max_iterations: 10,
            enable_dual_output: true,
            max_dual_candidates: 5,
            require_shared_input: false,
            weights: HeuristicWeights::default(),
        }
    }
}

/// Errors produced by [`MapConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `max_cut_size` outside 1..=6.
    #[error("max_cut_size must be between 1 and 6, got {0}")]
    CutSizeOutOfRange(u32),

    /// `max_cuts_per_signal` outside 1..=64.
    #[error("max_cuts_per_signal must be between 1 and 64, got {0}")]
    CutCountOutOfRange(usize),

    /// `area_flow_max_iterations` of zero.
    #[error("area_flow_max_iterations must be at least 1")]
    NoIterations,
}

impl MapConfig {
    /// Validates the configuration.
    ///
    /// A cut size above 6 or a cut budget of zero cannot be mapped to the
    /// target cell family and is always fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cut_size < 1 || self.max_cut_size > 6 {
            return Err(ConfigError::CutSizeOutOfRange(self.max_cut_size));
        }
        if self.max_cuts_per_signal < 1 || self.max_cuts_per_signal > 64 {
            return Err(ConfigError::CutCountOutOfRange(self.max_cuts_per_signal));
        }
        if self.area_flow_max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        Ok(())
    }
}
