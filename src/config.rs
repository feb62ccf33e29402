//! Engine configuration.
//!
//! Settings shared by every resource in a simulation pass. Per-resource
//! settings live on [`crate::models::Resource`].
//!
//! # Example
//!
//! ```
//! use u_capacity::config::{EngineConfig, SetupMergeMode};
//!
//! let config = EngineConfig::default()
//!     .with_max_delay_enforcement(true)
//!     .with_setup_merge(SetupMergeMode::Additive);
//! assert_eq!(config.attention_limit, 100);
//! ```

use serde::{Deserialize, Serialize};

/// How setup contributors combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SetupMergeMode {
    /// Longest contributor wins.
    #[default]
    Largest,
    /// Contributors add up.
    Additive,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enables resource-span reservations for max-delay constraints.
    pub max_delay_enforcement: bool,
    /// Re-runs a chain once with late-only intervals admitted when it
    /// finishes past the activity's late boundary.
    pub rerun_when_late: bool,
    /// Setup combination rule.
    pub setup_merge: SetupMergeMode,
    /// Attention a multitasking resource can give at once (percent).
    pub attention_limit: u32,
    /// Intervals a cursor hint is walked before falling back to binary search.
    pub hint_walk_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_delay_enforcement: false,
            rerun_when_late: true,
            setup_merge: SetupMergeMode::Largest,
            attention_limit: 100,
            hint_walk_limit: 8,
        }
    }
}

impl EngineConfig {
    pub fn with_max_delay_enforcement(mut self, enabled: bool) -> Self {
        self.max_delay_enforcement = enabled;
        self
    }

    pub fn with_rerun_when_late(mut self, enabled: bool) -> Self {
        self.rerun_when_late = enabled;
        self
    }

    pub fn with_setup_merge(mut self, mode: SetupMergeMode) -> Self {
        self.setup_merge = mode;
        self
    }

    pub fn with_attention_limit(mut self, limit: u32) -> Self {
        self.attention_limit = limit;
        self
    }

    pub fn with_hint_walk_limit(mut self, limit: usize) -> Self {
        self.hint_walk_limit = limit;
        self
    }
}
