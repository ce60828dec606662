//! Mutator configuration
//!
//! Loaded from TOML by the embedding service; every field has a default so
//! an empty document is a valid configuration.
//!
//! ```
//! use typegraph_core::config::MutatorConfig;
//!
//! let cfg = MutatorConfig::from_toml_str("emit_activity = false").unwrap();
//! assert!(!cfg.emit_activity);
//! assert_eq!(cfg.collision_suffix_start, 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TypeGraphError};
use crate::logging_facility::Profile;

/// Tunables for `RelationshipMutator`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MutatorConfig {
    /// First integer suffix tried when a synthesized inverse name collides
    pub collision_suffix_start: u32,
    /// Call the `ActivitySink` after each committed batch
    pub emit_activity: bool,
    /// Call the `SemanticMetadataHook` after each committed batch
    pub emit_semantic_metadata: bool,
    pub log_profile: Profile,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self {
            collision_suffix_start: 2,
            emit_activity: true,
            emit_semantic_metadata: true,
            log_profile: Profile::Development,
        }
    }
}

impl MutatorConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the document does not parse or a value is out of range.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: MutatorConfig = toml::from_str(s).map_err(|e| TypeGraphError::InvalidConfig {
            reason: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// `InvalidConfig` if `collision_suffix_start` is below 2.
    pub fn validate(&self) -> Result<()> {
        if self.collision_suffix_start < 2 {
            return Err(TypeGraphError::InvalidConfig {
                reason: format!(
                    "collision_suffix_start must be at least 2, got {}",
                    self.collision_suffix_start
                ),
            });
        }
        Ok(())
    }

    /// Install the global subscriber for `log_profile`
    pub fn init_logging(&self) {
        crate::logging_facility::init(self.log_profile);
    }
}
