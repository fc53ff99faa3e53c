use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Settings;
use crate::llm::LlmClient;
use crate::models::ModelId;
use crate::qa::QaEngine;
use crate::session::SessionManager;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: usize,
        max: usize,
        value: usize,
    },
    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// Per-session pipeline parameters, adjustable at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub quality_threshold: f64,
    pub rag_enabled: bool,
    pub auto_improve: bool,
    /// Answer without a PDF, using conversation memory only.
    pub general_mode: bool,
    /// Route to the local GPT-OSS tiers instead of hosted ones.
    pub prefer_local: bool,
    pub improvement_model: ModelId,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            overlap: 50,
            quality_threshold: 60.0,
            rag_enabled: true,
            auto_improve: true,
            general_mode: false,
            prefer_local: false,
            improvement_model: ModelId::Gpt4o,
        }
    }
}

fn check_range(field: &'static str, value: usize, min: usize, max: usize) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("chunk_size", self.chunk_size, 100, 500)?;
        check_range("overlap", self.overlap, 10, 100)?;
        if !(0.0..=100.0).contains(&self.quality_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "quality_threshold",
                min: 0,
                max: 100,
                value: self.quality_threshold.max(0.0) as usize,
            });
        }
        if self.overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }

    /// Apply the fields present in `patch`; nothing changes if the result is invalid.
    pub fn apply(&mut self, patch: &ConfigPatch) -> Result<(), ConfigError> {
        let mut next = self.clone();
        if let Some(v) = patch.chunk_size {
            next.chunk_size = v;
        }
        if let Some(v) = patch.overlap {
            next.overlap = v;
        }
        if let Some(v) = patch.quality_threshold {
            next.quality_threshold = v;
        }
        if let Some(v) = patch.rag_enabled {
            next.rag_enabled = v;
        }
        if let Some(v) = patch.auto_improve {
            next.auto_improve = v;
        }
        if let Some(v) = patch.general_mode {
            next.general_mode = v;
        }
        if let Some(v) = patch.prefer_local {
            next.prefer_local = v;
        }
        if let Some(v) = patch.improvement_model {
            next.improvement_model = v;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    pub chunk_size: Option<usize>,
    pub overlap: Option<usize>,
    pub quality_threshold: Option<f64>,
    pub rag_enabled: Option<bool>,
    pub auto_improve: Option<bool>,
    pub general_mode: Option<bool>,
    pub prefer_local: Option<bool>,
    pub improvement_model: Option<ModelId>,
}

#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<LlmClient>,
    pub qa: Arc<QaEngine>,
    pub sessions: SessionManager,
    /// Starting config for new sessions.
    pub defaults: PipelineConfig,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Self::with_client(LlmClient::new(settings)?, settings)
    }

    pub fn with_client(llm: LlmClient, settings: &Settings) -> anyhow::Result<Self> {
        let llm = Arc::new(llm);
        let defaults = PipelineConfig {
            prefer_local: settings.local_enabled,
            ..PipelineConfig::default()
        };
        defaults.validate()?;

        Ok(Self {
            qa: Arc::new(QaEngine::new(llm.clone())),
            llm,
            sessions: SessionManager::default(),
            defaults,
            max_upload_bytes: settings.max_upload_bytes,
            session_ttl: settings.session_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn patch_applies_partially() {
        let mut config = PipelineConfig::default();
        let patch = ConfigPatch {
            chunk_size: Some(300),
            auto_improve: Some(false),
            ..Default::default()
        };
        config.apply(&patch).unwrap();
        assert_eq!(config.chunk_size, 300);
        assert!(!config.auto_improve);
        assert_eq!(config.overlap, 50);
    }

    #[test]
    fn invalid_patch_leaves_config_untouched() {
        let mut config = PipelineConfig::default();
        let err = config
            .apply(&ConfigPatch {
                chunk_size: Some(100),
                overlap: Some(100),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::OverlapTooLarge {
                chunk_size: 100,
                overlap: 100
            }
        );
        assert_eq!(config, PipelineConfig::default());

        assert!(matches!(
            config.apply(&ConfigPatch {
                chunk_size: Some(50),
                ..Default::default()
            }),
            Err(ConfigError::OutOfRange { field: "chunk_size", .. })
        ));
        assert!(config
            .apply(&ConfigPatch {
                quality_threshold: Some(120.0),
                ..Default::default()
            })
            .is_err());
    }
}
