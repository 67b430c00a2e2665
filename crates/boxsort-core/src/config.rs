//! Experiment configuration
//!
//! Loaded from TOML or built in code with `with_*` methods. Every section
//! has defaults, so a config file only lists what it overrides.

use crate::datalog::SessionLabels;
use crate::error::ConfigError;
use crate::prompt::{PromptCatalog, PromptTiming};
use crate::schedule::GROUP_SIZE;
use crate::types::Condition;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub participant_id: String,
    pub condition: Condition,
    /// Boxes per session; a positive multiple of 4
    pub total_boxes: usize,
    /// Seed for the color schedule and compliment picks; random when absent
    pub seed: Option<u64>,
    /// CSV output path used by the CLI
    pub log_path: PathBuf,
    pub timing: PromptTiming,
    pub cooldowns: CooldownConfig,
    pub flow: FlowConfig,
    pub prompts: PromptCatalog,
}

impl ExperimentConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participant_id.trim().is_empty() {
            return Err(ConfigError::MissingParticipant);
        }
        if self.total_boxes < GROUP_SIZE || self.total_boxes % GROUP_SIZE != 0 {
            return Err(ConfigError::InvalidBoxTotal {
                total: self.total_boxes,
            });
        }
        let cooldowns = [
            ("cooldowns.next_box", self.cooldowns.next_box),
            ("cooldowns.compressor", self.cooldowns.compressor),
            (
                "cooldowns.compressor_finalize_delay",
                self.cooldowns.compressor_finalize_delay,
            ),
        ];
        for (field, value) in self.timing.fields().into_iter().chain(cooldowns) {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTiming { field, value });
            }
        }
        if self.prompts.ambiguous.is_empty() {
            return Err(ConfigError::EmptyPromptList("ambiguous"));
        }
        if self.prompts.positive.is_empty() {
            return Err(ConfigError::EmptyPromptList("positive"));
        }
        Ok(())
    }

    #[must_use]
    pub fn labels(&self) -> SessionLabels {
        SessionLabels::new(self.participant_id.clone(), self.condition)
    }

    pub fn with_participant(mut self, id: impl Into<String>) -> Self {
        self.participant_id = id.into();
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_total_boxes(mut self, total: usize) -> Self {
        self.total_boxes = total;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    pub fn with_timing(mut self, timing: PromptTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_cooldowns(mut self, cooldowns: CooldownConfig) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    pub fn with_flow(mut self, flow: FlowConfig) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptCatalog) -> Self {
        self.prompts = prompts;
        self
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            participant_id: "P00".to_string(),
            condition: Condition::default(),
            total_boxes: 16,
            seed: None,
            log_path: PathBuf::from("ExperimentData.csv"),
            timing: PromptTiming::default(),
            cooldowns: CooldownConfig::default(),
            flow: FlowConfig::default(),
            prompts: PromptCatalog::default(),
        }
    }
}

/// Button cooldowns, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Minimum spacing between accepted next-box presses
    pub next_box: f64,
    /// Minimum spacing between accepted compressor presses
    pub compressor: f64,
    /// Delay between a compressor press and finalizing its contents
    pub compressor_finalize_delay: f64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            next_box: 10.0,
            compressor: 10.0,
            compressor_finalize_delay: 1.0,
        }
    }
}

/// Next-box cycle options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Sweep the compressor along with the colored bins on every next-box press.
    ///
    /// When false, compressor contents are finalized only by its button or at
    /// the end of the shift, and are logged as `CompressorWithoutButton` meanwhile.
    pub cycle_finalizes_compressor: bool,
}

impl FlowConfig {
    /// Destructive areas swept by the next-box cycle
    #[must_use]
    pub fn swept_areas(&self) -> Vec<crate::types::Area> {
        use crate::types::Area;
        let mut areas = vec![Area::GreenBin, Area::BlueBin, Area::RedBin];
        if self.cycle_finalizes_compressor {
            areas.push(Area::Compressor);
        }
        areas
    }

    pub fn with_cycle_finalizes_compressor(mut self, enabled: bool) -> Self {
        self.cycle_finalizes_compressor = enabled;
        self
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            cycle_finalizes_compressor: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Area;

    #[test]
    fn defaults_validate() {
        let config = ExperimentConfig::default();
        assert_eq!(config.total_boxes, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_box_totals_outside_groups_of_four() {
        for total in [0, 3, 6, 10] {
            let err = ExperimentConfig::default()
                .with_total_boxes(total)
                .validate()
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidBoxTotal { total: t } if t == total));
        }
        assert!(ExperimentConfig::default()
            .with_total_boxes(4)
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_negative_timing() {
        let timing = PromptTiming {
            start_delay: -1.0,
            ..PromptTiming::default()
        };
        let err = ExperimentConfig::default()
            .with_timing(timing)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTiming {
                field: "start_delay",
                ..
            }
        ));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ExperimentConfig::from_toml_str(
            r#"
            participant_id = "P17"
            condition = "Cooperation"
            total_boxes = 8
            seed = 7

            [cooldowns]
            next_box = 4.0

            [flow]
            cycle_finalizes_compressor = false
            "#,
        )
        .unwrap();
        assert_eq!(config.participant_id, "P17");
        assert_eq!(config.condition, Condition::Cooperation);
        assert_eq!(config.total_boxes, 8);
        assert_eq!(config.seed, Some(7));
        assert!((config.cooldowns.next_box - 4.0).abs() < f64::EPSILON);
        assert!((config.cooldowns.compressor - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.prompts.ambiguous.len(), 3);
        assert_eq!(
            config.flow.swept_areas(),
            vec![Area::GreenBin, Area::BlueBin, Area::RedBin]
        );
    }

    #[test]
    fn invalid_toml_total_is_rejected() {
        let err = ExperimentConfig::from_toml_str("total_boxes = 6").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBoxTotal { total: 6 }));
    }
}
