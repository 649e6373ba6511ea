#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SamplerError},
    MAX_BLOCK_SIZE,
};

/// Host-facing engine settings.
///
/// Everything here may change between blocks through the engine's setters;
/// the struct is only the initial snapshot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub channels: u16,
    pub sample_rate: f32,
    pub buffer_size: usize,
    /// Host tempo in BPM, used when the LFO's own BPM is zero.
    pub tempo: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48_000.0,
            buffer_size: 1024,
            tempo: 180.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(SamplerError::InvalidConfig(
                "channel count must be at least 1".into(),
            ));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(SamplerError::InvalidConfig(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.buffer_size == 0 || self.buffer_size > MAX_BLOCK_SIZE {
            return Err(SamplerError::InvalidConfig(format!(
                "buffer size must be within 1..={MAX_BLOCK_SIZE}, got {}",
                self.buffer_size
            )));
        }
        if !self.tempo.is_finite() || self.tempo <= 0.0 {
            return Err(SamplerError::InvalidConfig(format!(
                "tempo must be positive, got {}",
                self.tempo
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_channels() {
        let config = EngineConfig {
            channels: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SamplerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_oversized_buffer() {
        let config = EngineConfig {
            buffer_size: MAX_BLOCK_SIZE + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_sample_rate() {
        let config = EngineConfig {
            sample_rate: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
