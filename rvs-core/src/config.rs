//! Trace configuration
//!
//! Set before a recording session and read-only afterwards: a [`Tracer`]
//! takes its configuration by value at construction.
//!
//! [`Tracer`]: crate::trace::Tracer

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clock::NO_PROCESSOR;
use crate::error::{RVSError, Result};
use crate::trace::ENTRY_SIZE;

/// Default buffer capacity in entries (16 MiB of records)
pub const DEFAULT_CAPACITY: usize = 16 * 1024 * 1024 / ENTRY_SIZE;

/// Largest accepted capacity; keeps every byte size representable as `isize`
pub const MAX_CAPACITY: usize = (isize::MAX as usize) / ENTRY_SIZE;

/// Default fill level, in percent, at which overflow is reported as imminent
pub const DEFAULT_OVERFLOW_THRESHOLD_PERCENT: u8 = 25;

/// Which processor's ipoints are recorded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetProcessor {
    /// Whichever processor calls `start()`
    #[default]
    Caller,
    /// A fixed processor identity
    Processor(u32),
}

/// Configuration for a tracer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Processor whose ipoints are recorded
    pub target: TargetProcessor,

    /// Buffer capacity in entries
    pub capacity: usize,

    /// Fill level (percent of capacity, 1..=99) beyond which overflow is imminent
    pub overflow_threshold_percent: u8,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            target: TargetProcessor::Caller,
            capacity: DEFAULT_CAPACITY,
            overflow_threshold_percent: DEFAULT_OVERFLOW_THRESHOLD_PERCENT,
        }
    }
}

impl TraceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small config for tests
    pub fn minimal() -> Self {
        Self {
            target: TargetProcessor::Processor(0),
            capacity: 16,
            overflow_threshold_percent: DEFAULT_OVERFLOW_THRESHOLD_PERCENT,
        }
    }

    /// Record a fixed processor
    pub fn with_target_processor(mut self, processor: u32) -> Self {
        self.target = TargetProcessor::Processor(processor);
        self
    }

    /// Record whichever processor calls `start()`
    pub fn with_caller_target(mut self) -> Self {
        self.target = TargetProcessor::Caller;
        self
    }

    /// Set buffer capacity in entries
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the imminent-overflow threshold
    pub fn with_overflow_threshold(mut self, percent: u8) -> Self {
        self.overflow_threshold_percent = percent;
        self
    }

    /// Number of recorded entries beyond which overflow is imminent
    pub fn overflow_point(&self) -> usize {
        // capacity <= MAX_CAPACITY, so the product cannot overflow u128
        ((self.capacity as u128 * self.overflow_threshold_percent as u128) / 100) as usize
    }

    /// Check the invariants a tracer relies on
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(RVSError::InvalidConfig {
                reason: "capacity must be at least one entry".to_string(),
            });
        }
        if self.capacity > MAX_CAPACITY {
            return Err(RVSError::InvalidConfig {
                reason: format!(
                    "capacity {} exceeds the maximum of {} entries",
                    self.capacity, MAX_CAPACITY
                ),
            });
        }
        if self.target == TargetProcessor::Processor(NO_PROCESSOR) {
            return Err(RVSError::InvalidConfig {
                reason: format!("processor id {:#x} is reserved", NO_PROCESSOR),
            });
        }
        if self.overflow_threshold_percent == 0 || self.overflow_threshold_percent >= 100 {
            return Err(RVSError::InvalidConfig {
                reason: format!(
                    "overflow threshold must be in 1..=99, got {}",
                    self.overflow_threshold_percent
                ),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TraceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TraceConfig::default();
        assert_eq!(config.capacity, 2 * 1024 * 1024);
        assert_eq!(config.target, TargetProcessor::Caller);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TraceConfig::new()
            .with_target_processor(2)
            .with_capacity(100)
            .with_overflow_threshold(50);

        assert_eq!(config.target, TargetProcessor::Processor(2));
        assert_eq!(config.capacity, 100);
        assert_eq!(config.overflow_point(), 50);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(TraceConfig::new().with_capacity(0).validate().is_err());
        assert!(TraceConfig::new()
            .with_capacity(MAX_CAPACITY + 1)
            .validate()
            .is_err());
        assert!(TraceConfig::new()
            .with_target_processor(u32::MAX)
            .validate()
            .is_err());
        assert!(TraceConfig::new().with_overflow_threshold(0).validate().is_err());
        assert!(TraceConfig::new().with_overflow_threshold(101).validate().is_err());
        // a full buffer never exceeds 100% of itself
        assert!(TraceConfig::new().with_overflow_threshold(100).validate().is_err());
        assert!(TraceConfig::new().with_overflow_threshold(99).validate().is_ok());
    }

    #[test]
    fn test_json_config() {
        let config = TraceConfig::from_json_str(
            r#"{ "target": { "processor": 1 }, "capacity": 4096 }"#,
        )
        .unwrap();
        assert_eq!(config.target, TargetProcessor::Processor(1));
        assert_eq!(config.capacity, 4096);
        assert_eq!(
            config.overflow_threshold_percent,
            DEFAULT_OVERFLOW_THRESHOLD_PERCENT
        );

        let caller = TraceConfig::from_json_str(r#"{ "target": "caller" }"#).unwrap();
        assert_eq!(caller.target, TargetProcessor::Caller);
    }

    #[test]
    fn test_json_config_is_validated() {
        let err = TraceConfig::from_json_str(r#"{ "capacity": 0 }"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let err = TraceConfig::from_json_str("not json").unwrap_err();
        assert_eq!(err.error_code(), "JSON_ERROR");
    }
}
