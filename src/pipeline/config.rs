use crate::clock::{is_valid_pattern, DEFAULT_TIMESTAMP_PATTERN};
use crate::error::ConfigError;

pub const INPUT_STREAM: &str = "input";
pub const STDOUT_STREAM: &str = "stdout";
pub const STDERR_STREAM: &str = "stderr";

pub const DEFAULT_STDIN_TEMPLATE: &str = "{timestamp} {input}\n";
pub const DEFAULT_STDOUT_TEMPLATE: &str = "O {timestamp} {stdout}\n";
pub const DEFAULT_STDERR_TEMPLATE: &str = "E {timestamp} {stderr}\n";

/// Configuration for filter and supervise runs
#[derive(Debug, Clone)]
pub struct PrefixConfig {
    pub stdin_template: String,
    pub stdout_template: String,
    pub stderr_template: String,
    pub timestamp_pattern: String,
    pub on_failure: FailureStrategy,
    pub buffer_size: usize,
    pub debug: bool,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        PrefixConfig {
            stdin_template: DEFAULT_STDIN_TEMPLATE.to_string(),
            stdout_template: DEFAULT_STDOUT_TEMPLATE.to_string(),
            stderr_template: DEFAULT_STDERR_TEMPLATE.to_string(),
            timestamp_pattern: DEFAULT_TIMESTAMP_PATTERN.to_string(),
            on_failure: FailureStrategy::Drain,
            buffer_size: 65536, // 64KB
            debug: false,
        }
    }
}

impl PrefixConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_pattern(&self.timestamp_pattern) {
            return Err(ConfigError::InvalidTimestamp {
                pattern: self.timestamp_pattern.clone(),
            });
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize);
        }
        Ok(())
    }
}

/// What a pump does with its input after it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailureStrategy {
    /// Keep reading and discard the rest, so the child never blocks on a full pipe
    #[value(name = "drain")]
    Drain,
    /// Close the input right away
    #[value(name = "stop")]
    Stop,
}
