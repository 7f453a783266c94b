use crate::clock::{format_timestamp, Clock};
use crate::values::{Value, Values};
use std::time::Duration;

/// One input line plus the metadata captured when it was read
#[derive(Debug, Clone, PartialEq)]
pub struct LineEvent {
    pub stream_name: String,
    pub raw_text: String,
    pub epoch_seconds: i64,
    pub cpu_clock: f64,
    pub formatted_timestamp: String,
}

impl LineEvent {
    /// Read the clocks now; never reuses an earlier reading
    pub fn capture<C: Clock>(stream: &str, raw_text: &str, clock: &C, pattern: &str) -> Self {
        let epoch_seconds = clock.now_epoch();
        LineEvent {
            stream_name: stream.to_string(),
            raw_text: raw_text.to_string(),
            epoch_seconds,
            cpu_clock: clock.now_clock(),
            formatted_timestamp: format_timestamp(epoch_seconds, pattern),
        }
    }

    pub fn merge_into(self, values: &mut Values) {
        values.merge([
            (self.stream_name, Value::Text(self.raw_text)),
            ("clock".to_string(), Value::Float(self.cpu_clock)),
            ("epoch".to_string(), Value::Int(self.epoch_seconds)),
            ("timestamp".to_string(), Value::Text(self.formatted_timestamp)),
        ]);
    }
}

/// Lifecycle of a stream pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Reading,
    Formatting,
    Writing,
    /// Input reached end-of-stream
    Drained,
    Failed,
}

/// Per-stream counters
#[derive(Debug, Default, Clone)]
pub struct PumpStats {
    pub stream: String,
    pub lines_read: usize,
    pub lines_written: usize,
    /// Lines read and thrown away after a failure
    pub lines_discarded: usize,
    pub duration: Duration,
}

impl PumpStats {
    pub fn new(stream: &str) -> Self {
        PumpStats {
            stream: stream.to_string(),
            ..Default::default()
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} lines read, {} written, {} discarded in {}",
            self.stream,
            self.lines_read,
            self.lines_written,
            self.lines_discarded,
            humantime::format_duration(self.duration)
        )
    }
}
