// src/lib.rs
pub mod clock;
pub mod error;
pub mod formatters;
pub mod pipeline;
pub mod values;

pub use error::*;

pub use clock::{format_timestamp, Clock, SystemClock, DEFAULT_TIMESTAMP_PATTERN};
pub use formatters::template::{unescape, Template};
pub use formatters::LineFormatter;
pub use pipeline::config::{FailureStrategy, PrefixConfig};
pub use pipeline::context::{LineEvent, PumpState, PumpStats};
pub use pipeline::sink::FlushingSink;
pub use pipeline::stream::{PumpReport, StreamPump};
pub use pipeline::supervisor::{Mode, RunSummary, Supervisor};
pub use values::{Value, Values};
