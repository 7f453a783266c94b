use log::debug;
use std::io::{self, BufRead, Write};
use std::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::error::{PumpError, PumpFailure};
use crate::formatters::{LineFormatter, Template};
use crate::pipeline::config::{FailureStrategy, PrefixConfig};
use crate::pipeline::context::{PumpState, PumpStats};
use crate::pipeline::sink::FlushingSink;
use crate::values::Values;

/// Outcome of a finished pump
#[derive(Debug)]
pub struct PumpReport {
    pub state: PumpState,
    pub stats: PumpStats,
    pub failure: Option<PumpFailure>,
}

impl PumpReport {
    pub fn is_drained(&self) -> bool {
        self.state == PumpState::Drained
    }

    pub fn into_result(self) -> Result<PumpStats, PumpFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(self.stats),
        }
    }
}

/// Moves lines from one input stream to one sink, annotating each line.
///
/// A pump owns its own `Values`, so two pumps running side by side never
/// see each other's fields. `run` consumes the pump: once it is drained or
/// failed it cannot be started again.
pub struct StreamPump<C: Clock = SystemClock> {
    stream: String,
    template: String,
    timestamp_pattern: String,
    on_failure: FailureStrategy,
    clock: C,
    values: Values,
}

impl StreamPump<SystemClock> {
    pub fn new(stream: &str, template: &str, config: &PrefixConfig) -> Self {
        Self::with_clock(stream, template, config, SystemClock)
    }
}

impl<C: Clock> StreamPump<C> {
    pub fn with_clock(stream: &str, template: &str, config: &PrefixConfig, clock: C) -> Self {
        StreamPump {
            stream: stream.to_string(),
            template: template.to_string(),
            timestamp_pattern: config.timestamp_pattern.clone(),
            on_failure: config.on_failure,
            clock,
            values: Values::new(),
        }
    }

    /// Override what happens to the input after a failure
    pub fn with_failure_strategy(mut self, on_failure: FailureStrategy) -> Self {
        self.on_failure = on_failure;
        self
    }

    pub fn run<R: BufRead, W: Write>(mut self, mut input: R, sink: &mut FlushingSink<W>) -> PumpReport {
        let start_time = Instant::now();
        let mut stats = PumpStats::new(&self.stream);
        let mut state = PumpState::Reading;

        debug!("{}: pump started", self.stream);

        let result = match Template::parse(&self.template) {
            Ok(template) => {
                let formatter = LineFormatter::new(template, &self.stream, &self.timestamp_pattern, &self.clock);
                Self::pump_lines(
                    &mut state,
                    &mut self.values,
                    &formatter,
                    &mut input,
                    sink,
                    &mut stats,
                )
            }
            Err(e) => Err(PumpError::Format(e)),
        };

        let failure = match result {
            Ok(()) => {
                state = PumpState::Drained;
                debug!("{}: drained after {} lines", self.stream, stats.lines_read);
                None
            }
            Err(error) => {
                state = PumpState::Failed;
                debug!("{}: failed: {}", self.stream, error);
                if self.on_failure == FailureStrategy::Drain {
                    stats.lines_discarded = discard_remaining(&mut input);
                    debug!("{}: discarded {} lines", self.stream, stats.lines_discarded);
                }
                Some(PumpFailure {
                    stream: self.stream.clone(),
                    error,
                })
            }
        };

        stats.duration = start_time.elapsed();

        PumpReport {
            state,
            stats,
            failure,
        }
    }

    fn pump_lines<R: BufRead, W: Write, F: Clock>(
        state: &mut PumpState,
        values: &mut Values,
        formatter: &LineFormatter<F>,
        input: &mut R,
        sink: &mut FlushingSink<W>,
        stats: &mut PumpStats,
    ) -> Result<(), PumpError> {
        let mut buf = Vec::with_capacity(1024);

        loop {
            *state = PumpState::Reading;
            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => return Ok(()),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PumpError::Read(e)),
            }
            stats.lines_read += 1;

            *state = PumpState::Formatting;
            let line = decode_line(&buf);
            let text = formatter.format(&line, values)?;

            *state = PumpState::Writing;
            sink.write(&text).map_err(PumpError::Write)?;
            stats.lines_written += 1;
        }
    }
}

/// Lossy UTF-8 decode without the trailing `\n` or `\r\n`
fn decode_line(buf: &[u8]) -> String {
    let mut end = buf.len();
    if end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && buf[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Read and drop everything up to end-of-stream, counting lines.
/// Stops quietly on a read error.
fn discard_remaining<R: BufRead>(input: &mut R) -> usize {
    let mut discarded = 0;
    loop {
        let (consumed, newlines) = match input.fill_buf() {
            Ok([]) => return discarded,
            Ok(chunk) => (chunk.len(), chunk.iter().filter(|&&b| b == b'\n').count()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return discarded,
        };
        input.consume(consumed);
        discarded += newlines;
    }
}
