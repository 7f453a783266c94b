use log::debug;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;

use crate::error::{ConfigError, LaunchError, PumpFailure, SuperviseError};
use crate::pipeline::config::{FailureStrategy, PrefixConfig, INPUT_STREAM, STDERR_STREAM, STDOUT_STREAM};
use crate::pipeline::sink::FlushingSink;
use crate::pipeline::stream::{PumpReport, StreamPump};

/// Operating mode, chosen by whether a command was given
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Annotate our own stdin onto our own stdout
    Filter,
    /// Run a child and annotate its stdout and stderr
    Supervise { program: String, args: Vec<String> },
}

impl Mode {
    pub fn from_command(command: &[String]) -> Mode {
        match Mode::supervise(command) {
            Ok(mode) => mode,
            Err(_) => Mode::Filter,
        }
    }

    pub fn supervise(command: &[String]) -> Result<Mode, ConfigError> {
        let (program, args) = command.split_first().ok_or(ConfigError::EmptyCommand)?;
        Ok(Mode::Supervise {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

/// What a finished run produced
#[derive(Debug)]
pub struct RunSummary {
    /// Child exit status; `None` in filter mode
    pub child_status: Option<ExitStatus>,
    pub reports: Vec<PumpReport>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &PumpFailure> {
        self.reports.iter().filter_map(|r| r.failure.as_ref())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// The child's code, or 1 when the child succeeded but a pump failed.
    /// In filter mode: 0 when drained, 1 when failed.
    pub fn exit_code(&self) -> i32 {
        let failed = self.has_failures();
        match self.child_status {
            None => i32::from(failed),
            Some(status) => match status_code(status) {
                0 if failed => 1,
                code => code,
            },
        }
    }
}

#[cfg(unix)]
fn status_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

#[cfg(not(unix))]
fn status_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

pub struct Supervisor {
    config: PrefixConfig,
}

impl Supervisor {
    pub fn new(config: PrefixConfig) -> Self {
        Supervisor { config }
    }

    pub fn config(&self) -> &PrefixConfig {
        &self.config
    }

    /// Run against the process's own standard streams
    pub fn run(&self, mode: &Mode) -> Result<RunSummary, SuperviseError> {
        match mode {
            Mode::Filter => {
                let stdin = io::stdin();
                let input = BufReader::with_capacity(self.config.buffer_size, stdin.lock());
                Ok(self.run_filter(input, io::stdout()))
            }
            Mode::Supervise { program, args } => {
                self.run_supervised(program, args, &mut io::stdout(), &mut io::stderr())
            }
        }
    }

    /// Filter mode: one pump, on the calling thread. A failure stops the
    /// pump at once; there is no child whose pipe needs draining.
    pub fn run_filter<R: BufRead, W: Write>(&self, input: R, output: W) -> RunSummary {
        debug!("filter mode");
        let pump = StreamPump::new(INPUT_STREAM, &self.config.stdin_template, &self.config)
            .with_failure_strategy(FailureStrategy::Stop);
        let mut sink = FlushingSink::new(output);
        let report = pump.run(input, &mut sink);
        RunSummary {
            child_status: None,
            reports: vec![report],
        }
    }

    /// Supervise mode: spawn the child, pump both of its output pipes on
    /// their own threads, join both, then wait for the child.
    pub fn run_supervised<O, E>(
        &self,
        program: &str,
        args: &[String],
        out: &mut O,
        err: &mut E,
    ) -> Result<RunSummary, SuperviseError>
    where
        O: Write + Send,
        E: Write + Send,
    {
        debug!("supervise mode: {} {:?}", program, args);
        let mut child = spawn_child(program, args)?;
        debug!("child pid {}", child.id());

        let (Some(child_out), Some(child_err)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SuperviseError::Launch(LaunchError {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::Other, "child pipes were not captured"),
            }));
        };

        let capacity = self.config.buffer_size;
        let stdout_pump = StreamPump::new(STDOUT_STREAM, &self.config.stdout_template, &self.config);
        let stderr_pump = StreamPump::new(STDERR_STREAM, &self.config.stderr_template, &self.config);

        let joined = thread::scope(|scope| {
            let stdout_handle = scope.spawn(move || {
                let mut sink = FlushingSink::new(out);
                stdout_pump.run(BufReader::with_capacity(capacity, child_out), &mut sink)
            });
            let stderr_handle = scope.spawn(move || {
                let mut sink = FlushingSink::new(err);
                stderr_pump.run(BufReader::with_capacity(capacity, child_err), &mut sink)
            });

            let stdout_report = stdout_handle.join().map_err(|_| STDOUT_STREAM);
            let stderr_report = stderr_handle.join().map_err(|_| STDERR_STREAM);
            (stdout_report, stderr_report)
        });

        // Both pipes are closed by now; the child is either gone or about to be
        let status = child.wait().map_err(SuperviseError::Wait)?;
        debug!("child exited with {}", status);

        let reports = match joined {
            (Ok(stdout_report), Ok(stderr_report)) => vec![stdout_report, stderr_report],
            (Err(stream), _) | (_, Err(stream)) => {
                return Err(SuperviseError::Join {
                    stream: stream.to_string(),
                })
            }
        };

        Ok(RunSummary {
            child_status: Some(status),
            reports,
        })
    }
}

fn spawn_child(program: &str, args: &[String]) -> Result<Child, LaunchError> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| LaunchError {
            program: program.to_string(),
            source,
        })
}
