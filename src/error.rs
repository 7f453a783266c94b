use std::fmt;
use std::io;

/// Template rendering failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("unknown field '{field}' in template")]
    UnknownField { field: String },

    #[error("malformed template at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("invalid format spec '{spec}' for field '{field}'")]
    InvalidSpec { field: String, spec: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PumpError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("write error: {0}")]
    Write(#[source] io::Error),

    #[error("read error: {0}")]
    Read(#[source] io::Error),
}

impl PumpError {
    pub fn kind(&self) -> PumpErrorKind {
        match self {
            PumpError::Format(_) => PumpErrorKind::Format,
            PumpError::Write(_) => PumpErrorKind::Write,
            PumpError::Read(_) => PumpErrorKind::Read,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpErrorKind {
    Format,
    Write,
    Read,
}

impl fmt::Display for PumpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PumpErrorKind::Format => "format",
            PumpErrorKind::Write => "write",
            PumpErrorKind::Read => "read",
        };
        f.write_str(name)
    }
}

/// Failure of a single stream pump, as reported to the supervisor
#[derive(Debug, thiserror::Error)]
#[error("{stream} pump failed: {error}")]
pub struct PumpFailure {
    pub stream: String,
    #[source]
    pub error: PumpError,
}

impl PumpFailure {
    pub fn kind(&self) -> PumpErrorKind {
        self.error.kind()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to launch '{program}': {source}")]
pub struct LaunchError {
    pub program: String,
    #[source]
    pub source: io::Error,
}

impl LaunchError {
    /// Shell-compatible exit code for a command that never started
    pub fn exit_code(&self) -> i32 {
        match self.source.kind() {
            io::ErrorKind::NotFound => 127,
            io::ErrorKind::PermissionDenied => 126,
            _ => 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SuperviseError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("failed to wait for child process: {0}")]
    Wait(#[source] io::Error),

    #[error("{stream} pump thread panicked")]
    Join { stream: String },
}

impl SuperviseError {
    pub fn exit_code(&self) -> i32 {
        match self {
            SuperviseError::Launch(e) => e.exit_code(),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid timestamp pattern '{pattern}'")]
    InvalidTimestamp { pattern: String },

    #[error("buffer size must be greater than zero")]
    InvalidBufferSize,

    #[error("no command given")]
    EmptyCommand,
}
