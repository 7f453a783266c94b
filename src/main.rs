use clap::Parser;
use std::io::Write;

use prefixout::{
    unescape, ConfigError, FailureStrategy, Mode, PrefixConfig, SuperviseError, Supervisor,
    SystemClock, DEFAULT_TIMESTAMP_PATTERN,
};

#[derive(Parser)]
#[command(name = "prefixout")]
#[command(about = "Prefix lines of stdin, or of a command's stdout and stderr, with a timestamp")]
#[command(version)]
struct Args {
    /// Format of the command's stdout lines [default: "O {timestamp} {stdout}\n"]
    #[arg(long = "stdout", value_name = "TEMPLATE")]
    stdout_template: Option<String>,

    /// Format of the command's stderr lines [default: "E {timestamp} {stderr}\n"]
    #[arg(long = "stderr", value_name = "TEMPLATE")]
    stderr_template: Option<String>,

    /// Format of stdin lines when no command is given [default: "{timestamp} {input}\n"]
    #[arg(long = "stdin", value_name = "TEMPLATE")]
    stdin_template: Option<String>,

    /// strftime pattern for {timestamp}
    #[arg(long, value_name = "PATTERN", default_value = DEFAULT_TIMESTAMP_PATTERN)]
    timestamp: String,

    /// What a failed command stream does with its remaining input; stdin filtering always stops
    #[arg(long, value_enum, default_value_t = FailureStrategy::Drain)]
    on_failure: FailureStrategy,

    /// Read buffer size per stream
    #[arg(long, default_value = "65536")] // 64KB
    buffer_size: usize,

    /// Debug logging and per-stream statistics on stderr
    #[arg(long)]
    debug: bool,

    /// Command to run; without one, stdin is filtered
    #[arg(value_name = "CMD", trailing_var_arg = true)]
    cmd: Vec<String>,
}

impl Args {
    fn to_config(&self) -> PrefixConfig {
        let defaults = PrefixConfig::default();
        let template = |given: &Option<String>, default: String| {
            given.as_deref().map(unescape).unwrap_or(default)
        };

        PrefixConfig {
            stdin_template: template(&self.stdin_template, defaults.stdin_template),
            stdout_template: template(&self.stdout_template, defaults.stdout_template),
            stderr_template: template(&self.stderr_template, defaults.stderr_template),
            timestamp_pattern: self.timestamp.clone(),
            on_failure: self.on_failure,
            buffer_size: self.buffer_size,
            debug: self.debug,
        }
    }
}

fn setup_logging(debug: bool) {
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else if debug {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "prefixout: {}: {}",
                record.level().as_str().to_lowercase(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    setup_logging(args.debug);

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("prefixout: {}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

fn exit_code_for(e: &anyhow::Error) -> i32 {
    if e.downcast_ref::<ConfigError>().is_some() {
        2
    } else if let Some(err) = e.downcast_ref::<SuperviseError>() {
        err.exit_code()
    } else {
        1
    }
}

fn run(args: Args) -> anyhow::Result<i32> {
    SystemClock::start();

    let config = args.to_config();
    config.validate()?;

    let mode = Mode::from_command(&args.cmd);
    log::debug!("mode: {:?}", mode);

    let supervisor = Supervisor::new(config);
    let summary = supervisor.run(&mode)?;

    for failure in summary.failures() {
        eprintln!("prefixout: {}", failure);
    }

    if supervisor.config().debug {
        eprintln!("Final statistics:");
        for report in &summary.reports {
            eprintln!("  {}", report.stats.summary());
        }
        if let Some(status) = summary.child_status {
            eprintln!("  child: {}", status);
        }
    }

    Ok(summary.exit_code())
}
