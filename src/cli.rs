use crate::config::spec::Spec;
use crate::config::types::ComplianceLevel;
use crate::exec::runner::run_checks;
use crate::kernel::{HostSystem, SystemState};
use crate::verdict::grade::grade;
use crate::verdict::report::{write_report, write_summary};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Every check held.
pub const EXIT_OK: i32 = 0;
/// At least one fatal check failure.
pub const EXIT_FAILURE: i32 = 1;
/// The configuration could not be loaded.
pub const EXIT_CONFIG: i32 = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Validate a running container against its bundle configuration
#[derive(Parser, Debug)]
#[command(name = "runtimetest", author, version, about, long_about = None)]
pub struct Cli {
    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Error)]
    pub log_level: LogLevel,
    /// Directory containing config.json
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    /// Weakest requirement level whose failures are fatal (may, should, must)
    #[arg(long, default_value = "must")]
    pub compliance_level: ComplianceLevel,
}

/// Load the document, run every check and write the report.
///
/// Returns the process exit status. Only failures to write the report are
/// errors.
pub fn execute<O: Write, E: Write>(
    path: &Path,
    minimum: ComplianceLevel,
    state: &dyn SystemState,
    out: &mut O,
    err: &mut E,
) -> Result<i32> {
    let spec = match Spec::load(path) {
        Ok(spec) => spec,
        Err(e) => {
            log::debug!("Configuration error: {:?}", e);
            writeln!(err, "{}", e)?;
            return Ok(EXIT_CONFIG);
        }
    };

    let run = grade(run_checks(&spec, state), minimum);
    write_report(out, &run)?;

    match &run.error {
        None => Ok(EXIT_OK),
        Some(error) => {
            write_summary(err, error)?;
            Ok(EXIT_FAILURE)
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .init();

    let code = execute(
        &cli.path,
        cli.compliance_level,
        &HostSystem,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )?;
    if code != EXIT_OK {
        std::process::exit(code);
    }
    Ok(())
}
