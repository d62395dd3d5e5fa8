//! Percept CLI - Command-line interface for Percept Trend
//!
//! Commands:
//! - sessions: Export sanitized `GroupHistory` sessions
//! - trend: Filter chronic LFP trend logs per hemisphere
//! - brainsense: Filter BrainSense streaming sessions
//! - thresholds: Print the active group's alert thresholds
//! - doctor: Diagnose configuration and input documents

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use percept_trend::encoder::ReportEncoder;
use percept_trend::navigator::{Document, Navigate};
use percept_trend::render;
use percept_trend::thresholds::ThresholdResolver;
use percept_trend::types::Hemisphere;
use percept_trend::window::window_from_parts;
use percept_trend::{
    path, sanitized_sessions, session_report, trend_report, FilterConfig, Loader, OutlierMethod,
    PipelineError, PRODUCER_NAME, TREND_VERSION,
};

/// Percept - LFP trend extraction and outlier filtering
#[derive(Parser)]
#[command(name = "percept")]
#[command(version = TREND_VERSION)]
#[command(about = "Extract and filter LFP telemetry from neurostimulator session exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Export sanitized GroupHistory sessions
    Sessions {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json")]
        format: SessionsFormat,
    },

    /// Filter chronic LFP trend logs for both hemispheres
    Trend {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: ReportFormat,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Filter BrainSense streaming sessions
    Brainsense {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: ReportFormat,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Print the active group's LFP alert thresholds
    Thresholds {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and input documents
    Doctor {
        /// Session export to inspect
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Filter configuration file to validate
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Outlier strategy (defaults to the command's standard method)
    #[arg(long)]
    outlier: Option<OutlierChoice>,

    /// Robust Z-score cut-off
    #[arg(long)]
    z_threshold: Option<f64>,

    /// Floor for a zero median absolute deviation
    #[arg(long)]
    epsilon: Option<f64>,

    /// IQR fence multiplier
    #[arg(long)]
    iqr_multiplier: Option<f64>,

    /// Load filter settings from a JSON file; explicit flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct WindowArgs {
    /// Trailing window weeks
    #[arg(long)]
    weeks: Option<u32>,

    /// Trailing window days
    #[arg(long)]
    days: Option<u32>,

    /// Trailing window hours
    #[arg(long)]
    hours: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutlierChoice {
    /// Interquartile-range fences (drops records)
    Iqr,
    /// Robust Z-score on the median absolute deviation (masks values)
    Mad,
    /// Keep every record
    None,
}

#[derive(Clone, ValueEnum)]
enum SessionsFormat {
    /// JSON array with 4-space indentation
    Json,
    /// One `path = value` line per leaf
    Flat,
}

#[derive(Clone, ValueEnum)]
enum ReportFormat {
    /// Plain-text tables
    Text,
    /// Compact JSON export
    Json,
    /// Pretty-printed JSON export
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), CliFailure> {
    match command {
        Commands::Sessions {
            input,
            output,
            format,
        } => cmd_sessions(&input, &output, format),
        Commands::Trend {
            input,
            output,
            format,
            filter,
            window,
        } => {
            let config = build_config(&filter, OutlierMethod::iqr())?;
            let config = match window_span(&window) {
                Some(span) => config.with_window(span),
                None => config,
            };
            cmd_trend(&input, &output, format, &config)
        }
        Commands::Brainsense {
            input,
            output,
            format,
            filter,
        } => {
            let config = build_config(&filter, OutlierMethod::robust_z_score())?;
            if let Some(secs) = config.window_secs {
                log::warn!("window_secs = {} ignored: BrainSense sessions use elapsed time", secs);
            }
            cmd_brainsense(&input, &output, format, &config)
        }
        Commands::Thresholds { input, json } => cmd_thresholds(&input, json),
        Commands::Doctor {
            input,
            config,
            json,
        } => cmd_doctor(input.as_deref(), config.as_deref(), json),
    }
}

fn cmd_sessions(input: &Path, output: &Path, format: SessionsFormat) -> Result<(), CliFailure> {
    let document = load_document(input)?;
    let sessions = sanitized_sessions(&document)?;

    let rendered = match format {
        SessionsFormat::Json => render::sessions_to_pretty_json(&sessions)?,
        SessionsFormat::Flat => render::flatten_sessions(&sessions),
    };
    write_output(output, &rendered)
}

fn cmd_trend(
    input: &Path,
    output: &Path,
    format: ReportFormat,
    config: &FilterConfig,
) -> Result<(), CliFailure> {
    let document = load_document(input)?;
    let report = trend_report(&document, config)?;

    let rendered = match format {
        ReportFormat::Text => render::trend_table(&report),
        ReportFormat::Json => ReportEncoder::new().trend_to_json(report, config)?,
        ReportFormat::JsonPretty => {
            serde_json::to_string_pretty(&ReportEncoder::new().encode_trend(report, config))?
        }
    };
    write_output(output, &rendered)
}

fn cmd_brainsense(
    input: &Path,
    output: &Path,
    format: ReportFormat,
    config: &FilterConfig,
) -> Result<(), CliFailure> {
    let document = load_document(input)?;
    let report = session_report(&document, config)?;

    if report.sessions.is_empty() {
        log::warn!("no BrainSense sessions with enough samples to process");
    }

    let rendered = match format {
        ReportFormat::Text => render::session_table(&report),
        ReportFormat::Json => ReportEncoder::new().sessions_to_json(report, config)?,
        ReportFormat::JsonPretty => {
            serde_json::to_string_pretty(&ReportEncoder::new().encode_sessions(report, config))?
        }
    };
    write_output(output, &rendered)
}

fn cmd_thresholds(input: &Path, json: bool) -> Result<(), CliFailure> {
    let document = load_document(input)?;
    let (left, right) = ThresholdResolver::resolve_both(&document);

    if json {
        let payload = serde_json::json!({ "left": left, "right": right });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{}", render::thresholds_text(&left, &right));
    }
    Ok(())
}

fn cmd_doctor(input: Option<&Path>, config: Option<&Path>, json: bool) -> Result<(), CliFailure> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Percept Trend version {}", TREND_VERSION),
    });

    if let Some(config_path) = config {
        checks.push(match FilterConfig::load(config_path) {
            Ok(config) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Filter config valid (outlier method: {}, window: {})",
                    config.outlier.name(),
                    config
                        .window_secs
                        .map_or_else(|| "full history".to_string(), |s| format!("{s}s"))
                ),
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid filter config: {}", e),
            },
        });
    }

    if let Some(input_path) = input {
        match load_document(input_path) {
            Ok(document) => inspect_document(&document, &mut checks),
            Err(e) => checks.push(DoctorCheck {
                name: "input".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot load input: {}", CliError::from(e).message),
            }),
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass an export with -i)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (-i - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: TREND_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Percept Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(CliFailure::DoctorFailed)
    } else {
        Ok(())
    }
}

/// Append one check per data source the pipeline reads
fn inspect_document(document: &Document, checks: &mut Vec<DoctorCheck>) {
    for hemisphere in Hemisphere::ALL {
        let name = format!("trend_{}", hemisphere.as_str().to_lowercase());
        let buckets = document
            .object_at(&path!["DiagnosticData", "LFPTrendLogs", hemisphere.location_key()])
            .map(|log| log.len());

        checks.push(match buckets {
            Some(count) => DoctorCheck {
                name,
                status: CheckStatus::Ok,
                message: format!("{} hemisphere trend log with {} buckets", hemisphere, count),
            },
            None => DoctorCheck {
                name,
                status: CheckStatus::Warning,
                message: format!("No {} hemisphere trend log", hemisphere),
            },
        });
    }

    let (left, right) = ThresholdResolver::resolve_both(document);
    checks.push(if left.is_empty() && right.is_empty() {
        DoctorCheck {
            name: "thresholds".to_string(),
            status: CheckStatus::Warning,
            message: "No active group with LFP thresholds".to_string(),
        }
    } else {
        DoctorCheck {
            name: "thresholds".to_string(),
            status: CheckStatus::Ok,
            message: "Active group thresholds found".to_string(),
        }
    });

    let counted = [
        ("brainsense", "BrainSenseLfp", "BrainSense sessions"),
        ("group_history", "GroupHistory", "GroupHistory sessions"),
    ];
    for (name, key, label) in counted {
        checks.push(match document.optional_array(&path![key]) {
            Ok(Some(items)) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Ok,
                message: format!("{} {}", items.len(), label),
            },
            Ok(None) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Warning,
                message: format!("No {}", label),
            },
            Err(e) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        });
    }
}

// Helper functions

/// Resolve filter settings: config file (or the command default), then flags
fn build_config(args: &FilterArgs, default_method: OutlierMethod) -> Result<FilterConfig, CliFailure> {
    let mut config = match &args.config {
        Some(path) => FilterConfig::load(path)?,
        None => FilterConfig::new(default_method),
    };

    if let Some(choice) = args.outlier {
        config.outlier = match choice {
            OutlierChoice::Iqr => OutlierMethod::iqr(),
            OutlierChoice::Mad => OutlierMethod::robust_z_score(),
            OutlierChoice::None => OutlierMethod::None,
        };
    }

    match &mut config.outlier {
        OutlierMethod::RobustZScore { threshold, epsilon } => {
            *threshold = args.z_threshold.unwrap_or(*threshold);
            *epsilon = args.epsilon.unwrap_or(*epsilon);
            if args.iqr_multiplier.is_some() {
                log::warn!("--iqr-multiplier ignored by the robust Z-score filter");
            }
        }
        OutlierMethod::Iqr { multiplier } => {
            *multiplier = args.iqr_multiplier.unwrap_or(*multiplier);
            if args.z_threshold.is_some() || args.epsilon.is_some() {
                log::warn!("--z-threshold and --epsilon ignored by the IQR filter");
            }
        }
        OutlierMethod::None => {
            if args.z_threshold.is_some() || args.epsilon.is_some() || args.iqr_multiplier.is_some() {
                log::warn!("outlier parameters ignored with --outlier none");
            }
        }
    }

    config.validate()?;
    log::debug!("filter config: {:?}", config);
    Ok(config)
}

fn window_span(args: &WindowArgs) -> Option<chrono::Duration> {
    if args.weeks.is_none() && args.days.is_none() && args.hours.is_none() {
        return None;
    }
    Some(window_from_parts(
        args.weeks.unwrap_or(0),
        args.days.unwrap_or(0),
        args.hours.unwrap_or(0),
    ))
}

fn load_document(input: &Path) -> Result<Document, CliFailure> {
    let document = if input.as_os_str() == "-" {
        Loader::from_reader(io::stdin().lock())?
    } else {
        Loader::from_path(input)?
    };
    Ok(document)
}

fn write_output(output: &Path, content: &str) -> Result<(), CliFailure> {
    let newline = if content.ends_with('\n') { "" } else { "\n" };

    if output.as_os_str() == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(content.as_bytes())?;
        handle.write_all(newline.as_bytes())?;
        handle.flush()?;
    } else {
        fs::write(output, format!("{content}{newline}"))?;
        log::info!("wrote {}", output.display());
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum CliFailure {
    Io(io::Error),
    Pipeline(PipelineError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for CliFailure {
    fn from(e: io::Error) -> Self {
        CliFailure::Io(e)
    }
}

impl From<PipelineError> for CliFailure {
    fn from(e: PipelineError) -> Self {
        CliFailure::Pipeline(e)
    }
}

impl From<serde_json::Error> for CliFailure {
    fn from(e: serde_json::Error) -> Self {
        CliFailure::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliFailure> for CliError {
    fn from(e: CliFailure) -> Self {
        match e {
            CliFailure::Io(e) | CliFailure::Pipeline(PipelineError::Io(e)) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliFailure::Json(e) | CliFailure::Pipeline(PipelineError::JsonError(e)) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CliFailure::Pipeline(e @ PipelineError::MalformedInput { .. }) => CliError {
                code: "MALFORMED_INPUT".to_string(),
                message: e.to_string(),
                hint: Some("Ensure the input is an unmodified device session export".to_string()),
            },
            CliFailure::Pipeline(e @ PipelineError::InvalidConfig(_)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: e.to_string(),
                hint: Some("Thresholds and epsilon must be positive; multipliers and windows non-negative".to_string()),
            },
            CliFailure::Pipeline(e @ PipelineError::EncodingError(_)) => CliError {
                code: "ENCODING_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            CliFailure::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
