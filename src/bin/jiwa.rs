//! Jiwa CLI - Command-line interface for relapse-risk scoring
//!
//! Commands:
//! - assess: Score a patient snapshot and report outcomes
//! - demo: Score the built-in reference patient
//! - validate: Check a snapshot for implausible values
//! - score: Calibrate a precomputed feature vector
//! - config: Print the baseline configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jiwa_relapse::calibrator::RiskCalibrator;
use jiwa_relapse::encoder::render_text;
use jiwa_relapse::intake::{
    parse_snapshot, parse_validated_snapshot, validate_snapshot, ValidationIssue,
};
use jiwa_relapse::{
    FeatureVector, PatientSnapshot, PredictorConfig, RelapseError, RelapsePredictor,
    RiskAssessment, JIWA_VERSION,
};

/// Jiwa - heuristic relapse-risk scoring from digital phenotyping signals
#[derive(Parser)]
#[command(name = "jiwa")]
#[command(version = JIWA_VERSION)]
#[command(about = "Score relapse risk from behavioral and linguistic signals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a patient snapshot and report outcomes
    Assess {
        /// Snapshot JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Predictor configuration JSON (defaults to the baseline constants)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Refuse snapshots with implausible values
        #[arg(long)]
        strict: bool,

        /// Output format (text on a terminal, JSON otherwise)
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Score the built-in reference patient
    Demo {
        /// Predictor configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format (text on a terminal, JSON otherwise)
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Check a snapshot for implausible values
    Validate {
        /// Snapshot JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Calibrate a precomputed feature vector (JSON object of ten features)
    Score {
        /// Feature JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Predictor configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the baseline configuration as JSON
    Config,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Plain-text report
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), JiwaCliError> {
    match cli.command {
        Commands::Assess {
            input,
            config,
            strict,
            format,
        } => cmd_assess(&input, config.as_deref(), strict, format),

        Commands::Demo { config, format } => cmd_demo(config.as_deref(), format),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Score { input, config } => cmd_score(&input, config.as_deref()),

        Commands::Config => {
            println!("{}", PredictorConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn cmd_assess(
    input: &Path,
    config: Option<&Path>,
    strict: bool,
    format: Option<OutputFormat>,
) -> Result<(), JiwaCliError> {
    let snapshot = parse_validated_snapshot(&read_input(input)?, strict)?;

    let predictor = RelapsePredictor::with_config(load_config(config)?);
    let assessment = predictor.assess(&snapshot);
    info!(
        relapse_risk = assessment.outcomes.relapse_risk_6_12m,
        risk_band = assessment.risk_band.as_str(),
        "snapshot assessed"
    );

    print!("{}", format_assessment(&assessment, format)?);
    Ok(())
}

fn cmd_demo(config: Option<&Path>, format: Option<OutputFormat>) -> Result<(), JiwaCliError> {
    let predictor = RelapsePredictor::with_config(load_config(config)?);
    let assessment = predictor.assess(&PatientSnapshot::demo());

    print!("{}", format_assessment(&assessment, format)?);
    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), JiwaCliError> {
    let snapshot = parse_snapshot(&read_input(input)?)?;
    let issues = validate_snapshot(&snapshot);

    if json {
        let report = ValidationReport {
            valid: issues.is_empty(),
            issues: &issues,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Issues: {}", issues.len());

        if !issues.is_empty() {
            println!("\nIssues:");
            for issue in &issues {
                println!("  - {issue}");
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(RelapseError::ValidationFailed(issues.len()).into())
    }
}

fn cmd_score(input: &Path, config: Option<&Path>) -> Result<(), JiwaCliError> {
    let map: BTreeMap<String, f64> = serde_json::from_str(&read_input(input)?)?;
    let features = FeatureVector::try_from(map)?;

    let config = load_config(config)?;
    let calibrator = RiskCalibrator::new(&config.calibration);

    let report = ScoreReport {
        score: calibrator.score(&features),
        relapse_risk_6_12m: calibrator.relapse_probability(&features),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, JiwaCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<PredictorConfig, JiwaCliError> {
    let Some(path) = path else {
        return Ok(PredictorConfig::default());
    };

    let json = fs::read_to_string(path)?;
    PredictorConfig::from_json(&json).map_err(|e| {
        warn!(path = %path.display(), error = %e, "failed to load predictor config");
        e.into()
    })
}

fn format_assessment(
    assessment: &RiskAssessment,
    format: Option<OutputFormat>,
) -> Result<String, JiwaCliError> {
    let format = format.unwrap_or_else(|| {
        if atty::is(atty::Stream::Stdout) {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    });

    match format {
        OutputFormat::Text => Ok(render_text(assessment)),
        OutputFormat::Json => Ok(serde_json::to_string(assessment)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(assessment)? + "\n"),
    }
}

// Error types

#[derive(Debug)]
enum JiwaCliError {
    Io(io::Error),
    Relapse(RelapseError),
    Json(serde_json::Error),
}

impl From<io::Error> for JiwaCliError {
    fn from(e: io::Error) -> Self {
        JiwaCliError::Io(e)
    }
}

impl From<RelapseError> for JiwaCliError {
    fn from(e: RelapseError) -> Self {
        JiwaCliError::Relapse(e)
    }
}

impl From<serde_json::Error> for JiwaCliError {
    fn from(e: serde_json::Error) -> Self {
        JiwaCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<JiwaCliError> for CliError {
    fn from(e: JiwaCliError) -> Self {
        match e {
            JiwaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            JiwaCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            JiwaCliError::Relapse(e) => {
                let (code, hint) = match &e {
                    RelapseError::KeySetMismatch { .. } | RelapseError::UnknownFeature(_) => (
                        "KEY_SET_MISMATCH",
                        "Provide exactly the ten feature names (see 'jiwa config')",
                    ),
                    RelapseError::InvalidWeight { .. } | RelapseError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Compare the config with 'jiwa config' output")
                    }
                    RelapseError::FeatureOutOfRange { .. } => {
                        ("FEATURE_OUT_OF_RANGE", "Feature values must lie in 0-1")
                    }
                    RelapseError::ValidationFailed(_) => {
                        ("VALIDATION_FAILED", "Run 'jiwa validate' for details")
                    }
                    RelapseError::ParseError(_) | RelapseError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Snapshot must contain all eighteen measurement fields",
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    issues: &'a [ValidationIssue],
}

#[derive(serde::Serialize)]
struct ScoreReport {
    score: f64,
    relapse_risk_6_12m: f64,
}
