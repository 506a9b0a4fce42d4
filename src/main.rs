//! Command line entry point: compare two audio files.

use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use timbrelab::config::{self, ConfigError};
use timbrelab::logging;
use timbrelab::report::{ComparisonError, ComparisonStage, FailureReport, PreparedComparison};
use timbrelab::{ChatCompletionsClient, Comparator, ComparisonReport, ReasoningConfig};

fn main() -> ExitCode {
    let options = match parse_args(std::env::args().skip(1).collect()) {
        Ok(Some(options)) => options,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let failure = err.failure_report();
            tracing::error!(
                "Comparison failed at stage {}: {}",
                failure.error.stage,
                failure.error.message
            );
            if options.json {
                print_json(&failure);
            } else {
                eprintln!("Error ({}): {}", failure.error.stage, failure.error.message);
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Comparison(#[from] ComparisonError),
}

impl RunError {
    fn failure_report(&self) -> FailureReport {
        match self {
            Self::Config(err) => FailureReport::new(ComparisonStage::Config, err.to_string()),
            Self::Comparison(err) => FailureReport::from(err),
        }
    }
}

fn run(options: &Options) -> Result<(), RunError> {
    if let Some(path) = config::load_dotenv()? {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    let mut settings = config::load_settings()?;
    if let Some(root) = &options.output_root {
        settings.output_root = root.clone();
    }
    // Fail on missing credentials before any audio is touched.
    let reasoning = if options.no_reasoning {
        None
    } else {
        Some(ReasoningConfig::from_env()?)
    };

    let comparator = Comparator::with_default_resampler(&settings);
    match reasoning {
        None => {
            let prepared = comparator.prepare(&options.first, &options.second)?;
            if options.json {
                print_json(&prepared);
            } else {
                print_prepared(&prepared);
            }
        }
        Some(reasoning) => {
            let client = ChatCompletionsClient::new(&reasoning, settings.request_timeout());
            tracing::info!("Using reasoning endpoint {}", client.endpoint());
            let report = comparator.compare(&options.first, &options.second, &client)?;
            if options.json {
                print_json(&report);
            } else {
                print_report(&report);
            }
        }
    }
    Ok(())
}

fn print_prepared(prepared: &PreparedComparison) {
    println!("{}", prepared.features_text());
    print_images(prepared);
}

fn print_report(report: &ComparisonReport) {
    println!("{}", report.render_text());
    print_images(&report.prepared);
}

fn print_images(prepared: &PreparedComparison) {
    println!();
    for (label, path) in prepared.images.labeled() {
        println!("{label}: {}", path.display());
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("Failed to serialize output: {err}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    first: PathBuf,
    second: PathBuf,
    output_root: Option<PathBuf>,
    json: bool,
    no_reasoning: bool,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut inputs = Vec::new();
    let mut output_root = None;
    let mut json = false;
    let mut no_reasoning = false;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--output-root" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--output-root requires a value".to_string())?;
                output_root = Some(PathBuf::from(value));
            }
            "--json" => json = true,
            "--no-reasoning" => no_reasoning = true,
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            path => inputs.push(PathBuf::from(path)),
        }
        idx += 1;
    }

    let [first, second]: [PathBuf; 2] = inputs.try_into().map_err(|inputs: Vec<PathBuf>| {
        format!(
            "Expected two audio files, got {}\n\n{}",
            inputs.len(),
            help_text()
        )
    })?;
    Ok(Some(Options {
        first,
        second,
        output_root,
        json,
        no_reasoning,
    }))
}

fn help_text() -> &'static str {
    "timbrelab <audio1> <audio2> [options]\n\n\
Compares the timbre of two recordings and asks a chat completions service\n\
whether the second is a faithful clone of the first.\n\n\
Options:\n\
  --output-root <dir>  Directory for session folders (default from config.toml, else ./temp).\n\
  --json               Print the report (or failure) as JSON.\n\
  --no-reasoning       Only extract features and render images.\n\
  -h, --help           Show this help text.\n\n\
Environment:\n\
  OPENAI_API_KEY, OPENAI_CHAT_MODEL (required unless --no-reasoning), OPENAI_BASE_URL."
}
