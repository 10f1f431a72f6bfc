//! CLI entry point for the preprocessing pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use lex_prep::{
    CategoricalImputation, ColumnRole, DataProfiler, EncodingMethod, NumericImputation, Pipeline,
    PipelineConfig, PipelineOutput, PrepError, PreprocessingArtifact, ScalingMethod, load_csv,
    write_csv,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Column-level imputation, encoding and scaling for CSV datasets
#[derive(Parser, Debug)]
#[command(
    name = "lex-prep",
    author,
    version,
    about,
    long_about = "Impute missing values, encode categorical columns and scale numerical \
                  columns of a CSV dataset. Steps always run in the order impute, encode, scale.\n\n\
                  Column roles are detected from dtypes (numbers are numerical, text and \
                  booleans are categorical) unless overridden.",
    after_help = "STRATEGIES:\n  \
                  --num-impute   mean | median | none\n  \
                  --cat-impute   most_frequent | constant | none\n  \
                  --encoding     one_hot | label | none\n  \
                  --scaling      standardize | min_max | none\n\n\
                  EXAMPLES:\n  \
                  # One-hot encode city, standardize age\n  \
                  lex-prep -i data.csv --encode city --scale age\n\n  \
                  # Preview detected roles without processing\n  \
                  lex-prep -i data.csv --dry-run\n\n  \
                  # Save fitted transformers, then reuse them on new data\n  \
                  lex-prep -i train.csv --config prep.json --artifact prep_artifact.json\n  \
                  lex-prep -i test.csv --apply prep_artifact.json -o test_processed.csv"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: PathBuf,

    /// Path of the processed CSV
    ///
    /// Defaults to <input_stem>_processed.csv next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Numerical columns (comma separated), replacing detection
    #[arg(long, value_delimiter = ',')]
    numerical: Option<Vec<String>>,

    /// Categorical columns (comma separated), replacing detection
    #[arg(long, value_delimiter = ',')]
    categorical: Option<Vec<String>>,

    /// Numerical imputation strategy
    #[arg(long)]
    num_impute: Option<String>,

    /// Categorical imputation strategy
    #[arg(long)]
    cat_impute: Option<String>,

    /// Fill value for constant categorical imputation
    #[arg(long)]
    fill_value: Option<String>,

    /// Categorical columns to encode (comma separated)
    #[arg(long, value_delimiter = ',')]
    encode: Option<Vec<String>>,

    /// Encoding method; defaults to one_hot when --encode is given
    #[arg(long)]
    encoding: Option<String>,

    /// Columns to scale (comma separated); one-hot columns are allowed
    #[arg(long, value_delimiter = ',')]
    scale: Option<Vec<String>>,

    /// Scaling method; defaults to standardize when --scale is given
    #[arg(long)]
    scaling: Option<String>,

    /// Write the processed dataset and fitted transformers as JSON
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Reuse the transformers of an artifact instead of fitting new ones
    #[arg(long, conflicts_with_all = [
        "config", "numerical", "categorical", "num_impute", "cat_impute",
        "fill_value", "encode", "encoding", "scale", "scaling",
    ])]
    apply: Option<PathBuf>,

    /// Preview column roles and planned steps without processing
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the JSON report to stdout instead of a human-readable summary
    ///
    /// Disables all progress logs. Errors are printed as {code, message}.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    match run_cli(&args) {
        Err(e) if args.json => {
            let payload = match e.downcast_ref::<PrepError>() {
                Some(prep) => serde_json::to_string_pretty(prep)?,
                None => serde_json::json!({ "code": "CLI_ERROR", "message": e.to_string() })
                    .to_string(),
            };
            println!("{}", payload);
            std::process::exit(1);
        }
        result => result,
    }
}

fn run_cli(args: &Args) -> Result<()> {
    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    info!("Loading dataset from: {}", args.input.display());
    let data = load_csv(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let start = Instant::now();
    let output = match &args.apply {
        Some(artifact_path) => {
            if args.dry_run {
                return Err(anyhow!("--dry-run cannot be combined with --apply"));
            }
            apply_artifact(artifact_path, &data)?
        }
        None => {
            let config = build_config(args)?;
            if args.dry_run {
                return run_dry_run(args, &data, &config);
            }
            run_pipeline(config, args, &data)?
        }
    };
    let elapsed = start.elapsed();

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    write_csv(&output.data, &output_path)?;

    if let Some(artifact_path) = &args.artifact {
        PreprocessingArtifact::new(&output)?.write(artifact_path)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    } else {
        print_summary(&output, &output_path, args.artifact.as_deref(), elapsed.as_secs_f64());
    }

    Ok(())
}

/// Merge the config file (if any) with flag overrides.
///
/// Strategy flags are parsed here rather than by clap so an unknown name is
/// reported as an unsupported strategy with the accepted values.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(cols) = &args.numerical {
        config.roles.numerical = Some(cols.clone());
    }
    if let Some(cols) = &args.categorical {
        config.roles.categorical = Some(cols.clone());
    }
    if let Some(name) = &args.num_impute {
        config.imputation.numerical = name.parse::<NumericImputation>()?;
    }
    if let Some(name) = &args.cat_impute {
        config.imputation.categorical = name.parse::<CategoricalImputation>()?;
    }
    if let Some(value) = &args.fill_value {
        config.imputation.fill_value = value.clone();
    }

    if let Some(cols) = &args.encode {
        config.encoding.columns = cols.clone();
        if config.encoding.method == EncodingMethod::None {
            config.encoding.method = EncodingMethod::OneHot;
        }
    }
    if let Some(name) = &args.encoding {
        config.encoding.method = name.parse::<EncodingMethod>()?;
    }

    if let Some(cols) = &args.scale {
        config.scaling.columns = cols.clone();
        if config.scaling.method == ScalingMethod::None {
            config.scaling.method = ScalingMethod::Standardize;
        }
    }
    if let Some(name) = &args.scaling {
        config.scaling.method = name.parse::<ScalingMethod>()?;
    }

    config.validate()?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn run_pipeline(config: PipelineConfig, args: &Args, data: &DataFrame) -> Result<PipelineOutput> {
    let quiet = args.quiet || args.json;
    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(move |update| {
            if !quiet {
                debug!(
                    "[{:>3.0}%] {}: {}",
                    update.progress * 100.0,
                    update.stage.label(),
                    update.message
                );
            }
        })
        .build()?;

    Ok(pipeline.run(data)?)
}

fn apply_artifact(path: &Path, data: &DataFrame) -> Result<PipelineOutput> {
    info!("Applying fitted transformers from: {}", path.display());
    let artifact = PreprocessingArtifact::read(path)?;
    let (transformed, report) = artifact.transformers.transform_with_report(data)?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    Ok(PipelineOutput {
        data: transformed,
        transformers: artifact.transformers,
        report,
    })
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    input.with_file_name(format!("{}_processed.csv", stem))
}

/// Run dry-run mode - show what would happen without processing
///
/// Uses `println!` intentionally: this output is the purpose of --dry-run and
/// should be visible regardless of log level.
fn run_dry_run(args: &Args, data: &DataFrame, config: &PipelineConfig) -> Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of preprocessing steps");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input.display());
    println!("  Rows: {}", data.height());
    println!("  Columns: {}", data.width());
    println!();

    println!("COLUMN PROFILES");
    println!("{}", "-".repeat(40));

    let profile = DataProfiler::profile_dataset(data)?;
    let roles = config.roles.resolve(data);

    println!(
        "{:<20} {:<10} {:<12} {:<10} {:<8} {}",
        "Column", "Type", "Role", "Missing %", "Unique", "Samples"
    );
    println!("{}", "-".repeat(80));

    for col in &profile.column_profiles {
        let role = roles.role_of(&col.name);
        println!(
            "{:<20} {:<10} {:<12} {:<10.1} {:<8} {}",
            truncate_str(&col.name, 19),
            truncate_str(&col.dtype, 9),
            role.as_str(),
            col.null_percentage,
            col.unique_count,
            truncate_str(&col.sample_values.join(", "), 30)
        );
    }
    println!();

    println!("PREVIEW");
    println!("{}", "-".repeat(40));
    println!("{}", data.head(Some(5)));
    println!();

    println!("PLANNED STEPS");
    println!("{}", "-".repeat(40));
    println!(
        "  1. Impute: numerical={} ({} columns), categorical={} ({} columns)",
        config.imputation.numerical,
        roles.numerical.len(),
        config.imputation.categorical,
        roles.categorical.len()
    );
    if config.imputation.categorical == CategoricalImputation::Constant {
        println!("     fill value: '{}'", config.imputation.fill_value);
    }
    println!(
        "  2. Encode: {} [{}]",
        config.encoding.method,
        config.encoding.columns.join(", ")
    );
    println!(
        "  3. Scale:  {} [{}]",
        config.scaling.method,
        config.scaling.columns.join(", ")
    );

    let passthrough: Vec<&str> = profile
        .column_profiles
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| roles.role_of(name) == ColumnRole::Passthrough)
        .collect();
    if !passthrough.is_empty() {
        println!("\n  Passed through unchanged: {}", passthrough.join(", "));
    }

    println!("\n{}", "=".repeat(80));
    println!("Run without --dry-run to process the dataset");
    println!("{}", "=".repeat(80));

    Ok(())
}

fn print_summary(output: &PipelineOutput, output_path: &Path, artifact: Option<&Path>, secs: f64) {
    let report = &output.report;

    println!("\n{}", "=".repeat(80));
    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!(
        "  Shape: {} rows x {} -> {} columns ({:.2}s)",
        report.rows, report.columns_before, report.columns_after, secs
    );
    println!("  Columns: {}", report.column_order.join(", "));
    println!();

    if report.actions.is_empty() && report.warnings.is_empty() {
        println!("  No changes were needed.");
    }
    for line in report.messages() {
        println!("  {}", line);
    }

    println!();
    println!("  Output: {}", output_path.display());
    if let Some(path) = artifact {
        println!("  Artifact: {}", path.display());
    }
    println!("{}", "=".repeat(80));
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
