//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging and loads configuration
//! - parses CLI arguments
//! - runs fits, comparisons and batches
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{BatchArgs, Cli, Command, CompareArgs, FitArgs, SynthArgs, TableArgs};
use crate::config::HarnessConfig;
use crate::data::{SyntheticSpec, synthesize};
use crate::error::AppError;
use crate::io::{ReportBody, ReportEnvelope, write_dataset_csv, write_report_json};
use crate::models::ModelRegistry;
use crate::report::{
    ComparisonRecord, FitRecord, format_batch, format_comparisons, format_fit, format_models, format_residuals,
    largest_pulls,
};

pub mod pipeline;

use pipeline::InputSource;

/// Points listed under "Largest pulls" when the full residual table is not requested.
const TOP_PULLS: usize = 5;

/// Entry point for the `astrofit` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = HarnessConfig::load(cli.config.as_deref())?;
    if let Some(max_iters) = cli.max_iters {
        config.fitter.max_iters = max_iters;
    }
    if let Some(ms) = cli.time_budget_ms {
        config.fitter.time_budget_ms = Some(ms);
    }

    match cli.command {
        Command::Models => {
            print!("{}", format_models(&ModelRegistry::builtin(&config.constants)));
            Ok(())
        }
        Command::Fit(args) => handle_fit(&config, args),
        Command::Compare(args) => handle_compare(&config, args),
        Command::Batch(args) => handle_batch(&config, args),
        Command::Synth(args) => handle_synth(&config, args),
    }
}

/// Log to stderr; `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn source(path: std::path::PathBuf, table: &TableArgs) -> InputSource {
    InputSource {
        path,
        format: table.table_format(),
        columns: table.column_spec(),
    }
}

fn handle_fit(config: &HarnessConfig, args: FitArgs) -> Result<(), AppError> {
    let input = source(args.input, &args.table);
    let run = pipeline::run_fit(config, &input, args.model)?;

    if !run.ingest.row_errors.is_empty() {
        eprintln!(
            "note: skipped {} of {} row(s)",
            run.ingest.row_errors.len(),
            run.ingest.rows_read
        );
    }
    println!("{}", format_fit(&run.fit, Some(&run.ingest.stats)));
    if args.residuals {
        println!("{}", format_residuals(&run.residuals));
    } else {
        println!("Largest pulls:");
        println!("{}", format_residuals(&largest_pulls(&run.residuals, TOP_PULLS)));
    }

    if let Some(path) = &args.json {
        let envelope = ReportEnvelope::new(
            &config.fitter,
            ReportBody::Fit {
                dataset: input.name(),
                fit: FitRecord::from(&run.fit),
                residuals: run.residuals,
            },
        );
        write_report_json(path, &envelope)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn handle_compare(config: &HarnessConfig, args: CompareArgs) -> Result<(), AppError> {
    let input = source(args.input, &args.table);
    let run = pipeline::run_compare(config, &input, args.baseline, &args.candidates)?;

    println!("{}", format_comparisons(&run.comparisons));

    if let Some(path) = &args.json {
        let envelope = ReportEnvelope::new(
            &config.fitter,
            ReportBody::Comparison {
                dataset: input.name(),
                comparisons: run.comparisons.iter().map(ComparisonRecord::from).collect(),
            },
        );
        write_report_json(path, &envelope)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn handle_batch(config: &HarnessConfig, args: BatchArgs) -> Result<(), AppError> {
    let sources: Vec<InputSource> = args.inputs.into_iter().map(|p| source(p, &args.table)).collect();
    let entries = pipeline::run_batch(config, &sources, args.model, &args.candidates);

    println!("{}", format_batch(&entries));

    if let Some(path) = &args.json {
        let envelope = ReportEnvelope::new(&config.fitter, ReportBody::Batch { entries });
        write_report_json(path, &envelope)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn handle_synth(config: &HarnessConfig, args: SynthArgs) -> Result<(), AppError> {
    let model = args.model.build(&config.constants);
    let spec = SyntheticSpec {
        x_min: args.x_min,
        x_max: args.x_max,
        n: args.points,
        noise_sigma: args.noise,
        relative_noise: args.relative_noise,
        seed: args.seed,
    };
    let dataset = synthesize(model.as_ref(), &args.params, &spec)?;
    write_dataset_csv(&args.out, &dataset)?;
    println!("wrote {} point(s) to {}", dataset.len(), args.out.display());
    Ok(())
}
