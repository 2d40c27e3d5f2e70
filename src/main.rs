//! Inference Latency Benchmark - Main CLI Application
//!
//! Measures forward-pass latency of image classification models and prints
//! p99/p90/p50/average lines plus the predicted class.

use clap::Parser;
use inference_latency_bench::{
    cli::Cli,
    config::{display_config_summary, load_config, EnvManager},
    error::{AppError, Result},
    executor::BenchmarkRunner,
    models::RunConfig,
    output::OutputFormatterFactory,
    BUILD_TIME, GIT_COMMIT, PKG_NAME, TARGET_TRIPLE, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        eprintln!("Please report this issue with the command line that triggered it");
        process::exit(99);
    }));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(message) = cli.validate() {
        eprintln!("error: {}", message);
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(1);
    }

    let use_color = cli.use_colors();
    if let Err(e) = run_application(cli).await {
        eprintln!("{}", e.format_for_console(use_color));
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        eprintln!("{} v{} ({}, {}, built {})", PKG_NAME, VERSION, GIT_COMMIT, TARGET_TRIPLE, BUILD_TIME);
        eprintln!("Debug mode enabled");
        for warning in EnvManager::validate_current_env() {
            eprintln!("{}", warning);
        }
        eprintln!();
    }

    let config = load_config(cli)?;

    if config.debug {
        eprintln!("Configuration loaded successfully:");
        for line in display_config_summary(&config).lines() {
            eprintln!("  {}", line);
        }
        eprintln!();
    }

    let report = run_benchmark(config.clone()).await?;

    let formatter = OutputFormatterFactory::for_config(&config);
    print!("{}", formatter.format_report(&report)?);

    Ok(())
}

/// Run the synchronous benchmark off the async runtime so no run overlaps another
async fn run_benchmark(config: RunConfig) -> Result<inference_latency_bench::BenchmarkReport> {
    tokio::task::spawn_blocking(move || BenchmarkRunner::new(config).run())
        .await
        .map_err(|e| AppError::internal(format!("Benchmark task failed: {}", e)))?
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format");
            eprintln!("  - BENCH_NUM_RUNS and BENCH_BATCH_SIZE must be positive integers");
            eprintln!("  - Use batched-resize-normalize for batch sizes above 1");
        }
        AppError::Model(_) => {
            eprintln!();
            eprintln!("Model loading help:");
            eprintln!("  - --model-path-prefix may name a .onnx file, a path without .onnx, or a directory with model.onnx");
            eprintln!("  - Check that the file is a valid ONNX graph");
        }
        AppError::Inference(_) => {
            eprintln!();
            eprintln!("Inference troubleshooting:");
            eprintln!("  - Match --input-height/--input-width and --layout to the model's input");
            eprintln!("  - End-to-end models take raw u8 NHWC pixels");
        }
        AppError::Io(_) => {
            eprintln!();
            eprintln!("Input help:");
            eprintln!("  - Check that --input-image or --input-dir exists and is readable");
        }
        _ => {}
    }
}
