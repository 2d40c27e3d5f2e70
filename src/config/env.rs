//! Environment variable handling and .env file management

use crate::defaults;
use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists; already set variables win
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        format!(
            r#"# Inference Latency Benchmark Configuration
#
# Values here are used when the matching command-line option is not given.

# Run on the GPU when set to 1
# {gpu}=0

# Number of measured runs per model
# BENCH_NUM_RUNS={runs}

# Iterations run before measuring starts
# BENCH_WARM_UP={warm_up}

# Images per batch in batch mode
# BENCH_BATCH_SIZE={batch}

# Enable colored output (true/false)
# ENABLE_COLOR=true

# Long measurement of a batched model:
# BENCH_NUM_RUNS=1000
# BENCH_WARM_UP=20
# BENCH_BATCH_SIZE=16
"#,
            gpu = defaults::GPU_ENV_VAR,
            runs = defaults::DEFAULT_NUM_RUNS,
            warm_up = defaults::DEFAULT_WARM_UP,
            batch = defaults::DEFAULT_BATCH_SIZE,
        )
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            defaults::GPU_ENV_VAR => {
                value
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "BENCH_NUM_RUNS" => {
                Self::validate_range(key, value, 1, defaults::MAX_NUM_RUNS)?;
            }
            "BENCH_WARM_UP" => {
                Self::validate_range(key, value, 0, defaults::MAX_WARM_UP)?;
            }
            "BENCH_BATCH_SIZE" => {
                Self::validate_range(key, value, 1, defaults::MAX_BATCH_SIZE)?;
            }
            "ENABLE_COLOR" => {
                value
                    .trim()
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    fn validate_range(key: &str, value: &str, min: u32, max: u32) -> Result<()> {
        let parsed: u32 = value
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if parsed < min || parsed > max {
            return Err(AppError::config(format!(
                "{} must be between {} and {}, got: {}",
                key, min, max, parsed
            )));
        }
        Ok(())
    }

    /// Supported environment variables with descriptions and examples
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            (defaults::GPU_ENV_VAR, "Run on the GPU when set to 1", "1"),
            ("BENCH_NUM_RUNS", "Number of measured runs", "100"),
            ("BENCH_WARM_UP", "Iterations run before measuring starts", "5"),
            ("BENCH_BATCH_SIZE", "Images per batch in batch mode", "8"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<18} {}\n", var, description));
            help.push_str(&format!("  {:<18} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Warnings for currently set variables that would fail to parse
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value)
                    .err()
                    .map(|e| format!("Warning: {}", e))
            })
            .collect()
    }
}
