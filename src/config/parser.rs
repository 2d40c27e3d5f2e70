//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::RunConfig,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<RunConfig> {
        let mut config = RunConfig::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut RunConfig) {
        let cli = &self.cli;

        if let Some(prefix) = &cli.model_path_prefix {
            config.model_path_prefix = prefix.clone();
        }
        if let Some(prefix) = &cli.e2e_model_path_prefix {
            config.e2e_model_path_prefix = Some(prefix.clone());
        }
        if let Some(image) = &cli.input_image {
            config.input_image = image.clone();
        }
        if let Some(dir) = &cli.input_dir {
            config.input_dir = dir.clone();
        }

        if let Some(num_runs) = cli.num_runs {
            config.num_runs = num_runs;
        }
        if let Some(batch_size) = cli.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(warm_up) = cli.warm_up {
            config.warm_up = warm_up;
        }
        if let Some(use_gpu) = cli.use_gpu {
            config.use_gpu = use_gpu;
        }
        match cli.use_batch {
            Some(use_batch) => config.use_batch = use_batch,
            // A directory on its own selects batch mode
            None if cli.input_dir.is_some() && cli.input_image.is_none() => config.use_batch = true,
            None => {}
        }

        if cli.preprocess.is_some() {
            config.preprocess = cli.preprocess;
        }
        if let Some(trim) = cli.trim {
            config.trim = trim;
        }
        if let Some(region) = cli.timed_region {
            config.timed_region = region;
        }
        if let Some(layout) = cli.layout {
            config.layout = layout;
        }
        if let Some(order) = cli.channel_order {
            config.channel_order = order;
        }
        if let Some(filter) = cli.resize {
            config.resize_filter = filter;
        }
        if let Some(height) = cli.input_height {
            config.input_height = height;
        }
        if let Some(width) = cli.input_width {
            config.input_width = width;
        }
        if let Some(top_k) = cli.top_k {
            config.top_k = top_k;
        }

        if cli.no_color || cli.json {
            config.enable_color = false;
        } else if cli.color {
            config.enable_color = true;
        }

        // CLI-only flags
        config.json = cli.json;
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!(
                "Final config: num_runs={}, warm_up={}, batch_size={}, use_gpu={}, use_batch={}",
                config.num_runs, config.warm_up, config.batch_size, config.use_gpu, config.use_batch
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<RunConfig> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &RunConfig) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Model: {}", config.model_path_prefix));
    if let Some(e2e) = &config.e2e_model_path_prefix {
        summary.push(format!("E2E Model: {}", e2e));
    }
    if config.use_batch {
        summary.push(format!("Input Directory: {}", config.input_dir));
        summary.push(format!("Batch Size: {}", config.batch_size));
    } else {
        summary.push(format!("Input Image: {}", config.input_image));
    }
    summary.push(format!("Runs: {} (+{} warm-up)", config.num_runs, config.warm_up));
    summary.push(format!("Device: {}", config.device()));
    summary.push(format!("Trim: {}", config.trim));
    summary.push(format!("Timed Region: {}", config.timed_region));
    summary.push(format!(
        "Input: {}x{} {} {:?}",
        config.input_height, config.input_width, config.layout, config.channel_order
    ));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
