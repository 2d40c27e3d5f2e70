//! Output formatting for benchmark reports
//!
//! Plain and colored formatters print the line format benchmark logs are
//! parsed with; the JSON formatter serializes the whole report.

mod formatter;
mod colored;

pub use formatter::{OutputFormatter, PlainFormatter, FormattingOptions};
pub use colored::{ColoredFormatter, ColorScheme, LatencyLevel};

use crate::{
    error::Result,
    models::{BenchmarkReport, RunConfig, VariantReport},
};

/// Serializes reports with `serde_json`
pub struct JsonFormatter {
    options: FormattingOptions,
}

impl JsonFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        Ok(serde_json::json!({ "section": title }).to_string())
    }

    fn format_variant(&self, report: &VariantReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    fn format_comparison(&self, report: &BenchmarkReport) -> Result<Option<String>> {
        Ok(report.comparison().map(|(e2e, non_e2e)| {
            serde_json::json!({ "e2e_average_ms": e2e, "non_e2e_average_ms": non_e2e }).to_string()
        }))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(serde_json::json!({ "warning": warning }).to_string())
    }

    fn options(&self) -> &FormattingOptions {
        &self.options
    }

    fn format_report(&self, report: &BenchmarkReport) -> Result<String> {
        let mut output = serde_json::to_string_pretty(report)?;
        output.push('\n');
        Ok(output)
    }
}

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool, json: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color: enable_color && !json,
            verbose_mode: verbose,
        };

        if json {
            Box::new(JsonFormatter::new(options))
        } else if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Formatter matching a run configuration
    pub fn for_config(config: &RunConfig) -> Box<dyn OutputFormatter> {
        Self::create_formatter(config.enable_color, config.verbose, config.json)
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LatencyStatistics;
    use crate::types::{Device, ModelVariant, PreprocessKind, RunKind, TrimStrategy};

    fn report() -> BenchmarkReport {
        let mut report = BenchmarkReport::new(Device::Gpu, Device::Cpu);
        let mut variant = VariantReport::new(
            ModelVariant::NonEndToEnd,
            RunKind::Batch,
            "models/resnet18_v1",
            PreprocessKind::BatchedResizeNormalize,
            TrimStrategy::None,
            8,
        );
        variant.statistics = Some(LatencyStatistics {
            count: 2,
            average_ms: 16.0,
            p50_ms: 15.0,
            p90_ms: 17.0,
            p99_ms: 17.0,
            min_ms: 15.0,
            max_ms: 17.0,
        });
        report.variants.push(variant);
        report
    }

    #[test]
    fn test_json_report_round_trips() {
        let formatter = OutputFormatterFactory::create_formatter(true, false, true);
        assert!(!formatter.options().enable_color);

        let output = formatter.format_report(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["requested_device"], "gpu");
        assert_eq!(value["effective_device"], "cpu");
        assert_eq!(value["variants"][0]["kind"], "batch");
        assert_eq!(value["variants"][0]["statistics"]["average_ms"], 16.0);
    }

    #[test]
    fn test_factory_selects_plain_output() {
        let formatter = OutputFormatterFactory::create_plain_formatter();
        let output = formatter.format_report(&report()).unwrap();
        assert!(output.contains("batch_inference_average 16.00ms"));
        assert!(output.contains("batch_inference_per_image_average 2.00ms"));
    }

    #[test]
    fn test_for_config_respects_json_flag() {
        let mut config = RunConfig::default();
        config.json = true;
        let output = OutputFormatterFactory::for_config(&config).format_report(&report()).unwrap();
        assert!(output.trim_start().starts_with('{'));
    }
}
