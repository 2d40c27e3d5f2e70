//! Core formatting trait and the plain text implementation
//!
//! Plain output is the line format downstream log parsers rely on, so every
//! other formatter keeps the same lines and only decorates them.

use crate::{
    error::{AppError, Result},
    models::{BenchmarkReport, ClassificationResult, LatencyStatistics, VariantReport},
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a section header
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format the statistics and classifications of one model
    fn format_variant(&self, report: &VariantReport) -> Result<String>;

    /// Format the end-to-end vs non end-to-end comparison line
    fn format_comparison(&self, report: &BenchmarkReport) -> Result<Option<String>>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    fn options(&self) -> &FormattingOptions;

    /// Format a complete benchmark report
    fn format_report(&self, report: &BenchmarkReport) -> Result<String> {
        let mut output = String::new();
        let comparing = report.variants.len() > 1;

        if self.options().verbose_mode && report.requested_device != report.effective_device {
            output.push_str(&self.format_warning(&format!(
                "requested {} but ran on {}",
                report.requested_device, report.effective_device
            ))?);
            output.push('\n');
        }

        for variant in &report.variants {
            if comparing {
                output.push_str(&self.format_header(variant.variant.header())?);
                output.push('\n');
            }
            output.push_str(&self.format_variant(variant)?);
        }

        if let Some(line) = self.format_comparison(report)? {
            output.push_str(&line);
            output.push('\n');
        }

        Ok(output)
    }
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// List the top classes and per-variant details
    pub verbose_mode: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
        }
    }
}

/// The `<prefix>_p99` .. `<prefix>_average` lines of one statistics block
pub(crate) fn statistics_lines(prefix: &str, stats: &LatencyStatistics) -> Vec<(String, String)> {
    vec![
        (format!("{}_p99", prefix), format!("{:.6}ms", stats.p99_ms)),
        (format!("{}_p90", prefix), format!("{:.6}ms", stats.p90_ms)),
        (format!("{}_p50", prefix), format!("{:.6}ms", stats.p50_ms)),
        (format!("{}_average", prefix), format!("{:.2}ms", stats.average_ms)),
    ]
}

pub(crate) fn comparison_line(report: &BenchmarkReport) -> Option<String> {
    let (e2e, non_e2e) = report.comparison()?;
    let prefix = report.variants.first()?.metrics_prefix();
    Some(format!(
        "E2E {p}_average {:.2} Non E2E {p}_average {:.2}",
        e2e,
        non_e2e,
        p = prefix
    ))
}

pub(crate) fn top_class_line(rank: usize, result: &ClassificationResult) -> String {
    format!("  top-{} [{}] {}", rank + 1, result.index, result.report_line())
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        Ok(title.to_string())
    }

    fn format_variant(&self, report: &VariantReport) -> Result<String> {
        let mut output = String::new();
        let prefix = report.metrics_prefix();

        match &report.statistics {
            Some(stats) => {
                for (name, value) in statistics_lines(prefix, stats) {
                    writeln!(output, "{} {}", name, value).map_err(fmt_error)?;
                }
                if let Some(per_image) = report.per_image_average_ms() {
                    writeln!(output, "{}_per_image_average {:.2}ms", prefix, per_image)
                        .map_err(fmt_error)?;
                }
            }
            None => {
                writeln!(
                    output,
                    "{}",
                    self.format_warning(&format!(
                        "{}: no measured samples ({} failed)",
                        prefix, report.failed_runs
                    ))?
                )
                .map_err(fmt_error)?;
            }
        }

        for result in &report.classifications {
            writeln!(output, "{}", result.report_line()).map_err(fmt_error)?;
        }

        if self.options.verbose_mode {
            for (rank, result) in report.top_classes.iter().enumerate() {
                writeln!(output, "{}", top_class_line(rank, result)).map_err(fmt_error)?;
            }
            if let Some(stats) = &report.statistics {
                writeln!(
                    output,
                    "  samples={} min={:.6}ms max={:.6}ms preprocess={} trim={} timed={}",
                    stats.count, stats.min_ms, stats.max_ms, report.preprocess, report.trim, report.timed_region
                )
                .map_err(fmt_error)?;
            }
        }

        Ok(output)
    }

    fn format_comparison(&self, report: &BenchmarkReport) -> Result<Option<String>> {
        Ok(comparison_line(report))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("Warning: {}", warning))
    }

    fn options(&self) -> &FormattingOptions {
        &self.options
    }
}

pub(crate) fn fmt_error(e: std::fmt::Error) -> AppError {
    AppError::internal(format!("Formatting error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Device, ModelVariant, PreprocessKind, RunKind, TrimStrategy};

    fn stats(average_ms: f64) -> LatencyStatistics {
        LatencyStatistics {
            count: 3,
            average_ms,
            p50_ms: 20.0,
            p90_ms: 30.0,
            p99_ms: 30.0,
            min_ms: 10.0,
            max_ms: 30.0,
        }
    }

    fn variant(variant: ModelVariant, kind: RunKind, average_ms: f64) -> VariantReport {
        let mut report = VariantReport::new(
            variant,
            kind,
            "models/resnet18_v1",
            PreprocessKind::ResizeNormalize,
            TrimStrategy::None,
            if kind == RunKind::Batch { 4 } else { 1 },
        );
        report.statistics = Some(stats(average_ms));
        report.classifications.push(ClassificationResult {
            index: 1,
            label: "n01440764 tench".to_string(),
            probability: 0.75,
        });
        report
    }

    fn plain(verbose: bool) -> PlainFormatter {
        PlainFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: verbose,
        })
    }

    #[test]
    fn test_single_variant_lines() {
        let mut report = BenchmarkReport::new(Device::Cpu, Device::Cpu);
        report.variants.push(variant(ModelVariant::NonEndToEnd, RunKind::Single, 20.0));

        let output = plain(false).format_report(&report).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "single_inference_p99 30.000000ms",
                "single_inference_p90 30.000000ms",
                "single_inference_p50 20.000000ms",
                "single_inference_average 20.00ms",
                "Probability : 0.75 Class : n01440764 tench",
            ]
        );
    }

    #[test]
    fn test_batch_adds_per_image_average() {
        let mut report = BenchmarkReport::new(Device::Cpu, Device::Cpu);
        report.variants.push(variant(ModelVariant::NonEndToEnd, RunKind::Batch, 40.0));

        let output = plain(false).format_report(&report).unwrap();
        assert!(output.contains("batch_inference_average 40.00ms\n"));
        assert!(output.contains("batch_inference_per_image_average 10.00ms\n"));
    }

    #[test]
    fn test_per_image_average_uses_images_processed() {
        let mut report = BenchmarkReport::new(Device::Cpu, Device::Cpu);
        let mut batch = variant(ModelVariant::NonEndToEnd, RunKind::Batch, 40.0);
        // configured for 4 per batch, but the directory only held 2 images
        batch.images_processed = 6;
        batch.batches_processed = 3;
        report.variants.push(batch);

        let output = plain(false).format_report(&report).unwrap();
        assert!(output.contains("batch_inference_per_image_average 20.00ms\n"));
    }

    #[test]
    fn test_comparison_headers_and_line() {
        let mut report = BenchmarkReport::new(Device::Gpu, Device::Cpu);
        report.variants.push(variant(ModelVariant::EndToEnd, RunKind::Single, 9.5));
        report.variants.push(variant(ModelVariant::NonEndToEnd, RunKind::Single, 12.25));

        let output = plain(false).format_report(&report).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "E2E");
        assert_eq!(lines[6], "Non E2E");
        assert_eq!(
            lines.last().copied(),
            Some("E2E single_inference_average 9.50 Non E2E single_inference_average 12.25")
        );
        assert!(!output.contains("Warning"));
    }

    #[test]
    fn test_missing_statistics_note() {
        let mut report = BenchmarkReport::new(Device::Cpu, Device::Cpu);
        let mut empty = variant(ModelVariant::NonEndToEnd, RunKind::Batch, 0.0);
        empty.statistics = None;
        empty.classifications.clear();
        empty.failed_runs = 2;
        report.variants.push(empty);

        let output = plain(false).format_report(&report).unwrap();
        assert_eq!(output, "Warning: batch_inference: no measured samples (2 failed)\n");
    }

    #[test]
    fn test_verbose_lists_top_classes_and_device() {
        let mut report = BenchmarkReport::new(Device::Gpu, Device::Cpu);
        let mut single = variant(ModelVariant::NonEndToEnd, RunKind::Single, 20.0);
        single.top_classes = vec![
            ClassificationResult { index: 1, label: "tench".to_string(), probability: 0.75 },
            ClassificationResult { index: 0, label: "goldfish".to_string(), probability: 0.2 },
        ];
        report.variants.push(single);

        let output = plain(true).format_report(&report).unwrap();
        assert!(output.starts_with("Warning: requested gpu but ran on cpu\n"));
        assert!(output.contains("  top-1 [1] Probability : 0.75 Class : tench\n"));
        assert!(output.contains("  top-2 [0] Probability : 0.2 Class : goldfish\n"));
        assert!(output.contains("samples=3"));
        assert!(output.contains("timed=predict"));
    }
}
