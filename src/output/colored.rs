//! Colored formatter implementation with terminal color support
//!
//! Emits the same lines as [`PlainFormatter`] with ANSI colors added, so
//! stripping the escapes gives back the plain output.

use super::formatter::{
    comparison_line, fmt_error, statistics_lines, top_class_line, FormattingOptions,
    OutputFormatter,
};
use crate::{
    error::Result,
    models::{BenchmarkReport, VariantReport},
};
use colored::*;
use std::fmt::Write as _;

/// Latency classification for color coding
#[derive(Debug, Clone, PartialEq)]
pub enum LatencyLevel {
    Fast,     // < 10ms
    Moderate, // 10-50ms
    Slow,     // 50-200ms
    VerySlow, // > 200ms
}

impl LatencyLevel {
    /// Determine latency level from a duration in milliseconds
    pub fn from_latency(time_ms: f64) -> Self {
        if time_ms < 10.0 {
            Self::Fast
        } else if time_ms < 50.0 {
            Self::Moderate
        } else if time_ms < 200.0 {
            Self::Slow
        } else {
            Self::VerySlow
        }
    }

    /// Get color for this latency level
    pub fn color(&self) -> Color {
        match self {
            Self::Fast => Color::Green,
            Self::Moderate => Color::Cyan,
            Self::Slow => Color::Yellow,
            Self::VerySlow => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub warning: Color,
    pub highlight: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            warning: Color::Yellow,
            highlight: Color::Magenta,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn latency(&self, text: &str, time_ms: f64) -> ColoredString {
        self.colorize(text, LatencyLevel::from_latency(time_ms).color())
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        if self.options.enable_color {
            Ok(title.color(self.color_scheme.header).bold().to_string())
        } else {
            Ok(title.to_string())
        }
    }

    fn format_variant(&self, report: &VariantReport) -> Result<String> {
        let mut output = String::new();
        let prefix = report.metrics_prefix();

        match &report.statistics {
            Some(stats) => {
                let values = [stats.p99_ms, stats.p90_ms, stats.p50_ms, stats.average_ms];
                for ((name, value), ms) in statistics_lines(prefix, stats).into_iter().zip(values) {
                    writeln!(output, "{} {}", name, self.latency(&value, ms)).map_err(fmt_error)?;
                }
                if let Some(per_image) = report.per_image_average_ms() {
                    let value = format!("{:.2}ms", per_image);
                    writeln!(output, "{}_per_image_average {}", prefix, self.latency(&value, per_image))
                        .map_err(fmt_error)?;
                }
            }
            None => {
                let note = format!("{}: no measured samples ({} failed)", prefix, report.failed_runs);
                writeln!(output, "{}", self.format_warning(&note)?).map_err(fmt_error)?;
            }
        }

        for result in &report.classifications {
            writeln!(
                output,
                "{}",
                self.colorize(&result.report_line(), self.color_scheme.highlight)
            )
            .map_err(fmt_error)?;
        }

        if self.options.verbose_mode {
            for (rank, result) in report.top_classes.iter().enumerate() {
                writeln!(output, "{}", top_class_line(rank, result)).map_err(fmt_error)?;
            }
            if let Some(stats) = &report.statistics {
                let details = format!(
                    "  samples={} min={:.6}ms max={:.6}ms preprocess={} trim={} timed={}",
                    stats.count, stats.min_ms, stats.max_ms, report.preprocess, report.trim, report.timed_region
                );
                writeln!(output, "{}", self.colorize(&details, self.color_scheme.muted))
                    .map_err(fmt_error)?;
            }
        }

        Ok(output)
    }

    fn format_comparison(&self, report: &BenchmarkReport) -> Result<Option<String>> {
        Ok(comparison_line(report).map(|line| {
            if self.options.enable_color {
                line.bold().to_string()
            } else {
                line
            }
        }))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.colorize("Warning:", self.color_scheme.warning),
            warning
        ))
    }

    fn options(&self) -> &FormattingOptions {
        &self.options
    }
}
