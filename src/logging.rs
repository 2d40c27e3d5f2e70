//! Structured logging for benchmark runs
//!
//! Log lines always go to stderr; stdout carries only the benchmark report
//! so it can be piped into the scripts that parse latency lines.
//!
//! - Leveled, structured entries with free-form fields
//! - Console, JSON and compact renderings
//! - Correlation IDs per benchmarked model
//! - Per-sample and per-model performance logging

use crate::error::{AppError, Result};
use crate::models::{LatencyStatistics, RunConfig, TimingSample, VariantReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Per-sample detail
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    /// A run or batch failed but the benchmark continues
    Error = 4,
    /// The benchmark cannot continue
    Fatal = 5,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Fatal => "\x1b[35m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Ties together entries of one benchmarked model
    pub correlation_id: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub thread_id: Option<String>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per line
    Json,
    /// Compact single-line format
    Compact,
}

#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
}

/// Logger writing structured entries to stderr
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger whose verbosity follows the run configuration.
    ///
    /// Quiet by default (warnings and up), `--verbose` adds info, `--debug`
    /// adds debug entries as JSON with source locations.
    pub fn with_config(name: String, config: &RunConfig) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_session_id(&self, session_id: String) {
        if let Ok(mut context) = self.context.write() {
            context.session_id = Some(session_id);
        }
    }

    /// Start a correlated operation and return its correlation ID
    pub fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        self.info(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log();
        correlation_id
    }

    pub fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.info(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log();
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn fatal(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Fatal, message)
    }

    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        if let Ok(context) = self.context.read() {
            if let Some(session_id) = &context.session_id {
                entry
                    .fields
                    .insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
            }
        }

        let output = self.format_entry(&entry);
        let _ = writeln!(io::stderr().lock(), "{}", output);
    }

    pub(crate) fn format_entry(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
            LogFormat::Compact => self.format_compact(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let fields_str: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => serde_json::json!({
                "error": "Failed to serialize log entry",
                "message": entry.message,
            })
            .to_string(),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!(
            "{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder for one log entry
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: BTreeMap::new(),
                thread_id: std::thread::current().name().map(String::from),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Attach the fields of one timing sample
    pub fn sample(self, sample: &TimingSample) -> Self {
        self.field("run_index", sample.run_index)
            .field("duration_ms", sample.duration_ms())
            .field("warm_up", sample.warm_up)
            .field("kind", sample.label.kind)
            .field("variant", sample.label.variant)
    }

    pub fn statistics(self, stats: &LatencyStatistics) -> Self {
        self.field("count", stats.count)
            .field("average_ms", stats.average_ms)
            .field("p50_ms", stats.p50_ms)
            .field("p90_ms", stats.p90_ms)
            .field("p99_ms", stats.p99_ms)
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Entry as it would be written, without writing it
    pub fn build(self) -> LogEntry {
        self.entry
    }

    pub fn log(self) {
        self.logger.write_entry(self.entry);
    }
}

/// Times named phases of a benchmark and logs samples and summaries
pub struct PerformanceLogger {
    logger: Logger,
    start_times: BTreeMap<String, Instant>,
}

impl PerformanceLogger {
    pub fn new(config: &RunConfig) -> Self {
        Self::from_logger(Logger::with_config("PERF".to_string(), config))
    }

    pub fn from_logger(logger: Logger) -> Self {
        Self {
            logger,
            start_times: BTreeMap::new(),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn start_timing(&mut self, operation: &str) {
        self.start_times.insert(operation.to_string(), Instant::now());

        self.logger
            .debug(&format!("Started timing: {}", operation))
            .field("operation", operation)
            .log();
    }

    /// Stop timing `operation`; `None` if it was never started
    pub fn end_timing(&mut self, operation: &str) -> Option<Duration> {
        match self.start_times.remove(operation) {
            Some(start) => {
                let duration = start.elapsed();

                self.logger
                    .debug(&format!(
                        "Completed timing: {} in {:.3}ms",
                        operation,
                        duration.as_secs_f64() * 1000.0
                    ))
                    .field("operation", operation)
                    .field("duration_ms", duration.as_secs_f64() * 1000.0)
                    .log();
                Some(duration)
            }
            None => {
                self.logger
                    .warn(&format!("Attempted to end timing for unknown operation: {}", operation))
                    .field("operation", operation)
                    .log();
                None
            }
        }
    }

    pub fn log_sample(&self, sample: &TimingSample, correlation_id: &str) {
        let phase = if sample.warm_up { "warm-up" } else { "measured" };
        self.logger
            .trace(&format!(
                "{} run {} ({}) took {:.3}ms",
                sample.label.variant,
                sample.run_index,
                phase,
                sample.duration_ms()
            ))
            .correlation_id(correlation_id)
            .sample(sample)
            .log();
    }

    pub fn log_variant_summary(&self, report: &VariantReport, correlation_id: &str) {
        let mut builder = match &report.statistics {
            Some(stats) => self
                .logger
                .info(&format!(
                    "{} {} finished: {} samples, average {:.2}ms",
                    report.variant,
                    report.metrics_prefix(),
                    stats.count,
                    stats.average_ms
                ))
                .statistics(stats),
            None => self.logger.warn(&format!(
                "{} {} finished without retained samples",
                report.variant,
                report.metrics_prefix()
            )),
        };
        builder = builder
            .correlation_id(correlation_id)
            .field("model_path_prefix", &report.model_path_prefix)
            .field("preprocess", report.preprocess)
            .field("timed_region", report.timed_region)
            .field("failed_runs", report.failed_runs);
        if let Some(per_image) = report.per_image_average_ms() {
            builder = builder.field("per_image_average_ms", per_image);
        }
        builder.log();
    }
}

/// Hands out loggers that share one session ID
pub struct LoggerFactory {
    config: RunConfig,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone());
        logger
    }

    pub fn create_performance_logger(&self) -> PerformanceLogger {
        PerformanceLogger::from_logger(self.create_logger("PERF"))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Log through a [`Logger`] with the call site attached
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
    };
}
