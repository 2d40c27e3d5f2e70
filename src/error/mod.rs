//! Error handling for the inference latency benchmark

use thiserror::Error;

/// Custom error types for the inference latency benchmark
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (numbers, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Image decoding or preprocessing errors
    #[error("Image error: {0}")]
    Image(String),

    /// Model loading errors
    #[error("Model error: {0}")]
    Model(String),

    /// Errors raised while running a forward pass
    #[error("Inference error: {0}")]
    Inference(String),

    /// Synset lookup errors
    #[error("Label error: {0}")]
    Label(String),

    /// Statistics calculation errors
    #[error("Statistics error: {0}")]
    Statistics(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new image error
    pub fn image<S: Into<String>>(message: S) -> Self {
        Self::Image(message.into())
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(message: S) -> Self {
        Self::Model(message.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(message: S) -> Self {
        Self::Inference(message.into())
    }

    /// Create a new label error
    pub fn label<S: Into<String>>(message: S) -> Self {
        Self::Label(message.into())
    }

    /// Create a new statistics error
    pub fn statistics<S: Into<String>>(message: S) -> Self {
        Self::Statistics(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Image(_) => "IMAGE",
            Self::Model(_) => "MODEL",
            Self::Inference(_) => "INFERENCE",
            Self::Label(_) => "LABEL",
            Self::Statistics(_) => "STATS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the benchmark loop may skip the failed run and keep going.
    ///
    /// Missing inputs and label lookups only cost one sample; a model that
    /// cannot be loaded or executed ends the benchmark.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) | Self::Image(_) | Self::Label(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Model(_) | Self::Inference(_) | Self::Statistics(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check run counts, batch size and input dimensions.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check that the path exists and is readable.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data or configuration values.", msg)
            }
            Self::Image(msg) => {
                format!("Image could not be used: {}\n\nSuggestion: Check that the file is a decodable image (JPEG, PNG, ...).", msg)
            }
            Self::Model(msg) => {
                format!("Model could not be loaded: {}\n\nSuggestion: Point --model-path-prefix at an ONNX file, '<prefix>.onnx' or a directory containing model.onnx.", msg)
            }
            Self::Inference(msg) => {
                format!("Forward pass failed: {}\n\nSuggestion: Check that the preprocessing strategy produces the input shape and type the model expects.", msg)
            }
            Self::Label(msg) => {
                format!("Class label lookup failed: {}\n\nSuggestion: Place a synset.txt with one label per line next to the model.", msg)
            }
            Self::Statistics(msg) => {
                format!("Statistics calculation failed: {}\n\nSuggestion: This usually means every run failed or no runs were retained after warm-up.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,  // Invalid configuration/usage
            Self::Model(_) => 2,
            Self::Inference(_) => 3,
            Self::Io(_) | Self::Image(_) | Self::Label(_) => 5,
            Self::Statistics(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Model(_) | Self::Inference(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) | Self::Image(_) | Self::Label(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Statistics(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(e) => Self::io(e.to_string()),
            other => Self::image(other.to_string()),
        }
    }
}

impl From<ndarray::ShapeError> for AppError {
    fn from(error: ndarray::ShapeError) -> Self {
        Self::image(format!("Tensor shape error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

// tract reports failures as anyhow errors
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(format!("{:#}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error, keeping its category
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context = f();
            match e.into() {
                AppError::Config(msg) => AppError::Config(format!("{}: {}", context, msg)),
                AppError::Validation(msg) => AppError::Validation(format!("{}: {}", context, msg)),
                AppError::Io(msg) => AppError::Io(format!("{}: {}", context, msg)),
                AppError::Parse(msg) => AppError::Parse(format!("{}: {}", context, msg)),
                AppError::Image(msg) => AppError::Image(format!("{}: {}", context, msg)),
                AppError::Model(msg) => AppError::Model(format!("{}: {}", context, msg)),
                AppError::Inference(msg) => AppError::Inference(format!("{}: {}", context, msg)),
                AppError::Label(msg) => AppError::Label(format!("{}: {}", context, msg)),
                AppError::Statistics(msg) => AppError::Statistics(format!("{}: {}", context, msg)),
                AppError::Internal(msg) => AppError::Internal(format!("{}: {}", context, msg)),
            }
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for per-run failures that do not abort the benchmark
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let image_error = AppError::image("Corrupt JPEG");
        assert_eq!(image_error.category(), "IMAGE");
        assert!(image_error.is_recoverable());
        assert_eq!(image_error.exit_code(), 5);
    }

    #[test]
    fn test_error_display() {
        let error = AppError::model("missing resnet18_v1.onnx");
        let display = error.to_string();
        assert!(display.contains("Model error"));
        assert!(display.contains("resnet18_v1.onnx"));
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::validation("validation"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::image("image"),
            AppError::model("model"),
            AppError::inference("inference"),
            AppError::label("label"),
            AppError::statistics("stats"),
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "CONFIG", "VALIDATION", "IO", "PARSE", "IMAGE",
            "MODEL", "INFERENCE", "LABEL", "STATS", "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(AppError::io("test").is_recoverable());
        assert!(AppError::image("test").is_recoverable());
        assert!(AppError::label("test").is_recoverable());

        assert!(!AppError::model("test").is_recoverable());
        assert!(!AppError::inference("test").is_recoverable());
        assert!(!AppError::config("test").is_recoverable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::model("test").exit_code(), 2);
        assert_eq!(AppError::inference("test").exit_code(), 3);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::statistics("test").exit_code(), 6);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "not_a_number".parse::<i32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_error: AppError = json_error.into();
        assert!(app_error.to_string().contains("JSON parse error"));
    }

    #[test]
    fn test_anyhow_conversion_keeps_chain() {
        let inner = anyhow::anyhow!("shape mismatch").context("running plan");
        let app_error: AppError = inner.into();
        assert_eq!(app_error.category(), "INTERNAL");
        assert!(app_error.to_string().contains("running plan"));
        assert!(app_error.to_string().contains("shape mismatch"));
    }

    #[test]
    fn test_error_context_keeps_category() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No such file",
        ));

        let error = result
            .with_context(|| "reading synset.txt".to_string())
            .unwrap_err();
        assert_eq!(error.category(), "IO");
        assert!(error.to_string().contains("reading synset.txt"));
        assert!(error.to_string().contains("No such file"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::label("index 1000 out of range");
        let plain = error.format_for_console(false);
        let colored = error.format_for_console(true);

        assert!(plain.starts_with("[LABEL]"));
        assert!(colored.contains("LABEL"));
        assert!(colored.contains("index 1000 out of range"));
    }
}
