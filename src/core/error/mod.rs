use crate::core::types::{ErrorCategory, ErrorSeverity, Stage};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug)]
pub struct AppError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub code: String,
    pub message: String,
    pub context: HashMap<String, String>,
    pub recovery_suggestions: Vec<String>,
    pub occurred_at: DateTime<Utc>,
    pub source: Option<anyhow::Error>,
}

impl AppError {
    pub fn new<T: Into<String>>(category: ErrorCategory, message: T) -> Self {
        let severity = match category {
            ErrorCategory::ValidationError
            | ErrorCategory::ConfigError
            | ErrorCategory::MissingInput
            | ErrorCategory::SchemaError
            | ErrorCategory::StorageError
            | ErrorCategory::KeyCollision
            | ErrorCategory::SerializationError
            | ErrorCategory::IoError
            | ErrorCategory::InternalError => ErrorSeverity::Error,
            ErrorCategory::Unknown => ErrorSeverity::Info,
        };
        AppError {
            category,
            severity,
            code: format!("ERR-{}", uuid::Uuid::new_v4()),
            message: message.into(),
            context: HashMap::new(),
            recovery_suggestions: vec![],
            occurred_at: Utc::now(),
            source: None,
        }
    }

    pub fn with_source<T: Into<String>>(
        category: ErrorCategory,
        message: T,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        let mut error = AppError::new(category, message);
        error.source = Some(anyhow::anyhow!(source));
        error
    }

    pub fn with_context<T: Into<String>>(mut self, context: T) -> Self {
        self.context.insert("context".to_string(), context.into());
        self
    }

    pub fn with_code<T: Into<String>>(mut self, code: T) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_suggestion<T: Into<String>>(mut self, suggestion: T) -> Self {
        self.recovery_suggestions.push(suggestion.into());
        self
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    pub fn add_context(&mut self, key: &str, value: &str) {
        self.context.insert(key.to_string(), value.to_string());
    }

    /// Tag the stage that failed, unless a deeper layer already did
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.context
            .entry("stage".to_string())
            .or_insert_with(|| stage.to_string());
        self
    }

    pub fn stage(&self) -> Option<&str> {
        self.context.get("stage").map(String::as_str)
    }

    /// Process exit status, so a scheduler can tell bad input from a broken warehouse
    pub fn exit_code(&self) -> u8 {
        match self.category {
            ErrorCategory::ValidationError | ErrorCategory::ConfigError => 2,
            ErrorCategory::MissingInput => 3,
            ErrorCategory::SchemaError => 4,
            ErrorCategory::KeyCollision => 5,
            ErrorCategory::StorageError | ErrorCategory::IoError => 6,
            ErrorCategory::SerializationError
            | ErrorCategory::InternalError
            | ErrorCategory::Unknown => 1,
        }
    }

    fn sorted_context(&self) -> Vec<(&String, &String)> {
        let mut pairs: Vec<_> = self.context.iter().collect();
        pairs.sort();
        pairs
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.category, self.message)?;
        if !self.context.is_empty() {
            write!(f, " (Context: {:?})", self.sorted_context())?;
        }
        if let Some(ref source) = self.source {
            write!(f, "\nCaused by: {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError {
            category: ErrorCategory::InternalError,
            severity: ErrorSeverity::Error,
            code: "ANYHOW_ERROR".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            recovery_suggestions: vec!["Check the error details".to_string()],
            occurred_at: Utc::now(),
            source: Some(e),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError {
            category: ErrorCategory::IoError,
            severity: ErrorSeverity::Error,
            code: "IO_ERROR".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            recovery_suggestions: vec!["Check file permissions and paths".to_string()],
            occurred_at: Utc::now(),
            source: Some(anyhow::anyhow!(e)),
        }
    }
}

pub trait ErrorReporter {
    fn report_error(&self, error: &AppError);
    fn report_warning(&self, message: &str, context: Option<String>);
    fn report_info(&self, message: &str);
}

/// Reporter used by the binary for fatal errors; routine progress goes through `tracing`.
pub struct DefaultErrorReporter;

impl DefaultErrorReporter {
    pub fn new() -> Self {
        DefaultErrorReporter
    }
}

impl Default for DefaultErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter for DefaultErrorReporter {
    fn report_error(&self, error: &AppError) {
        tracing::error!(
            code = %error.code,
            category = %error.category,
            stage = error.stage().unwrap_or("-"),
            "{}",
            error.message
        );
        eprintln!("[ERROR] {} ({}): {}", error.code, error.category, error.message);
        for (key, value) in error.sorted_context() {
            eprintln!("  {}={}", key, value);
        }
        if let Some(ref source) = error.source {
            eprintln!("  Caused by: {}", source);
        }
        for suggestion in &error.recovery_suggestions {
            eprintln!("  Hint: {}", suggestion);
        }
    }

    fn report_warning(&self, message: &str, context: Option<String>) {
        eprintln!("[WARNING] {}", message);
        if let Some(ref ctx) = context {
            eprintln!("  Context: {}", ctx);
        }
    }

    fn report_info(&self, message: &str) {
        println!("[INFO] {}", message);
    }
}
