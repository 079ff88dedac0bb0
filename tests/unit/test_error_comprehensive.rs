use transit_star::core::error::{AppError, DefaultErrorReporter, ErrorReporter};
use transit_star::core::storage::StorageError;
use transit_star::core::types::{ErrorCategory, ErrorSeverity};

const ALL_CATEGORIES: [ErrorCategory; 10] = [
    ErrorCategory::ValidationError,
    ErrorCategory::ConfigError,
    ErrorCategory::MissingInput,
    ErrorCategory::SchemaError,
    ErrorCategory::StorageError,
    ErrorCategory::KeyCollision,
    ErrorCategory::SerializationError,
    ErrorCategory::IoError,
    ErrorCategory::InternalError,
    ErrorCategory::Unknown,
];

#[test]
fn test_error_creation_all_categories() {
    for category in ALL_CATEGORIES {
        let error = AppError::new(category, "test message");
        assert_eq!(error.category, category);
        assert_eq!(error.message, "test message");
        assert!(error.code.starts_with("ERR-"));
        assert!(error.context.is_empty());
        assert!(error.recovery_suggestions.is_empty());
        assert!(error.occurred_at <= chrono::Utc::now());
        assert!(error.source.is_none());
    }
}

#[test]
fn test_error_severity_mapping() {
    for category in ALL_CATEGORIES {
        let expected = if category == ErrorCategory::Unknown {
            ErrorSeverity::Info
        } else {
            ErrorSeverity::Error
        };
        assert_eq!(AppError::new(category, "test").severity(), expected);
    }
}

#[test]
fn test_error_add_context() {
    let mut error = AppError::new(ErrorCategory::SchemaError, "fact store columns differ");
    error.add_context("table", "fact_trip");
    error.add_context("stage", "facts");

    assert_eq!(error.context.get("table"), Some(&"fact_trip".to_string()));
    assert_eq!(error.context.get("stage"), Some(&"facts".to_string()));
    assert_eq!(error.context.len(), 2);
}

#[test]
fn test_builder_helpers() {
    let error = AppError::new(ErrorCategory::MissingInput, "no position snapshot")
        .with_code("RUN-005")
        .with_context("normalize ran without tempo_real.csv")
        .with_suggestion("Deliver both extracts before running facts");

    assert_eq!(error.code, "RUN-005");
    assert_eq!(
        error.context.get("context").map(String::as_str),
        Some("normalize ran without tempo_real.csv")
    );
    assert_eq!(error.recovery_suggestions.len(), 1);
}

#[test]
fn test_error_display() {
    let mut error =
        AppError::new(ErrorCategory::KeyCollision, "two codes share a key").with_code("KEY-001");
    error.add_context("dimension", "dim_line");

    let display = error.to_string();
    assert!(display.starts_with("[KEY-001] KeyCollision: two codes share a key"));
    assert!(display.contains("dim_line"));
}

#[test]
fn test_error_display_with_source() {
    let source = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
    let error = AppError::with_source(ErrorCategory::StorageError, "write failed", Box::new(source));

    let display = error.to_string();
    assert!(display.contains("write failed"));
    assert!(display.contains("Caused by: disk full"));
}

#[test]
fn test_error_from_anyhow() {
    let app_error = AppError::from(anyhow::anyhow!("anyhow error message"));
    assert_eq!(app_error.category, ErrorCategory::InternalError);
    assert_eq!(app_error.code, "ANYHOW_ERROR");
    assert_eq!(app_error.message, "anyhow error message");
}

#[test]
fn test_error_from_io_error() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
    let app_error = AppError::from(io_error);

    assert_eq!(app_error.category, ErrorCategory::IoError);
    assert_eq!(app_error.code, "IO_ERROR");
    assert_eq!(
        app_error.recovery_suggestions,
        vec!["Check file permissions and paths".to_string()]
    );
}

#[test]
fn test_storage_errors_map_to_categories() {
    let schema: AppError = StorageError::EmptySchema.into();
    assert_eq!(schema.category, ErrorCategory::SchemaError);
    assert_eq!(schema.code, "STORE-005");

    let unsupported: AppError = StorageError::UnsupportedType {
        column: "payload".to_string(),
        data_type: "Binary".to_string(),
    }
    .into();
    assert_eq!(unsupported.category, ErrorCategory::SchemaError);
    assert!(unsupported.message.contains("payload"));
}

#[test]
fn test_app_error_survives_anyhow_round_trip() {
    let original = AppError::new(ErrorCategory::MissingInput, "dim_date missing").with_code("FACT-001");
    let wrapped = anyhow::Error::from(original);
    let recovered = wrapped.downcast::<AppError>().unwrap();
    assert_eq!(recovered.code, "FACT-001");
}

#[test]
fn test_default_error_reporter() {
    let reporter = DefaultErrorReporter::new();
    let error = AppError::new(ErrorCategory::ValidationError, "test error")
        .with_suggestion("Check transit.toml");

    reporter.report_error(&error);
    reporter.report_warning("test warning", Some("context".to_string()));
    reporter.report_info("test info");
}
