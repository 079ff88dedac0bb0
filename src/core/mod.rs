pub mod config;
pub mod dimensions;
pub mod error;
pub mod facts;
pub mod keys;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod snapshots;
pub mod storage;
pub mod types;

pub use config::{ConfigLoader, ConfigValidator, PipelineConfig};
pub use error::{AppError, DefaultErrorReporter, ErrorReporter};
pub use pipeline::{Pipeline, TableStatus};
pub use report::RunReport;
pub use types::*;
