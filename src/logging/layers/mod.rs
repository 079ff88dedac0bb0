pub mod console;
pub mod file;

use tracing_subscriber::Layer;

/// Type-erased layer, so sinks with different formatters share one stack.
pub type BoxLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;
