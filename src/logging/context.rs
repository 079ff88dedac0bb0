use std::env;

/// Execution contexts that influence how logging is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Operator running the CLI from a terminal.
    Interactive,
    /// Run started by an external scheduler; quiet on the console.
    Scheduled,
}

impl ExecutionContext {
    /// Returns `true` when console sinks should be disabled.
    pub fn disables_console(self) -> bool {
        matches!(self, ExecutionContext::Scheduled)
    }
}

/// Derive the active execution context from `TRANSIT_SCHEDULED`.
pub fn detect_context() -> ExecutionContext {
    if scheduled_override_enabled() {
        ExecutionContext::Scheduled
    } else {
        ExecutionContext::Interactive
    }
}

fn scheduled_override_enabled() -> bool {
    env::var("TRANSIT_SCHEDULED")
        .map(|value| value.trim() == "1")
        .unwrap_or(false)
}
