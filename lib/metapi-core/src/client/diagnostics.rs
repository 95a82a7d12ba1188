use std::fmt::Debug;

use tracing::{info, warn};

use crate::schema::ValidationContext;

/// Receives the non-blocking diagnostics of the pipeline.
///
/// Implementations must not block: they are called from the middle of an
/// invocation.
pub trait Diagnostics: Debug + Send + Sync {
    /// A validation pass produced warnings only.
    fn warn(&self, message: &str, context: &ValidationContext);

    /// Informational message.
    fn info(&self, message: &str);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: &str, context: &ValidationContext) {
        let warnings = context
            .warnings()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        warn!(schema = context.schema(), ?warnings, "{message}");
    }

    fn info(&self, message: &str) {
        info!("{message}");
    }
}
