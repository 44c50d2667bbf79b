//! Process-wide tracing setup shared by the school backend binaries.

/// Initialize process-wide observability.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filters, output format).
pub mod tracing;
