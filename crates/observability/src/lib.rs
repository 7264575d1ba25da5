//! Process-wide tracing setup shared by the binaries.

/// Initialize structured logging with the `info` default.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    if tracing::init_with_default(tracing::DEFAULT_DIRECTIVE) {
        ::tracing::debug!("tracing initialized");
    }
}

/// Tracing configuration (filters, formatting).
pub mod tracing;
