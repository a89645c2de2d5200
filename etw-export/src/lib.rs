//! ETW Trace Export Library
//!
//! Bridges an in-process trace-event pipeline to an external OS-level tracing
//! consumer (an ETW-style provider runtime).
//!
//! # Architecture
//!
//! - The tracing controller enables categories by setting a 64-bit keyword;
//!   the [`CategoryRegistry`] turns that keyword into per-category states
//! - The trace system asks [`TraceExporter::is_category_group_enabled`] before
//!   recording and hands every event to [`TraceExporter::add_event`]
//! - Events are formatted (phase label, up to two JSON-ish arguments) and
//!   written to a [`TraceSink`]
//!
//! With no consumer attached, every entry point returns after two atomic
//! loads.
//!
//! The library does NOT:
//! - Decide what gets traced in general
//! - Own a process-wide instance
//! - Talk to the Windows provider API directly (implement [`TraceSink`])
//!
//! # Example Usage
//!
//! ```
//! use etw_export::{phase, ExportConfig, MemorySink, TraceArg, TraceExporter};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let exporter = TraceExporter::register(sink.clone(), ExportConfig::new()).unwrap();
//!
//! // The controller starts a session exporting "benchmark" and "cc"
//! sink.enable(0x8000000000000009);
//!
//! if exporter.is_category_group_enabled("benchmark") {
//!     let args = [TraceArg::new("frame", 12u64)];
//!     exporter.add_event(phase::BEGIN, 0, "DrawFrame", 0, &args);
//! }
//!
//! let records = sink.records();
//! assert_eq!(records[0].phase, "Begin");
//! assert_eq!(records[0].arg_value_0, "12");
//! ```

// Public modules
pub mod categories;
pub mod config;
pub mod exporter;
pub mod format;
pub mod lifecycle;
pub mod sink;
pub mod types;

// Re-export main types for convenience
pub use categories::{format_keyword, parse_keyword, CategoryRegistry, KeywordChange};
pub use config::ExportConfig;
pub use exporter::{CategoryObserver, TraceExporter};
pub use lifecycle::Lifecycle;
pub use sink::{EnableCallback, MemorySink, ProviderHandle, ProviderSlot, TraceSink};
pub use types::{
    phase, ArgKind, ArgValue, ConvertableToJson, EventRecord, ExportError, Keyword,
    OwnedEventRecord, Result, TraceArg, EVENT_FIELD_COUNT,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_library_basics() {
        // Smoke test: a fresh exporter is registered but inactive
        let sink = Arc::new(MemorySink::new());
        let exporter = TraceExporter::register(sink, ExportConfig::new()).unwrap();
        assert_eq!(exporter.lifecycle(), Lifecycle::Registered);
        assert!(!exporter.is_active());
    }
}
