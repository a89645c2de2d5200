//! External sink abstraction
//!
//! The sink is the OS-level provider runtime: it registers the provider,
//! delivers enable/disable notifications through a callback, exposes the
//! controller's current keyword and accepts formatted event writes.

use crate::types::{EventRecord, Keyword, Result};
use std::sync::Arc;

pub mod memory;
pub mod provider;

pub use memory::MemorySink;
pub use provider::ProviderSlot;

/// Callback the sink invokes whenever the controller's enable state or
/// keyword changes
pub type EnableCallback = Arc<dyn Fn() + Send + Sync>;

/// Opaque registration handle returned by a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderHandle(pub u64);

/// The OS tracing provider runtime, as seen by the exporter
///
/// Implementations must serialize their own callback invocations: the
/// exporter relies on never running two enable updates at once. A sink may
/// invoke the callback synchronously from inside [`TraceSink::register`]
/// when a session is already listening.
pub trait TraceSink: Send + Sync {
    /// Register the provider and install the enable callback
    fn register(&self, callback: EnableCallback) -> Result<ProviderHandle>;

    /// Unregister the provider; no callbacks are delivered afterwards
    fn unregister(&self, handle: ProviderHandle) -> Result<()>;

    /// Whether any consumer currently listens to this provider
    fn is_listener_active(&self) -> bool;

    /// The keyword currently requested by the controller
    fn match_any_keyword(&self) -> Keyword;

    /// Write one event; fire-and-forget
    fn write(&self, record: &EventRecord<'_>);
}
