//! In-memory sink
//!
//! Plays the role of the provider runtime and of the tracing controller at
//! once: the controller side is driven through [`MemorySink::enable`] and
//! [`MemorySink::disable`], and every written event is kept for inspection.

use super::provider::lock;
use super::{EnableCallback, ProviderHandle, ProviderSlot, TraceSink};
use crate::types::{EventRecord, ExportError, Keyword, OwnedEventRecord, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// A sink that records events in memory
#[derive(Default)]
pub struct MemorySink {
    provider: ProviderSlot,
    listener_active: AtomicBool,
    keyword: AtomicU64,
    reject_registration: AtomicBool,
    records: Mutex<Vec<OwnedEventRecord>>,
}

impl MemorySink {
    /// Create a sink with no listener attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink whose registrations always fail
    pub fn rejecting() -> Self {
        let sink = Self::default();
        sink.reject_registration.store(true, Ordering::Relaxed);
        sink
    }

    /// Controller side: start (or update) a session with `keyword`
    ///
    /// Delivers the enable callback if a provider is registered.
    pub fn enable(&self, keyword: Keyword) {
        self.keyword.store(keyword, Ordering::Release);
        self.listener_active.store(true, Ordering::Release);
        self.provider.notify();
    }

    /// Controller side: stop the session
    ///
    /// The keyword is cleared, as the provider runtime does on disable.
    pub fn disable(&self) {
        self.listener_active.store(false, Ordering::Release);
        self.keyword.store(0, Ordering::Release);
        self.provider.notify();
    }

    /// Whether a provider is currently registered
    pub fn is_registered(&self) -> bool {
        self.provider.is_installed()
    }

    /// Number of enable callbacks delivered so far
    pub fn callbacks_delivered(&self) -> usize {
        self.provider.delivered()
    }

    /// Copy of every record written so far
    pub fn records(&self) -> Vec<OwnedEventRecord> {
        lock(&self.records).clone()
    }
}

impl TraceSink for MemorySink {
    fn register(&self, callback: EnableCallback) -> Result<ProviderHandle> {
        if self.reject_registration.load(Ordering::Relaxed) {
            return Err(ExportError::RegistrationFailed(
                "sink rejected the provider".to_string(),
            ));
        }

        let handle = self.provider.install(callback)?;

        // A session that is already running notifies the new provider
        // before registration returns
        if self.listener_active.load(Ordering::Acquire) {
            self.provider.notify();
        }

        Ok(handle)
    }

    fn unregister(&self, handle: ProviderHandle) -> Result<()> {
        self.provider.remove(handle)
    }

    fn is_listener_active(&self) -> bool {
        self.listener_active.load(Ordering::Acquire)
    }

    fn match_any_keyword(&self) -> Keyword {
        self.keyword.load(Ordering::Acquire)
    }

    fn write(&self, record: &EventRecord<'_>) {
        lock(&self.records).push(OwnedEventRecord::from(record));
    }
}
