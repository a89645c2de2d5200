//! Provider registration bookkeeping shared by sink implementations

use super::{EnableCallback, ProviderHandle};
use crate::types::{ExportError, Result};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The single provider a sink accepts, and its enable callback
///
/// Callback delivery is serialized, so an exporter never sees two enable
/// updates at once.
#[derive(Default)]
pub struct ProviderSlot {
    next_handle: AtomicU64,
    registration: Mutex<Option<(ProviderHandle, EnableCallback)>>,
    dispatch: Mutex<()>,
    delivered: AtomicUsize,
}

impl ProviderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a provider; fails if one is already installed
    pub fn install(&self, callback: EnableCallback) -> Result<ProviderHandle> {
        let mut registration = lock(&self.registration);
        if registration.is_some() {
            return Err(ExportError::RegistrationFailed(
                "a provider is already registered".to_string(),
            ));
        }
        let handle = ProviderHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        *registration = Some((handle, callback));
        Ok(handle)
    }

    /// Remove the provider installed under `handle`
    pub fn remove(&self, handle: ProviderHandle) -> Result<()> {
        let mut registration = lock(&self.registration);
        match registration.as_ref() {
            Some((registered, _)) if *registered == handle => {
                *registration = None;
                Ok(())
            }
            _ => Err(ExportError::UnregistrationFailed(format!(
                "unknown provider handle {:?}",
                handle
            ))),
        }
    }

    pub fn is_installed(&self) -> bool {
        lock(&self.registration).is_some()
    }

    /// Deliver the enable callback, if a provider is installed
    ///
    /// Returns whether a callback ran.
    pub fn notify(&self) -> bool {
        // Clone the callback out so it can call back into the sink
        let callback = lock(&self.registration)
            .as_ref()
            .map(|(_, callback)| callback.clone());

        match callback {
            Some(callback) => {
                let _serialized = lock(&self.dispatch);
                self.delivered.fetch_add(1, Ordering::Relaxed);
                callback();
                true
            }
            None => false,
        }
    }

    /// Number of callbacks delivered so far
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }
}
