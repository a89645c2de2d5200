//! Registration lifecycle
//!
//! `Unregistered → Registering → Registered → Unregistering → Unregistered`
//!
//! `Registering` covers the window in which the sink may call back into the
//! exporter before registration has returned; enable updates are ignored
//! there. Only `Registered` lets events through.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Registration state of an exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Lifecycle {
    Unregistered = 0,
    Registering = 1,
    Registered = 2,
    Unregistering = 3,
}

impl Lifecycle {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Lifecycle::Registering,
            2 => Lifecycle::Registered,
            3 => Lifecycle::Unregistering,
            _ => Lifecycle::Unregistered,
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Unregistered => write!(f, "Unregistered"),
            Lifecycle::Registering => write!(f, "Registering"),
            Lifecycle::Registered => write!(f, "Registered"),
            Lifecycle::Unregistering => write!(f, "Unregistering"),
        }
    }
}

/// Atomic lifecycle cell shared by the event path and the callback path
#[derive(Debug)]
pub(crate) struct LifecycleState(AtomicU8);

impl LifecycleState {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(Lifecycle::Unregistered as u8))
    }

    pub(crate) fn get(&self) -> Lifecycle {
        Lifecycle::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.get() == Lifecycle::Registered
    }

    /// Move from `from` to `to`; false if the current state is not `from`
    pub(crate) fn transition(&self, from: Lifecycle, to: Lifecycle) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
