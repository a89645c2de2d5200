//! Main exporter API
//!
//! The [`TraceExporter`] is the entry point the trace system talks to. It is
//! registered against a [`TraceSink`], keeps the [`CategoryRegistry`] in sync
//! with the controller's keyword, and formats events for the sink.
//!
//! There is no process-wide instance: whoever registers the exporter owns the
//! returned `Arc` and hands it to the trace system.

use crate::categories::{format_keyword, CategoryRegistry, KeywordChange};
use crate::config::ExportConfig;
use crate::format::{phase_label, render_args, COMPLETE_END_LABEL};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::sink::{EnableCallback, ProviderHandle, TraceSink};
use crate::types::{EventRecord, ExportError, Result, TraceArg};
use std::sync::{Arc, Mutex, PoisonError};

/// Notified after a keyword change has been applied to the registry
///
/// The trace system uses this to recompute its per-group enabled flags.
pub type CategoryObserver = Box<dyn Fn(&CategoryRegistry) + Send + Sync>;

/// Bridges trace events to the external sink
pub struct TraceExporter {
    sink: Arc<dyn TraceSink>,
    registry: CategoryRegistry,
    config: ExportConfig,
    state: LifecycleState,
    handle: Mutex<Option<ProviderHandle>>,
    /// Held across keyword read and decode; event threads never take it
    update: Mutex<()>,
    observer: Option<CategoryObserver>,
}

impl TraceExporter {
    /// Register a new exporter against `sink`
    ///
    /// The registry is seeded before the sink can deliver any callback.
    /// Callbacks delivered while registration is still in progress are
    /// ignored; call [`enable_export`](Self::enable_export) afterwards to pick
    /// up a session that was already running.
    ///
    /// # Example
    /// ```
    /// use etw_export::{ExportConfig, MemorySink, TraceExporter};
    /// use std::sync::Arc;
    ///
    /// let sink = Arc::new(MemorySink::new());
    /// let exporter = TraceExporter::register(sink.clone(), ExportConfig::new()).unwrap();
    ///
    /// sink.enable(0x8000000000000009);
    /// assert!(exporter.is_category_group_enabled("benchmark"));
    /// assert!(exporter.is_category_group_enabled("gpu,cc"));
    /// assert!(!exporter.is_category_group_enabled("gpu"));
    /// ```
    pub fn register(sink: Arc<dyn TraceSink>, config: ExportConfig) -> Result<Arc<Self>> {
        Self::register_with_observer(sink, config, None)
    }

    /// Register a new exporter with a category-update observer
    pub fn register_with_observer(
        sink: Arc<dyn TraceSink>,
        config: ExportConfig,
        observer: Option<CategoryObserver>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let exporter = Arc::new(Self {
            sink,
            registry: CategoryRegistry::seed(&config.filtered_categories),
            config,
            state: LifecycleState::new(),
            handle: Mutex::new(None),
            update: Mutex::new(()),
            observer,
        });

        if !exporter
            .state
            .transition(Lifecycle::Unregistered, Lifecycle::Registering)
        {
            return Err(ExportError::RegistrationFailed(format!(
                "exporter is {}",
                exporter.lifecycle()
            )));
        }

        let weak = Arc::downgrade(&exporter);
        let callback: EnableCallback = Arc::new(move || {
            if let Some(exporter) = weak.upgrade() {
                exporter.on_enable_update();
            }
        });

        match exporter.sink.register(callback) {
            Ok(handle) => {
                *exporter
                    .handle
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(handle);
                exporter
                    .state
                    .transition(Lifecycle::Registering, Lifecycle::Registered);
                log::info!(
                    "Registered trace exporter ({:?}, {} categories)",
                    handle,
                    exporter.registry.category_count()
                );
                Ok(exporter)
            }
            Err(e) => {
                exporter
                    .state
                    .transition(Lifecycle::Registering, Lifecycle::Unregistered);
                log::warn!("Trace exporter registration failed: {}", e);
                Err(e)
            }
        }
    }

    /// Register and immediately sync with the controller's current keyword
    pub fn register_and_enable(sink: Arc<dyn TraceSink>, config: ExportConfig) -> Result<Arc<Self>> {
        let exporter = Self::register(sink, config)?;
        exporter.enable_export()?;
        Ok(exporter)
    }

    /// Sync the registry with the controller's current keyword
    ///
    /// The enable callback keeps it in sync afterwards. Safe to call while
    /// the sink is delivering callbacks: updates are applied one at a time,
    /// each with the keyword current when it started.
    pub fn enable_export(&self) -> Result<KeywordChange> {
        if !self.state.is_registered() {
            return Err(ExportError::NotRegistered);
        }
        Ok(self.update_enabled_categories())
    }

    /// Handle an enable/disable notification from the sink
    ///
    /// Ignored unless registration has completed: the sink may call this
    /// synchronously from inside `register`.
    pub fn on_enable_update(&self) {
        let state = self.state.get();
        if state != Lifecycle::Registered {
            log::trace!("Ignoring enable update while {}", state);
            return;
        }
        self.update_enabled_categories();
    }

    fn update_enabled_categories(&self) -> KeywordChange {
        let _writer = self.update.lock().unwrap_or_else(PoisonError::into_inner);
        let keyword = self.sink.match_any_keyword();
        let change = self.registry.decode(keyword);

        if change.is_changed() {
            log::debug!(
                "Keyword changed to {}, enabled categories: {:?}",
                format_keyword(keyword),
                self.registry.enabled_categories()
            );
            if let Some(observer) = &self.observer {
                observer(&self.registry);
            }
        }
        change
    }

    /// Whether events can currently reach a consumer
    pub fn is_active(&self) -> bool {
        self.state.is_registered() && self.sink.is_listener_active()
    }

    /// Check whether any category in a comma-separated group is enabled
    ///
    /// # Panics
    /// If `category_group` is empty.
    pub fn is_category_group_enabled(&self, category_group: &str) -> bool {
        assert!(!category_group.is_empty(), "category group must not be empty");

        if !self.is_active() {
            return false;
        }

        category_group
            .split(',')
            .filter(|category| !category.is_empty())
            .any(|category| self.registry.is_enabled(category))
    }

    /// Export one trace event
    ///
    /// `category_group_enabled` is the trace system's flag byte for the
    /// event's category group; gating on it is the caller's job.
    pub fn add_event(
        &self,
        phase: u8,
        category_group_enabled: u8,
        name: &str,
        id: u64,
        args: &[TraceArg],
    ) {
        if !self.is_active() {
            return;
        }

        let phase = phase_label(phase);
        let [arg0, arg1] = render_args(args, &self.config);

        log::trace!(
            "Exporting {} ({}) id={:#x} flags={:#04x}",
            name,
            phase,
            id,
            category_group_enabled
        );

        self.sink.write(&EventRecord {
            name,
            phase: &phase,
            arg_name_0: arg0.name,
            arg_value_0: &arg0.value,
            arg_name_1: arg1.name,
            arg_value_1: &arg1.value,
        });
    }

    /// Export the closing half of a complete event
    pub fn add_complete_end_event(&self, name: &str) {
        if !self.is_active() {
            return;
        }

        self.sink.write(&EventRecord {
            name,
            phase: COMPLETE_END_LABEL,
            arg_name_0: "",
            arg_value_0: "",
            arg_name_1: "",
            arg_value_1: "",
        });
    }

    /// Unregister from the sink
    ///
    /// One-way: an unregistered exporter never becomes active again; register
    /// a new one instead.
    pub fn unregister(&self) -> Result<()> {
        if !self
            .state
            .transition(Lifecycle::Registered, Lifecycle::Unregistering)
        {
            return Err(ExportError::NotRegistered);
        }

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let result = match handle {
            Some(handle) => self.sink.unregister(handle),
            None => Ok(()),
        };

        self.state
            .transition(Lifecycle::Unregistering, Lifecycle::Unregistered);
        log::info!("Unregistered trace exporter");
        result
    }

    /// Current registration state
    pub fn lifecycle(&self) -> Lifecycle {
        self.state.get()
    }

    /// The category registry driven by this exporter
    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// The configuration this exporter was registered with
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }
}

impl Drop for TraceExporter {
    fn drop(&mut self) {
        if self.state.is_registered() {
            if let Err(e) = self.unregister() {
                log::warn!("Failed to unregister trace exporter on drop: {}", e);
            }
        }
    }
}
