//! Simulated tracing session
//!
//! [`SessionSink`] stands in for the OS provider runtime: it accepts the
//! exporter's registration, lets the driver start and stop a controller
//! session with a keyword, and writes every exported event to an output
//! stream as JSON lines or plain text.

use crate::config::OutputFormat;
use chrono::Utc;
use etw_export::{
    format_keyword, EnableCallback, EventRecord, Keyword, ProviderHandle, ProviderSlot, TraceSink,
    EVENT_FIELD_COUNT,
};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// JSON-lines shape of one exported event: the record's fields in wire order
#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    fields: [&'a str; EVENT_FIELD_COUNT],
}

/// A sink writing exported events to a stream
pub struct SessionSink {
    out: Mutex<Box<dyn Write + Send>>,
    format: OutputFormat,
    provider: ProviderSlot,
    listener_active: AtomicBool,
    keyword: AtomicU64,
    written: AtomicUsize,
    write_errors: AtomicUsize,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionSink {
    pub fn new(out: Box<dyn Write + Send>, format: OutputFormat) -> Self {
        Self {
            out: Mutex::new(out),
            format,
            provider: ProviderSlot::new(),
            listener_active: AtomicBool::new(false),
            keyword: AtomicU64::new(0),
            written: AtomicUsize::new(0),
            write_errors: AtomicUsize::new(0),
        }
    }

    /// Start a controller session (or change its keyword)
    pub fn start(&self, keyword: Keyword) {
        log::info!("Starting session with keyword {}", format_keyword(keyword));
        self.keyword.store(keyword, Ordering::Release);
        self.listener_active.store(true, Ordering::Release);
        self.provider.notify();
    }

    /// Stop the controller session
    pub fn stop(&self) {
        log::info!("Stopping session");
        self.listener_active.store(false, Ordering::Release);
        self.keyword.store(0, Ordering::Release);
        self.provider.notify();
    }

    /// Events successfully written
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    /// Events lost to output errors
    pub fn write_errors(&self) -> usize {
        self.write_errors.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> io::Result<()> {
        lock(&self.out).flush()
    }

    fn write_line(&self, out: &mut (dyn Write + Send), record: &EventRecord<'_>) -> io::Result<()> {
        let fields = record.fields();
        match self.format {
            OutputFormat::Json => {
                let json = JsonRecord {
                    timestamp: Utc::now().to_rfc3339(),
                    fields,
                };
                serde_json::to_writer(&mut *out, &json)?;
                writeln!(out)
            }
            OutputFormat::Text => {
                let [name, phase, args @ ..] = fields;
                let mut line = format!("{} [{}] {}", Utc::now().format("%H:%M:%S%.6f"), phase, name);
                for pair in args.chunks(2) {
                    if let [key, value] = pair {
                        if !key.is_empty() {
                            line.push_str(&format!(" {}={}", key, value));
                        }
                    }
                }
                writeln!(out, "{}", line)
            }
        }
    }
}

impl TraceSink for SessionSink {
    fn register(&self, callback: EnableCallback) -> etw_export::Result<ProviderHandle> {
        let handle = self.provider.install(callback)?;
        if self.listener_active.load(Ordering::Acquire) {
            self.provider.notify();
        }
        Ok(handle)
    }

    fn unregister(&self, handle: ProviderHandle) -> etw_export::Result<()> {
        self.provider.remove(handle)
    }

    fn is_listener_active(&self) -> bool {
        self.listener_active.load(Ordering::Acquire)
    }

    fn match_any_keyword(&self) -> Keyword {
        self.keyword.load(Ordering::Acquire)
    }

    fn write(&self, record: &EventRecord<'_>) {
        let mut out = lock(&self.out);
        match self.write_line(&mut **out, record) {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                log::debug!("Dropped event {}: {}", record.name, e);
                self.write_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shared buffer so tests can read what the sink wrote
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn record() -> EventRecord<'static> {
        EventRecord {
            name: "DrawFrame",
            phase: "Begin",
            arg_name_0: "frame",
            arg_value_0: "12",
            arg_name_1: "",
            arg_value_1: "",
        }
    }

    #[test]
    fn test_json_output() {
        let buf = SharedBuf::default();
        let sink = SessionSink::new(Box::new(buf.clone()), OutputFormat::Json);
        sink.write(&record());

        let line = buf.contents();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        let fields = value["fields"].as_array().unwrap();
        assert_eq!(fields.len(), EVENT_FIELD_COUNT);
        assert_eq!(fields[0], "DrawFrame");
        assert_eq!(fields[1], "Begin");
        assert_eq!(fields[2], "frame");
        assert_eq!(fields[3], "12");
        assert_eq!(fields[6], "");
        assert_eq!(fields[7], "");
        assert_eq!(sink.written(), 1);
    }

    #[test]
    fn test_text_output() {
        let buf = SharedBuf::default();
        let sink = SessionSink::new(Box::new(buf.clone()), OutputFormat::Text);
        sink.write(&record());

        let line = buf.contents();
        assert!(line.contains("[Begin] DrawFrame frame=12"), "{}", line);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_writes_are_counted_not_written() {
        for format in [OutputFormat::Json, OutputFormat::Text] {
            let sink = SessionSink::new(Box::new(BrokenPipe), format);
            sink.write(&record());
            sink.write(&record());
            assert_eq!(sink.written(), 0, "{:?}", format);
            assert_eq!(sink.write_errors(), 2, "{:?}", format);
        }
    }

    #[test]
    fn test_start_and_stop_drive_callback() {
        let sink = SessionSink::new(Box::new(std::io::sink()), OutputFormat::Json);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let handle = sink
            .register(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        sink.start(0x8000_0000_0000_0001);
        assert!(sink.is_listener_active());
        assert_eq!(sink.match_any_keyword(), 0x8000_0000_0000_0001);
        sink.stop();
        assert_eq!(sink.match_any_keyword(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        assert!(sink.register(Arc::new(|| {})).is_err());
        assert!(sink.unregister(ProviderHandle(handle.0 + 1)).is_err());
        sink.unregister(handle).unwrap();
    }
}
