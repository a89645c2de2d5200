//! Session report

use crate::workload::WorkloadStats;
use etw_export::{format_keyword, Keyword, TraceExporter};
use std::fmt;

/// Summary printed after a session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub keyword: Option<Keyword>,
    pub enabled_categories: Vec<String>,
    pub stats: WorkloadStats,
    pub written: usize,
    pub write_errors: usize,
}

impl SessionReport {
    /// Capture the exporter's category state; call while the session runs
    pub fn capture(exporter: &TraceExporter, keyword: Option<Keyword>) -> Self {
        Self {
            keyword,
            enabled_categories: exporter
                .registry()
                .enabled_categories()
                .into_iter()
                .map(String::from)
                .collect(),
            stats: WorkloadStats::default(),
            written: 0,
            write_errors: 0,
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════")?;
        writeln!(f, "  ETW Export Session Report")?;
        writeln!(f, "═══════════════════════════════════════════════")?;
        match self.keyword {
            Some(keyword) => writeln!(f, "  Keyword:    {}", format_keyword(keyword))?,
            None => writeln!(f, "  Keyword:    (no session)")?,
        }
        if self.enabled_categories.is_empty() {
            writeln!(f, "  Categories: none enabled")?;
        } else {
            writeln!(f, "  Categories: {}", self.enabled_categories.join(", "))?;
        }
        writeln!(f, "  Offered:    {}", self.stats.offered)?;
        writeln!(f, "  Exported:   {}", self.stats.exported)?;
        writeln!(f, "  Complete:   {}", self.stats.complete_ends)?;
        writeln!(f, "  Written:    {}", self.written)?;
        if self.write_errors > 0 {
            writeln!(f, "  Dropped:    {}", self.write_errors)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etw_export::{ExportConfig, MemorySink};
    use std::sync::Arc;

    #[test]
    fn test_report_lists_enabled_categories() {
        let sink = Arc::new(MemorySink::new());
        let exporter = TraceExporter::register(sink.clone(), ExportConfig::new()).unwrap();
        sink.enable(0x8000_0000_0000_0009);

        let mut report = SessionReport::capture(&exporter, Some(0x8000_0000_0000_0009));
        report.written = 5;
        let text = report.to_string();

        assert!(text.contains("0x8000000000000009"));
        assert!(text.contains("benchmark, cc"));
        assert!(text.contains("Written:    5"));
        assert!(!text.contains("Dropped"));
    }

    #[test]
    fn test_report_without_session() {
        let sink = Arc::new(MemorySink::new());
        let exporter = TraceExporter::register(sink, ExportConfig::new()).unwrap();
        let text = SessionReport::capture(&exporter, None).to_string();
        assert!(text.contains("(no session)"));
        assert!(text.contains("none enabled"));
    }
}
