// End-to-end scenarios: controller keyword → registry → formatted writes
use etw_export::categories::{
    DEFAULT_FILTERED_CATEGORIES, DISABLED_OTHER_EVENTS_CATEGORY, OTHER_EVENTS_CATEGORY,
};
use etw_export::{
    parse_keyword, phase, ArgValue, ConvertableToJson, ExportConfig, Lifecycle, MemorySink,
    TraceArg, TraceExporter, EVENT_FIELD_COUNT,
};
use std::sync::Arc;

struct Snapshot;

impl ConvertableToJson for Snapshot {
    fn append_as_json(&self, out: &mut String) {
        out.push_str(&"x".repeat(8192));
    }
}

fn registered() -> (Arc<MemorySink>, Arc<TraceExporter>) {
    let sink = Arc::new(MemorySink::new());
    let exporter = TraceExporter::register(sink.clone(), ExportConfig::new()).unwrap();
    (sink, exporter)
}

#[test]
fn benchmark_and_cc_keyword() {
    let (sink, exporter) = registered();
    sink.enable(parse_keyword("0x8000000000000009").unwrap());

    let registry = exporter.registry();
    for name in DEFAULT_FILTERED_CATEGORIES {
        let expected = *name == "benchmark" || *name == "cc";
        assert_eq!(registry.is_enabled(name), expected, "{}", name);
    }
    assert!(!registry.is_enabled(OTHER_EVENTS_CATEGORY));
    assert!(!registry.is_enabled(DISABLED_OTHER_EVENTS_CATEGORY));
}

#[test]
fn gpu_netlog_and_other_events_keyword() {
    let (sink, exporter) = registered();
    sink.enable(0xA000_0000_0000_00A0);

    assert!(exporter.is_category_group_enabled("gpu"));
    assert!(exporter.is_category_group_enabled("netlog"));
    // Unknown names ride on the "other events" bit
    assert!(exporter.is_category_group_enabled("renderer"));
    assert!(!exporter.is_category_group_enabled("disabled-by-default-renderer"));
    // Filtered names never fall back
    assert!(!exporter.is_category_group_enabled("v8"));
    assert!(!exporter.is_category_group_enabled("disabled-by-default-cc.debug"));
}

#[test]
fn group_is_enabled_if_any_member_is() {
    let (sink, exporter) = registered();
    sink.enable(0x8000_0000_0000_0400); // v8

    assert!(exporter.is_category_group_enabled("blink,v8,gpu"));
    assert!(!exporter.is_category_group_enabled("blink,gpu"));
}

#[test]
fn written_record_has_fixed_shape() {
    let (sink, exporter) = registered();
    sink.enable(0x8000_0000_0000_0001);

    let args = [
        TraceArg::new("snapshot", ArgValue::Convertable(Arc::new(Snapshot))),
        TraceArg::new("ratio", 0.5),
        TraceArg::new("dropped", true),
    ];
    exporter.add_event(phase::NESTABLE_ASYNC_BEGIN, 0, "Load", 0x2a, &args);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.phase, "Nestable Async Begin");
    assert_eq!(record.arg_name_0, "snapshot");
    assert_eq!(record.arg_value_0, "");
    assert_eq!(record.arg_name_1, "ratio");
    assert_eq!(record.arg_value_1, "0.5");

    let fields = record.fields();
    assert_eq!(fields.len(), EVENT_FIELD_COUNT);
    assert_eq!(fields[0], "Load");
    assert_eq!(fields[6], "");
    assert_eq!(fields[7], "");

    exporter.add_complete_end_event("Load");
    let end = &sink.records()[1];
    assert_eq!(
        end.fields(),
        ["Load", "Complete End", "", "", "", "", "", ""]
    );
}

#[test]
fn session_restart_after_disable() {
    let (sink, exporter) = registered();

    sink.enable(0x8000_0000_0000_0001);
    assert!(exporter.is_category_group_enabled("benchmark"));

    sink.disable();
    assert!(!exporter.is_category_group_enabled("benchmark"));
    assert!(!exporter.registry().is_enabled("benchmark"));

    sink.enable(0x8000_0000_0000_0001);
    assert!(exporter.is_category_group_enabled("benchmark"));
}

#[test]
fn custom_category_layout() {
    let sink = Arc::new(MemorySink::new());
    let config = ExportConfig::new().with_filtered_categories(["storage", "network"]);
    let exporter = TraceExporter::register(sink.clone(), config).unwrap();

    let keyword = exporter.registry().keyword_for(["network"]).unwrap();
    assert_eq!(keyword, 0x8000_0000_0000_0002);

    sink.enable(keyword);
    assert!(exporter.is_category_group_enabled("network"));
    assert!(!exporter.is_category_group_enabled("storage"));
    // "benchmark" is not filtered in this layout
    assert!(!exporter.is_category_group_enabled("benchmark"));
    assert_eq!(exporter.registry().category_count(), 4);
}

#[test]
fn new_exporter_after_unregister() {
    let (sink, first) = registered();
    first.unregister().unwrap();
    assert_eq!(first.lifecycle(), Lifecycle::Unregistered);

    let second = TraceExporter::register(sink.clone(), ExportConfig::new()).unwrap();
    sink.enable(0x8000_0000_0000_0001);

    assert!(second.is_category_group_enabled("benchmark"));
    assert!(!first.is_category_group_enabled("benchmark"));
}
