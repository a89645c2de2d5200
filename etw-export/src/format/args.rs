//! Argument rendering
//!
//! Renders trace arguments as JSON-ish strings for the two argument slots of
//! an exported event.

use crate::config::ExportConfig;
use crate::types::{ArgValue, TraceArg};

/// Number of argument slots in an exported event
pub const MAX_EXPORTED_ARGS: usize = 2;

/// One rendered argument slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedArg<'a> {
    /// Argument name (empty when the slot is unused)
    pub name: &'a str,
    /// Rendered value (empty when unused or skipped)
    pub value: String,
}

/// Render the first [`MAX_EXPORTED_ARGS`] arguments
///
/// Arguments past the cap are ignored. An argument whose kind `config`
/// skips keeps its name but gets an empty value; the policy applies per
/// argument, so the other slot is still rendered.
pub fn render_args<'a>(
    args: &'a [TraceArg],
    config: &ExportConfig,
) -> [RenderedArg<'a>; MAX_EXPORTED_ARGS] {
    let mut slots: [RenderedArg<'a>; MAX_EXPORTED_ARGS] = Default::default();

    if args.len() > MAX_EXPORTED_ARGS {
        log::trace!(
            "Dropping {} arguments past the export cap",
            args.len() - MAX_EXPORTED_ARGS
        );
    }

    for (slot, arg) in slots.iter_mut().zip(args) {
        slot.name = arg.name.as_str();
        if config.should_skip(arg.value.kind()) {
            continue;
        }
        append_as_json(&arg.value, &mut slot.value);
    }

    slots
}

/// Append the JSON-ish rendering of a value to `out`
///
/// Non-finite doubles and pointers are rendered as quoted strings; finite
/// doubles always carry a fraction or exponent.
pub fn append_as_json(value: &ArgValue, out: &mut String) {
    match value {
        ArgValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        ArgValue::Uint(v) => out.push_str(&v.to_string()),
        ArgValue::Int(v) => out.push_str(&v.to_string()),
        ArgValue::Double(v) => append_double(*v, out),
        ArgValue::Pointer(v) => out.push_str(&format!("\"{:#x}\"", v)),
        ArgValue::String(v) | ArgValue::CopyString(v) => {
            out.push_str(&serde_json::Value::from(v.as_str()).to_string())
        }
        ArgValue::Convertable(v) => v.append_as_json(out),
    }
}

fn append_double(value: f64, out: &mut String) {
    if value.is_nan() {
        out.push_str("\"NaN\"");
        return;
    }
    if value.is_infinite() {
        out.push_str(if value < 0.0 { "\"-Infinity\"" } else { "\"Infinity\"" });
        return;
    }

    let mut real = format!("{:?}", value);
    if !real.contains(['.', 'e', 'E']) {
        real.push_str(".0");
    }
    // JSON needs a leading zero: ".5" is invalid, "0.5" is not
    if real.starts_with('.') {
        real.insert(0, '0');
    } else if real.starts_with("-.") {
        real.insert(1, '0');
    }
    out.push_str(&real);
}
