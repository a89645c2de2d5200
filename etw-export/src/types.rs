//! Core types for the ETW export bridge
//!
//! This module defines the values the in-process trace system hands to the
//! exporter (phase codes, typed arguments) and the fixed-shape record the
//! exporter hands to the external sink.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Result type for exporter operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// A 64-bit keyword mask as set by the tracing controller
pub type Keyword = u64;

/// Errors that can occur while registering or configuring the exporter
///
/// The event path itself never fails; these only come out of plumbing.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Provider registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Provider unregistration failed: {0}")]
    UnregistrationFailed(String),

    #[error("Exporter is not registered")]
    NotRegistered,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),
}

/// Phase codes used by the in-process trace system
pub mod phase {
    pub const BEGIN: u8 = b'B';
    pub const END: u8 = b'E';
    pub const COMPLETE: u8 = b'X';
    pub const INSTANT: u8 = b'I';
    pub const ASYNC_BEGIN: u8 = b'S';
    pub const ASYNC_STEP_INTO: u8 = b'T';
    pub const ASYNC_STEP_PAST: u8 = b'p';
    pub const ASYNC_END: u8 = b'F';
    pub const NESTABLE_ASYNC_BEGIN: u8 = b'b';
    pub const NESTABLE_ASYNC_END: u8 = b'e';
    pub const NESTABLE_ASYNC_INSTANT: u8 = b'n';
    pub const FLOW_BEGIN: u8 = b's';
    pub const FLOW_STEP: u8 = b't';
    pub const FLOW_END: u8 = b'f';
    pub const METADATA: u8 = b'M';
    pub const COUNTER: u8 = b'C';
    pub const SAMPLE: u8 = b'P';
    pub const CREATE_OBJECT: u8 = b'N';
    pub const SNAPSHOT_OBJECT: u8 = b'O';
    pub const DELETE_OBJECT: u8 = b'D';
}

/// A value that knows how to render itself as JSON
///
/// Used for structured arguments (dictionaries, nested objects) whose
/// rendering is owned by the caller.
pub trait ConvertableToJson: Send + Sync {
    /// Append the JSON representation of this value to `out`
    fn append_as_json(&self, out: &mut String);
}

/// Typed value of a trace argument
#[derive(Clone)]
pub enum ArgValue {
    Bool(bool),
    Uint(u64),
    Int(i64),
    Double(f64),
    /// Raw address, rendered as a quoted hex string
    Pointer(usize),
    /// String with static lifetime in the trace system
    String(String),
    /// String copied by the trace system when the event was recorded
    CopyString(String),
    /// Structured value rendered by the caller
    Convertable(Arc<dyn ConvertableToJson>),
}

impl ArgValue {
    /// The kind of this value, used by the rendering skip policy
    pub fn kind(&self) -> ArgKind {
        match self {
            ArgValue::Bool(_) => ArgKind::Bool,
            ArgValue::Uint(_) => ArgKind::Uint,
            ArgValue::Int(_) => ArgKind::Int,
            ArgValue::Double(_) => ArgKind::Double,
            ArgValue::Pointer(_) => ArgKind::Pointer,
            ArgValue::String(_) => ArgKind::String,
            ArgValue::CopyString(_) => ArgKind::CopyString,
            ArgValue::Convertable(_) => ArgKind::Convertable,
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            ArgValue::Uint(v) => f.debug_tuple("Uint").field(v).finish(),
            ArgValue::Int(v) => f.debug_tuple("Int").field(v).finish(),
            ArgValue::Double(v) => f.debug_tuple("Double").field(v).finish(),
            ArgValue::Pointer(v) => write!(f, "Pointer({:#x})", v),
            ArgValue::String(v) => f.debug_tuple("String").field(v).finish(),
            ArgValue::CopyString(v) => f.debug_tuple("CopyString").field(v).finish(),
            ArgValue::Convertable(_) => write!(f, "Convertable(..)"),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<u64> for ArgValue {
    fn from(v: u64) -> Self {
        ArgValue::Uint(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Double(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::String(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::CopyString(v)
    }
}

/// Kind tag of an [`ArgValue`], without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    Bool,
    Uint,
    Int,
    Double,
    Pointer,
    String,
    CopyString,
    Convertable,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgKind::Bool => "bool",
            ArgKind::Uint => "uint",
            ArgKind::Int => "int",
            ArgKind::Double => "double",
            ArgKind::Pointer => "pointer",
            ArgKind::String => "string",
            ArgKind::CopyString => "copy_string",
            ArgKind::Convertable => "convertable",
        };
        write!(f, "{}", name)
    }
}

/// A named trace argument
#[derive(Debug, Clone)]
pub struct TraceArg {
    /// Argument name
    pub name: String,
    /// Argument value
    pub value: ArgValue,
}

impl TraceArg {
    /// Create a new trace argument
    pub fn new(name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Number of fields in every record written to the sink
pub const EVENT_FIELD_COUNT: usize = 8;

/// One event as handed to the external sink
///
/// The wire shape is fixed: name, phase label, two argument slots and two
/// reserved trailing fields that are always empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord<'a> {
    pub name: &'a str,
    pub phase: &'a str,
    pub arg_name_0: &'a str,
    pub arg_value_0: &'a str,
    pub arg_name_1: &'a str,
    pub arg_value_1: &'a str,
}

impl<'a> EventRecord<'a> {
    /// All fields in wire order, including the reserved trailing fields
    pub fn fields(&self) -> [&'a str; EVENT_FIELD_COUNT] {
        [
            self.name,
            self.phase,
            self.arg_name_0,
            self.arg_value_0,
            self.arg_name_1,
            self.arg_value_1,
            "",
            "",
        ]
    }
}

/// An owned copy of an [`EventRecord`], for sinks that keep what they receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedEventRecord {
    pub name: String,
    pub phase: String,
    pub arg_name_0: String,
    pub arg_value_0: String,
    pub arg_name_1: String,
    pub arg_value_1: String,
    /// The two trailing fields, as written
    pub reserved: [String; 2],
}

impl OwnedEventRecord {
    /// All fields in wire order
    pub fn fields(&self) -> [&str; EVENT_FIELD_COUNT] {
        [
            &self.name,
            &self.phase,
            &self.arg_name_0,
            &self.arg_value_0,
            &self.arg_name_1,
            &self.arg_value_1,
            &self.reserved[0],
            &self.reserved[1],
        ]
    }
}

impl From<&EventRecord<'_>> for OwnedEventRecord {
    fn from(record: &EventRecord<'_>) -> Self {
        let [name, phase, arg_name_0, arg_value_0, arg_name_1, arg_value_1, reserved_0, reserved_1] =
            record.fields().map(String::from);
        Self {
            name,
            phase,
            arg_name_0,
            arg_value_0,
            arg_name_1,
            arg_value_1,
            reserved: [reserved_0, reserved_1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dict;

    impl ConvertableToJson for Dict {
        fn append_as_json(&self, out: &mut String) {
            out.push_str("{}");
        }
    }

    #[test]
    fn test_arg_value_kinds() {
        assert_eq!(ArgValue::from(true).kind(), ArgKind::Bool);
        assert_eq!(ArgValue::from(7u64).kind(), ArgKind::Uint);
        assert_eq!(ArgValue::from(-7i64).kind(), ArgKind::Int);
        assert_eq!(ArgValue::from(1.5).kind(), ArgKind::Double);
        assert_eq!(ArgValue::from("static").kind(), ArgKind::String);
        assert_eq!(ArgValue::from(String::from("copied")).kind(), ArgKind::CopyString);
        assert_eq!(ArgValue::Convertable(Arc::new(Dict)).kind(), ArgKind::Convertable);
    }

    #[test]
    fn test_record_fields_have_reserved_tail() {
        let record = EventRecord {
            name: "MyEvent",
            phase: "Begin",
            arg_name_0: "a",
            arg_value_0: "1",
            arg_name_1: "",
            arg_value_1: "",
        };
        let fields = record.fields();
        assert_eq!(fields.len(), EVENT_FIELD_COUNT);
        assert_eq!(fields[0], "MyEvent");
        assert_eq!(fields[1], "Begin");
        assert_eq!(fields[6], "");
        assert_eq!(fields[7], "");
    }

    #[test]
    fn test_arg_kind_serde_names() {
        let kinds: Vec<ArgKind> = serde_json::from_str(r#"["convertable", "copy_string"]"#).unwrap();
        assert_eq!(kinds, vec![ArgKind::Convertable, ArgKind::CopyString]);
        assert_eq!(ArgKind::CopyString.to_string(), "copy_string");
    }
}
