//! Event formatting
//!
//! Pure helpers that turn a trace event's phase code and argument list into
//! the strings written to the sink. Nothing here holds state.

pub mod args;
pub mod phase;

pub use args::{append_as_json, render_args, RenderedArg, MAX_EXPORTED_ARGS};
pub use phase::{phase_label, COMPLETE_END_LABEL};
