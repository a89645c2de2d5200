//! Category enablement state
//!
//! This module contains the category registry that maps the controller's
//! keyword onto named category states, and the keyword bit layout shared with
//! the controller.
//!
//! # Keyword layout
//!
//! | Bits 0..N-1 | Bit 61 | Bit 62 | Bit 63 |
//! |---|---|---|---|
//! | one bit per filtered category | other events | disabled-by-default other events | reserved |
//!
//! Bit 63 is always set by the controller, otherwise tracing is disabled on
//! its side, so real keywords are always at least `0x8000000000000000`.
//! For example `0x8000000000000009` exports `benchmark` and `cc`, and
//! `0xA0000000000000A0` exports `gpu`, `netlog` and every other category that
//! is not disabled by default.

pub mod keyword;
pub mod registry;

pub use keyword::{
    format_keyword, parse_keyword, KeywordChange, DISABLED_OTHER_EVENTS_KEYWORD_BIT,
    OTHER_EVENTS_KEYWORD_BIT, RESERVED_KEYWORD_BIT,
};
pub use registry::CategoryRegistry;

/// Categories that can be exported individually, in keyword bit order
pub const DEFAULT_FILTERED_CATEGORIES: &[&str] = &[
    "benchmark",                            // 0x1
    "blink",                                // 0x2
    "browser",                              // 0x4
    "cc",                                   // 0x8
    "evdev",                                // 0x10
    "gpu",                                  // 0x20
    "input",                                // 0x40
    "netlog",                               // 0x80
    "sequence_manager",                     // 0x100
    "toplevel",                             // 0x200
    "v8",                                   // 0x400
    "disabled-by-default-cc.debug",         // 0x800
    "disabled-by-default-cc.debug.picture", // 0x1000
    "disabled-by-default-toplevel.flow",    // 0x2000
    "startup",                              // 0x4000
    "latency",                              // 0x8000
];

/// Catch-all for categories without a dedicated bit
pub const OTHER_EVENTS_CATEGORY: &str = "__OTHER_EVENTS"; // 0x2000000000000000

/// Catch-all for disabled-by-default categories without a dedicated bit
pub const DISABLED_OTHER_EVENTS_CATEGORY: &str = "__DISABLED_OTHER_EVENTS"; // 0x4000000000000000

/// Name prefix marking a category as disabled by default
pub const DISABLED_BY_DEFAULT_PREFIX: &str = "disabled-by-default";

/// Number of synthetic catch-all categories
pub const SYNTHETIC_CATEGORY_COUNT: usize = 2;

/// Filtered categories must stay below the catch-all bits
pub const MAX_FILTERED_CATEGORIES: usize = 61;
