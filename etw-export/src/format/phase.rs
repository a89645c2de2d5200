//! Phase code labels

use crate::types::phase;
use std::borrow::Cow;

/// Label written for the closing half of a complete event
pub const COMPLETE_END_LABEL: &str = "Complete End";

/// Map a phase code to the label shown by the consumer
///
/// Unknown codes are rendered as the code itself, one character long. Code 0
/// renders as an empty label; codes from 0x80 up map to the Latin-1 character
/// with that value, since a label must be valid UTF-8.
pub fn phase_label(code: u8) -> Cow<'static, str> {
    let label = match code {
        phase::BEGIN => "Begin",
        phase::END => "End",
        phase::COMPLETE => "Complete",
        phase::INSTANT => "Instant",
        phase::ASYNC_BEGIN => "Async Begin",
        phase::ASYNC_STEP_INTO => "Async Step Into",
        phase::ASYNC_STEP_PAST => "Async Step Past",
        phase::ASYNC_END => "Async End",
        phase::NESTABLE_ASYNC_BEGIN => "Nestable Async Begin",
        phase::NESTABLE_ASYNC_END => "Nestable Async End",
        phase::NESTABLE_ASYNC_INSTANT => "Nestable Async Instant",
        phase::FLOW_BEGIN => "Phase Flow Begin",
        phase::FLOW_STEP => "Phase Flow Step",
        phase::FLOW_END => "Phase Flow End",
        phase::METADATA => "Phase Metadata",
        phase::COUNTER => "Phase Counter",
        phase::SAMPLE => "Phase Sample",
        phase::CREATE_OBJECT => "Phase Create Object",
        phase::SNAPSHOT_OBJECT => "Phase Snapshot Object",
        phase::DELETE_OBJECT => "Phase Delete Object",
        0 => "",
        other => return Cow::Owned(char::from(other).to_string()),
    };
    Cow::Borrowed(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_phases() {
        let table: &[(u8, &str)] = &[
            (b'B', "Begin"),
            (b'E', "End"),
            (b'X', "Complete"),
            (b'I', "Instant"),
            (b'S', "Async Begin"),
            (b'T', "Async Step Into"),
            (b'p', "Async Step Past"),
            (b'F', "Async End"),
            (b'b', "Nestable Async Begin"),
            (b'e', "Nestable Async End"),
            (b'n', "Nestable Async Instant"),
            (b's', "Phase Flow Begin"),
            (b't', "Phase Flow Step"),
            (b'f', "Phase Flow End"),
            (b'M', "Phase Metadata"),
            (b'C', "Phase Counter"),
            (b'P', "Phase Sample"),
            (b'N', "Phase Create Object"),
            (b'O', "Phase Snapshot Object"),
            (b'D', "Phase Delete Object"),
        ];

        for (code, label) in table {
            assert_eq!(phase_label(*code), *label, "phase {:?}", char::from(*code));
        }
    }

    #[test]
    fn test_unknown_phase_renders_raw_code() {
        assert_eq!(phase_label(b'?'), "?");
        assert_eq!(phase_label(b'R'), "R");
        assert_eq!(phase_label(b'0'), "0");
        assert_eq!(phase_label(b'?').chars().count(), 1);
    }

    #[test]
    fn test_unknown_phase_edge_codes() {
        assert_eq!(phase_label(0), "");

        let high = phase_label(0xE9);
        assert_eq!(high, "\u{e9}");
        assert_eq!(high.chars().count(), 1);
        assert_eq!(high.len(), 2);
        assert_eq!(phase_label(0xFF), "\u{ff}");
    }

    #[test]
    fn test_known_labels_are_borrowed() {
        assert!(matches!(phase_label(b'B'), Cow::Borrowed(_)));
        assert!(matches!(phase_label(b'z'), Cow::Owned(_)));
    }
}
