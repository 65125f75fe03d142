use serde::{Deserialize, Serialize};

use crate::engine::{LineDescriptor, LineKind};

/// Line length treated as "nothing on this line but the caret's placeholder".
pub const SENTINEL_LINE_LENGTH: usize = 1;

/// Which lines the anchor may be offered on.
///
/// The two only disagree on engines that report a block embed line as a
/// single unit. On engines whose embed lines carry a terminator, no embed line
/// has sentinel length and both accept exactly the empty text lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddableLine {
    /// Any line of sentinel length, a single-unit embed line included
    #[default]
    SingleUnit,
    /// Only empty text lines
    EmptyTextOnly,
}

impl EmbeddableLine {
    pub fn accepts(&self, line: &LineDescriptor) -> bool {
        if line.length != SENTINEL_LINE_LENGTH {
            return false;
        }
        match self {
            EmbeddableLine::SingleUnit => true,
            EmbeddableLine::EmptyTextOnly => line.kind == LineKind::Text,
        }
    }
}

/// Which index a trigger-driven insertion targets once the trigger resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerTarget {
    /// The toolbar's index at resolution time; nothing is inserted if it closed meanwhile
    #[default]
    Current,
    /// The index captured when the trigger was invoked
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarPolicy {
    pub embeddable_line: EmbeddableLine,
    pub trigger_target: TriggerTarget,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LineId;
    use rstest::rstest;

    fn line(length: usize, kind: LineKind) -> LineDescriptor {
        LineDescriptor {
            id: LineId::new(),
            start: 0,
            length,
            kind,
        }
    }

    #[rstest]
    #[case(EmbeddableLine::SingleUnit, 1, LineKind::Text, true)]
    #[case(EmbeddableLine::SingleUnit, 1, LineKind::Embed, true)]
    #[case(EmbeddableLine::SingleUnit, 2, LineKind::Text, false)]
    #[case(EmbeddableLine::EmptyTextOnly, 1, LineKind::Text, true)]
    #[case(EmbeddableLine::EmptyTextOnly, 1, LineKind::Embed, false)]
    #[case(EmbeddableLine::EmptyTextOnly, 5, LineKind::Text, false)]
    fn test_embeddable_line_policy(
        #[case] policy: EmbeddableLine,
        #[case] length: usize,
        #[case] kind: LineKind,
        #[case] expected: bool,
    ) {
        assert_eq!(policy.accepts(&line(length, kind)), expected);
    }

    #[test]
    fn test_default_policy_matches_single_unit_and_current() {
        let policy = ToolbarPolicy::default();
        assert_eq!(policy.embeddable_line, EmbeddableLine::SingleUnit);
        assert_eq!(policy.trigger_target, TriggerTarget::Current);
    }
}
