/// Why an insertion request was dropped without touching the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The toolbar has not been anchored since it last closed
    NoTarget,
    /// The recorded index no longer lies inside the document
    OutOfBounds { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { index: usize, appended_line: bool },
    Skipped(SkipReason),
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted { .. })
    }
}

/// Check a recorded target against the current document length.
pub fn validate_target(target: Option<usize>, len: usize) -> Result<usize, SkipReason> {
    match target {
        None => Err(SkipReason::NoTarget),
        Some(index) if index >= len => Err(SkipReason::OutOfBounds { index, len }),
        Some(index) => Ok(index),
    }
}

/// Whether `index` is the last unit of a document of length `len`.
///
/// Must be evaluated before the document is mutated.
pub fn is_tail_insertion(len: usize, index: usize) -> bool {
    len.checked_sub(1) == Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 0, true)]
    #[case(2, 1, true)]
    #[case(2, 0, false)]
    #[case(10, 3, false)]
    #[case(0, 0, false)]
    fn test_is_tail_insertion(#[case] len: usize, #[case] index: usize, #[case] expected: bool) {
        assert_eq!(is_tail_insertion(len, index), expected);
    }

    #[test]
    fn test_validate_target_unset() {
        assert_eq!(validate_target(None, 4), Err(SkipReason::NoTarget));
    }

    #[test]
    fn test_validate_target_past_end() {
        assert_eq!(
            validate_target(Some(4), 4),
            Err(SkipReason::OutOfBounds { index: 4, len: 4 })
        );
    }

    #[test]
    fn test_validate_target_in_bounds() {
        assert_eq!(validate_target(Some(3), 4), Ok(3));
    }
}
