/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Line indices touched by the edit, in the new document
    pub changed_lines: std::ops::Range<usize>,
    /// Offset the edit was applied at, in the old document
    pub at: usize,
    /// Net change in document length (units)
    pub delta: isize,
    /// Caret after the edit when the command places one
    pub caret: Option<usize>,
    pub version: u64,
}
