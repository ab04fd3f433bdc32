/// Result of applying a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Byte ranges inserted by this edit, in post-edit coordinates.
    pub changed: Vec<std::ops::Range<usize>>,
    /// Selection after the edit, computed analytically per command.
    pub new_selection: std::ops::Range<usize>,
    /// Document version after the edit.
    pub version: u64,
}
