use std::collections::BTreeMap;

/// Mapping of variable names to values produced by one parse pass.
///
/// Keys are unique; a later assignment to the same key during one pass
/// replaces the earlier value.
pub type Env = BTreeMap<String, String>;

/// Summary of a load or apply operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Keys written to the target store.
    pub loaded: usize,
    /// Keys left untouched because the target already had a non-empty value.
    pub skipped_existing: usize,
    /// Sources successfully opened and parsed.
    pub sources_read: usize,
}
