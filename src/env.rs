use std::collections::BTreeMap;

/// Environment store that parse passes read from and loads merge into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvStore {
    kind: StoreKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreKind {
    /// The current process environment.
    ///
    /// Writes go through [`std::env::set_var`], which mutates global process
    /// state and is not thread-safe for concurrent environment access.
    Process,
    /// An in-memory map owned by the caller.
    Memory(BTreeMap<String, String>),
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl EnvStore {
    /// Create a process-environment store.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other threads concurrently read or write the
    /// process environment for the duration of operations that may mutate this
    /// store.
    pub unsafe fn process() -> Self {
        Self {
            kind: StoreKind::Process,
        }
    }

    /// Create an empty in-memory store.
    ///
    /// Use this to avoid mutating the process environment.
    pub fn memory() -> Self {
        Self::from_memory(BTreeMap::new())
    }

    /// Create an in-memory store from an existing map.
    pub fn from_memory(map: BTreeMap<String, String>) -> Self {
        Self {
            kind: StoreKind::Memory(map),
        }
    }

    pub fn as_memory(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            StoreKind::Memory(map) => Some(map),
            StoreKind::Process => None,
        }
    }

    pub fn as_memory_mut(&mut self) -> Option<&mut BTreeMap<String, String>> {
        match &mut self.kind {
            StoreKind::Memory(map) => Some(map),
            StoreKind::Process => None,
        }
    }

    /// Crate-internal process-backed store, behind the convenience loaders
    /// and the top-level parse functions' expansion fallback. Writes through
    /// it carry the same caveat as [`EnvStore::process`]: callers must not
    /// touch the process environment concurrently.
    pub(crate) fn process_store() -> Self {
        Self {
            kind: StoreKind::Process,
        }
    }

    /// Look up a value by name.
    pub fn get(&self, key: &str) -> Option<String> {
        match &self.kind {
            StoreKind::Process => {
                std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
            }
            StoreKind::Memory(map) => map.get(key).cloned(),
        }
    }

    /// Whether a key holds a non-empty value. Absent and empty both count as
    /// unset for override decisions.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_empty())
    }

    /// Write a value by name.
    pub fn set(&mut self, key: &str, value: &str) {
        match &mut self.kind {
            StoreKind::Process => unsafe { std::env::set_var(key, value) },
            StoreKind::Memory(map) => {
                map.insert(key.to_owned(), value.to_owned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EnvStore;

    #[test]
    fn memory_store_roundtrips_values() {
        let mut store = EnvStore::memory();
        assert_eq!(store.get("KEY"), None);

        store.set("KEY", "value");
        assert_eq!(store.get("KEY").as_deref(), Some("value"));
        assert_eq!(
            store.as_memory().expect("memory store").get("KEY").cloned(),
            Some("value".to_owned())
        );
    }

    #[test]
    fn empty_value_counts_as_unset() {
        let mut store = EnvStore::memory();
        store.set("EMPTY", "");
        store.set("FULL", "x");

        assert!(!store.is_set("EMPTY"));
        assert!(!store.is_set("MISSING"));
        assert!(store.is_set("FULL"));
    }
}
