use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

use crate::{error::tz::provider::Error as ProviderError, Error};

/// A backing store of compiled zone tables.
///
/// A store is a flat namespace of named resources. A
/// [`TableProvider`](crate::tz::TableProvider) reads its index from the
/// resource named `index`, and each zone's table from the resource the
/// index names.
pub trait ZoneStore: std::fmt::Debug + Send + Sync + 'static {
    /// Reads the entire contents of the named resource.
    ///
    /// A resource that doesn't exist is an error for which
    /// [`Error::is_zone_resource`](crate::Error::is_zone_resource) returns
    /// `true`.
    fn read(&self, name: &str) -> Result<Vec<u8>, Error>;
}

/// A store backed by a directory on the file system.
///
/// Resource names are relative paths under the directory.
#[derive(Clone, Debug)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Returns a store reading from the given directory.
    ///
    /// The directory isn't accessed until the first read.
    pub fn new(dir: impl Into<PathBuf>) -> DirStore {
        DirStore { dir: dir.into() }
    }

    /// The directory this store reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ZoneStore for DirStore {
    fn read(&self, name: &str) -> Result<Vec<u8>, Error> {
        let path = self.dir.join(name);
        trace!("reading zone resource {}", path.display());
        std::fs::read(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::from(ProviderError::missing_resource(name)).path(path)
            } else {
                Error::io(err).path(path)
            }
        })
    }
}

/// A store backed by memory.
///
/// Resources can be added or replaced at any time, which is mostly useful
/// for tests and for embedding tables in a binary.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use calendrical::tz::{
///     MemoryStore, Provider, TableProvider, ZoneTableBuilder,
/// };
///
/// let table = ZoneTableBuilder::new("Test/Zone", 3_600_000, 3_600_000, "TST")
///     .build()?;
/// let store = MemoryStore::new();
/// store.insert("index", b"zone Test/Zone test.cztf\n".to_vec());
/// store.insert("test.cztf", table.to_bytes());
///
/// let provider = TableProvider::from_store(Arc::new(store))?;
/// let tz = provider.zone("test/zone").unwrap();
/// assert_eq!(tz.id(), "Test/Zone");
/// assert_eq!(tz.offset(0), 3_600_000);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    resources: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Returns an empty store.
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Adds or replaces the named resource.
    pub fn insert(&self, name: &str, data: Vec<u8>) {
        let mut resources =
            self.resources.write().unwrap_or_else(|err| err.into_inner());
        resources.insert(name.to_string(), data);
    }

    /// Removes the named resource, returning whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        let mut resources =
            self.resources.write().unwrap_or_else(|err| err.into_inner());
        resources.remove(name).is_some()
    }
}

impl ZoneStore for MemoryStore {
    fn read(&self, name: &str) -> Result<Vec<u8>, Error> {
        let resources =
            self.resources.read().unwrap_or_else(|err| err.into_inner());
        resources
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::missing_resource(name).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_store() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("a.cztf"), b"abc")?;
        let store = DirStore::new(dir.path());
        assert_eq!(store.read("a.cztf")?, b"abc");

        let err = store.read("missing.cztf").unwrap_err();
        assert!(err.is_zone_resource());
        assert!(err.to_string().contains("missing.cztf"), "{err}");
        Ok(())
    }

    #[test]
    fn memory_store() {
        let store = MemoryStore::new();
        assert!(store.read("x").unwrap_err().is_zone_resource());
        store.insert("x", vec![1, 2]);
        assert_eq!(store.read("x").unwrap(), vec![1, 2]);
        store.insert("x", vec![3]);
        assert_eq!(store.read("x").unwrap(), vec![3]);
        assert!(store.remove("x"));
        assert!(!store.remove("x"));
    }
}
