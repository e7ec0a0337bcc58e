use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::{
    error::{tz::provider::Error as ProviderError, ErrorContext},
    tz::{
        cache::{CacheStats, ZoneCache},
        DirStore, TimeZone, ZoneStore, ZoneTable,
    },
    Error,
};

/// The name of the index resource in a zone store.
const INDEX: &str = "index";

/// Resolves time zone identifiers to time zones.
///
/// Lookups never fail with an error. An identifier that a provider doesn't
/// know about, or one whose backing data can't be loaded, returns `None`.
///
/// Every provider knows about `UTC`.
pub trait Provider: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the time zone for the given identifier, if one exists.
    fn zone(&self, id: &str) -> Option<TimeZone>;

    /// Returns every identifier this provider knows about, whether its zone
    /// has been loaded or not.
    ///
    /// The set returned is a snapshot. It isn't affected by later lookups.
    fn available_ids(&self) -> BTreeSet<String>;
}

/// A provider that only knows about `UTC`.
///
/// This is the provider used when nothing else is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct UtcProvider;

impl Provider for UtcProvider {
    fn zone(&self, id: &str) -> Option<TimeZone> {
        if id.eq_ignore_ascii_case("UTC") {
            Some(TimeZone::UTC)
        } else {
            None
        }
    }

    fn available_ids(&self) -> BTreeSet<String> {
        BTreeSet::from(["UTC".to_string()])
    }
}

/// A hook called when a known zone's backing data can't be loaded.
///
/// It receives the identifier of the zone and the error. The hook is called
/// at most once per identifier, after which the identifier is treated as
/// absent. The default hook logs the error at the `warn` level.
#[derive(Clone)]
pub struct Diagnostic(Arc<dyn Fn(&str, &Error) + Send + Sync + 'static>);

impl Diagnostic {
    /// Wraps the given function as a diagnostic hook.
    pub fn new(
        hook: impl Fn(&str, &Error) + Send + Sync + 'static,
    ) -> Diagnostic {
        Diagnostic(Arc::new(hook))
    }

    fn report(&self, id: &str, err: &Error) {
        (self.0)(id, err)
    }
}

impl Default for Diagnostic {
    fn default() -> Diagnostic {
        Diagnostic::new(|id, err| {
            warn!("zone {id} is unavailable from now on: {err}");
        })
    }
}

impl std::fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("Diagnostic(..)")
    }
}

/// A provider backed by compiled zone tables in a [`ZoneStore`].
///
/// The store must contain a resource named `index` listing the zones and
/// aliases it holds. Each line is either blank, a comment starting with
/// `#`, or one of these directives:
///
/// ```text
/// zone <id> <file>
/// link <alias> <target>
/// ```
///
/// A `zone` line names the resource containing the compiled table for
/// `id`. A `link` line declares `alias` as another name for `target`, which
/// may itself be an alias. Aliases that don't resolve to a zone (or to
/// `UTC`) are dropped when the provider is built.
///
/// Lookups are ASCII case insensitive. The zone returned for an alias
/// carries the identifier of the zone it resolves to.
///
/// # Caching
///
/// A table is read from the store the first time its zone is requested.
/// The zone is then held in a bounded cache, from which it may be evicted
/// (to make room, when its TTL elapses, or by [`TableProvider::clear_cache`]).
/// An evicted zone is reloaded on its next request, and the reloaded table
/// must have the same checksum as the first one loaded. If a table is
/// missing, malformed or has changed, the [`Diagnostic`] hook is called and
/// the identifier is treated as unknown from then on.
///
/// # Example
///
/// ```no_run
/// use calendrical::tz::{Provider, TableProvider};
///
/// let provider = TableProvider::from_dir("/usr/share/calendrical")?;
/// let tz = provider.zone("europe/london").unwrap();
/// assert_eq!(tz.id(), "Europe/London");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct TableProvider {
    store: Arc<dyn ZoneStore>,
    index: Index,
    registry: RwLock<Registry>,
    cache: ZoneCache,
    diagnostic: Diagnostic,
}

/// Load state that outlives cache entries.
#[derive(Debug, Default)]
struct Registry {
    /// The checksum of the first successfully loaded table for each zone.
    checksums: BTreeMap<usize, u32>,
    /// Zones whose data failed to load. These are never retried.
    absent: BTreeSet<usize>,
}

impl TableProvider {
    /// Returns a provider reading from the given directory with default
    /// settings.
    ///
    /// # Errors
    ///
    /// This returns an error if the directory's index can't be read or is
    /// malformed.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Result<TableProvider, Error> {
        TableProvider::builder().build_from_dir(dir)
    }

    /// Returns a provider reading from the given store with default
    /// settings.
    ///
    /// # Errors
    ///
    /// This returns an error if the store's index can't be read or is
    /// malformed.
    pub fn from_store(
        store: Arc<dyn ZoneStore>,
    ) -> Result<TableProvider, Error> {
        TableProvider::builder().build(store)
    }

    /// Returns a builder for configuring a provider's cache and diagnostic
    /// hook.
    pub fn builder() -> TableProviderBuilder {
        TableProviderBuilder::new()
    }

    /// Evicts every loaded zone from the cache.
    ///
    /// Subsequent lookups reload zones from the store. Identifiers that
    /// previously failed to load stay absent.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Returns counters describing how the cache has been used.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn load(&self, i: usize) -> Option<TimeZone> {
        if self.registry().absent.contains(&i) {
            return None;
        }
        if let Some(tz) = self.cache.get(i) {
            return Some(tz);
        }
        // The store is read without holding any lock. Two threads may load
        // the same table here, but both must produce a table with the
        // recorded checksum, and the cache keeps only the first published.
        let entry = &self.index.zones[i];
        let result = self
            .read_table(entry)
            .and_then(|table| self.verify_checksum(i, table))
            .with_context(|| ProviderError::load(&entry.id));
        match result {
            Ok(table) => Some(self.cache.insert(i, TimeZone::table(table))),
            Err(err) => {
                self.mark_absent(i, &err);
                None
            }
        }
    }

    fn read_table(&self, entry: &IndexZone) -> Result<ZoneTable, Error> {
        trace!("loading zone {} from resource {}", entry.id, entry.file);
        let data = self.store.read(&entry.file)?;
        ZoneTable::parse(Some(&entry.id), &data)
    }

    fn verify_checksum(
        &self,
        i: usize,
        table: ZoneTable,
    ) -> Result<ZoneTable, Error> {
        let found = table.checksum();
        let mut registry = self.registry_mut();
        let expected = *registry.checksums.entry(i).or_insert(found);
        drop(registry);
        if expected != found {
            let id = self.index.zones[i].id.clone();
            return Err(Error::from(ProviderError::ChecksumChanged {
                id,
                expected,
                found,
            }));
        }
        Ok(table)
    }

    fn mark_absent(&self, i: usize, err: &Error) {
        // Only the thread that flips the state reports, so the hook sees
        // each identifier at most once.
        if self.registry_mut().absent.insert(i) {
            self.diagnostic.report(&self.index.zones[i].id, err);
        }
    }

    fn registry(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(|err| err.into_inner())
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(|err| err.into_inner())
    }
}

impl Provider for TableProvider {
    fn zone(&self, id: &str) -> Option<TimeZone> {
        match self.index.resolve(id)? {
            Target::Utc => Some(TimeZone::UTC),
            Target::Zone(i) => self.load(i),
        }
    }

    fn available_ids(&self) -> BTreeSet<String> {
        let mut ids: BTreeSet<String> = self
            .index
            .names
            .values()
            .map(|name| name.id.to_string())
            .collect();
        ids.insert("UTC".to_string());
        ids
    }
}

/// A builder for a [`TableProvider`].
///
/// # Example
///
/// ```
/// use std::{sync::{Arc, Mutex}, time::Duration};
///
/// use calendrical::tz::{Diagnostic, MemoryStore, Provider, TableProvider};
///
/// let store = MemoryStore::new();
/// store.insert("index", b"zone Broken/Zone broken.cztf\n".to_vec());
/// store.insert("broken.cztf", b"garbage".to_vec());
///
/// let reported = Arc::new(Mutex::new(vec![]));
/// let sink = Arc::clone(&reported);
/// let provider = TableProvider::builder()
///     .capacity(16)
///     .ttl(Some(Duration::from_secs(60)))
///     .diagnostic(Diagnostic::new(move |id, _err| {
///         sink.lock().unwrap().push(id.to_string());
///     }))
///     .build(Arc::new(store))?;
///
/// assert!(provider.zone("Broken/Zone").is_none());
/// assert!(provider.zone("Broken/Zone").is_none());
/// assert_eq!(*reported.lock().unwrap(), vec!["Broken/Zone".to_string()]);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct TableProviderBuilder {
    capacity: usize,
    ttl: Option<Duration>,
    diagnostic: Diagnostic,
}

impl TableProviderBuilder {
    fn new() -> TableProviderBuilder {
        TableProviderBuilder {
            capacity: ZoneCache::DEFAULT_CAPACITY,
            ttl: None,
            diagnostic: Diagnostic::default(),
        }
    }

    /// Sets the maximum number of zones held in the cache at once.
    ///
    /// When full, the least recently used zone is evicted. A capacity of
    /// zero is treated as one. The default is 64.
    pub fn capacity(&mut self, capacity: usize) -> &mut TableProviderBuilder {
        self.capacity = capacity;
        self
    }

    /// Sets how long a loaded zone stays in the cache before it is reloaded.
    ///
    /// By default, zones never expire and are only evicted to make room.
    pub fn ttl(&mut self, ttl: Option<Duration>) -> &mut TableProviderBuilder {
        self.ttl = ttl;
        self
    }

    /// Sets the hook called when a known zone fails to load.
    pub fn diagnostic(
        &mut self,
        diagnostic: Diagnostic,
    ) -> &mut TableProviderBuilder {
        self.diagnostic = diagnostic;
        self
    }

    /// Builds a provider reading from the given directory.
    pub fn build_from_dir(
        &self,
        dir: impl Into<PathBuf>,
    ) -> Result<TableProvider, Error> {
        self.build(Arc::new(DirStore::new(dir)))
    }

    /// Builds a provider reading from the given store.
    ///
    /// The store's index is read and validated immediately. Zone tables are
    /// read lazily.
    pub fn build(
        &self,
        store: Arc<dyn ZoneStore>,
    ) -> Result<TableProvider, Error> {
        let index = Index::parse(&store.read(INDEX)?)?;
        debug!(
            "built zone provider over {store:?} with {} zones and {} aliases",
            index.zones.len(),
            index.names.len() - index.zones.len(),
        );
        Ok(TableProvider {
            store,
            index,
            registry: RwLock::new(Registry::default()),
            cache: ZoneCache::new(self.capacity, self.ttl),
            diagnostic: self.diagnostic.clone(),
        })
    }
}

/// The parsed and resolved contents of a provider index.
#[derive(Debug)]
struct Index {
    /// Every zone declared by a `zone` line, in declaration order.
    zones: Vec<IndexZone>,
    /// Every usable identifier, keyed by its ASCII lowercase form.
    names: BTreeMap<String, IndexName>,
}

#[derive(Debug)]
struct IndexZone {
    id: Box<str>,
    file: Box<str>,
}

#[derive(Debug)]
struct IndexName {
    /// The identifier as written in the index.
    id: Box<str>,
    target: Target,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Target {
    Utc,
    Zone(usize),
}

impl Index {
    fn parse(data: &[u8]) -> Result<Index, Error> {
        let text = std::str::from_utf8(data)
            .map_err(|_| ProviderError::IndexInvalidUtf8)?;
        let mut zones = vec![];
        let mut names = BTreeMap::new();
        // Aliases in declaration order: (alias, target).
        let mut links: Vec<(Box<str>, Box<str>)> = vec![];
        let mut declared = BTreeSet::new();
        for (i, line) in text.lines().enumerate() {
            let line_number = i + 1;
            let line = line.split('#').next().unwrap_or("");
            let mut fields = line.split_whitespace();
            let Some(directive) = fields.next() else { continue };
            let mut next = |what: &'static str| {
                fields.next().ok_or(ProviderError::IndexMissingField {
                    line: line_number,
                    what,
                })
            };
            let (id, second) = match directive {
                "zone" => (next("zone identifier")?, next("file name")?),
                "link" => (next("alias")?, next("link target")?),
                _ => {
                    return Err(Error::from(
                        ProviderError::IndexUnknownDirective {
                            line: line_number,
                            directive: directive.into(),
                        },
                    ))
                }
            };
            if fields.next().is_some() {
                return Err(Error::from(ProviderError::IndexExtraField {
                    line: line_number,
                }));
            }
            if !declared.insert(id.to_ascii_lowercase()) {
                return Err(Error::from(ProviderError::IndexDuplicate {
                    line: line_number,
                    id: id.into(),
                }));
            }
            if directive == "link" {
                links.push((id.into(), second.into()));
                continue;
            }
            if !is_relative_file_name(second) {
                return Err(Error::from(ProviderError::IndexInvalidFile {
                    line: line_number,
                    file: second.into(),
                }));
            }
            if id.eq_ignore_ascii_case("UTC") {
                warn!(
                    "zone index line {line_number}: ignoring table for \
                     reserved identifier {id}",
                );
                continue;
            }
            let target = Target::Zone(zones.len());
            zones.push(IndexZone { id: id.into(), file: second.into() });
            names.insert(
                id.to_ascii_lowercase(),
                IndexName { id: id.into(), target },
            );
        }

        let links_by_key: BTreeMap<String, &str> = links
            .iter()
            .map(|(alias, target)| (alias.to_ascii_lowercase(), &**target))
            .collect();
        for (alias, _) in links.iter() {
            match resolve_link(alias, &names, &links_by_key) {
                Ok(target) => {
                    names.insert(
                        alias.to_ascii_lowercase(),
                        IndexName { id: alias.clone(), target },
                    );
                }
                Err(_why) => {
                    warn!("dropping zone alias {alias}: {_why}");
                }
            }
        }
        Ok(Index { zones, names })
    }

    fn resolve(&self, id: &str) -> Option<Target> {
        if id.eq_ignore_ascii_case("UTC") {
            return Some(Target::Utc);
        }
        self.names.get(&id.to_ascii_lowercase()).map(|name| name.target)
    }
}

/// Follows a chain of aliases until it reaches a zone or `UTC`.
///
/// The error describes why the chain doesn't resolve. It's only used for
/// logging.
fn resolve_link(
    alias: &str,
    zones: &BTreeMap<String, IndexName>,
    links: &BTreeMap<String, &str>,
) -> Result<Target, String> {
    let mut seen = BTreeSet::new();
    let mut key = alias.to_ascii_lowercase();
    loop {
        if !seen.insert(key.clone()) {
            return Err(format!("alias chain through {key} is cyclic"));
        }
        if let Some(&target) = links.get(&key) {
            if target.eq_ignore_ascii_case("UTC") {
                return Ok(Target::Utc);
            }
            key = target.to_ascii_lowercase();
            continue;
        }
        return match zones.get(&key) {
            Some(name) => Ok(name.target),
            None => Err(format!("target {key} does not exist")),
        };
    }
}

/// Whether the given index file name stays inside its store.
fn is_relative_file_name(name: &str) -> bool {
    !name.starts_with('/')
        && !name.starts_with('\\')
        && name.split(['/', '\\']).all(|part| part != "..")
}
