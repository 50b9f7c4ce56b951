use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Instant;

use fxhash::FxHashSet;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::core::classification::Classification;
use crate::core::types::{Algorithm, ClassificationId, MapType};
use crate::index::synonyms::SynonymIndex;
use crate::index::{AccessionIndex, IndexKind, LoadError};
use crate::mapping::options::ResolverOptions;
use crate::resolve::resolver::HeaderResolver;
use crate::utils::cancel::CancelToken;

/// Outcome of a successful [`MapRegistry::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The map type was already loaded and `reload` was false
    AlreadyLoaded,
    /// A new backend was constructed and activated
    Loaded,
}

#[derive(Debug, Clone)]
enum LoadedMap {
    Accession(Arc<AccessionIndex>),
    Synonyms(Arc<SynonymIndex>),
}

#[derive(Debug)]
struct RegistryState {
    closed: bool,
    maps: BTreeMap<MapType, LoadedMap>,
    active: BTreeSet<MapType>,
    options: ResolverOptions,
    disabled: Arc<FxHashSet<ClassificationId>>,
}

impl RegistryState {
    fn is_active_and_loaded(&self, map_type: MapType) -> bool {
        self.active.contains(&map_type) && self.maps.contains_key(&map_type)
    }
}

/// Per-classification registry of lookup sources and resolution options.
///
/// Loads are serialized by a single-writer lock and only become visible once
/// the new backend is fully constructed. Resolvers never read the registry
/// directly: [`MapRegistry::create_resolver`] hands each one a private
/// [`RegistrySnapshot`], and when the accession backend is an embedded
/// database that snapshot owns its own freshly opened handle.
#[derive(Debug)]
pub struct MapRegistry {
    classification: Classification,
    state: RwLock<RegistryState>,
    load_lock: Mutex<()>,
    parse_warnings: Arc<AtomicUsize>,
}

impl MapRegistry {
    pub fn new(classification: Classification, options: ResolverOptions) -> Self {
        let disabled = Arc::new(options.disabled_ids.iter().copied().collect());
        Self {
            classification,
            state: RwLock::new(RegistryState {
                closed: false,
                maps: BTreeMap::new(),
                active: BTreeSet::new(),
                options,
                disabled,
            }),
            load_lock: Mutex::new(()),
            parse_warnings: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Registry with the classification's default options
    pub fn with_defaults(classification: Classification) -> Self {
        let options = ResolverOptions::for_classification(&classification.name);
        Self::new(classification, options)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.classification.name
    }

    #[must_use]
    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Load a map type from a source file.
    ///
    /// If the map type is loaded and `reload` is false this is a no-op.
    /// Otherwise any previously held backend is released, the new backend is
    /// constructed and, on success, marked loaded and active. On failure the
    /// error is logged and returned, and the map type is left not loaded.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Closed` after [`MapRegistry::close`],
    /// `LoadError::UnsupportedFormat` when an `EmbeddedDb` source is not a
    /// database file, `LoadError::Canceled` if the token fires, and any
    /// backend construction error.
    pub fn load(
        &self,
        map_type: MapType,
        source: &Path,
        reload: bool,
        cancel: &CancelToken,
    ) -> Result<LoadStatus, LoadError> {
        let _guard = self.load_lock.lock();
        {
            let mut state = self.state.write();
            if state.closed {
                return Err(LoadError::Closed(self.name().to_string()));
            }
            if state.maps.contains_key(&map_type) {
                if !reload {
                    return Ok(LoadStatus::AlreadyLoaded);
                }
                state.maps.remove(&map_type);
                state.active.remove(&map_type);
                debug!("Released {map_type} map of {}", self.name());
            }
        }

        let start = Instant::now();
        let map = match self.construct(map_type, source, cancel) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    "Failed to load {map_type} map of {} from {}: {e}",
                    self.name(),
                    source.display()
                );
                return Err(e);
            }
        };

        let mut state = self.state.write();
        if state.closed {
            return Err(LoadError::Closed(self.name().to_string()));
        }
        state.maps.insert(map_type, map);
        state.active.insert(map_type);
        info!(
            "Loaded {map_type} map of {} from {} in {:.1}s",
            self.name(),
            source.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(LoadStatus::Loaded)
    }

    fn construct(
        &self,
        map_type: MapType,
        source: &Path,
        cancel: &CancelToken,
    ) -> Result<LoadedMap, LoadError> {
        match map_type {
            MapType::Synonyms => Ok(LoadedMap::Synonyms(Arc::new(SynonymIndex::load(
                source, cancel,
            )?))),
            MapType::Accession => Ok(LoadedMap::Accession(Arc::new(AccessionIndex::open(
                source,
                self.name(),
                cancel,
            )?))),
            MapType::EmbeddedDb => {
                if IndexKind::detect(source) != IndexKind::Embedded {
                    return Err(LoadError::UnsupportedFormat {
                        map_type: map_type.to_string(),
                        path: source.display().to_string(),
                    });
                }
                Ok(LoadedMap::Accession(Arc::new(AccessionIndex::open(
                    source,
                    self.name(),
                    cancel,
                )?)))
            }
        }
    }

    /// Install an already-built accession backend, replacing any previous
    /// one, and activate it.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Closed` after close, and
    /// `LoadError::WrongMapType` for `MapType::Synonyms` or for an
    /// `EmbeddedDb` map type whose backend is not an embedded database.
    pub fn install_accessions(
        &self,
        map_type: MapType,
        index: AccessionIndex,
    ) -> Result<(), LoadError> {
        let compatible = match map_type {
            MapType::Accession => true,
            MapType::EmbeddedDb => index.is_embedded(),
            MapType::Synonyms => false,
        };
        if !compatible {
            return Err(LoadError::WrongMapType {
                map_type: map_type.to_string(),
                backend: format!("{:?}", index.kind()),
            });
        }
        self.install(map_type, LoadedMap::Accession(Arc::new(index)))
    }

    /// Install an already-built synonym index and activate it
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Closed` after close.
    pub fn install_synonyms(&self, index: SynonymIndex) -> Result<(), LoadError> {
        self.install(MapType::Synonyms, LoadedMap::Synonyms(Arc::new(index)))
    }

    fn install(&self, map_type: MapType, map: LoadedMap) -> Result<(), LoadError> {
        let _guard = self.load_lock.lock();
        let mut state = self.state.write();
        if state.closed {
            return Err(LoadError::Closed(self.name().to_string()));
        }
        state.maps.insert(map_type, map);
        state.active.insert(map_type);
        debug!("Installed {map_type} map of {}", self.name());
        Ok(())
    }

    /// Toggle use of a map type without unloading it. Activating a map type
    /// that is not loaded is ignored. Returns whether the map type is now in
    /// the requested state.
    pub fn set_active(&self, map_type: MapType, active: bool) -> bool {
        let mut state = self.state.write();
        if active {
            if !state.maps.contains_key(&map_type) {
                debug!("Ignoring activation of unloaded {map_type} map of {}", self.name());
                return false;
            }
            state.active.insert(map_type);
        } else {
            state.active.remove(&map_type);
        }
        true
    }

    #[must_use]
    pub fn is_loaded(&self, map_type: MapType) -> bool {
        self.state.read().maps.contains_key(&map_type)
    }

    /// True iff the map type is both loaded and active
    #[must_use]
    pub fn is_active_map(&self, map_type: MapType) -> bool {
        self.state.read().is_active_and_loaded(map_type)
    }

    /// True iff at least one map type is both loaded and active
    #[must_use]
    pub fn has_active_and_loaded(&self) -> bool {
        let state = self.state.read();
        MapType::ALL
            .iter()
            .any(|&map_type| state.is_active_and_loaded(map_type))
    }

    #[must_use]
    pub fn disabled_ids(&self) -> BTreeSet<ClassificationId> {
        self.state.read().options.disabled_ids.clone()
    }

    pub fn set_disabled_ids(&self, ids: BTreeSet<ClassificationId>) {
        let mut state = self.state.write();
        state.disabled = Arc::new(ids.iter().copied().collect());
        state.options.disabled_ids = ids;
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.state.read().options.algorithm
    }

    pub fn set_algorithm(&self, algorithm: Algorithm) {
        self.state.write().options.algorithm = algorithm;
    }

    pub fn set_use_text_parsing(&self, use_text_parsing: bool) {
        self.state.write().options.use_text_parsing = use_text_parsing;
    }

    #[must_use]
    pub fn options(&self) -> ResolverOptions {
        self.state.read().options.clone()
    }

    /// Replace all options at once
    pub fn set_options(&self, options: ResolverOptions) {
        let mut state = self.state.write();
        state.disabled = Arc::new(options.disabled_ids.iter().copied().collect());
        state.options = options;
    }

    /// Release all backends. The registry cannot be used afterwards.
    pub fn close(&self) {
        let _guard = self.load_lock.lock();
        let mut state = self.state.write();
        state.closed = true;
        state.maps.clear();
        state.active.clear();
        debug!("Closed registry of {}", self.name());
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    /// Take a private copy of the registry's current configuration.
    ///
    /// Shareable backends are shared by `Arc`. An embedded database backend
    /// is reopened, so the snapshot owns its handle and releases it on drop.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Closed` after close, or a database error if the
    /// embedded database cannot be reopened.
    pub fn snapshot(&self) -> Result<RegistrySnapshot, LoadError> {
        let state = self.state.read();
        if state.closed {
            return Err(LoadError::Closed(self.name().to_string()));
        }

        let mut accession_maps = Vec::new();
        let mut synonyms = None;
        for (&map_type, map) in &state.maps {
            if !state.active.contains(&map_type) {
                continue;
            }
            match map {
                LoadedMap::Accession(index) => match index.reopen_embedded()? {
                    Some(own) => accession_maps.push(Arc::new(own)),
                    None => accession_maps.push(Arc::clone(index)),
                },
                LoadedMap::Synonyms(index) => synonyms = Some(Arc::clone(index)),
            }
        }

        Ok(RegistrySnapshot {
            classification: self.classification.clone(),
            options: state.options.clone(),
            disabled: Arc::clone(&state.disabled),
            accession_maps,
            synonyms,
            parse_warnings: Arc::clone(&self.parse_warnings),
        })
    }

    /// Create a resolver bound to a private snapshot of this registry
    ///
    /// # Errors
    ///
    /// See [`MapRegistry::snapshot`].
    pub fn create_resolver(&self) -> Result<HeaderResolver, LoadError> {
        Ok(HeaderResolver::new(self.snapshot()?))
    }
}

/// A resolver's private copy of a registry: the classification, options,
/// disabled ids and the active, loaded backends at the time it was taken.
#[derive(Debug)]
pub struct RegistrySnapshot {
    pub(crate) classification: Classification,
    pub(crate) options: ResolverOptions,
    pub(crate) disabled: Arc<FxHashSet<ClassificationId>>,
    /// Accession backends in map type order (`Accession` before `EmbeddedDb`)
    pub(crate) accession_maps: Vec<Arc<AccessionIndex>>,
    pub(crate) synonyms: Option<Arc<SynonymIndex>>,
    pub(crate) parse_warnings: Arc<AtomicUsize>,
}

impl RegistrySnapshot {
    #[must_use]
    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    #[must_use]
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Number of accession backends owned or shared by this snapshot
    #[must_use]
    pub fn accession_map_count(&self) -> usize {
        self.accession_maps.len()
    }

    #[must_use]
    pub fn has_synonyms(&self) -> bool {
        self.synonyms.is_some()
    }
}

/// Registries of all classifications, keyed by name. Owned by the
/// application's composition root and passed to whoever needs a registry.
#[derive(Debug, Default)]
pub struct Registries {
    registries: BTreeMap<String, Arc<MapRegistry>>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registry, replacing (and closing) any previous one of the same name
    pub fn insert(&mut self, registry: MapRegistry) -> Arc<MapRegistry> {
        let registry = Arc::new(registry);
        if let Some(previous) = self
            .registries
            .insert(registry.name().to_string(), Arc::clone(&registry))
        {
            previous.close();
        }
        registry
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<MapRegistry>> {
        self.registries.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registries.keys().map(String::as_str)
    }

    /// Close every registry
    pub fn close_all(&self) {
        for registry in self.registries.values() {
            registry.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dictionary::NameIdDictionary;
    use crate::core::tree::tests::make_test_tree;
    use crate::index::embedded::EmbeddedDb;
    use crate::index::memory::InMemoryTable;

    fn make_registry(name: &str) -> MapRegistry {
        let classification = Classification::new(name, make_test_tree(), NameIdDictionary::new());
        MapRegistry::with_defaults(classification)
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_state_machine() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "acc.tsv", "AB1\t562\n");
        let registry = make_registry("Taxonomy");
        let cancel = CancelToken::new();

        assert!(!registry.is_loaded(MapType::Accession));
        assert!(!registry.has_active_and_loaded());

        let status = registry.load(MapType::Accession, &path, false, &cancel).unwrap();
        assert_eq!(status, LoadStatus::Loaded);
        assert!(registry.is_loaded(MapType::Accession));
        assert!(registry.is_active_map(MapType::Accession));
        assert!(registry.has_active_and_loaded());

        let status = registry.load(MapType::Accession, &path, false, &cancel).unwrap();
        assert_eq!(status, LoadStatus::AlreadyLoaded);
        let status = registry.load(MapType::Accession, &path, true, &cancel).unwrap();
        assert_eq!(status, LoadStatus::Loaded);
    }

    #[test]
    fn test_set_active_does_not_unload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "syn.tsv", "E. coli\t562\n");
        let registry = make_registry("Taxonomy");
        registry
            .load(MapType::Synonyms, &path, false, &CancelToken::new())
            .unwrap();

        assert!(registry.set_active(MapType::Synonyms, false));
        assert!(registry.is_loaded(MapType::Synonyms));
        assert!(!registry.is_active_map(MapType::Synonyms));
        assert!(!registry.has_active_and_loaded());
        assert!(!registry.snapshot().unwrap().has_synonyms());

        assert!(registry.set_active(MapType::Synonyms, true));
        assert!(registry.snapshot().unwrap().has_synonyms());

        // Cannot activate what is not loaded
        assert!(!registry.set_active(MapType::Accession, true));
        assert!(!registry.is_active_map(MapType::Accession));
    }

    #[test]
    fn test_failed_load_leaves_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(dir.path(), "acc.tsv", "AB1\t562\n");
        let bad = write_file(dir.path(), "bad.tsv", "AB1 no tab here\n");
        let registry = make_registry("Taxonomy");
        let cancel = CancelToken::new();

        assert!(registry.load(MapType::Accession, &bad, false, &cancel).is_err());
        assert!(!registry.is_loaded(MapType::Accession));

        // Other map types are unaffected, and a retry works
        assert!(registry.load(MapType::Synonyms, &good, false, &cancel).is_ok());
        assert!(registry.load(MapType::Accession, &good, true, &cancel).is_ok());
        assert!(registry.is_loaded(MapType::Accession));

        // A failed reload releases the old backend
        assert!(registry.load(MapType::Accession, &bad, true, &cancel).is_err());
        assert!(!registry.is_loaded(MapType::Accession));
        assert!(registry.is_loaded(MapType::Synonyms));
    }

    #[test]
    fn test_canceled_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "acc.tsv", "AB1\t562\n");
        let registry = make_registry("Taxonomy");
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = registry.load(MapType::Accession, &path, false, &cancel);
        assert!(matches!(result, Err(LoadError::Canceled)));
        assert!(!registry.is_loaded(MapType::Accession));
    }

    #[test]
    fn test_embedded_map_type_requires_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "acc.tsv", "AB1\t562\n");
        let registry = make_registry("Taxonomy");

        let result = registry.load(MapType::EmbeddedDb, &path, false, &CancelToken::new());
        assert!(matches!(result, Err(LoadError::UnsupportedFormat { .. })));

        let table: InMemoryTable = vec![("AB1".to_string(), 562)].into_iter().collect();
        let result = registry.install_accessions(MapType::EmbeddedDb, AccessionIndex::InMemory(table));
        assert!(matches!(result, Err(LoadError::WrongMapType { .. })));
    }

    #[test]
    fn test_resolvers_get_private_embedded_handles() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = write_file(dir.path(), "acc.tsv", "AB1\t562\n");
        let db = dir.path().join("mapping.db");
        EmbeddedDb::write_mapping(&db, "Taxonomy", &mapping, &CancelToken::new()).unwrap();

        let registry = make_registry("Taxonomy");
        registry
            .load(MapType::EmbeddedDb, &db, false, &CancelToken::new())
            .unwrap();

        let first = registry.snapshot().unwrap();
        let second = registry.snapshot().unwrap();
        assert_eq!(first.accession_map_count(), 1);
        // Each snapshot holds the only reference to its own handle
        assert_eq!(Arc::strong_count(&first.accession_maps[0]), 1);
        assert_eq!(Arc::strong_count(&second.accession_maps[0]), 1);
        assert!(!Arc::ptr_eq(&first.accession_maps[0], &second.accession_maps[0]));
    }

    #[test]
    fn test_shareable_backends_are_shared() {
        let registry = make_registry("Taxonomy");
        let table: InMemoryTable = vec![("AB1".to_string(), 562)].into_iter().collect();
        registry
            .install_accessions(MapType::Accession, AccessionIndex::InMemory(table))
            .unwrap();

        let first = registry.snapshot().unwrap();
        let second = registry.snapshot().unwrap();
        assert!(Arc::ptr_eq(&first.accession_maps[0], &second.accession_maps[0]));
    }

    #[test]
    fn test_options_and_disabled_ids() {
        let registry = make_registry("Taxonomy");
        assert_eq!(registry.algorithm(), Algorithm::FirstHit);
        registry.set_algorithm(Algorithm::Lca);
        registry.set_disabled_ids(BTreeSet::from([42]));

        assert_eq!(registry.algorithm(), Algorithm::Lca);
        assert_eq!(registry.disabled_ids(), BTreeSet::from([42]));
        let snapshot = registry.snapshot().unwrap();
        assert!(snapshot.disabled.contains(&42));
        assert_eq!(snapshot.options().algorithm, Algorithm::Lca);
    }

    #[test]
    fn test_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "acc.tsv", "AB1\t562\n");
        let registry = make_registry("Taxonomy");
        let cancel = CancelToken::new();
        registry.load(MapType::Accession, &path, false, &cancel).unwrap();

        registry.close();
        assert!(registry.is_closed());
        assert!(!registry.is_loaded(MapType::Accession));
        assert!(matches!(
            registry.load(MapType::Accession, &path, false, &cancel),
            Err(LoadError::Closed(_))
        ));
        assert!(matches!(registry.create_resolver(), Err(LoadError::Closed(_))));
    }

    #[test]
    fn test_registries_container() {
        let mut registries = Registries::new();
        registries.insert(make_registry("Taxonomy"));
        let first_kegg = registries.insert(make_registry("KEGG"));
        let names: Vec<&str> = registries.names().collect();
        assert_eq!(names, vec!["KEGG", "Taxonomy"]);

        assert!(registries.get("Taxonomy").is_some());
        assert!(registries.get("SEED").is_none());

        registries.insert(make_registry("KEGG"));
        assert!(first_kegg.is_closed());

        registries.close_all();
        assert!(registries.get("Taxonomy").unwrap().is_closed());
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MapRegistry>();
        assert_send_sync::<Registries>();
    }
}
