use crate::collection::Collection;
use crate::config::Config;
use crate::constant::LOCK_SUFFIX;
use crate::document::Document;
use crate::error::{CollectionError, DatabaseError};
use crate::wal::{Record, WalManager};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};
use tracing::{debug, warn};
use uuid::Uuid;

static DATABASE_REGISTRY: LazyLock<Mutex<DatabaseRegistry>> =
    LazyLock::new(|| Mutex::new(DatabaseRegistry::new()));

static SYNC_TO_DISK: AtomicBool = AtomicBool::new(true);

/// Turns `fsync` after every log write on or off for the whole process.
pub fn set_sync_to_disk(enabled: bool) {
    SYNC_TO_DISK.store(enabled, Ordering::SeqCst);
}

pub fn sync_to_disk() -> bool {
    SYNC_TO_DISK.load(Ordering::SeqCst)
}

/// True while any thread holds a live handle for `path`.
pub fn is_cached(path: &Path) -> bool {
    let path = absolute(path).unwrap_or_else(|_| path.to_path_buf());
    lock_registry().has_handle(&path)
}

pub fn cached_paths() -> Vec<PathBuf> {
    let mut registry = lock_registry();
    registry.prune();
    let mut paths: Vec<PathBuf> = registry.handles.keys().map(|(p, _)| p.clone()).collect();
    paths.sort();
    paths.dedup();
    paths
}

/// Closes every open storage and forgets every cached handle.
///
/// Handles that are still referenced afterwards fail every operation with
/// [`DatabaseError::Invalidated`].
pub fn reset_for_testing() {
    let mut registry = lock_registry();
    let mut closed = 0;
    for storage in registry.storages.values().filter_map(Weak::upgrade) {
        storage.invalidate();
        closed += 1;
    }
    registry.storages.clear();
    registry.handles.clear();
    debug!(closed, "reset engine state");
}

fn lock_registry() -> MutexGuard<'static, DatabaseRegistry> {
    DATABASE_REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn absolute(path: &Path) -> Result<PathBuf, DatabaseError> {
    std::path::absolute(path)
        .map_err(|e| DatabaseError::InvalidPath(format!("{}: {}", path.display(), e)))
}

struct StorageState {
    wal: WalManager,
    collections: HashMap<String, Collection>,
    _lock_file: File, // process lock
}

/// State shared by every thread's handle on one path. `None` once invalidated.
struct Storage {
    state: Mutex<Option<StorageState>>,
}

impl Storage {
    fn open(path: &Path) -> Result<Self, DatabaseError> {
        let lock_file = validate_path(path)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| DatabaseError::Locked(path.to_path_buf()))?;

        let mut collections = HashMap::new();
        if path.exists() {
            let records = WalManager::read(path)?;
            debug!(path = %path.display(), records = records.len(), "replaying log");
            for record in records {
                if let Err(err) = apply(&mut collections, record) {
                    warn!(path = %path.display(), %err, "skipping unreplayable record");
                }
            }
        }

        Ok(Storage {
            state: Mutex::new(Some(StorageState {
                wal: WalManager::open(path)?,
                collections,
                _lock_file: lock_file,
            })),
        })
    }

    fn invalidate(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

fn apply(
    collections: &mut HashMap<String, Collection>,
    record: Record,
) -> Result<(), CollectionError> {
    match record {
        Record::CreateCollection {
            name,
            dimension,
            distance,
        } => {
            let collection = Collection::new(dimension, &distance)?;
            collections.insert(name, collection);
        }
        Record::Upsert {
            collection,
            document,
        } => {
            collections
                .get_mut(&collection)
                .ok_or(CollectionError::NotFound(collection))?
                .upsert(document)?;
        }
        Record::Delete { collection, id } => {
            collections
                .get_mut(&collection)
                .ok_or(CollectionError::NotFound(collection))?
                .delete(&id);
        }
    }
    Ok(())
}

/// A thread-confined handle on one database file.
pub struct AetherDB {
    path: PathBuf,
    owner: ThreadId,
    closed: AtomicBool,
    storage: Arc<Storage>,
}

/// Carries a database to another thread; resolve it there to get that thread's handle.
#[derive(Debug, Clone)]
pub struct Handover {
    config: Config,
}

impl Handover {
    pub fn resolve(self) -> Result<Arc<AetherDB>, DatabaseError> {
        AetherDB::open(&self.config)
    }
}

impl AetherDB {
    pub fn open(config: &Config) -> Result<Arc<Self>, DatabaseError> {
        let path = absolute(config.path())?;
        let owner = thread::current().id();

        let mut registry = lock_registry();
        if let Some(db) = registry
            .handles
            .get(&(path.clone(), owner))
            .and_then(Weak::upgrade)
        {
            return Ok(db);
        }

        let storage = match registry.storages.get(&path).and_then(Weak::upgrade) {
            Some(storage) => storage,
            None => {
                let storage = Arc::new(Storage::open(&path)?);
                registry
                    .storages
                    .insert(path.clone(), Arc::downgrade(&storage));
                storage
            }
        };

        let db = Arc::new(AetherDB {
            path: path.clone(),
            owner,
            closed: AtomicBool::new(false),
            storage,
        });
        registry.handles.insert((path, owner), Arc::downgrade(&db));
        debug!(path = %db.path.display(), "opened database");

        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn handover(&self) -> Result<Handover, DatabaseError> {
        self.with_state(|_| {
            Ok(Handover {
                config: Config::new(self.path.clone()),
            })
        })
    }

    /// Drops this thread's cached handle; the file is released once no thread holds it.
    ///
    /// A handle left over from before [`reset_for_testing`] owns no registry
    /// entry, so closing it leaves newer handles on the same path alone.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut registry = lock_registry();
        let key = (self.path.clone(), self.owner);
        if registry
            .handles
            .get(&key)
            .is_some_and(|handle| std::ptr::eq(handle.as_ptr(), self))
        {
            registry.handles.remove(&key);
        }

        let owns_storage = registry
            .storages
            .get(&self.path)
            .is_some_and(|storage| std::ptr::eq(storage.as_ptr(), Arc::as_ptr(&self.storage)));
        if owns_storage && !registry.has_handle(&self.path) {
            registry.storages.remove(&self.path);
            self.storage.invalidate();
        }
        debug!(path = %self.path.display(), "closed database");
    }

    pub fn create_collection(
        &self,
        name: &str,
        dimension: i32,
        distance: &str,
    ) -> Result<(), DatabaseError> {
        self.with_state(|state| {
            if state.collections.contains_key(name) {
                return Err(CollectionError::AlreadyExists(name.to_string()).into());
            }
            let collection = Collection::new(dimension, distance)?;
            state.wal.write(&Record::CreateCollection {
                name: name.to_string(),
                dimension,
                distance: distance.to_string(),
            })?;
            state.collections.insert(name.to_string(), collection);
            Ok(())
        })
    }

    pub fn upsert(&self, collection: &str, document: Document) -> Result<(), DatabaseError> {
        self.with_state(|state| {
            let target = get_mut(&mut state.collections, collection)?;
            target.validate(&document)?;
            state.wal.write(&Record::Upsert {
                collection: collection.to_string(),
                document: document.clone(),
            })?;
            target.upsert(document)?;
            Ok(())
        })
    }

    pub fn fetch(&self, collection: &str, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
        self.with_state(|state| {
            Ok(get_mut(&mut state.collections, collection)?
                .fetch(id)
                .cloned())
        })
    }

    pub fn delete(&self, collection: &str, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
        self.with_state(|state| {
            let target = get_mut(&mut state.collections, collection)?;
            if target.fetch(id).is_none() {
                return Ok(None);
            }
            state.wal.write(&Record::Delete {
                collection: collection.to_string(),
                id: *id,
            })?;
            Ok(target.delete(id))
        })
    }

    pub fn collection_names(&self) -> Result<Vec<String>, DatabaseError> {
        self.with_state(|state| {
            let mut names: Vec<String> = state.collections.keys().cloned().collect();
            names.sort();
            Ok(names)
        })
    }

    fn with_state<R>(
        &self,
        f: impl FnOnce(&mut StorageState) -> Result<R, DatabaseError>,
    ) -> Result<R, DatabaseError> {
        if thread::current().id() != self.owner {
            return Err(DatabaseError::WrongThread(self.path.clone()));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(DatabaseError::Invalidated(self.path.clone()));
        }
        let mut guard = self.storage.state.lock()?;
        let state = guard
            .as_mut()
            .ok_or_else(|| DatabaseError::Invalidated(self.path.clone()))?;
        f(state)
    }
}

fn get_mut<'a>(
    collections: &'a mut HashMap<String, Collection>,
    name: &str,
) -> Result<&'a mut Collection, CollectionError> {
    collections
        .get_mut(name)
        .ok_or_else(|| CollectionError::NotFound(name.to_string()))
}

pub fn validate_path(path: &Path) -> Result<File, DatabaseError> {
    if path.is_dir() {
        return Err(DatabaseError::InvalidPath(format!(
            "{} is a directory",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            DatabaseError::InvalidPath(format!("Cannot create directory: {}", e))
        })?;
    }

    let mut lock_path = path.as_os_str().to_owned();
    lock_path.push(".");
    lock_path.push(LOCK_SUFFIX);
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(PathBuf::from(lock_path))
        .map_err(|e| DatabaseError::InvalidPath(format!("Cannot open lock file: {}", e)))?;

    Ok(lock_file)
}

struct DatabaseRegistry {
    storages: HashMap<PathBuf, Weak<Storage>>,
    handles: HashMap<(PathBuf, ThreadId), Weak<AetherDB>>,
}

impl DatabaseRegistry {
    fn new() -> Self {
        DatabaseRegistry {
            storages: HashMap::new(),
            handles: HashMap::new(),
        }
    }

    fn has_handle(&self, path: &Path) -> bool {
        self.handles
            .iter()
            .any(|((p, _), handle)| p == path && handle.strong_count() > 0)
    }

    fn prune(&mut self) {
        self.handles.retain(|_, handle| handle.strong_count() > 0);
        self.storages.retain(|_, storage| storage.strong_count() > 0);
    }
}
