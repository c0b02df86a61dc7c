use crate::store::error::StoreError;
use crate::types::observation::{Metar, Observation, Observations, Taf};
use crate::types::station::Station;
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tokio::{fs, task};

const STORE_FILE_NAME: &str = "weather_store.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// The keyed collections held by a [`WeatherStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Keyed by station identifier.
    Stations,
    /// Keyed by (station identifier, observation time).
    Metars,
    /// Keyed by (station identifier, validity start).
    Tafs,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionKind::Stations => "stations",
            CollectionKind::Metars => "metars",
            CollectionKind::Tafs => "tafs",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    /// Ascending by row key.
    #[default]
    Key,
    /// Ascending by observation time or validity start. Stations have no
    /// time and are ordered by key.
    Time,
}

/// Rows of a single collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    Stations(Vec<Station>),
    Metars(Vec<Metar>),
    Tafs(Vec<Taf>),
}

impl Rows {
    pub fn kind(&self) -> CollectionKind {
        match self {
            Rows::Stations(_) => CollectionKind::Stations,
            Rows::Metars(_) => CollectionKind::Metars,
            Rows::Tafs(_) => CollectionKind::Tafs,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Rows::Stations(rows) => rows.len(),
            Rows::Metars(rows) => rows.len(),
            Rows::Tafs(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Station>> for Rows {
    fn from(rows: Vec<Station>) -> Self {
        Rows::Stations(rows)
    }
}

impl From<Vec<Metar>> for Rows {
    fn from(rows: Vec<Metar>) -> Self {
        Rows::Metars(rows)
    }
}

impl From<Vec<Taf>> for Rows {
    fn from(rows: Vec<Taf>) -> Self {
        Rows::Tafs(rows)
    }
}

trait Keyed: Clone {
    type Key: Eq + Hash + Ord;

    fn key(&self) -> Self::Key;

    fn time(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl Keyed for Station {
    type Key = String;

    fn key(&self) -> String {
        self.identifier.clone()
    }
}

impl Keyed for Metar {
    type Key = (String, DateTime<Utc>);

    fn key(&self) -> Self::Key {
        (self.identifier.clone(), self.datetime)
    }

    fn time(&self) -> Option<DateTime<Utc>> {
        Some(self.datetime)
    }
}

impl Keyed for Taf {
    type Key = (String, DateTime<Utc>);

    fn key(&self) -> Self::Key {
        (self.identifier.clone(), self.from)
    }

    fn time(&self) -> Option<DateTime<Utc>> {
        Some(self.from)
    }
}

/// Inserts rows, overwriting existing rows with the same key in place.
fn upsert_rows<T: Keyed>(rows: &mut Vec<T>, new_rows: Vec<T>) {
    let mut positions: HashMap<T::Key, usize> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| (row.key(), index))
        .collect();

    for row in new_rows {
        match positions.entry(row.key()) {
            Entry::Occupied(entry) => rows[*entry.get()] = row,
            Entry::Vacant(entry) => {
                entry.insert(rows.len());
                rows.push(row);
            }
        }
    }
}

/// Sorted copy of `rows`. The sort is stable so equal rows keep insertion
/// order.
fn ordered<T: Keyed>(rows: &[T], order: OrderBy) -> Vec<T> {
    let mut rows = rows.to_vec();
    match order {
        OrderBy::Key => rows.sort_by_key(|row| row.key()),
        OrderBy::Time => rows.sort_by(|a, b| match (a.time(), b.time()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.key().cmp(&b.key()),
        }),
    }
    rows
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Snapshot {
    stations: Vec<Station>,
    metars: Vec<Metar>,
    tafs: Vec<Taf>,
}

impl Snapshot {
    fn count(&self, kind: CollectionKind) -> usize {
        match kind {
            CollectionKind::Stations => self.stations.len(),
            CollectionKind::Metars => self.metars.len(),
            CollectionKind::Tafs => self.tafs.len(),
        }
    }

    fn delete_all(&mut self, kind: CollectionKind) {
        match kind {
            CollectionKind::Stations => self.stations.clear(),
            CollectionKind::Metars => self.metars.clear(),
            CollectionKind::Tafs => self.tafs.clear(),
        }
    }

    fn upsert(&mut self, rows: Rows) {
        match rows {
            Rows::Stations(rows) => upsert_rows(&mut self.stations, rows),
            Rows::Metars(rows) => upsert_rows(&mut self.metars, rows),
            Rows::Tafs(rows) => upsert_rows(&mut self.tafs, rows),
        }
    }

    /// Drops observations whose identifier is not a stored station.
    fn prune_orphans(&mut self) -> usize {
        let known: HashSet<&str> = self
            .stations
            .iter()
            .map(|station| station.identifier.as_str())
            .collect();
        let before = self.metars.len() + self.tafs.len();
        self.metars.retain(|metar| known.contains(metar.identifier.as_str()));
        self.tafs.retain(|taf| known.contains(taf.identifier.as_str()));
        before - self.metars.len() - self.tafs.len()
    }

    fn query(&self, kind: CollectionKind, order: OrderBy) -> Rows {
        match kind {
            CollectionKind::Stations => Rows::Stations(ordered(&self.stations, order)),
            CollectionKind::Metars => Rows::Metars(ordered(&self.metars, order)),
            CollectionKind::Tafs => Rows::Tafs(ordered(&self.tafs, order)),
        }
    }
}

/// Pending changes of a [`WeatherStore::transaction`]. Steps apply in order
/// and are committed together.
#[derive(Debug)]
pub struct Transaction {
    snapshot: Snapshot,
    changed: bool,
}

impl Transaction {
    pub fn delete_all(&mut self, kind: CollectionKind) {
        self.snapshot.delete_all(kind);
        self.changed = true;
    }

    /// Replaces every row of the collection `rows` belongs to.
    pub fn replace_all(&mut self, rows: Rows) {
        self.snapshot.delete_all(rows.kind());
        self.snapshot.upsert(rows);
        self.changed = true;
    }

    pub fn upsert(&mut self, rows: Rows) {
        self.snapshot.upsert(rows);
        self.changed = true;
    }

    /// Deletes METARs and TAFs of stations that are no longer stored and
    /// returns how many were removed.
    pub fn prune_orphans(&mut self) -> usize {
        let removed = self.snapshot.prune_orphans();
        if removed > 0 {
            self.changed = true;
        }
        removed
    }

    /// Row count as of the steps applied so far.
    pub fn count(&self, kind: CollectionKind) -> usize {
        self.snapshot.count(kind)
    }
}

/// Durable keyed cache of stations and observations.
///
/// Every commit builds a new snapshot, writes it to disk and only then makes
/// it visible, so readers see either the old or the new state and a failed
/// write leaves both unchanged. Writers are serialized on the store lock.
#[derive(Debug)]
pub struct WeatherStore {
    path: Option<PathBuf>,
    state: RwLock<Arc<Snapshot>>,
}

impl WeatherStore {
    /// Opens the store file in `cache_dir`, creating the directory if needed.
    /// A missing file yields an empty store.
    pub async fn open(cache_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(cache_dir)
            .await
            .map_err(|e| StoreError::CacheDirCreation(cache_dir.to_path_buf(), e))?;
        let path = cache_dir.join(STORE_FILE_NAME);

        let snapshot = if fs::metadata(&path).await.is_ok() {
            let read_path = path.clone();
            let snapshot = task::spawn_blocking(move || read_snapshot(&read_path)).await??;
            info!(
                "Loaded {} stations, {} metars and {} tafs from {}",
                snapshot.stations.len(),
                snapshot.metars.len(),
                snapshot.tafs.len(),
                path.display()
            );
            snapshot
        } else {
            debug!("No store file at {}, starting empty", path.display());
            Snapshot::default()
        };

        Ok(Self {
            path: Some(path),
            state: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Location of the store file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Runs `f` against a private copy of the current state and commits all
    /// of its steps at once.
    pub async fn transaction<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Transaction) -> R,
    {
        let mut state = self.state.write().await;
        let mut tx = Transaction {
            snapshot: (**state).clone(),
            changed: false,
        };
        let result = f(&mut tx);
        if !tx.changed {
            return Ok(result);
        }

        let snapshot = Arc::new(tx.snapshot);
        if let Some(path) = &self.path {
            let path = path.clone();
            let to_write = Arc::clone(&snapshot);
            task::spawn_blocking(move || write_snapshot(&path, &to_write)).await??;
        }
        *state = snapshot;
        Ok(result)
    }

    pub async fn replace_all(&self, rows: Rows) -> Result<(), StoreError> {
        self.transaction(|tx| tx.replace_all(rows)).await
    }

    pub async fn upsert(&self, rows: Rows) -> Result<(), StoreError> {
        self.transaction(|tx| tx.upsert(rows)).await
    }

    pub async fn delete_all(&self, kind: CollectionKind) -> Result<(), StoreError> {
        self.transaction(|tx| tx.delete_all(kind)).await
    }

    pub async fn query(&self, kind: CollectionKind, order: OrderBy) -> Rows {
        self.snapshot().await.query(kind, order)
    }

    pub async fn count(&self, kind: CollectionKind) -> usize {
        self.snapshot().await.count(kind)
    }

    /// All stations ordered by identifier.
    pub async fn stations(&self) -> Vec<Station> {
        ordered(&self.snapshot().await.stations, OrderBy::Key)
    }

    pub async fn station(&self, identifier: &str) -> Option<Station> {
        self.snapshot()
            .await
            .stations
            .iter()
            .find(|station| station.identifier == identifier)
            .cloned()
    }

    /// Resolves the station an observation refers to.
    pub async fn station_for(&self, observation: &Observation) -> Option<Station> {
        self.station(observation.identifier()).await
    }

    /// All cached observations, both kinds ordered by time.
    pub async fn observations(&self) -> Observations {
        let snapshot = self.snapshot().await;
        Observations::new(
            ordered(&snapshot.metars, OrderBy::Time),
            ordered(&snapshot.tafs, OrderBy::Time),
        )
    }

    async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.state.read().await)
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    let bytes = std::fs::read(path).map_err(|e| StoreError::Read(path.to_path_buf(), e))?;
    let (snapshot, _) = bincode::serde::decode_from_slice::<Snapshot, _>(&bytes, BINCODE_CONFIG)
        .map_err(|e| StoreError::Decode(path.to_path_buf(), Box::new(e)))?;
    Ok(snapshot)
}

/// Writes the snapshot next to `path` and renames it into place.
fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    let bytes = bincode::serde::encode_to_vec(snapshot, BINCODE_CONFIG)
        .map_err(|e| StoreError::Encode(Box::new(e)))?;
    let write_error = |e: std::io::Error| StoreError::Write(path.to_path_buf(), e);

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(&bytes).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
