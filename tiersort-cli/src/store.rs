/// JSON session file: the item catalog plus every session built on it.
///
/// The whole file is read once at startup and rewritten after each verdict, so
/// quitting at any prompt (or killing the process) loses at most the verdict
/// being typed.
///
/// Each save bumps `revision`. A save is refused when the file on disk is no
/// longer at the revision this process loaded or last wrote, so two processes
/// sharing one file cannot both answer the same pair.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tiersort_core::{
    Catalog, EngineError, HolderId, ItemId, MergeSortSession, RatingSession, SessionStore,
    TournamentSession,
};
use tracing::debug;

use crate::items::ItemRecord;

/// The terminal has one user; every session in a file belongs to it.
pub const LOCAL_HOLDER: HolderId = 1;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    /// Number of saves so far. Files without it read as 0.
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub items: BTreeMap<ItemId, ItemRecord>,
    #[serde(default)]
    pub sort: BTreeMap<HolderId, MergeSortSession>,
    #[serde(default)]
    pub tournament: BTreeMap<HolderId, TournamentSession>,
    #[serde(default)]
    pub rating: BTreeMap<HolderId, RatingSession>,
}

/// Only the stamp of a session file, for checking it before a save.
#[derive(Deserialize)]
struct RevisionStamp {
    #[serde(default)]
    revision: u64,
}

fn invalid_data(e: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

/// Revision of the file at `path`; 0 if it does not exist yet.
fn disk_revision(path: &Path) -> io::Result<u64> {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str::<RevisionStamp>(&content)
            .map(|stamp| stamp.revision)
            .map_err(invalid_data),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}

/// Picks the map a session type is kept in.
pub trait Slot: Sized {
    fn slot(file: &mut SessionFile) -> &mut BTreeMap<HolderId, Self>;
}

impl Slot for MergeSortSession {
    fn slot(file: &mut SessionFile) -> &mut BTreeMap<HolderId, Self> {
        &mut file.sort
    }
}

impl Slot for TournamentSession {
    fn slot(file: &mut SessionFile) -> &mut BTreeMap<HolderId, Self> {
        &mut file.tournament
    }
}

impl Slot for RatingSession {
    fn slot(file: &mut SessionFile) -> &mut BTreeMap<HolderId, Self> {
        &mut file.rating
    }
}

pub struct FileStore {
    path: PathBuf,
    state: Mutex<SessionFile>,
}

impl FileStore {
    /// Open `path`, or start empty if it does not exist yet.
    pub fn open(path: &Path) -> io::Result<Self> {
        let state = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(invalid_data)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => SessionFile::default(),
            Err(e) => return Err(e),
        };
        Ok(FileStore {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionFile> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Write the current state out through a sibling temp file, so a crash
    /// mid-write leaves the previous save intact.
    ///
    /// The temp file is created exclusively and doubles as the write lock:
    /// while it exists no other process can save. Fails without writing if
    /// another process saved since this one last read or wrote the file.
    pub fn save(&self) -> io::Result<()> {
        let mut state = self.lock();
        let tmp = self.path.with_extension("json.tmp");
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => io::Error::new(
                    e.kind(),
                    format!(
                        "{} exists: another tiersort process is saving, or one stopped mid-save (delete the file if so)",
                        tmp.display()
                    ),
                ),
                _ => e,
            })?;

        let result = self.write_next_revision(&mut state, file, &tmp);
        if result.is_err() {
            // Ours, created above; nothing else can be holding it.
            let _ = std::fs::remove_file(&tmp);
        }
        result
    }

    fn write_next_revision(&self, state: &mut SessionFile, mut file: File, tmp: &Path) -> io::Result<()> {
        let on_disk = disk_revision(&self.path)?;
        if on_disk != state.revision {
            return Err(io::Error::other(format!(
                "{} was saved by another tiersort process (revision {on_disk}, expected {}); run again to continue from its progress",
                self.path.display(),
                state.revision,
            )));
        }

        state.revision += 1;
        let written = serde_json::to_vec_pretty(&*state)
            .map_err(invalid_data)
            .and_then(|json| file.write_all(&json))
            .and_then(|()| file.sync_all());
        drop(file);
        let written = written.and_then(|()| std::fs::rename(tmp, &self.path));
        if written.is_err() {
            state.revision -= 1;
        }
        written?;

        debug!(path = %self.path.display(), revision = state.revision, "session file saved");
        Ok(())
    }

    /// Replace the catalog with `records`, numbered from 1 in list order.
    /// Sessions built on the previous catalog are dropped.
    pub fn load_items(&self, records: Vec<ItemRecord>) -> Vec<ItemId> {
        let mut state = self.lock();
        *state = SessionFile {
            revision: state.revision,
            ..SessionFile::default()
        };
        for (i, record) in records.into_iter().enumerate() {
            state.items.insert(i as ItemId + 1, record);
        }
        state.items.keys().copied().collect()
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.lock().items.keys().copied().collect()
    }

    /// `(id, category)` for every item, in id order.
    pub fn categorised(&self) -> Vec<(ItemId, String)> {
        self.lock()
            .items
            .iter()
            .map(|(id, record)| (*id, record.category.clone()))
            .collect()
    }

    /// Display name for `id`, falling back to the raw id.
    pub fn name(&self, id: ItemId) -> String {
        self.resolve(&[id])
            .remove(&id)
            .map(|record| record.name)
            .unwrap_or_else(|| format!("#{id}"))
    }
}

impl<S: Slot + Clone> SessionStore<S> for FileStore {
    fn get(&self, holder: HolderId) -> Option<S> {
        S::slot(&mut self.lock()).get(&holder).cloned()
    }

    fn replace(&self, holder: HolderId, session: S) {
        S::slot(&mut self.lock()).insert(holder, session);
    }

    fn update<R, F>(&self, holder: HolderId, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut S) -> Result<R, EngineError>,
    {
        let mut state = self.lock();
        let slot = S::slot(&mut state);
        let mut working = slot
            .get(&holder)
            .cloned()
            .ok_or(EngineError::NoActiveSession { holder })?;
        let out = f(&mut working)?;
        slot.insert(holder, working);
        Ok(out)
    }

    fn upsert<R, I, F>(&self, holder: HolderId, init: I, f: F) -> Result<R, EngineError>
    where
        I: FnOnce() -> S,
        F: FnOnce(&mut S) -> Result<R, EngineError>,
    {
        let mut state = self.lock();
        let slot = S::slot(&mut state);
        let mut working = slot.get(&holder).cloned().unwrap_or_else(init);
        let out = f(&mut working)?;
        slot.insert(holder, working);
        Ok(out)
    }
}

impl Catalog for FileStore {
    type Payload = ItemRecord;

    fn resolve(&self, ids: &[ItemId]) -> HashMap<ItemId, ItemRecord> {
        let state = self.lock();
        ids.iter()
            .filter_map(|id| state.items.get(id).map(|record| (*id, record.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tiersort_core::{
        next_rating_pair, start_merge_sort, start_tournament, status, submit, submit_rating,
        EloConfig, Format, Phase, TournamentConfig,
    };

    fn records(names: &[&str]) -> Vec<ItemRecord> {
        names.iter().map(|n| ItemRecord::new(n, "")).collect()
    }

    #[test]
    fn test_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path).unwrap();
        let ids = store.load_items(records(&["Pizza", "Sushi", "Tacos"]));
        assert_eq!(ids, vec![1, 2, 3]);
        start_merge_sort(&store, LOCAL_HOLDER, &ids).unwrap();
        submit::<MergeSortSession, _>(&store, LOCAL_HOLDER, 2, 1).unwrap();
        store.save().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        let progress = status::<MergeSortSession, _>(&reopened, LOCAL_HOLDER).unwrap();
        assert_eq!(progress.done, 1);
        assert_eq!(progress.pending_pair, Some((3, 2)));
        assert_eq!(reopened.name(2), "Sushi");
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn test_loading_items_drops_old_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("s.json")).unwrap();
        let ids = store.load_items(records(&["a", "b"]));
        start_merge_sort(&store, LOCAL_HOLDER, &ids).unwrap();

        store.load_items(records(&["c", "d", "e"]));
        assert!(SessionStore::<MergeSortSession>::get(&store, LOCAL_HOLDER).is_none());
        assert_eq!(store.item_ids(), vec![1, 2, 3]);
        assert_eq!(store.name(1), "c");
    }

    #[test]
    fn test_catalog_skips_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("s.json")).unwrap();
        store.load_items(vec![ItemRecord::new("Doom", "Shooter")]);

        let resolved = store.resolve(&[1, 7]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[&1].category, "Shooter");
        assert_eq!(store.name(7), "#7");
        assert_eq!(store.categorised(), vec![(1, "Shooter".to_string())]);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = FileStore::open(&path).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_stale_handle_cannot_overwrite_newer_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let setup = FileStore::open(&path).unwrap();
        let ids = setup.load_items(records(&["a", "b", "c", "d"]));
        start_merge_sort(&setup, LOCAL_HOLDER, &ids).unwrap();
        setup.save().unwrap();

        // Two terminals on the same file, both looking at (1, 2).
        let first = FileStore::open(&path).unwrap();
        let second = FileStore::open(&path).unwrap();
        submit::<MergeSortSession, _>(&first, LOCAL_HOLDER, 1, 2).unwrap();
        first.save().unwrap();
        submit::<MergeSortSession, _>(&second, LOCAL_HOLDER, 2, 1).unwrap();

        let err = second.save().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(second.revision(), 1);
        assert!(!dir.path().join("s.json.tmp").exists());

        // The file still holds the first verdict.
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.revision(), 2);
        let progress = status::<MergeSortSession, _>(&reopened, LOCAL_HOLDER).unwrap();
        assert_eq!(progress.done, 1);
        assert_eq!(progress.pending_pair, Some((3, 4)));
        let sort = SessionStore::<MergeSortSession>::get(&reopened, LOCAL_HOLDER).unwrap();
        let winner_first = SessionStore::<MergeSortSession>::get(&first, LOCAL_HOLDER).unwrap();
        assert_eq!(sort, winner_first);
    }

    #[test]
    fn test_fresh_file_claimed_by_one_handle_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let first = FileStore::open(&path).unwrap();
        let second = FileStore::open(&path).unwrap();
        first.load_items(records(&["a", "b"]));
        second.load_items(records(&["x", "y"]));

        first.save().unwrap();
        assert!(second.save().is_err());
        assert_eq!(FileStore::open(&path).unwrap().name(1), "a");
    }

    #[test]
    fn test_save_refused_while_temp_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let tmp = dir.path().join("s.json.tmp");
        std::fs::write(&tmp, "partial").unwrap();

        let store = FileStore::open(&path).unwrap();
        store.load_items(records(&["a", "b"]));
        let err = store.save().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read_to_string(&tmp).unwrap(), "partial");
        assert!(!path.exists());
        assert_eq!(store.revision(), 0);

        std::fs::remove_file(&tmp).unwrap();
        store.save().unwrap();
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_mid_group_tournament_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let store = FileStore::open(&path).unwrap();
        store.load_items(
            ["a", "a", "a", "b", "b", "b"]
                .iter()
                .enumerate()
                .map(|(i, category)| ItemRecord::new(&format!("item {i}"), category))
                .collect(),
        );
        let config = TournamentConfig {
            group_format: Format::RoundRobin,
            ..TournamentConfig::default()
        };
        start_tournament(&store, LOCAL_HOLDER, &store.categorised(), config).unwrap();

        // Finish group "a" (three matches) and play one match of group "b".
        for _ in 0..4 {
            let (a, b) = status::<TournamentSession, _>(&store, LOCAL_HOLDER).unwrap().pending_pair.unwrap();
            submit::<TournamentSession, _>(&store, LOCAL_HOLDER, a.min(b), a.max(b)).unwrap();
        }
        store.save().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        let before = SessionStore::<TournamentSession>::get(&store, LOCAL_HOLDER).unwrap();
        let after = SessionStore::<TournamentSession>::get(&reopened, LOCAL_HOLDER).unwrap();
        assert_eq!(after, before);
        assert_eq!(after.phase(), Phase::Groups);
        assert_eq!(after.groups()[0].resolved().unwrap()[0].win_fraction, Some(1.0));
        assert_eq!(after.active_group().unwrap().done, 1);

        let (a, b) = after.current_pair().unwrap();
        let live = submit::<TournamentSession, _>(&store, LOCAL_HOLDER, b, a).unwrap();
        let reloaded = submit::<TournamentSession, _>(&reopened, LOCAL_HOLDER, b, a).unwrap();
        assert_eq!(reloaded, live);
    }

    #[test]
    fn test_rating_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let store = FileStore::open(&path).unwrap();
        let pool = store.load_items(records(&["a", "b", "c", "d"]));
        let mut rng = StdRng::seed_from_u64(11);

        let (champion, challenger) = next_rating_pair(&store, LOCAL_HOLDER, &pool, EloConfig::default(), &mut rng).unwrap();
        submit_rating(&store, LOCAL_HOLDER, challenger, champion).unwrap();
        // Leave a pair pending across the save.
        let pending = next_rating_pair(&store, LOCAL_HOLDER, &pool, EloConfig::default(), &mut rng).unwrap();
        store.save().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        let before = SessionStore::<RatingSession>::get(&store, LOCAL_HOLDER).unwrap();
        let after = SessionStore::<RatingSession>::get(&reopened, LOCAL_HOLDER).unwrap();
        assert_eq!(after, before);
        assert_eq!(after.champion(), Some(challenger));
        assert_eq!(after.pending(), Some(pending));
        assert_eq!(after.book().rating(challenger), 1016.0);

        let live = submit_rating(&store, LOCAL_HOLDER, pending.0, pending.1).unwrap();
        let reloaded = submit_rating(&reopened, LOCAL_HOLDER, pending.0, pending.1).unwrap();
        assert_eq!(reloaded, live);
    }
}
