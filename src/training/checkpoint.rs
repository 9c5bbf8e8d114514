//! Checkpoint persistence: timestamped run directories, atomic saves and
//! latest-run discovery.

use crate::agent::AgentSnapshot;
use crate::error::TrainError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// One persisted save point: opaque model/optimizer blobs plus the training
/// progress counters needed to resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Episode the save point was taken after
    pub episode: usize,
    /// Global environment step at save time
    pub step: usize,
    /// Exploration rate at save time
    pub exploration_rate: f64,
    /// Serialized model parameters
    pub model: Vec<u8>,
    /// Serialized optimizer state
    pub optimizer: Vec<u8>,
}

impl Checkpoint {
    /// Assemble a checkpoint from an agent snapshot plus progress counters
    pub fn from_snapshot(episode: usize, step: usize, snapshot: AgentSnapshot) -> Self {
        Self {
            episode,
            step,
            exploration_rate: snapshot.exploration_rate,
            model: snapshot.model,
            optimizer: snapshot.optimizer,
        }
    }

    /// Re-wrap the stored blobs for handing back to an agent
    pub fn to_snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            model: self.model.clone(),
            optimizer: self.optimizer.clone(),
            exploration_rate: self.exploration_rate,
        }
    }
}

/// Timestamp-derived run name shared by the checkpoint and log directories
pub fn timestamp_run_name() -> String {
    Local::now().format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// Checkpoint storage rooted at one run directory
#[derive(Debug)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Create the run directory under `models_root` and return a store for it
    pub fn create(models_root: &Path, run_name: &str) -> Result<Self, TrainError> {
        let dir = models_root.join(run_name);
        fs::create_dir_all(&dir).map_err(|e| TrainError::storage(&dir, e))?;
        Ok(Self { dir })
    }

    /// Open an existing run directory; a missing directory is a storage error
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, TrainError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(TrainError::storage(
                &dir,
                std::io::Error::new(ErrorKind::NotFound, "run directory does not exist"),
            ));
        }
        Ok(Self { dir })
    }

    /// The run directory this store writes into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a checkpoint and return its path.
    ///
    /// The artifact is written to a temporary sibling first and committed
    /// with an atomic rename, so an interrupted save never leaves a readable
    /// file under a checkpoint name.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<PathBuf, TrainError> {
        if !self.dir.is_dir() {
            return Err(TrainError::storage(
                &self.dir,
                std::io::Error::new(ErrorKind::NotFound, "run directory disappeared"),
            ));
        }

        let path = self
            .dir
            .join(checkpoint_file_name(checkpoint.episode, checkpoint.step));
        let tmp_path = path.with_extension("json.tmp");

        let file = fs::File::create(&tmp_path).map_err(|e| TrainError::storage(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, checkpoint)?;
        writer
            .flush()
            .map_err(|e| TrainError::storage(&tmp_path, e))?;

        fs::rename(&tmp_path, &path).map_err(|e| TrainError::storage(&path, e))?;
        Ok(path)
    }

    /// Newest checkpoint in this run directory by (episode, step), if any.
    /// Temporary and foreign files are skipped.
    pub fn latest(&self) -> Result<Option<(usize, usize, PathBuf)>, TrainError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| TrainError::storage(&self.dir, e))?;
        let mut newest: Option<(usize, usize, PathBuf)> = None;

        for entry in entries {
            let entry = entry.map_err(|e| TrainError::storage(&self.dir, e))?;
            let file_name = entry.file_name();
            let name = match file_name.to_str() {
                Some(name) => name,
                None => continue,
            };
            let (episode, step) = match parse_checkpoint_name(name) {
                Some(indices) => indices,
                None => continue,
            };

            let is_newer = match &newest {
                Some((e, s, _)) => (episode, step) > (*e, *s),
                None => true,
            };
            if is_newer {
                newest = Some((episode, step, entry.path()));
            }
        }

        Ok(newest)
    }

    /// Load one checkpoint artifact
    pub fn load(path: &Path) -> Result<Checkpoint, TrainError> {
        let file = fs::File::open(path).map_err(|e| TrainError::storage(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Open the most recent run under `models_root`. Run names are timestamps,
    /// so the lexicographically last directory is the newest.
    pub fn open_latest_run(models_root: &Path) -> Result<Self, TrainError> {
        let entries =
            fs::read_dir(models_root).map_err(|e| TrainError::storage(models_root, e))?;
        let mut runs = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| TrainError::storage(models_root, e))?;
            if entry.path().is_dir() {
                runs.push(entry.path());
            }
        }

        runs.sort();
        match runs.pop() {
            Some(dir) => Ok(Self { dir }),
            None => Err(TrainError::NotFound(format!(
                "no run directories under {}",
                models_root.display()
            ))),
        }
    }

    /// Find the most recent run under `models_root` and load its newest
    /// checkpoint
    pub fn load_latest(models_root: &Path) -> Result<Checkpoint, TrainError> {
        let store = Self::open_latest_run(models_root)?;
        match store.latest()? {
            Some((_, _, path)) => Self::load(&path),
            None => Err(TrainError::NotFound(format!(
                "no checkpoint in {}",
                store.dir.display()
            ))),
        }
    }
}

fn checkpoint_file_name(episode: usize, step: usize) -> String {
    format!("episode{episode}-step{step}.json")
}

fn parse_checkpoint_name(name: &str) -> Option<(usize, usize)> {
    let rest = name.strip_prefix("episode")?;
    let rest = rest.strip_suffix(".json")?;
    let (episode, step) = rest.split_once("-step")?;
    Some((episode.parse().ok()?, step.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn checkpoint(episode: usize, step: usize) -> Checkpoint {
        Checkpoint {
            episode,
            step,
            exploration_rate: 0.42,
            model: vec![0xde, 0xad, 0xbe, 0xef],
            optimizer: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let root = TempDir::new().unwrap();
        let store = CheckpointStore::create(root.path(), "run-a").unwrap();

        let saved = checkpoint(7, 42);
        let path = store.save(&saved).unwrap();
        assert_eq!(path.file_name().unwrap(), "episode7-step42.json");

        let loaded = CheckpointStore::load(&path).unwrap();
        assert_eq!(loaded.episode, 7);
        assert_eq!(loaded.step, 42);
        assert_eq!(loaded.model, saved.model);
        assert_eq!(loaded.optimizer, saved.optimizer);
    }

    #[test]
    fn test_interrupted_save_is_never_visible() {
        let root = TempDir::new().unwrap();
        let store = CheckpointStore::create(root.path(), "run-a").unwrap();
        store.save(&checkpoint(3, 30)).unwrap();

        // Emulate a crash mid-write: a half-written temporary left behind
        fs::write(store.dir().join("episode9-step90.json.tmp"), b"{\"epis").unwrap();

        let loaded = CheckpointStore::load_latest(root.path()).unwrap();
        assert_eq!((loaded.episode, loaded.step), (3, 30));
    }

    #[test]
    fn test_latest_orders_numerically() {
        let root = TempDir::new().unwrap();
        let store = CheckpointStore::create(root.path(), "run-a").unwrap();

        store.save(&checkpoint(9, 900)).unwrap();
        store.save(&checkpoint(10, 1000)).unwrap();

        // Lexicographically "episode10" < "episode9"; numerically it is newer
        let (episode, step, _) = store.latest().unwrap().unwrap();
        assert_eq!((episode, step), (10, 1000));
    }

    #[test]
    fn test_load_latest_picks_newest_run() {
        let root = TempDir::new().unwrap();

        let older = CheckpointStore::create(root.path(), "2024-01-01-00-00-00").unwrap();
        older.save(&checkpoint(50, 5000)).unwrap();

        let newer = CheckpointStore::create(root.path(), "2024-06-15-12-30-00").unwrap();
        newer.save(&checkpoint(2, 20)).unwrap();

        let loaded = CheckpointStore::load_latest(root.path()).unwrap();
        assert_eq!((loaded.episode, loaded.step), (2, 20));
    }

    #[test]
    fn test_load_latest_without_runs_is_not_found() {
        let root = TempDir::new().unwrap();
        let err = CheckpointStore::load_latest(root.path()).unwrap_err();

        assert!(matches!(err, TrainError::NotFound(_)));
    }

    #[test]
    fn test_empty_run_directory_is_not_found() {
        let root = TempDir::new().unwrap();
        CheckpointStore::create(root.path(), "run-a").unwrap();

        let err = CheckpointStore::load_latest(root.path()).unwrap_err();
        assert!(matches!(err, TrainError::NotFound(_)));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let root = TempDir::new().unwrap();
        let store = CheckpointStore::create(root.path(), "run-a").unwrap();
        fs::remove_dir_all(store.dir()).unwrap();

        let err = store.save(&checkpoint(1, 10)).unwrap_err();
        assert!(matches!(err, TrainError::Storage { .. }));
    }

    #[test]
    fn test_open_requires_existing_directory() {
        let root = TempDir::new().unwrap();
        let err = CheckpointStore::open(root.path().join("missing")).unwrap_err();

        assert!(matches!(err, TrainError::Storage { .. }));
    }

    #[test]
    fn test_snapshot_conversion_preserves_blobs() {
        let snapshot = AgentSnapshot {
            model: vec![1, 2, 3],
            optimizer: vec![4, 5],
            exploration_rate: 0.1,
        };
        let ckpt = Checkpoint::from_snapshot(7, 42, snapshot.clone());

        assert_eq!(ckpt.to_snapshot(), snapshot);
    }
}
