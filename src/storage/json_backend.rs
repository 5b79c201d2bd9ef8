use chrono::Local;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{ensure_dir, write_atomic, PathResolver},
    errors::{LedgerError, Result},
    ledger::LedgerTree,
};

use super::{LoadOutcome, LoadReport, StorageBackend};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";
const CORRUPT_SUFFIX: &str = "corrupt";
const DEFAULT_RETENTION: usize = 5;
const INDENT: &[u8] = b"    ";

/// Stores the ledger as a single pretty-printed JSON document, keeping
/// timestamped copies of previous versions next to it.
#[derive(Clone, Debug)]
pub struct JsonStorage {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    /// Storage for `path`, with backups in a `backups` directory beside it.
    pub fn new(path: impl Into<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let path = path.into();
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ensure_dir(&parent)?;
        let backups_dir = PathResolver::backup_dir_in(&parent);
        Ok(Self {
            path,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    /// Storage for the default data file inside `base`.
    pub fn in_dir(base: &Path, retention: Option<usize>) -> Result<Self> {
        Self::new(PathResolver::data_file_in(base), retention)
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    pub fn backup_path(&self, backup_name: &str) -> PathBuf {
        self.backups_dir.join(backup_name)
    }

    fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("ledger")
            .to_string()
    }

    fn backup_existing_file(&self, suffix: Option<&str>) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        ensure_dir(&self.backups_dir)?;
        let timestamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut file_stem = format!("{}_{}", self.stem(), timestamp);
        if let Some(suffix) = suffix {
            file_stem.push('_');
            file_stem.push_str(suffix);
        }
        let backup_path = self
            .backups_dir
            .join(format!("{}.{}", file_stem, BACKUP_EXTENSION));
        fs::copy(&self.path, &backup_path)?;
        tracing::debug!(backup = %backup_path.display(), "backed up ledger file");
        Ok(Some(backup_path))
    }

    fn prune_backups(&self) -> Result<()> {
        let rotating: Vec<String> = self
            .list_backups()?
            .into_iter()
            .filter(|name| !is_corrupt_copy(name))
            .collect();
        for name in rotating.iter().skip(self.retention) {
            let _ = fs::remove_file(self.backup_path(name));
        }
        Ok(())
    }

    fn recover(&self, reason: String) -> Result<LoadReport> {
        tracing::warn!(path = %self.path.display(), %reason, "ledger file is corrupt, starting empty");
        self.backup_existing_file(Some(CORRUPT_SUFFIX))?;
        let tree = LedgerTree::new();
        save_tree_to_path(&tree, &self.path)?;
        Ok(LoadReport {
            tree,
            outcome: LoadOutcome::Recovered { reason },
            path: self.path.clone(),
        })
    }
}

impl StorageBackend for JsonStorage {
    fn load(&self) -> Result<LoadReport> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no ledger file, creating an empty one");
            let tree = LedgerTree::new();
            save_tree_to_path(&tree, &self.path)?;
            return Ok(LoadReport {
                tree,
                outcome: LoadOutcome::Created,
                path: self.path.clone(),
            });
        }
        match load_tree_from_path(&self.path) {
            Ok(tree) => {
                tracing::info!(
                    path = %self.path.display(),
                    nodes = tree.root().subtree_len(),
                    "loaded ledger"
                );
                Ok(LoadReport {
                    tree,
                    outcome: LoadOutcome::Loaded,
                    path: self.path.clone(),
                })
            }
            Err(LedgerError::CorruptDocument(reason)) => self.recover(reason),
            Err(err) => Err(err),
        }
    }

    fn save(&self, tree: &LedgerTree) -> Result<()> {
        self.backup_existing_file(None)?;
        save_tree_to_path(tree, &self.path)?;
        self.prune_backups()?;
        tracing::debug!(path = %self.path.display(), "saved ledger");
        Ok(())
    }

    fn list_backups(&self) -> Result<Vec<String>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_", self.stem());
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let file_name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) if name.starts_with(&prefix) => name.to_string(),
                _ => continue,
            };
            entries.push(file_name);
        }
        // Timestamps are fixed width, so name order is chronological.
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Writes `tree` to `path` through a temporary sibling file.
pub fn save_tree_to_path(tree: &LedgerTree, path: &Path) -> Result<()> {
    let json = to_pretty_json(tree)?;
    write_atomic(path, &json)
}

/// Reads and normalizes the document at `path`.
///
/// Malformed content is reported as `CorruptDocument`; I/O failures stay `Io`.
pub fn load_tree_from_path(path: &Path) -> Result<LedgerTree> {
    let data = fs::read_to_string(path)?;
    let document: Value =
        serde_json::from_str(&data).map_err(|err| LedgerError::CorruptDocument(err.to_string()))?;
    LedgerTree::from_document(document)
}

fn to_pretty_json(tree: &LedgerTree) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
    tree.serialize(&mut serializer)?;
    Ok(buffer)
}

fn is_corrupt_copy(name: &str) -> bool {
    name.ends_with(&format!("_{}.{}", CORRUPT_SUFFIX, BACKUP_EXTENSION))
}
