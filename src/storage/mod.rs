pub mod json_backend;

use std::path::{Path, PathBuf};

use crate::{errors::Result, ledger::LedgerTree};

/// How a ledger came to be in memory after [`StorageBackend::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// An existing document was read and normalized.
    Loaded,
    /// No document existed; an empty one was created and persisted.
    Created,
    /// The document was corrupt; it was set aside and replaced by an empty one.
    Recovered { reason: String },
}

/// Result of a load: the tree plus what happened while producing it.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub tree: LedgerTree,
    pub outcome: LoadOutcome,
    pub path: PathBuf,
}

/// Abstraction over persistence backends capable of storing a ledger tree.
pub trait StorageBackend: Send + Sync {
    /// Loads the ledger, creating or recovering it when needed.
    fn load(&self) -> Result<LoadReport>;
    /// Persists the tree verbatim.
    fn save(&self, tree: &LedgerTree) -> Result<()>;
    /// Backup file names, newest first.
    fn list_backups(&self) -> Result<Vec<String>>;
    /// Location of the primary document.
    fn location(&self) -> &Path;
}

pub use json_backend::{load_tree_from_path, save_tree_to_path, JsonStorage};
