use std::{collections::BTreeMap, path::PathBuf};

use crate::core::clock::{Clock, SystemClock};
use crate::errors::Result;
use crate::ledger::{CategoryKind, LedgerTree, Transaction};
use crate::storage::{LoadOutcome, StorageBackend};

/// Metadata describing the outcome of the last load.
#[derive(Debug, Clone)]
pub struct LoadMetadata {
    pub outcome: LoadOutcome,
    pub path: PathBuf,
}

/// Facade that owns the ledger tree and keeps it persisted.
///
/// Every successful mutation is saved immediately. Balance queries do not
/// save; call [`LedgerManager::save`] to flush canonicalized cash balances.
pub struct LedgerManager {
    tree: LedgerTree,
    metadata: LoadMetadata,
    storage: Box<dyn StorageBackend>,
    clock: Box<dyn Clock>,
}

impl LedgerManager {
    /// Loads the ledger from `storage`, stamping transactions with the local time.
    pub fn open(storage: Box<dyn StorageBackend>) -> Result<Self> {
        Self::with_clock(storage, Box::new(SystemClock))
    }

    pub fn with_clock(storage: Box<dyn StorageBackend>, clock: Box<dyn Clock>) -> Result<Self> {
        let report = storage.load()?;
        Ok(Self {
            tree: report.tree,
            metadata: LoadMetadata {
                outcome: report.outcome,
                path: report.path,
            },
            storage,
            clock,
        })
    }

    pub fn tree(&self) -> &LedgerTree {
        &self.tree
    }

    pub fn metadata(&self) -> &LoadMetadata {
        &self.metadata
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    /// Discards in-memory state and loads again from storage.
    pub fn reload(&mut self) -> Result<&LoadMetadata> {
        let report = self.storage.load()?;
        self.tree = report.tree;
        self.metadata = LoadMetadata {
            outcome: report.outcome,
            path: report.path,
        };
        Ok(&self.metadata)
    }

    pub fn save(&self) -> Result<()> {
        self.storage.save(&self.tree)
    }

    /// Canonicalizing balance query; see [`LedgerTree::compute_balance`].
    pub fn compute_balance(&mut self, path: &str) -> Result<f64> {
        self.tree.compute_balance(path)
    }

    pub fn add_category(&mut self, parent_path: &str, name: &str, kind: CategoryKind) -> Result<()> {
        self.tree.add_category(parent_path, name, kind)?;
        self.save()
    }

    pub fn rename_category(&mut self, path: &str, new_name: &str) -> Result<String> {
        let renamed = self.tree.rename_category(path, new_name)?;
        self.save()?;
        Ok(renamed)
    }

    pub fn delete_category(&mut self, path: &str) -> Result<()> {
        self.tree.delete_category(path)?;
        self.save()
    }

    pub fn post_transaction(
        &mut self,
        path: &str,
        amount: f64,
        description: &str,
    ) -> Result<Transaction> {
        let now = self.clock.now();
        let transaction = self.tree.post_transaction(path, amount, description, now)?;
        self.save()?;
        Ok(transaction)
    }

    pub fn set_denominations(
        &mut self,
        path: &str,
        bills: &BTreeMap<String, i64>,
        coins: &BTreeMap<String, i64>,
    ) -> Result<()> {
        self.tree.set_denominations(path, bills, coins)?;
        self.save()
    }
}
