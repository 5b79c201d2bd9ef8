use thiserror::Error;

use crate::ledger::CategoryKind;

/// Error type that captures ledger tree and persistence failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Category `{segment}` not found in path `{path}`")]
    NotFound { segment: String, path: String },
    #[error("Category `{name}` already exists under `{parent}`")]
    DuplicateName { name: String, parent: String },
    #[error("Category name cannot be empty")]
    EmptyName,
    #[error("Invalid category name `{0}`: names cannot contain `.`")]
    InvalidName(String),
    #[error("The root category cannot be renamed or deleted")]
    RootImmutable,
    #[error("Cannot add `{name}` under `{parent}`: categories nest at most {max} levels deep")]
    TooDeep {
        name: String,
        parent: String,
        max: usize,
    },
    #[error("Category `{path}` is {actual}, expected {expected}")]
    WrongKind {
        path: String,
        expected: CategoryKind,
        actual: CategoryKind,
    },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid count for {label}: {reason}")]
    InvalidCount { label: String, reason: String },
    #[error("Corrupted ledger document: {0}")]
    CorruptDocument(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub(crate) fn not_found(segment: &str, path: &str) -> Self {
        LedgerError::NotFound {
            segment: segment.to_string(),
            path: path.to_string(),
        }
    }
}
