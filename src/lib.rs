#![doc(test(attr(deny(warnings))))]

//! Ledger Tree keeps a personal ledger as a tree of named categories: virtual
//! accounts driven by posted transactions, cash accounts counted by
//! denomination, and summary nodes that roll up their children.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use errors::{LedgerError, Result};
pub use ledger::{Category, CategoryKind, LedgerTree, Transaction};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("Ledger Tree tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
