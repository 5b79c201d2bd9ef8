//! Ledger tree domain model, balance computation, and load-time repair.

pub mod category;
pub mod denominations;
pub mod normalize;
pub mod transaction;
pub mod tree;

pub use category::{Category, CategoryKind, Holding};
pub use denominations::{
    parse_count, DenominationGroup, DenominationLine, Denominations, BILL_LABELS, COIN_LABELS,
};
pub use normalize::normalize;
pub use transaction::{Transaction, TIMESTAMP_FORMAT};
pub use tree::{join_path, ChildBalance, LedgerTree, OutlineRow, MAX_DEPTH, PATH_DELIMITER};
