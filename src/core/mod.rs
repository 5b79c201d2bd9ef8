pub mod clock;
pub mod ledger_manager;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ledger_manager::{LedgerManager, LoadMetadata};
