pub mod error;
pub mod ledger;
pub mod types;

pub use error::*;
pub use ledger::TransactionLedger;
pub use types::*;
