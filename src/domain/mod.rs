mod cell;
mod date;
mod ledger;
mod money;
mod sheet;
mod transaction;

pub use cell::*;
pub use date::*;
pub use ledger::*;
pub use money::*;
pub use sheet::*;
pub use transaction::*;
