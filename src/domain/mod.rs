mod item;
mod ledger;
mod money;
mod participant;
mod settlement;

pub use item::*;
pub use ledger::*;
pub use money::*;
pub use participant::*;
pub use settlement::*;
