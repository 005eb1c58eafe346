// Application layer - the bill-splitting session a front end drives.
// Text from any origin (typed, dictated, imported) is validated here before
// it reaches the ledger.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
