//! Commission module for computing fees of deposits and withdrawals.
mod engine;
mod error;
mod exchange;
mod ledger;
mod math;
mod rules;
mod sequencer;
mod transaction;
mod types;

pub use engine::*;
pub use error::*;
pub use exchange::*;
pub use ledger::*;
pub use math::*;
pub use rules::*;
pub use sequencer::*;
pub use transaction::*;
pub use types::*;
