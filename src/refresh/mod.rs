//! Exclusive background refresh.
//!
//! Slow remote fetches run on the tokio runtime; their outcomes come back
//! over a channel and are applied by the single-threaded UI loop, one at a
//! time, in arrival order.
//!
//! ```text
//!  trigger(key, exclusive, fut)
//!        │  seq = ledger.begin(key)
//!        ▼
//!  ┌───────────────┐   Outcome{key, seq, result}   ┌──────────────────┐
//!  │ tokio task(s) │ ─────────── mpsc ───────────▶ │ drain() / recv() │
//!  └───────────────┘                               └────────┬─────────┘
//!                                                           │ ledger.accept()
//!                                                           ▼
//!                                                 presentation state
//! ```
//!
//! - [`ledger`]: per-key sequence bookkeeping that decides which outcomes
//!   are still current ([`SequenceLedger`])
//! - [`coordinator`]: task dispatch and delivery ([`RefreshCoordinator`])

pub mod coordinator;
pub mod ledger;

pub use coordinator::{Outcome, RefreshCoordinator, Ticket};
pub use ledger::SequenceLedger;
