//! capgrab-poller — keep trying to launch one instance until a zone has room.
//!
//! Each cycle lists the availability zones of the compartment and attempts
//! a launch in every zone, in provider order. Every attempt is classified
//! into exactly one [`AttemptOutcome`]:
//!
//! - `Launched` ends the run
//! - `CapacityExhausted` moves on to the next zone
//! - `RateLimited` grows the inter-zone pause, then moves on
//! - `OtherProviderError` / `TransportError` are logged, then move on
//!
//! # Pacing
//!
//! ```text
//! attempt zone → sleep zone_interval → attempt next zone → ...
//! all zones failed → sleep cycle_interval → re-enumerate
//!
//! on TooManyRequests:
//!     if zone_interval <= max_zone_interval:
//!         zone_interval += 1s
//! ```
//!
//! The pause never shrinks during a run. Retrying is unbounded unless a
//! cycle limit is set.

pub mod attempt;
pub mod error;
pub mod outcome;
pub mod pacing;
pub mod poller;
pub mod zones;

#[cfg(test)]
mod testing;

pub use attempt::attempt_zone;
pub use error::{PollerError, PollerResult};
pub use outcome::{AttemptOutcome, classify};
pub use pacing::PacingState;
pub use poller::{CycleOutcome, Launch, PollOutcome, Poller};
pub use zones::enumerate_zones;
