//! The swarm coordinator.
//!
//! The coordinator owns the download: a FIFO work queue of pieces, a
//! rendezvous channel of completed pieces, a pool of candidate peers,
//! and the cap on concurrent sessions. Sessions are the workers; the
//! coordinator is the scheduler, and it alone touches the done set and
//! the output writer.

mod coordinator;
mod error;
mod progress;

pub use coordinator::Swarm;
pub use error::SwarmError;
pub use progress::Progress;

#[cfg(test)]
mod tests;
