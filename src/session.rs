//! Session refresh coordination with a single in-flight refresh and a shared wait queue.
//!
//! Every clone of a client shares one [`RefreshCoordinator`]. The first request that sees an
//! expired session becomes the refresh leader; requests that fail while the refresh is in flight
//! join its batch and park until the leader settles it. Settling flips the coordinator back to
//! idle before waking the batch, so a 401 observed after that point starts a fresh refresh.

mod coordinator;
mod metrics;

pub use coordinator::*;
pub use metrics::RefreshMetrics;
