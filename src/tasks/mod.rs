//! Background Tasks Module
//!
//! Contains background tasks that run alongside a cache.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at a configured interval

mod cleanup;

pub use cleanup::{spawn_sweeper, SweeperHandle};

pub(crate) use cleanup::spawn_sweeper_on;
