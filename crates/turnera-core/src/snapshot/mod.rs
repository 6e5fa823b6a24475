//! Queue snapshots: on-demand reconstruction of a queue's visible state.

mod builder;
mod model;
mod stats;

pub use builder::SnapshotBuilder;
pub use model::{QueueSnapshot, QueueStatistics};
pub use stats::{assemble, COMPLETED_LIMIT, LAST_CALLED_LIMIT, NEXT_TICKETS_LIMIT};
