//! Live watch sessions: the registry of open sinks and the session manager
//! that fans events into them.

mod manager;
mod registry;
mod session;

pub use manager::{StreamSessionManager, StreamStats};
pub use registry::{PushOutcome, WatchRegistry};
pub use session::{
    PushError, SessionHandle, StreamReceiver, StreamSender, WatchScope, WatchSession,
    SESSION_CHANNEL_CAPACITY,
};
