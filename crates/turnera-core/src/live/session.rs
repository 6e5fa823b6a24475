//! Watch sessions: one per open client connection.

use tokio::sync::mpsc;
use turnera_commons::{QueueId, StreamEvent, TicketId, WatchId};

/// Maximum pending events per session before new ones are dropped.
pub const SESSION_CHANNEL_CAPACITY: usize = 256;

/// Sending half of a session's event channel.
pub type StreamSender = mpsc::Sender<StreamEvent>;

/// Receiving half of a session's event channel; owned by the transport.
pub type StreamReceiver = mpsc::Receiver<StreamEvent>;

/// Subscription filter of a watch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchScope {
    /// Receives every change event.
    Global,
    /// Receives changes and snapshots for one queue.
    Queue(QueueId),
    /// Receives changes for one specific ticket.
    Ticket(TicketId),
}

/// One open watch session. Owned exclusively by the session manager; the
/// registry buckets hold only the session id, never a reference.
#[derive(Debug)]
pub struct WatchSession {
    pub id: WatchId,
    pub scope: WatchScope,
    sender: StreamSender,
}

impl WatchSession {
    /// Create a session and the receiver its transport will drain.
    pub fn new(id: WatchId, scope: WatchScope) -> (Self, StreamReceiver) {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        (Self { id, scope, sender }, receiver)
    }

    /// Non-blocking push into the session's sink.
    pub fn try_push(&self, event: StreamEvent) -> Result<(), PushError> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PushError::Full,
            mpsc::error::TrySendError::Closed(_) => PushError::Closed,
        })
    }
}

/// Why a push into a session did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// The channel is at capacity; the event is dropped, the session lives.
    Full,
    /// The receiving half is gone — the connection is dead.
    Closed,
}

/// Returned to the transport when a session opens.
pub struct SessionHandle {
    pub id: WatchId,
    pub scope: WatchScope,
    pub receiver: StreamReceiver,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_reaches_receiver() {
        let (session, mut receiver) = WatchSession::new(WatchId::new("w-1"), WatchScope::Global);
        session
            .try_push(StreamEvent::stream_opened(WatchId::new("w-1")))
            .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event, "stream_opened");
    }

    #[tokio::test]
    async fn test_push_to_dropped_receiver_reports_closed() {
        let (session, receiver) = WatchSession::new(WatchId::new("w-1"), WatchScope::Global);
        drop(receiver);

        let result = session.try_push(StreamEvent::stream_opened(WatchId::new("w-1")));
        assert_eq!(result, Err(PushError::Closed));
    }
}
