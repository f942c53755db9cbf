//! Outbound replies waiting for the status channel.
//!
//! At most one frame per link is held, and only after the link layer
//! reported `Busy`: that is the one failure the service follows up with a
//! `TxReady`. Every other failure drops the frame. Callers cancel a link's
//! frame on `CommStarted` and `CommStopped` so nothing outlives the peer
//! that produced it.

use heapless::{LinearMap, Vec};

use super::ConnHandle;
use crate::config::MAX_DATA_LEN;
use crate::error::{SendError, TransportError};

/// One frame, at most one status notification long.
pub type Frame = Vec<u8, MAX_DATA_LEN>;

/// Held replies for up to `N` links.
pub struct PendingReplies<const N: usize> {
    frames: LinearMap<ConnHandle, Frame, N>,
}

impl<const N: usize> PendingReplies<N> {
    pub const fn new() -> Self {
        Self {
            frames: LinearMap::new(),
        }
    }

    /// Hand `frame` to `send`. A `Busy` link keeps the frame until the
    /// next `take`; any other error drops it.
    pub fn deliver<F>(
        &mut self,
        conn: ConnHandle,
        frame: Frame,
        send: F,
    ) -> Result<usize, SendError>
    where
        F: FnOnce(ConnHandle, &[u8]) -> Result<usize, SendError>,
    {
        let result = send(conn, &frame);
        match result {
            Err(SendError::Transport(TransportError::Busy)) => {
                if self.frames.contains_key(&conn) {
                    warn!("link {}: reply already held, dropping frame", conn);
                } else if self.frames.insert(conn, frame).is_err() {
                    warn!("link {}: no room to hold reply, dropping frame", conn);
                }
            }
            Err(e) => warn!("link {}: reply dropped: {}", conn, e),
            Ok(_) => {}
        }
        result
    }

    /// Remove the held frame for `conn`, if any.
    pub fn take(&mut self, conn: ConnHandle) -> Option<Frame> {
        self.frames.remove(&conn)
    }

    /// Forget the held frame for `conn`. Returns whether one was held.
    pub fn cancel(&mut self, conn: ConnHandle) -> bool {
        self.frames.remove(&conn).is_some()
    }

    pub fn contains(&self, conn: ConnHandle) -> bool {
        self.frames.contains_key(&conn)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.len() == 0
    }
}

impl<const N: usize> Default for PendingReplies<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C1: ConnHandle = ConnHandle(1);
    const C2: ConnHandle = ConnHandle(2);
    const C3: ConnHandle = ConnHandle(3);

    fn frame(bytes: &[u8]) -> Frame {
        Frame::from_slice(bytes).unwrap()
    }

    fn busy(_: ConnHandle, _: &[u8]) -> Result<usize, SendError> {
        Err(SendError::Transport(TransportError::Busy))
    }

    #[test]
    fn successful_send_holds_nothing() {
        let mut replies = PendingReplies::<2>::new();
        let result = replies.deliver(C1, frame(b"ok"), |_, data| Ok(data.len()));
        assert_eq!(result, Ok(2));
        assert!(replies.is_empty());
    }

    #[test]
    fn busy_link_holds_frame_until_taken() {
        let mut replies = PendingReplies::<2>::new();
        assert!(replies.deliver(C1, frame(b"later"), busy).is_err());
        assert!(replies.contains(C1));
        assert_eq!(replies.take(C1), Some(frame(b"later")));
        assert_eq!(replies.take(C1), None);
    }

    #[test]
    fn non_busy_failures_drop_the_frame() {
        let mut replies = PendingReplies::<2>::new();
        let failures = [
            SendError::NotifyDisabled,
            SendError::InvalidConnection,
            SendError::PayloadTooLarge { len: 9, max: 8 },
            SendError::Transport(TransportError::Disconnected),
            SendError::Transport(TransportError::Raw(0x13)),
        ];
        for e in failures {
            assert_eq!(replies.deliver(C1, frame(b"x"), |_, _| Err(e)), Err(e));
        }
        assert!(replies.is_empty());
    }

    #[test]
    fn second_busy_frame_keeps_the_first() {
        let mut replies = PendingReplies::<2>::new();
        let _ = replies.deliver(C1, frame(b"first"), busy);
        let _ = replies.deliver(C1, frame(b"second"), busy);
        assert_eq!(replies.take(C1), Some(frame(b"first")));
    }

    #[test]
    fn full_table_drops_new_frames() {
        let mut replies = PendingReplies::<2>::new();
        let _ = replies.deliver(C1, frame(b"a"), busy);
        let _ = replies.deliver(C2, frame(b"b"), busy);
        let _ = replies.deliver(C3, frame(b"c"), busy);
        assert_eq!(replies.len(), 2);
        assert!(!replies.contains(C3));
    }

    #[test]
    fn cancel_reports_whether_a_frame_was_held() {
        let mut replies = PendingReplies::<2>::new();
        assert!(!replies.cancel(C1));
        let _ = replies.deliver(C1, frame(b"a"), busy);
        assert!(replies.cancel(C1));
        assert!(replies.is_empty());
    }
}
