//! Events crossing the service boundary.
//!
//! `LinkEvent` is what the link layer feeds in; `FidoEvent` is what the
//! application handler receives back.

use super::ConnHandle;

/// Raw link-layer events consumed by `FidoService::handle_event`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent<'a> {
    /// A peer connected.
    Connected(ConnHandle),
    /// A peer disconnected (any reason).
    Disconnected(ConnHandle),
    /// The peer wrote `data` to the attribute at `handle`.
    Write {
        conn: ConnHandle,
        handle: u16,
        data: &'a [u8],
    },
    /// A previously queued notification left the radio.
    NotifyComplete(ConnHandle),
    /// ATT MTU exchange finished on this link.
    ///
    /// Optional. The nRF firmware never feeds it, since the SoftDevice GATT
    /// server exposes no exchange callback. Links there use the configured
    /// service-wide ATT MTU for their payload limit.
    MtuExchanged { conn: ConnHandle, att_mtu: u16 },
}

/// Application-facing events. Delivered one at a time, synchronously.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FidoEvent<'a> {
    /// Peer wrote a frame to the control point.
    RxData { conn: ConnHandle, data: &'a [u8] },
    /// The status notification channel can take another frame.
    TxReady { conn: ConnHandle },
    /// Peer enabled status notifications.
    CommStarted { conn: ConnHandle },
    /// Peer disabled status notifications, or disconnected while subscribed.
    CommStopped { conn: ConnHandle },
}

impl FidoEvent<'_> {
    /// Connection the event belongs to.
    pub fn conn(&self) -> ConnHandle {
        match *self {
            FidoEvent::RxData { conn, .. }
            | FidoEvent::TxReady { conn }
            | FidoEvent::CommStarted { conn }
            | FidoEvent::CommStopped { conn } => conn,
        }
    }
}
