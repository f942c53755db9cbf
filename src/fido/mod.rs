//! FIDO GATT service.
//!
//! A bidirectional byte channel over two characteristics:
//!
//! 1. **Control Point** - the peer writes frames, surfaced as `FidoEvent::RxData`.
//! 2. **Status** - the device notifies frames back through `FidoService::send`,
//!    gated by the peer's CCCD subscription and by `TxReady` events.
//!
//! Each connected peer gets its own record in a fixed-capacity link
//! context table, so several peers can subscribe and unsubscribe
//! independently. Payloads are opaque bytes; CTAP framing lives above
//! this module.

pub mod descriptor;
pub mod event;
pub mod link_ctx;
pub mod reply;
pub mod service;
pub mod transport;


pub use descriptor::{
    CharHandles, CharProps, CharacteristicDescriptor, FidoHandles, RegisteredService,
    ServiceDescriptor,
};
pub use event::{FidoEvent, LinkEvent};
pub use link_ctx::{LinkContext, LinkCtxStore};
pub use reply::{Frame, PendingReplies};
pub use service::{FidoConfig, FidoService};
pub use transport::{GattRegistry, Notifier};

/// Link-layer connection handle. Valid for the lifetime of one link and
/// reusable by the stack afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnHandle(pub u16);

impl From<u16> for ConnHandle {
    fn from(raw: u16) -> Self {
        ConnHandle(raw)
    }
}
