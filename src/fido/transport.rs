//! Link-layer seams.
//!
//! The service never talks to a BLE stack directly. The firmware
//! implements these for the SoftDevice; tests implement them with mocks.
//! Implementations do NOT need to be `Send` or `Sync` - the service runs
//! in a single executor context.

use super::descriptor::{RegisteredService, ServiceDescriptor};
use super::ConnHandle;
use crate::error::{RegistrationError, TransportError};

/// One-time attribute table registration.
pub trait GattRegistry {
    /// Create the service and its characteristics.
    ///
    /// Returned handles must follow `service.characteristics` order.
    fn register(&mut self, service: &ServiceDescriptor)
        -> Result<RegisteredService, RegistrationError>;
}

/// Handle Value Notification primitive.
pub trait Notifier {
    /// Queue one notification of `data` on attribute `value_handle` towards `conn`.
    ///
    /// Returning `Ok` means queued, not delivered; completion arrives later
    /// as `LinkEvent::NotifyComplete`.
    fn notify(&mut self, conn: ConnHandle, value_handle: u16, data: &[u8])
        -> Result<(), TransportError>;
}

impl<T: Notifier + ?Sized> Notifier for &mut T {
    fn notify(
        &mut self,
        conn: ConnHandle,
        value_handle: u16,
        data: &[u8],
    ) -> Result<(), TransportError> {
        (**self).notify(conn, value_handle, data)
    }
}
