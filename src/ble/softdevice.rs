//! SoftDevice adapter for the FIDO service.
//!
//! - `SoftdeviceRegistry` builds the service through the SoftDevice
//!   `ServiceBuilder` and reports the assigned handles.
//! - `SoftdeviceNotifier` maps `Notifier::notify` onto `sd_ble_gatts_hvx`.
//! - `FidoGattServer` receives raw GATT server callbacks and feeds them to
//!   the shared `FidoService` as `LinkEvent`s.

use ble_fido::error::{RegistrationError, TransportError};
use ble_fido::fido::{
    CharHandles, CharProps, GattRegistry, Notifier, RegisteredService, ServiceDescriptor,
};
use ble_fido::{ConnHandle, LinkEvent};
use defmt::{debug, warn};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, NotifyValueError, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, Uuid};
use nrf_softdevice::{RawError, Softdevice};

use super::SharedFido;

/// One-shot attribute table registration. Needs exclusive access to the
/// SoftDevice, so it runs before `Softdevice::run` is spawned.
pub struct SoftdeviceRegistry<'a> {
    sd: &'a mut Softdevice,
}

impl<'a> SoftdeviceRegistry<'a> {
    pub fn new(sd: &'a mut Softdevice) -> Self {
        Self { sd }
    }
}

impl GattRegistry for SoftdeviceRegistry<'_> {
    fn register(
        &mut self,
        service: &ServiceDescriptor,
    ) -> Result<RegisteredService, RegistrationError> {
        let mut sb =
            ServiceBuilder::new(self.sd, Uuid::new_16(service.uuid)).map_err(register_error)?;
        let mut registered = RegisteredService::default();

        for c in &service.characteristics {
            let mut attr = Attribute::new(c.value.as_slice());
            if c.variable_len {
                attr = attr.variable_len(c.max_len);
            }
            let md = Metadata::new(properties(c.props));
            let handles = sb
                .add_characteristic(Uuid::new_16(c.uuid), attr, md)
                .map_err(register_error)?
                .build();

            debug!(
                "char {:04x}: value {} cccd {}",
                c.uuid, handles.value_handle, handles.cccd_handle
            );

            registered
                .characteristics
                .push(CharHandles {
                    value_handle: handles.value_handle,
                    cccd_handle: (handles.cccd_handle != 0).then_some(handles.cccd_handle),
                })
                .map_err(|_| RegistrationError::HandleCountMismatch {
                    expected: service.characteristics.len(),
                    actual: service.characteristics.len() + 1,
                })?;
        }

        registered.service_handle = sb.build().handle();
        Ok(registered)
    }
}

fn properties(props: CharProps) -> Properties {
    let mut p = Properties::new();
    if props.read {
        p = p.read();
    }
    if props.write {
        p = p.write();
    }
    if props.notify {
        p = p.notify();
    }
    p
}

fn register_error(e: RegisterError) -> RegistrationError {
    warn!("SoftDevice rejected attribute: {:?}", e);
    match e {
        RegisterError::Raw(raw) => RegistrationError::Rejected(raw as u32),
    }
}

/// Status notifications through the SoftDevice.
pub struct SoftdeviceNotifier;

impl Notifier for SoftdeviceNotifier {
    fn notify(
        &mut self,
        conn: ConnHandle,
        value_handle: u16,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let link = Connection::from_handle(conn.0).ok_or(TransportError::Disconnected)?;
        gatt_server::notify_value(&link, value_handle, data).map_err(|e| match e {
            NotifyValueError::Disconnected => TransportError::Disconnected,
            NotifyValueError::Raw(RawError::Resources) => TransportError::Busy,
            NotifyValueError::Raw(raw) => TransportError::Raw(raw as u32),
        })
    }
}

/// GATT server callbacks for the FIDO attributes.
pub struct FidoGattServer {
    fido: &'static SharedFido,
}

impl FidoGattServer {
    pub fn new(fido: &'static SharedFido) -> Self {
        Self { fido }
    }

    /// Feed one event to the shared service.
    pub fn dispatch(&self, event: LinkEvent<'_>) {
        self.fido.lock(|f| f.borrow_mut().handle_event(event));
    }
}

impl gatt_server::Server for FidoGattServer {
    type Event = ();

    fn on_write(
        &self,
        conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        if let Some(raw) = conn.handle() {
            self.dispatch(LinkEvent::Write {
                conn: ConnHandle(raw),
                handle,
                data,
            });
        }
        None
    }

    fn on_notify_tx_complete(&self, conn: &Connection, _count: u8) -> Option<Self::Event> {
        if let Some(raw) = conn.handle() {
            self.dispatch(LinkEvent::NotifyComplete(ConnHandle(raw)));
        }
        None
    }
}
