//! Static description of the FIDO GATT service and the handles the
//! attribute table hands back for it.
//!
//! Layout:
//! ```text
//! FIDO Service (0xFFFD)
//!   0xFFF1 Control Point                write
//!   0xFFF2 Status                       notify (+ CCCD)
//!   0xFFF3 Control Point Length         read, u16 big-endian
//!   0xFFF4 Service Revision Bitfield    read, write, 1 byte
//!   0x2A28 Service Revision             read, "1.0"
//! ```

use heapless::Vec;

use crate::config;
use crate::error::RegistrationError;

/// The UUID of the FIDO Service.
pub const UUID_FIDO_SERVICE: u16 = 0xFFFD;
/// The UUID of the FIDO Control Point.
pub const UUID_FIDO_CONTROL_POINT: u16 = 0xFFF1;
/// The UUID of the FIDO Status.
pub const UUID_FIDO_STATUS: u16 = 0xFFF2;
/// The UUID of the FIDO Control Point Length.
pub const UUID_FIDO_CONTROL_POINT_LENGTH: u16 = 0xFFF3;
/// The UUID of the FIDO Service Revision Bitfield.
pub const UUID_FIDO_SERVICE_REVISION_BITFIELD: u16 = 0xFFF4;
/// The UUID of the FIDO Service Revision (Software Revision String).
pub const UUID_FIDO_SERVICE_REVISION: u16 = 0x2A28;

/// Number of characteristics in the FIDO service.
pub const FIDO_CHARACTERISTIC_COUNT: usize = 5;

/// Largest fixed initial value carried by a descriptor.
pub const MAX_INITIAL_VALUE_LEN: usize = 4;

/// Characteristic properties, built like `Properties::new().read().notify()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharProps {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

impl CharProps {
    pub const fn new() -> Self {
        Self {
            read: false,
            write: false,
            notify: false,
        }
    }

    pub const fn read(mut self) -> Self {
        self.read = true;
        self
    }

    pub const fn write(mut self) -> Self {
        self.write = true;
        self
    }

    pub const fn notify(mut self) -> Self {
        self.notify = true;
        self
    }
}

/// One characteristic to register.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicDescriptor {
    /// 16-bit UUID.
    pub uuid: u16,
    pub props: CharProps,
    /// Initial value.
    pub value: Vec<u8, MAX_INITIAL_VALUE_LEN>,
    /// Maximum value length. Equal to `value.len()` for fixed-length values.
    pub max_len: u16,
    /// Whether the value length may vary up to `max_len`.
    pub variable_len: bool,
}

impl CharacteristicDescriptor {
    fn fixed(uuid: u16, props: CharProps, value: &[u8]) -> Self {
        let mut v = Vec::new();
        // Callers only pass values up to MAX_INITIAL_VALUE_LEN.
        let _ = v.extend_from_slice(&value[..value.len().min(MAX_INITIAL_VALUE_LEN)]);
        Self {
            uuid,
            props,
            max_len: v.len() as u16,
            value: v,
            variable_len: false,
        }
    }

    fn variable(uuid: u16, props: CharProps, max_len: u16) -> Self {
        Self {
            uuid,
            props,
            value: Vec::new(),
            max_len,
            variable_len: true,
        }
    }
}

/// Everything the attribute table needs to create the service.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceDescriptor {
    /// 16-bit service UUID.
    pub uuid: u16,
    /// Characteristics in registration order.
    pub characteristics: Vec<CharacteristicDescriptor, FIDO_CHARACTERISTIC_COUNT>,
}

impl ServiceDescriptor {
    /// Build the FIDO service for a given maximum frame length.
    pub fn fido(max_data_len: u16) -> Self {
        let mut characteristics = Vec::new();
        for c in [
            CharacteristicDescriptor::variable(
                UUID_FIDO_CONTROL_POINT,
                CharProps::new().write(),
                max_data_len,
            ),
            CharacteristicDescriptor::variable(
                UUID_FIDO_STATUS,
                CharProps::new().notify(),
                max_data_len,
            ),
            CharacteristicDescriptor::fixed(
                UUID_FIDO_CONTROL_POINT_LENGTH,
                CharProps::new().read(),
                &max_data_len.to_be_bytes(),
            ),
            CharacteristicDescriptor::fixed(
                UUID_FIDO_SERVICE_REVISION_BITFIELD,
                CharProps::new().read().write(),
                &[config::FIDO_SUPPORTED_REVISIONS],
            ),
            CharacteristicDescriptor::fixed(
                UUID_FIDO_SERVICE_REVISION,
                CharProps::new().read(),
                config::FIDO_SERVICE_REVISION.as_bytes(),
            ),
        ] {
            // Exactly FIDO_CHARACTERISTIC_COUNT entries.
            let _ = characteristics.push(c);
        }

        Self {
            uuid: UUID_FIDO_SERVICE,
            characteristics,
        }
    }
}

/// Attribute handles of one registered characteristic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharHandles {
    pub value_handle: u16,
    /// Client Characteristic Configuration Descriptor, present for notify characteristics.
    pub cccd_handle: Option<u16>,
}

/// What a registry returns for a `ServiceDescriptor`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisteredService {
    pub service_handle: u16,
    /// One entry per requested characteristic, same order as the descriptor.
    pub characteristics: Vec<CharHandles, FIDO_CHARACTERISTIC_COUNT>,
}

/// Handles of the registered FIDO service, by role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FidoHandles {
    pub service: u16,
    pub control_point: CharHandles,
    pub status: CharHandles,
    pub control_point_length: CharHandles,
    pub service_revision_bitfield: CharHandles,
    pub service_revision: CharHandles,
}

impl FidoHandles {
    /// Map registry output back to characteristic roles.
    pub fn from_registered(registered: &RegisteredService) -> Result<Self, RegistrationError> {
        let [control_point, status, control_point_length, service_revision_bitfield, service_revision] =
            match registered.characteristics.as_slice() {
                [a, b, c, d, e] => [*a, *b, *c, *d, *e],
                other => {
                    return Err(RegistrationError::HandleCountMismatch {
                        expected: FIDO_CHARACTERISTIC_COUNT,
                        actual: other.len(),
                    })
                }
            };

        if status.cccd_handle.is_none() {
            return Err(RegistrationError::MissingCccd);
        }

        Ok(Self {
            service: registered.service_handle,
            control_point,
            status,
            control_point_length,
            service_revision_bitfield,
            service_revision,
        })
    }

    /// CCCD handle of the status characteristic.
    pub fn status_cccd(&self) -> Option<u16> {
        self.status.cccd_handle
    }
}
