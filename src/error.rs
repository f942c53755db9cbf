//! Unified error types for ble-fido.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Errors from `FidoService::init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Required configuration was missing or out of range at init.
    Config(ConfigError),

    /// The attribute table rejected the service definition.
    RegistrationFailed(RegistrationError),
}

/// Init-time configuration problems. Fatal, nothing is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No event handler was supplied.
    MissingHandler,
    /// ATT MTU outside `ATT_MTU_DEFAULT..=ATT_MTU_MAX`.
    InvalidAttMtu(u16),
    /// The link context table was sized for zero links.
    ZeroCapacity,
}

/// Link context table failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkCtxError {
    /// Every slot is taken.
    CapacityExceeded,
    /// The connection already owns a record.
    AlreadyAllocated,
    /// No record for the connection.
    NotFound,
}

/// Outbound notification failures, returned from `FidoService::send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// The connection is not known to the service.
    InvalidConnection,
    /// The peer has not subscribed to the status characteristic.
    NotifyDisabled,
    /// Payload exceeds what one notification can carry on this link.
    PayloadTooLarge { len: usize, max: usize },
    /// The link layer refused the notification.
    Transport(TransportError),
}

/// Errors reported by the link layer's notify primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No buffer available for another notification right now.
    Busy,
    /// The link went away underneath the call.
    Disconnected,
    /// Raw SoftDevice error code.
    Raw(u32),
}

/// Attribute table registration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationError {
    /// Raw error code from the attribute table.
    Rejected(u32),
    /// The registry returned a different number of characteristics than requested.
    HandleCountMismatch { expected: usize, actual: usize },
    /// The status characteristic came back without a CCCD.
    MissingCccd,
}

// Convenience conversions

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<RegistrationError> for Error {
    fn from(e: RegistrationError) -> Self {
        Error::RegistrationFailed(e)
    }
}

impl From<TransportError> for SendError {
    fn from(e: TransportError) -> Self {
        SendError::Transport(e)
    }
}
