//! Application-wide constants and compile-time configuration.
//!
//! All link limits, ATT sizes, advertising parameters and FIDO service
//! metadata live here so they can be tuned in one place.

// Links

/// Maximum simultaneous peripheral links served by the FIDO service.
pub const MAX_CONNECTIONS: usize = 2;

// ATT / GATT sizes

/// ATT MTU every link starts with before an MTU exchange (Bluetooth Core minimum).
pub const ATT_MTU_DEFAULT: u16 = 23;

/// Largest ATT MTU the attribute protocol allows.
pub const ATT_MTU_MAX: u16 = 517;

/// ATT MTU the SoftDevice is configured for (`NRF_SDH_BLE_GATT_MAX_MTU_SIZE`).
pub const GATT_MAX_ATT_MTU: u16 = 247;

/// Handle Value Notification opcode size.
pub const OPCODE_LENGTH: u16 = 1;

/// Attribute handle size inside a notification PDU.
pub const HANDLE_LENGTH: u16 = 2;

/// Fixed per-notification overhead: opcode + attribute handle.
pub const ATT_NOTIFY_HEADER_LEN: u16 = OPCODE_LENGTH + HANDLE_LENGTH;

/// Maximum payload of one status notification at the configured MTU.
pub const MAX_DATA_LEN: usize = (GATT_MAX_ATT_MTU - ATT_NOTIFY_HEADER_LEN) as usize;

/// Usable payload for a given ATT MTU.
pub const fn max_data_len(att_mtu: u16) -> u16 {
    att_mtu.saturating_sub(ATT_NOTIFY_HEADER_LEN)
}

// Advertising

/// GAP device name.
pub const DEVICE_NAME: &str = "ble-fido";

/// Advertising interval (in 0.625 ms units). 64 = 40 ms.
pub const BLE_ADV_INTERVAL: u32 = 64;

/// Connection interval range (in 1.25 ms units).
pub const BLE_CONN_INTERVAL_MIN: u16 = 12;
pub const BLE_CONN_INTERVAL_MAX: u16 = 24;

/// Slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// Supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// Delay before advertising is retried after a SoftDevice error (ms).
pub const BLE_ADV_RETRY_MS: u64 = 500;

// FIDO service

/// Service revision bitfield bit for U2F 1.1.
pub const FIDO_REVISION_U2F_1_1: u8 = 0x80;

/// Service revision bitfield bit for U2F 1.2.
pub const FIDO_REVISION_U2F_1_2: u8 = 0x40;

/// Service revision bitfield bit for FIDO2 (CTAP2).
pub const FIDO_REVISION_FIDO2: u8 = 0x20;

/// Revisions this service accepts from a peer.
pub const FIDO_SUPPORTED_REVISIONS: u8 = FIDO_REVISION_FIDO2;

/// Value of the (deprecated) FIDO Service Revision string characteristic.
pub const FIDO_SERVICE_REVISION: &str = "1.0";

/// Depth of the received-frame queue between the service and the application task.
pub const RX_QUEUE_DEPTH: usize = 4;
