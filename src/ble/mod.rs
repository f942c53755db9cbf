//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **SoftDevice adapter** - registers the FIDO service in the attribute
//!    table, pushes status notifications and forwards GATT server callbacks
//!    (writes, notification TX complete) into the `FidoService`.
//! 2. **Peripheral** - advertises the FIDO service UUID and runs one
//!    connection task per peer link, reporting connect / disconnect.
//!
//! The `FidoService` instance is shared between tasks behind a blocking
//! mutex; every access happens on the thread-mode executor.

pub mod peripheral;
pub mod softdevice;

use core::cell::RefCell;

use ble_fido::config::MAX_CONNECTIONS;
use ble_fido::{FidoEvent, FidoService};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use softdevice::SoftdeviceNotifier;

/// The concrete service type the firmware runs.
pub type Fido = FidoService<SoftdeviceNotifier, fn(FidoEvent<'_>), MAX_CONNECTIONS>;

/// `Fido` shared between the GATT server callbacks and the application task.
pub type SharedFido = Mutex<CriticalSectionRawMutex, RefCell<Fido>>;
