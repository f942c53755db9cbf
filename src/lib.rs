//! FIDO-over-GATT service library.
//!
//! Everything in here is hardware independent and runs on the host:
//! the per-link context table, the link event translator, the outbound
//! notification sender and the service descriptor. The SoftDevice glue
//! lives in the firmware binary (`src/main.rs`, `src/ble/`).
//!
//! Usage: `cargo test` on the host, `cargo build --release --features embedded`
//! for the nRF52840 image.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod fido;

pub use error::{ConfigError, Error, LinkCtxError, RegistrationError, SendError, TransportError};
pub use fido::{ConnHandle, FidoConfig, FidoEvent, FidoService, LinkEvent};
