//! ble-fido firmware
//!
//! nRF52840 + SoftDevice S140 peripheral exposing the FIDO GATT service.
//!
//! Architecture:
//! - `softdevice_task` runs the SoftDevice event loop
//! - `advertise_task` advertises the FIDO service and spawns one
//!   `connection_task` per accepted link
//! - `app_task` consumes service events and echoes frames back
//!
//! Inter-task communication uses Embassy `Channel`s; the service state is
//! shared behind a critical-section mutex.

#![no_std]
#![no_main]

mod app;
mod ble;

use core::cell::RefCell;
use core::mem;

use ble_fido::{config, FidoConfig, FidoEvent};
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::Priority;
use embassy_sync::blocking_mutex::Mutex;
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

use ble::peripheral::advertise_task;
use ble::softdevice::{FidoGattServer, SoftdeviceNotifier, SoftdeviceRegistry};
use ble::{Fido, SharedFido};

static FIDO: StaticCell<SharedFido> = StaticCell::new();
static SERVER: StaticCell<FidoGattServer> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ble-fido starting");

    // The SoftDevice reserves priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let _p = embassy_nrf::init(nrf_config);

    let sd = Softdevice::enable(&softdevice_config());

    let service: Fido = {
        let mut registry = SoftdeviceRegistry::new(&mut *sd);
        let handler: fn(FidoEvent<'_>) = app::on_fido_event;
        match Fido::init(
            FidoConfig::new(handler).with_att_mtu(config::GATT_MAX_ATT_MTU),
            &mut registry,
            SoftdeviceNotifier,
        ) {
            Ok(service) => service,
            Err(e) => defmt::panic!("FIDO service init failed: {}", e),
        }
    };
    info!("FIDO service registered: {}", service.handles());

    let fido: &'static SharedFido = FIDO.init(Mutex::new(RefCell::new(service)));
    let server: &'static FidoGattServer = SERVER.init(FidoGattServer::new(fido));
    let sd: &'static Softdevice = sd;

    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(app::app_task(fido)));
    unwrap!(spawner.spawn(advertise_task(spawner, sd, server)));

    info!("all tasks spawned");
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: config::MAX_CONNECTIONS as u8,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: config::GATT_MAX_ATT_MTU,
        }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: config::MAX_CONNECTIONS as u8,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::DEVICE_NAME.as_ptr() as _,
            current_len: config::DEVICE_NAME.len() as u16,
            max_len: config::DEVICE_NAME.len() as u16,
            // SAFETY: all-zero is "no access", a valid security mode.
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}
