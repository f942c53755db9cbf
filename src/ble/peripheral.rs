//! Advertising and per-link connection tasks.
//!
//! The advertiser loops forever: advertise the FIDO service, hand the
//! accepted link to a free connection task, advertise again. Each
//! connection task reports `Connected`, serves GATT requests until the
//! peer leaves, then reports `Disconnected`.

use ble_fido::config;
use ble_fido::fido::descriptor::UUID_FIDO_SERVICE;
use ble_fido::{ConnHandle, LinkEvent};
use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::{raw, Softdevice};

use super::softdevice::FidoGattServer;

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(
        ServiceList::Complete,
        &[ServiceUuid16::from_u16(UUID_FIDO_SERVICE)],
    )
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .full_name(config::DEVICE_NAME)
    .build();

#[embassy_executor::task]
pub async fn advertise_task(
    spawner: Spawner,
    sd: &'static Softdevice,
    server: &'static FidoGattServer,
) -> ! {
    let adv_config = peripheral::Config {
        interval: config::BLE_ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        let conn = match peripheral::advertise_connectable(sd, adv, &adv_config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("advertising failed: {:?}", e);
                Timer::after(Duration::from_millis(config::BLE_ADV_RETRY_MS)).await;
                continue;
            }
        };

        // Dropping the connection on a failed spawn disconnects the peer.
        if spawner.spawn(connection_task(server, conn)).is_err() {
            warn!("no free connection task, dropping link");
        }
    }
}

#[embassy_executor::task(pool_size = config::MAX_CONNECTIONS)]
async fn connection_task(server: &'static FidoGattServer, conn: Connection) {
    // The raw handle is gone once the link drops, so capture it up front.
    let Some(raw) = conn.handle() else {
        return;
    };
    let handle = ConnHandle(raw);
    info!("peer connected: conn {}", raw);

    if let Err(e) = conn.set_conn_params(conn_params()) {
        warn!("conn {}: connection parameter update failed: {:?}", raw, e);
    }

    server.dispatch(LinkEvent::Connected(handle));
    let reason = gatt_server::run(&conn, server, |_| {}).await;
    info!("peer disconnected: conn {} ({:?})", raw, reason);
    server.dispatch(LinkEvent::Disconnected(handle));
}

fn conn_params() -> raw::ble_gap_conn_params_t {
    raw::ble_gap_conn_params_t {
        min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
        max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
        slave_latency: config::BLE_SLAVE_LATENCY,
        conn_sup_timeout: config::BLE_SUP_TIMEOUT,
    }
}
