//! Demo application: echoes every control point frame back on the status
//! characteristic of the same link.
//!
//! `FidoEvent`s arrive on a synchronous handler inside the GATT server
//! callback, so the handler only copies them into `APP_EVENTS`. The
//! application task owns the replies; a reply refused with `Busy` is held
//! and resent on the link's next `TxReady`.

use ble_fido::config::{MAX_CONNECTIONS, RX_QUEUE_DEPTH};
use ble_fido::fido::{Frame, PendingReplies};
use ble_fido::{ConnHandle, FidoEvent};
use defmt::{debug, info, warn, Format};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::ble::SharedFido;

/// Service events as seen by the application task.
#[derive(Clone, Format)]
pub enum AppEvent {
    Rx(ConnHandle, Frame),
    TxReady(ConnHandle),
    Started(ConnHandle),
    Stopped(ConnHandle),
}

pub static APP_EVENTS: Channel<CriticalSectionRawMutex, AppEvent, RX_QUEUE_DEPTH> =
    Channel::new();

/// Service event handler. Runs inside the GATT server callback and must
/// not block.
pub fn on_fido_event(event: FidoEvent<'_>) {
    let app = match event {
        FidoEvent::RxData { conn, data } => match Frame::from_slice(data) {
            Ok(frame) => AppEvent::Rx(conn, frame),
            Err(()) => {
                warn!("conn {}: dropping {} byte frame", conn.0, data.len());
                return;
            }
        },
        FidoEvent::TxReady { conn } => AppEvent::TxReady(conn),
        FidoEvent::CommStarted { conn } => AppEvent::Started(conn),
        FidoEvent::CommStopped { conn } => AppEvent::Stopped(conn),
    };
    if APP_EVENTS.try_send(app).is_err() {
        warn!("app event queue full");
    }
}

#[embassy_executor::task]
pub async fn app_task(fido: &'static SharedFido) -> ! {
    let mut replies: PendingReplies<MAX_CONNECTIONS> = PendingReplies::new();
    let send = |conn: ConnHandle, data: &[u8]| fido.lock(|f| f.borrow_mut().send(conn, data));

    loop {
        match APP_EVENTS.receive().await {
            AppEvent::Started(conn) => {
                // A new subscription never inherits an earlier reply.
                replies.cancel(conn);
                info!("conn {}: FIDO channel open", conn.0);
            }
            AppEvent::Stopped(conn) => {
                if replies.cancel(conn) {
                    debug!("conn {}: held reply discarded", conn.0);
                }
                info!("conn {}: FIDO channel closed", conn.0);
            }
            AppEvent::Rx(conn, frame) => {
                debug!("conn {}: rx {} bytes", conn.0, frame.len());
                if replies.contains(conn) {
                    warn!("conn {}: reply still pending, dropping frame", conn.0);
                    continue;
                }
                if let Ok(n) = replies.deliver(conn, frame, send) {
                    debug!("conn {}: tx {} bytes", conn.0, n);
                }
            }
            AppEvent::TxReady(conn) => {
                if let Some(frame) = replies.take(conn) {
                    if let Ok(n) = replies.deliver(conn, frame, send) {
                        debug!("conn {}: tx {} bytes (resent)", conn.0, n);
                    }
                }
            }
        }
    }
}
