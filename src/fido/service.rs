//! FIDO service instance: link event translation and the outbound sender.
//!
//! Per-link state machine:
//!
//! ```text
//!   (no record) --Connected--> NotifyDisabled <--CCCD off-- NotifyEnabled
//!        ^                          |  --CCCD on-->            |
//!        +-------Disconnected-------+--------------------------+
//! ```
//!
//! Everything runs synchronously in the caller's dispatch context. The
//! handler is invoked from inside `handle_event` and must not call back
//! into the service.

use super::descriptor::{FidoHandles, ServiceDescriptor};
use super::event::{FidoEvent, LinkEvent};
use super::link_ctx::{LinkContext, LinkCtxStore};
use super::transport::{GattRegistry, Notifier};
use super::ConnHandle;
use crate::config;
use crate::error::{ConfigError, Error, LinkCtxError, SendError};

/// CCCD bit enabling notifications.
const CCCD_NOTIFICATION: u16 = 0x0001;

/// Init parameters. `handler` is mandatory.
pub struct FidoConfig<H> {
    /// Receives every `FidoEvent`.
    pub handler: Option<H>,
    /// ATT MTU the stack is configured for. `None` falls back to `ATT_MTU_DEFAULT`.
    pub att_mtu: Option<u16>,
}

impl<H> FidoConfig<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Some(handler),
            att_mtu: None,
        }
    }

    pub fn with_att_mtu(mut self, att_mtu: u16) -> Self {
        self.att_mtu = Some(att_mtu);
        self
    }
}

impl<H> Default for FidoConfig<H> {
    fn default() -> Self {
        Self {
            handler: None,
            att_mtu: None,
        }
    }
}

/// A registered FIDO service serving up to `N` links.
pub struct FidoService<T, H, const N: usize> {
    handles: FidoHandles,
    links: LinkCtxStore<N>,
    att_mtu: u16,
    capacity_exceeded: u32,
    notifier: T,
    handler: H,
}

impl<T, H, const N: usize> FidoService<T, H, N>
where
    T: Notifier,
    H: FnMut(FidoEvent<'_>),
{
    /// Validate `config`, register the service and return the instance.
    ///
    /// Nothing is registered when the configuration is rejected.
    pub fn init<R>(config: FidoConfig<H>, registry: &mut R, notifier: T) -> Result<Self, Error>
    where
        R: GattRegistry + ?Sized,
    {
        let handler = config.handler.ok_or(ConfigError::MissingHandler)?;
        if N == 0 {
            return Err(ConfigError::ZeroCapacity.into());
        }

        let att_mtu = config.att_mtu.unwrap_or(config::ATT_MTU_DEFAULT);
        if !(config::ATT_MTU_DEFAULT..=config::ATT_MTU_MAX).contains(&att_mtu) {
            return Err(ConfigError::InvalidAttMtu(att_mtu).into());
        }

        let descriptor = ServiceDescriptor::fido(config::max_data_len(att_mtu));
        let registered = registry.register(&descriptor).map_err(|e| {
            error!("FIDO service registration failed: {}", e);
            e
        })?;
        let handles = FidoHandles::from_registered(&registered)?;

        info!(
            "FIDO service registered (handle {}, att_mtu {}, {} links)",
            handles.service,
            att_mtu,
            N
        );

        Ok(Self {
            handles,
            links: LinkCtxStore::new(),
            att_mtu,
            capacity_exceeded: 0,
            notifier,
            handler,
        })
    }

    /// Feed one link-layer event through the per-link state machine.
    ///
    /// Events for links without a record are dropped: the link layer owns
    /// connection lifetime and late events around a disconnect are expected.
    pub fn handle_event(&mut self, event: LinkEvent<'_>) {
        match event {
            LinkEvent::Connected(conn) => self.on_connect(conn),
            LinkEvent::Disconnected(conn) => self.on_disconnect(conn),
            LinkEvent::Write { conn, handle, data } => self.on_write(conn, handle, data),
            LinkEvent::NotifyComplete(conn) => self.on_notify_complete(conn),
            LinkEvent::MtuExchanged { conn, att_mtu } => self.on_mtu_exchanged(conn, att_mtu),
        }
    }

    /// Send `data` to `conn` as one status notification.
    ///
    /// Returns the number of bytes handed to the link layer. Delivery is
    /// signalled later by `TxReady`; nothing is buffered or retried here.
    pub fn send(&mut self, conn: ConnHandle, data: &[u8]) -> Result<usize, SendError> {
        let ctx = self
            .links
            .get(conn)
            .map_err(|_| SendError::InvalidConnection)?;
        if !ctx.notifications_enabled {
            return Err(SendError::NotifyDisabled);
        }

        let max = self.payload_limit(ctx);
        if data.len() > max {
            return Err(SendError::PayloadTooLarge {
                len: data.len(),
                max,
            });
        }

        self.notifier
            .notify(conn, self.handles.status.value_handle, data)
            .map_err(|e| {
                warn!("notify on link {} failed: {}", conn, e);
                SendError::Transport(e)
            })?;

        Ok(data.len())
    }

    fn on_connect(&mut self, conn: ConnHandle) {
        match self.links.allocate(conn) {
            Ok(()) => debug!("link {} attached ({} active)", conn, self.links.len()),
            Err(LinkCtxError::CapacityExceeded) => {
                self.capacity_exceeded = self.capacity_exceeded.wrapping_add(1);
                warn!("link {} not served: all {} link slots in use", conn, N);
            }
            Err(e) => warn!("link {} attach failed: {}", conn, e),
        }
    }

    fn on_disconnect(&mut self, conn: ConnHandle) {
        let enabled = match self.links.get(conn) {
            Ok(ctx) => ctx.notifications_enabled,
            Err(_) => {
                debug!("disconnect for untracked link {}", conn);
                return;
            }
        };

        if enabled {
            self.emit(FidoEvent::CommStopped { conn });
        }

        if self.links.release(conn).is_ok() {
            debug!("link {} released ({} active)", conn, self.links.len());
        }
    }

    fn on_write(&mut self, conn: ConnHandle, handle: u16, data: &[u8]) {
        if handle == self.handles.control_point.value_handle {
            self.on_control_point_write(conn, data);
        } else if Some(handle) == self.handles.status_cccd() {
            self.on_status_cccd_write(conn, data);
        } else if handle == self.handles.service_revision_bitfield.value_handle {
            self.on_revision_write(conn, data);
        }
    }

    fn on_control_point_write(&mut self, conn: ConnHandle, data: &[u8]) {
        if !self.links.contains(conn) {
            warn!("control point write from unknown link {} dropped", conn);
            return;
        }
        self.emit(FidoEvent::RxData { conn, data });
    }

    fn on_status_cccd_write(&mut self, conn: ConnHandle, data: &[u8]) {
        if !self.links.contains(conn) {
            debug!("CCCD write from untracked link {}", conn);
            return;
        }

        let Ok(raw) = <[u8; 2]>::try_from(data) else {
            warn!("link {}: malformed CCCD write ({} bytes)", conn, data.len());
            return;
        };
        let enabled = u16::from_le_bytes(raw) & CCCD_NOTIFICATION != 0;

        if self.links.set_enabled(conn, enabled).is_err() {
            return;
        }

        if enabled {
            info!("link {}: notifications enabled", conn);
            self.emit(FidoEvent::CommStarted { conn });
            self.emit(FidoEvent::TxReady { conn });
        } else {
            info!("link {}: notifications disabled", conn);
            self.emit(FidoEvent::CommStopped { conn });
        }
    }

    fn on_revision_write(&mut self, conn: ConnHandle, data: &[u8]) {
        let Ok(ctx) = self.links.get_mut(conn) else {
            debug!("revision write from untracked link {}", conn);
            return;
        };

        match data {
            [bits]
                if bits.count_ones() == 1 && bits & config::FIDO_SUPPORTED_REVISIONS == *bits =>
            {
                ctx.selected_revision = Some(*bits);
                debug!("link {}: revision {:#x} selected", conn, bits);
            }
            _ => warn!("link {}: unsupported revision selection rejected", conn),
        }
    }

    fn on_notify_complete(&mut self, conn: ConnHandle) {
        match self.links.get(conn) {
            Ok(ctx) if ctx.notifications_enabled => self.emit(FidoEvent::TxReady { conn }),
            Ok(_) => {}
            Err(_) => debug!("tx complete for untracked link {}", conn),
        }
    }

    fn on_mtu_exchanged(&mut self, conn: ConnHandle, att_mtu: u16) {
        let limit = self.att_mtu;
        match self.links.get_mut(conn) {
            Ok(ctx) => {
                let effective = att_mtu.clamp(config::ATT_MTU_DEFAULT, limit);
                ctx.att_mtu = Some(effective);
                debug!("link {}: att_mtu {} (peer {})", conn, effective, att_mtu);
            }
            Err(_) => debug!("MTU exchange for untracked link {}", conn),
        }
    }

    fn emit(&mut self, event: FidoEvent<'_>) {
        (self.handler)(event);
    }
}

impl<T, H, const N: usize> FidoService<T, H, N> {
    /// Attribute handles assigned at registration.
    pub fn handles(&self) -> &FidoHandles {
        &self.handles
    }

    /// ATT MTU the service was configured for.
    pub fn att_mtu(&self) -> u16 {
        self.att_mtu
    }

    /// Service-wide maximum notification payload.
    pub fn max_data_len(&self) -> usize {
        config::max_data_len(self.att_mtu) as usize
    }

    /// Maximum notification payload on `conn`, honouring its MTU exchange.
    pub fn max_payload_len(&self, conn: ConnHandle) -> Result<usize, LinkCtxError> {
        self.links.get(conn).map(|ctx| self.payload_limit(ctx))
    }

    pub fn link_context(&self, conn: ConnHandle) -> Result<&LinkContext, LinkCtxError> {
        self.links.get(conn)
    }

    pub fn is_notification_enabled(&self, conn: ConnHandle) -> bool {
        self.links
            .get(conn)
            .map(|ctx| ctx.notifications_enabled)
            .unwrap_or(false)
    }

    /// Number of links currently holding a record.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn connections(&self) -> impl Iterator<Item = ConnHandle> + '_ {
        self.links.connections()
    }

    /// How many connects found the link table full.
    pub fn capacity_exceeded_count(&self) -> u32 {
        self.capacity_exceeded
    }

    pub fn notifier(&self) -> &T {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut T {
        &mut self.notifier
    }

    fn payload_limit(&self, ctx: &LinkContext) -> usize {
        let att_mtu = ctx.att_mtu.unwrap_or(self.att_mtu);
        config::max_data_len(att_mtu) as usize
    }
}
