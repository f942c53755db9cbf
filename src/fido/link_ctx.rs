//! Per-link context table.
//!
//! Fixed-capacity arena keyed by connection handle. One record exists
//! for every link the service currently tracks; disconnect evicts it and
//! a reconnect on the same handle starts from a fresh default record.

use heapless::Vec;

use super::ConnHandle;
use crate::error::LinkCtxError;

/// State the service keeps for one connected peer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkContext {
    /// Peer has enabled notifications on the status characteristic.
    pub notifications_enabled: bool,
    /// ATT MTU agreed on this link, if an exchange happened.
    pub att_mtu: Option<u16>,
    /// Revision bit the peer selected through the revision bitfield.
    pub selected_revision: Option<u8>,
}

/// Link context storage for up to `N` concurrent connections.
pub struct LinkCtxStore<const N: usize> {
    links: Vec<(ConnHandle, LinkContext), N>,
}

impl<const N: usize> LinkCtxStore<N> {
    pub const fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Create a default record for `conn`.
    pub fn allocate(&mut self, conn: ConnHandle) -> Result<(), LinkCtxError> {
        if self.position(conn).is_some() {
            return Err(LinkCtxError::AlreadyAllocated);
        }
        self.links
            .push((conn, LinkContext::default()))
            .map_err(|_| LinkCtxError::CapacityExceeded)
    }

    /// Drop the record for `conn`. A second release reports `NotFound`.
    pub fn release(&mut self, conn: ConnHandle) -> Result<LinkContext, LinkCtxError> {
        let idx = self.position(conn).ok_or(LinkCtxError::NotFound)?;
        Ok(self.links.swap_remove(idx).1)
    }

    pub fn get(&self, conn: ConnHandle) -> Result<&LinkContext, LinkCtxError> {
        self.links
            .iter()
            .find_map(|(c, ctx)| (*c == conn).then_some(ctx))
            .ok_or(LinkCtxError::NotFound)
    }

    pub fn get_mut(&mut self, conn: ConnHandle) -> Result<&mut LinkContext, LinkCtxError> {
        self.links
            .iter_mut()
            .find_map(|(c, ctx)| (*c == conn).then_some(ctx))
            .ok_or(LinkCtxError::NotFound)
    }

    pub fn set_enabled(&mut self, conn: ConnHandle, enabled: bool) -> Result<(), LinkCtxError> {
        self.get_mut(conn)?.notifications_enabled = enabled;
        Ok(())
    }

    pub fn contains(&self, conn: ConnHandle) -> bool {
        self.position(conn).is_some()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.links.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Handles of every tracked link, in no particular order.
    pub fn connections(&self) -> impl Iterator<Item = ConnHandle> + '_ {
        self.links.iter().map(|(c, _)| *c)
    }

    fn position(&self, conn: ConnHandle) -> Option<usize> {
        self.links.iter().position(|(c, _)| *c == conn)
    }
}

impl<const N: usize> Default for LinkCtxStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C1: ConnHandle = ConnHandle(1);
    const C2: ConnHandle = ConnHandle(2);
    const C3: ConnHandle = ConnHandle(3);

    #[test]
    fn allocate_creates_disabled_record() {
        let mut store = LinkCtxStore::<2>::new();
        store.allocate(C1).unwrap();
        let ctx = store.get(C1).unwrap();
        assert!(!ctx.notifications_enabled);
        assert_eq!(ctx.att_mtu, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn allocate_twice_is_rejected() {
        let mut store = LinkCtxStore::<2>::new();
        store.allocate(C1).unwrap();
        assert_eq!(store.allocate(C1), Err(LinkCtxError::AlreadyAllocated));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn allocate_beyond_capacity_fails_without_overwrite() {
        let mut store = LinkCtxStore::<2>::new();
        store.allocate(C1).unwrap();
        store.allocate(C2).unwrap();
        assert!(store.is_full());
        assert_eq!(store.allocate(C3), Err(LinkCtxError::CapacityExceeded));
        assert_eq!(store.len(), 2);
        assert!(store.contains(C1));
        assert!(store.contains(C2));
        assert!(!store.contains(C3));
    }

    #[test]
    fn release_frees_slot_for_new_link() {
        let mut store = LinkCtxStore::<2>::new();
        store.allocate(C1).unwrap();
        store.allocate(C2).unwrap();
        store.release(C1).unwrap();
        store.allocate(C3).unwrap();
        assert!(store.contains(C2));
        assert!(store.contains(C3));
        assert!(!store.contains(C1));
    }

    #[test]
    fn second_release_reports_not_found() {
        let mut store = LinkCtxStore::<2>::new();
        store.allocate(C1).unwrap();
        assert!(store.release(C1).is_ok());
        assert_eq!(store.release(C1), Err(LinkCtxError::NotFound));
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_connection_lookups_fail() {
        let mut store = LinkCtxStore::<2>::new();
        assert_eq!(store.get(C1), Err(LinkCtxError::NotFound));
        assert_eq!(store.set_enabled(C1, true), Err(LinkCtxError::NotFound));
    }

    #[test]
    fn set_enabled_is_per_connection() {
        let mut store = LinkCtxStore::<2>::new();
        store.allocate(C1).unwrap();
        store.allocate(C2).unwrap();
        store.set_enabled(C1, true).unwrap();
        assert!(store.get(C1).unwrap().notifications_enabled);
        assert!(!store.get(C2).unwrap().notifications_enabled);
    }

    #[test]
    fn reconnect_starts_from_default_record() {
        let mut store = LinkCtxStore::<2>::new();
        store.allocate(C1).unwrap();
        store.set_enabled(C1, true).unwrap();
        store.get_mut(C1).unwrap().att_mtu = Some(185);
        let released = store.release(C1).unwrap();
        assert!(released.notifications_enabled);

        store.allocate(C1).unwrap();
        assert_eq!(*store.get(C1).unwrap(), LinkContext::default());
    }

    #[test]
    fn store_tracks_exactly_connected_set() {
        // Pseudo-random connect/disconnect sequence against a reference model.
        let mut store = LinkCtxStore::<3>::new();
        let mut model: std::vec::Vec<ConnHandle> = std::vec::Vec::new();
        let mut seed: u32 = 0x1234_5678;

        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let conn = ConnHandle((seed % 6) as u16);

            if seed & 0x100 == 0 {
                let result = store.allocate(conn);
                if model.contains(&conn) {
                    assert_eq!(result, Err(LinkCtxError::AlreadyAllocated));
                } else if model.len() == 3 {
                    assert_eq!(result, Err(LinkCtxError::CapacityExceeded));
                } else {
                    assert_eq!(result, Ok(()));
                    model.push(conn);
                }
            } else {
                let result = store.release(conn);
                match model.iter().position(|c| *c == conn) {
                    Some(i) => {
                        assert!(result.is_ok());
                        model.swap_remove(i);
                    }
                    None => assert_eq!(result, Err(LinkCtxError::NotFound)),
                }
            }

            assert_eq!(store.len(), model.len());
            for c in &model {
                assert!(store.contains(*c));
            }
        }
    }
}
