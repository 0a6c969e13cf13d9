use no_std_net::SocketAddr;

use crate::error::Error;

pub const MAX_SOCKETS: usize = 7;

/// Invoked from the URC loop when a socket has data pending or was closed
/// by the peer.
pub type SocketCallback<'d> = &'d dyn Fn(SocketHandle);

/// Opaque reference to an open socket. Never reused within one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketHandle(pub(crate) u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    Tcp,
    Udp,
}

pub(crate) struct Socket<'d> {
    pub(crate) handle: SocketHandle,
    /// Modem side socket number, once created
    pub(crate) id: Option<u8>,
    pub(crate) protocol: Protocol,
    pub(crate) local_port: Option<u16>,
    pub(crate) remote: Option<SocketAddr>,
    pub(crate) started: bool,
    pub(crate) connected: bool,
    pub(crate) tx_ready: bool,
    /// Closed by the peer
    pub(crate) closed: bool,
    pub(crate) pending_bytes: usize,
    pub(crate) callback: Option<SocketCallback<'d>>,
}

impl<'d> Socket<'d> {
    fn new(handle: SocketHandle, protocol: Protocol) -> Self {
        Self {
            handle,
            id: None,
            protocol,
            local_port: None,
            remote: None,
            started: true,
            connected: false,
            tx_ready: false,
            closed: false,
            pending_bytes: 0,
            callback: None,
        }
    }
}

/// Fixed capacity socket records of one context.
pub(crate) struct SocketTable<'d> {
    slots: [Option<Socket<'d>>; MAX_SOCKETS],
    capacity: usize,
    next_handle: u16,
}

impl<'d> SocketTable<'d> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: Default::default(),
            capacity: capacity.min(MAX_SOCKETS),
            next_handle: 0,
        }
    }

    pub(crate) fn open(&mut self, protocol: Protocol) -> Result<SocketHandle, Error> {
        let slot = self.slots[..self.capacity]
            .iter_mut()
            .find(|s| s.is_none())
            .ok_or(Error::NoSocket)?;

        let handle = SocketHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        *slot = Some(Socket::new(handle, protocol));
        Ok(handle)
    }

    /// Resolves only handles of started sockets.
    pub(crate) fn get_mut(&mut self, handle: SocketHandle) -> Option<&mut Socket<'d>> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|s| s.handle == handle && s.started)
    }

    pub(crate) fn by_id(&mut self, id: u8) -> Option<&mut Socket<'d>> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|s| s.id == Some(id))
    }

    pub(crate) fn remove(&mut self, handle: SocketHandle) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|s| s.as_ref().is_some_and(|s| s.handle == handle))
        {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    /// Forget every socket, without touching the modem.
    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_table_is_left_untouched() {
        let mut table = SocketTable::new(2);
        let a = table.open(Protocol::Udp).unwrap();
        let b = table.open(Protocol::Tcp).unwrap();
        assert_ne!(a, b);

        assert_eq!(table.open(Protocol::Udp), Err(Error::NoSocket));
        assert_eq!(table.len(), 2);
        assert!(table.get_mut(a).is_some());
        assert!(table.get_mut(b).is_some());
    }

    #[test]
    fn handles_are_not_reused() {
        let mut table = SocketTable::new(1);
        let a = table.open(Protocol::Udp).unwrap();
        assert!(table.remove(a));
        assert!(!table.remove(a));

        let b = table.open(Protocol::Udp).unwrap();
        assert_ne!(a, b);
        assert!(table.get_mut(a).is_none());
    }

    #[test]
    fn capacity_is_bounded() {
        assert_eq!(SocketTable::new(0).capacity(), 0);
        assert_eq!(SocketTable::new(12).capacity(), MAX_SOCKETS);
        assert_eq!(SocketTable::new(0).open(Protocol::Tcp), Err(Error::NoSocket));
    }
}
