//! Sockets offloaded to the modem's own IP stack.
//!
//! Every operation resolves its [`SocketHandle`] first; an unknown or closed
//! handle fails with [`Error::NoSocket`] before anything is sent. Modem side
//! sockets are created lazily, on connect (TCP) or first transfer.

pub mod socket;

use core::fmt::Write as _;

use atat::asynch::AtatClient;
use heapless::String;
use no_std_net::{IpAddr, SocketAddr};

use crate::{
    command::ip_transport_layer::{
        types::{HexMode, SocketProtocol},
        CloseSocket, ConnectSocket, CreateSocket, ReadSocketData, ReadUDPSocketData, SendToHex,
        SetHexMode, WriteSocketDataHex, EGRESS_CHUNK_SIZE, INGRESS_CHUNK_SIZE,
    },
    context::{ContextHandle, ContextState, PdpType},
    device::Device,
    error::Error,
    hex::{decode_hex, encode_hex},
    modules::ModuleParams,
    properties::Property,
};

pub use socket::{Protocol, SocketCallback, SocketHandle, MAX_SOCKETS};

use socket::Socket;

fn ip_string(ip: &IpAddr) -> Result<String<39>, Error> {
    let mut s = String::new();
    write!(s, "{}", ip).map_err(|_| Error::Parameter)?;
    Ok(s)
}

/// Network stack of one context.
pub struct Stack<'a, 'd, AT: AtatClient, M: ModuleParams> {
    device: &'a Device<'d, AT, M>,
    context: ContextHandle,
}

impl<'a, 'd, AT: AtatClient, M: ModuleParams> Stack<'a, 'd, AT, M> {
    pub(crate) fn new(device: &'a Device<'d, AT, M>, context: ContextHandle) -> Self {
        Self { device, context }
    }

    fn with_socket<R>(
        &self,
        handle: SocketHandle,
        f: impl FnOnce(&mut Socket<'d>) -> R,
    ) -> Result<R, Error> {
        let mut contexts = self.device.contexts.borrow_mut();
        let socket = contexts
            .get_mut(self.context)
            .and_then(|r| r.sockets.get_mut(handle))
            .ok_or(Error::NoSocket)?;
        Ok(f(socket))
    }

    fn context_connected(&self) -> bool {
        self.device
            .contexts
            .borrow()
            .get(self.context)
            .is_some_and(|r| r.state == ContextState::Connected)
    }

    /// Negotiated stack type, or the requested one before activation.
    fn stack_type(&self) -> Option<PdpType> {
        self.device
            .contexts
            .borrow()
            .get(self.context)
            .and_then(|r| {
                if r.nonip_req {
                    Some(PdpType::NonIp)
                } else {
                    r.negotiated.or(r.stack_type)
                }
            })
    }

    fn check_family(&self, addr: &SocketAddr) -> Result<(), Error> {
        match self.stack_type() {
            None => Ok(()),
            Some(t) if t.carries(&addr.ip()) => Ok(()),
            Some(t) => {
                warn!("{:?} context can't reach {:?}", t, addr);
                Err(Error::Parameter)
            }
        }
    }

    pub fn socket_open(&self, protocol: Protocol) -> Result<SocketHandle, Error> {
        let property = match protocol {
            Protocol::Tcp => Property::IpTcp,
            Protocol::Udp => Property::IpUdp,
        };
        if !self.device.properties.is_supported(property) {
            return Err(Error::Unsupported);
        }

        let mut contexts = self.device.contexts.borrow_mut();
        let record = contexts.get_mut(self.context).ok_or(Error::NoSocket)?;
        let handle = record.sockets.open(protocol)?;
        debug!("Opened {:?} socket {:?}", protocol, handle);
        Ok(handle)
    }

    pub async fn socket_close(&self, handle: SocketHandle) -> Result<(), Error> {
        let id = self.with_socket(handle, |s| s.id)?;
        if let Some(id) = id {
            self.device.at.send(&CloseSocket { socket: id }).await?;
        }

        if let Some(record) = self.device.contexts.borrow_mut().get_mut(self.context) {
            record.sockets.remove(handle);
        }
        debug!("Closed socket {:?}", handle);
        Ok(())
    }

    /// Local port to create the modem socket with.
    pub fn socket_bind(&self, handle: SocketHandle, port: u16) -> Result<(), Error> {
        self.with_socket(handle, |s| {
            if s.id.is_some() {
                return Err(Error::Parameter);
            }
            s.local_port = (port != 0).then_some(port);
            Ok(())
        })?
    }

    pub fn socket_listen(&self, handle: SocketHandle, _backlog: usize) -> Result<(), Error> {
        self.with_socket(handle, |_| ())?;
        Err(Error::Unsupported)
    }

    pub fn socket_accept(&self, handle: SocketHandle) -> Result<SocketHandle, Error> {
        self.with_socket(handle, |_| ())?;
        Err(Error::Unsupported)
    }

    /// TCP sockets connect on the modem; UDP sockets only remember the
    /// peer.
    pub async fn socket_connect(&self, handle: SocketHandle, addr: SocketAddr) -> Result<(), Error> {
        let protocol = self.with_socket(handle, |s| s.protocol)?;
        self.check_family(&addr)?;

        if protocol == Protocol::Tcp {
            let id = self.ensure_created(handle).await?;
            let remote_addr = ip_string(&addr.ip())?;
            self.device
                .at
                .send(&ConnectSocket {
                    socket: id,
                    remote_addr: &remote_addr,
                    remote_port: addr.port(),
                })
                .await?;
        }

        self.with_socket(handle, |s| {
            s.remote = Some(addr);
            s.connected = true;
            s.closed = false;
        })
    }

    /// Create the modem side socket if that has not happened yet.
    async fn ensure_created(&self, handle: SocketHandle) -> Result<u8, Error> {
        let (id, protocol, local_port) =
            self.with_socket(handle, |s| (s.id, s.protocol, s.local_port))?;
        if let Some(id) = id {
            return Ok(id);
        }

        let mut at = self.device.at.lock().await;
        if !self.device.hex_mode.get() {
            at.send(&SetHexMode {
                op_code: 1,
                hex_mode: HexMode::Enabled,
            })
            .await?;
            self.device.hex_mode.set(true);
        }

        let protocol = match protocol {
            Protocol::Tcp => SocketProtocol::TCP,
            Protocol::Udp => SocketProtocol::UDP,
        };
        let res = at
            .send(&CreateSocket {
                protocol,
                local_port,
            })
            .await?;
        drop(at);

        trace!("Socket {:?} is modem socket {}", handle, res.socket);
        self.with_socket(handle, |s| {
            s.id = Some(res.socket);
            s.tx_ready = true;
        })?;
        Ok(res.socket)
    }

    /// Send at most one chunk to the connected peer. Returns the number of
    /// bytes the modem accepted, which may be less than `data.len()`.
    pub async fn send(&self, handle: SocketHandle, data: &[u8]) -> Result<usize, Error> {
        let (connected, remote) = self.with_socket(handle, |s| (s.connected, s.remote))?;
        let remote = match remote {
            Some(remote) if connected && self.context_connected() => remote,
            _ => return Err(Error::NoConnection),
        };
        self.transmit(handle, remote, data).await
    }

    /// Send at most one chunk to `addr`. A TCP socket connects first when
    /// needed.
    pub async fn sendto(
        &self,
        handle: SocketHandle,
        addr: SocketAddr,
        data: &[u8],
    ) -> Result<usize, Error> {
        let (protocol, connected) = self.with_socket(handle, |s| (s.protocol, s.connected))?;
        self.check_family(&addr)?;
        if !self.context_connected() {
            return Err(Error::NoConnection);
        }

        if protocol == Protocol::Tcp && !connected {
            self.socket_connect(handle, addr).await?;
        }
        self.transmit(handle, addr, data).await
    }

    async fn transmit(
        &self,
        handle: SocketHandle,
        remote: SocketAddr,
        data: &[u8],
    ) -> Result<usize, Error> {
        if data.is_empty() {
            return Ok(0);
        }
        let id = self.ensure_created(handle).await?;
        let protocol = self.with_socket(handle, |s| s.protocol)?;

        let chunk = &data[..data.len().min(EGRESS_CHUNK_SIZE)];
        let mut hex = String::<{ EGRESS_CHUNK_SIZE * 2 }>::new();
        encode_hex(chunk, &mut hex).map_err(|_| Error::Parameter)?;

        let written = match protocol {
            Protocol::Tcp => {
                self.device
                    .at
                    .send(&WriteSocketDataHex {
                        socket: id,
                        length: chunk.len(),
                        data: &hex,
                    })
                    .await?
                    .length
            }
            Protocol::Udp => {
                let remote_addr = ip_string(&remote.ip())?;
                self.device
                    .at
                    .send(&SendToHex {
                        socket: id,
                        remote_addr: &remote_addr,
                        remote_port: remote.port(),
                        length: chunk.len(),
                        data: &hex,
                    })
                    .await?
                    .length
            }
        };
        trace!("Socket {:?} sent {}/{} bytes", handle, written, data.len());
        Ok(written)
    }

    /// Read pending data into `buf`. `Ok(0)` means nothing is pending.
    pub async fn recv(&self, handle: SocketHandle, buf: &mut [u8]) -> Result<usize, Error> {
        let (connected, closed) = self.with_socket(handle, |s| (s.connected, s.closed))?;
        if !connected || closed || !self.context_connected() {
            return Err(Error::NoConnection);
        }
        self.recvfrom(handle, buf).await.map(|(n, _)| n)
    }

    /// Read pending data into `buf`, together with the sender when it is
    /// known. A connected socket is created on the modem first if needed,
    /// so data can arrive at all.
    pub async fn recvfrom(
        &self,
        handle: SocketHandle,
        buf: &mut [u8],
    ) -> Result<(usize, Option<SocketAddr>), Error> {
        let (connected, protocol, remote) =
            self.with_socket(handle, |s| (s.connected, s.protocol, s.remote))?;
        if !self.context_connected() {
            return Err(Error::NoConnection);
        }
        if connected {
            self.ensure_created(handle).await?;
        }

        let id = self.with_socket(handle, |s| s.id)?;
        let length = buf.len().min(INGRESS_CHUNK_SIZE);
        let Some(id) = id.filter(|_| length > 0) else {
            return Ok((0, remote));
        };

        let (n, from) = match protocol {
            Protocol::Tcp => {
                let res = self
                    .device
                    .at
                    .send(&ReadSocketData { socket: id, length })
                    .await?;
                (Self::decode(res.data.as_deref(), buf)?, remote)
            }
            Protocol::Udp => {
                let res = self
                    .device
                    .at
                    .send(&ReadUDPSocketData { socket: id, length })
                    .await?;
                let n = Self::decode(res.data.as_deref(), buf)?;
                let from = match res.remote_addr.parse::<IpAddr>() {
                    Ok(ip) => Some(SocketAddr::new(ip, res.remote_port)),
                    Err(_) => remote,
                };
                (n, from)
            }
        };

        self.with_socket(handle, |s| s.pending_bytes = s.pending_bytes.saturating_sub(n))?;
        Ok((n, from))
    }

    fn decode(data: Option<&str>, buf: &mut [u8]) -> Result<usize, Error> {
        match data {
            None | Some("") => Ok(0),
            Some(hex) => decode_hex(hex, buf).map_err(|e| {
                warn!("Bad socket payload: {}", e);
                Error::Device
            }),
        }
    }

    pub fn get_ip_address(&self) -> Option<IpAddr> {
        self.device
            .contexts
            .borrow()
            .get(self.context)
            .and_then(|r| r.params.as_ref())
            .and_then(|p| p.local_addr)
    }

    /// Bytes the modem reported pending on the socket.
    pub fn pending_bytes(&self, handle: SocketHandle) -> Result<usize, Error> {
        self.with_socket(handle, |s| s.pending_bytes)
    }

    /// Whether the peer closed the socket.
    pub fn is_closed(&self, handle: SocketHandle) -> Result<bool, Error> {
        self.with_socket(handle, |s| s.closed)
    }

    pub fn attach(
        &self,
        handle: SocketHandle,
        callback: Option<SocketCallback<'d>>,
    ) -> Result<(), Error> {
        self.with_socket(handle, |s| s.callback = callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::ContextHandle,
        modules::GENERIC_PROPERTIES,
        test_helpers::{sent, MockAtClient, TestConfig, TestModule},
        Resources,
    };
    use embassy_futures::block_on;
    use no_std_net::{Ipv4Addr, Ipv6Addr};

    fn connected_context<'d, M: ModuleParams>(
        device: &Device<'d, MockAtClient, M>,
        stack_type: Option<PdpType>,
    ) -> ContextHandle {
        let h = device.create_context(None, false, false).unwrap();
        let mut contexts = device.contexts.borrow_mut();
        let r = contexts.get_mut(h).unwrap();
        r.state = ContextState::Connected;
        r.cid = Some(crate::command::psn::types::ContextId(1));
        r.negotiated = stack_type;
        h
    }

    fn v4(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), port)
    }

    #[test]
    fn unknown_handle_sends_nothing() {
        let mut resources = Resources::new(MockAtClient::new());
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let h = connected_context(&device, Some(PdpType::Ipv4));
        let stack = device.context(h).unwrap().stack();

        let bogus = SocketHandle(42);
        assert_eq!(block_on(stack.socket_close(bogus)), Err(Error::NoSocket));
        assert_eq!(block_on(stack.send(bogus, b"x")), Err(Error::NoSocket));
        assert_eq!(
            block_on(stack.sendto(bogus, v4(7), b"x")),
            Err(Error::NoSocket)
        );
        assert_eq!(stack.socket_bind(bogus, 1), Err(Error::NoSocket));
        assert!(sent(&device.at).is_empty());
    }

    #[test]
    fn open_on_full_table() {
        let mut resources = Resources::new(MockAtClient::new());
        let properties = GENERIC_PROPERTIES.with(Property::SocketCount, 1);
        let (device, _sm) = crate::new(&mut resources, TestConfig, TestModule, properties, None);
        let h = connected_context(&device, None);
        let stack = device.context(h).unwrap().stack();

        let s = stack.socket_open(Protocol::Udp).unwrap();
        assert_eq!(stack.socket_open(Protocol::Tcp), Err(Error::NoSocket));
        assert_eq!(device.contexts.borrow().get(h).unwrap().sockets.len(), 1);
        assert_eq!(stack.pending_bytes(s), Ok(0));
    }

    #[test]
    fn open_needs_protocol_support() {
        let mut resources = Resources::new(MockAtClient::new());
        let properties = GENERIC_PROPERTIES.with(Property::IpTcp, 0);
        let (device, _sm) = crate::new(&mut resources, TestConfig, TestModule, properties, None);
        let h = connected_context(&device, None);
        let stack = device.context(h).unwrap().stack();

        assert_eq!(stack.socket_open(Protocol::Tcp), Err(Error::Unsupported));
        let s = stack.socket_open(Protocol::Udp).unwrap();
        assert_eq!(stack.socket_listen(s, 1), Err(Error::Unsupported));
    }

    #[test]
    fn sendto_checks_family_before_sending() {
        let mut resources = Resources::new(MockAtClient::new());
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let h = connected_context(&device, Some(PdpType::Ipv4));
        let stack = device.context(h).unwrap().stack();
        let s = stack.socket_open(Protocol::Udp).unwrap();

        let v6 = SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 7);
        assert_eq!(block_on(stack.sendto(s, v6, b"x")), Err(Error::Parameter));
        assert!(sent(&device.at).is_empty());
    }

    #[test]
    fn udp_sendto_creates_socket_lazily() {
        let mut resources = Resources::new(
            MockAtClient::new()
                .ok(b"")
                .ok(b"+USOCR: 3")
                .ok(b"+USOST: 3,2")
                .ok(b"+USOST: 3,1"),
        );
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let h = connected_context(&device, Some(PdpType::Ipv4v6));
        let stack = device.context(h).unwrap().stack();
        let s = stack.socket_open(Protocol::Udp).unwrap();

        assert_eq!(block_on(stack.sendto(s, v4(5683), b"hi")), Ok(2));
        // The modem may accept less than offered
        assert_eq!(block_on(stack.sendto(s, v4(5683), b"yo")), Ok(1));
        let sent = sent(&device.at);
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0], "AT+UDCONF=1,1");
        assert!(sent[1].starts_with("AT+USOCR=17"));
        assert_eq!(sent[2], "AT+USOST=3,\"192.0.2.1\",5683,2,\"6869\"");
        assert_eq!(sent[3], "AT+USOST=3,\"192.0.2.1\",5683,2,\"796F\"");
    }

    #[test]
    fn udp_recv_after_connect_creates_socket() {
        let mut resources = Resources::new(
            MockAtClient::new()
                .ok(b"")
                .ok(b"+USOCR: 2")
                .ok(b"+USORF: 2,\"192.0.2.1\",7,2,\"6869\"")
                .ok(b"+USORF: 2,\"192.0.2.1\",7,2,\"6F6B\""),
        );
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let h = connected_context(&device, Some(PdpType::Ipv4));
        let stack = device.context(h).unwrap().stack();
        let s = stack.socket_open(Protocol::Udp).unwrap();

        // Only the peer is recorded
        block_on(stack.socket_connect(s, v4(7))).unwrap();
        assert!(sent(&device.at).is_empty());

        let mut buf = [0u8; 8];
        assert_eq!(block_on(stack.recv(s, &mut buf)), Ok(2));
        assert_eq!(&buf[..2], b"hi");
        assert_eq!(block_on(stack.recvfrom(s, &mut buf)), Ok((2, Some(v4(7)))));
        assert_eq!(&buf[..2], b"ok");

        let sent = sent(&device.at);
        assert_eq!(sent[0], "AT+UDCONF=1,1");
        assert!(sent[1].starts_with("AT+USOCR=17"));
        assert_eq!(sent[2..], ["AT+USORF=2,8", "AT+USORF=2,8"]);
    }

    #[test]
    fn recvfrom_before_any_traffic_has_no_sender() {
        let mut resources = Resources::new(MockAtClient::new());
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let h = connected_context(&device, Some(PdpType::Ipv4));
        let stack = device.context(h).unwrap().stack();
        let s = stack.socket_open(Protocol::Udp).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(block_on(stack.recvfrom(s, &mut buf)), Ok((0, None)));
        assert!(sent(&device.at).is_empty());
    }

    #[test]
    fn send_needs_connected_socket() {
        let mut resources = Resources::new(MockAtClient::new());
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let h = connected_context(&device, Some(PdpType::Ipv4));
        let stack = device.context(h).unwrap().stack();
        let s = stack.socket_open(Protocol::Tcp).unwrap();

        assert_eq!(block_on(stack.send(s, b"x")), Err(Error::NoConnection));
        let mut buf = [0u8; 4];
        assert_eq!(block_on(stack.recv(s, &mut buf)), Err(Error::NoConnection));
    }

    #[test]
    fn tcp_connect_send_recv_close() {
        let mut resources = Resources::new(
            MockAtClient::new()
                .ok(b"")
                .ok(b"+USOCR: 0")
                .ok(b"")
                .ok(b"+USOWR: 0,4")
                .ok(b"+USORD: 0,2,\"6F6B\"")
                .ok(b""),
        );
        let (device, _sm) =
            crate::new(&mut resources, TestConfig, TestModule, GENERIC_PROPERTIES, None);
        let h = connected_context(&device, Some(PdpType::Ipv4));
        let stack = device.context(h).unwrap().stack();
        let s = stack.socket_open(Protocol::Tcp).unwrap();

        block_on(stack.socket_connect(s, v4(80))).unwrap();
        assert_eq!(block_on(stack.send(s, b"ping")), Ok(4));

        let mut buf = [0u8; 8];
        assert_eq!(block_on(stack.recv(s, &mut buf)), Ok(2));
        assert_eq!(&buf[..2], b"ok");

        block_on(stack.socket_close(s)).unwrap();
        assert_eq!(stack.pending_bytes(s), Err(Error::NoSocket));
        let sent = sent(&device.at);
        assert!(sent[1].starts_with("AT+USOCR=6"));
        assert_eq!(
            sent[2..],
            [
                "AT+USOCO=0,\"192.0.2.1\",80",
                "AT+USOWR=0,4,\"70696E67\"",
                "AT+USORD=0,8",
                "AT+USOCL=0",
            ]
        );
    }
}
