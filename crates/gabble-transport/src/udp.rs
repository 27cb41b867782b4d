//! UDP transport implementation using `tokio::net::UdpSocket`.

use tokio::net::UdpSocket;

use crate::{DatagramSocket, PeerAddr, TransportError};

/// A [`DatagramSocket`] backed by a tokio UDP socket.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds a new UDP socket to the given address.
    ///
    /// Use port `0` to let the OS pick a free port.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await.map_err(|source| {
            TransportError::BindFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        let local = socket.local_addr().map_err(TransportError::LocalAddr)?;
        tracing::info!(%local, "UDP transport bound");
        Ok(Self { socket })
    }
}

impl DatagramSocket for UdpTransport {
    async fn send_to(
        &self,
        data: &[u8],
        target: PeerAddr,
    ) -> Result<(), TransportError> {
        let sent = self
            .socket
            .send_to(data, target.socket_addr())
            .await
            .map_err(|source| TransportError::SendFailed {
                target: target.socket_addr(),
                source,
            })?;
        if sent != data.len() {
            return Err(TransportError::ShortSend {
                target: target.socket_addr(),
                sent,
                expected: data.len(),
            });
        }
        tracing::trace!(peer = %target, bytes = sent, "datagram sent");
        Ok(())
    }

    async fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> Result<(usize, PeerAddr), TransportError> {
        let (len, from) = self
            .socket
            .recv_from(buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        Ok((len, PeerAddr::new(from)))
    }

    fn local_addr(&self) -> Result<PeerAddr, TransportError> {
        self.socket
            .local_addr()
            .map(PeerAddr::new)
            .map_err(TransportError::LocalAddr)
    }
}
