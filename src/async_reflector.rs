/*! Tokio reflector client.

The same protocol as [`crate::reflector`], driven by a tokio UDP
socket so applications can await frames instead of polling. One
socket, one logical reader; `send_frame` writes directly to the
socket, which is safe to interleave with a pending `recv_frame` on
UDP.

Available behind the `async` cargo feature.
 */

use std::time::Duration;

use log::{debug, info, warn};
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::address::Address;
use crate::ip::IpFrame;
use crate::reflector::{Message, State, validate_module};
use crate::{Error, Result};

/// An async reflector client.
pub struct AsyncReflectorClient {
    callsign: Address,
    socket: Option<UdpSocket>,
    state: State,
}

impl AsyncReflectorClient {
    /// A client identifying as `callsign`.
    pub fn new(callsign: &str) -> Result<Self> {
        Ok(Self {
            callsign: Address::from_callsign(callsign)?,
            socket: None,
            state: State::Disconnected,
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Is the link up?
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == State::Connected
    }

    /// Connect to `host:port` module `module`, awaiting ACKN for at
    /// most `connect_timeout`.
    pub async fn connect(
        &mut self,
        host: &str,
        port: u16,
        module: char,
        connect_timeout: Duration,
    ) -> Result<()> {
        let module = validate_module(module)?;
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.connect((host, port)).await?;
        socket
            .send(&Message::Conn(self.callsign, module).to_bytes())
            .await?;
        self.socket = Some(socket);
        self.state = State::Connecting;
        info!("connecting to {host}:{port} module {module}");

        match timeout(connect_timeout, self.await_ack()).await {
            Ok(result) => result,
            Err(_) => {
                self.state = State::Error;
                Err(Error::Timeout)
            }
        }
    }

    async fn await_ack(&mut self) -> Result<()> {
        let mut buf = [0u8; 1500];
        loop {
            let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
            let n = socket.recv(&mut buf).await?;
            match Message::parse(&buf[..n]) {
                Ok(Message::Ackn) => {
                    self.state = State::Connected;
                    info!("connected");
                    return Ok(());
                }
                Ok(Message::Nack) => {
                    self.state = State::Error;
                    warn!("reflector refused connection");
                    return Err(Error::ConnectionRefused);
                }
                Ok(other) => debug!("ignoring {other:?} while connecting"),
                Err(e) => warn!("garbage while connecting: {e}"),
            }
        }
    }

    /// Send an M17 frame. Non-blocking beyond the socket buffer.
    pub async fn send_frame(&self, frame: &IpFrame) -> Result<()> {
        if self.state != State::Connected {
            return Err(Error::NotConnected);
        }
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
        socket.send(&frame.to_bytes()).await?;
        Ok(())
    }

    /// Await the next relayed frame, servicing housekeeping (PING →
    /// PONG) in the background. Cancellation-safe: dropping the
    /// future between datagrams loses nothing.
    pub async fn recv_frame(&mut self) -> Result<IpFrame> {
        let mut buf = [0u8; 1500];
        loop {
            if self.state != State::Connected {
                return Err(Error::NotConnected);
            }
            let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
            let n = socket.recv(&mut buf).await?;
            match Message::parse(&buf[..n]) {
                Ok(Message::Ping) => {
                    debug!("PING, answering PONG");
                    socket.send(&Message::Pong(self.callsign).to_bytes()).await?;
                }
                Ok(Message::Frame(frame)) => return Ok(frame),
                Ok(Message::Nack) => {
                    warn!("NACK while connected");
                    self.state = State::Error;
                    return Err(Error::ConnectionRefused);
                }
                Ok(other) => debug!("ignoring {other:?}"),
                Err(e) => warn!("dropping bad datagram: {e}"),
            }
        }
    }

    /// Like [`Self::recv_frame`] with a bound; `Ok(None)` on timeout.
    pub async fn recv_frame_timeout(&mut self, wait: Duration) -> Result<Option<IpFrame>> {
        match timeout(wait, self.recv_frame()).await {
            Ok(frame) => frame.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Send DISC and drop the socket. DISC has no acknowledgment, so
    /// nothing is awaited afterwards.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.state == State::Connected {
            if let Some(socket) = self.socket.as_ref() {
                socket.send(&Message::Disc(self.callsign).to_bytes()).await?;
            }
            info!("disconnected");
        }
        self.socket = None;
        self.state = State::Disconnected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    // A socket playing the reflector's side of the conversation.
    async fn fake_reflector() -> Result<(UdpSocket, u16)> {
        let socket = UdpSocket::bind(("127.0.0.1", 0)).await?;
        let port = socket.local_addr()?.port();
        Ok((socket, port))
    }

    #[tokio::test]
    async fn connect_frame_ping_disconnect() -> Result<()> {
        let (server, port) = fake_reflector().await?;
        let mut client = AsyncReflectorClient::new("W2FBI")?;

        let server_task = tokio::spawn(async move {
            let mut buf = [0u8; 1500];
            // CONN
            let (n, peer) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..4], b"CONN");
            assert_eq!(n, 11);
            assert_eq!(buf[10], b'A');
            server.send_to(b"ACKN", peer).await.unwrap();
            // The client's frame comes back verbatim.
            let (n, _) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(n, 54);
            let frame = buf[..n].to_vec();
            server.send_to(&frame, peer).await.unwrap();
            // Ping it.
            server.send_to(b"PING", peer).await.unwrap();
            let (n, _) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..4], b"PONG");
            assert_eq!(n, 10);
            // DISC arrives last.
            let (n, _) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..4], b"DISC");
            assert_eq!(n, 10);
        });

        client
            .connect("127.0.0.1", port, 'a', Duration::from_secs(1))
            .await?;
        assert!(client.is_connected());

        let sent = IpFrame::create("@ALL", "W2FBI", Some(0xF00D), 5, b"", 1, b"hello")?;
        client.send_frame(&sent).await?;
        let got = client.recv_frame().await?;
        assert_eq!(got, sent);

        // The PING is serviced while waiting for a frame that never
        // comes.
        let none = client.recv_frame_timeout(Duration::from_millis(100)).await?;
        assert!(none.is_none());

        client.disconnect().await?;
        assert!(!client.is_connected());
        server_task.await?;
        Ok(())
    }

    #[tokio::test]
    async fn nack_refuses() -> Result<()> {
        let (server, port) = fake_reflector().await?;
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (_, peer) = server.recv_from(&mut buf).await.unwrap();
            server.send_to(b"NACK", peer).await.unwrap();
        });
        let mut client = AsyncReflectorClient::new("W2FBI")?;
        let err = client
            .connect("127.0.0.1", port, 'A', Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionRefused));
        assert_eq!(client.state(), State::Error);
        Ok(())
    }

    #[tokio::test]
    async fn connect_timeout() -> Result<()> {
        let (_server, port) = fake_reflector().await?;
        let mut client = AsyncReflectorClient::new("W2FBI")?;
        let err = client
            .connect("127.0.0.1", port, 'A', Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout));
        Ok(())
    }

    #[tokio::test]
    async fn send_requires_connection() -> Result<()> {
        let client = AsyncReflectorClient::new("W2FBI")?;
        let frame = IpFrame::create("@ALL", "W2FBI", Some(1), 5, b"", 0, b"")?;
        assert!(matches!(
            client.send_frame(&frame).await,
            Err(Error::NotConnected)
        ));
        Ok(())
    }
}
