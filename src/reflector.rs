/*! Reflector client.

Reflectors are UDP relays: a client CONNects a callsign to a named
module (a single letter), the reflector answers ACKN or NACK, and
from then on every 54-byte M17 frame sent to the reflector is
rebroadcast to the other clients of that module. The reflector PINGs
periodically; the client answers PONG or gets timed out. All messages
open with a 4-byte prefix:

| prefix | direction | payload                         |
|--------|-----------|---------------------------------|
| `CONN` | client →  | 6-byte address ‖ module letter  |
| `ACKN` | → client  | empty                           |
| `NACK` | → client  | empty                           |
| `PING` | → client  | optional address, ignored       |
| `PONG` | client →  | 6-byte address                  |
| `DISC` | either    | 6-byte address                  |
| `M17 ` | both      | rest of the 54-byte IP frame    |

[`Message`] is the pure codec for these datagrams.
[`ReflectorClient`] owns one UDP socket for the life of a connection
and drives the state machine with a blocking, poll-based receive
path; per-datagram garbage is logged and dropped, only
connection-level failures surface. The tokio flavor lives in
[`crate::async_reflector`] behind the `async` feature.
 */

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::address::Address;
use crate::consts::DEFAULT_PORT;
use crate::ip::IpFrame;
use crate::{Error, Result};

/// Reflector protocol datagrams.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Connect `addr` to `module`.
    Conn(Address, char),
    /// Connection accepted.
    Ackn,
    /// Connection refused.
    Nack,
    /// Keep-alive probe from the reflector.
    Ping,
    /// Keep-alive reply.
    Pong(Address),
    /// Leaving.
    Disc(Address),
    /// A relayed M17 frame.
    Frame(IpFrame),
}

impl Message {
    /// Serialize for the wire.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Message::Conn(addr, module) => {
                let mut out = b"CONN".to_vec();
                out.extend_from_slice(&addr.to_bytes());
                out.push(*module as u8);
                out
            }
            Message::Ackn => b"ACKN".to_vec(),
            Message::Nack => b"NACK".to_vec(),
            Message::Ping => b"PING".to_vec(),
            Message::Pong(addr) => {
                let mut out = b"PONG".to_vec();
                out.extend_from_slice(&addr.to_bytes());
                out
            }
            Message::Disc(addr) => {
                let mut out = b"DISC".to_vec();
                out.extend_from_slice(&addr.to_bytes());
                out
            }
            Message::Frame(frame) => frame.to_bytes().to_vec(),
        }
    }

    /// Classify and parse one datagram by its 4-byte prefix.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::WireFormat("datagram shorter than a prefix"));
        }
        match &data[0..4] {
            b"CONN" => {
                if data.len() != 11 {
                    return Err(Error::WireFormat("CONN must be 11 bytes"));
                }
                let addr = Address::from_bytes(six(&data[4..10]));
                let module = data[10] as char;
                Ok(Message::Conn(addr, module))
            }
            b"ACKN" => Ok(Message::Ackn),
            b"NACK" => Ok(Message::Nack),
            // PING may carry the reflector's address; it is ignored.
            b"PING" => Ok(Message::Ping),
            b"PONG" => {
                if data.len() < 10 {
                    return Err(Error::WireFormat("PONG missing address"));
                }
                Ok(Message::Pong(Address::from_bytes(six(&data[4..10]))))
            }
            b"DISC" => {
                if data.len() < 10 {
                    return Err(Error::WireFormat("DISC missing address"));
                }
                Ok(Message::Disc(Address::from_bytes(six(&data[4..10]))))
            }
            b"M17 " => Ok(Message::Frame(IpFrame::from_bytes(data)?)),
            _ => Err(Error::WireFormat("unknown datagram prefix")),
        }
    }
}

fn six(data: &[u8]) -> [u8; 6] {
    let mut out = [0u8; 6];
    out.copy_from_slice(&data[..6]);
    out
}

/// Validate and normalize a module designator.
pub fn validate_module(module: char) -> Result<char> {
    let up = module.to_ascii_uppercase();
    if up.is_ascii_uppercase() {
        Ok(up)
    } else {
        Err(Error::InvalidModule(module.to_string()))
    }
}

/// Connection state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// No socket.
    Disconnected,
    /// CONN sent, awaiting ACKN.
    Connecting,
    /// Linked to a module.
    Connected,
    /// Refused or failed; reconnect to leave this state.
    Error,
}

/// A blocking reflector client.
///
/// One socket, owned for the life of the connection. The receive path
/// is a poll loop; call [`ReflectorClient::poll`] from wherever the
/// application wants frames delivered.
pub struct ReflectorClient {
    callsign: Address,
    socket: Option<UdpSocket>,
    target: Option<SocketAddr>,
    state: State,
}

impl ReflectorClient {
    /// A client identifying as `callsign`.
    pub fn new(callsign: &str) -> Result<Self> {
        Ok(Self {
            callsign: Address::from_callsign(callsign)?,
            socket: None,
            target: None,
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

    /// Connect to `host:port` module `module`, waiting up to
    /// `timeout` for the reflector's answer.
    ///
    /// Fails with [`Error::ConnectionRefused`] on NACK and
    /// [`Error::Timeout`] when nothing valid arrives in time.
    pub fn connect(
        &mut self,
        host: &str,
        port: u16,
        module: char,
        timeout: Duration,
    ) -> Result<()> {
        let module = validate_module(module)?;
        let target = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Io(std::io::Error::other("no address for host")))?;

        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.send_to(&Message::Conn(self.callsign, module).to_bytes(), target)?;
        self.socket = Some(socket);
        self.target = Some(target);
        self.state = State::Connecting;
        info!("connecting to {target} module {module}");

        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 1500];
        loop {
            let now = Instant::now();
            if now >= deadline {
                self.state = State::Error;
                return Err(Error::Timeout);
            }
            let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
            socket.set_read_timeout(Some(deadline - now))?;
            let (n, from) = match socket.recv_from(&mut buf) {
                Ok(x) => x,
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    self.state = State::Error;
                    return Err(Error::Timeout);
                }
                Err(e) => {
                    self.state = State::Error;
                    return Err(e.into());
                }
            };
            if from != target {
                debug!("datagram from stranger {from} while connecting");
                continue;
            }
            match Message::parse(&buf[..n]) {
                Ok(Message::Ackn) => {
                    self.state = State::Connected;
                    info!("connected to {target}");
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

    /// Send an M17 frame. Fails [`Error::NotConnected`] unless the
    /// link is up.
    pub fn send_frame(&self, frame: &IpFrame) -> Result<()> {
        if self.state != State::Connected {
            return Err(Error::NotConnected);
        }
        self.send(&frame.to_bytes())
    }

    /// Wait up to `timeout` for the next relayed frame, servicing
    /// protocol housekeeping (PING, NACK) along the way.
    ///
    /// Returns `Ok(None)` when the timeout elapses or a non-frame
    /// message was handled; per-datagram parse failures are logged
    /// and dropped without disturbing the connection.
    pub fn poll(&mut self, timeout: Duration) -> Result<Option<IpFrame>> {
        if self.state != State::Connected {
            return Err(Error::NotConnected);
        }
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
        socket.set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;
        let mut buf = [0u8; 1500];
        let (n, _from) = match socket.recv_from(&mut buf) {
            Ok(x) => x,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        match Message::parse(&buf[..n]) {
            Ok(Message::Ping) => {
                debug!("PING, answering PONG");
                self.send(&Message::Pong(self.callsign).to_bytes())?;
                Ok(None)
            }
            Ok(Message::Frame(frame)) => Ok(Some(frame)),
            Ok(Message::Nack) => {
                warn!("NACK while connected");
                self.state = State::Error;
                Err(Error::ConnectionRefused)
            }
            Ok(other) => {
                debug!("ignoring {other:?}");
                Ok(None)
            }
            Err(e) => {
                warn!("dropping bad datagram: {e}");
                Ok(None)
            }
        }
    }

    /// Send DISC and drop the socket. No acknowledgment exists for
    /// DISC, so this does not wait.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.state == State::Connected {
            self.send(&Message::Disc(self.callsign).to_bytes())?;
            info!("disconnected");
        }
        self.socket = None;
        self.target = None;
        self.state = State::Disconnected;
        Ok(())
    }

    fn send(&self, data: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
        let target = self.target.ok_or(Error::NotConnected)?;
        socket.send_to(data, target)?;
        debug!("SEND {:?} ({} bytes)", &data[..4.min(data.len())], data.len());
        Ok(())
    }
}

impl Drop for ReflectorClient {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

/// The default reflector port, re-exported for convenience.
pub const PORT: u16 = DEFAULT_PORT;
