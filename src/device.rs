use std::fmt;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use lifx_core::{BuildOptions, Message, RawMessage};
use tokio::net::UdpSocket;
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument, trace, warn};

use crate::colors::Color;
use crate::{Error, Result};

/// UDP port LIFX bulbs listen on
pub const LIFX_PORT: u16 = 56700;

/// How often discovery is re-broadcast while waiting for an answer
const DISCOVERY_POLL: Duration = Duration::from_millis(500);

/// Hardware address of a bulb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Target field used in LIFX frame addresses: the six address bytes in
    /// little-endian order, upper two bytes zero
    pub fn target(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes[..6].copy_from_slice(&self.0);
        u64::from_le_bytes(bytes)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidMacAddress(s.to_string());

        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(invalid());
        }

        let mut bytes = [0u8; 6];
        for (byte, part) in bytes.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        Ok(MacAddress(bytes))
    }
}

/// A bulb that accepts color commands
pub trait Bulb {
    /// Fades the bulb to `color` over `duration`. Does not wait for the bulb
    /// to confirm.
    fn set_color(
        &self,
        color: Color,
        duration: Duration,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Locates bulbs on the network
pub trait Discovery {
    type Handle: Bulb + Send + Sync;

    /// Returns a handle to the bulb with the given address, or `None` when it
    /// does not answer
    fn find_device(
        &self,
        mac: MacAddress,
    ) -> impl Future<Output = Result<Option<Self::Handle>>> + Send;
}

/// Encodes a `LightSetColor` packet addressed to one bulb
pub fn set_color_packet(
    target: u64,
    source: u32,
    sequence: u8,
    color: Color,
    duration: Duration,
) -> Result<Vec<u8>> {
    let options = BuildOptions {
        target: Some(target),
        source,
        sequence,
        ..Default::default()
    };
    let message = Message::LightSetColor {
        reserved: 0,
        color: color.into(),
        duration: u32::try_from(duration.as_millis()).unwrap_or(u32::MAX),
    };

    RawMessage::build(&options, message)
        .and_then(|raw| raw.pack())
        .map_err(|e| Error::Protocol(e.to_string()))
}

/// Encodes a `GetService` discovery packet asking for a response from `target`
pub fn get_service_packet(target: u64, source: u32, sequence: u8) -> Result<Vec<u8>> {
    let options = BuildOptions {
        target: Some(target),
        res_required: true,
        source,
        sequence,
        ..Default::default()
    };

    RawMessage::build(&options, Message::GetService)
        .and_then(|raw| raw.pack())
        .map_err(|e| Error::Protocol(e.to_string()))
}

/// Source identifier stamped on outgoing packets
fn source_id() -> u32 {
    std::process::id().max(2)
}

/// Finds LIFX bulbs by broadcasting `GetService` on the local network
#[derive(Debug, Clone)]
pub struct LifxDiscovery {
    broadcast: SocketAddr,
    discovery_timeout: Duration,
    command_timeout: Duration,
}

impl LifxDiscovery {
    pub fn new(discovery_timeout: Duration, command_timeout: Duration) -> Self {
        Self {
            broadcast: SocketAddr::from((Ipv4Addr::BROADCAST, LIFX_PORT)),
            discovery_timeout,
            command_timeout,
        }
    }

    /// Sends discovery packets to `addr` instead of the broadcast address
    pub fn with_broadcast(mut self, addr: SocketAddr) -> Self {
        self.broadcast = addr;
        self
    }

    /// Opens a broadcast socket and scans from it
    async fn locate(&self, mac: MacAddress, source: u32) -> Result<(UdpSocket, SocketAddr)> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_broadcast(true)?;
        let addr = self.scan(&socket, mac, source).await?;
        Ok((socket, addr))
    }

    /// Re-broadcasts until a `StateService` from the target arrives
    async fn scan(&self, socket: &UdpSocket, mac: MacAddress, source: u32) -> Result<SocketAddr> {
        let target = mac.target();
        let start_time = Instant::now();
        let mut sequence: u8 = 0;
        let mut buf = [0u8; 1024];

        loop {
            let packet = get_service_packet(target, source, sequence)?;
            socket.send_to(&packet, self.broadcast).await?;
            trace!("Sent GetService (sequence {})", sequence);
            sequence = sequence.wrapping_add(1);

            let poll_deadline = Instant::now() + DISCOVERY_POLL;
            while let Ok(received) =
                time::timeout_at(poll_deadline, socket.recv_from(&mut buf)).await
            {
                let (len, from) = received?;
                let raw = match RawMessage::unpack(&buf[..len]) {
                    Ok(raw) => raw,
                    Err(e) => {
                        debug!("Ignoring malformed packet from {}: {}", from, e);
                        continue;
                    }
                };

                if raw.frame_addr.target != target {
                    trace!("Ignoring reply from other device at {}", from);
                    continue;
                }

                if let Ok(Message::StateService { port, .. }) = Message::from_raw(&raw) {
                    let port = u16::try_from(port).unwrap_or(LIFX_PORT);
                    let addr = SocketAddr::new(from.ip(), port);
                    info!("Found {} at {}", mac, addr);
                    return Ok(addr);
                }
            }

            let remaining = self
                .discovery_timeout
                .saturating_sub(start_time.elapsed())
                .as_secs();
            info!(
                "Still scanning for {}... ({} seconds remaining)",
                mac, remaining
            );
        }
    }
}

impl Default for LifxDiscovery {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(2))
    }
}

impl Discovery for LifxDiscovery {
    type Handle = LifxBulb;

    #[instrument(skip(self))]
    async fn find_device(&self, mac: MacAddress) -> Result<Option<LifxBulb>> {
        let source = source_id();

        info!("Scanning for {} via {}", mac, self.broadcast);
        match time::timeout(self.discovery_timeout, self.locate(mac, source)).await {
            Ok(Ok((socket, addr))) => Ok(Some(LifxBulb {
                socket,
                addr,
                mac,
                source,
                sequence: AtomicU8::new(0),
                command_timeout: self.command_timeout,
            })),
            // Any failure while scanning means the lamp is unreachable
            Ok(Err(e)) => {
                warn!("Discovery of {} failed: {}", mac, e);
                Ok(None)
            }
            Err(_) => {
                warn!(
                    "No answer from {} within {} seconds",
                    mac,
                    self.discovery_timeout.as_secs()
                );
                Ok(None)
            }
        }
    }
}

/// A discovered LIFX bulb
#[derive(Debug)]
pub struct LifxBulb {
    socket: UdpSocket,
    addr: SocketAddr,
    mac: MacAddress,
    source: u32,
    sequence: AtomicU8,
    command_timeout: Duration,
}

impl LifxBulb {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Bulb for LifxBulb {
    #[instrument(skip(self), fields(mac = %self.mac))]
    async fn set_color(&self, color: Color, duration: Duration) -> Result<()> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let packet = set_color_packet(
            self.mac.target(),
            self.source,
            sequence,
            color,
            duration,
        )?;

        debug!("Sending {} over {:?} to {}", color, duration, self.addr);
        time::timeout(self.command_timeout, self.socket.send_to(&packet, self.addr))
            .await
            .map_err(|_| Error::Timeout(self.command_timeout))??;

        info!("Color set to {}", color);
        Ok(())
    }
}
