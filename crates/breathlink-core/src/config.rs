//! Configuration surface for hosts and peers.
//!
//! Two pairing variants exist: the default generates a fresh token and binds
//! the configured port on every server start, while *static* pairing uses a
//! fixed, pre-shared port and token so a companion device can connect
//! without reading anything off the host's screen.

use std::{fmt, time::Duration};

/// Default listening host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listening port. `0` lets the OS assign one; the actual port is
/// surfaced through the [`Endpoint`] after binding.
pub const DEFAULT_PORT: u16 = 0;

/// Fixed port used in static pairing mode.
pub const STATIC_PORT: u16 = 5020;

/// Pre-shared token used in static pairing mode when none is configured.
pub const STATIC_AUTH_TOKEN: &str = "AAA111";

/// Read timeout on established connections. Bounds every blocking `recv` so
/// the background thread observes a cooperative shutdown promptly.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Bound on outbound connection establishment.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How a server and its peer agree on port and token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pairing {
    /// Fresh token generated per listening period; configured host/port.
    Generated,

    /// Fixed, pre-shared port and token.
    Static {
        /// Port both sides know in advance.
        port: u16,
        /// Pre-shared pairing token (6 uppercase alphanumerics).
        token: String,
    },
}

impl Pairing {
    /// Static pairing with the stock [`STATIC_PORT`] / [`STATIC_AUTH_TOKEN`]
    /// pair.
    pub fn static_default() -> Self {
        Self::Static { port: STATIC_PORT, token: STATIC_AUTH_TOKEN.to_string() }
    }
}

impl Default for Pairing {
    fn default() -> Self {
        Self::Generated
    }
}

/// Server (host-side) configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host/interface to bind, e.g. `"0.0.0.0"`.
    pub host: String,

    /// Port to bind; ignored in static pairing mode, which uses the pairing
    /// port instead.
    pub port: u16,

    /// Pairing variant.
    pub pairing: Pairing,

    /// Read timeout applied to accepted connections.
    pub read_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            pairing: Pairing::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Client (peer-side) configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address as `host:port`.
    pub addr: String,

    /// Bound on connection establishment.
    pub connect_timeout: Duration,

    /// Read timeout applied to the established connection.
    pub read_timeout: Duration,
}

impl ClientConfig {
    /// Configuration for the given `host:port` with default timeouts.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Listening endpoint surfaced to the application for pairing display:
/// where to connect and which token to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host the listener is bound to.
    pub host: String,
    /// Actual bound port.
    pub port: u16,
    /// Token a peer must present.
    pub token: String,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
