//! URL descriptors for printed status lines.

use std::fmt;
use std::net::{IpAddr, UdpSocket};

/// URL scheme the server is reachable under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

/// True for wildcard bind addresses that should display as localhost.
pub fn is_unspecified(host: &str) -> bool {
    host == "0.0.0.0" || host == "::"
}

pub fn format_url(protocol: Protocol, host: &str, port: u16) -> String {
    format!("{protocol}://{host}:{port}/")
}

/// URLs the server is reachable at, derived for display only.
#[derive(Debug, Clone)]
pub struct ServerUrls {
    /// The URL the user should open (localhost for wildcard binds)
    pub pretty: String,

    /// LAN-reachable URL, when the bind host is unspecified and a LAN
    /// address could be determined
    pub lan: Option<String>,
}

impl ServerUrls {
    pub fn new(protocol: Protocol, host: &str, port: u16, lan: Option<IpAddr>) -> Self {
        let unspecified = is_unspecified(host);
        let pretty_host = if unspecified { "localhost" } else { host };
        let pretty = format_url(protocol, pretty_host, port);
        let lan = if unspecified {
            lan.map(|ip| format_url(protocol, &ip.to_string(), port))
        } else {
            None
        };

        Self { pretty, lan }
    }
}

/// Best-effort LAN address discovery.
///
/// Routing a UDP socket at a public address reveals which interface the OS
/// would use; no packets are actually sent.
pub fn lan_address() -> Option<IpAddr> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).ok()?;
    socket.connect(("10.254.254.254", 1)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_loopback() || ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}
