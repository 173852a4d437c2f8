//! Local address detection.
//!
//! A UDP socket "connected" to a public address makes the OS pick the outbound
//! interface without sending any packet.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Address used when detection fails.
pub const FALLBACK_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

const PROBE_TARGET: &str = "8.8.8.8:53";

/// The configured address, or the detected outbound one.
pub fn resolve_local_ip(configured: Option<&str>) -> String {
    if let Some(ip) = configured.map(str::trim).filter(|ip| !ip.is_empty()) {
        return ip.to_string();
    }
    detect_outbound_ip().unwrap_or(FALLBACK_IP).to_string()
}

/// Outbound interface address, if the OS can route to the probe target.
pub fn detect_outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(PROBE_TARGET).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}
