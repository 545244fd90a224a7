use std::net::{IpAddr, UdpSocket};

/// First non-loopback IPv4 address of this host, for the startup banner.
/// Connecting a UDP socket only picks a route; nothing is sent.
pub fn local_ip() -> String {
    probe()
        .filter(|ip| ip.is_ipv4() && !ip.is_loopback() && !ip.is_unspecified())
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "localhost".into())
}

fn probe() -> Option<IpAddr> {
    let sock = UdpSocket::bind("0.0.0.0:0").ok()?;
    sock.connect("8.8.8.8:80").ok()?;
    sock.local_addr().ok().map(|a| a.ip())
}
