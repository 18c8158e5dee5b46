//! Configuration from the environment (bind address, room password).

use std::env;
use std::net::{Ipv4Addr, SocketAddr};

/// Socket address to bind the server to.
///
/// Reads the `PORT` env var or defaults to 8080, binds to 0.0.0.0.
pub fn server_addr() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Shared password gating room creation and joining, from `CROWNS_PASSWORD`.
pub fn room_password() -> String {
    env::var("CROWNS_PASSWORD").unwrap_or_else(|_| "5Crown".to_string())
}
