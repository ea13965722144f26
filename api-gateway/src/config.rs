//! API gateway configuration.
//!
//! Only the HTTP listen address lives here; everything about the
//! underlying chain (storage path, proposal cadence, metrics) comes
//! from `ledger::NodeConfig`.

use std::net::SocketAddr;

/// Configuration for the gateway HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
}

impl ApiConfig {
    /// Default overridden by `GATEWAY_LISTEN_ADDR` when set.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var("GATEWAY_LISTEN_ADDR") {
            match raw.parse() {
                Ok(addr) => cfg.listen_addr = addr,
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring unparsable GATEWAY_LISTEN_ADDR")
                }
            }
        }
        cfg
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        // Bind to all interfaces so a container port mapping is
        // reachable from the host.
        let addr: SocketAddr = "0.0.0.0:8081"
            .parse()
            .expect("hard-coded API listen address should parse");
        Self { listen_addr: addr }
    }
}
