use clap::Args;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::api::RouterConfig;

/// Listener settings, read from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct HubConfig {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind the HTTP/WebSocket listener
    #[arg(long, env = "EVENT_HUB_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Origins allowed to open a sentinel connection. Empty accepts any
    /// origin, which is only safe behind a trusted network boundary.
    #[arg(
        long = "allowed-origin",
        env = "EVENT_HUB_ALLOWED_ORIGINS",
        value_delimiter = ','
    )]
    pub allowed_origins: Vec<String>,
}

impl HubConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            allowed_origins: self.allowed_origins.clone(),
        }
    }
}
