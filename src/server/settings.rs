// SPDX-License-Identifier: GPL-3.0-or-later
use serde::Deserialize;

use std::net;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ServerSettings {
    /// Whether the HTTP server is started at all.
    #[serde(default = "ServerSettings::default_enabled")]
    pub enabled: bool,

    /// The address to bind the server to. Defaults to `127.0.0.1`.
    #[serde(default = "ServerSettings::default_address")]
    pub address: net::IpAddr,

    /// The port to bind the server to. Defaults to `9000`.
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,

    /// MJPEG-specific settings.
    #[serde(default)]
    pub mjpeg: MjpegSettings,
}

impl ServerSettings {
    fn default_enabled() -> bool {
        true
    }

    fn default_address() -> net::IpAddr {
        net::IpAddr::from([127u8, 0u8, 0u8, 1u8])
    }

    fn default_port() -> u16 {
        9000u16
    }

    pub fn socket_address(&self) -> net::SocketAddr {
        net::SocketAddr::new(self.address, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            address: Self::default_address(),
            port: Self::default_port(),
            mjpeg: MjpegSettings::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct MjpegSettings {
    /// Whether the `/mjpeg` stream is served.
    #[serde(default = "MjpegSettings::default_enabled")]
    pub enabled: bool,
}

impl MjpegSettings {
    fn default_enabled() -> bool {
        true
    }
}

impl Default for MjpegSettings {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
        }
    }
}
