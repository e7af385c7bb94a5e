// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Context as _;
use serde::Deserialize;

use std::fs;
use std::path::Path;

mod cli;
pub(crate) mod gradient;
mod sensors;

use crate::render::RenderSettings;
use crate::server::ServerSettings;
use crate::source::SourceSettings;
pub use cli::Args;
pub use sensors::SensorSettings;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Settings {
    /// Where frames come from, and how they are fetched.
    pub source: SourceSettings,

    /// How frames are rendered into images.
    #[serde(default)]
    pub render: RenderSettings,

    /// Settings for the values derived from each frame.
    #[serde(default)]
    pub sensors: SensorSettings,

    /// Settings related to the HTTP server for the images and sensor values.
    #[serde(default)]
    pub server: ServerSettings,
}

impl Settings {
    /// Read and parse a TOML configuration file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let config_data = fs::read_to_string(path)
            .with_context(|| format!("Unable to read configuration file {}", path.display()))?;
        let settings: Self = toml::from_str(&config_data)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        settings
            .source
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid source settings")?;
        settings
            .render
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid render settings")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod test {
    use super::Settings;
    use crate::source::TransportMode;
    use crate::temperature::TemperatureUnit;
    use float_cmp::assert_approx_eq;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn minimal() -> anyhow::Result<()> {
        let source = r#"
        [source]
        url = "http://192.0.2.10"
        "#;
        let config: Settings = toml::from_str(source)?;
        assert_eq!(config.source.url.as_str(), "http://192.0.2.10/");
        assert_eq!(config.source.mode, TransportMode::Poll);
        assert_eq!(config.render, Default::default());
        assert_eq!(config.sensors, Default::default());
        assert_eq!(config.server, Default::default());
        Ok(())
    }

    #[test]
    fn missing_source() {
        let parsed: Result<Settings, _> = toml::from_str("[render]\nheight = 240");
        assert!(parsed.is_err(), "Parsed a configuration with no source");
    }

    #[test]
    fn full() -> anyhow::Result<()> {
        let source = r#"
        [source]
        url = "http://192.0.2.10"
        mode = "stream"
        push_interval = 250

        [render]
        units = "fahrenheit"

        [sensors]
        motion_threshold = 4.0

        [server]
        port = 8080
        mjpeg.enabled = false
        "#;
        let config: Settings = toml::from_str(source)?;
        assert_eq!(config.source.mode, TransportMode::Stream);
        assert_eq!(config.source.push_interval, Duration::from_millis(250));
        assert_eq!(config.render.units, TemperatureUnit::Fahrenheit);
        assert_approx_eq!(f32, config.sensors.motion_threshold, 4.0);
        assert_eq!(config.server.port, 8080);
        assert!(!config.server.mjpeg.enabled);
        Ok(())
    }

    #[test]
    fn from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[source]\nurl = \"http://192.0.2.10:8080\"\npath = \"raw\"")?;
        let config = Settings::from_path(file.path())?;
        assert_eq!(config.source.endpoint()?.as_str(), "http://192.0.2.10:8080/raw");
        Ok(())
    }

    #[test]
    fn invalid_render_rejected() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "[source]\nurl = \"http://192.0.2.10\"\n[render]\njpeg_quality = 0"
        )?;
        assert!(Settings::from_path(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn zero_poll_interval_rejected() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[source]\nurl = \"http://192.0.2.10\"\npoll_interval = 0")?;
        let err = Settings::from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid source settings"));
        Ok(())
    }

    #[test]
    fn missing_file() {
        let err = Settings::from_path("/nonexistent/thermal-relay.toml".as_ref()).unwrap_err();
        assert!(err.to_string().contains("Unable to read configuration file"));
    }
}
