// SPDX-License-Identifier: GPL-3.0-or-later
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SensorSettings {
    /// Motion is reported when the hottest point is more than this many degrees Celsius above
    /// the average.
    #[serde(default = "SensorSettings::default_motion_threshold")]
    pub motion_threshold: f32,
}

impl SensorSettings {
    fn default_motion_threshold() -> f32 {
        8.0
    }
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            motion_threshold: Self::default_motion_threshold(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::SensorSettings;
    use float_cmp::assert_approx_eq;

    #[test]
    fn default_threshold() -> anyhow::Result<()> {
        let config: SensorSettings = toml::from_str("")?;
        assert_eq!(config, SensorSettings::default());
        assert_approx_eq!(f32, config.motion_threshold, 8.0);
        Ok(())
    }

    #[test]
    fn custom_threshold() {
        let parsed: SensorSettings = toml::from_str("motion_threshold = 5.5").unwrap();
        assert_approx_eq!(f32, parsed.motion_threshold, 5.5);
        let parsed: Result<SensorSettings, _> = toml::from_str("motion_threshold = \"hot\"");
        assert!(parsed.is_err());
    }
}
