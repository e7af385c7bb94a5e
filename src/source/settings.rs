// SPDX-License-Identifier: GPL-3.0-or-later
use std::time::Duration;

use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};
use url::Url;

use super::record::ScalarKind;

/// How frames are retrieved from the source.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Request a JSON document on a fixed interval.
    Poll,

    /// Keep a single connection open and read length-prefixed frames from it.
    Stream,
}

impl Default for TransportMode {
    fn default() -> Self {
        Self::Poll
    }
}

/// The keys used for each piece of data in a JSON frame document.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FieldMap {
    #[serde(default = "FieldMap::default_frame", alias = "data_field")]
    pub frame: String,

    #[serde(default = "FieldMap::default_lowest", alias = "lowest_field")]
    pub lowest: String,

    #[serde(default = "FieldMap::default_highest", alias = "highest_field")]
    pub highest: String,

    #[serde(default = "FieldMap::default_average", alias = "average_field")]
    pub average: String,
}

impl FieldMap {
    fn default_frame() -> String {
        "frame".to_string()
    }

    fn default_lowest() -> String {
        "lowest".to_string()
    }

    fn default_highest() -> String {
        "highest".to_string()
    }

    fn default_average() -> String {
        "average".to_string()
    }

    /// The document key for a scalar value.
    pub fn scalar_key(&self, kind: ScalarKind) -> &str {
        match kind {
            ScalarKind::Lowest => &self.lowest,
            ScalarKind::Highest => &self.highest,
            ScalarKind::Average => &self.average,
        }
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            frame: Self::default_frame(),
            lowest: Self::default_lowest(),
            highest: Self::default_highest(),
            average: Self::default_average(),
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SourceSettings {
    /// The base URL of the thermal camera.
    pub url: Url,

    /// The path appended to `url` for frame requests.
    #[serde(default = "SourceSettings::default_path")]
    pub path: String,

    #[serde(default)]
    pub mode: TransportMode,

    /// The number of rows in a frame.
    #[serde(default = "SourceSettings::default_rows")]
    pub rows: usize,

    /// The number of columns in a frame.
    #[serde(default = "SourceSettings::default_columns", alias = "cols")]
    pub columns: usize,

    /// Time between requests in poll mode.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "SourceSettings::default_poll_interval")]
    pub poll_interval: Duration,

    /// The minimum time between published frames in stream mode.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "SourceSettings::default_push_interval")]
    pub push_interval: Duration,

    /// Request timeout in poll mode. Stream reads are never timed out.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "SourceSettings::default_timeout")]
    pub timeout: Duration,

    #[serde(default)]
    pub fields: FieldMap,
}

impl SourceSettings {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            path: Self::default_path(),
            mode: TransportMode::default(),
            rows: Self::default_rows(),
            columns: Self::default_columns(),
            poll_interval: Self::default_poll_interval(),
            push_interval: Self::default_push_interval(),
            timeout: Self::default_timeout(),
            fields: FieldMap::default(),
        }
    }

    /// The full URL frames are requested from, `<url>/<path>`.
    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        let base = self.url.as_str().trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        if path.is_empty() {
            Url::parse(base)
        } else {
            Url::parse(&format!("{}/{}", base, path))
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.rows == 0 || self.columns == 0 {
            Err("rows and columns must be at least 1")
        } else if self.poll_interval == Duration::from_millis(0) {
            Err("poll_interval must be at least 1 millisecond")
        } else {
            Ok(())
        }
    }

    fn default_path() -> String {
        "json".to_string()
    }

    fn default_rows() -> usize {
        24
    }

    fn default_columns() -> usize {
        32
    }

    fn default_poll_interval() -> Duration {
        Duration::from_millis(500)
    }

    fn default_push_interval() -> Duration {
        Duration::from_millis(1000)
    }

    fn default_timeout() -> Duration {
        Duration::from_secs(10)
    }
}
