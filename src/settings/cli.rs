// SPDX-License-Identifier: GPL-3.0-or-later
use structopt::StructOpt;

use std::path::PathBuf;

/// Relay thermal camera frames as images and sensor values.
#[derive(Debug, StructOpt)]
#[structopt(name = "thermal-relay")]
pub struct Args {
    /// Path to a configuration file.
    #[structopt(short, long, parse(from_os_str), default_value = "config.toml")]
    pub config_path: PathBuf,
}

#[cfg(test)]
mod test {
    use super::Args;
    use std::path::Path;
    use structopt::StructOpt;

    #[test]
    fn default_path() {
        let args = Args::from_iter(&["thermal-relay"]);
        assert_eq!(args.config_path, Path::new("config.toml"));
    }

    #[test]
    fn short_flag() {
        let args = Args::from_iter(&["thermal-relay", "-c", "/etc/thermal-relay.toml"]);
        assert_eq!(args.config_path, Path::new("/etc/thermal-relay.toml"));
    }
}
