// Copyright 2021 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the configuration file.

use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use vigil::name::Name;

use crate::args::ScrubArgs;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the configuration: from the file named on the command line if
/// there is one, and otherwise from the defaults. Command-line options
/// then override what the file says.
pub fn load(args: &ScrubArgs) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => load_from_path(path)?,
        None => Config::default(),
    };
    if let Some(ref zone) = args.zone {
        config.scrub.zone = ConfigName(zone.clone());
    }
    log_config_summary(&config);
    Ok(config)
}

/// Loads the configuration from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let raw_config = fs::read_to_string(path.as_ref())
        .context("failed to read the configuration file")?;
    parse(&raw_config)
}

fn parse(raw_config: &str) -> Result<Config> {
    toml::from_str(raw_config).context("failed to parse the configuration file")
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        return;
    }
    let mut message = String::from("Configuration loaded:");
    write!(
        message,
        "\nCache bins:       {}\
         \nCache max memory: {} bytes\
         \nScrub zone:       {}",
        config.cache.bins, config.cache.max_memory, config.scrub.zone.0,
    )
    .unwrap();
    debug!("{}", message);
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scrub: ScrubConfig,
}

/// The configuration of the RRset cache.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_bins")]
    pub bins: usize,
    #[serde(default = "default_max_memory")]
    pub max_memory: usize,
}

fn default_bins() -> usize {
    1024
}

fn default_max_memory() -> usize {
    4 * 1024 * 1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bins: default_bins(),
            max_memory: default_max_memory(),
        }
    }
}

/// The configuration of response scrubbing.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrubConfig {
    #[serde(default = "default_zone")]
    pub zone: ConfigName,
}

fn default_zone() -> ConfigName {
    ConfigName(Name::root())
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            zone: default_zone(),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER VIGIL TYPES FOR SERDE                                //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type
/// from [`vigil`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over a [`vigil`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigName, Name, "domain name");

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.cache.bins, 1024);
        assert_eq!(config.cache.max_memory, 4194304);
        assert!(config.scrub.zone.0.is_root());
    }

    #[test]
    fn sections_are_read() {
        let config = parse(
            "[cache]\n\
             bins = 64\n\
             max_memory = 1000\n\
             [scrub]\n\
             zone = \"Example.COM.\"\n",
        )
        .unwrap();
        assert_eq!(config.cache.bins, 64);
        assert_eq!(config.cache.max_memory, 1000);
        assert_eq!(config.scrub.zone.0, "example.com.".parse().unwrap());
    }

    #[test]
    fn bad_input_is_rejected() {
        assert!(parse("[cache]\nbinz = 64\n").is_err());
        assert!(parse("[scrub]\nzone = \"a..b.\"\n").is_err());
    }
}
