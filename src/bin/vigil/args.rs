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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vigil::class::Class;
use vigil::name::Name;
use vigil::rr::Type;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Vigil, the message-processing core of a caching DNS resolver
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrub received responses and cache what survives
    Scrub(ScrubArgs),
}

#[derive(Debug, Parser)]
pub struct ScrubArgs {
    /// Set the configuration file to use
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Set the zone the responding server is trusted for
    #[clap(long, value_name = "NAME")]
    pub zone: Option<Name>,

    /// Set the name that was queried
    #[clap(long, value_name = "NAME")]
    pub qname: Name,

    /// Set the type that was queried
    #[clap(long, default_value = "A", value_name = "TYPE")]
    pub qtype: Type,

    /// Set the class that was queried
    #[clap(long, default_value = "IN", value_name = "CLASS")]
    pub qclass: Class,

    /// Read the packets as hexadecimal text instead of raw bytes
    #[clap(long)]
    pub hex: bool,

    /// The response packets to scrub
    #[clap(required = true, value_name = "PACKET")]
    pub packets: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrub_arguments_parse() {
        let args = Args::parse_from([
            "vigil",
            "scrub",
            "--qname",
            "www.example.com.",
            "--qtype",
            "aaaa",
            "--zone",
            "example.com.",
            "--hex",
            "a.hex",
            "b.hex",
        ]);
        let Command::Scrub(scrub) = args.command;
        assert_eq!(scrub.qname, "www.example.com.".parse().unwrap());
        assert_eq!(scrub.qtype, Type::AAAA);
        assert_eq!(scrub.qclass, Class::IN);
        assert!(scrub.hex);
        assert_eq!(scrub.packets.len(), 2);
    }

    #[test]
    fn qname_is_required() {
        assert!(Args::try_parse_from(["vigil", "scrub", "a.bin"]).is_err());
    }
}
