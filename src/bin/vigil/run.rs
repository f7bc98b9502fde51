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

//! Implements the `scrub` command.

use std::fmt::Write;
use std::fs;
use std::path::Path;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use env_logger::Env;
use log::{error, info, warn};

use vigil::cache::rrset::RrsetCache;
use vigil::message::{parse_packet, MsgParse, QueryInfo, Section};
use vigil::name::Name;
use vigil::rr::Type;
use vigil::scrub::scrub_message;
use vigil::util::{from_hex, to_hex};

use crate::args::ScrubArgs;
use crate::config;

/// Runs the `scrub` command.
pub fn run(args: ScrubArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed to scrub:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
}

fn try_running(args: ScrubArgs) -> Result<()> {
    let config = config::load(&args).context("failed to load the configuration")?;
    let cache = RrsetCache::new(config.cache.bins, config.cache.max_memory)
        .context("failed to create the RRset cache")?;
    let zone = config.scrub.zone.0;
    let query = QueryInfo::new(args.qname, args.qtype, args.qclass);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    info!("Scrubbing responses to {} for zone {}.", query, zone);

    for path in &args.packets {
        let packet = read_packet(path, args.hex)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match scrub_packet(&packet, &query, &zone) {
            Ok(msg) => {
                println!(";; {}: {}, {} RRsets kept", path.display(), msg.rcode(), msg.rrset_count);
                print_rrsets(&packet, &msg);
                let stored = cache.store_message(&packet, &msg, now);
                info!("{}: {} RRsets cached.", path.display(), stored);
            }
            Err(e) => {
                warn!("{}: response rejected: {:#}", path.display(), e);
                println!(";; {}: rejected: {:#}", path.display(), e);
            }
        }
    }

    println!(
        ";; cache: {} RRsets, {} of {} bytes used, {} bins",
        cache.len(),
        cache.space_used(),
        cache.space_max(),
        cache.bin_count()
    );
    Ok(())
}

fn read_packet(path: &Path, hex: bool) -> Result<Vec<u8>> {
    if hex {
        let text = fs::read_to_string(path)?;
        from_hex(&text).ok_or_else(|| anyhow!("the file is not valid hexadecimal"))
    } else {
        Ok(fs::read(path)?)
    }
}

fn scrub_packet(packet: &[u8], query: &QueryInfo, zone: &Name) -> Result<MsgParse> {
    let mut msg = parse_packet(packet).context("failed to parse the message")?;
    scrub_message(packet, &mut msg, query, zone).context("failed to scrub the message")?;
    Ok(msg)
}

/// Prints the surviving RRsets, one record per line, with RDATA in
/// hexadecimal.
fn print_rrsets(packet: &[u8], msg: &MsgParse) {
    for section in [Section::Answer, Section::Authority, Section::Additional] {
        let mut rrsets = msg.rrsets().filter(|r| r.section == section).peekable();
        if rrsets.peek().is_none() {
            continue;
        }
        println!(";; {} section", section);
        for rrset in rrsets {
            let owner = rrset.owner(packet).to_name();
            let records = rrset.rrs.iter().map(|rr| (rrset.rr_type, rr));
            let signatures = rrset.rrsigs.iter().map(|rr| (Type::RRSIG, rr));
            for (rr_type, rr) in records.chain(signatures) {
                println!(
                    "{} {} {} {} \\# {} {}",
                    owner,
                    rr.ttl,
                    rrset.class,
                    rr_type,
                    rr.rdata.len(),
                    to_hex(rr.rdata.octets(packet))
                );
            }
        }
    }
}
