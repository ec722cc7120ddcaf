//! Forwarding database (bridge neighbor) record rendering
//!
//! Only `AF_BRIDGE` entries are printed; IP neighbor entries are skipped.

use super::{InterfaceCache, RecordRenderer, format_lladdr, parse_route_message};
use crate::error::{MonitorError, Result};
use crate::types::EventRecord;
use netlink_packet_route::neighbour::{NeighbourAddress, NeighbourAttribute, NeighbourMessage};
use netlink_packet_route::{AddressFamily, RouteNetlinkMessage};
use std::net::IpAddr;
use tracing::trace;

// NTF_* entry flags
const NTF_SELF: u8 = 0x02;
const NTF_MASTER: u8 = 0x04;
const NTF_EXT_LEARNED: u8 = 0x10;
const NTF_ROUTER: u8 = 0x80;

// NUD_* states
const NUD_STALE: u16 = 0x04;
const NUD_NOARP: u16 = 0x40;
const NUD_PERMANENT: u16 = 0x80;

/// FDB state word for a NUD_* value (empty for dynamic entries)
pub fn fdb_state_name(state: u16) -> &'static str {
    if state & NUD_PERMANENT != 0 {
        "permanent"
    } else if state & NUD_NOARP != 0 {
        "static"
    } else if state & NUD_STALE != 0 {
        "stale"
    } else {
        ""
    }
}

/// Renders RTM_NEWNEIGH / RTM_DELNEIGH records
#[derive(Debug, Default)]
pub struct NeighborRenderer {
    interfaces: InterfaceCache,
}

impl NeighborRenderer {
    pub fn new(interfaces: InterfaceCache) -> Self {
        Self { interfaces }
    }

    fn render_entry(&mut self, neigh: &NeighbourMessage, deleted: bool, out: &mut String) {
        if neigh.header.family != AddressFamily::Bridge {
            trace!(family = ?neigh.header.family, "Skipping non-bridge neighbor");
            return;
        }

        let mut lladdr = None;
        let mut dst = None;
        let mut vlan = None;
        let mut controller = None;
        for attr in &neigh.attributes {
            match attr {
                NeighbourAttribute::LinkLocalAddress(bytes) => lladdr = Some(bytes.as_slice()),
                NeighbourAttribute::Destination(addr) => dst = neigh_address(addr),
                NeighbourAttribute::Vlan(vid) => vlan = Some(*vid),
                NeighbourAttribute::Controller(index) => controller = Some(*index),
                _ => {}
            }
        }

        let flags = neigh.header.flags.bits();
        let ifindex = neigh.header.ifindex;

        if deleted {
            out.push_str("Deleted ");
        }
        if let Some(lladdr) = lladdr {
            out.push_str(&format!("{} ", format_lladdr(lladdr)));
        }
        if ifindex != 0 {
            out.push_str(&format!("dev {} ", self.interfaces.resolve(ifindex)));
        }
        if let Some(dst) = dst {
            out.push_str(&format!("dst {} ", dst));
        }
        if let Some(vid) = vlan {
            out.push_str(&format!("vlan {} ", vid));
        }
        if flags & NTF_SELF != 0 {
            out.push_str("self ");
        }
        if let Some(index) = controller {
            out.push_str(&format!("master {} ", self.interfaces.resolve(index)));
        } else if flags & NTF_MASTER != 0 {
            out.push_str("master ");
        }
        if flags & NTF_ROUTER != 0 {
            out.push_str("router ");
        }
        if flags & NTF_EXT_LEARNED != 0 {
            out.push_str("extern_learn ");
        }
        out.push_str(fdb_state_name(u16::from(neigh.header.state)));
        out.push('\n');
    }
}

fn neigh_address(addr: &NeighbourAddress) -> Option<IpAddr> {
    match addr {
        NeighbourAddress::Inet(ipv4) => Some(IpAddr::V4(*ipv4)),
        NeighbourAddress::Inet6(ipv6) => Some(IpAddr::V6(*ipv6)),
        // AF_BRIDGE entries carry NDA_DST untyped; the length picks the family
        NeighbourAddress::Other(bytes) => match bytes.len() {
            4 => <[u8; 4]>::try_from(bytes.as_slice()).ok().map(IpAddr::from),
            16 => <[u8; 16]>::try_from(bytes.as_slice()).ok().map(IpAddr::from),
            _ => None,
        },
        _ => None,
    }
}

impl RecordRenderer for NeighborRenderer {
    fn render(&mut self, record: &EventRecord, out: &mut String) -> Result<()> {
        match parse_route_message(record)? {
            RouteNetlinkMessage::NewNeighbour(neigh) => self.render_entry(&neigh, false, out),
            RouteNetlinkMessage::DelNeighbour(neigh) => self.render_entry(&neigh, true, out),
            _ => {
                return Err(MonitorError::Decode(format!(
                    "type {} is not a neighbor message",
                    record.topic_code
                )));
            }
        }
        Ok(())
    }
}
