//! Record renderers
//!
//! Turn link and neighbor records into the one-line text `bridge monitor`
//! prints. The dispatcher only sees the [`RecordRenderer`] trait, so any
//! decoder can be plugged in.

pub mod link;
pub mod neigh;
pub mod time;

pub use link::LinkRenderer;
pub use neigh::NeighborRenderer;

use crate::error::{MonitorError, Result};
use crate::types::EventRecord;
use netlink_packet_core::NetlinkMessage;
use netlink_packet_route::RouteNetlinkMessage;
use std::collections::HashMap;

/// Renders one record of a recognized topic
pub trait RecordRenderer: Send {
    /// Append the record's text (newline terminated) to `out`
    ///
    /// Records the renderer chooses to skip append nothing.
    fn render(&mut self, record: &EventRecord, out: &mut String) -> Result<()>;
}

/// Parse a record's frame as an rtnetlink message
pub(crate) fn parse_route_message(record: &EventRecord) -> Result<RouteNetlinkMessage> {
    use netlink_packet_core::NetlinkPayload;

    let msg = NetlinkMessage::<RouteNetlinkMessage>::deserialize(record.frame()).map_err(|e| {
        MonitorError::Decode(format!("type {}: {}", record.topic_code, e))
    })?;
    match msg.payload {
        NetlinkPayload::InnerMessage(inner) => Ok(inner),
        _ => Err(MonitorError::Decode(format!(
            "type {}: not an rtnetlink message",
            record.topic_code
        ))),
    }
}

/// Interface index to name cache
///
/// Names are looked up with `if_indextoname` on first use. Indices that do
/// not resolve (e.g. interfaces gone since a capture was taken) render as
/// `if<index>`.
#[derive(Debug, Default)]
pub struct InterfaceCache {
    cache: HashMap<u32, String>,
}

impl InterfaceCache {
    /// Look up a cached name
    pub fn get(&self, ifindex: u32) -> Option<&str> {
        self.cache.get(&ifindex).map(|s| s.as_str())
    }

    /// Seed the cache
    pub fn insert(&mut self, ifindex: u32, name: impl Into<String>) {
        self.cache.insert(ifindex, name.into());
    }

    /// Name for `ifindex`, querying the system if not cached
    pub fn resolve(&mut self, ifindex: u32) -> &str {
        self.cache
            .entry(ifindex)
            .or_insert_with(|| lookup_name(ifindex).unwrap_or_else(|| format!("if{}", ifindex)))
    }
}

#[cfg(target_os = "linux")]
fn lookup_name(ifindex: u32) -> Option<String> {
    nix::net::if_::if_indextoname(ifindex)
        .ok()
        .map(|name| name.to_string_lossy().into_owned())
        // Unknown indices come back as an empty name rather than an error
        .filter(|name| !name.is_empty())
}

#[cfg(not(target_os = "linux"))]
fn lookup_name(_ifindex: u32) -> Option<String> {
    None
}

/// Colon-separated hex link-layer address
pub fn format_lladdr(addr: &[u8]) -> String {
    addr.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}
