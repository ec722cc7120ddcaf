//! Link record rendering
//!
//! `[Deleted ]<index>: <name> <FLAGS> [mtu N ][master DEV ][state OPER ]`

use super::{InterfaceCache, RecordRenderer, parse_route_message};
use crate::error::{MonitorError, Result};
use crate::types::EventRecord;
use netlink_packet_route::link::{LinkAttribute, LinkMessage};
use netlink_packet_route::{AddressFamily, RouteNetlinkMessage};
use tracing::trace;

const IFF_UP: u32 = 0x1;
const IFF_RUNNING: u32 = 0x40;

/// IFF_* names in the order `ip link` prints them
const LINK_FLAG_NAMES: &[(u32, &str)] = &[
    (0x8, "LOOPBACK"),
    (0x2, "BROADCAST"),
    (0x10, "POINTOPOINT"),
    (0x1000, "MULTICAST"),
    (0x80, "NOARP"),
    (0x200, "ALLMULTI"),
    (0x100, "PROMISC"),
    (0x400, "MASTER"),
    (0x800, "SLAVE"),
    (0x4, "DEBUG"),
    (0x8000, "DYNAMIC"),
    (0x4000, "AUTOMEDIA"),
    (0x2000, "PORTSEL"),
    (0x20, "NOTRAILERS"),
    (IFF_UP, "UP"),
    (0x10000, "LOWER_UP"),
    (0x20000, "DORMANT"),
    (0x40000, "ECHO"),
];

/// Render interface flags as `<A,B,...>`
///
/// `NO-CARRIER` leads when the link is up without carrier; bits without a
/// name are appended in hex.
pub fn format_link_flags(flags: u32) -> String {
    let mut names: Vec<String> = Vec::new();
    if flags & IFF_UP != 0 && flags & IFF_RUNNING == 0 {
        names.push("NO-CARRIER".to_string());
    }

    let mut rest = flags & !IFF_RUNNING;
    for (bit, name) in LINK_FLAG_NAMES {
        if rest & bit != 0 {
            names.push((*name).to_string());
            rest &= !bit;
        }
    }
    if rest != 0 {
        names.push(format!("{:x}", rest));
    }

    format!("<{}>", names.join(","))
}

/// Renders RTM_NEWLINK / RTM_DELLINK records
#[derive(Debug, Default)]
pub struct LinkRenderer {
    interfaces: InterfaceCache,
}

impl LinkRenderer {
    pub fn new(interfaces: InterfaceCache) -> Self {
        Self { interfaces }
    }

    fn render_link(&mut self, link: &LinkMessage, deleted: bool, out: &mut String) {
        let family = &link.header.interface_family;
        if *family != AddressFamily::Bridge && *family != AddressFamily::Unspec {
            trace!(family = ?family, "Skipping non-bridge link");
            return;
        }

        let mut name = None;
        let mut mtu = None;
        let mut controller = None;
        let mut oper_state = None;
        for attr in &link.attributes {
            match attr {
                LinkAttribute::IfName(n) => name = Some(n.as_str()),
                LinkAttribute::Mtu(m) => mtu = Some(*m),
                LinkAttribute::Controller(index) => controller = Some(*index),
                LinkAttribute::OperState(state) => oper_state = Some(state),
                _ => {}
            }
        }

        if deleted {
            out.push_str("Deleted ");
        }
        out.push_str(&format!(
            "{}: {} {} ",
            link.header.index,
            name.unwrap_or("<nil>"),
            format_link_flags(link.header.flags.bits())
        ));
        if let Some(mtu) = mtu {
            out.push_str(&format!("mtu {} ", mtu));
        }
        if let Some(index) = controller {
            out.push_str(&format!("master {} ", self.interfaces.resolve(index)));
        }
        if let Some(state) = oper_state {
            out.push_str(&format!("state {} ", format!("{:?}", state).to_uppercase()));
        }
        out.push('\n');
    }
}

impl RecordRenderer for LinkRenderer {
    fn render(&mut self, record: &EventRecord, out: &mut String) -> Result<()> {
        match parse_route_message(record)? {
            RouteNetlinkMessage::NewLink(link) => self.render_link(&link, false, out),
            RouteNetlinkMessage::DelLink(link) => self.render_link(&link, true, out),
            _ => {
                return Err(MonitorError::Decode(format!(
                    "type {} is not a link message",
                    record.topic_code
                )));
            }
        }
        Ok(())
    }
}
