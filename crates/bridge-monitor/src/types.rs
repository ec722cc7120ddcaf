//! Core types for bridge monitoring
//!
//! Records are carried as raw netlink frames; only the 16-byte header is
//! interpreted here. Topic classification and multicast group selection
//! live alongside so both channel kinds and the dispatcher share them.

use crate::error::{MonitorError, Result};
use byteorder::{ByteOrder, NativeEndian};

/// Length of `struct nlmsghdr`
pub const NLMSG_HDRLEN: usize = 16;

/// Largest `nlmsg_len` accepted from a capture file
pub const MAX_RECORD_LEN: usize = 64 * 1024;

/// Link created or changed
pub const RTM_NEWLINK: u16 = 16;
/// Link removed
pub const RTM_DELLINK: u16 = 17;
/// Neighbor/FDB entry created or changed
pub const RTM_NEWNEIGH: u16 = 28;
/// Neighbor/FDB entry removed
pub const RTM_DELNEIGH: u16 = 29;
/// Capture timestamp mark written by rtmon-style recorders
pub const NLMSG_TSTAMP: u16 = 15;

/// Round a netlink length up to the 4-byte message alignment
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + 3) & !3
}

/// Classification of a notification record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Link state change (RTM_NEWLINK / RTM_DELLINK)
    Link,
    /// Neighbor / forwarding table change (RTM_NEWNEIGH / RTM_DELNEIGH)
    Neighbor,
    /// Capture timestamp mark (NLMSG_TSTAMP)
    Timestamp,
    /// Anything else; dropped silently
    Unknown,
}

/// Message type to topic table. Codes not listed classify as `Unknown`.
const TOPIC_TABLE: &[(u16, Topic)] = &[
    (RTM_NEWLINK, Topic::Link),
    (RTM_DELLINK, Topic::Link),
    (RTM_NEWNEIGH, Topic::Neighbor),
    (RTM_DELNEIGH, Topic::Neighbor),
    (NLMSG_TSTAMP, Topic::Timestamp),
];

impl Topic {
    /// Map a netlink message type to its topic
    pub fn classify(code: u16) -> Self {
        TOPIC_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, topic)| *topic)
            .unwrap_or(Topic::Unknown)
    }

    /// Multicast group that delivers this topic on a live socket
    pub fn group(self) -> Option<Group> {
        match self {
            Topic::Link => Some(Group::Link),
            Topic::Neighbor => Some(Group::Neigh),
            Topic::Timestamp | Topic::Unknown => None,
        }
    }
}

/// rtnetlink multicast groups (RTNLGRP_* values)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Group {
    /// RTNLGRP_LINK
    Link = 1,
    /// RTNLGRP_NOTIFY
    Notify = 2,
    /// RTNLGRP_NEIGH
    Neigh = 3,
    /// RTNLGRP_TC, excluded by default
    Tc = 4,
}

impl Group {
    /// Legacy bind mask for this group (`nl_mgrp`)
    #[inline]
    pub const fn mask(self) -> u32 {
        1 << (self as u32 - 1)
    }
}

/// Set of multicast groups a live channel binds to
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupSet(u32);

impl GroupSet {
    /// No groups
    pub const EMPTY: Self = Self(0);

    /// Every group except traffic control
    pub const DEFAULT: Self = Self(!Group::Tc.mask());

    /// Build from a raw bind mask
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bind mask passed to `bind(2)`
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Add a group
    #[must_use]
    pub const fn with(self, group: Group) -> Self {
        Self(self.0 | group.mask())
    }

    pub const fn contains(self, group: Group) -> bool {
        self.0 & group.mask() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for GroupSet {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Debug for GroupSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GroupSet({:#010x})", self.0)
    }
}

/// Netlink address of the party that sent a record
///
/// Replayed records carry the zero address since capture files do not
/// store it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceAddress {
    /// Sender port id (0 for the kernel)
    pub port: u32,
    /// Multicast groups the record was delivered on
    pub groups: u32,
}

/// One notification record: a complete netlink frame plus its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// nlmsg_type of the frame
    pub topic_code: u16,
    pub source: SourceAddress,
    frame: Vec<u8>,
}

impl EventRecord {
    /// Wrap a single netlink frame, validating its header
    ///
    /// Trailing alignment padding beyond `nlmsg_len` is discarded.
    pub fn from_frame(mut frame: Vec<u8>, source: SourceAddress) -> Result<Self> {
        if frame.len() < NLMSG_HDRLEN {
            return Err(MonitorError::Malformed(format!(
                "frame of {} bytes is shorter than a header",
                frame.len()
            )));
        }
        let len = NativeEndian::read_u32(&frame[0..4]) as usize;
        if len < NLMSG_HDRLEN || len > frame.len() {
            return Err(MonitorError::Malformed(format!(
                "len={} in a frame of {} bytes",
                len,
                frame.len()
            )));
        }
        frame.truncate(len);
        let topic_code = NativeEndian::read_u16(&frame[4..6]);

        Ok(Self {
            topic_code,
            source,
            frame,
        })
    }

    /// Topic this record classifies as
    pub fn topic(&self) -> Topic {
        Topic::classify(self.topic_code)
    }

    /// Whole frame, header included
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Frame body after the netlink header
    pub fn payload(&self) -> &[u8] {
        &self.frame[NLMSG_HDRLEN..]
    }
}

/// Split a received datagram into its netlink frames
pub fn split_datagram(data: &[u8], source: SourceAddress) -> Result<Vec<EventRecord>> {
    let mut records = Vec::new();
    let mut offset = 0;

    while data.len() - offset >= NLMSG_HDRLEN {
        let len = NativeEndian::read_u32(&data[offset..offset + 4]) as usize;
        if len < NLMSG_HDRLEN || offset + len > data.len() {
            return Err(MonitorError::Malformed(format!(
                "len={} at offset {} of a {} byte datagram",
                len,
                offset,
                data.len()
            )));
        }
        records.push(EventRecord::from_frame(
            data[offset..offset + len].to_vec(),
            source,
        )?);
        offset += nlmsg_align(len);
        if offset >= data.len() {
            break;
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame(msg_type: u16, body: &[u8]) -> Vec<u8> {
        let len = NLMSG_HDRLEN + body.len();
        let mut frame = vec![0u8; nlmsg_align(len)];
        NativeEndian::write_u32(&mut frame[0..4], len as u32);
        NativeEndian::write_u16(&mut frame[4..6], msg_type);
        frame[NLMSG_HDRLEN..len].copy_from_slice(body);
        frame
    }

    #[test]
    fn test_topic_classification_table() {
        assert_eq!(Topic::classify(RTM_NEWLINK), Topic::Link);
        assert_eq!(Topic::classify(RTM_DELLINK), Topic::Link);
        assert_eq!(Topic::classify(RTM_NEWNEIGH), Topic::Neighbor);
        assert_eq!(Topic::classify(RTM_DELNEIGH), Topic::Neighbor);
        assert_eq!(Topic::classify(NLMSG_TSTAMP), Topic::Timestamp);
    }

    #[test]
    fn test_unmapped_codes_are_unknown() {
        for code in [0u16, 1, 2, 3, 14, 18, 20, 24, 30, 999, u16::MAX] {
            assert_eq!(Topic::classify(code), Topic::Unknown, "code {}", code);
        }
    }

    #[test]
    fn test_group_masks() {
        assert_eq!(Group::Link.mask(), 0x1);
        assert_eq!(Group::Neigh.mask(), 0x4);
        assert_eq!(Group::Tc.mask(), 0x8);
        assert_eq!(Topic::Link.group(), Some(Group::Link));
        assert_eq!(Topic::Timestamp.group(), None);
    }

    #[test]
    fn test_default_group_set_excludes_tc() {
        let groups = GroupSet::DEFAULT;
        assert!(groups.contains(Group::Link));
        assert!(groups.contains(Group::Neigh));
        assert!(groups.contains(Group::Notify));
        assert!(!groups.contains(Group::Tc));
        assert_eq!(groups.bits(), !0x8);
    }

    #[test]
    fn test_group_set_with() {
        let groups = GroupSet::EMPTY.with(Group::Neigh);
        assert_eq!(groups.bits(), 0x4);
        assert!(!groups.is_empty());
        assert!(GroupSet::EMPTY.is_empty());
    }

    #[test]
    fn test_record_from_frame_strips_padding() {
        let frame = raw_frame(RTM_NEWLINK, &[1, 2, 3]);
        assert_eq!(frame.len(), 20);
        let record = EventRecord::from_frame(frame, SourceAddress::default()).unwrap();
        assert_eq!(record.topic_code, RTM_NEWLINK);
        assert_eq!(record.topic(), Topic::Link);
        assert_eq!(record.payload(), &[1, 2, 3]);
        assert_eq!(record.frame().len(), 19);
    }

    #[test]
    fn test_record_rejects_short_length() {
        let mut frame = raw_frame(RTM_NEWLINK, &[]);
        NativeEndian::write_u32(&mut frame[0..4], 8);
        let err = EventRecord::from_frame(frame, SourceAddress::default()).unwrap_err();
        assert!(matches!(err, MonitorError::Malformed(_)));
    }

    #[test]
    fn test_split_datagram_multiple_frames() {
        let mut data = raw_frame(RTM_NEWNEIGH, &[9; 5]);
        data.extend(raw_frame(99, &[0; 4]));
        data.extend(raw_frame(NLMSG_TSTAMP, &[0; 8]));

        let source = SourceAddress { port: 0, groups: 4 };
        let records = split_datagram(&data, source).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].topic(), Topic::Neighbor);
        assert_eq!(records[0].payload().len(), 5);
        assert_eq!(records[1].topic(), Topic::Unknown);
        assert_eq!(records[2].topic(), Topic::Timestamp);
        assert_eq!(records[2].source, source);
    }

    #[test]
    fn test_split_datagram_overrun_is_malformed() {
        let mut data = raw_frame(RTM_NEWLINK, &[0; 8]);
        NativeEndian::write_u32(&mut data[0..4], 64);
        assert!(split_datagram(&data, SourceAddress::default()).is_err());
    }
}
