//! Event channel abstraction
//!
//! A channel yields [`EventRecord`]s one at a time. `Ok(None)` means the
//! channel is exhausted; errors are fatal for the session.

use crate::error::Result;
use crate::types::EventRecord;
use async_trait::async_trait;

/// Which kind of channel produced the records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Kernel netlink subscription
    Live,
    /// Capture file
    Replay,
}

/// Source of notification records
#[async_trait]
pub trait EventChannel: Send {
    /// Next record, `None` once the channel is exhausted
    async fn next(&mut self) -> Result<Option<EventRecord>>;

    fn kind(&self) -> ChannelKind;
}

/// Channel over an in-memory record sequence
///
/// Used to feed the session from already-framed records.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    records: std::collections::VecDeque<EventRecord>,
    kind: Option<ChannelKind>,
}

impl MemoryChannel {
    pub fn new(records: impl IntoIterator<Item = EventRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
            kind: None,
        }
    }

    /// Report this channel as the given kind
    #[must_use]
    pub fn with_kind(mut self, kind: ChannelKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[async_trait]
impl EventChannel for MemoryChannel {
    async fn next(&mut self) -> Result<Option<EventRecord>> {
        Ok(self.records.pop_front())
    }

    fn kind(&self) -> ChannelKind {
        self.kind.unwrap_or(ChannelKind::Replay)
    }
}
