//! Bridge monitor for SONiC
//!
//! Watches kernel rtnetlink notifications for bridge links and forwarding
//! database entries and prints one line per event, the way
//! `bridge monitor` does. Records can come from a live netlink
//! subscription or from a previously captured file; both paths render
//! identically.
//!
//! # Architecture
//!
//! ```text
//! tokens ──▶ mode::resolve ──▶ MonitorConfig
//!                                  │
//!                    ┌─────────────┴─────────────┐
//!                    ▼                           ▼
//!               LiveChannel                ReplayChannel
//!           (NETLINK_ROUTE groups)        (capture file)
//!                    └─────────────┬─────────────┘
//!                                  ▼ EventRecord
//!                             Dispatcher ──▶ LinkRenderer / NeighborRenderer
//!                                  │
//!                                  ▼
//!                               stdout
//! ```

pub mod channel;
pub mod config_file;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod mode;
pub mod netlink;
pub mod replay;
pub mod session;
pub mod types;

pub use channel::{ChannelKind, EventChannel, MemoryChannel};
pub use config_file::MonitorSettings;
pub use decode::{InterfaceCache, LinkRenderer, NeighborRenderer, RecordRenderer};
pub use dispatch::{Dispatcher, LINK_BANNER, NEIGH_BANNER};
pub use error::{ArgError, MonitorError, Result};
pub use mode::{MonitorCommand, MonitorConfig, resolve};
pub use netlink::LiveChannel;
pub use replay::ReplayChannel;
pub use session::{ExitStatus, Session, SessionEnd, SessionOptions, USAGE, run};
pub use types::{EventRecord, Group, GroupSet, SourceAddress, Topic};
