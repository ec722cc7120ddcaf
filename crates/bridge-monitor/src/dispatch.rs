//! Record dispatch
//!
//! Classifies each record by topic and routes it to the matching renderer.
//! Everything a record produces (capture timestamp, banner, body) is built
//! in memory first and reaches the sink as a single write.

use crate::decode::{LinkRenderer, NeighborRenderer, RecordRenderer, time};
use crate::error::Result;
use crate::types::{EventRecord, Topic};
use std::io::Write;
use tracing::trace;

/// Tag printed ahead of link records when the banner is on
pub const LINK_BANNER: &str = "[LINK]";
/// Tag printed ahead of neighbor records when the banner is on
pub const NEIGH_BANNER: &str = "[NEIGH]";

/// Routes records to topic renderers
#[derive(Debug)]
pub struct Dispatcher<L = LinkRenderer, N = NeighborRenderer> {
    link: L,
    neigh: N,
    banner: bool,
}

impl Dispatcher {
    /// Dispatcher with the netlink link and FDB renderers
    pub fn with_default_renderers(banner: bool) -> Self {
        Self::new(LinkRenderer::default(), NeighborRenderer::default(), banner)
    }
}

impl<L, N> Dispatcher<L, N>
where
    L: RecordRenderer,
    N: RecordRenderer,
{
    pub fn new(link: L, neigh: N, banner: bool) -> Self {
        Self {
            link,
            neigh,
            banner,
        }
    }

    pub fn banner(&self) -> bool {
        self.banner
    }

    /// Append the rendering of `record` to `out`
    ///
    /// Unknown topics append nothing and never fail. Renderer errors are
    /// returned unchanged.
    pub fn render(&mut self, record: &EventRecord, out: &mut String) -> Result<()> {
        match record.topic() {
            Topic::Link => {
                if self.banner {
                    out.push_str(LINK_BANNER);
                }
                self.link.render(record, out)
            }
            Topic::Neighbor => {
                if self.banner {
                    out.push_str(NEIGH_BANNER);
                }
                self.neigh.render(record, out)
            }
            Topic::Timestamp => time::render_mark(record.payload(), out),
            Topic::Unknown => {
                trace!(topic_code = record.topic_code, "Dropping record");
                Ok(())
            }
        }
    }

    /// Render `record` behind an optional capture line and write it out
    ///
    /// Nothing is written if rendering fails.
    pub fn dispatch<W: Write>(
        &mut self,
        record: EventRecord,
        capture: Option<&str>,
        sink: &mut W,
    ) -> Result<()> {
        let mut unit = String::new();
        if let Some(capture) = capture {
            unit.push_str(capture);
        }
        self.render(&record, &mut unit)?;

        if !unit.is_empty() {
            sink.write_all(unit.as_bytes())?;
            sink.flush()?;
        }
        Ok(())
    }
}
