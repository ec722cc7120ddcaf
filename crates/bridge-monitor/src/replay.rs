//! Capture file replay channel
//!
//! A capture is a plain concatenation of netlink messages in host byte
//! order: a 16-byte header whose `nlmsg_len` covers header and body,
//! followed by the body padded to 4 bytes. Replayed records carry the zero
//! source address.

use crate::channel::{ChannelKind, EventChannel};
use crate::error::{MonitorError, Result};
use crate::types::{EventRecord, MAX_RECORD_LEN, NLMSG_HDRLEN, SourceAddress, nlmsg_align};
use async_trait::async_trait;
use byteorder::{ByteOrder, NativeEndian};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, instrument, trace};

/// Records read back from a capture file
#[derive(Debug)]
pub struct ReplayChannel {
    reader: BufReader<File>,
    path: PathBuf,
    records: u64,
    finished: bool,
}

impl ReplayChannel {
    /// Open a capture file
    #[instrument]
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .map_err(|source| MonitorError::ChannelOpen {
                target: path.display().to_string(),
                source,
            })?;
        debug!("Opened capture file");

        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            records: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records yielded so far
    pub fn records_read(&self) -> u64 {
        self.records
    }
}

#[async_trait]
impl EventChannel for ReplayChannel {
    async fn next(&mut self) -> Result<Option<EventRecord>> {
        if self.finished {
            return Ok(None);
        }
        match read_frame(&mut self.reader).await {
            Ok(Some(frame)) => {
                self.records += 1;
                let record = EventRecord::from_frame(frame, SourceAddress::default())?;
                trace!(
                    index = self.records,
                    topic_code = record.topic_code,
                    "Replayed record"
                );
                Ok(Some(record))
            }
            Ok(None) => {
                debug!(records = self.records, "Capture file exhausted");
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Replay
    }
}

/// Read up to `buf.len()` bytes; fewer only at end of file
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read one frame (header plus unpadded body)
///
/// `Ok(None)` at a clean end of file on a record boundary.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; NLMSG_HDRLEN];
    match read_full(reader, &mut header).await? {
        0 => return Ok(None),
        NLMSG_HDRLEN => {}
        _ => return Err(MonitorError::Truncated),
    }

    let raw_len = NativeEndian::read_u32(&header[0..4]);
    let len = match usize::try_from(raw_len) {
        Ok(len) if (NLMSG_HDRLEN..=MAX_RECORD_LEN).contains(&len) => len,
        _ => return Err(MonitorError::Malformed(format!("len={}", raw_len))),
    };

    let mut frame = vec![0u8; nlmsg_align(len)];
    frame[..NLMSG_HDRLEN].copy_from_slice(&header);
    if read_full(reader, &mut frame[NLMSG_HDRLEN..]).await? != frame.len() - NLMSG_HDRLEN {
        return Err(MonitorError::Truncated);
    }
    frame.truncate(len);

    Ok(Some(frame))
}
