//! Live netlink subscription channel
//!
//! Binds a `NETLINK_ROUTE` socket to the configured multicast groups and
//! waits for notifications through tokio's `AsyncFd` (epoll). A datagram may
//! carry several messages; they are handed out one at a time.

#[cfg(target_os = "linux")]
mod linux {
    use crate::channel::{ChannelKind, EventChannel};
    use crate::error::{MonitorError, Result};
    use crate::types::{EventRecord, GroupSet, SourceAddress, split_datagram};
    use async_trait::async_trait;
    use netlink_sys::{Socket, SocketAddr, protocols::NETLINK_ROUTE};
    use std::collections::VecDeque;
    use std::os::fd::AsRawFd;
    use tokio::io::Interest;
    use tokio::io::unix::AsyncFd;
    use tracing::{debug, instrument, trace, warn};

    /// Receive buffer for one datagram
    const RECV_BUFFER_SIZE: usize = 64 * 1024;

    /// Subscription to kernel rtnetlink notifications
    pub struct LiveChannel {
        socket: AsyncFd<Socket>,
        buffer: Vec<u8>,
        pending: VecDeque<EventRecord>,
        groups: GroupSet,
    }

    impl LiveChannel {
        /// Open and bind a socket for exactly `groups`
        ///
        /// `receive_buffer_bytes` sets SO_RCVBUF; 0 keeps the kernel default.
        #[instrument]
        pub fn open(groups: GroupSet, receive_buffer_bytes: usize) -> Result<Self> {
            let open_err = |source| MonitorError::ChannelOpen {
                target: "netlink route socket".to_string(),
                source,
            };

            let mut socket = Socket::new(NETLINK_ROUTE).map_err(open_err)?;
            socket
                .bind(&SocketAddr::new(0, groups.bits()))
                .map_err(open_err)?;
            socket.set_non_blocking(true).map_err(open_err)?;

            if receive_buffer_bytes > 0 {
                set_receive_buffer(&socket, receive_buffer_bytes);
            }

            // SAFETY: `socket` owns its fd and closes it only on drop, so the fd
            // stays valid and unchanged while the AsyncFd holds it
            let socket = unsafe { AsyncFd::register_with_interest(socket, Interest::READABLE) }
                .map_err(|e| open_err(std::io::Error::from(e)))?;
            debug!(groups = ?groups, "Netlink socket bound");

            Ok(Self {
                socket,
                buffer: Vec::with_capacity(RECV_BUFFER_SIZE),
                pending: VecDeque::new(),
                groups,
            })
        }

        /// Groups this channel is bound to
        pub fn groups(&self) -> GroupSet {
            self.groups
        }

        /// Wait for the next datagram and queue its messages
        async fn fill(&mut self) -> Result<()> {
            loop {
                let mut guard = self
                    .socket
                    .readable()
                    .await
                    .map_err(|e| MonitorError::Transport(format!("readiness: {}", e)))?;

                self.buffer.clear();
                let buffer = &mut self.buffer;
                let received = match guard.try_io(|inner| inner.get_ref().recv_from(buffer, 0)) {
                    Ok(result) => result,
                    // Spurious wakeup; readiness already cleared
                    Err(_would_block) => continue,
                };

                match received {
                    Ok((0, _)) => {
                        return Err(MonitorError::Transport("EOF on netlink".to_string()));
                    }
                    Ok((len, addr)) => {
                        let source = SourceAddress {
                            port: addr.port_number(),
                            groups: addr.multicast_groups(),
                        };
                        let records = split_datagram(&self.buffer[..len], source)?;
                        trace!(len, count = records.len(), "Received datagram");
                        self.pending.extend(records);
                        if !self.pending.is_empty() {
                            return Ok(());
                        }
                    }
                    Err(e) if e.raw_os_error() == Some(libc::ENOBUFS) => {
                        // Kernel dropped notifications; keep listening
                        warn!("netlink receive error: ENOBUFS, events were lost");
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        return Err(MonitorError::Transport(format!(
                            "netlink receive error {}",
                            e
                        )));
                    }
                }
            }
        }
    }

    #[async_trait]
    impl EventChannel for LiveChannel {
        async fn next(&mut self) -> Result<Option<EventRecord>> {
            if self.pending.is_empty() {
                self.fill().await?;
            }
            Ok(self.pending.pop_front())
        }

        fn kind(&self) -> ChannelKind {
            ChannelKind::Live
        }
    }

    impl std::fmt::Debug for LiveChannel {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("LiveChannel")
                .field("fd", &self.socket.get_ref().as_raw_fd())
                .field("groups", &self.groups)
                .field("pending", &self.pending.len())
                .finish()
        }
    }

    /// Best-effort SO_RCVBUF; failure only costs burst headroom
    fn set_receive_buffer(socket: &Socket, size: usize) {
        let fd = socket.as_raw_fd();
        let size = size.min(libc::c_int::MAX as usize) as libc::c_int;
        // SAFETY: fd is a live socket owned by `socket`, optval points to a c_int
        let ret = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_RCVBUF,
                &size as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            warn!(size, "Failed to set SO_RCVBUF, using default buffer size");
        } else {
            debug!(size, "Set socket receive buffer");
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux::*;


/// Stand-in for platforms without rtnetlink; opening always fails
#[cfg(not(target_os = "linux"))]
mod mock {
    use crate::channel::{ChannelKind, EventChannel};
    use crate::error::{MonitorError, Result};
    use crate::types::{EventRecord, GroupSet};
    use async_trait::async_trait;

    #[derive(Debug)]
    pub struct LiveChannel;

    impl LiveChannel {
        pub fn open(_groups: GroupSet, _receive_buffer_bytes: usize) -> Result<Self> {
            Err(MonitorError::ChannelOpen {
                target: "netlink route socket".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "netlink is only available on Linux",
                ),
            })
        }

        pub fn groups(&self) -> GroupSet {
            GroupSet::EMPTY
        }
    }

    #[async_trait]
    impl EventChannel for LiveChannel {
        async fn next(&mut self) -> Result<Option<EventRecord>> {
            Ok(None)
        }

        fn kind(&self) -> ChannelKind {
            ChannelKind::Live
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub use mock::*;
