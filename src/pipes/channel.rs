//! Pipe channel: one inbound/outbound pipe pair to a single endpoint
//!
//! Every channel owns exactly one background reader task. The task pushes each
//! complete line it reads onto the channel's [`ResponseQueue`] and only stops
//! when the outbound pipe closes. There is no shutdown path: channels live as
//! long as the process does.
//!
//! ```text
//!            write half (inbound pipe)
//! caller ─────────────────────────────────► endpoint
//!   ▲                                          │
//!   │ ResponseQueue ◄── reader task ◄──────────┘
//!                      (outbound pipe, line by line)
//! ```

use crate::error::BridgeError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Filesystem location of one endpoint's pipe pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipeEndpoint {
    pub name: String,
    /// Pipe the bridge writes commands into
    pub inbound: PathBuf,
    /// Pipe the endpoint writes its responses into
    pub outbound: PathBuf,
}

/// Outcome of waiting on a [`ResponseQueue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reception {
    Line(String),
    TimedOut,
    /// The reader task has ended; no further lines will arrive
    Closed,
}

/// Unbounded FIFO of lines received from an endpoint
///
/// Lines are handed out strictly in arrival order, each to exactly one waiter.
#[derive(Debug)]
pub struct ResponseQueue {
    receiver: mpsc::UnboundedReceiver<String>,
}

impl ResponseQueue {
    pub async fn next_within(&mut self, timeout: Duration) -> Reception {
        match tokio::time::timeout(timeout, self.receiver.recv()).await {
            Ok(Some(line)) => Reception::Line(line),
            Ok(None) => Reception::Closed,
            Err(_) => Reception::TimedOut,
        }
    }

    /// Drops every line that is already queued, returns how many were dropped
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while self.receiver.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}

/// Exclusive access to a channel's write half and response queue
///
/// Holding this for a whole write-then-wait exchange is what keeps two
/// exchanges on one channel from interleaving.
pub struct ChannelIo {
    name: Arc<str>,
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    responses: ResponseQueue,
}

impl ChannelIo {
    pub async fn write_line(&mut self, line: &str) -> Result<(), BridgeError> {
        debug!("{} <- {}", self.name, line);
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.writer.write_all(buf.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn next_response(&mut self, timeout: Duration) -> Reception {
        self.responses.next_within(timeout).await
    }

    pub fn discard_pending(&mut self) -> usize {
        self.responses.discard_pending()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Shareable handle to one endpoint connection
#[derive(Clone)]
pub struct PipeChannel {
    name: Arc<str>,
    io: Arc<Mutex<ChannelIo>>,
}

impl PipeChannel {
    /// Opens both pipes of `endpoint` and waits out the stale-data drain
    ///
    /// Both FIFOs are opened read-write on Linux so that neither open blocks
    /// on the peer and the reader never sees EOF while the endpoint reopens.
    #[cfg(unix)]
    pub async fn open(endpoint: &PipeEndpoint, drain: Duration) -> Result<Self, BridgeError> {
        use tokio::net::unix::pipe;

        info!(
            "Opening pipe endpoint {} (in: {}, out: {})",
            endpoint.name,
            endpoint.inbound.display(),
            endpoint.outbound.display()
        );

        let mut options = pipe::OpenOptions::new();
        #[cfg(target_os = "linux")]
        options.read_write(true);

        let receiver = options.open_receiver(&endpoint.outbound)?;
        let sender = options.open_sender(&endpoint.inbound)?;

        Ok(Self::from_io(&endpoint.name, sender, receiver, drain).await)
    }

    /// Builds a channel over arbitrary byte streams
    ///
    /// Spawns the reader task, sleeps for `drain` so that output the endpoint
    /// produced before we attached can arrive, then throws that output away.
    pub async fn from_io<W, R>(name: &str, writer: W, reader: R, drain: Duration) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        let name: Arc<str> = Arc::from(name);
        let (sender, receiver) = mpsc::unbounded_channel();
        spawn_reader(name.clone(), reader, sender);

        let mut responses = ResponseQueue { receiver };
        tokio::time::sleep(drain).await;
        let stale = responses.discard_pending();
        if stale > 0 {
            info!("Discarded {} stale lines from {}", stale, name);
        }
        info!("Pipe endpoint {} ready", name);

        let io = ChannelIo {
            name: name.clone(),
            writer: Box::new(writer),
            responses,
        };
        Self {
            name,
            io: Arc::new(Mutex::new(io)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for exclusive use of the channel
    pub async fn lock(&self) -> MutexGuard<'_, ChannelIo> {
        self.io.lock().await
    }

    /// Drops queued lines nobody waited for (late answers of lost commands)
    pub async fn discard_stale(&self) -> usize {
        let discarded = self.lock().await.discard_pending();
        if discarded > 0 {
            warn!("Discarded {} late lines from {}", discarded, self.name);
        }
        discarded
    }
}

// Fire and forget: the handle is dropped, the task ends with the pipe.
fn spawn_reader<R>(name: Arc<str>, reader: R, sender: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    debug!("{} -> {}", name, line);
                    if sender.send(line).is_err() {
                        debug!("Response queue of {} dropped, stopping reader", name);
                        break;
                    }
                }
                Ok(None) => {
                    info!("Pipe {} closed", name);
                    break;
                }
                Err(e) => {
                    warn!("Reading from {} failed: {}", name, e);
                    break;
                }
            }
        }
    });
}
