//! MSAP TCP Server
//!
//! Exposes one simulated node's management port on a TCP socket. Bytes from
//! the client are reassembled into frames with [`FrameCodec`]; each frame is
//! run through the engine and its confirm is written back before the next
//! frame is looked at.
//!
//! Indications raised by the node are queued in the engine and written
//! after the confirm of an indication poll, which is when a host expects
//! them.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use msap_core::sim::{NodeEvent, SimulatedNode};
use msap_core::{Item, Msap, Outcome};
use msap_metrics::{metric_defs, MetricLabels};
use msap_protocol::{Frame, FrameCodec, FUNC_INDICATION_POLL_REQ};

use crate::config::RunnerConfig;
use crate::error::RunnerError;

// ============================================================================
// Types
// ============================================================================

/// Identity of the served node, for display.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Node name.
    pub name: String,
    /// Node role, or "unset".
    pub role: String,
    /// Bound management port address.
    pub addr: SocketAddr,
}

impl NodeInfo {
    /// Print a one-row node table to stderr.
    pub fn print_table(&self) {
        eprintln!();
        eprintln!("┌{}┬{}┬{}┐", "─".repeat(20), "─".repeat(10), "─".repeat(24));
        eprintln!("│ {:^18} │ {:^8} │ {:^22} │", "Node Name", "Role", "Address");
        eprintln!("├{}┼{}┼{}┤", "─".repeat(20), "─".repeat(10), "─".repeat(24));
        eprintln!(
            "│ {:18} │ {:8} │ {:22} │",
            self.name,
            self.role,
            self.addr.to_string()
        );
        eprintln!("└{}┴{}┴{}┘", "─".repeat(20), "─".repeat(10), "─".repeat(24));
        eprintln!();
    }
}

/// A TCP server driving one simulated node.
pub struct MsapServer {
    msap: Msap<SimulatedNode>,
    listener: TcpListener,
    info: NodeInfo,
    labels: MetricLabels,
}

impl MsapServer {
    /// Boot the node described by `config` and bind its management port.
    pub async fn bind(config: &RunnerConfig) -> Result<Self, RunnerError> {
        let name = config.msap.name.clone();
        let node = SimulatedNode::new(name.clone(), &config.node);
        let role = node.role().map_or("unset", |r| r.as_label()).to_string();
        let labels = MetricLabels::new(name.clone(), role.clone());
        let msap = Msap::new(node, config.msap.clone()).with_labels(labels.clone());

        let listener = TcpListener::bind(&config.listen).await?;
        let addr = listener.local_addr()?;
        info!(node = %name, %addr, "management port listening");

        Ok(MsapServer {
            msap,
            listener,
            info: NodeInfo { name, role, addr },
            labels,
        })
    }

    /// Bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.info.addr
    }

    /// Node identity.
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// The engine.
    pub fn msap(&self) -> &Msap<SimulatedNode> {
        &self.msap
    }

    /// The engine, mutably.
    pub fn msap_mut(&mut self) -> &mut Msap<SimulatedNode> {
        &mut self.msap
    }

    /// Accept and serve clients until `shutdown` flips to true.
    ///
    /// One client is served at a time. A client error ends that session only.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), RunnerError> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    info!(%peer, "host connected");
                    metrics::counter!(metric_defs::HOST_CONNECTIONS.name, &self.labels.to_labels())
                        .increment(1);

                    match self.serve(stream, &mut shutdown).await {
                        Ok(()) => info!(%peer, "host disconnected"),
                        Err(e) => warn!(%peer, error = %e, "host session ended with error"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("shutting down");
                        return Ok(());
                    }
                }
            }
            if *shutdown.borrow() {
                return Ok(());
            }
        }
    }

    async fn serve(
        &mut self,
        mut stream: TcpStream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), RunnerError> {
        let (mut reader, mut writer) = stream.split();
        let mut codec = FrameCodec::new();
        let mut read_buf = [0u8; 1024];

        loop {
            tokio::select! {
                result = reader.read(&mut read_buf) => {
                    let n = result?;
                    if n == 0 {
                        return Ok(());
                    }
                    codec.push(&read_buf[..n]);
                    while let Some(frame) = codec.decode() {
                        self.serve_frame(frame, &mut writer).await?;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Run one request frame through the engine and answer it.
    pub async fn serve_frame<W>(&mut self, frame: Frame, writer: &mut W) -> Result<(), RunnerError>
    where
        W: AsyncWrite + Unpin,
    {
        let function = frame.function;
        let Some(mut item) = self.msap.accept(frame) else {
            return Ok(());
        };

        let outcome = self.msap.handle(&mut item);
        match outcome {
            Outcome::Responded => {
                self.msap.pre_send(&mut item);
                let sent = write_frame(writer, &item.frame).await;
                self.finish(item, sent)?;
            }
            Outcome::Rejected => {
                debug!(function, "request rejected, no confirm sent");
                self.msap.release(item);
            }
            Outcome::Unhandled => {
                debug!(function, "request not handled, no confirm sent");
                self.msap.release(item);
            }
        }

        self.collect_events();

        if outcome == Outcome::Responded && function == FUNC_INDICATION_POLL_REQ {
            self.send_indications(writer).await?;
        }
        Ok(())
    }

    /// Turn node events into queued indications.
    fn collect_events(&mut self) {
        for event in self.msap.platform_mut().take_events() {
            trace!(?event, "node event");
            match event {
                NodeEvent::StackStateChanged => self.msap.notify_stack_state(),
                NodeEvent::ScanComplete => self.msap.notify_scan_complete(),
                NodeEvent::AppConfigReceived(config) => {
                    self.msap
                        .notify_app_config(config.seq, &config.data, config.interval)
                }
            }
        }
    }

    async fn send_indications<W>(&mut self, writer: &mut W) -> Result<(), RunnerError>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(mut item) = self.msap.next_indication() {
            self.msap.pre_send(&mut item);
            let sent = write_frame(writer, &item.frame).await;
            self.finish(item, sent)?;
        }
        Ok(())
    }

    /// Post-send steps only run for frames that actually left.
    fn finish(&mut self, item: Item, sent: Result<(), RunnerError>) -> Result<(), RunnerError> {
        match sent {
            Ok(()) => {
                self.msap.post_send(item);
                Ok(())
            }
            Err(e) => {
                self.msap.release(item);
                Err(e)
            }
        }
    }
}

async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), RunnerError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame.encode()?;
    trace!(data = %hex::encode(&bytes), "tx frame");
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read exactly one frame from a stream. Used by host-side tools and tests.
pub async fn read_frame<R>(reader: &mut R, codec: &mut FrameCodec) -> Result<Option<Frame>, RunnerError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 256];
    loop {
        if let Some(frame) = codec.decode() {
            return Ok(Some(frame));
        }
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        codec.push(&buf[..n]);
    }
}
