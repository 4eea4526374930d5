//! Interactive shell channel over SSH.
//!
//! russh delivers channel data as messages on an async `wait()` call, which
//! cannot answer "is data waiting?" without blocking. A pump task owns the
//! russh channel, forwards received data into a queue and executes writes
//! handed to it, so that readiness can be polled cheaply.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use log::{debug, trace};
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::ShellChannel;
use super::config::SshConfig;
use super::ssh::SshTransport;
use crate::error::{Result, TransportError};

/// Requests handed to the pump task.
enum Outbound {
    Data {
        data: Vec<u8>,
        reply: oneshot::Sender<std::result::Result<(), russh::Error>>,
    },
    Close,
}

/// An interactive SSH shell implementing [`ShellChannel`].
pub struct SshShell {
    transport: Option<SshTransport>,
    outbound: mpsc::UnboundedSender<Outbound>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: BytesMut,
    pump: Option<JoinHandle<()>>,
    timeout: Duration,

    /// The pump has stopped delivering data.
    remote_closed: bool,
}

impl SshShell {
    /// Connect, authenticate and start an interactive shell.
    pub async fn open(config: SshConfig) -> Result<Self> {
        let timeout = config.timeout;
        let transport = SshTransport::connect(config).await?;
        let channel = transport.open_shell().await?;

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump(channel, outbound_rx, inbound_tx));

        debug!("interactive shell opened");

        Ok(Self::from_parts(
            Some(transport),
            outbound,
            inbound,
            Some(pump),
            timeout,
        ))
    }

    fn from_parts(
        transport: Option<SshTransport>,
        outbound: mpsc::UnboundedSender<Outbound>,
        inbound: mpsc::UnboundedReceiver<Vec<u8>>,
        pump: Option<JoinHandle<()>>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            outbound,
            inbound,
            pending: BytesMut::with_capacity(4096),
            pump,
            timeout,
            remote_closed: false,
        }
    }

    /// Move everything the pump has delivered into the pending buffer.
    fn drain_inbound(&mut self) {
        loop {
            match self.inbound.try_recv() {
                Ok(data) => self.pending.extend_from_slice(&data),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.remote_closed = true;
                    break;
                }
            }
        }
    }
}

impl ShellChannel for SshShell {
    // Writes are queued to the pump, so the shell is always writable. Once
    // the pump is gone the write itself fails with `Closed`.
    fn send_ready(&mut self) -> bool {
        true
    }

    // A dead pump also counts as readable so the next recv reports it.
    fn recv_ready(&mut self) -> bool {
        self.drain_inbound();
        !self.pending.is_empty() || self.remote_closed
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.outbound
            .send(Outbound::Data {
                data: data.to_vec(),
                reply,
            })
            .map_err(|_| TransportError::Closed)?;

        tokio::time::timeout(self.timeout, reply_rx)
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(|_| TransportError::Closed)?
            .map_err(TransportError::Ssh)?;
        Ok(())
    }

    async fn recv(&mut self, max: usize) -> Result<Vec<u8>> {
        self.drain_inbound();
        if self.pending.is_empty() {
            let data = tokio::time::timeout(self.timeout, self.inbound.recv())
                .await
                .map_err(|_| TransportError::Timeout(self.timeout))?
                .ok_or(TransportError::Closed)?;
            self.pending.extend_from_slice(&data);
        }

        let take = max.min(self.pending.len());
        let chunk = self.pending.split_to(take).to_vec();
        trace!("recv {} bytes ({} still pending)", chunk.len(), self.pending.remaining());
        Ok(chunk)
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.outbound.send(Outbound::Close);
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }
}

impl Drop for SshShell {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

async fn pump(
    mut channel: Channel<Msg>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    inbound: mpsc::UnboundedSender<Vec<u8>>,
) {
    loop {
        tokio::select! {
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { data }) | Some(ChannelMsg::ExtendedData { data, .. }) => {
                    if inbound.send(data.to_vec()).is_err() {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    debug!("shell channel closed by remote");
                    break;
                }
                Some(_) => {}
            },
            request = outbound.recv() => match request {
                Some(Outbound::Data { data, reply }) => {
                    let _ = reply.send(channel.data(&data[..]).await);
                }
                Some(Outbound::Close) | None => {
                    let _ = channel.close().await;
                    break;
                }
            },
        }
    }
}
