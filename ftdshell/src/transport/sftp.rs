//! File transfer over an SFTP subsystem channel.
//!
//! Runs on its own SSH connection, separate from the interactive shell, and
//! reports byte-level progress to a caller-supplied callback.

use std::path::Path;

use log::debug;
use russh_sftp::client::SftpSession;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::config::SshConfig;
use super::ssh::SshTransport;
use crate::error::{Result, SessionError, TransferError};

/// Block size used when copying file contents.
const BLOCK_SIZE: usize = 32 * 1024;

/// SFTP client with progress reporting.
///
/// # Example
///
/// ```rust,no_run
/// use ftdshell::{AuthMethod, SftpClient, SshConfig};
///
/// # async fn example() -> Result<(), ftdshell::Error> {
/// let config = SshConfig::new("10.0.0.1", "admin", AuthMethod::Password("secret".into()));
/// let mut sftp = SftpClient::connect(config).await?;
/// sftp.get("/var/log/messages", "messages.log", |done, total| {
///     println!("{done}/{total} bytes");
/// })
/// .await?;
/// sftp.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct SftpClient {
    transport: Option<SshTransport>,
    sftp: Option<SftpSession>,
}

impl SftpClient {
    /// Connect, authenticate and start the `sftp` subsystem.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let transport = SshTransport::connect(config).await?;
        let channel = transport.open_subsystem("sftp").await?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(TransferError::Sftp)?;

        Ok(Self {
            transport: Some(transport),
            sftp: Some(sftp),
        })
    }

    fn session(&self) -> Result<&SftpSession> {
        Ok(self.sftp.as_ref().ok_or(SessionError::NotConnected)?)
    }

    /// Download `remote` into `local`, returning the number of bytes copied.
    ///
    /// `progress` is called with `(bytes_so_far, total_bytes)` after every block.
    pub async fn get<F>(
        &mut self,
        remote: &str,
        local: impl AsRef<Path>,
        mut progress: F,
    ) -> Result<u64>
    where
        F: FnMut(u64, u64),
    {
        let sftp = self.session()?;
        let total = sftp
            .metadata(remote)
            .await
            .map_err(TransferError::Sftp)?
            .size
            .unwrap_or(0);

        let mut source = sftp.open(remote).await.map_err(TransferError::Sftp)?;
        let mut dest = tokio::fs::File::create(local.as_ref())
            .await
            .map_err(TransferError::Io)?;

        debug!("sftp get {} ({} bytes)", remote, total);
        let copied = copy_with_progress(&mut source, &mut dest, total, &mut progress)
            .await
            .map_err(TransferError::Io)?;
        Ok(copied)
    }

    /// Upload `local` to `remote`, returning the number of bytes copied.
    ///
    /// `progress` is called with `(bytes_so_far, total_bytes)` after every block.
    pub async fn put<F>(
        &mut self,
        local: impl AsRef<Path>,
        remote: &str,
        mut progress: F,
    ) -> Result<u64>
    where
        F: FnMut(u64, u64),
    {
        let sftp = self.session()?;
        let total = tokio::fs::metadata(local.as_ref())
            .await
            .map_err(TransferError::Io)?
            .len();

        let mut source = tokio::fs::File::open(local.as_ref())
            .await
            .map_err(TransferError::Io)?;
        let mut dest = sftp.create(remote).await.map_err(TransferError::Sftp)?;

        debug!("sftp put {} ({} bytes)", remote, total);
        let copied = copy_with_progress(&mut source, &mut dest, total, &mut progress)
            .await
            .map_err(TransferError::Io)?;
        Ok(copied)
    }

    /// Close the SFTP session and the underlying connection. Idempotent.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(sftp) = self.sftp.take() {
            sftp.close().await.map_err(TransferError::Sftp)?;
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }
}

/// Copy `reader` into `writer` block by block, reporting progress.
async fn copy_with_progress<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    total: u64,
    progress: &mut F,
) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: FnMut(u64, u64),
{
    let mut buf = vec![0u8; BLOCK_SIZE];
    let mut done = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        done += n as u64;
        progress(done, total);
    }

    writer.shutdown().await?;
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_reports_progress_per_block() {
        let data = vec![7u8; BLOCK_SIZE * 2 + 10];
        let mut reader = &data[..];
        let mut writer = Vec::<u8>::new();
        let mut calls = Vec::new();

        let total = data.len() as u64;
        let mut record = |d: u64, t: u64| calls.push((d, t));
        let copied = copy_with_progress(&mut reader, &mut writer, total, &mut record)
            .await
            .unwrap();

        assert_eq!(copied, data.len() as u64);
        assert_eq!(writer, data);
        assert_eq!(calls.last(), Some(&(data.len() as u64, data.len() as u64)));
        assert!(calls.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn test_copy_empty_source() {
        let mut reader: &[u8] = &[];
        let mut writer = Vec::<u8>::new();
        let mut called = false;

        let mut record = |_: u64, _: u64| called = true;
        let copied = copy_with_progress(&mut reader, &mut writer, 0, &mut record)
            .await
            .unwrap();

        assert_eq!(copied, 0);
        assert!(!called);
    }
}
