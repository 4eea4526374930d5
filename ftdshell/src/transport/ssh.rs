//! Authenticated russh connections for the shell and SFTP channels.
//!
//! Every request sent to the device is bounded by [`SshConfig::timeout`]. A
//! host key is accepted, learned or refused according to
//! [`HostKeyVerification`]; `verdict` holds the full table.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

/// An authenticated connection to one device.
pub struct SshTransport {
    handle: Handle<KeyPolicy>,
    config: SshConfig,
}

impl SshTransport {
    /// Connect, check the host key and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let refused = RefusalSlot::default();
        let policy = KeyPolicy {
            host: config.host.clone(),
            port: config.port,
            verification: config.host_key_verification,
            known_hosts: config.known_hosts_path.clone(),
            refused: refused.clone(),
        };

        debug!("ssh connect {}", config.socket_addr());
        let connecting = client::connect(
            Arc::new(client::Config::default()),
            (config.host.as_str(), config.port),
            policy,
        );
        let mut handle = match tokio::time::timeout(config.timeout, connecting).await {
            Err(_) => return Err(TransportError::Timeout(config.timeout).into()),
            Ok(Ok(handle)) => handle,
            // russh only reports a bare UnknownKey; the policy recorded why
            Ok(Err(e)) => return Err(refused.take().unwrap_or(TransportError::Ssh(e)).into()),
        };

        authenticate(&mut handle, &config).await?;
        debug!("ssh authenticated as {}", config.username);

        Ok(Self { handle, config })
    }

    /// Open a channel with a vt100 PTY of the configured size and start a
    /// shell on it.
    pub async fn open_shell(&self) -> Result<Channel<Msg>> {
        let limit = self.config.timeout;
        let (width, height) = (self.config.terminal_width, self.config.terminal_height);

        let channel = self.open_session().await?;
        within(limit, channel.request_pty(true, "vt100", width, height, 0, 0, &[])).await?;
        within(limit, channel.request_shell(true)).await?;
        Ok(channel)
    }

    /// Open a channel bound to the named subsystem, e.g. `sftp`.
    pub async fn open_subsystem(&self, name: &str) -> Result<Channel<Msg>> {
        let channel = self.open_session().await?;
        within(self.config.timeout, channel.request_subsystem(true, name)).await?;
        Ok(channel)
    }

    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    /// Disconnect from the device.
    pub async fn close(self) -> Result<()> {
        let bye = self
            .handle
            .disconnect(russh::Disconnect::ByApplication, "", "en");
        within(self.config.timeout, bye).await
    }

    async fn open_session(&self) -> Result<Channel<Msg>> {
        within(self.config.timeout, self.handle.channel_open_session()).await
    }
}

/// Await a russh request, giving up after `limit`.
async fn within<T, F>(limit: Duration, request: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, russh::Error>>,
{
    match tokio::time::timeout(limit, request).await {
        Ok(result) => Ok(result.map_err(TransportError::Ssh)?),
        Err(_) => Err(TransportError::Timeout(limit).into()),
    }
}

async fn authenticate(handle: &mut Handle<KeyPolicy>, config: &SshConfig) -> Result<()> {
    let user = config.username.as_str();
    let limit = config.timeout;

    let outcome = match &config.auth {
        AuthMethod::None => within(limit, handle.authenticate_none(user)).await?,
        AuthMethod::Password(password) => {
            let password = password.expose_secret();
            within(limit, handle.authenticate_password(user, password)).await?
        }
        AuthMethod::PrivateKey { path, passphrase } => {
            let passphrase = passphrase.as_ref().map(|p| p.expose_secret());
            let key = load_secret_key(path, passphrase)
                .map_err(|e| TransportError::Key(format!("{}: {e}", path.display())))?;
            let hash = within(limit, handle.best_supported_rsa_hash()).await?.flatten();
            let key = PrivateKeyWithHashAlg::new(Arc::new(key), hash);
            within(limit, handle.authenticate_publickey(user, key)).await?
        }
    };

    if outcome.success() {
        Ok(())
    } else {
        Err(TransportError::AuthenticationFailed {
            user: config.username.clone(),
        }
        .into())
    }
}

/// What known_hosts says about a presented key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KnownHost {
    Match,
    Missing,
    Changed { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accept,
    /// Accept and append the key to known_hosts.
    Learn,
    Reject,
}

/// The host key policy table.
fn verdict(verification: HostKeyVerification, known: KnownHost) -> Verdict {
    use HostKeyVerification::{AcceptNew, Disabled, Strict};

    match (verification, known) {
        (Disabled, _) => Verdict::Accept,
        (Strict | AcceptNew, KnownHost::Match) => Verdict::Accept,
        (AcceptNew, KnownHost::Missing) => Verdict::Learn,
        (Strict, KnownHost::Missing) => Verdict::Reject,
        (Strict | AcceptNew, KnownHost::Changed { .. }) => Verdict::Reject,
    }
}

/// Where the policy leaves the reason for a refusal, for `connect` to
/// report instead of russh's generic error.
#[derive(Clone, Default)]
struct RefusalSlot(Arc<Mutex<Option<TransportError>>>);

impl RefusalSlot {
    fn put(&self, error: TransportError) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(error);
        }
    }

    fn take(&self) -> Option<TransportError> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// russh client handler applying [`HostKeyVerification`].
struct KeyPolicy {
    host: String,
    port: u16,
    verification: HostKeyVerification,
    known_hosts: Option<PathBuf>,
    refused: RefusalSlot,
}

impl KeyPolicy {
    fn lookup(&self, key: &PublicKey) -> std::result::Result<KnownHost, TransportError> {
        let found = match &self.known_hosts {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };
        match found {
            Ok(true) => Ok(KnownHost::Match),
            Ok(false) => Ok(KnownHost::Missing),
            Err(russh::keys::Error::KeyChanged { line }) => Ok(KnownHost::Changed { line }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn(&self, key: &PublicKey) -> std::result::Result<(), russh::keys::Error> {
        use russh::keys::known_hosts::{learn_known_hosts, learn_known_hosts_path};

        match &self.known_hosts {
            Some(path) => learn_known_hosts_path(&self.host, self.port, key, path),
            None => learn_known_hosts(&self.host, self.port, key),
        }
    }

    fn refusal(&self, known: KnownHost) -> TransportError {
        match known {
            KnownHost::Changed { line } => TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            },
            KnownHost::Match | KnownHost::Missing => TransportError::HostKeyUnknown {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }

    /// Decide on `key`; `false` refuses the connection.
    fn admit(&self, key: &PublicKey) -> bool {
        if self.verification == HostKeyVerification::Disabled {
            return true;
        }

        let known = match self.lookup(key) {
            Ok(known) => known,
            Err(e) => {
                self.refused.put(e);
                return false;
            }
        };

        match verdict(self.verification, known) {
            Verdict::Accept => true,
            Verdict::Learn => {
                match self.learn(key) {
                    Ok(()) => info!("learned host key for {}:{}", self.host, self.port),
                    Err(e) => warn!("could not record host key for {}: {}", self.host, e),
                }
                true
            }
            Verdict::Reject => {
                self.refused.put(self.refusal(known));
                false
            }
        }
    }
}

impl client::Handler for KeyPolicy {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(self.admit(server_public_key))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const DEVICE_KEY: &str = "ssh-ed25519 \
        AAAAC3NzaC1lZDI1NTE5AAAAIAEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEB";
    const OTHER_KEY: &str = "ssh-ed25519 \
        AAAAC3NzaC1lZDI1NTE5AAAAIAICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgIC";

    fn key(openssh: &str) -> PublicKey {
        PublicKey::from_openssh(openssh).unwrap()
    }

    fn policy(verification: HostKeyVerification, known_hosts: PathBuf) -> KeyPolicy {
        KeyPolicy {
            host: "fw.example".to_string(),
            port: 2222,
            verification,
            known_hosts: Some(known_hosts),
            refused: RefusalSlot::default(),
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ftdshell-ssh-{}", std::process::id()));
        let path = dir.join(name);
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_verdict_table() {
        use HostKeyVerification::{AcceptNew, Disabled, Strict};

        let changed = KnownHost::Changed { line: 3 };
        let table = [
            (Strict, KnownHost::Match, Verdict::Accept),
            (Strict, KnownHost::Missing, Verdict::Reject),
            (Strict, changed, Verdict::Reject),
            (AcceptNew, KnownHost::Match, Verdict::Accept),
            (AcceptNew, KnownHost::Missing, Verdict::Learn),
            (AcceptNew, changed, Verdict::Reject),
            (Disabled, KnownHost::Match, Verdict::Accept),
            (Disabled, KnownHost::Missing, Verdict::Accept),
            (Disabled, changed, Verdict::Accept),
        ];
        for (verification, known, expected) in table {
            assert_eq!(
                verdict(verification, known),
                expected,
                "{verification:?} with {known:?}"
            );
        }
    }

    #[test]
    fn test_accept_new_learns_then_detects_change() {
        let path = scratch("accept_new");
        let checker = policy(HostKeyVerification::AcceptNew, path.clone());

        assert_eq!(checker.lookup(&key(DEVICE_KEY)).unwrap(), KnownHost::Missing);
        assert!(checker.admit(&key(DEVICE_KEY)));
        assert!(fs::read_to_string(&path).unwrap().contains("[fw.example]:2222 ssh-ed25519"));
        assert_eq!(checker.lookup(&key(DEVICE_KEY)).unwrap(), KnownHost::Match);

        assert!(!checker.admit(&key(OTHER_KEY)));
        assert!(matches!(
            checker.refused.take(),
            Some(TransportError::HostKeyChanged { port: 2222, .. })
        ));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_strict_refuses_unknown_host() {
        let path = scratch("strict");
        let checker = policy(HostKeyVerification::Strict, path.clone());

        assert!(!checker.admit(&key(DEVICE_KEY)));
        assert!(matches!(
            checker.refused.take(),
            Some(TransportError::HostKeyUnknown { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_disabled_skips_known_hosts() {
        let path = scratch("disabled");
        let checker = policy(HostKeyVerification::Disabled, path.clone());

        assert!(checker.admit(&key(DEVICE_KEY)));
        assert!(checker.refused.take().is_none());
        assert!(!path.exists());
    }
}
