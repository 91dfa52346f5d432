//! The connection multiplexer: listener, accept loop, per-connection relay
//! tasks, optional child subcommand, and shutdown.

pub mod bootstrap;
pub mod buffer;
pub mod connection;
pub mod relay;
pub mod stream;

use std::process::ExitStatus;
use std::sync::Arc;

use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::args::Settings;
use crate::core::auth;
use crate::core::display::DisplayInfo;
use crate::core::trace::TraceLog;
use crate::proto::atoms::AtomTable;
use crate::proto::decoder::Decoder;
use crate::proto::fmt::FmtOptions;
use crate::{Error, Result};

use bootstrap::BootstrapAuth;
use connection::Connection;
use stream::{Listener, Stream};

/// Added to signal numbers to disambiguate signal termination from other
/// exit codes.
pub const SIGNAL_RETVAL_OFFSET: u8 = 128;

/// Represents the proxy server: it accepts clients on the in display,
/// relays them to the real X server on the out display, and logs every
/// message in between.
pub struct ProxyServer {
    settings: Settings,
    in_display: DisplayInfo,
    out_display: DisplayInfo,
}

impl ProxyServer {
    /// Resolves both display names. Fatal setup errors surface here.
    pub fn new(settings: Settings) -> Result<Self> {
        let in_display = DisplayInfo::parse(&settings.in_displayname)?;
        let out_display = DisplayInfo::parse(&settings.out_displayname)?;
        Ok(Self {
            settings,
            in_display,
            out_display,
        })
    }

    /// Begin operation. Returns the process exit code: 0 by default, the
    /// child's exit status when a subcommand was used without
    /// `--waitforclient`, or 128+N on termination by signal N.
    pub async fn run(self) -> Result<u8> {
        let trace = Arc::new(match &self.settings.logfile {
            Some(path) => TraceLog::file(path).map_err(|e| {
                Error::Setup(format!("cannot open log file {}: {e}", path.display()))
            })?,
            None => TraceLog::stderr(),
        });

        let cookie = if self.settings.copyauth {
            Some(auth::copy_authentication(&self.in_display, &self.out_display)?)
        } else {
            auth::lookup_cookie(&self.out_display)
        };
        let bootstrap_auth = BootstrapAuth::from_cookie(cookie.as_ref());

        let atoms = Arc::new(AtomTable::new());
        let time_ref = if self.settings.systemtimeformat {
            bootstrap::fetch_server_time(&self.out_display, &bootstrap_auth).await
        } else {
            None
        };
        if self.settings.prefetchatoms {
            bootstrap::prefetch_atoms(&self.out_display, &bootstrap_auth, &atoms).await;
        }

        let decoder = Arc::new(Decoder::new(
            FmtOptions {
                verbose: self.settings.verbose,
                multiline: self.settings.multiline,
                max_list_length: self.settings.maxlistlength,
            },
            atoms,
            time_ref,
            self.settings.denyallextensions,
        ));

        let listener = Listener::bind(&self.in_display).await?;
        info!(
            "proxying display {} to {}",
            self.in_display.name, self.out_display.name
        );

        let mut child = self.spawn_subcommand()?;
        let child_used = child.is_some();

        self.accept_loop(listener, &mut child, child_used, decoder, trace)
            .await
    }

    /// Launches the CLI subcommand, with `DISPLAY` pointing at the proxy.
    fn spawn_subcommand(&self) -> Result<Option<Child>> {
        if self.settings.subcmd.is_empty() {
            return Ok(None);
        }
        let child = Command::new(&self.settings.subcmd[0])
            .args(&self.settings.subcmd[1..])
            .env("DISPLAY", &self.in_display.name)
            .spawn()
            .map_err(|e| {
                Error::Setup(format!(
                    "cannot launch subcommand {}: {e}",
                    self.settings.subcmd[0]
                ))
            })?;
        info!("launched subcommand {:?}", self.settings.subcmd);
        Ok(Some(child))
    }

    async fn accept_loop(
        &self,
        listener: Listener,
        child: &mut Option<Child>,
        child_used: bool,
        decoder: Arc<Decoder>,
        trace: Arc<TraceLog>,
    ) -> Result<u8> {
        let (closed_tx, mut closed_rx) = mpsc::unbounded_channel::<u32>();
        let shutdown = CancellationToken::new();
        let mut sigint = signal(SignalKind::interrupt()).map_err(Error::Io)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(Error::Io)?;

        let mut next_id: u32 = 0;
        let mut active: usize = 0;
        let mut had_connections = false;
        let mut child_status: Option<u8> = None;

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok(client) => {
                            let id = next_id;
                            next_id += 1;
                            active += 1;
                            had_connections = true;
                            self.open_connection(
                                id,
                                client,
                                decoder.clone(),
                                trace.clone(),
                                closed_tx.clone(),
                                shutdown.clone(),
                            );
                        }
                        Err(e) => error!("accept failed: {e}"),
                    }
                }
                Some(id) = closed_rx.recv() => {
                    active = active.saturating_sub(1);
                    info!("connection {id} finished, {active} remaining");
                }
                status = wait_child(child) => {
                    let code = exit_code(status);
                    info!("subcommand exited with status {code}");
                    *child = None;
                    child_status = Some(code);
                    if active == 0 && !self.settings.waitforclient {
                        shutdown.cancel();
                        return Ok(code);
                    }
                }
                _ = sigint.recv() => {
                    warn!("interrupted");
                    shutdown.cancel();
                    listener.unlink();
                    return Ok(SIGNAL_RETVAL_OFFSET + 2);
                }
                _ = sigterm.recv() => {
                    warn!("terminated");
                    shutdown.cancel();
                    listener.unlink();
                    return Ok(SIGNAL_RETVAL_OFFSET + 15);
                }
            }

            // the loop ends once the last connection closes, provided any
            // child has already been reaped
            if active == 0
                && had_connections
                && self.settings.stopifnoactiveconnx
                && child.is_none()
            {
                shutdown.cancel();
                let code = if child_used && !self.settings.waitforclient {
                    child_status.unwrap_or(0)
                } else {
                    0
                };
                return Ok(code);
            }
        }
    }

    /// Connects to the real server on behalf of an accepted client and
    /// spawns the relay task.
    fn open_connection(
        &self,
        id: u32,
        client: Stream,
        decoder: Arc<Decoder>,
        trace: Arc<TraceLog>,
        closed_tx: mpsc::UnboundedSender<u32>,
        shutdown: CancellationToken,
    ) {
        let out_display = self.out_display.clone();
        let readwritedebug = self.settings.readwritedebug;
        tokio::spawn(async move {
            let client_desc = client.peer_desc();
            info!("connection {id} accepted from {client_desc}");
            match Stream::connect(&out_display).await {
                Ok(server) => {
                    let conn = Connection::new(id, client_desc);
                    tokio::select! {
                        _ = relay::run_connection(
                            conn, client, server, decoder, trace.clone(), readwritedebug,
                        ) => {}
                        _ = shutdown.cancelled() => {
                            trace.line(&format!("C{id}: shut down"));
                        }
                    }
                }
                Err(e) => {
                    error!("connection {id}: cannot reach X server: {e}");
                    trace.line(&format!("C{id}: failed to connect to X server: {e}"));
                }
            }
            let _ = closed_tx.send(id);
        });
    }
}

/// Resolves once the child exits; pends forever when no child is running,
/// so the select arm simply never fires.
async fn wait_child(child: &mut Option<Child>) -> std::io::Result<ExitStatus> {
    match child {
        Some(child) => child.wait().await,
        None => std::future::pending().await,
    }
}

/// Child exit status to process exit code: the status itself, or 128+N
/// for termination by signal N.
fn exit_code(status: std::io::Result<ExitStatus>) -> u8 {
    use std::os::unix::process::ExitStatusExt;
    match status {
        Ok(status) => {
            if let Some(code) = status.code() {
                code as u8
            } else if let Some(sig) = status.signal() {
                SIGNAL_RETVAL_OFFSET.wrapping_add(sig as u8)
            } else {
                1
            }
        }
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::args::Settings;

    fn settings(in_name: &str, out_name: &str) -> Settings {
        Settings::resolve_from([
            "rxtrace",
            "--proxydisplay",
            in_name,
            "--display",
            out_name,
        ])
        .unwrap()
    }

    #[test]
    fn test_new_resolves_displays() {
        let server = ProxyServer::new(settings(":9", ":0")).unwrap();
        assert_eq!(server.in_display.display, 9);
        assert_eq!(server.out_display.display, 0);
    }

    #[test]
    fn test_new_rejects_bad_display() {
        assert!(ProxyServer::new(settings("bogus/host:1", ":0")).is_err());
    }

    #[tokio::test]
    async fn test_exit_code_of_child() {
        let status = Command::new("true").status().await;
        assert_eq!(exit_code(status), 0);
        let status = Command::new("false").status().await;
        assert_eq!(exit_code(status), 1);
    }

    #[tokio::test]
    async fn test_wait_child_pends_without_child() {
        let mut none: Option<Child> = None;
        let wait = wait_child(&mut none);
        let raced = tokio::time::timeout(std::time::Duration::from_millis(20), wait).await;
        assert!(raced.is_err());
    }
}
