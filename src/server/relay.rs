//! Per-connection relay loop.
//!
//! One task owns both sockets of a proxied connection and its
//! [`Connection`] record. Each iteration decodes whatever is buffered,
//! applies the half-close drain rules, computes per-socket interest from
//! buffer state (readable while the buffer is drained or its framed
//! message is still incomplete, writable only when released bytes are
//! pending), and waits for readiness. All socket operations are
//! non-blocking; `WouldBlock` means "no progress, loop".

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncWriteExt, Interest};
use tracing::debug;

use crate::core::trace::TraceLog;
use crate::proto::decoder::Decoder;

use super::connection::Connection;
use super::stream::Stream;

pub async fn run_connection(
    mut conn: Connection,
    mut client: Stream,
    mut server: Stream,
    decoder: Arc<Decoder>,
    log: Arc<TraceLog>,
    readwritedebug: bool,
) {
    let id = conn.id;
    debug!("connection {id} from {} opened", conn.client_desc);

    let mut client_eof = false;
    let mut server_eof = false;
    let mut client_shut = false;
    let mut server_shut = false;

    loop {
        if let Err(e) = decoder.decode_client_bytes(&mut conn, &log) {
            log.line(&format!("C{id}: malformed message from client: {e}"));
            break;
        }
        if let Err(e) = decoder.decode_server_bytes(&mut conn, &log) {
            log.line(&format!("C{id}: malformed message from server: {e}"));
            break;
        }

        // a dead read side closes the opposite write side once everything
        // released has been flushed; unparsed leftovers can never complete
        if client_eof && !server_shut && !conn.client_buffer.has_released() {
            let discarded = conn.client_buffer.discard_unparsed();
            if discarded > 0 {
                log.line(&format!(
                    "C{id}: discarded {discarded} bytes sent from client to server"
                ));
            }
            let _ = server.shutdown().await;
            server_shut = true;
        }
        if server_eof && !client_shut && !conn.server_buffer.has_released() {
            let discarded = conn.server_buffer.discard_unparsed();
            if discarded > 0 {
                log.line(&format!(
                    "C{id}: discarded {discarded} bytes sent from server to client"
                ));
            }
            let _ = client.shutdown().await;
            client_shut = true;
        }
        if client_shut && server_shut {
            break;
        }

        let mut client_interest: Option<Interest> = None;
        if !client_eof && !server_shut && conn.client_buffer.wants_read() {
            client_interest = Some(Interest::READABLE);
        }
        if !client_shut && conn.server_buffer.has_released() {
            client_interest =
                Some(client_interest.map_or(Interest::WRITABLE, |i| i | Interest::WRITABLE));
        }

        let mut server_interest: Option<Interest> = None;
        if !server_eof && !client_shut && conn.server_buffer.wants_read() {
            server_interest = Some(Interest::READABLE);
        }
        if !server_shut && conn.client_buffer.has_released() {
            server_interest =
                Some(server_interest.map_or(Interest::WRITABLE, |i| i | Interest::WRITABLE));
        }

        if client_interest.is_none() && server_interest.is_none() {
            break;
        }

        tokio::select! {
            res = client.ready(client_interest.unwrap_or(Interest::READABLE)),
                if client_interest.is_some() =>
            {
                match res {
                    Ok(ready) => {
                        if ready.is_readable() && !client_eof && conn.client_buffer.wants_read() {
                            match conn.client_buffer.read_from(&client) {
                                Ok(0) => {
                                    client_eof = true;
                                    log.line(&format!("C{id}: EOF from client"));
                                }
                                Ok(n) => {
                                    if readwritedebug {
                                        log.line(&format!("C{id}: read {n} bytes from client"));
                                    }
                                }
                                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                                Err(e) => {
                                    log.line(&format!("C{id}: read error from client: {e}"));
                                    client_eof = true;
                                    client_shut = true;
                                }
                            }
                        }
                        if ready.is_writable() && !client_shut && conn.server_buffer.has_released() {
                            match conn.server_buffer.write_to(&client) {
                                Ok(n) => {
                                    if readwritedebug && n > 0 {
                                        log.line(&format!("C{id}: wrote {n} bytes to client"));
                                    }
                                }
                                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                                Err(e) => {
                                    log.line(&format!("C{id}: write error to client: {e}"));
                                    client_eof = true;
                                    client_shut = true;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        log.line(&format!("C{id}: poll error on client socket: {e}"));
                        break;
                    }
                }
            }
            res = server.ready(server_interest.unwrap_or(Interest::READABLE)),
                if server_interest.is_some() =>
            {
                match res {
                    Ok(ready) => {
                        if ready.is_readable() && !server_eof && conn.server_buffer.wants_read() {
                            match conn.server_buffer.read_from(&server) {
                                Ok(0) => {
                                    server_eof = true;
                                    log.line(&format!("C{id}: EOF from server"));
                                }
                                Ok(n) => {
                                    if readwritedebug {
                                        log.line(&format!("C{id}: read {n} bytes from server"));
                                    }
                                }
                                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                                Err(e) => {
                                    log.line(&format!("C{id}: read error from server: {e}"));
                                    server_eof = true;
                                    server_shut = true;
                                }
                            }
                        }
                        if ready.is_writable() && !server_shut && conn.client_buffer.has_released() {
                            match conn.client_buffer.write_to(&server) {
                                Ok(n) => {
                                    if readwritedebug && n > 0 {
                                        log.line(&format!("C{id}: wrote {n} bytes to server"));
                                    }
                                }
                                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                                Err(e) => {
                                    log.line(&format!("C{id}: write error to server: {e}"));
                                    server_eof = true;
                                    server_shut = true;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        log.line(&format!("C{id}: poll error on server socket: {e}"));
                        break;
                    }
                }
            }
        }
    }

    log.line(&format!("C{id}: connection closed"));
    debug!("connection {id} closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::atoms::AtomTable;
    use crate::proto::fmt::FmtOptions;
    use crate::proto::endianness::ByteOrder;
    use crate::proto::setup::{test_acceptance_frame, test_initiation_frame};
    use tokio::io::AsyncReadExt;
    use tokio::net::UnixStream;

    fn spawn_relay(
        client_remote: UnixStream,
        server_local: UnixStream,
        log: Arc<TraceLog>,
    ) -> tokio::task::JoinHandle<()> {
        let decoder = Arc::new(Decoder::new(
            FmtOptions::default(),
            Arc::new(AtomTable::new()),
            None,
            false,
        ));
        let conn = Connection::new(0, "unknown(local)");
        tokio::spawn(run_connection(
            conn,
            Stream::Unix(client_remote),
            Stream::Unix(server_local),
            decoder,
            log,
            false,
        ))
    }

    async fn read_exact(stream: &mut UnixStream, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        stream.read_exact(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_forwarding_is_byte_identical() {
        let (mut client, client_remote) = UnixStream::pair().unwrap();
        let (server_local, mut server) = UnixStream::pair().unwrap();
        let log = Arc::new(TraceLog::capture());
        let relay = spawn_relay(client_remote, server_local, log.clone());

        // handshake crosses the proxy unmodified in both directions
        let initiation = test_initiation_frame(b'l');
        client.write_all(&initiation).await.unwrap();
        assert_eq!(read_exact(&mut server, 12).await, initiation);

        let acceptance = test_acceptance_frame(ByteOrder::LittleEndian);
        server.write_all(&acceptance).await.unwrap();
        assert_eq!(read_exact(&mut client, 112).await, acceptance);

        // a parsed request is forwarded verbatim
        let mut request = vec![16u8, 0];
        request.extend_from_slice(&4u16.to_le_bytes());
        request.extend_from_slice(&8u16.to_le_bytes());
        request.extend_from_slice(&[0, 0]);
        request.extend_from_slice(b"WM_CLASS");
        client.write_all(&request).await.unwrap();
        assert_eq!(read_exact(&mut server, 16).await, request);

        drop(client);
        drop(server);
        relay.await.unwrap();
        let text = log.captured();
        assert!(text.contains("Request InternAtom(16)"));
        assert!(text.contains("connection closed"));
    }

    #[tokio::test]
    async fn test_half_close_discards_partial_request() {
        let (mut client, client_remote) = UnixStream::pair().unwrap();
        let (server_local, mut server) = UnixStream::pair().unwrap();
        let log = Arc::new(TraceLog::capture());
        let relay = spawn_relay(client_remote, server_local, log.clone());

        client.write_all(&test_initiation_frame(b'l')).await.unwrap();
        read_exact(&mut server, 12).await;
        server
            .write_all(&test_acceptance_frame(ByteOrder::LittleEndian))
            .await
            .unwrap();
        read_exact(&mut client, 112).await;

        // 64 bytes of a request framed as 128 bytes, then client close
        let mut partial = vec![127u8, 0]; // NoOperation
        partial.extend_from_slice(&32u16.to_le_bytes());
        partial.resize(64, 0xaa);
        client.write_all(&partial).await.unwrap();
        client.shutdown().await.unwrap();

        // the server side sees EOF but stays open for its own direction
        let mut probe = [0u8; 1];
        assert_eq!(server.read(&mut probe).await.unwrap(), 0);
        drop(server);
        relay.await.unwrap();

        let text = log.captured();
        assert!(
            text.contains("discarded 64 bytes sent from client to server"),
            "{text}"
        );
        assert!(text.contains("EOF from client"));
        assert!(text.contains("connection closed"));
    }

    #[tokio::test]
    async fn test_malformed_request_closes_connection() {
        let (mut client, client_remote) = UnixStream::pair().unwrap();
        let (server_local, _server) = UnixStream::pair().unwrap();
        let log = Arc::new(TraceLog::capture());
        let relay = spawn_relay(client_remote, server_local, log.clone());

        // an initiation with a bogus byte-order octet
        client.write_all(&[0xde; 12]).await.unwrap();
        relay.await.unwrap();
        let text = log.captured();
        assert!(text.contains("malformed message from client"), "{text}");
    }
}
