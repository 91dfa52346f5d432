//! Pre-queue bootstrap clients.
//!
//! Before the main queue starts serving, the proxy may run short-lived
//! clients of its own against the real X server: one to capture a
//! TIMESTAMP/wall-clock reference pair for `--systemtimeformat`, one to
//! copy the server's interned-atom table for `--prefetchatoms`. Both run
//! synchronously with a 3 second timeout per step and abandon quietly on
//! failure.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};

use crate::core::auth::AuthEntry;
use crate::core::display::DisplayInfo;
use crate::proto::atoms::AtomTable;
use crate::proto::endianness::{ByteOrder, Cursor};
use crate::proto::fmt::TimeRef;
use crate::proto::{align, Atom};
use crate::{Error, Result};

use super::stream::Stream;

/// Timeout for each bootstrap poll/read/write step.
const STEP_TIMEOUT: Duration = Duration::from_secs(3);
/// Hard bound on the atom walk.
const MAX_PREFETCH_ATOMS: Atom = 8192;

/// Authorization material for the bootstrap handshakes.
#[derive(Debug, Clone, Default)]
pub struct BootstrapAuth {
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

impl BootstrapAuth {
    pub fn from_cookie(cookie: Option<&AuthEntry>) -> Self {
        match cookie {
            Some(entry) => Self {
                name: entry.name.clone(),
                data: entry.data.clone(),
            },
            None => Self::default(),
        }
    }
}

async fn write_all_timeout(stream: &mut Stream, bytes: &[u8]) -> Result<()> {
    tokio::time::timeout(STEP_TIMEOUT, stream.write_all(bytes))
        .await
        .map_err(|_| Error::Setup("bootstrap write timed out after 3 s".into()))?
        .map_err(Error::Io)
}

async fn read_exact_timeout(stream: &mut Stream, buf: &mut [u8]) -> Result<()> {
    tokio::time::timeout(STEP_TIMEOUT, stream.read_exact(buf))
        .await
        .map_err(|_| Error::Setup("bootstrap read timed out after 3 s".into()))?
        .map_err(Error::Io)?;
    Ok(())
}

fn initiation_bytes(auth: &BootstrapAuth) -> Vec<u8> {
    let octet = match ByteOrder::host() {
        ByteOrder::LittleEndian => ByteOrder::LSB_FIRST_OCTET,
        ByteOrder::BigEndian => ByteOrder::MSB_FIRST_OCTET,
    };
    let mut buf = Vec::with_capacity(12 + align::pad(auth.name.len()) + align::pad(auth.data.len()));
    buf.push(octet);
    buf.push(0);
    buf.extend_from_slice(&crate::proto::MAJOR_VERSION.to_ne_bytes());
    buf.extend_from_slice(&crate::proto::MINOR_VERSION.to_ne_bytes());
    buf.extend_from_slice(&(auth.name.len() as u16).to_ne_bytes());
    buf.extend_from_slice(&(auth.data.len() as u16).to_ne_bytes());
    buf.extend_from_slice(&[0, 0]);
    buf.extend_from_slice(&auth.name);
    buf.resize(12 + align::pad(auth.name.len()), 0);
    buf.extend_from_slice(&auth.data);
    buf.resize(
        12 + align::pad(auth.name.len()) + align::pad(auth.data.len()),
        0,
    );
    buf
}

struct ServerHandshake {
    root: u32,
}

/// Performs the handshake for a bootstrap client; returns the root window
/// of the first screen.
async fn handshake(stream: &mut Stream, auth: &BootstrapAuth) -> Result<ServerHandshake> {
    write_all_timeout(stream, &initiation_bytes(auth)).await?;

    let mut header = [0u8; 8];
    read_exact_timeout(stream, &mut header).await?;
    if header[0] != 1 {
        return Err(Error::Setup(format!(
            "X server did not accept the bootstrap connection (status {})",
            header[0]
        )));
    }
    let units = u16::from_ne_bytes([header[6], header[7]]) as usize;
    let mut body = vec![0u8; align::unit_bytes(units)];
    read_exact_timeout(stream, &mut body).await?;

    let mut c = Cursor::new(&body, ByteOrder::host());
    c.skip(16)?; // release, id base, id mask, motion buffer
    let vendor_len = c.u16()? as usize;
    c.skip(2)?; // maximum request length
    let roots = c.u8()?;
    let formats = c.u8()? as usize;
    c.skip(10)?; // byte orders, scanline format, keycode range, unused
    c.skip(align::pad(vendor_len))?;
    c.skip(formats * 8)?;
    if roots == 0 {
        return Err(Error::Setup("X server reported no screens".into()));
    }
    let root = c.u32()?;
    Ok(ServerHandshake { root })
}

/// Captures the `ref_TIMESTAMP`/`ref_unix_time` pair: subscribe to
/// PropertyChange on the root window, append zero bytes to WM_NAME, and
/// read the timestamp off the resulting PropertyNotify.
pub async fn fetch_server_time(display: &DisplayInfo, auth: &BootstrapAuth) -> Option<TimeRef> {
    let mut stream = match Stream::connect(display).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("cannot connect to X server for time reference: {e}");
            return None;
        }
    };
    match fetch_server_time_on(&mut stream, auth).await {
        Ok(time_ref) => {
            info!(
                "captured server time reference: {} at unix {}",
                time_ref.server_time, time_ref.unix_time
            );
            Some(time_ref)
        }
        Err(e) => {
            warn!("server time bootstrap abandoned: {e}");
            None
        }
    }
}

pub(crate) async fn fetch_server_time_on(
    stream: &mut Stream,
    auth: &BootstrapAuth,
) -> Result<TimeRef> {
    let hs = handshake(stream, auth).await?;

    // ChangeWindowAttributes(root) { event-mask = PropertyChange }
    let mut requests = Vec::new();
    requests.push(2u8);
    requests.push(0);
    requests.extend_from_slice(&4u16.to_ne_bytes());
    requests.extend_from_slice(&hs.root.to_ne_bytes());
    requests.extend_from_slice(&(1u32 << 11).to_ne_bytes());
    requests.extend_from_slice(&(1u32 << 22).to_ne_bytes());
    // ChangeProperty(root, WM_NAME, STRING, 8, Append) with no data
    requests.push(18u8);
    requests.push(2);
    requests.extend_from_slice(&6u16.to_ne_bytes());
    requests.extend_from_slice(&hs.root.to_ne_bytes());
    requests.extend_from_slice(&39u32.to_ne_bytes());
    requests.extend_from_slice(&31u32.to_ne_bytes());
    requests.push(8);
    requests.extend_from_slice(&[0, 0, 0]);
    requests.extend_from_slice(&0u32.to_ne_bytes());
    write_all_timeout(stream, &requests).await?;

    let mut event = [0u8; 32];
    read_exact_timeout(stream, &mut event).await?;
    if event[0] != 28 {
        return Err(Error::Setup(format!(
            "expected PropertyNotify, got first byte {}",
            event[0]
        )));
    }
    let server_time = u32::from_ne_bytes([event[12], event[13], event[14], event[15]]);
    Ok(TimeRef {
        server_time,
        unix_time: chrono::Utc::now().timestamp(),
    })
}

/// Copies the server's contiguous interned atoms 1..n into the shared
/// table, stopping at the first Atom error.
pub async fn prefetch_atoms(
    display: &DisplayInfo,
    auth: &BootstrapAuth,
    atoms: &AtomTable,
) -> usize {
    let mut stream = match Stream::connect(display).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("cannot connect to X server for atom prefetch: {e}");
            return 0;
        }
    };
    match prefetch_atoms_on(&mut stream, auth, atoms).await {
        Ok(count) => {
            info!("prefetched {count} interned atoms");
            count
        }
        Err(e) => {
            warn!("atom prefetch abandoned: {e}");
            0
        }
    }
}

pub(crate) async fn prefetch_atoms_on(
    stream: &mut Stream,
    auth: &BootstrapAuth,
    atoms: &AtomTable,
) -> Result<usize> {
    handshake(stream, auth).await?;
    let mut count = 0usize;
    for atom in 1..=MAX_PREFETCH_ATOMS {
        let mut request = Vec::with_capacity(8);
        request.push(17u8); // GetAtomName
        request.push(0);
        request.extend_from_slice(&2u16.to_ne_bytes());
        request.extend_from_slice(&atom.to_ne_bytes());
        write_all_timeout(stream, &request).await?;

        let mut head = [0u8; 32];
        read_exact_timeout(stream, &mut head).await?;
        match head[0] {
            // the first Atom error marks the end of the contiguous range
            0 => break,
            1 => {
                let extra = u32::from_ne_bytes([head[4], head[5], head[6], head[7]]) as usize;
                let mut rest = vec![0u8; align::unit_bytes(extra)];
                read_exact_timeout(stream, &mut rest).await?;
                let name_len = u16::from_ne_bytes([head[8], head[9]]) as usize;
                if name_len > rest.len() {
                    return Err(Error::Setup("GetAtomName reply shorter than its name".into()));
                }
                atoms.insert(atom, String::from_utf8_lossy(&rest[..name_len]).into_owned());
                count += 1;
            }
            other => {
                return Err(Error::Setup(format!(
                    "unexpected message (first byte {other}) during atom prefetch"
                )));
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
#[cfg(target_endian = "little")]
mod tests {
    use super::*;
    use crate::proto::setup::test_acceptance_frame;
    use crate::proto::endianness::ByteOrder;
    use tokio::net::UnixStream;

    async fn fake_handshake(server: &mut UnixStream, auth_len: usize) {
        let mut initiation = vec![0u8; 12 + align::pad(auth_len)];
        server.read_exact(&mut initiation).await.unwrap();
        assert_eq!(initiation[0], b'l');
        server
            .write_all(&test_acceptance_frame(ByteOrder::host()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_server_time() {
        let (local, mut remote) = UnixStream::pair().unwrap();
        let auth = BootstrapAuth::default();

        let server = tokio::spawn(async move {
            fake_handshake(&mut remote, 0).await;
            let mut requests = vec![0u8; 16 + 24];
            remote.read_exact(&mut requests).await.unwrap();
            assert_eq!(requests[0], 2); // ChangeWindowAttributes
            assert_eq!(requests[16], 18); // ChangeProperty
            let mut event = vec![0u8; 32];
            event[0] = 28; // PropertyNotify
            event[2..4].copy_from_slice(&2u16.to_le_bytes());
            event[4..8].copy_from_slice(&0x25u32.to_le_bytes());
            event[8..12].copy_from_slice(&39u32.to_le_bytes());
            event[12..16].copy_from_slice(&987654u32.to_le_bytes());
            remote.write_all(&event).await.unwrap();
        });

        let mut stream = Stream::Unix(local);
        let time_ref = fetch_server_time_on(&mut stream, &auth).await.unwrap();
        assert_eq!(time_ref.server_time, 987654);
        assert!(time_ref.unix_time > 0);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_prefetch_atoms_stops_at_error() {
        let (local, mut remote) = UnixStream::pair().unwrap();
        let auth = BootstrapAuth::default();
        let atoms = AtomTable::new();

        let server = tokio::spawn(async move {
            fake_handshake(&mut remote, 0).await;
            let names = ["FIRST", "SECOND"];
            for (i, name) in names.iter().enumerate() {
                let mut request = vec![0u8; 8];
                remote.read_exact(&mut request).await.unwrap();
                assert_eq!(request[0], 17);
                let atom = u32::from_le_bytes(request[4..8].try_into().unwrap());
                assert_eq!(atom as usize, i + 1);

                let padded = align::pad(name.len());
                let mut reply = vec![0u8; 32 + padded];
                reply[0] = 1;
                reply[4..8].copy_from_slice(&((padded / 4) as u32).to_le_bytes());
                reply[8..10].copy_from_slice(&(name.len() as u16).to_le_bytes());
                reply[32..32 + name.len()].copy_from_slice(name.as_bytes());
                remote.write_all(&reply).await.unwrap();
            }
            // third asks for atom 3: answer with an Atom error
            let mut request = vec![0u8; 8];
            remote.read_exact(&mut request).await.unwrap();
            let mut error = vec![0u8; 32];
            error[0] = 0;
            error[1] = 5;
            remote.write_all(&error).await.unwrap();
        });

        let mut stream = Stream::Unix(local);
        let count = prefetch_atoms_on(&mut stream, &auth, &atoms).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(atoms.name(1).as_deref(), Some("FIRST"));
        assert_eq!(atoms.name(2).as_deref(), Some("SECOND"));
        server.await.unwrap();
    }
}
