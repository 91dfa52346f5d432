//! Streaming decode of framed X11 messages.
//!
//! The two entrypoints consume zero or more complete messages from the
//! front of a connection's inbound buffers, keyed on the connection state:
//! the client side parses the initiation and then requests, the server
//! side parses the setup response and then replies, events and errors.
//! Bytes are released for forwarding only once their message has been
//! framed and logged; incomplete messages stay buffered with the framed
//! size recorded as the buffer's message marker.

use std::sync::Arc;

use crate::core::trace::TraceLog;
use crate::server::connection::{Connection, Status};

use super::atoms::AtomTable;
use super::endianness::Cursor;
use super::events::{self, EVENT_SIZE, SEND_EVENT_BIT};
use super::fmt::{self, Direction, FieldList, FmtOptions, TimeRef};
use super::replies::REPLY_HEADER_SIZE;
use super::requests::{self, Ctx};
use super::{align, errors, replies, setup, ParseError};

/// X11 message decoder shared by all connections.
pub struct Decoder {
    opts: FmtOptions,
    atoms: Arc<AtomTable>,
    time_ref: Option<TimeRef>,
    deny_all_extensions: bool,
}

impl Decoder {
    pub fn new(
        opts: FmtOptions,
        atoms: Arc<AtomTable>,
        time_ref: Option<TimeRef>,
        deny_all_extensions: bool,
    ) -> Self {
        Self {
            opts,
            atoms,
            time_ref,
            deny_all_extensions,
        }
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    fn ctx(&self) -> Ctx<'_> {
        Ctx {
            opts: &self.opts,
            atoms: &self.atoms,
            time_ref: self.time_ref,
        }
    }

    fn emit(
        &self,
        log: &TraceLog,
        id: u32,
        bytes: usize,
        dir: Direction,
        seq: Option<u16>,
        title: &str,
        body: &str,
    ) {
        let mut record = format!("C{id}:{bytes}B:{}:", dir.symbol());
        if let Some(seq) = seq {
            record.push_str(&format!("S{seq}:"));
        }
        record.push(' ');
        record.push_str(title);
        record.push_str(": ");
        record.push_str(body);
        log.line(&record);
    }

    /// Consumes complete messages from the client-to-server buffer.
    pub fn decode_client_bytes(
        &self,
        conn: &mut Connection,
        log: &TraceLog,
    ) -> Result<(), ParseError> {
        loop {
            match conn.status {
                Status::AwaitingInitiation => {
                    let Some(size) =
                        setup::framed_initiation_size(conn.client_buffer.unparsed())?
                    else {
                        return Ok(());
                    };
                    conn.client_buffer.set_message_size(size);
                    if conn.client_buffer.unparsed_len() < size {
                        return Ok(());
                    }
                    let init = setup::parse_initiation(&conn.client_buffer.unparsed()[..size])?;
                    conn.byte_order = init.byte_order;
                    let title = format!("client {} attempting connection", conn.client_desc);
                    self.emit(
                        log,
                        conn.id,
                        size,
                        Direction::ClientToServer,
                        None,
                        &title,
                        &init.fields.render(&self.opts, 0),
                    );
                    conn.status = Status::AwaitingResponse;
                    conn.client_buffer.release(size);
                }
                // requests cannot be attributed a sequence number until the
                // server has accepted; hold them buffered
                Status::AwaitingResponse => return Ok(()),
                Status::Authentication | Status::Failed => {
                    let n = conn.client_buffer.unparsed_len();
                    if n == 0 {
                        return Ok(());
                    }
                    log.line(&format!("C{}:{}B:<: (opaque: {n} bytes)", conn.id, n));
                    conn.client_buffer.release(n);
                }
                Status::Open => {
                    if !self.decode_request(conn, log)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Consumes complete messages from the server-to-client buffer.
    pub fn decode_server_bytes(
        &self,
        conn: &mut Connection,
        log: &TraceLog,
    ) -> Result<(), ParseError> {
        loop {
            match conn.status {
                // the server does not speak before the initiation
                Status::AwaitingInitiation => return Ok(()),
                Status::AwaitingResponse | Status::Authentication => {
                    let order = conn.byte_order;
                    let Some(size) =
                        setup::framed_response_size(conn.server_buffer.unparsed(), order)?
                    else {
                        return Ok(());
                    };
                    conn.server_buffer.set_message_size(size);
                    if conn.server_buffer.unparsed_len() < size {
                        return Ok(());
                    }
                    let response = setup::parse_response(
                        &conn.server_buffer.unparsed()[..size],
                        order,
                        &self.opts,
                    )?;
                    self.emit(
                        log,
                        conn.id,
                        size,
                        Direction::ServerToClient,
                        None,
                        response.title,
                        &response.fields.render(&self.opts, 0),
                    );
                    match response.status {
                        setup::SetupStatus::Success => conn.mark_open(),
                        setup::SetupStatus::Failed => conn.status = Status::Failed,
                        setup::SetupStatus::Authenticate => conn.status = Status::Authentication,
                    }
                    conn.server_buffer.release(size);
                }
                Status::Failed => {
                    let n = conn.server_buffer.unparsed_len();
                    if n == 0 {
                        return Ok(());
                    }
                    log.line(&format!("C{}:{}B:>: (opaque: {n} bytes)", conn.id, n));
                    conn.server_buffer.release(n);
                }
                Status::Open => {
                    if !self.decode_server_message(conn, log)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// One request from the client buffer. `Ok(false)` means more bytes
    /// are needed.
    fn decode_request(&self, conn: &mut Connection, log: &TraceLog) -> Result<bool, ParseError> {
        let order = conn.byte_order;
        let (opcode, detail, total, big_units) = {
            let buf = conn.client_buffer.unparsed();
            if buf.len() < 4 {
                return Ok(false);
            }
            let opcode = buf[0];
            let detail = buf[1];
            let units = Cursor::new(&buf[2..4], order).u16()? as usize;
            if units != 0 {
                (opcode, detail, align::unit_bytes(units), None)
            } else {
                // BIG-REQUESTS framing: true length follows as 32 bits
                if buf.len() < 8 {
                    (opcode, detail, 8, Some(None))
                } else {
                    let ext = Cursor::new(&buf[4..8], order).u32()? as usize;
                    (opcode, detail, align::unit_bytes(ext), Some(Some(ext)))
                }
            }
        };

        let Some(big) = big_units else {
            return self.decode_core_request(conn, log, opcode, detail, total);
        };
        // big request path
        let Some(ext_units) = big else {
            conn.client_buffer.set_message_size(8);
            return Ok(false);
        };
        if total < 8 {
            return Err(ParseError::InvalidFrameLength {
                kind: "big-request",
                length: total,
            });
        }
        conn.client_buffer.set_message_size(total);
        if conn.client_buffer.unparsed_len() < total {
            return Ok(false);
        }
        let seq = conn.register_request(opcode);
        let mut fields = FieldList::new();
        fields.push_verbose("opcode", opcode.to_string());
        fields.push("length-units", ext_units.to_string());
        fields.push("data", fmt::fmt_opaque(total - 8));
        let title = format!("BigRequest {}({opcode})", requests::name(opcode));
        self.emit(
            log,
            conn.id,
            total,
            Direction::ClientToServer,
            Some(seq),
            &title,
            &fields.render(&self.opts, 0),
        );
        conn.client_buffer.release(total);
        Ok(true)
    }

    fn decode_core_request(
        &self,
        conn: &mut Connection,
        log: &TraceLog,
        opcode: u8,
        detail: u8,
        total: usize,
    ) -> Result<bool, ParseError> {
        if total < 4 {
            return Err(ParseError::InvalidFrameLength {
                kind: "request",
                length: total,
            });
        }
        conn.client_buffer.set_message_size(total);
        if conn.client_buffer.unparsed_len() < total {
            return Ok(false);
        }
        let order = conn.byte_order;
        let seq = conn.register_request(opcode);

        let Some(info) = requests::lookup(opcode) else {
            // extension opcodes are forwarded but not decoded
            let mut fields = FieldList::new();
            fields.push("data", fmt::fmt_opaque(total - 4));
            self.emit(
                log,
                conn.id,
                total,
                Direction::ClientToServer,
                Some(seq),
                &format!("Request extension({opcode})"),
                &fields.render(&self.opts, 0),
            );
            conn.client_buffer.release(total);
            return Ok(true);
        };

        let (rendered, stash_name) = {
            let body = &conn.client_buffer.unparsed()[4..total];
            let mut c = Cursor::new(body, order);
            let mut fields = FieldList::new();
            fields.push_verbose("opcode", opcode.to_string());
            fields.push_verbose("request-length", align::aligned_units(total).to_string());
            fields.extend((info.parse)(&mut c, detail, &self.ctx())?);
            if !c.is_empty() {
                return Err(ParseError::LengthMismatch {
                    name: info.name,
                    framed: total,
                    decoded: 4 + c.offset(),
                });
            }
            let stash_name = if opcode == 16 {
                requests::intern_atom_name(body, order)
            } else {
                None
            };
            (fields.render(&self.opts, 0), stash_name)
        };
        if let Some(name) = stash_name {
            conn.stash_intern_atom(seq, name);
        }
        self.emit(
            log,
            conn.id,
            total,
            Direction::ClientToServer,
            Some(seq),
            &format!("Request {}({opcode})", info.name),
            &rendered,
        );
        conn.client_buffer.release(total);
        Ok(true)
    }

    /// One reply, event or error from the server buffer.
    fn decode_server_message(
        &self,
        conn: &mut Connection,
        log: &TraceLog,
    ) -> Result<bool, ParseError> {
        let first = {
            let buf = conn.server_buffer.unparsed();
            if buf.is_empty() {
                return Ok(false);
            }
            buf[0]
        };
        match first {
            0 => self.decode_error(conn, log),
            1 => self.decode_reply(conn, log),
            code if (2..=34).contains(&(code & !SEND_EVENT_BIT)) => {
                self.decode_event(conn, log)
            }
            other => Err(ParseError::UnknownServerMessage(other)),
        }
    }

    fn decode_error(&self, conn: &mut Connection, log: &TraceLog) -> Result<bool, ParseError> {
        conn.server_buffer.set_message_size(errors::ERROR_SIZE);
        if conn.server_buffer.unparsed_len() < errors::ERROR_SIZE {
            return Ok(false);
        }
        let order = conn.byte_order;
        let (rendered, code, seq) = {
            let frame = &conn.server_buffer.unparsed()[..errors::ERROR_SIZE];
            let code = frame[1];
            let seq = Cursor::new(&frame[2..4], order).u16()?;
            let mut c = Cursor::new(frame, order);
            c.skip(4)?;
            let fields = errors::parse(&mut c, code, &self.ctx())?;
            (fields.render(&self.opts, 0), code, seq)
        };
        self.emit(
            log,
            conn.id,
            errors::ERROR_SIZE,
            Direction::ServerToClient,
            Some(seq),
            &format!("Error {}({code})", errors::name(code)),
            &rendered,
        );
        conn.server_buffer.release(errors::ERROR_SIZE);
        Ok(true)
    }

    fn decode_event(&self, conn: &mut Connection, log: &TraceLog) -> Result<bool, ParseError> {
        conn.server_buffer.set_message_size(EVENT_SIZE);
        if conn.server_buffer.unparsed_len() < EVENT_SIZE {
            return Ok(false);
        }
        let order = conn.byte_order;
        let (rendered, name, code, seq) = {
            let frame = &conn.server_buffer.unparsed()[..EVENT_SIZE];
            let sent = frame[0] & SEND_EVENT_BIT != 0;
            let code = frame[0] & !SEND_EVENT_BIT;
            let Some(info) = events::lookup(code) else {
                return Err(ParseError::UnknownServerMessage(frame[0]));
            };
            let mut c = Cursor::new(frame, order);
            c.skip(1)?;
            let (detail, seq) = if info.has_sequence {
                let detail = c.u8()?;
                let seq = c.u16()?;
                (detail, Some(seq))
            } else {
                (0, None)
            };
            let mut fields = (info.parse)(&mut c, detail, &self.ctx())?;
            if !c.is_empty() {
                return Err(ParseError::LengthMismatch {
                    name: info.name,
                    framed: EVENT_SIZE,
                    decoded: c.offset(),
                });
            }
            if sent {
                fields.push("send-event", "True");
            }
            (fields.render(&self.opts, 0), info.name, code, seq)
        };
        self.emit(
            log,
            conn.id,
            EVENT_SIZE,
            Direction::ServerToClient,
            seq,
            &format!("Event {name}({code})"),
            &rendered,
        );
        conn.server_buffer.release(EVENT_SIZE);
        Ok(true)
    }

    fn decode_reply(&self, conn: &mut Connection, log: &TraceLog) -> Result<bool, ParseError> {
        let order = conn.byte_order;
        let total = {
            let buf = conn.server_buffer.unparsed();
            if buf.len() < 8 {
                return Ok(false);
            }
            let extra = Cursor::new(&buf[4..8], order).u32()? as usize;
            REPLY_HEADER_SIZE + align::unit_bytes(extra)
        };
        conn.server_buffer.set_message_size(total);
        if conn.server_buffer.unparsed_len() < total {
            return Ok(false);
        }

        let (detail, seq) = {
            let buf = conn.server_buffer.unparsed();
            (buf[1], Cursor::new(&buf[2..4], order).u16()?)
        };
        let opcode = conn.pending_opcode(seq);

        // InternAtom: enter the stashed name into the atom table before
        // rendering, so the reply record resolves it
        if opcode == Some(16) {
            let atom = Cursor::new(&conn.server_buffer.unparsed()[8..12], order).u32()?;
            if let Some(name) = conn.take_intern_atom(seq) {
                if atom != 0 {
                    self.atoms.insert(atom, name);
                }
            }
        }

        let parse = opcode.and_then(replies::lookup);
        let (title, rendered) = {
            let frame = &conn.server_buffer.unparsed()[..total];
            match (opcode, parse) {
                (Some(op), Some(parse)) => {
                    let mut c = Cursor::new(frame, order);
                    c.skip(8)?;
                    let mut fields = parse(&mut c, detail, &self.ctx())?;
                    if !c.is_empty() {
                        return Err(ParseError::LengthMismatch {
                            name: requests::name(op),
                            framed: total,
                            decoded: c.offset(),
                        });
                    }
                    if op == 98 && self.deny_all_extensions {
                        // report the extension absent regardless of the
                        // server's answer
                        fields = replies::denied_query_extension();
                    }
                    (
                        format!("Reply {}({op})", requests::name(op)),
                        fields.render(&self.opts, 0),
                    )
                }
                _ => {
                    // sequence did not resolve to a request with a known
                    // reply shape; log opaquely, never fatally
                    let mut fields = FieldList::new();
                    fields.push("data", fmt::fmt_opaque(total));
                    ("Reply unknown".to_string(), fields.render(&self.opts, 0))
                }
            }
        };
        self.emit(
            log,
            conn.id,
            total,
            Direction::ServerToClient,
            Some(seq),
            &title,
            &rendered,
        );
        conn.server_buffer.release(total);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::setup::{test_acceptance_frame, test_initiation_frame};

    fn decoder() -> Decoder {
        Decoder::new(FmtOptions::default(), Arc::new(AtomTable::new()), None, false)
    }

    fn open_connection(dec: &Decoder, log: &TraceLog, lsb: bool) -> Connection {
        let mut conn = Connection::new(0, "testclient");
        conn.client_buffer
            .load(&test_initiation_frame(if lsb { b'l' } else { b'B' }));
        dec.decode_client_bytes(&mut conn, log).unwrap();
        assert_eq!(conn.status, Status::AwaitingResponse);
        let order = if lsb {
            crate::proto::endianness::ByteOrder::LittleEndian
        } else {
            crate::proto::endianness::ByteOrder::BigEndian
        };
        conn.server_buffer.load(&test_acceptance_frame(order));
        dec.decode_server_bytes(&mut conn, log).unwrap();
        conn
    }

    fn intern_atom_request(seq_name: &str) -> Vec<u8> {
        let name = seq_name.as_bytes();
        let padded = crate::proto::align::pad(name.len());
        let mut req = vec![16u8, 1];
        req.extend_from_slice(&(((8 + padded) / 4) as u16).to_le_bytes());
        req.extend_from_slice(&(name.len() as u16).to_le_bytes());
        req.extend_from_slice(&[0, 0]);
        req.extend_from_slice(name);
        req.resize(8 + padded, 0);
        req
    }

    #[test]
    fn test_s1_handshake_lsb() {
        let dec = decoder();
        let log = TraceLog::capture();
        let conn = open_connection(&dec, &log, true);
        assert_eq!(conn.status, Status::Open);
        assert_eq!(conn.byte_order, crate::proto::endianness::ByteOrder::LittleEndian);
        let text = log.captured();
        let mut lines = text.lines();
        let initiation = lines.next().unwrap();
        assert!(initiation.starts_with("C0:12B:<: client testclient attempting connection:"));
        assert!(initiation.contains("byte-order=LSBFirst"));
        let response = lines.next().unwrap();
        assert!(response.starts_with("C0:112B:>: server accepted connection:"));
        assert!(response.contains("protocol-major-version=11"));
        assert!(response.contains("pixmap-formats=[]"));
        assert!(response.contains("roots=[ {"));
    }

    #[test]
    fn test_s2_intern_atom_round_trip() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);

        let req = intern_atom_request("TEST_ATOM");
        assert_eq!(req.len(), 20); // 8 fixed + pad(9) name
        conn.client_buffer.load(&req);
        dec.decode_client_bytes(&mut conn, &log).unwrap();
        let text = log.captured();
        let request_line = text.lines().last().unwrap();
        assert!(
            request_line.starts_with("C0:20B:<:S1: Request InternAtom(16):"),
            "{request_line}"
        );
        assert!(request_line.contains("only-if-exists=True"));
        assert!(request_line.contains("n=9"));
        assert!(request_line.contains("name=\"TEST_ATOM\""));

        // 32-byte reply carrying atom 137
        let mut reply = vec![0u8; 32];
        reply[0] = 1;
        reply[2..4].copy_from_slice(&1u16.to_le_bytes());
        reply[8..12].copy_from_slice(&137u32.to_le_bytes());
        conn.server_buffer.load(&reply);
        dec.decode_server_bytes(&mut conn, &log).unwrap();
        let text = log.captured();
        let reply_line = text.lines().last().unwrap();
        assert!(
            reply_line.starts_with("C0:32B:>:S1: Reply InternAtom(16):"),
            "{reply_line}"
        );
        assert!(reply_line.contains("atom=\"TEST_ATOM\"(137)"));
        assert_eq!(dec.atoms().name(137).as_deref(), Some("TEST_ATOM"));
    }

    #[test]
    fn test_s3_create_window_value_list() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);

        let mask: u32 = (1 << 6) | (1 << 11) | (1 << 14);
        let mut req = vec![1u8, 24]; // CreateWindow, depth 24
        req.extend_from_slice(&((32 + 12) as u16 / 4).to_le_bytes());
        req.extend_from_slice(&2u32.to_le_bytes()); // wid
        req.extend_from_slice(&1u32.to_le_bytes()); // parent
        req.extend_from_slice(&0i16.to_le_bytes());
        req.extend_from_slice(&0i16.to_le_bytes());
        req.extend_from_slice(&100u16.to_le_bytes());
        req.extend_from_slice(&100u16.to_le_bytes());
        req.extend_from_slice(&1u16.to_le_bytes());
        req.extend_from_slice(&1u16.to_le_bytes()); // InputOutput
        req.extend_from_slice(&0u32.to_le_bytes()); // CopyFromParent
        req.extend_from_slice(&mask.to_le_bytes());
        req.extend_from_slice(&0u32.to_le_bytes()); // backing-store NotUseful
        req.extend_from_slice(&0xffu32.to_le_bytes()); // event-mask
        req.extend_from_slice(&0u32.to_le_bytes()); // cursor None
        assert_eq!(req.len(), 44);
        conn.client_buffer.load(&req);
        dec.decode_client_bytes(&mut conn, &log).unwrap();
        let text = log.captured();
        let line = text.lines().last().unwrap();
        assert!(line.contains("Request CreateWindow(1)"), "{line}");
        assert!(line.contains(
            "value-list={ backing-store=NotUseful(0), event-mask=0x000000ff, cursor=None(0) }"
        ));
    }

    #[test]
    fn test_s4_atom_error() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);

        // GetAtomName(17) for atom 999
        let mut req = vec![17u8, 0];
        req.extend_from_slice(&2u16.to_le_bytes());
        req.extend_from_slice(&999u32.to_le_bytes());
        conn.client_buffer.load(&req);
        dec.decode_client_bytes(&mut conn, &log).unwrap();

        let mut error = vec![0u8; 32];
        error[0] = 0;
        error[1] = 5; // Atom
        error[2..4].copy_from_slice(&1u16.to_le_bytes());
        error[4..8].copy_from_slice(&999u32.to_le_bytes());
        error[10] = 17;
        conn.server_buffer.load(&error);
        dec.decode_server_bytes(&mut conn, &log).unwrap();
        let text = log.captured();
        let line = text.lines().last().unwrap();
        assert!(line.starts_with("C0:32B:>:S1: Error Atom(5):"), "{line}");
        assert!(line.contains("bad-value=999"));
        assert!(line.contains("major-opcode=17"));
    }

    #[test]
    fn test_s5_msb_client() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, false);
        assert_eq!(conn.byte_order, crate::proto::endianness::ByteOrder::BigEndian);
        let text = log.captured();
        assert!(text.contains("byte-order=MSBFirst"));
        assert!(text.contains("protocol-major-version=11"));

        // a GetAtomName for atom 4 in big-endian
        let mut req = vec![17u8, 0];
        req.extend_from_slice(&2u16.to_be_bytes());
        req.extend_from_slice(&4u32.to_be_bytes());
        conn.client_buffer.load(&req);
        dec.decode_client_bytes(&mut conn, &log).unwrap();
        let text = log.captured();
        let line = text.lines().last().unwrap();
        assert!(line.contains("Request GetAtomName(17)"), "{line}");
        assert!(line.contains("atom=\"ATOM\"(4)"), "{line}");
    }

    #[test]
    fn test_split_request_parses_once() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);
        let before = log.captured().lines().count();

        let req = intern_atom_request("TEST_ATOM");
        conn.client_buffer.load(&req[..7]);
        dec.decode_client_bytes(&mut conn, &log).unwrap();
        assert_eq!(log.captured().lines().count(), before);
        assert_eq!(conn.client_buffer.message_size(), Some(16));
        assert!(!conn.client_buffer.has_released());

        conn.client_buffer.load(&req[7..]);
        dec.decode_client_bytes(&mut conn, &log).unwrap();
        assert_eq!(log.captured().lines().count(), before + 1);
        assert_eq!(conn.client_buffer.released_len(), 16);
    }

    #[test]
    fn test_sequence_numbers_advance_without_gaps() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);
        for _ in 0..5 {
            // GetInputFocus: empty body
            conn.client_buffer.load(&[43u8, 0, 1, 0]);
        }
        dec.decode_client_bytes(&mut conn, &log).unwrap();
        let text = log.captured();
        let seqs: Vec<&str> = text
            .lines()
            .filter(|l| l.contains("GetInputFocus"))
            .map(|l| l.split(':').nth(3).unwrap())
            .collect();
        assert_eq!(seqs, vec!["S1", "S2", "S3", "S4", "S5"]);
    }

    #[test]
    fn test_unknown_sequence_reply_is_not_fatal() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);
        let mut reply = vec![0u8; 32];
        reply[0] = 1;
        reply[2..4].copy_from_slice(&77u16.to_le_bytes());
        conn.server_buffer.load(&reply);
        dec.decode_server_bytes(&mut conn, &log).unwrap();
        let text = log.captured();
        let line = text.lines().last().unwrap();
        assert!(line.contains("Reply unknown"), "{line}");
        assert!(line.contains("S77"));
    }

    #[test]
    fn test_extension_request_is_opaque() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);
        let mut req = vec![130u8, 0];
        req.extend_from_slice(&2u16.to_le_bytes());
        req.extend_from_slice(&[0; 4]);
        conn.client_buffer.load(&req);
        dec.decode_client_bytes(&mut conn, &log).unwrap();
        let text = log.captured();
        let line = text.lines().last().unwrap();
        assert!(line.contains("Request extension(130)"), "{line}");
        assert!(line.contains("(4 bytes)"));
        assert_eq!(conn.client_buffer.released_len(), 8);
    }

    #[test]
    fn test_deny_all_extensions_masks_query_extension_reply() {
        let dec = Decoder::new(
            FmtOptions::default(),
            Arc::new(AtomTable::new()),
            None,
            true,
        );
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);

        // QueryExtension("BIG-REQUESTS")
        let name = b"BIG-REQUESTS";
        let mut req = vec![98u8, 0];
        req.extend_from_slice(&5u16.to_le_bytes());
        req.extend_from_slice(&(name.len() as u16).to_le_bytes());
        req.extend_from_slice(&[0, 0]);
        req.extend_from_slice(name);
        assert_eq!(req.len(), 20);
        conn.client_buffer.load(&req);
        dec.decode_client_bytes(&mut conn, &log).unwrap();

        // the server says the extension is present at opcode 133
        let mut reply = vec![0u8; 32];
        reply[0] = 1;
        reply[2..4].copy_from_slice(&1u16.to_le_bytes());
        reply[8] = 1; // present
        reply[9] = 133;
        reply[10] = 90;
        reply[11] = 160;
        conn.server_buffer.load(&reply);
        dec.decode_server_bytes(&mut conn, &log).unwrap();

        let text = log.captured();
        let line = text.lines().last().unwrap();
        assert!(line.contains("Reply QueryExtension(98)"), "{line}");
        assert!(line.contains("present=False"), "{line}");
        assert!(line.contains("major-opcode=0"), "{line}");
        assert!(line.contains("first-event=0"), "{line}");
        assert!(line.contains("first-error=0"), "{line}");
        assert!(!line.contains("133"), "{line}");
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);
        // GetAtomName framed as 3 units but its body is 1 unit
        let mut req = vec![17u8, 0];
        req.extend_from_slice(&3u16.to_le_bytes());
        req.extend_from_slice(&4u32.to_le_bytes());
        req.extend_from_slice(&[0; 4]);
        conn.client_buffer.load(&req);
        let err = dec.decode_client_bytes(&mut conn, &log).unwrap_err();
        assert!(matches!(err, ParseError::LengthMismatch { .. }));
    }

    #[test]
    fn test_send_event_bit_is_masked() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = open_connection(&dec, &log, true);
        let mut event = vec![0u8; 32];
        event[0] = 19 | 0x80; // synthetic MapNotify
        event[2..4].copy_from_slice(&9u16.to_le_bytes());
        conn.server_buffer.load(&event);
        dec.decode_server_bytes(&mut conn, &log).unwrap();
        let text = log.captured();
        let line = text.lines().last().unwrap();
        assert!(line.contains("Event MapNotify(19)"), "{line}");
        assert!(line.contains("send-event=True"));
    }

    #[test]
    fn test_bad_initiation_octet_is_fatal() {
        let dec = decoder();
        let log = TraceLog::capture();
        let mut conn = Connection::new(0, "testclient");
        conn.client_buffer.load(&[0xff; 12]);
        let err = dec.decode_client_bytes(&mut conn, &log).unwrap_err();
        assert!(matches!(err, ParseError::InvalidByteOrder(0xff)));
    }
}
