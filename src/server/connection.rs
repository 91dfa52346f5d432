//! Per-client connection records.

use std::collections::{HashMap, VecDeque};

use crate::proto::endianness::ByteOrder;

use super::buffer::SocketBuffer;

/// Decoder state of a connection; governs which decoder entrypoint runs on
/// the next arriving bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Waiting for the client's initiation.
    AwaitingInitiation,
    /// Initiation forwarded; waiting for the server's response.
    AwaitingResponse,
    /// Server requested further authentication.
    Authentication,
    /// Handshake accepted; normal request/reply/event/error traffic.
    Open,
    /// Server refused the connection.
    Failed,
}

/// Upper bound on remembered request opcodes (the in-flight window).
const PENDING_REQUEST_CAP: usize = 1024;

/// Maps recent sequence numbers to their request opcode so replies and
/// errors can be attributed. Entries are retained (not popped on first
/// reply: ListFontsWithInfo answers a single request many times) and
/// evicted oldest-first at the cap.
struct PendingRequests {
    opcodes: HashMap<u16, u8>,
    order: VecDeque<u16>,
}

impl PendingRequests {
    fn new() -> Self {
        Self {
            opcodes: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn insert(&mut self, sequence: u16, opcode: u8) {
        if self.opcodes.insert(sequence, opcode).is_none() {
            self.order.push_back(sequence);
            if self.order.len() > PENDING_REQUEST_CAP {
                if let Some(evicted) = self.order.pop_front() {
                    self.opcodes.remove(&evicted);
                }
            }
        }
    }

    fn get(&self, sequence: u16) -> Option<u8> {
        self.opcodes.get(&sequence).copied()
    }
}

/// One proxied client: the pair of per-direction buffers plus the decode
/// state shared by both directions.
pub struct Connection {
    pub id: u32,
    pub client_desc: String,
    /// Bytes read from the client, destined for the server.
    pub client_buffer: SocketBuffer,
    /// Bytes read from the server, destined for the client.
    pub server_buffer: SocketBuffer,
    /// Client byte order; meaningful once the initiation has been parsed.
    pub byte_order: ByteOrder,
    pub status: Status,
    /// Last request sequence number assigned (the server's view).
    pub sequence: u16,
    pending: PendingRequests,
    intern_stash: HashMap<u16, String>,
}

impl Connection {
    pub fn new(id: u32, client_desc: impl Into<String>) -> Self {
        Self {
            id,
            client_desc: client_desc.into(),
            client_buffer: SocketBuffer::new(),
            server_buffer: SocketBuffer::new(),
            byte_order: ByteOrder::host(),
            status: Status::AwaitingInitiation,
            sequence: 0,
            pending: PendingRequests::new(),
            intern_stash: HashMap::new(),
        }
    }

    /// Assigns the next sequence number to a request and remembers its
    /// opcode. Wraps at 2^16, mirroring the server's numbering.
    pub fn register_request(&mut self, opcode: u8) -> u16 {
        self.sequence = self.sequence.wrapping_add(1);
        self.pending.insert(self.sequence, opcode);
        self.sequence
    }

    pub fn pending_opcode(&self, sequence: u16) -> Option<u8> {
        self.pending.get(sequence)
    }

    /// Handshake accepted: sequence numbering restarts (acceptance is 0).
    pub fn mark_open(&mut self) {
        self.status = Status::Open;
        self.sequence = 0;
    }

    pub fn stash_intern_atom(&mut self, sequence: u16, name: String) {
        self.intern_stash.insert(sequence, name);
    }

    pub fn take_intern_atom(&mut self, sequence: u16) -> Option<String> {
        self.intern_stash.remove(&sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbering() {
        let mut conn = Connection::new(0, "test");
        assert_eq!(conn.register_request(16), 1);
        assert_eq!(conn.register_request(17), 2);
        assert_eq!(conn.pending_opcode(1), Some(16));
        assert_eq!(conn.pending_opcode(2), Some(17));
        assert_eq!(conn.pending_opcode(3), None);
    }

    #[test]
    fn test_sequence_wraps() {
        let mut conn = Connection::new(0, "test");
        conn.sequence = u16::MAX;
        assert_eq!(conn.register_request(43), 0);
        assert_eq!(conn.register_request(43), 1);
    }

    #[test]
    fn test_mark_open_resets_sequence() {
        let mut conn = Connection::new(0, "test");
        conn.register_request(98);
        conn.mark_open();
        assert_eq!(conn.register_request(16), 1);
    }

    #[test]
    fn test_pending_window_eviction() {
        let mut conn = Connection::new(0, "test");
        for _ in 0..2000 {
            conn.register_request(43);
        }
        // the oldest entries fell out of the window
        assert_eq!(conn.pending_opcode(1), None);
        assert_eq!(conn.pending_opcode(2000), Some(43));
        assert_eq!(conn.pending_opcode(2000 - 1023), Some(43));
    }

    #[test]
    fn test_intern_stash() {
        let mut conn = Connection::new(0, "test");
        conn.stash_intern_atom(5, "TEST_ATOM".into());
        assert_eq!(conn.take_intern_atom(5).as_deref(), Some("TEST_ATOM"));
        assert_eq!(conn.take_intern_atom(5), None);
    }
}
