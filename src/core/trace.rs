//! Protocol trace sink.
//!
//! The trace is the program's primary output: one logical line per protocol
//! record, written to stderr by default or to a file with `--logfile`. It is
//! deliberately separate from the `tracing` diagnostics stream so that trace
//! output stays machine-greppable.

use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::Path;

use parking_lot::Mutex;

enum Sink {
    Stderr(io::Stderr),
    File(LineWriter<File>),
    Capture(Vec<u8>),
}

/// Line-oriented sink for protocol trace records.
pub struct TraceLog {
    sink: Mutex<Sink>,
}

impl TraceLog {
    pub fn stderr() -> Self {
        Self {
            sink: Mutex::new(Sink::Stderr(io::stderr())),
        }
    }

    pub fn file(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            sink: Mutex::new(Sink::File(LineWriter::new(file))),
        })
    }

    /// In-memory sink, used by tests to assert on emitted records.
    pub fn capture() -> Self {
        Self {
            sink: Mutex::new(Sink::Capture(Vec::new())),
        }
    }

    /// Emits one record. Sink write failures are swallowed: a broken trace
    /// stream must not take the proxied connections down with it.
    pub fn line(&self, record: &str) {
        let mut sink = self.sink.lock();
        let _ = match &mut *sink {
            Sink::Stderr(out) => writeln!(out, "{record}"),
            Sink::File(out) => writeln!(out, "{record}"),
            Sink::Capture(buf) => writeln!(buf, "{record}"),
        };
    }

    /// Returns everything written so far to a capture sink.
    pub fn captured(&self) -> String {
        match &*self.sink.lock() {
            Sink::Capture(buf) => String::from_utf8_lossy(buf).into_owned(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_collects_lines() {
        let log = TraceLog::capture();
        log.line("C0:12B:<: first");
        log.line("C0:40B:>: second");
        let text = log.captured();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }

    #[test]
    fn test_file_sink_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");
        let log = TraceLog::file(&path).unwrap();
        log.line("hello");
        drop(log);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "hello\n");
    }
}
