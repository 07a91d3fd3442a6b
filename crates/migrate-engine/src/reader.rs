//! Streaming record reader
//!
//! Turns a byte stream into a lazy sequence of JSON objects. Two layouts are
//! accepted without prior declaration:
//!
//! - a single top-level array of objects (`[{...}, {...}]`), iterated element
//!   by element without materializing the array
//! - consecutive top-level objects with no enclosing array (NDJSON or
//!   concatenated JSON)
//!
//! The first significant byte decides the layout. The decoder only frames
//! values (bracket depth, string and escape state); each framed value is then
//! parsed by `serde_json`, so every syntax error is reported with the byte
//! offset of the offending value and aborts the read. There is no
//! resynchronization after an error.

use bytes::{Buf, BytesMut};
use migrate_common::{MigrateError, Result};
use serde_json::Value;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads legacy records from any async byte source
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonStreamReader;

impl JsonStreamReader {
    pub fn new() -> Self {
        Self
    }

    /// Forward-only stream of object records. Not restartable: it consumes `input`.
    pub fn read<R: AsyncRead>(&self, input: R) -> FramedRead<R, JsonRecordDecoder> {
        FramedRead::new(input, JsonRecordDecoder::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Layout {
    #[default]
    Detect,
    Array,
    Sequence,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Container,
    String,
    Scalar,
}

/// Framing state of the value currently being buffered
#[derive(Debug, Clone, Copy)]
struct Scan {
    kind: ValueKind,
    pos: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Scan {
    fn start(first: u8) -> Option<Self> {
        let (kind, depth, in_string) = match first {
            b'{' | b'[' => (ValueKind::Container, 1, false),
            b'"' => (ValueKind::String, 0, true),
            b'-' | b'0'..=b'9' | b't' | b'f' | b'n' => (ValueKind::Scalar, 0, false),
            _ => return None,
        };

        Some(Self {
            kind,
            pos: 1,
            depth,
            in_string,
            escaped: false,
        })
    }

    /// Advance over `bytes`; returns the exclusive end once the value is complete
    fn advance(&mut self, bytes: &[u8], eof: bool) -> Option<usize> {
        while self.pos < bytes.len() {
            let b = bytes[self.pos];

            if self.kind == ValueKind::Scalar {
                if is_delimiter(b) {
                    return Some(self.pos);
                }
                self.pos += 1;
                continue;
            }

            self.pos += 1;
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.kind == ValueKind::String {
                        return Some(self.pos);
                    }
                }
                continue;
            }

            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Some(self.pos);
                    }
                },
                _ => {},
            }
        }

        // A bare scalar is only terminated by a delimiter or the end of input
        (eof && self.kind == ValueKind::Scalar).then_some(self.pos)
    }
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b',' | b']' | b'}' | b'[' | b'{' | b'"')
}

/// `tokio_util` decoder framing one JSON object record at a time
#[derive(Debug, Default)]
pub struct JsonRecordDecoder {
    layout: Layout,
    awaiting_separator: bool,
    after_comma: bool,
    scan: Option<Scan>,
    consumed: usize,
}

impl JsonRecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn advance(&mut self, buf: &mut BytesMut, n: usize) {
        buf.advance(n);
        self.consumed += n;
    }

    fn skip_whitespace(&mut self, buf: &mut BytesMut) {
        let n = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        self.advance(buf, n);
    }

    /// Position the buffer at the start of the next value.
    ///
    /// Returns `false` when more input is needed or the layout is exhausted.
    fn begin_value(&mut self, buf: &mut BytesMut, eof: bool) -> Result<bool> {
        loop {
            if self.layout == Layout::Detect && self.consumed == 0 {
                if !eof && !buf.is_empty() && buf.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&buf[..])
                {
                    return Ok(false);
                }
                if buf.starts_with(UTF8_BOM) {
                    self.advance(buf, UTF8_BOM.len());
                }
            }

            self.skip_whitespace(buf);
            let Some(&first) = buf.first() else {
                return Ok(false);
            };

            match self.layout {
                Layout::Detect => {
                    self.layout = if first == b'[' {
                        self.advance(buf, 1);
                        Layout::Array
                    } else {
                        Layout::Sequence
                    };
                    debug!(layout = ?self.layout, "Detected input layout");
                    continue;
                },
                Layout::Finished => {
                    // Anything after the closing bracket is ignored
                    let rest = buf.len();
                    self.advance(buf, rest);
                    return Ok(false);
                },
                Layout::Array if first == b']' => {
                    if self.after_comma {
                        return Err(MigrateError::malformed(self.consumed, "trailing comma before ']'"));
                    }
                    self.advance(buf, 1);
                    self.layout = Layout::Finished;
                    continue;
                },
                Layout::Array if self.awaiting_separator => {
                    if first != b',' {
                        return Err(MigrateError::malformed(
                            self.consumed,
                            format!("expected ',' or ']' but found '{}'", char::from(first)),
                        ));
                    }
                    self.advance(buf, 1);
                    self.awaiting_separator = false;
                    self.after_comma = true;
                    continue;
                },
                Layout::Array | Layout::Sequence => {},
            }

            let scan = Scan::start(first).ok_or_else(|| {
                MigrateError::malformed(
                    self.consumed,
                    format!("unexpected character '{}'", char::from(first)),
                )
            })?;
            self.scan = Some(scan);
            return Ok(true);
        }
    }

    fn next_record(&mut self, buf: &mut BytesMut, eof: bool) -> Result<Option<Value>> {
        loop {
            if self.scan.is_none() && !self.begin_value(buf, eof)? {
                return Ok(None);
            }

            let Some(end) = self.scan.as_mut().and_then(|scan| scan.advance(&buf[..], eof)) else {
                return Ok(None);
            };

            let offset = self.consumed;
            let raw = buf.split_to(end);
            self.consumed += end;
            self.scan = None;

            let value: Value = serde_json::from_slice(&raw)
                .map_err(|e| MigrateError::malformed(offset, e.to_string()))?;

            if self.layout == Layout::Array {
                self.awaiting_separator = true;
                self.after_comma = false;
            }

            if value.is_object() {
                return Ok(Some(value));
            }

            debug!(offset, "Skipping top-level value that is not an object");
        }
    }
}

impl Decoder for JsonRecordDecoder {
    type Item = Value;
    type Error = MigrateError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Value>> {
        self.next_record(buf, false)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Value>> {
        if let Some(record) = self.next_record(buf, true)? {
            return Ok(Some(record));
        }

        if self.scan.is_some() {
            return Err(MigrateError::malformed(
                self.consumed,
                "unexpected end of input inside a value",
            ));
        }

        if self.layout == Layout::Array {
            return Err(MigrateError::malformed(
                self.consumed,
                "unexpected end of input: array is not closed",
            ));
        }

        Ok(None)
    }
}
