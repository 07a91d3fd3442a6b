//! Line-delimited JSON writer
//!
//! One compact JSON document per line, newline-terminated, in the order the
//! records arrive. Records are fed into a `FramedWrite` sink as they come, and
//! the sink is flushed once at the end.

use bytes::{BufMut, BytesMut};
use futures::{SinkExt, Stream, TryStreamExt};
use migrate_common::{MigrateError, Result};
use serde_json::Value;
use std::pin::pin;
use tokio::io::AsyncWrite;
use tokio_util::codec::{Encoder, FramedWrite};
use tracing::debug;

/// Encodes one record as a compact JSON line
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesEncoder;

impl Encoder<Value> for JsonLinesEncoder {
    type Error = MigrateError;

    fn encode(&mut self, record: Value, dst: &mut BytesMut) -> Result<()> {
        let mut writer = dst.writer();
        serde_json::to_writer(&mut writer, &record)?;
        writer.get_mut().put_u8(b'\n');
        Ok(())
    }
}

/// Writes mapped records to an async byte sink
#[derive(Debug, Default, Clone, Copy)]
pub struct NdjsonWriter;

impl NdjsonWriter {
    pub fn new() -> Self {
        Self
    }

    /// Drain `records` into `output`; returns the number of lines written.
    ///
    /// The first error from the record stream stops writing and is returned
    /// after what was already fed has been flushed.
    pub async fn write<W, S>(&self, output: W, records: S) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
        S: Stream<Item = Result<Value>>,
    {
        let mut sink = FramedWrite::new(output, JsonLinesEncoder);
        let mut records = pin!(records);
        let mut written = 0u64;

        let outcome = loop {
            match records.try_next().await {
                Ok(Some(record)) => {
                    sink.feed(record).await?;
                    written += 1;
                },
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        sink.flush().await?;
        debug!(written, "Output flushed");

        outcome.map(|()| written)
    }
}
