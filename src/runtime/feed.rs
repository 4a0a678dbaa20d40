//! NDJSON feed processing: one inbound envelope per line, outbound envelopes
//! written as they are produced.

use std::io::{BufRead, Write};

use crate::envelope::{MessageEnvelope, OutboundEnvelope};
use crate::error::StreamError;
use crate::serialization::NdjsonWriter;
use crate::trace::TraceSink;

use super::dispatcher::Dispatcher;

/// Counts for one pass over a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Non-blank lines read
    pub processed: usize,
    pub emitted: usize,
    pub failed: usize,
}

/// Dispatch every envelope in `reader`, writing transform output to `writer`.
///
/// A line that fails (bad UTF-8, bad JSON, function error) is logged and
/// counted; processing continues with the next line.
///
/// # Errors
/// Only I/O errors from the reader or writer end the pass early.
pub fn process_feed<R: BufRead, W: Write>(
    dispatcher: &Dispatcher<'_>,
    mut reader: R,
    writer: &mut NdjsonWriter<W>,
    trace: &dyn TraceSink,
) -> Result<FeedSummary, StreamError> {
    let mut summary = FeedSummary::default();
    let mut buf = Vec::new();
    let mut line_num = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_num += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                summary.processed += 1;
                summary.failed += 1;
                tracing::error!("Message on line {} is not valid UTF-8: {}", line_num, e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        summary.processed += 1;

        match process_line(dispatcher, line, trace) {
            Ok(Some(outbound)) => {
                writer.write(&outbound)?;
                summary.emitted += 1;
            }
            Ok(None) => {}
            Err(e) => {
                summary.failed += 1;
                tracing::error!("Message on line {} failed: {}", line_num, e);
            }
        }
    }

    writer.flush()?;
    Ok(summary)
}

/// Parse one envelope and dispatch it.
pub fn process_line(
    dispatcher: &Dispatcher<'_>,
    line: &str,
    trace: &dyn TraceSink,
) -> Result<Option<OutboundEnvelope>, StreamError> {
    let envelope: MessageEnvelope = serde_json::from_str(line)?;
    let message_id = envelope.message_id;

    tracing::debug!(
        "Received message {} on '{}'",
        message_id,
        envelope.destination
    );

    let payload = envelope.body.into_payload()?;

    match dispatcher.dispatch(&envelope.destination, payload, trace)? {
        Some(outbound) => OutboundEnvelope::from_outbound(message_id, outbound).map(Some),
        None => Ok(None),
    }
}
