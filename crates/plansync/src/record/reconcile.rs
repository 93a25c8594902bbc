//! Chunk-boundary reconciliation.
//!
//! Chunk boundaries are byte positions with no respect for record
//! boundaries: the last line of a chunk may be a dangling fragment completed
//! by the next chunk, a whole row that just happens to sit at the end, or
//! the middle of a quoted multi-line field. The reconciler holds the final
//! candidate of every chunk back until the next chunk (or [`Reconciler::finish`])
//! confirms it, so each logical record comes out exactly once.

use tracing::debug;

use super::parser::{column_count, logical_lines, split_line};
use super::{Chunk, Row};
use crate::error::{Result, SyncError};

/// Stitches rows across chunk boundaries.
///
/// State is explicit and threaded through per-chunk calls: `pending` is the
/// single unconfirmed candidate row (kept as raw text so embedded newlines
/// survive the boundary), and the confirmed rows are returned from each call.
/// The final flush is its own phase ([`Reconciler::finish`]), not a re-entry
/// of the chunk path with sentinel ordinals.
#[derive(Debug)]
pub struct Reconciler {
    separator: char,
    header: Option<Vec<String>>,
    /// Raw text of the unconfirmed candidate row at the end of the previous
    /// chunk, trailing newline included when one was present.
    pending: Option<String>,
    next_ordinal: usize,
    total: Option<usize>,
}

/// Split chunk text into the logical lines that are safe to emit and the raw
/// text of the final candidate line.
///
/// The candidate keeps its exact bytes (including a trailing newline) so that
/// gluing it to the next chunk reproduces the original stream.
fn body_and_tail(text: &str) -> (Vec<String>, Option<String>) {
    // Byte offsets just past each newline that terminates a logical line.
    let mut ends = Vec::new();
    let mut quotes = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '"' => quotes += 1,
            '\n' if quotes % 2 == 0 => ends.push(i + 1),
            _ => {}
        }
    }

    let tail_start = match ends.last() {
        None => 0,
        // Text ends exactly at a line terminator: the candidate is the last
        // terminated line, newline and all.
        Some(&last) if last == text.len() => {
            if ends.len() >= 2 {
                ends[ends.len() - 2]
            } else {
                0
            }
        }
        Some(&last) => last,
    };

    let body = logical_lines(&text[..tail_start]);
    let tail = if tail_start < text.len() {
        Some(text[tail_start..].to_string())
    } else {
        None
    };
    (body, tail)
}

impl Reconciler {
    pub fn new(separator: char) -> Self {
        Self {
            separator,
            header: None,
            pending: None,
            next_ordinal: 0,
            total: None,
        }
    }

    /// Header row parsed from chunk 0, once seen.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Process one chunk and return the rows confirmed complete by it.
    ///
    /// Chunks must arrive in strictly ascending ordinal order with a
    /// consistent total.
    pub fn push_chunk(&mut self, chunk: &Chunk) -> Result<Vec<Row>> {
        self.check_sequence(chunk)?;

        let mut rows = Vec::new();
        let (body, tail) = if chunk.ordinal == 0 {
            self.take_header(&chunk.text)?
        } else {
            self.join_with_pending(chunk, &mut rows)?
        };

        for line in &body {
            rows.push(split_line(line, self.separator));
        }
        // Hold the final candidate back until the next chunk confirms it.
        self.pending = tail;

        self.next_ordinal += 1;
        Ok(rows)
    }

    /// Final pipeline phase: flush the held-back row after the last chunk.
    pub fn finish(&mut self) -> Result<Vec<Row>> {
        if let Some(total) = self.total {
            if self.next_ordinal != total {
                return Err(SyncError::ChunkSequence(format!(
                    "export ended after chunk {} of {}",
                    self.next_ordinal, total
                )));
            }
        }
        let mut rows = Vec::new();
        if let Some(last) = self.pending.take() {
            for line in logical_lines(&last) {
                rows.push(split_line(&line, self.separator));
            }
        }
        Ok(rows)
    }

    fn check_sequence(&mut self, chunk: &Chunk) -> Result<()> {
        if chunk.ordinal != self.next_ordinal {
            return Err(SyncError::ChunkSequence(format!(
                "expected chunk {}, got chunk {}",
                self.next_ordinal, chunk.ordinal
            )));
        }
        match self.total {
            None => self.total = Some(chunk.total),
            Some(total) if total != chunk.total => {
                return Err(SyncError::ChunkSequence(format!(
                    "chunk {} reports total {}, previous chunks reported {}",
                    chunk.ordinal, chunk.total, total
                )));
            }
            Some(_) => {}
        }
        if chunk.ordinal >= chunk.total {
            return Err(SyncError::ChunkSequence(format!(
                "chunk ordinal {} out of range for total {}",
                chunk.ordinal, chunk.total
            )));
        }
        Ok(())
    }

    /// Chunk 0: line 1 is the header and is skipped for data purposes.
    fn take_header(&mut self, text: &str) -> Result<(Vec<String>, Option<String>)> {
        let (mut body, mut tail) = body_and_tail(text);
        let header_line = if !body.is_empty() {
            body.remove(0)
        } else {
            let terminated = tail.as_deref().filter(|t| t.ends_with('\n')).map(|t| {
                // The whole chunk is one terminated line: that is the header.
                logical_lines(t).into_iter().next()
            });
            match terminated.flatten() {
                Some(line) => {
                    tail = None;
                    line
                }
                None => {
                    return Err(SyncError::ChunkSequence(
                        "chunk 0 does not contain a complete header row".into(),
                    ));
                }
            }
        };
        let header = split_line(&header_line, self.separator);
        debug!("export header: {} columns", header.len());
        self.header = Some(header);
        Ok((body, tail))
    }

    /// Non-zero chunk: reconcile the previous chunk's dangling candidate
    /// against this chunk's first line.
    fn join_with_pending(
        &mut self,
        chunk: &Chunk,
        rows: &mut Vec<Row>,
    ) -> Result<(Vec<String>, Option<String>)> {
        let expected = self
            .header
            .as_ref()
            .map(|h| h.len())
            .ok_or_else(|| SyncError::ChunkSequence("no header seen before data".into()))?;

        let dangling = match self.pending.take() {
            Some(d) => d,
            None => return Ok(body_and_tail(&chunk.text)),
        };

        let joined = format!("{}{}", dangling, chunk.text);
        let (jbody, jtail) = body_and_tail(&joined);

        // No terminated line in the joined text yet: the row keeps spanning
        // chunks and nothing can be confirmed.
        let first_confirmed =
            !jbody.is_empty() || jtail.as_deref().map_or(false, |t| t.ends_with('\n'));
        if !first_confirmed {
            return Ok((jbody, jtail));
        }

        let first_line = match jbody.first() {
            Some(first) => Some(first.clone()),
            None => jtail
                .as_deref()
                .and_then(|t| logical_lines(t).into_iter().next()),
        };

        match first_line {
            Some(first) if column_count(&first, self.separator) == expected => {
                // The boundary fell inside a row; the joined text reads as
                // one stream.
                debug!(
                    "chunk {}: completed row dangling from chunk {}",
                    chunk.ordinal,
                    chunk.ordinal - 1
                );
                Ok((jbody, jtail))
            }
            Some(_) => {
                // Wrong arity after the join: the dangling text was already a
                // complete row of its own. Flush it standalone and process
                // the new chunk independently.
                for line in logical_lines(&dangling) {
                    rows.push(split_line(&line, self.separator));
                }
                debug!(
                    "chunk {}: flushed standalone row dangling from chunk {}",
                    chunk.ordinal,
                    chunk.ordinal - 1
                );
                Ok(body_and_tail(&chunk.text))
            }
            None => Ok((jbody, jtail)),
        }
    }
}
