//! Record-oriented reader for child diagnostic output.
//!
//! Transcoders rewrite their status line in place with a bare `\r`. Over a
//! pipe those rewrites never produce a `\n`, so `lines()` would hold every
//! update until the process exits. This reader treats either byte as a
//! record boundary.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

const READ_CHUNK: usize = 4096;

/// Upper bound for a single undelimited record; longer runs are flushed as-is.
const DEFAULT_MAX_RECORD_LEN: usize = 64 * 1024;

/// Yields trimmed, non-empty text records delimited by `\n` or `\r`.
pub struct OutputRecordReader<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    scratch: [u8; READ_CHUNK],
    max_record_len: usize,
}

impl<R> OutputRecordReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            pending: Vec::new(),
            scratch: [0u8; READ_CHUNK],
            max_record_len: DEFAULT_MAX_RECORD_LEN,
        }
    }

    /// Override the flush threshold for undelimited output.
    pub fn with_max_record_len(mut self, max_record_len: usize) -> Self {
        self.max_record_len = max_record_len.max(1);
        self
    }

    /// Next record, or `None` once the stream is exhausted.
    ///
    /// Runs of delimiters (`\r\n`, `\r\r`) never produce empty records.
    pub async fn next_record(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(idx) = find_delimiter(&self.pending) {
                let record_bytes: Vec<u8> = self.pending.drain(..idx).collect();
                skip_delimiters(&mut self.pending);

                if let Some(record) = to_record(&record_bytes) {
                    return Ok(Some(record));
                }
                continue;
            }

            if self.pending.len() >= self.max_record_len {
                let record_bytes = std::mem::take(&mut self.pending);
                if let Some(record) = to_record(&record_bytes) {
                    return Ok(Some(record));
                }
                continue;
            }

            let n = self.reader.read(&mut self.scratch).await?;
            if n == 0 {
                let rest = std::mem::take(&mut self.pending);
                return Ok(to_record(&rest));
            }

            self.pending.extend_from_slice(&self.scratch[..n]);
        }
    }
}

fn to_record(bytes: &[u8]) -> Option<String> {
    let record = String::from_utf8_lossy(bytes).trim().to_string();
    (!record.is_empty()).then_some(record)
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| matches!(b, b'\n' | b'\r'))
}

fn skip_delimiters(buf: &mut Vec<u8>) {
    let n = buf
        .iter()
        .take_while(|&&b| matches!(b, b'\n' | b'\r'))
        .count();
    if n > 0 {
        buf.drain(..n);
    }
}
