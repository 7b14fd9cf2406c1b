//! Line framing
//!
//! Turns an arbitrary sequence of received byte chunks into complete
//! newline-delimited text lines, buffering partial data across reads.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::FrameError;

const READ_CHUNK_SIZE: usize = 4096;

/// Incremental line decoder.
///
/// Bytes go in with [`feed`](LineFramer::feed); complete lines come out of
/// [`next_line`](LineFramer::next_line). Invalid UTF-8 is replaced with
/// U+FFFD rather than rejected.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
    max_line_length: Option<usize>,
}

impl LineFramer {
    pub fn new(max_line_length: Option<usize>) -> Self {
        Self {
            buffer: Vec::new(),
            max_line_length,
        }
    }

    /// Appends received bytes to the pending buffer.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Returns the next complete line, or `Ok(None)` when more input is needed.
    pub fn next_line(&mut self) -> Result<Option<String>, FrameError> {
        match self.buffer.iter().position(|&b| b == b'\n') {
            Some(idx) => {
                let mut raw: Vec<u8> = self.buffer.drain(..=idx).collect();
                raw.pop();
                while raw.last() == Some(&b'\r') {
                    raw.pop();
                }
                Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
            }
            None => match self.max_line_length {
                Some(limit) if self.buffer.len() > limit => Err(FrameError::LineTooLong {
                    buffered: self.buffer.len(),
                    limit,
                }),
                _ => Ok(None),
            },
        }
    }

    /// Number of bytes waiting for a line break.
    #[cfg(test)]
    fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// A [`LineFramer`] bound to one byte stream.
pub struct LineReader<R> {
    reader: R,
    framer: LineFramer,
    chunk: Box<[u8]>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_line_length: Option<usize>) -> Self {
        Self {
            reader,
            framer: LineFramer::new(max_line_length),
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Reads until a full line is available.
    ///
    /// `Ok(None)` means the peer closed the stream; unterminated trailing
    /// bytes are dropped.
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(line) = self.framer.next_line()? {
                return Ok(Some(line));
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                return Ok(None);
            }
            self.framer.feed(&self.chunk[..n]);
        }
    }
}
