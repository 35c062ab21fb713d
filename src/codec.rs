//! Line codec: frames a TCP byte stream into chat lines.
//!
//! Splits on `\n` (tolerating a preceding `\r`), decodes each line as
//! UTF-8, and serializes outgoing lines with `\n` termination. Input is
//! bounded: a line longer than the configured maximum is a codec error
//! rather than unbounded buffer growth.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Codec error: an oversized line, invalid UTF-8, or an I/O error.
#[derive(Debug, thiserror::Error)]
pub enum LineCodecError {
    #[error("line exceeds maximum length ({0} bytes)")]
    LineTooLong(usize),
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A tokio codec that frames chat messages on newline boundaries.
#[derive(Debug)]
pub struct LineCodec {
    max_length: usize,
}

impl LineCodec {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = LineCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match src.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                if pos > self.max_length {
                    return Err(LineCodecError::LineTooLong(self.max_length));
                }

                // Extract the line (without the terminator), advance past \n.
                let mut line_bytes = src.split_to(pos);
                src.advance(1);
                if line_bytes.last() == Some(&b'\r') {
                    line_bytes.truncate(line_bytes.len() - 1);
                }

                let line = std::str::from_utf8(&line_bytes)
                    .map_err(|_| LineCodecError::InvalidUtf8)?;

                Ok(Some(line.to_string()))
            }
            None => {
                // No complete line yet. Check if the buffer is getting too large.
                if src.len() > self.max_length {
                    return Err(LineCodecError::LineTooLong(self.max_length));
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = LineCodecError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
