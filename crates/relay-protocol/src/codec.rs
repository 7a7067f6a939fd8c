//! Newline frame codec.
//!
//! `PulseCodec` splits an inbound byte stream into [`Command`]s at each
//! `\n` and writes outbound commands followed by `\n`. The read buffer
//! handed to [`Decoder::decode`] is the session's inbound accumulator:
//! `FramedRead` keeps calling `decode` until it yields `None`, so no
//! complete line is ever left behind before the next socket read.

use std::io;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use relay_core::{Command, CommandError, DELIMITER};

/// Default upper bound on a single frame (1 MB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 1_048_576;

/// Codec for newline-delimited relay commands.
#[derive(Debug, Clone)]
pub struct PulseCodec {
    /// Longest accepted frame, delimiter excluded
    max_frame_len: usize,

    /// Index into the buffer up to which no delimiter was found, so a
    /// partial line is not rescanned on every read
    next_index: usize,
}

impl PulseCodec {
    /// Creates a codec with the default frame limit.
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Creates a codec that rejects frames longer than `max_frame_len`.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            max_frame_len,
            next_index: 0,
        }
    }

    /// Returns the configured frame limit.
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for PulseCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PulseCodec {
    type Item = Command;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Command>, FrameError> {
        let start = self.next_index.min(src.len());
        let found = src
            .get(start..)
            .and_then(|rest| rest.iter().position(|&b| b == DELIMITER))
            .map(|offset| start + offset);

        let Some(line_end) = found else {
            if src.len() > self.max_frame_len {
                return Err(FrameError::TooLong {
                    len: src.len(),
                    max: self.max_frame_len,
                });
            }
            self.next_index = src.len();
            return Ok(None);
        };

        self.next_index = 0;

        if line_end > self.max_frame_len {
            return Err(FrameError::TooLong {
                len: line_end,
                max: self.max_frame_len,
            });
        }

        let mut line = src.split_to(line_end + 1);
        line.truncate(line_end);
        Ok(Some(Command::new(line.freeze())?))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Command>, FrameError> {
        match self.decode(src)? {
            Some(command) => Ok(Some(command)),
            None => {
                // An undelimited tail at EOF is never dispatched.
                src.clear();
                self.next_index = 0;
                Ok(None)
            }
        }
    }
}

impl Encoder<Command> for PulseCodec {
    type Error = FrameError;

    fn encode(&mut self, command: Command, dst: &mut BytesMut) -> Result<(), FrameError> {
        dst.reserve(command.len() + 1);
        dst.put(command.into_bytes());
        dst.put_u8(DELIMITER);
        Ok(())
    }
}

/// Errors that can occur while framing commands.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Frame too large: {len} bytes (max: {max})")]
    TooLong { len: usize, max: usize },

    #[error("Invalid command: {0}")]
    Command(#[from] CommandError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
