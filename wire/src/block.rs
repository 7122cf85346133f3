//! Block-data framing: the buffered byte sink under the object writer.
//!
//! Every byte goes through a buffer of at most [`MAX_BLOCK_SIZE`] bytes.
//! Draining the buffer emits it raw, or, in block-data mode, behind a
//! block header:
//!
//! ```text
//! len <= 255 : [TC_BLOCKDATA][len:u8][payload]
//! len >  255 : [TC_BLOCKDATALONG][len:i32be][payload]
//! ```
//!
//! The buffer is drained lazily: a write that finds it full drains first, so
//! a multi-byte primitive can straddle two blocks. Switching modes drains
//! under the old mode.

use std::io::Write;

use crate::constants::{MAX_BLOCK_SIZE, MAX_SHORT_BLOCK_LEN, TC_BLOCKDATA, TC_BLOCKDATALONG};

/// Buffered sink with a block-data mode switch.
#[derive(Debug)]
pub struct BlockDataOutput<W: Write> {
    out: W,
    buf: Vec<u8>,
    block_mode: bool,
}

impl<W: Write> BlockDataOutput<W> {
    /// Wrap `out`. Block-data mode starts off.
    pub fn new(out: W) -> Self {
        Self {
            out,
            buf: Vec::with_capacity(MAX_BLOCK_SIZE),
            block_mode: false,
        }
    }

    #[must_use]
    pub fn block_mode(&self) -> bool {
        self.block_mode
    }

    /// Bytes buffered and not yet drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Switch block-data mode, returning the previous mode.
    ///
    /// Pending bytes are drained under the previous mode first. Setting the
    /// mode it already has is a no-op and drains nothing.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from draining.
    pub fn set_block_data_mode(&mut self, mode: bool) -> std::io::Result<bool> {
        if self.block_mode == mode {
            return Ok(mode);
        }
        self.drain()?;
        self.block_mode = mode;
        Ok(!mode)
    }

    /// Buffer `bytes`, draining whenever the buffer is full.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from draining.
    pub fn write_bytes(&mut self, mut bytes: &[u8]) -> std::io::Result<()> {
        while !bytes.is_empty() {
            if self.buf.len() >= MAX_BLOCK_SIZE {
                self.drain()?;
            }
            let room = MAX_BLOCK_SIZE - self.buf.len();
            let take = room.min(bytes.len());
            self.buf.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
        }
        Ok(())
    }

    /// Buffer a single byte.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from draining.
    pub fn write_u8(&mut self, b: u8) -> std::io::Result<()> {
        self.write_bytes(&[b])
    }

    /// Emit the buffer, behind a block header when in block-data mode.
    ///
    /// An empty buffer emits nothing: an empty block can only be produced by
    /// writing its header raw.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the sink.
    pub fn drain(&mut self) -> std::io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        if self.block_mode {
            write_block_header(&mut self.out, self.buf.len())?;
        }
        self.out.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }

    /// Drain, then flush the sink.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the sink.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.drain()?;
        self.out.flush()
    }

    /// Write straight to the sink, bypassing the buffer.
    ///
    /// Pending buffered bytes are NOT drained: callers that need ordering
    /// must [`flush`](Self::flush) first.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the sink.
    pub fn write_unbuffered(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.out.write_all(bytes)
    }

    /// Drain, flush and return the sink.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the final flush.
    pub fn into_inner(mut self) -> std::io::Result<W> {
        self.flush()?;
        Ok(self.out)
    }
}

/// Write the header for a block of `len` payload bytes.
fn write_block_header<W: Write>(out: &mut W, len: usize) -> std::io::Result<()> {
    if len <= MAX_SHORT_BLOCK_LEN {
        #[allow(clippy::cast_possible_truncation)] // len <= 255
        out.write_all(&[TC_BLOCKDATA, len as u8])
    } else {
        // len <= MAX_BLOCK_SIZE, always fits.
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let len_i32 = len as i32;
        out.write_all(&[TC_BLOCKDATALONG])?;
        out.write_all(&len_i32.to_be_bytes())
    }
}
