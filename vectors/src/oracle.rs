//! Oracle text: one `type_code + render + '\n'` line per written value.

use std::io::Write;

use crate::canon;
use crate::error::VectorError;
use crate::value::Datum;

/// Line-oriented oracle sink.
#[derive(Debug)]
pub struct OracleWriter<W: Write> {
    out: W,
    lines: u64,
}

impl<W: Write> OracleWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    /// Append the line for `datum`.
    ///
    /// # Errors
    ///
    /// I/O failure of the sink.
    pub fn write(&mut self, datum: &Datum) -> Result<(), VectorError> {
        let mut line = String::new();
        line.push(datum.type_code());
        line.push_str(&canon::render(datum));
        line.push('\n');
        self.out.write_all(line.as_bytes())?;
        self.lines += 1;
        Ok(())
    }

    /// Lines written so far.
    #[must_use]
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Flush and hand back the sink.
    ///
    /// # Errors
    ///
    /// I/O failure of the final flush.
    pub fn finish(mut self) -> Result<W, VectorError> {
        self.out.flush()?;
        Ok(self.out)
    }
}
