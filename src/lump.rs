//! Lump Buffer
//!
//! A growable byte buffer used to assemble lump contents before they are
//! handed to the archive writer. Data can be appended or prepended, and
//! text written through [`std::fmt::Write`] optionally gets CRLF line
//! endings.

use std::fmt;

/// Byte buffer for a single lump
#[derive(Clone, Debug, Default)]
pub struct Lump {
    buffer: Vec<u8>,
    /// Convert `\n` to `\r\n` for text written via `fmt::Write`
    crlf: bool,
}

impl Lump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable CRLF line endings for text output
    pub fn set_crlf(&mut self, crlf: bool) {
        self.crlf = crlf;
    }

    pub fn append(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Insert `data` in front of everything written so far
    pub fn prepend(&mut self, data: &[u8]) {
        self.buffer.splice(0..0, data.iter().copied());
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl fmt::Write for Lump {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if !self.crlf {
            self.buffer.extend_from_slice(s.as_bytes());
            return Ok(());
        }

        for (i, line) in s.split('\n').enumerate() {
            if i > 0 {
                self.buffer.extend_from_slice(b"\r\n");
            }
            self.buffer.extend_from_slice(line.as_bytes());
        }
        Ok(())
    }
}
