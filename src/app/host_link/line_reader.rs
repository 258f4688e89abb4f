use super::super::config::HOST_CMD_BUF_LEN;

/// Accumulates host-link bytes into newline-terminated command lines. A full
/// buffer acts as an implicit terminator, so an over-length line is split
/// rather than rejected; the byte that found the buffer full is dropped.
pub(super) struct LineReader {
    buf: [u8; HOST_CMD_BUF_LEN],
    len: usize,
}

impl LineReader {
    pub(super) const fn new() -> Self {
        Self {
            buf: [0; HOST_CMD_BUF_LEN],
            len: 0,
        }
    }

    /// Returns the completed line when `byte` terminates one. Empty lines
    /// are swallowed here so callers only ever see commands.
    pub(super) fn push_byte(&mut self, byte: u8) -> Option<&[u8]> {
        if byte == b'\r' || byte == b'\n' || self.len == self.buf.len() {
            let complete = self.len;
            self.len = 0;
            if complete == 0 {
                return None;
            }
            return Some(&self.buf[..complete]);
        }
        self.buf[self.len] = byte;
        self.len += 1;
        None
    }
}
