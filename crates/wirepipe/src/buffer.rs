//! Reusable read buffers and owned write payloads.
//!
//! Each forwarding path owns one fixed-capacity scratch buffer that is
//! reused for every read. The scratch contents are only valid until the next
//! read, so a payload must be copied out before it is queued for an
//! asynchronous write; the copy is owned by exactly one in-flight write and
//! dropped when that write completes.

/// Which forwarding path a buffer or chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// stdin -> socket.
    StdinToSocket,
    /// socket -> stdout.
    SocketToStdout,
}

impl Direction {
    /// Short label for log fields.
    pub const fn label(self) -> &'static str {
        match self {
            Self::StdinToSocket => "stdin->socket",
            Self::SocketToStdout => "socket->stdout",
        }
    }
}

/// Fixed-capacity scratch buffer for one forwarding direction.
///
/// Allocated once at path startup and never resized.
#[derive(Debug)]
pub struct ReadBuffer {
    direction: Direction,
    buf: Vec<u8>,
}

impl ReadBuffer {
    /// Allocate a scratch buffer of `capacity` bytes.
    pub fn new(direction: Direction, capacity: usize) -> Self {
        Self {
            direction,
            buf: vec![0; capacity],
        }
    }

    /// The path this buffer belongs to.
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Scratch space for the next read.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Copy the first `len` bytes into a freshly owned write payload.
    ///
    /// Must be called before the scratch buffer is handed to the next read;
    /// the returned buffer shares no storage with the scratch.
    pub fn copy_out(&self, len: usize) -> Vec<u8> {
        self.buf[..len].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_out_is_unaffected_by_scratch_reuse() {
        let mut scratch = ReadBuffer::new(Direction::StdinToSocket, 8);
        scratch.as_mut_slice()[..5].copy_from_slice(b"hello");
        let payload = scratch.copy_out(5);

        // Next read overwrites the scratch; the queued payload must not move.
        scratch.as_mut_slice()[..5].copy_from_slice(b"xxxxx");
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn rapid_reads_yield_independent_payloads() {
        let mut scratch = ReadBuffer::new(Direction::SocketToStdout, 4);
        let payloads: Vec<Vec<u8>> = (0u8..10)
            .map(|i| {
                scratch.as_mut_slice().fill(i);
                scratch.copy_out(4)
            })
            .collect();

        for (i, payload) in (0u8..10).zip(&payloads) {
            assert_eq!(payload.as_slice(), [i; 4]);
        }
    }

    #[test]
    fn direction_labels_are_distinct() {
        assert_ne!(
            Direction::StdinToSocket.label(),
            Direction::SocketToStdout.label()
        );
    }
}
