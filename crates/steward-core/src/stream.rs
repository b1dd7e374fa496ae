//! Bounded-buffer stream draining.
//!
//! Response bodies are materialized in memory before any decoding happens.
//! The transport hands over a plain [`Read`] stream; the drain owns it from
//! that point on, so the stream is dropped (and any descriptor it holds
//! released) on every exit path.

use std::io::{self, Read, Write};

/// Chunk size used when draining response bodies.
pub const COPY_BUFFER_SIZE: usize = 10 * 1024;

/// Read `source` to exhaustion, writing every chunk to `sink`.
///
/// Byte order and content are preserved exactly; nothing is transformed.
/// The sink is flushed before a successful return. Interrupted reads are
/// retried; any other read or write failure is returned as-is, since
/// classifying it is the caller's job. This helper only guarantees cleanup.
///
/// Returns the number of bytes copied.
pub fn copy_all<R: Read, W: Write + ?Sized>(mut source: R, sink: &mut W) -> io::Result<u64> {
    let mut buffer = [0u8; COPY_BUFFER_SIZE];
    let mut copied: u64 = 0;

    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        sink.write_all(&buffer[..read])?;
        copied += read as u64;
    }

    sink.flush()?;
    Ok(copied)
}

// ============================================================================
// TESTS
// ============================================================================
