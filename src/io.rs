// File-level helpers for trace decoding.
//
// Wraps the streaming decoder for whole-file consumption: map (or read) a
// trace file, feed it to a context in one zero-copy pass, and drive the
// decode loop, tallying per-kind statistics. A chunked variant feeds the
// file through the copying path in fixed-size pieces, for callers that want
// bounded memory or to exercise streaming resume.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::spe::{DecodeContext, Packet, PacketKind};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics accumulated over one decoded trace.
#[derive(Debug, Clone, Default)]
pub struct TraceSummary {
    /// Input size in bytes.
    pub bytes: u64,
    /// Packets decoded (padding included only when it is not skipped).
    pub packets: u64,
    /// Records seen: runs of packets ending in an End or Timestamp packet.
    pub records: u64,
    /// Bytes left unconsumed at end of input (a truncated final packet).
    pub trailing: usize,
    counts: [u64; PacketKind::COUNT],
}

impl TraceSummary {
    /// Packets decoded of one kind.
    pub fn count(&self, kind: PacketKind) -> u64 {
        self.counts[kind.index()]
    }

    /// Per-kind counts, in stable order.
    pub fn counts(&self) -> impl Iterator<Item = (PacketKind, u64)> + '_ {
        PacketKind::ALL.iter().map(|&kind| (kind, self.count(kind)))
    }

    fn tally(&mut self, packet: &Packet) {
        self.packets += 1;
        self.counts[packet.kind.index()] += 1;
        if packet.is_record_end() {
            self.records += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file-level decoding.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// I/O error (file open, map, read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Whole-buffer decoding
// ---------------------------------------------------------------------------

/// Decode every packet in `bytes`, passing each to `sink`.
///
/// The buffer is lent to the decoder zero-copy for the duration of the
/// call. Padding headers are skipped unless `keep_padding` is set.
pub fn decode_slice<F>(bytes: &[u8], keep_padding: bool, mut sink: F) -> TraceSummary
where
    F: FnMut(&Packet),
{
    let mut ctx = DecodeContext::new();
    ctx.feed(bytes);

    let mut summary = TraceSummary {
        bytes: bytes.len() as u64,
        ..TraceSummary::default()
    };
    while let Some(packet) = ctx.decode_next(!keep_padding) {
        summary.tally(&packet);
        sink(&packet);
    }
    summary.trailing = ctx.remaining();
    summary
}

// ---------------------------------------------------------------------------
// decode_file
// ---------------------------------------------------------------------------

/// Decode a trace file, passing each packet to `sink`.
///
/// With the `mmap` feature the file is memory-mapped and decoded in place;
/// otherwise it is read fully into memory first.
pub fn decode_file<F>(path: &Path, keep_padding: bool, sink: F) -> Result<TraceSummary, TraceError>
where
    F: FnMut(&Packet),
{
    let file = File::open(path)?;

    #[cfg(feature = "mmap")]
    {
        // Safety: read-only mapping, held open for every borrow the decoder
        // takes of it within this call.
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Ok(decode_slice(&map, keep_padding, sink))
    }

    #[cfg(not(feature = "mmap"))]
    {
        let mut file = file;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(decode_slice(&bytes, keep_padding, sink))
    }
}

// ---------------------------------------------------------------------------
// decode_file_chunked
// ---------------------------------------------------------------------------

/// Decode a trace file, feeding it to the decoder `chunk_size` bytes at a
/// time through the copying path. The packet sequence is identical to
/// [`decode_file`]; only the feeding pattern differs.
pub fn decode_file_chunked<F>(
    path: &Path,
    chunk_size: usize,
    keep_padding: bool,
    mut sink: F,
) -> Result<TraceSummary, TraceError>
where
    F: FnMut(&Packet),
{
    let mut file = File::open(path)?;
    let mut chunk = vec![0u8; chunk_size.max(1)];

    let mut ctx = DecodeContext::new();
    let mut summary = TraceSummary::default();
    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        summary.bytes += n as u64;
        ctx.feed_copied(&chunk[..n]);

        // Drain everything the refill completed before reading on.
        while let Some(packet) = ctx.decode_next(!keep_padding) {
            summary.tally(&packet);
            sink(&packet);
        }
    }
    summary.trailing = ctx.remaining();
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
