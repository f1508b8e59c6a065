// Packet decoding: the header/data phase state machine and the one-packet
// decode step.
//
// A `DecodeContext` alternates between awaiting a header and awaiting that
// header's payload. Every operation that cannot complete from the buffered
// window fails with `NeedMoreInput` without consuming anything, so a caller
// can feed more bytes, in chunks of any size down to a single byte, and
// retry the same call. The context carries all decode state (phase, cached
// header, cursor), making the whole cycle re-entrant across refills that
// land mid-header or mid-payload.

use log::debug;

use super::buffer::StreamBuffer;
use super::fail_point;
use super::headers::{self, classify};
use super::packet::Packet;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Decode-step failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffered window ends before the current header or payload does.
    /// Recoverable: feed more bytes and retry the same call.
    #[error("need more input")]
    NeedMoreInput,
    /// A payload operation was called while a header read was pending.
    #[error("no header has been read")]
    AwaitingHeader,
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// A packet header: the raw value and its width in bytes.
///
/// One-byte headers occupy the low byte. Extended headers (first byte in
/// `0x20..0x40`) combine both bytes with the first in the high position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub value: u16,
    pub width: u8,
}

/// First-byte range that announces a two-byte header.
const EXTENDED_FIRST: std::ops::Range<u8> = 0x20..0x40;

// ---------------------------------------------------------------------------
// Decode context
// ---------------------------------------------------------------------------

/// Decode phase. The pending header is the data-phase payload, so a data
/// phase without a cached header cannot be represented.
#[derive(Debug, Clone, Copy)]
enum State {
    AwaitingHeader,
    AwaitingData(Header),
}

/// Streaming decode state: the input window plus the phase machine.
///
/// The lifetime ties the context to the oldest buffer lent through
/// [`feed`]; [`into_owned`] copies any unread tail and severs the tie.
///
/// [`feed`]: DecodeContext::feed
/// [`into_owned`]: DecodeContext::into_owned
pub struct DecodeContext<'a> {
    buf: StreamBuffer<'a>,
    state: State,
}

impl<'a> DecodeContext<'a> {
    /// New empty context, awaiting a header.
    pub const fn new() -> Self {
        DecodeContext {
            buf: StreamBuffer::new(),
            state: State::AwaitingHeader,
        }
    }

    /// Append input, borrowing the caller's buffer when possible.
    /// See [`StreamBuffer::feed`] for the aliasing rules.
    pub fn feed(&mut self, data: &'a [u8]) {
        self.buf.feed(data);
    }

    /// Append input, always copying.
    pub fn feed_copied(&mut self, data: &[u8]) {
        self.buf.feed_copied(data);
    }

    /// Copy any unread tail into owned storage and drop all references to
    /// caller memory. Decode state is preserved, so a partially decoded
    /// packet resumes cleanly after the caller frees or rewrites the
    /// original buffer.
    pub fn into_owned(self) -> DecodeContext<'static> {
        DecodeContext {
            buf: self.buf.into_owned(),
            state: self.state,
        }
    }

    /// Number of buffered bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Read the next header without consuming it.
    ///
    /// In the data phase this returns the in-flight packet's header, so
    /// repeated peeks are idempotent. Fails with `NeedMoreInput` when the
    /// window holds no byte, or only the first byte of an extended header.
    pub fn peek_header(&self) -> Result<Header, DecodeError> {
        if let State::AwaitingData(header) = self.state {
            return Ok(header);
        }

        let unread = self.buf.unread();
        let Some(&first) = unread.first() else {
            return Err(DecodeError::NeedMoreInput);
        };

        if EXTENDED_FIRST.contains(&first) {
            let Some(&second) = unread.get(1) else {
                debug!("extended header split across feeds");
                return Err(DecodeError::NeedMoreInput);
            };
            Ok(Header {
                value: u16::from(first) << 8 | u16::from(second),
                width: 2,
            })
        } else {
            Ok(Header {
                value: first.into(),
                width: 1,
            })
        }
    }

    /// Consume the next header and enter the data phase.
    ///
    /// With `skip_padding`, zero-valued headers are consumed and skipped as
    /// no-op filler before the loop settles on a real header. Called in the
    /// data phase this returns the cached header and consumes nothing.
    pub fn read_header(&mut self, skip_padding: bool) -> Result<Header, DecodeError> {
        if let State::AwaitingData(header) = self.state {
            return Ok(header);
        }

        loop {
            let header = self.peek_header()?;
            debug_assert!(header.width >= 1 && header.width <= 2);
            self.buf.consume(header.width as usize);

            if header.value == 0 && skip_padding {
                continue;
            }

            self.state = State::AwaitingData(header);
            return Ok(header);
        }
    }

    /// Payload length in bytes of the in-flight packet.
    ///
    /// Fails with `AwaitingHeader` outside the data phase, and with
    /// `NeedMoreInput` when the window holds fewer bytes than the header
    /// declares, which a refill can still satisfy.
    pub fn data_len(&self) -> Result<usize, DecodeError> {
        let State::AwaitingData(header) = self.state else {
            debug!("not in data phase");
            fail_point!();
            return Err(DecodeError::AwaitingHeader);
        };

        let len = headers::payload_len(header.value);
        if len > self.buf.remaining() {
            debug!(
                "payload needs {len} bytes, {} buffered",
                self.buf.remaining()
            );
            return Err(DecodeError::NeedMoreInput);
        }

        Ok(len)
    }

    /// Consume the in-flight packet's payload and return to the header
    /// phase. The value is read little-endian and zero-padded to 64 bits.
    /// Consumes nothing on failure.
    pub fn read_data(&mut self) -> Result<(u64, usize), DecodeError> {
        let len = self.data_len()?;

        let mut word = [0u8; 8];
        word[..len].copy_from_slice(&self.buf.unread()[..len]);
        self.buf.consume(len);
        self.state = State::AwaitingHeader;

        Ok((u64::from_le_bytes(word), len))
    }

    /// Consume the in-flight packet's payload without materializing the
    /// value. Advances identically to [`read_data`].
    ///
    /// [`read_data`]: DecodeContext::read_data
    pub fn skip(&mut self) -> Result<(), DecodeError> {
        let len = self.data_len()?;
        self.buf.consume(len);
        self.state = State::AwaitingHeader;
        Ok(())
    }

    /// Decode one packet: header, payload, classification.
    ///
    /// Returns `None` exactly when no packet can be completed from the
    /// buffered window; feed more bytes and call again to resume. Decode
    /// state persists across the `None`, including a consumed-but-unpaid
    /// header.
    pub fn decode_next(&mut self, skip_padding: bool) -> Option<Packet> {
        let Ok(header) = self.read_header(skip_padding) else {
            debug!("no packet header buffered");
            return None;
        };

        let Ok((data, _)) = self.read_data() else {
            debug!("packet payload not fully buffered");
            return None;
        };

        Some(Packet {
            kind: classify(header.value, header.width),
            header: header.value,
            header_width: header.width,
            data,
        })
    }
}

impl Default for DecodeContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
