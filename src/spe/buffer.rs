// Streaming input window.
//
// `StreamBuffer` holds the undecoded bytes between feeds. The window is
// either borrowed from the caller (zero-copy) or owned, and the feed policy
// keeps allocation off the common path: a single large borrowed buffer
// consumed front to back never copies at all, while small appended chunks
// coalesce into one owned buffer.

use log::trace;

/// Current window storage.
enum Window<'a> {
    Empty,
    /// Caller-owned bytes. Valid for `'a`; `into_owned` ends the aliasing.
    Borrowed(&'a [u8]),
    /// Heap-allocated bytes, freely growable.
    Owned(Vec<u8>),
}

/// A byte window with a read cursor.
///
/// Invariant: the cursor never passes the end of the window.
pub struct StreamBuffer<'a> {
    win: Window<'a>,
    off: usize,
}

impl<'a> StreamBuffer<'a> {
    pub const fn new() -> Self {
        StreamBuffer {
            win: Window::Empty,
            off: 0,
        }
    }

    fn window(&self) -> &[u8] {
        match &self.win {
            Window::Empty => &[],
            Window::Borrowed(data) => data,
            Window::Owned(buf) => buf,
        }
    }

    /// Unconsumed bytes.
    pub(crate) fn unread(&self) -> &[u8] {
        let window = self.window();
        debug_assert!(self.off <= window.len());
        &window[self.off..]
    }

    /// Number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.unread().len()
    }

    /// Advance the read cursor by `n` bytes.
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.off += n;
    }

    /// Append bytes, borrowing the caller's buffer when possible.
    ///
    /// The zero-copy path applies when the current window is fully consumed:
    /// the new buffer is referenced directly and must stay valid until it is
    /// consumed or the buffer is converted with [`into_owned`].
    ///
    /// [`into_owned`]: StreamBuffer::into_owned
    pub fn feed(&mut self, data: &'a [u8]) {
        self.drop_exhausted();

        match &mut self.win {
            Window::Empty => {
                trace!("borrow caller buffer ({} bytes)", data.len());
                self.win = Window::Borrowed(data);
                self.off = 0;
            }
            Window::Owned(buf) if self.off == 0 => {
                trace!("grow owned buffer in place ({} bytes)", data.len());
                buf.extend_from_slice(data);
            }
            _ => self.merge(data),
        }
    }

    /// Append bytes, always copying. Use when the caller's buffer may change
    /// or go away after this call returns.
    pub fn feed_copied(&mut self, data: &[u8]) {
        // A fully consumed owned window is reused rather than reallocated.
        if self.remaining() == 0 && let Window::Owned(buf) = &mut self.win {
            trace!("reuse owned buffer ({} bytes)", data.len());
            buf.clear();
            buf.extend_from_slice(data);
            self.off = 0;
            return;
        }
        self.drop_exhausted();

        match &mut self.win {
            Window::Empty => {
                trace!("copy into new buffer ({} bytes)", data.len());
                self.win = Window::Owned(data.to_vec());
                self.off = 0;
            }
            Window::Owned(buf) if self.off == 0 => {
                trace!("grow owned buffer in place ({} bytes)", data.len());
                buf.extend_from_slice(data);
            }
            _ => self.merge(data),
        }
    }

    /// Copy any unconsumed tail into owned storage, ending all aliasing of
    /// caller memory. The returned buffer no longer carries the caller's
    /// lifetime, so the original bytes may be freed or rewritten.
    pub fn into_owned(self) -> StreamBuffer<'static> {
        match self.win {
            Window::Empty => StreamBuffer::new(),
            Window::Owned(buf) => StreamBuffer {
                win: Window::Owned(buf),
                off: self.off,
            },
            Window::Borrowed(data) => {
                let tail = &data[self.off..];
                if tail.is_empty() {
                    trace!("release borrowed buffer, nothing unread");
                    StreamBuffer::new()
                } else {
                    trace!("release borrowed buffer, copying {} byte tail", tail.len());
                    StreamBuffer {
                        win: Window::Owned(tail.to_vec()),
                        off: 0,
                    }
                }
            }
        }
    }

    /// Drop the window if every byte has been consumed.
    fn drop_exhausted(&mut self) {
        if self.remaining() == 0 && !matches!(self.win, Window::Empty) {
            trace!("release exhausted window");
            self.win = Window::Empty;
            self.off = 0;
        }
    }

    /// Coalesce the unconsumed tail and the new bytes into one owned window.
    /// Used when the window is borrowed or partially consumed.
    fn merge(&mut self, data: &[u8]) {
        let tail = self.unread();
        trace!(
            "coalesce {} byte tail with {} new bytes",
            tail.len(),
            data.len()
        );
        let mut buf = Vec::with_capacity(tail.len() + data.len());
        buf.extend_from_slice(tail);
        buf.extend_from_slice(data);
        self.win = Window::Owned(buf);
        self.off = 0;
    }

    #[cfg(test)]
    fn is_borrowed(&self) -> bool {
        matches!(self.win, Window::Borrowed(_))
    }
}

impl Default for StreamBuffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_borrows_without_copying() {
        let data = vec![1u8, 2, 3, 4];
        let mut buf = StreamBuffer::new();
        buf.feed(&data);
        assert!(buf.is_borrowed());
        // The window is the caller's memory, not a copy.
        assert_eq!(buf.unread().as_ptr(), data.as_ptr());
        assert_eq!(buf.remaining(), 4);
    }

    #[test]
    fn feed_copied_owns() {
        let data = vec![1u8, 2, 3];
        let mut buf = StreamBuffer::new();
        buf.feed_copied(&data);
        assert!(!buf.is_borrowed());
        assert_ne!(buf.unread().as_ptr(), data.as_ptr());
        assert_eq!(buf.unread(), &[1, 2, 3]);
    }

    #[test]
    fn exhausted_window_is_replaced_by_next_feed() {
        let first = [1u8, 2];
        let second = [3u8, 4];
        let mut buf = StreamBuffer::new();
        buf.feed(&first);
        buf.consume(2);
        buf.feed(&second);
        assert_eq!(buf.unread(), &[3, 4]);
        assert_eq!(buf.unread().as_ptr(), second.as_ptr());
    }

    #[test]
    fn owned_unconsumed_grows_in_place() {
        let mut buf = StreamBuffer::new();
        buf.feed_copied(&[1, 2]);
        buf.feed_copied(&[3, 4]);
        assert_eq!(buf.unread(), &[1, 2, 3, 4]);
    }

    #[test]
    fn partially_consumed_owned_coalesces() {
        let mut buf = StreamBuffer::new();
        buf.feed_copied(&[1, 2, 3]);
        buf.consume(2);
        buf.feed_copied(&[4, 5]);
        assert_eq!(buf.unread(), &[3, 4, 5]);
        assert_eq!(buf.remaining(), 3);
    }

    #[test]
    fn borrowed_with_tail_coalesces_on_feed() {
        let first = [1u8, 2, 3];
        let second = [4u8, 5];
        let mut buf = StreamBuffer::new();
        buf.feed(&first);
        buf.consume(1);
        buf.feed(&second);
        assert!(!buf.is_borrowed());
        assert_eq!(buf.unread(), &[2, 3, 4, 5]);
    }

    #[test]
    fn into_owned_copies_borrowed_tail() {
        let data = vec![1u8, 2, 3, 4];
        let mut buf = StreamBuffer::new();
        buf.feed(&data);
        buf.consume(1);
        let buf = buf.into_owned();
        drop(data);
        assert_eq!(buf.unread(), &[2, 3, 4]);
    }

    #[test]
    fn into_owned_on_drained_borrow_is_empty() {
        let data = [1u8, 2];
        let mut buf = StreamBuffer::new();
        buf.feed(&data);
        buf.consume(2);
        let buf = buf.into_owned();
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn into_owned_keeps_owned_window_and_cursor() {
        let mut buf = StreamBuffer::new();
        buf.feed_copied(&[1, 2, 3]);
        buf.consume(1);
        let buf = buf.into_owned();
        assert_eq!(buf.unread(), &[2, 3]);
    }

    #[test]
    fn feed_after_into_owned_can_borrow_again() {
        let first = vec![1u8];
        let mut buf = StreamBuffer::new();
        buf.feed(&first);
        buf.consume(1);
        let mut buf = buf.into_owned();
        drop(first);

        let second = vec![2u8, 3];
        buf.feed(&second);
        assert_eq!(buf.unread(), &[2, 3]);
    }
}
