/*!
Character sources.

All offsets are absolute char (not byte) offsets from the start of the input. A source returns `None` for any offset at or past the end of input; that sentinel is how the matcher detects end of input.

- [`StrSource`]: a `&str`. ASCII haystacks are indexed directly, others are decoded once.
- `&[char]`: already decoded chars.
- [`ReaderSource`]: any [`io::Read`], decoded incrementally as UTF-8. Input before the last [`advance()`](CharSource::advance) point is released, so enumerating the matches of a large stream only keeps the current match in memory.
*/
use std::{collections::VecDeque, io, ops::Range};

use tracing::warn;

/// An indexable character sequence.
pub trait CharSource {
    /// The char at the absolute `index`, or `None` at or past the end of input.
    ///
    /// Takes `&mut self` because streaming sources read on demand.
    fn char_at(&mut self, index: usize) -> Option<char>;

    /// The caller will not access offsets before `index - 1` any more.
    ///
    /// The char before `index` is still needed by anchors and word boundaries.
    #[inline]
    fn advance(&mut self, index: usize) {
        _ = index;
    }
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    #[inline]
    fn char_at(&mut self, index: usize) -> Option<char> {
        (**self).char_at(index)
    }

    #[inline]
    fn advance(&mut self, index: usize) {
        (**self).advance(index)
    }
}

impl CharSource for &[char] {
    #[inline]
    fn char_at(&mut self, index: usize) -> Option<char> {
        self.get(index).copied()
    }
}

/// A `&str` haystack.
///
/// ```
/// use ib_regexp::matcher::input::{CharSource, StrSource};
///
/// let mut s = StrSource::new("añb");
/// assert_eq!(s.char_at(1), Some('ñ'));
/// assert_eq!(s.char_at(3), None);
/// assert_eq!(s.byte_offset(2), 3);
/// assert_eq!(s.slice(1..3), "ñb");
/// ```
#[derive(Clone, Debug)]
pub struct StrSource<'h> {
    haystack: &'h str,
    /// `None` if the haystack is ASCII.
    chars: Option<Vec<(usize, char)>>,
}

impl<'h> StrSource<'h> {
    pub fn new(haystack: &'h str) -> Self {
        let chars = if ib_unicode::ascii::is_ascii(haystack) {
            None
        } else {
            Some(haystack.char_indices().collect())
        };
        Self { haystack, chars }
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        match &self.chars {
            None => self.haystack.len(),
            Some(chars) => chars.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.haystack.is_empty()
    }

    pub fn haystack(&self) -> &'h str {
        self.haystack
    }

    /// Converts a char offset into a byte offset. Offsets at or past the end map to the haystack length.
    pub fn byte_offset(&self, index: usize) -> usize {
        match &self.chars {
            None => index.min(self.haystack.len()),
            Some(chars) => chars
                .get(index)
                .map(|&(i, _)| i)
                .unwrap_or(self.haystack.len()),
        }
    }

    /// The text between two char offsets.
    pub fn slice(&self, range: Range<usize>) -> &'h str {
        &self.haystack[self.byte_offset(range.start)..self.byte_offset(range.end)]
    }
}

impl<'h> From<&'h str> for StrSource<'h> {
    #[inline]
    fn from(haystack: &'h str) -> Self {
        Self::new(haystack)
    }
}

impl CharSource for StrSource<'_> {
    #[inline]
    fn char_at(&mut self, index: usize) -> Option<char> {
        match &self.chars {
            None => self.haystack.as_bytes().get(index).map(|&b| b as char),
            Some(chars) => chars.get(index).map(|&(_, c)| c),
        }
    }
}

const READ_CHUNK: usize = 8 * 1024;

/// A streaming source over any [`io::Read`], decoded as UTF-8.
///
/// Invalid byte sequences decode to U+FFFD. An I/O error other than [`io::ErrorKind::Interrupted`] ends the input; it is kept and can be retrieved with [`take_error()`](Self::take_error).
///
/// ```
/// use ib_regexp::{matcher::input::ReaderSource, Regex};
///
/// let re = Regex::new(r"\d+").unwrap();
/// let mut source = ReaderSource::new("a1b22c333".as_bytes());
/// let found: Vec<_> = re.find_iter(&mut source).map(|m| m.range()).collect();
/// assert_eq!(found, [1..2, 3..5, 6..9]);
/// assert!(source.take_error().is_none());
/// ```
///
/// ## Panics
/// Accessing an offset that was already released by [`advance()`](CharSource::advance) panics. The matcher never does that.
pub struct ReaderSource<R> {
    reader: R,
    buf: VecDeque<char>,
    /// Absolute offset of `buf[0]`.
    base: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    eof: bool,
    error: Option<io::Error>,
}

impl<R: io::Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: VecDeque::new(),
            base: 0,
            pending: Vec::new(),
            eof: false,
            error: None,
        }
    }

    /// The I/O error that ended the input, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Number of chars currently held in memory.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    if !self.pending.is_empty() {
                        self.pending.clear();
                        self.buf.push_back(char::REPLACEMENT_CHARACTER);
                    }
                    self.eof = true;
                }
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    self.decode();
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, offset = self.base + self.buf.len(), "read failed, ending input");
                    self.error = Some(e);
                    self.eof = true;
                }
            }
            return;
        }
    }

    fn decode(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    self.buf.extend(s.chars());
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    // SAFETY: validated by `from_utf8`
                    let s = unsafe { std::str::from_utf8_unchecked(&self.pending[..valid]) };
                    self.buf.extend(s.chars());
                    match e.error_len() {
                        Some(len) => {
                            self.buf.push_back(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }
}

impl<R: io::Read> CharSource for ReaderSource<R> {
    fn char_at(&mut self, index: usize) -> Option<char> {
        assert!(
            index >= self.base,
            "offset {index} was released, the source is at {}",
            self.base
        );
        while index >= self.base + self.buf.len() && !self.eof {
            self.fill();
        }
        self.buf.get(index - self.base).copied()
    }

    fn advance(&mut self, index: usize) {
        let keep = index.saturating_sub(1);
        while self.base < keep && !self.buf.is_empty() {
            self.buf.pop_front();
            self.base += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Chunked<'a> {
        chunks: Vec<&'a [u8]>,
    }

    impl io::Read for Chunked<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    struct Failing;

    impl io::Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn str_source() {
        let mut s = StrSource::new("abc");
        assert_eq!(s.len(), 3);
        assert_eq!(s.char_at(0), Some('a'));
        assert_eq!(s.char_at(3), None);
        assert_eq!(s.byte_offset(3), 3);

        let mut s = StrSource::new("δx😀");
        assert_eq!(s.len(), 3);
        assert_eq!(s.char_at(2), Some('😀'));
        assert_eq!(s.char_at(3), None);
        assert_eq!(s.byte_offset(1), 2);
        assert_eq!(s.byte_offset(2), 3);
        assert_eq!(s.byte_offset(9), 7);
    }

    #[test]
    fn slice_source() {
        let chars = ['x', 'y'];
        let mut s = &chars[..];
        assert_eq!(s.char_at(1), Some('y'));
        assert_eq!(s.char_at(2), None);
    }

    #[test]
    fn reader_split_utf8() {
        let bytes = "aδ😀".as_bytes();
        let mut s = ReaderSource::new(Chunked {
            chunks: vec![&bytes[..2], &bytes[2..4], &bytes[4..]],
        });
        assert_eq!(s.char_at(0), Some('a'));
        assert_eq!(s.char_at(1), Some('δ'));
        assert_eq!(s.char_at(2), Some('😀'));
        assert_eq!(s.char_at(3), None);
        assert!(s.take_error().is_none());
    }

    #[test]
    fn reader_invalid_utf8() {
        let mut s = ReaderSource::new(Chunked {
            chunks: vec![b"a\xffb", b"\xe2\x82"],
        });
        assert_eq!(s.char_at(0), Some('a'));
        assert_eq!(s.char_at(1), Some(char::REPLACEMENT_CHARACTER));
        assert_eq!(s.char_at(2), Some('b'));
        // truncated sequence at end of input
        assert_eq!(s.char_at(3), Some(char::REPLACEMENT_CHARACTER));
        assert_eq!(s.char_at(4), None);
    }

    #[test]
    fn reader_advance() {
        let mut s = ReaderSource::new("abcdef".as_bytes());
        assert_eq!(s.char_at(5), Some('f'));
        s.advance(4);
        assert_eq!(s.buffered(), 3);
        assert_eq!(s.char_at(3), Some('d'));
        assert_eq!(s.char_at(4), Some('e'));
    }

    #[test]
    #[should_panic(expected = "was released")]
    fn reader_released() {
        let mut s = ReaderSource::new("abcdef".as_bytes());
        s.char_at(5);
        s.advance(4);
        s.char_at(1);
    }

    #[test]
    fn reader_error() {
        let mut s = ReaderSource::new(Failing);
        assert_eq!(s.char_at(0), None);
        let e = s.take_error().unwrap();
        assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
    }
}
