// src/string.rs
//! UTF-8 string buffer optimized for short lexemes.
//!
//! External scanners use it to remember things like heredoc delimiters. The
//! only mutation is appending one codepoint at a time. Up to
//! [`INLINE_CAPACITY`] bytes live inline; the first push that needs more
//! moves the bytes to a heap block, and the string stays on the heap from
//! then on. Heap capacity doubles on every growth.

use std::fmt;

/// Bytes stored without touching the allocator.
pub const INLINE_CAPACITY: usize = 12;

#[derive(Clone)]
enum Storage {
    Inline {
        bytes: [u8; INLINE_CAPACITY],
        len: u8,
    },
    // capacity == buf.len()
    Heap { buf: Box<[u8]>, len: usize },
}

#[derive(Clone)]
pub struct CompactString {
    storage: Storage,
}

impl CompactString {
    /// Empty inline string; never allocates.
    pub const fn new() -> Self {
        Self {
            storage: Storage::Inline {
                bytes: [0; INLINE_CAPACITY],
                len: 0,
            },
        }
    }

    /// Copies `bytes`. Short inputs stay inline, longer ones get a heap block
    /// of exactly `bytes.len()`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() <= INLINE_CAPACITY {
            let mut inline = [0u8; INLINE_CAPACITY];
            inline[..bytes.len()].copy_from_slice(bytes);
            Self {
                storage: Storage::Inline {
                    bytes: inline,
                    len: bytes.len() as u8,
                },
            }
        } else {
            Self {
                storage: Storage::Heap {
                    buf: bytes.into(),
                    len: bytes.len(),
                },
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Inline { len, .. } => *len as usize,
            Storage::Heap { len, .. } => *len,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Inline { .. } => INLINE_CAPACITY,
            Storage::Heap { buf, .. } => buf.len(),
        }
    }

    /// True while no heap block has been allocated.
    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self.storage, Storage::Inline { .. })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Inline { bytes, len } => &bytes[..*len as usize],
            Storage::Heap { buf, len } => &buf[..*len],
        }
    }

    /// `None` when the buffer was built from bytes that are not UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// Appends one Unicode scalar value as 1 to 4 UTF-8 bytes.
    pub fn push(&mut self, c: char) {
        let mut enc = [0u8; 4];
        let encoded = c.encode_utf8(&mut enc).as_bytes();
        let len = self.len();
        let needed = len + encoded.len();

        if needed > self.capacity() {
            self.grow(needed);
        }

        match &mut self.storage {
            Storage::Inline { bytes, len: l } => {
                bytes[len..needed].copy_from_slice(encoded);
                *l = needed as u8;
            }
            Storage::Heap { buf, len: l } => {
                buf[len..needed].copy_from_slice(encoded);
                *l = needed;
            }
        }
    }

    fn grow(&mut self, needed: usize) {
        let capacity = (self.capacity() * 2).max(needed);
        let mut buf = vec![0u8; capacity].into_boxed_slice();
        let len = self.len();
        buf[..len].copy_from_slice(self.as_bytes());
        if self.is_inline() {
            log::trace!("compact string spilled to heap: {len} -> {capacity} bytes");
        }
        self.storage = Storage::Heap { buf, len };
    }

    /// Decodes the codepoint starting at byte `index`.
    ///
    /// Returns the character and the offset just past it, or `None` once
    /// `index` reaches the end. Bytes are assumed to be well-formed UTF-8 as
    /// produced by [`push`](Self::push); anything else decodes to U+FFFD
    /// without reading out of bounds.
    pub fn char_at(&self, index: usize) -> Option<(char, usize)> {
        let bytes = self.as_bytes();
        let lead = *bytes.get(index)?;
        let cont = |k: usize| bytes.get(index + k).map_or(0, |b| (b & 0x3f) as u32);

        let (code, width) = if lead < 0x80 {
            (lead as u32, 1)
        } else if lead < 0xe0 {
            (((lead & 0x1f) as u32) << 6 | cont(1), 2)
        } else if lead < 0xf0 {
            (((lead & 0x0f) as u32) << 12 | cont(1) << 6 | cont(2), 3)
        } else {
            (
                ((lead & 0x07) as u32) << 18 | cont(1) << 12 | cont(2) << 6 | cont(3),
                4,
            )
        };

        let c = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
        Some((c, (index + width).min(bytes.len())))
    }

    pub fn chars(&self) -> Chars<'_> {
        Chars {
            string: self,
            index: 0,
        }
    }
}

impl Default for CompactString {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CompactString {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for CompactString {}

impl std::hash::Hash for CompactString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl From<&str> for CompactString {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl Extend<char> for CompactString {
    fn extend<I: IntoIterator<Item = char>>(&mut self, iter: I) {
        for c in iter {
            self.push(c);
        }
    }
}

impl FromIterator<char> for CompactString {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        let mut s = Self::new();
        s.extend(iter);
        s
    }
}

impl fmt::Debug for CompactString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Display for CompactString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Iterator over the codepoints of a [`CompactString`], built on `char_at`.
pub struct Chars<'a> {
    string: &'a CompactString,
    index: usize,
}

impl Iterator for Chars<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let (c, next) = self.string.char_at(self.index)?;
        self.index = next;
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spill_keeps_prefix() {
        let mut s = CompactString::new();
        for c in "abcdefghijkl".chars() {
            s.push(c);
        }
        assert!(s.is_inline());
        assert_eq!(s.capacity(), INLINE_CAPACITY);

        s.push('m');
        assert!(!s.is_inline());
        assert_eq!(s.capacity(), 2 * INLINE_CAPACITY);
        assert_eq!(s.as_bytes(), b"abcdefghijklm");
    }

    #[test]
    fn heap_capacity_doubles_from_exact_allocation() {
        let mut s = CompactString::from_bytes(b"0123456789abcd");
        assert_eq!(s.capacity(), 14);
        s.push('e');
        assert_eq!(s.capacity(), 28);
        assert_eq!(s.len(), 15);
    }

    #[test]
    fn truncated_sequence_stays_in_bounds() {
        // surrogate lead, third byte missing
        let s = CompactString::from_bytes(&[b'a', 0xed, 0xa0]);
        assert_eq!(s.char_at(1), Some((char::REPLACEMENT_CHARACTER, 3)));
        assert_eq!(s.char_at(3), None);

        let s = CompactString::from_bytes(&[0xe4]);
        assert_eq!(s.char_at(0).map(|(_, next)| next), Some(1));
    }
}
