//! ## ankare-core::collections::string
//! **UTF-8 string buffer on [`ContiguousBuffer`]**

use std::fmt;
use std::mem::MaybeUninit;
use std::ops::Deref;

use crate::alloc::allocator::{Global, RawAllocator};
use crate::alloc::storage::{FixedStorage, HeapStorage, Storage};
use crate::collections::vec::ContiguousBuffer;
use crate::error::{AllocError, Result};

/// Owned UTF-8 text in fixed or growable storage.
pub struct StringBuffer<S: Storage<u8>> {
    bytes: ContiguousBuffer<u8, S>,
}

pub type FixedString<'a> = StringBuffer<FixedStorage<'a, u8>>;
pub type GrowableString<A = Global> = StringBuffer<HeapStorage<u8, A>>;

impl<'a> StringBuffer<FixedStorage<'a, u8>> {
    pub fn fixed(block: &'a mut [MaybeUninit<u8>]) -> Self {
        Self::new(FixedStorage::new(block))
    }
}

impl StringBuffer<HeapStorage<u8, Global>> {
    pub fn growable() -> Self {
        Self::new(HeapStorage::new())
    }
}

impl<A: RawAllocator> StringBuffer<HeapStorage<u8, A>> {
    pub fn growable_in(alloc: A) -> Self {
        Self::new(HeapStorage::new_in(alloc))
    }
}

impl<S: Storage<u8>> StringBuffer<S> {
    pub fn new(store: S) -> Self {
        Self {
            bytes: ContiguousBuffer::new(store),
        }
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: only whole `str`s and encoded `char`s are ever appended,
        // and truncation is checked against char boundaries.
        unsafe { std::str::from_utf8_unchecked(self.bytes.as_slice()) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn is_fixed(&self) -> bool {
        self.bytes.is_fixed()
    }

    pub fn push(&mut self, ch: char) -> Result<()> {
        let mut utf8 = [0; 4];
        self.push_str(ch.encode_utf8(&mut utf8))
    }

    /// Appends `s` whole, or nothing at all.
    pub fn push_str(&mut self, s: &str) -> Result<()> {
        self.bytes.extend_from_slice(s.as_bytes())
    }

    pub fn pop(&mut self) -> Option<char> {
        let ch = self.as_str().chars().next_back()?;
        self.bytes.truncate(self.len() - ch.len_utf8());
        Some(ch)
    }

    /// Shortens to `len` bytes; `len` must fall on a char boundary.
    pub fn truncate(&mut self, len: usize) -> Result<()> {
        if !self.as_str().is_char_boundary(len) && len < self.len() {
            return Err(AllocError::InvalidArgument(
                "truncation point is not a char boundary",
            ));
        }
        self.bytes.truncate(len);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.bytes.reserve(additional)
    }

    pub fn shrink_to_fit(&mut self) -> Result<()> {
        self.bytes.shrink_to_fit()
    }

    /// Replaces the contents with `s`; a fixed buffer too small for it keeps
    /// its contents.
    pub fn assign(&mut self, s: &str) -> Result<()> {
        self.bytes.assign_from_slice(s.as_bytes())
    }
}

impl<S: Storage<u8>> Deref for StringBuffer<S> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<S: Storage<u8>> fmt::Display for StringBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<S: Storage<u8>> fmt::Debug for StringBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// Lets `write!` format into the buffer; running out of room is `fmt::Error`.
impl<S: Storage<u8>> fmt::Write for StringBuffer<S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s).map_err(|_| fmt::Error)
    }
}

impl<S: Storage<u8>> PartialEq<str> for StringBuffer<S> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<S: Storage<u8>> PartialEq<&str> for StringBuffer<S> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::storage::uninit_block;
    use std::fmt::Write;

    #[test]
    fn fixed_string_is_all_or_nothing() {
        let mut block = uninit_block::<u8, 8>();
        let mut s = StringBuffer::fixed(&mut block);
        s.push_str("ankare").unwrap();
        assert!(s.push_str("!!!").unwrap_err().is_capacity_exceeded());
        assert_eq!(s, "ankare");
        s.push('ö').unwrap();
        assert_eq!(s.len(), 8);
        assert!(s.push('x').is_err());
    }

    #[test]
    fn pop_and_truncate_respect_chars() {
        let mut s = GrowableString::growable();
        s.push_str("häj").unwrap();
        assert_eq!(s.pop(), Some('j'));
        assert!(matches!(
            s.truncate(2),
            Err(AllocError::InvalidArgument(_))
        ));
        s.truncate(1).unwrap();
        assert_eq!(s.as_str(), "h");
        assert!(s.truncate(10).is_ok());
    }

    #[test]
    fn write_macro_and_display() {
        let mut s = GrowableString::growable();
        write!(s, "{}-{}", 4, "two").unwrap();
        assert_eq!(s.to_string(), "4-two");
        assert_eq!(format!("{s:?}"), "\"4-two\"");

        let mut block = uninit_block::<u8, 2>();
        let mut small = StringBuffer::fixed(&mut block);
        assert!(write!(small, "{}", 123).is_err());
    }
}
