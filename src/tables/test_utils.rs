//! Small utilities used in tests.

use alloc::vec::Vec;

pub trait BeScalar: Copy {
    fn write_be(self, out: &mut Vec<u8>);
}

macro_rules! impl_be_scalar {
    ($($t:ty),+) => {
        $(
            impl BeScalar for $t {
                fn write_be(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_be_bytes());
                }
            }
        )+
    };
}

impl_be_scalar!(u8, i8, u16, i16, u32, i32);

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer {
    data: Vec<u8>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// The current length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl BeScalar) -> Self {
        item.write_be(&mut self.data);
        self
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: BeScalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            item.write_be(&mut self.data);
        }
        self
    }

    /// Appends raw bytes.
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.data.extend_from_slice(data);
        self
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl core::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// A format 6 (single table) lookup with 16-bit values, terminator included.
pub fn single_lookup(pairs: &[(u16, u16)]) -> BeBuffer {
    let mut b = BeBuffer::new()
        .push(6u16)
        .push(4u16) // unitSize
        .push(pairs.len() as u16 + 1)
        .extend([0u16; 3]);

    for &(glyph, value) in pairs {
        b = b.push(glyph).push(value);
    }

    b.push(0xFFFFu16).push(0u16)
}

/// A format 2 (segment single) lookup with 16-bit values, terminator included.
pub fn segment_lookup(segments: &[(u16, u16, u16)]) -> BeBuffer {
    let mut b = BeBuffer::new()
        .push(2u16)
        .push(6u16) // unitSize
        .push(segments.len() as u16 + 1)
        .extend([0u16; 3]);

    for &(last, first, value) in segments {
        b = b.push(last).push(first).push(value);
    }

    b.push(0xFFFFu16).push(0xFFFFu16).push(0u16)
}

/// An extended state table with five classes: glyphs 1-9 get class 4,
/// everything else is out of bounds.
///
/// `extra` holds the subtable-specific offsets that follow the state table
/// header. They can be patched later, see [`patch_offset`].
pub fn state_table(states: &[u16], entries: &[u16], extra: &[u32]) -> BeBuffer {
    let classes = segment_lookup(&[(9, 1, 4)]);
    let header_len = 16 + 4 * extra.len() as u32;
    let states_offset = header_len + classes.len() as u32;
    let entries_offset = states_offset + 2 * states.len() as u32;
    BeBuffer::new()
        .push(5u32)
        .push(header_len)
        .push(states_offset)
        .push(entries_offset)
        .extend(extra.iter().copied())
        .bytes(&classes)
        .extend(states.iter().copied())
        .extend(entries.iter().copied())
}

/// Overwrites the `index`-th offset following the state table header.
pub fn patch_offset(data: BeBuffer, index: usize, offset: u32) -> BeBuffer {
    let mut data = data.into_vec();
    let pos = 16 + index * 4;
    data[pos..pos + 4].copy_from_slice(&offset.to_be_bytes());
    BeBuffer::new().bytes(&data)
}
