use ttf_parser::parser::*;

pub mod aat;
pub mod ankr;
pub mod feat;
pub mod kerx;
pub mod ltag;
pub mod morx;
pub mod trak;

#[cfg(test)]
pub(crate) mod test_utils;

trait StreamExt<'a> {
    fn read_dyn_array(&mut self, count: usize, stride: usize) -> Option<DynArray<'a>>;
    fn read_at_offset32(&mut self, data: &'a [u8]) -> Option<&'a [u8]>;
}

impl<'a> StreamExt<'a> for Stream<'a> {
    #[inline]
    fn read_dyn_array(&mut self, count: usize, stride: usize) -> Option<DynArray<'a>> {
        let len = count.checked_mul(stride)?;
        self.read_bytes(len).map(|data| DynArray::new(data, stride))
    }

    #[inline]
    fn read_at_offset32(&mut self, data: &'a [u8]) -> Option<&'a [u8]> {
        let offset = self.read::<Offset32>()?.to_usize();
        data.get(offset..)
    }
}

/// A slice-like container with runtime-defined stride.
///
/// AAT binary search tables declare their own unit size, which may be
/// larger than the record we actually read.
#[derive(Clone, Copy, Debug)]
pub struct DynArray<'a> {
    data: &'a [u8],
    stride: usize,
}

impl<'a> DynArray<'a> {
    #[inline]
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        let start = index.checked_mul(self.stride)?;
        let end = start.checked_add(self.stride)?;
        self.data.get(start..end)
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.stride == 0 {
            return 0;
        }

        self.data.len() / self.stride
    }

    /// Returns a copy limited to the first `len` items.
    #[inline]
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.min(self.len()) * self.stride;
        DynArray::new(&self.data[..len], self.stride)
    }

    #[inline]
    pub fn binary_search_by<F>(&self, mut f: F) -> Option<(usize, &'a [u8])>
        where F: FnMut(&[u8]) -> core::cmp::Ordering
    {
        // Based on Rust std implementation.

        use core::cmp::Ordering;

        let mut size = self.len();
        if size == 0 {
            return None;
        }

        let mut base = 0;
        while size > 1 {
            let half = size / 2;
            let mid = base + half;
            // mid is always in [0, size), that means mid is >= 0 and < size.
            // mid >= 0: by definition
            // mid < size: mid = size / 2 + size / 4 + size / 8 ...
            let cmp = f(self.get(mid)?);
            base = if cmp == Ordering::Greater { base } else { mid };
            size -= half;
        }

        // base is always in [0, size) because base <= mid.
        let value = self.get(base)?;
        if f(value) == Ordering::Equal { Some((base, value)) } else { None }
    }
}
