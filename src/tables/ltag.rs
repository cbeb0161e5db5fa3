// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6ltag.html

use ttf_parser::parser::{FromData, LazyArray32, Stream};

use crate::Language;


#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    data: &'a [u8], // The whole table.
    ranges: LazyArray32<'a, TagRange>,
}

impl<'a> Table<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);

        let version: u32 = s.read()?;
        if version != 1 {
            return None;
        }

        s.skip::<u32>(); // flags
        let count: u32 = s.read()?;
        let ranges = s.read_array32(count)?;

        Some(Table {
            data,
            ranges,
        })
    }

    pub fn len(&self) -> u32 {
        self.ranges.len()
    }

    /// Returns the raw language tag string at `index`.
    pub fn tag(&self, index: u32) -> Option<&'a str> {
        let range = self.ranges.get(index)?;
        let start = usize::from(range.offset);
        let end = start + usize::from(range.length);
        core::str::from_utf8(self.data.get(start..end)?).ok()
    }

    pub fn language(&self, index: u32) -> Option<Language> {
        self.tag(index)?.parse().ok()
    }
}


#[derive(Clone, Copy, Debug)]
struct TagRange {
    offset: u16,
    length: u16,
}

impl FromData for TagRange {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(TagRange {
            offset: s.read()?,
            length: s.read()?,
        })
    }
}
