// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6ankr.html

use ttf_parser::parser::{FromData, Offset, Offset32, Stream};

use super::aat;

#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    data: &'a [u8], // The whole table.
    lookup: aat::Lookup<'a>,
    anchor_data_offset: usize,
    number_of_glyphs: u32,
}

impl<'a> Table<'a> {
    pub fn parse(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        let mut s = Stream::new(data);

        let version: u16 = s.read()?;
        if version != 0 {
            return None;
        }

        s.skip::<u16>(); // flags
        let lookup_table_offset: Offset32 = s.read()?;
        let anchor_data_offset: Offset32 = s.read()?;

        Some(Table {
            data,
            lookup: aat::Lookup::parse(data.get(lookup_table_offset.to_usize()..)?)?,
            anchor_data_offset: anchor_data_offset.to_usize(),
            number_of_glyphs,
        })
    }

    /// The end of the table data.
    #[inline]
    pub fn end(&self) -> usize {
        self.data.len()
    }

    /// Returns anchor point `idx` of a glyph.
    ///
    /// Nothing past `end` is read.
    pub fn anchor(&self, glyph_id: u16, idx: u16, end: usize) -> Option<Anchor> {
        let offset = self.lookup.value16(glyph_id, self.number_of_glyphs)?;
        let data = self.data.get(..end)?;

        let mut s = Stream::new_at(data, self.anchor_data_offset + usize::from(offset))?;
        let number_of_points: u32 = s.read()?;
        let points = s.read_array32::<Anchor>(number_of_points)?;
        points.get(u32::from(idx))
    }
}


#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Anchor {
    pub x: i16,
    pub y: i16,
}

impl FromData for Anchor {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(Anchor {
            x: s.read()?,
            y: s.read()?,
        })
    }
}
