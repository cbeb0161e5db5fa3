// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6trak.html

use ttf_parser::parser::{FromData, Fixed, LazyArray16, Offset, Offset16, Offset32, Stream};


#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    data: &'a [u8], // The whole table.
    hor: Option<TrackData<'a>>,
    ver: Option<TrackData<'a>>,
}

impl<'a> Table<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);

        let version: Fixed = s.read()?;
        if version.0 != 1.0 {
            return None;
        }

        let format: u16 = s.read()?;
        if format != 0 {
            return None;
        }

        let hor_offset: Option<Offset16> = s.read()?;
        let ver_offset: Option<Offset16> = s.read()?;
        s.skip::<u16>(); // reserved

        let hor = match hor_offset {
            Some(offset) => Some(TrackData::parse(data, offset.to_usize())?),
            None => None,
        };

        let ver = match ver_offset {
            Some(offset) => Some(TrackData::parse(data, offset.to_usize())?),
            None => None,
        };

        Some(Table {
            data,
            hor,
            ver,
        })
    }

    pub fn has_data(&self) -> bool {
        self.hor.is_some() || self.ver.is_some()
    }

    /// Returns the horizontal tracking in font units for a point size.
    pub fn hor_tracking(&self, ptem: f32) -> Option<f32> {
        self.hor.and_then(|d| d.tracking(ptem, self.data))
    }

    /// Returns the vertical tracking in font units for a point size.
    pub fn ver_tracking(&self, ptem: f32) -> Option<f32> {
        self.ver.and_then(|d| d.tracking(ptem, self.data))
    }
}


#[derive(Clone, Copy, Debug)]
struct TrackData<'a> {
    tracks: LazyArray16<'a, TrackTableEntry>,
    sizes: LazyArray16<'a, Fixed>,
}

impl<'a> TrackData<'a> {
    fn parse(table_data: &'a [u8], offset: usize) -> Option<Self> {
        let mut s = Stream::new_at(table_data, offset)?;
        let tracks_count: u16 = s.read()?;
        let sizes_count: u16 = s.read()?;
        let size_table_offset: Offset32 = s.read()?;

        let sizes = {
            let mut s = Stream::new_at(table_data, size_table_offset.to_usize())?;
            s.read_array16(sizes_count)?
        };

        Some(TrackData {
            tracks: s.read_array16(tracks_count)?,
            sizes,
        })
    }

    fn tracking(&self, ptem: f32, table_data: &[u8]) -> Option<f32> {
        // Choose the normal track.
        let track = self.tracks.into_iter().find(|t| t.track.0 == 0.0)?;

        // Choose size.
        if self.sizes.is_empty() {
            return None;
        }

        if self.sizes.len() == 1 {
            return track.value(table_data, 0).map(f32::from);
        }

        let mut idx = self.sizes.into_iter().position(|s| s.0 >= ptem)
            .unwrap_or(self.sizes.len() as usize - 1);

        if idx > 0 {
            idx -= 1;
        }

        // Interpolate between the two surrounding sizes.
        let idx = u16::try_from(idx).ok()?.min(self.sizes.len() - 2);
        self.interpolate_at(idx, ptem, &track, table_data)
    }

    fn interpolate_at(
        &self,
        idx: u16,
        target_size: f32,
        track: &TrackTableEntry,
        table_data: &[u8],
    ) -> Option<f32> {
        debug_assert!(idx < self.sizes.len() - 1);

        let mut s0 = self.sizes.get(idx)?.0;
        let mut s1 = self.sizes.get(idx + 1)?.0;
        let mut v0 = f32::from(track.value(table_data, idx)?);
        let mut v1 = f32::from(track.value(table_data, idx + 1)?);

        // Unsorted sizes.
        if s1 < s0 {
            core::mem::swap(&mut s0, &mut s1);
            core::mem::swap(&mut v0, &mut v1);
        }

        // No extrapolation.
        if target_size < s0 {
            return Some(v0);
        }

        if target_size > s1 {
            return Some(v1);
        }

        if s0 == s1 {
            return Some((v0 + v1) * 0.5);
        }

        let t = (target_size - s0) / (s1 - s0);
        Some(t * v1 + (1.0 - t) * v0)
    }
}


#[derive(Clone, Copy, Debug)]
struct TrackTableEntry {
    track: Fixed,
    _name_id: u16,
    offset: Offset16,
}

impl TrackTableEntry {
    fn value(&self, table_data: &[u8], idx: u16) -> Option<i16> {
        Stream::read_at(table_data, self.offset.to_usize() + usize::from(idx) * i16::SIZE)
    }
}

impl FromData for TrackTableEntry {
    const SIZE: usize = 8;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(TrackTableEntry {
            track: s.read()?,
            _name_id: s.read()?,
            offset: s.read()?,
        })
    }
}
