// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6kerx.html

use ttf_parser::parser::{FromData, LazyArray32, NumFrom, Offset, Offset32, Stream};

use crate::tables::aat;

/// The subtable header size. Some subtable offsets include it.
const HEADER_SIZE: usize = 12;


#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    version: u16,
    count: u32,
    subtables_data: &'a [u8],
    number_of_glyphs: u32,
}

impl<'a> Table<'a> {
    pub fn parse(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        let mut s = Stream::new(data);

        let version: u16 = s.read()?;
        if version < 2 {
            return None;
        }

        s.skip::<u16>(); // padding
        let count: u32 = s.read()?;

        Some(Table {
            version,
            count,
            subtables_data: s.tail()?,
            number_of_glyphs,
        })
    }

    #[inline]
    pub fn has_data(&self) -> bool {
        self.version != 0
    }

    pub fn subtables(&self) -> Subtables<'a> {
        Subtables {
            index: 0,
            len: self.count,
            stream: Stream::new(self.subtables_data),
            number_of_glyphs: self.number_of_glyphs,
        }
    }
}


/// An iterator over extended kerning subtables.
#[derive(Clone, Copy)]
pub struct Subtables<'a> {
    index: u32,
    len: u32,
    stream: Stream<'a>,
    number_of_glyphs: u32,
}

impl<'a> Iterator for Subtables<'a> {
    type Item = Subtable<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index == self.len {
            return None;
        }

        if self.stream.at_end() {
            return None;
        }

        self.index += 1;

        let s = &mut self.stream;
        let table_len: u32 = s.read()?;
        let coverage: u32 = s.read()?;
        let tuple_count: u32 = s.read()?;

        // A length that doesn't even cover the header ends the iteration,
        // since we can't tell where the next subtable starts.
        let data_len = usize::num_from(table_len).checked_sub(HEADER_SIZE)?;
        let data = s.read_bytes(data_len)?;

        let format = coverage as u8;
        let kind = SubtableKind::parse(format, data, self.number_of_glyphs);
        if kind.is_none() {
            log::debug!("skipping malformed or unsupported kerx subtable format {}", format);
        }

        Some(Subtable {
            kind,
            data,
            coverage: Coverage((coverage >> 24) as u8),
            tuple_count,
        })
    }
}


pub struct Subtable<'a> {
    /// `None` for unknown or malformed subtables.
    pub kind: Option<SubtableKind<'a>>,
    pub data: &'a [u8],
    pub coverage: Coverage,
    pub tuple_count: u32,
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Coverage(u8);

impl Coverage {
    #[inline]
    pub fn is_horizontal(self) -> bool {
        self.0 & 0x80 == 0
    }

    #[inline]
    pub fn is_vertical(self) -> bool {
        !self.is_horizontal()
    }

    #[inline]
    pub fn has_cross_stream(self) -> bool {
        self.0 & 0x40 != 0
    }

    #[inline]
    pub fn is_variable(self) -> bool {
        self.0 & 0x20 != 0
    }

    #[inline]
    pub fn is_backwards(self) -> bool {
        self.0 & 0x10 != 0
    }
}


pub enum SubtableKind<'a> {
    Format0(Subtable0<'a>),
    Format1(Subtable1<'a>),
    Format2(Subtable2<'a>),
    Format4(Subtable4<'a>),
    Format6(Subtable6<'a>),
}

impl<'a> SubtableKind<'a> {
    fn parse(format: u8, data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        let kind = match format {
            0 => SubtableKind::Format0(Subtable0::parse(data)?),
            1 => SubtableKind::Format1(Subtable1::parse(data, number_of_glyphs)?),
            2 => SubtableKind::Format2(Subtable2::parse(data, number_of_glyphs)?),
            // No format 3.
            4 => SubtableKind::Format4(Subtable4::parse(data, number_of_glyphs)?),
            // No format 5.
            6 => SubtableKind::Format6(Subtable6::parse(data, number_of_glyphs)?),
            _ => return None,
        };

        Some(kind)
    }
}


pub trait KerningPairs {
    /// Returns the unscaled kerning between two glyphs.
    fn glyphs_kerning(&self, left: u16, right: u16) -> Option<i32>;
}


#[derive(Clone, Copy, Debug)]
struct KerningRecord {
    pair: u32,
    value: i16,
}

impl FromData for KerningRecord {
    const SIZE: usize = 6;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(KerningRecord {
            pair: s.read()?,
            value: s.read()?,
        })
    }
}

/// A *Format 0 Kerning Subtable (Ordered List of Kerning Pairs)*.
pub struct Subtable0<'a> {
    pairs: LazyArray32<'a, KerningRecord>,
}

impl<'a> Subtable0<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let number_of_pairs: u32 = s.read()?;
        s.advance_checked(12)?; // search_range (u32) + entry_selector (u32) + range_shift (u32)
        Some(Subtable0 {
            pairs: s.read_array32(number_of_pairs)?,
        })
    }
}

impl KerningPairs for Subtable0<'_> {
    fn glyphs_kerning(&self, left: u16, right: u16) -> Option<i32> {
        let needle = u32::from(left) << 16 | u32::from(right);
        self.pairs
            .binary_search_by(|v| v.pair.cmp(&needle))
            .map(|(_, v)| i32::from(v.value))
    }
}


/// A *Format 1 Kerning Subtable (State Table for Contextual Kerning)*.
pub struct Subtable1<'a> {
    pub machine: aat::StateTable<'a>,
    actions: &'a [u8],
}

impl<'a> Subtable1<'a> {
    fn parse(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        let machine = aat::StateTable::parse(data, number_of_glyphs)?;

        // The actions offset follows the state table header and,
        // unlike format 2, doesn't include the subtable header.
        let actions_offset: Offset32 = Stream::read_at(data, aat::StateTable::SIZE)?;
        Some(Subtable1 {
            machine,
            actions: data.get(actions_offset.to_usize()..)?,
        })
    }

    /// Returns the kerning value at `index` in the action list.
    #[inline]
    pub fn kerning(&self, index: usize) -> Option<i16> {
        Stream::read_at(self.actions, index.checked_mul(i16::SIZE)?)
    }
}


/// A *Format 2 Kerning Table (Simple n x m Array of Kerning Values)*.
pub struct Subtable2<'a> {
    data: &'a [u8],
    left_classes: aat::Lookup<'a>,
    right_classes: aat::Lookup<'a>,
    array_offset: usize,
    number_of_glyphs: u32,
}

impl<'a> Subtable2<'a> {
    fn parse(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        let mut s = Stream::new(data);
        s.skip::<u32>(); // row_width

        // Offsets are from the beginning of the subtable and not from the `data` start,
        // so we have to subtract the header.
        let left_offset = s.read::<Offset32>()?.to_usize().checked_sub(HEADER_SIZE)?;
        let right_offset = s.read::<Offset32>()?.to_usize().checked_sub(HEADER_SIZE)?;
        let array_offset = s.read::<Offset32>()?.to_usize().checked_sub(HEADER_SIZE)?;

        Some(Subtable2 {
            data,
            left_classes: aat::Lookup::parse(data.get(left_offset..)?)?,
            right_classes: aat::Lookup::parse(data.get(right_offset..)?)?,
            array_offset,
            number_of_glyphs,
        })
    }
}

impl KerningPairs for Subtable2<'_> {
    fn glyphs_kerning(&self, left: u16, right: u16) -> Option<i32> {
        let l = self.left_classes.value(left, self.number_of_glyphs).unwrap_or(0);
        let r = self.right_classes.value(right, self.number_of_glyphs).unwrap_or(0);

        // Classes are premultiplied by the row width, so we only need to sum them.
        let index = usize::num_from(l).checked_add(usize::num_from(r))?;
        let offset = index.checked_mul(i16::SIZE)?.checked_add(self.array_offset)?;
        Stream::read_at::<i16>(self.data, offset).map(i32::from)
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActionType {
    ControlPoints,
    AnchorPoints,
    ControlPointCoordinates,
}

/// A *Format 4 Kerning Subtable (Control Point/Anchor Point Positioning)*.
pub struct Subtable4<'a> {
    pub machine: aat::StateTable<'a>,
    pub action_type: ActionType,
    points: &'a [u8],
}

impl<'a> Subtable4<'a> {
    fn parse(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        let machine = aat::StateTable::parse(data, number_of_glyphs)?;

        let flags: u32 = Stream::read_at(data, aat::StateTable::SIZE)?;
        let action_type = match flags >> 30 {
            0 => ActionType::ControlPoints,
            1 => ActionType::AnchorPoints,
            2 => ActionType::ControlPointCoordinates,
            _ => return None,
        };

        let points_offset = usize::num_from(flags & 0x00FF_FFFF);
        Some(Subtable4 {
            machine,
            action_type,
            points: data.get(points_offset..)?,
        })
    }

    /// Returns `N` consecutive values of action record `index`.
    ///
    /// Anchor and control point records hold two values,
    /// coordinate records hold four.
    pub fn action<T: FromData + Copy + Default, const N: usize>(&self, index: u16) -> Option<[T; N]> {
        let mut s = Stream::new_at(self.points, usize::from(index) * N * T::SIZE)?;
        let mut values = [T::default(); N];
        for v in &mut values {
            *v = s.read()?;
        }

        Some(values)
    }
}


/// A *Format 6 Kerning Subtable (Simple Index-based n x m Array of Kerning Values)*.
pub struct Subtable6<'a> {
    data: &'a [u8],
    long_values: bool,
    row_indices: aat::Lookup<'a>,
    column_indices: aat::Lookup<'a>,
    array_offset: usize,
    number_of_glyphs: u32,
}

impl<'a> Subtable6<'a> {
    fn parse(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        let mut s = Stream::new(data);
        let flags: u32 = s.read()?;
        s.skip::<u16>(); // row_count
        s.skip::<u16>(); // column_count
        // All offsets are from the start of the subtable.
        let row_offset = s.read::<Offset32>()?.to_usize().checked_sub(HEADER_SIZE)?;
        let column_offset = s.read::<Offset32>()?.to_usize().checked_sub(HEADER_SIZE)?;
        let array_offset = s.read::<Offset32>()?.to_usize().checked_sub(HEADER_SIZE)?;
        s.skip::<u32>(); // kerning vector, variations only

        let long_values = flags & 0x0000_0001 != 0;
        let parse_lookup = if long_values { aat::Lookup::parse32 } else { aat::Lookup::parse };

        Some(Subtable6 {
            data,
            long_values,
            row_indices: parse_lookup(data.get(row_offset..)?)?,
            column_indices: parse_lookup(data.get(column_offset..)?)?,
            array_offset,
            number_of_glyphs,
        })
    }
}

impl KerningPairs for Subtable6<'_> {
    fn glyphs_kerning(&self, left: u16, right: u16) -> Option<i32> {
        let l = self.row_indices.value(left, self.number_of_glyphs).unwrap_or(0);
        let r = self.column_indices.value(right, self.number_of_glyphs).unwrap_or(0);
        let index = usize::num_from(l.checked_add(r)?);

        if self.long_values {
            let offset = index.checked_mul(i32::SIZE)?.checked_add(self.array_offset)?;
            Stream::read_at::<i32>(self.data, offset)
        } else {
            let offset = index.checked_mul(i16::SIZE)?.checked_add(self.array_offset)?;
            Stream::read_at::<i16>(self.data, offset).map(i32::from)
        }
    }
}


#[cfg(test)]
pub(crate) mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::tables::test_utils::{single_lookup, BeBuffer};

    /// Wraps subtable data into a single-subtable `kerx` table.
    pub(crate) fn table_with(coverage: u32, data: &[u8]) -> BeBuffer {
        BeBuffer::new()
            .extend([2u16, 0])
            .push(1u32)
            .push((HEADER_SIZE + data.len()) as u32)
            .push(coverage)
            .push(0u32)
            .bytes(data)
    }

    /// A format 0 subtable kerning 1/2 by -40 and 3/4 by 25.
    pub(crate) fn format0_data() -> BeBuffer {
        BeBuffer::new()
            .extend([2u32, 12, 1, 0])
            .extend([1u16, 2]).push(-40i16)
            .extend([3u16, 4]).push(25i16)
    }

    fn only_subtable(data: &[u8]) -> Subtable {
        Table::parse(data, 10).unwrap().subtables().next().unwrap()
    }

    #[test]
    fn format0() {
        let data = table_with(0, &format0_data());
        let subtable = only_subtable(&data);
        assert!(subtable.coverage.is_horizontal());
        assert!(!subtable.coverage.has_cross_stream());

        let kind = match subtable.kind {
            Some(SubtableKind::Format0(v)) => v,
            _ => panic!("expected format 0"),
        };
        assert_eq!(kind.glyphs_kerning(1, 2), Some(-40));
        assert_eq!(kind.glyphs_kerning(3, 4), Some(25));
        assert_eq!(kind.glyphs_kerning(2, 1), None);
    }

    #[test]
    fn coverage_bits() {
        let data = table_with(0xF000_0000, &format0_data());
        let coverage = only_subtable(&data).coverage;
        assert!(coverage.is_vertical());
        assert!(coverage.has_cross_stream());
        assert!(coverage.is_variable());
        assert!(coverage.is_backwards());
    }

    #[test]
    fn format2() {
        // Subtable-relative offsets: header (12) + format header (16).
        let left = single_lookup(&[(5, 0), (6, 4)]);
        let right = single_lookup(&[(7, 1)]);
        let left_offset = 28;
        let right_offset = left_offset + left.len() as u32;
        let array_offset = right_offset + right.len() as u32;
        let sub = BeBuffer::new()
            .extend([4u32, left_offset, right_offset, array_offset])
            .bytes(&left)
            .bytes(&right)
            .extend([0i16, -10, 0, 0, 0, -20]);

        let data = table_with(2, &sub);
        let kind = match only_subtable(&data).kind {
            Some(SubtableKind::Format2(v)) => v,
            _ => panic!("expected format 2"),
        };
        assert_eq!(kind.glyphs_kerning(5, 7), Some(-10));
        assert_eq!(kind.glyphs_kerning(6, 7), Some(-20));
        assert_eq!(kind.glyphs_kerning(6, 8), Some(0));
    }

    #[test]
    fn format6_short_and_long() {
        let rows = single_lookup(&[(1, 0), (2, 2)]);
        let columns = single_lookup(&[(3, 1)]);
        let row_offset = 12 + 24;
        let column_offset = row_offset + rows.len() as u32;
        let array_offset = column_offset + columns.len() as u32;
        let sub = BeBuffer::new()
            .push(0u32)
            .extend([2u16, 2])
            .extend([row_offset, column_offset, array_offset, 0])
            .bytes(&rows)
            .bytes(&columns)
            .extend([0i16, 15, 0, -15]);

        let data = table_with(6, &sub);
        let kind = match only_subtable(&data).kind {
            Some(SubtableKind::Format6(v)) => v,
            _ => panic!("expected format 6"),
        };
        assert_eq!(kind.glyphs_kerning(1, 3), Some(15));
        assert_eq!(kind.glyphs_kerning(2, 3), Some(-15));

        // Long values use 32-bit lookups and a 32-bit array.
        let rows = BeBuffer::new().push(8u16).extend([1u16, 2]).extend([0u32, 2]);
        let columns = BeBuffer::new().push(8u16).extend([3u16, 1]).push(1u32);
        let column_offset = row_offset + rows.len() as u32;
        let array_offset = column_offset + columns.len() as u32;
        let sub = BeBuffer::new()
            .push(1u32)
            .extend([2u16, 2])
            .extend([row_offset, column_offset, array_offset, 0])
            .bytes(&rows)
            .bytes(&columns)
            .extend([0i32, 100_000, 0, -7]);

        let data = table_with(6, &sub);
        let kind = match only_subtable(&data).kind {
            Some(SubtableKind::Format6(v)) => v,
            _ => panic!("expected format 6"),
        };
        assert_eq!(kind.glyphs_kerning(1, 3), Some(100_000));
        assert_eq!(kind.glyphs_kerning(2, 3), Some(-7));
    }

    #[test]
    fn unknown_format_is_skipped() {
        let data = BeBuffer::new()
            .extend([2u16, 0])
            .push(2u32)
            .extend([16u32, 3, 0, 0])
            .push((HEADER_SIZE + format0_data().len()) as u32)
            .extend([0u32, 0])
            .bytes(&format0_data());

        let table = Table::parse(&data, 10).unwrap();
        let kinds: Vec<bool> = table.subtables().map(|s| s.kind.is_some()).collect();
        assert_eq!(kinds, [false, true]);
    }

    #[test]
    fn bad_subtable_length_stops_iteration() {
        let data = BeBuffer::new()
            .extend([2u16, 0])
            .push(2u32)
            .extend([4u32, 0, 0]);
        let table = Table::parse(&data, 10).unwrap();
        assert_eq!(table.subtables().count(), 0);
    }

    #[test]
    fn old_version() {
        let data = BeBuffer::new().extend([1u16, 0]).push(0u32);
        assert!(Table::parse(&data, 10).is_none());
    }
}
